use relterm::prelude::*;
use relterm::printer::{expression_doc, symbol};

fn rel(columns: Vec<Sort>) -> Sort {
    Sort::relation(columns).unwrap()
}

fn sample_program() -> Program {
    let mut program = Program::new();
    program.declare_sort("Atom", 0).unwrap();
    program.declare_sort("UnaryIntTup", 0).unwrap();
    program
        .declare_function(
            "value_of_unaryIntTup",
            vec![Sort::uninterpreted("UnaryIntTup")],
            Sort::tuple(vec![Sort::Int]).unwrap(),
        )
        .unwrap();
    let a1 = program
        .declare_constant("_a1", Sort::tuple(vec![Sort::atom()]).unwrap())
        .unwrap();
    let x = program.bound_variable("x", Sort::atom());
    program
        .define_function("is_self", vec![x], Sort::Bool, equals(var(x), var(x)))
        .unwrap();
    program.assert_named(
        "named",
        member(var(a1), Expression::UniverseSet(rel(vec![Sort::atom()]))),
    );
    program.assert(Expression::FALSE);
    program
}

#[test]
fn commands_follow_prelude_in_fixed_order() {
    let text = print(&sample_program()).unwrap();
    let expected = "(set-logic ALL)\n\
(set-option :produce-models true)\n\
(set-option :finite-model-find true)\n\
(set-option :sets-ext true)\n\
(declare-sort Atom 0)\n\
(declare-sort UnaryIntTup 0)\n\
(declare-fun value_of_unaryIntTup (UnaryIntTup) (Tuple Int))\n\
(declare-const _a1 (Tuple Atom))\n\
(define-fun is_self ((x Atom)) Bool (= x x))\n\
; named\n\
(assert (member _a1 (as univset (Set (Tuple Atom)))))\n\
(assert false)\n";
    assert_eq!(text, expected);
    assert!(text.starts_with(PRELUDE));
}

#[test]
fn printing_is_deterministic() {
    let program = sample_program();
    let first = print(&program).unwrap();
    let second = print(&program).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, program.to_string());
}

#[test]
fn empty_program_prints_only_the_prelude() {
    assert_eq!(print(&Program::new()).unwrap(), PRELUDE);
}

#[test]
fn real_and_string_sorts_are_rejected() {
    let mut program = Program::new();
    program.declare_constant("r", Sort::Real).unwrap();
    let err = print(&program).unwrap_err();
    assert!(err.is_unsupported_construct());

    let mut program = Program::new();
    program
        .declare_function("s", vec![Sort::String], Sort::Bool)
        .unwrap();
    assert!(print(&program).unwrap_err().is_unsupported_construct());
}

#[test]
fn integer_and_tuple_selection_syntax() {
    let mut program = Program::new();
    program.declare_sort("UnaryIntTup", 0).unwrap();
    program
        .declare_function(
            "value_of_unaryIntTup",
            vec![Sort::uninterpreted("UnaryIntTup")],
            Sort::tuple(vec![Sort::Int]).unwrap(),
        )
        .unwrap();
    let u = program.bound_variable("_x1", Sort::uninterpreted("UnaryIntTup"));
    let value = tup_sel(0, call("value_of_unaryIntTup", vec![var(u)]));
    let formula = exists(vec![u], lt(value, int(-3))).unwrap();

    let mut text = String::new();
    let _ = expression_doc(&program, &formula)
        .unwrap()
        .render_fmt(200, &mut text);
    assert_eq!(
        text,
        "(exists ((_x1 UnaryIntTup)) (< ((_ tupSel 0) (value_of_unaryIntTup _x1)) (- 3)))"
    );
}

#[test]
fn set_literals_require_set_sorts() {
    let mut program = Program::new();
    program.assert(equals(
        Expression::EmptySet(Sort::Int),
        Expression::EmptySet(Sort::Int),
    ));
    assert!(print(&program).unwrap_err().is_malformed_argument());
}

#[test]
fn long_commands_break_with_indentation() {
    let mut program = Program::new();
    program.declare_sort("Atom", 0).unwrap();
    let r = rel(vec![Sort::atom()]);
    let ids: Vec<DeclId> = (0..8)
        .map(|i| {
            program
                .declare_function(format!("this_Signature{i}"), vec![], r.clone())
                .unwrap()
        })
        .collect();
    let big = union_all(ids.iter().copied().map(var)).unwrap();
    program.assert(equals(var(ids[0]), big));

    let narrow = print_with_width(&program, 40).unwrap();
    let wide = print_with_width(&program, 1000).unwrap();
    let assert_lines = |text: &str| {
        text.lines()
            .skip_while(|l| !l.starts_with("(assert"))
            .count()
    };
    assert_eq!(assert_lines(&wide), 1);
    assert!(assert_lines(&narrow) > 1);
    assert!(narrow.lines().any(|l| l.starts_with("  ")));

    // Layout never changes the tokens
    let squash = |text: &str| text.split_whitespace().collect::<Vec<_>>().join(" ");
    assert_eq!(squash(&narrow), squash(&wide));
}

#[test]
fn symbols_are_quoted_when_needed() {
    assert_eq!(symbol("this_A").unwrap(), "this_A");
    assert_eq!(symbol("@uc_Atom_0").unwrap(), "@uc_Atom_0");
    assert_eq!(symbol("this A").unwrap(), "|this A|");
    assert_eq!(symbol("1st").unwrap(), "|1st|");
    assert_eq!(symbol("forall").unwrap(), "|forall|");
    assert!(symbol("a|b").is_err());
}

#[test]
fn assertion_names_stay_on_one_line() {
    for name in ["a\n(assert false)", "a\r(assert false)"] {
        let mut program = Program::new();
        program.assert_named(name, Expression::TRUE);
        let err = print(&program).unwrap_err();
        assert!(err.is_malformed_argument(), "{name:?}: {err}");
    }

    let mut program = Program::new();
    program.assert_named("disj this/A, this/B", Expression::TRUE);
    let text = print(&program).unwrap();
    assert!(text.ends_with("; disj this/A, this/B\n(assert true)\n"));
    assert_eq!(parse_script(&text).unwrap().assertions().len(), 1);
}
