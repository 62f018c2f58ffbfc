use relterm::prelude::*;

const MODEL1: &str = "(model
; cardinality of Atom is 1
(declare-sort Atom 0)
; rep: @uc_Atom_0
(declare-sort UnaryIntTup 0)
(declare-sort BinaryIntTup 0)
(declare-sort TernaryIntTup 0)
(define-fun value_of_unaryIntTup ((BOUND_VARIABLE_448 UnaryIntTup)) (Tuple Int) (mkTuple 0))
(define-fun value_of_binaryIntTup ((BOUND_VARIABLE_457 BinaryIntTup)) (Tuple Int Int) (mkTuple 0 0))
(define-fun value_of_ternaryIntTup ((BOUND_VARIABLE_466 TernaryIntTup)) (Tuple Int Int Int) (mkTuple 0 0 0))
(define-fun atomNone () (Set (Tuple Atom)) (as emptyset (Set (Tuple Atom))))
(define-fun atomUniv () (Set (Tuple Atom)) (as emptyset (Set (Tuple Atom))))
(define-fun atomIden () (Set (Tuple Atom Atom)) (as emptyset (Set (Tuple Atom Atom))))
)";

fn definition_names(program: &Program) -> Vec<String> {
    program
        .function_definitions()
        .map(|(_, d)| d.name().to_string())
        .collect()
}

#[test]
fn reads_solver_model() {
    let model = parse_model(MODEL1).unwrap();
    assert_eq!(model.sorts().len(), 4);
    assert_eq!(model.function_definitions().count(), 6);

    let atom = model.sort_declaration("Atom").unwrap();
    assert_eq!(atom.cardinality, Some(1));
    assert_eq!(model.sort_declaration("UnaryIntTup").unwrap().cardinality, None);

    let id = model.lookup("value_of_binaryIntTup").unwrap();
    match model.decl(id) {
        Declaration::Definition {
            inputs,
            output,
            body,
            ..
        } => {
            assert_eq!(inputs.len(), 1);
            assert_eq!(
                model.decl(inputs[0]).sort(),
                &Sort::uninterpreted("BinaryIntTup")
            );
            assert_eq!(output, &Sort::tuple(vec![Sort::Int, Sort::Int]).unwrap());
            assert_eq!(body, &mk_tuple(vec![int(0), int(0)]).unwrap());
        }
        other => panic!("expected a definition, got {other:?}"),
    }

    let id = model.lookup("atomIden").unwrap();
    let Declaration::Definition { body, .. } = model.decl(id) else {
        panic!("expected a definition");
    };
    assert_eq!(
        body,
        &Expression::EmptySet(Sort::relation(vec![Sort::atom(), Sort::atom()]).unwrap())
    );
}

#[test]
fn bare_and_wrapped_models_agree() {
    let bare = MODEL1
        .trim_start_matches("(model")
        .trim_end_matches(')')
        .to_string();
    let listed = format!("({bare})");
    let wrapped = parse_model(MODEL1).unwrap();
    for text in [bare, listed] {
        let model = parse_model(&text).unwrap();
        assert_eq!(model.sorts(), wrapped.sorts());
        assert_eq!(definition_names(&model), definition_names(&wrapped));
    }
}

#[test]
fn abstract_values_become_constants() {
    let model = parse_model(
        "(model
(declare-sort Atom 0)
(define-fun this_A () (Set (Tuple Atom)) (insert (mkTuple @uc_Atom_0) (singleton (mkTuple @uc_Atom_1))))
(define-fun this_B () (Set (Tuple Atom)) (singleton (mkTuple (as @Atom_2 Atom))))
(define-fun this_C () (Set (Tuple Atom)) (singleton (mkTuple @uc_Atom_0)))
)",
    )
    .unwrap();

    let names: Vec<&str> = model
        .constant_declarations()
        .map(|(_, d)| d.name())
        .collect();
    assert_eq!(names, ["@uc_Atom_0", "@uc_Atom_1", "@Atom_2"]);
    for (_, decl) in model.constant_declarations() {
        assert_eq!(decl.sort(), &Sort::atom());
    }
}

#[test]
fn quantifiers_scope_their_variables() {
    let program = parse_script(
        "(declare-sort Atom 0)
(declare-fun this_A () (Set (Tuple Atom)))
(assert (forall ((x Atom)) (exists ((x Atom) (y Atom)) (member (mkTuple x) this_A))))
(assert (forall ((z Atom)) (member (mkTuple z) this_A)))",
    )
    .unwrap();
    assert_eq!(program.assertions().len(), 2);

    let Expression::Quantified { vars: outer, body, .. } = &program.assertions()[0].expr else {
        panic!("expected a quantifier");
    };
    let Expression::Quantified { vars: inner, body, .. } = body.as_ref() else {
        panic!("expected a nested quantifier");
    };
    assert_eq!(inner.len(), 2);
    // The innermost `x` shadows the outer one
    let mut referenced = Vec::new();
    body.for_each_decl(&mut |id| referenced.push(id));
    assert!(referenced.contains(&inner[0]));
    assert!(!referenced.contains(&outer[0]));

    // Bound variables do not leak into the top-level namespace
    assert!(program.lookup("x").is_none());
    assert!(parse_script("(declare-sort Atom 0)\n(assert (member (mkTuple x) x))").is_err());
}

#[test]
fn script_round_trips_through_printer() {
    let mut program = Program::new();
    program.declare_sort("Atom", 0).unwrap();
    program.declare_sort("UnaryIntTup", 0).unwrap();
    let r1 = Sort::relation(vec![Sort::atom()]).unwrap();
    let r2 = Sort::relation(vec![Sort::atom(), Sort::atom()]).unwrap();
    program
        .declare_function(
            "value_of_unaryIntTup",
            vec![Sort::uninterpreted("UnaryIntTup")],
            Sort::tuple(vec![Sort::Int]).unwrap(),
        )
        .unwrap();
    let a = program.declare_function("this_A", vec![], r1.clone()).unwrap();
    let f = program.declare_function("this_A_f", vec![], r2.clone()).unwrap();
    let c = program
        .declare_constant("_a1", Sort::tuple(vec![Sort::atom()]).unwrap())
        .unwrap();
    let s = program.declare_function("_S1", vec![], r1.clone()).unwrap();

    let x = program.bound_variable("_x1", Sort::atom());
    let u = program.bound_variable("_x2", Sort::uninterpreted("UnaryIntTup"));
    program.assert_named(
        "this/A <: f",
        subset(var(f), product(var(a), var(a))),
    );
    program.assert(
        forall(
            vec![x],
            implies(
                member(mk_tuple(vec![var(x)]).unwrap(), var(a)),
                not(equals(
                    join(singleton(mk_tuple(vec![var(x)]).unwrap()), closure(var(f))),
                    Expression::EmptySet(r1.clone()),
                )),
            ),
        )
        .unwrap(),
    );
    program.assert(equals(var(s), singleton(var(c))));
    program.assert(
        exists(
            vec![u],
            and(
                gte(tup_sel(0, call("value_of_unaryIntTup", vec![var(u)])), int(-2)),
                or(Expression::TRUE, subset(transpose(var(f)), var(f))),
            ),
        )
        .unwrap(),
    );

    let text = print(&program).unwrap();
    let reread = parse_script(&text).unwrap();
    assert_eq!(print(&reread).unwrap(), text);
    assert_eq!(
        reread.assertions()[0].name.as_deref(),
        Some("this/A <: f")
    );

    let names = |p: &Program| {
        let mut names: Vec<String> = p
            .function_declarations()
            .chain(p.constant_declarations())
            .map(|(_, d)| format!("{}:{}", d.name(), d.sort()))
            .collect();
        names.sort();
        names
    };
    assert_eq!(names(&program), names(&reread));
}

#[test]
fn extreme_integers_round_trip() {
    let mut program = Program::new();
    program.assert(equals(int(i64::MIN), int(i64::MAX)));
    let text = print(&program).unwrap();
    assert!(text.contains("(= (- 9223372036854775808) 9223372036854775807)"));

    let reread = parse_script(&text).unwrap();
    assert_eq!(reread.assertions().len(), 1);
    assert_eq!(print(&reread).unwrap(), text);

    assert!(parse_script("(assert (= (- 9223372036854775809) 0))").is_err());
    assert!(parse_script("(assert (= 9223372036854775808 0))").is_err());
}

#[test]
fn malformed_text_is_rejected() {
    let cases = [
        // unbalanced
        "(model (declare-sort Atom 0)",
        // unknown sort
        "(model (declare-fun f () Foo))",
        // unknown symbol
        "(model (declare-sort Atom 0) (define-fun f () (Set (Tuple Atom)) g))",
        // string literal
        "(model (define-fun s () Int \"text\"))",
        // decimal
        "(model (define-fun s () Int 1.5))",
        // wrong operand count
        "(model (declare-sort Atom 0) (define-fun f () Bool (not true false)))",
        // assertions are not part of a model
        "(model (assert true))",
        // duplicate declaration
        "(model (declare-sort Atom 0) (declare-fun f () Int) (declare-fun f () Int))",
    ];
    for case in cases {
        let err = parse_model(case).unwrap_err();
        assert!(err.is_parse(), "expected a parse error for {case:?}, got {err:?}");
    }
}
