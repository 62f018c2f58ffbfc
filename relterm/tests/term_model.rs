use relterm::prelude::*;

fn atom_rel(arity: usize) -> Sort {
    Sort::relation(vec![Sort::atom(); arity]).unwrap()
}

#[test]
fn checked_builders_reject_degenerate_arguments() {
    assert!(mk_tuple(vec![]).unwrap_err().is_malformed_argument());
    assert!(distinct(vec![int(1)]).unwrap_err().is_malformed_argument());
    assert!(forall(vec![], Expression::TRUE).is_err());
    assert!(exists(vec![], Expression::TRUE).is_err());
    assert!(insert(vec![], Expression::EmptySet(atom_rel(1))).is_err());
    assert!(union_all(Vec::new()).is_err());
}

#[test]
fn and_all_collapses_small_conjunctions() {
    assert_eq!(and_all(Vec::new()), Expression::TRUE);
    assert_eq!(and_all(vec![Expression::FALSE]), Expression::FALSE);
    assert_eq!(
        and_all(vec![Expression::TRUE, Expression::FALSE]),
        Expression::MultiArity(MultiArityOp::And, vec![Expression::TRUE, Expression::FALSE])
    );
    assert_eq!(or_all(Vec::new()), Expression::FALSE);
}

#[test]
fn top_level_names_are_unique() {
    let mut program = Program::new();
    program.declare_sort("Atom", 0).unwrap();
    assert!(program.declare_sort("Atom", 0).is_err());

    program.declare_function("this_A", vec![], atom_rel(1)).unwrap();
    assert!(program.declare_constant("this_A", Sort::Int).is_err());
    assert!(program.declare_function("this_A", vec![], atom_rel(1)).is_err());

    // Bound variables may reuse any name
    let x1 = program.bound_variable("x", Sort::atom());
    let x2 = program.bound_variable("x", Sort::atom());
    assert_ne!(x1, x2);
    assert!(program.lookup("x").is_none());
}

#[test]
fn definitions_take_bound_parameters() {
    let mut program = Program::new();
    program.declare_sort("Atom", 0).unwrap();
    let c = program.declare_constant("c", Sort::atom()).unwrap();
    let err = program
        .define_function("f", vec![c], Sort::Bool, Expression::TRUE)
        .unwrap_err();
    assert!(err.is_malformed_argument());

    let x = program.bound_variable("x", Sort::atom());
    let f = program
        .define_function("f", vec![x], Sort::Bool, equals(var(x), var(c)))
        .unwrap();
    assert_eq!(program.lookup("f"), Some(f));
    assert_eq!(program.function_definitions().count(), 1);
}

#[test]
fn sorts_of_relational_operators() {
    let mut program = Program::new();
    program.declare_sort("Atom", 0).unwrap();
    let a = program.declare_function("this_A", vec![], atom_rel(1)).unwrap();
    let f = program
        .declare_function(
            "this_A_f",
            vec![],
            Sort::relation(vec![Sort::atom(), Sort::Int]).unwrap(),
        )
        .unwrap();
    let g = program.declare_function("this_A_g", vec![], atom_rel(2)).unwrap();

    assert_eq!(
        program.sort_of(&join(var(a), var(f))).unwrap(),
        Sort::relation(vec![Sort::Int]).unwrap()
    );
    assert_eq!(
        program.sort_of(&product(var(a), var(f))).unwrap(),
        Sort::relation(vec![Sort::atom(), Sort::atom(), Sort::Int]).unwrap()
    );
    assert_eq!(
        program.sort_of(&transpose(var(f))).unwrap(),
        Sort::relation(vec![Sort::Int, Sort::atom()]).unwrap()
    );
    assert_eq!(program.sort_of(&closure(var(g))).unwrap(), atom_rel(2));
    assert!(program.sort_of(&closure(var(f))).is_err());
    assert!(program.sort_of(&join(var(a), var(a))).is_err());
    assert!(program.sort_of(&union(var(a), var(g))).is_err());

    let t = mk_tuple(vec![int(1), Expression::TRUE]).unwrap();
    assert_eq!(program.sort_of(&tup_sel(1, t.clone())).unwrap(), Sort::Bool);
    assert!(program.sort_of(&tup_sel(2, t.clone())).is_err());
    assert_eq!(
        program.sort_of(&singleton(t)).unwrap(),
        Sort::relation(vec![Sort::Int, Sort::Bool]).unwrap()
    );
    assert_eq!(
        program.sort_of(&subset(var(a), var(a))).unwrap(),
        Sort::Bool
    );
    assert!(program.sort_of(&call("missing", vec![])).is_err());
}
