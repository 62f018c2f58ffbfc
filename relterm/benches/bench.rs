use criterion::{Criterion, black_box, criterion_group, criterion_main};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use relterm::prelude::*;

const UNARY: usize = 6;
const BINARY: usize = 3;

struct Fixture {
    program: Program,
    unary: Vec<DeclId>,
    binary: Vec<DeclId>,
}

fn fixture() -> Fixture {
    let mut program = Program::new();
    program.declare_sort("Atom", 0).unwrap();
    let rel1 = Sort::relation(vec![Sort::atom()]).unwrap();
    let rel2 = Sort::relation(vec![Sort::atom(), Sort::atom()]).unwrap();
    let unary = (0..UNARY)
        .map(|i| {
            program
                .declare_function(format!("this_S{i}"), vec![], rel1.clone())
                .unwrap()
        })
        .collect();
    let binary = (0..BINARY)
        .map(|i| {
            program
                .declare_function(format!("this_S{i}_f"), vec![], rel2.clone())
                .unwrap()
        })
        .collect();
    Fixture {
        program,
        unary,
        binary,
    }
}

fn random_set(rng: &mut impl Rng, fx: &Fixture, budget: usize) -> Expression {
    if budget == 0 || rng.random_bool(0.3) {
        return var(fx.unary[rng.random_range(0..UNARY)]);
    }
    match rng.random_range(0..=3) {
        0 => union(
            random_set(rng, fx, budget - 1),
            random_set(rng, fx, budget - 1),
        ),
        1 => intersection(
            random_set(rng, fx, budget - 1),
            random_set(rng, fx, budget - 1),
        ),
        2 => join(
            random_set(rng, fx, budget - 1),
            var(fx.binary[rng.random_range(0..BINARY)]),
        ),
        3 => join(
            random_set(rng, fx, budget - 1),
            closure(var(fx.binary[rng.random_range(0..BINARY)])),
        ),
        _ => unreachable!(),
    }
}

fn random_formula(rng: &mut impl Rng, fx: &mut Fixture, budget: usize) -> Expression {
    if budget == 0 || rng.random_bool(0.2) {
        let (a, b) = (random_set(rng, fx, 3), random_set(rng, fx, 3));
        return if rng.random_bool(0.5) {
            subset(a, b)
        } else {
            equals(a, b)
        };
    }
    match rng.random_range(0..=3) {
        0 => and(
            random_formula(rng, fx, budget - 1),
            random_formula(rng, fx, budget - 1),
        ),
        1 => or(
            random_formula(rng, fx, budget - 1),
            random_formula(rng, fx, budget - 1),
        ),
        2 => not(random_formula(rng, fx, budget - 1)),
        3 => {
            let x = fx.program.bound_variable(format!("_x{budget}"), Sort::atom());
            let set = random_set(rng, fx, 2);
            let guard = member(mk_tuple(vec![var(x)]).unwrap(), set);
            let body = random_formula(rng, fx, budget - 1);
            forall(vec![x], implies(guard, body)).unwrap()
        }
        _ => unreachable!(),
    }
}

fn build_program(assertions: usize) -> Program {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let mut fx = fixture();
    for _ in 0..assertions {
        let formula = random_formula(&mut rng, &mut fx, 6);
        fx.program.assert(formula);
    }
    fx.program
}

fn bench_print(c: &mut Criterion) {
    let small = build_program(4);
    let large = build_program(64);

    c.bench_function("print_small", |b| {
        b.iter(|| black_box(print(&small).unwrap()))
    });
    c.bench_function("print_large", |b| {
        b.iter(|| black_box(print(&large).unwrap()))
    });
}

fn bench_parse(c: &mut Criterion) {
    let small = print(&build_program(4)).unwrap();
    let large = print(&build_program(64)).unwrap();

    c.bench_function("parse_script_small", |b| {
        b.iter(|| black_box(parse_script(&small).unwrap()))
    });
    c.bench_function("parse_script_large", |b| {
        b.iter(|| black_box(parse_script(&large).unwrap()))
    });
}

criterion_group!(benches, bench_print, bench_parse);
criterion_main!(benches);
