//! Free-function builders for [`Expression`] nodes.
//!
//! Builders that can violate a structural invariant (empty tuple, quantifier without
//! variables, `distinct` over fewer than two terms) return a [`TermResult`]; the rest are total.

use crate::{
    decl::DeclId,
    error::{TermError, TermResult},
    expr::{BinaryOp, Expression, MultiArityOp, QuantifierOp, UnaryOp},
};

#[inline]
fn unary(op: UnaryOp, e: Expression) -> Expression {
    Expression::Unary(op, Box::new(e))
}

#[inline]
fn binary(op: BinaryOp, a: Expression, b: Expression) -> Expression {
    Expression::Binary(op, Box::new(a), Box::new(b))
}

pub fn var(id: DeclId) -> Expression {
    Expression::ConstantRef(id)
}

pub fn int(value: i64) -> Expression {
    Expression::IntConstant(value)
}

pub fn bool_const(value: bool) -> Expression {
    Expression::BooleanConstant(value)
}

pub fn not(e: Expression) -> Expression {
    unary(UnaryOp::Not, e)
}

pub fn and(a: Expression, b: Expression) -> Expression {
    Expression::MultiArity(MultiArityOp::And, vec![a, b])
}

/// Conjunction of `operands`: `true` when empty, the operand itself when there is only one.
pub fn and_all(operands: impl IntoIterator<Item = Expression>) -> Expression {
    let mut operands: Vec<Expression> = operands.into_iter().collect();
    match operands.len() {
        0 => Expression::TRUE,
        1 => operands.remove(0),
        _ => Expression::MultiArity(MultiArityOp::And, operands),
    }
}

pub fn or(a: Expression, b: Expression) -> Expression {
    Expression::MultiArity(MultiArityOp::Or, vec![a, b])
}

/// Disjunction of `operands`: `false` when empty, the operand itself when there is only one.
pub fn or_all(operands: impl IntoIterator<Item = Expression>) -> Expression {
    let mut operands: Vec<Expression> = operands.into_iter().collect();
    match operands.len() {
        0 => Expression::FALSE,
        1 => operands.remove(0),
        _ => Expression::MultiArity(MultiArityOp::Or, operands),
    }
}

pub fn implies(antecedent: Expression, consequent: Expression) -> Expression {
    binary(BinaryOp::Implies, antecedent, consequent)
}

pub fn equals(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Eq, a, b)
}

pub fn member(element: Expression, set: Expression) -> Expression {
    binary(BinaryOp::Member, element, set)
}

pub fn subset(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Subset, a, b)
}

pub fn union(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Union, a, b)
}

/// Left-nested union of a non-empty list of sets.
pub fn union_all(sets: impl IntoIterator<Item = Expression>) -> TermResult<Expression> {
    sets.into_iter()
        .reduce(union)
        .ok_or_else(|| TermError::malformed("union_all", "at least one set is required"))
}

pub fn intersection(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Intersection, a, b)
}

pub fn difference(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::SetMinus, a, b)
}

pub fn join(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Join, a, b)
}

pub fn product(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Product, a, b)
}

pub fn transpose(e: Expression) -> Expression {
    unary(UnaryOp::Transpose, e)
}

/// Transitive closure (`tclosure`).
pub fn closure(e: Expression) -> Expression {
    unary(UnaryOp::TClosure, e)
}

pub fn complement(e: Expression) -> Expression {
    unary(UnaryOp::Complement, e)
}

pub fn singleton(e: Expression) -> Expression {
    unary(UnaryOp::Singleton, e)
}

pub fn lt(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Lt, a, b)
}

pub fn lte(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Lte, a, b)
}

pub fn gt(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Gt, a, b)
}

pub fn gte(a: Expression, b: Expression) -> Expression {
    binary(BinaryOp::Gte, a, b)
}

pub fn mk_tuple(elements: Vec<Expression>) -> TermResult<Expression> {
    if elements.is_empty() {
        return Err(TermError::malformed(
            "mk_tuple",
            "a tuple needs at least one element",
        ));
    }
    Ok(Expression::MultiArity(MultiArityOp::MkTuple, elements))
}

/// Pairwise distinctness of at least two terms.
pub fn distinct(terms: Vec<Expression>) -> TermResult<Expression> {
    if terms.len() < 2 {
        return Err(TermError::malformed(
            "distinct",
            format!("expected at least two terms, got {}", terms.len()),
        ));
    }
    Ok(Expression::MultiArity(MultiArityOp::Distinct, terms))
}

/// `(insert e1 ... en set)`
pub fn insert(elements: Vec<Expression>, set: Expression) -> TermResult<Expression> {
    if elements.is_empty() {
        return Err(TermError::malformed(
            "insert",
            "at least one element must be inserted",
        ));
    }
    let mut operands = elements;
    operands.push(set);
    Ok(Expression::MultiArity(MultiArityOp::Insert, operands))
}

/// `((_ tupSel index) tuple)`
pub fn tup_sel(index: u32, tuple: Expression) -> Expression {
    binary(BinaryOp::TupSel, Expression::IntConstant(index as i64), tuple)
}

pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Expression {
    Expression::Call {
        function: function.into(),
        args,
    }
}

pub fn ite(condition: Expression, then_branch: Expression, else_branch: Expression) -> Expression {
    Expression::Ite {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    }
}

pub fn quantified(op: QuantifierOp, vars: Vec<DeclId>, body: Expression) -> TermResult<Expression> {
    if vars.is_empty() {
        return Err(TermError::malformed(
            "quantified",
            format!("`{op}` requires at least one bound variable"),
        ));
    }
    Ok(Expression::Quantified {
        op,
        vars,
        body: Box::new(body),
    })
}

pub fn forall(vars: Vec<DeclId>, body: Expression) -> TermResult<Expression> {
    quantified(QuantifierOp::Forall, vars, body)
}

pub fn exists(vars: Vec<DeclId>, body: Expression) -> TermResult<Expression> {
    quantified(QuantifierOp::Exists, vars, body)
}
