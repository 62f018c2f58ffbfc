use log::debug;
use relterm::{
    expr::{Expression, func::*},
    sort::Sort,
};

use crate::{
    ast::{AlloyExpr, BinaryOp, UnaryOp},
    error::{LowerError, LowerResult},
    lower::{Position, Translator, expr::uncast, hoist::Lowered, scope::Scope},
};

fn counted(expr: &AlloyExpr) -> Option<&AlloyExpr> {
    match uncast(expr) {
        AlloyExpr::Unary(UnaryOp::Cardinality, inner) => Some(inner.as_ref()),
        _ => None,
    }
}

fn literal(expr: &AlloyExpr) -> Option<i64> {
    match uncast(expr) {
        AlloyExpr::IntLiteral(n) => Some(*n),
        _ => None,
    }
}

/// Largest number of tuples a single cardinality constraint may enumerate.
const MAX_ENUMERATED: i64 = 1 << 16;

/// `k op #S` as `#S op' k`.
fn mirror(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Lte => BinaryOp::Gte,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::Gte => BinaryOp::Lte,
        other => other,
    }
}

impl Translator<'_> {
    /// Lowers `#S op k` by enumerating `k` tuples of `S`'s element sort.
    pub(super) fn cardinality(
        &mut self,
        expr: &AlloyExpr,
        op: BinaryOp,
        lhs: &AlloyExpr,
        rhs: &AlloyExpr,
        scope: &Scope,
        position: Position,
    ) -> LowerResult<Lowered> {
        let (set, k, op) = match (counted(lhs), literal(rhs), counted(rhs), literal(lhs)) {
            (Some(set), Some(k), _, _) => (set, k, op),
            (_, _, Some(set), Some(k)) => (set, k, mirror(op)),
            _ => {
                return Err(LowerError::unsupported(format!(
                    "`{}` compares a cardinality with something other than an integer literal",
                    self.model.render(expr)
                )));
            }
        };
        if op == BinaryOp::NotEquals {
            return Err(LowerError::unsupported(format!(
                "`{}` (cardinality disequality)",
                self.model.render(expr)
            )));
        }
        if position != Position::Top {
            return Err(LowerError::unsupported(format!(
                "`{}` below the top level of a fact",
                self.model.render(expr)
            )));
        }

        let Lowered {
            expr: set,
            pending,
        } = self.relation(set, scope)?;
        let sort = self.sort_of(&set)?;
        let element = sort.element().cloned().ok_or_else(|| {
            LowerError::unsupported(format!(
                "`{}` counts a non-relational term",
                self.model.render(expr)
            ))
        })?;

        let formula = match op {
            BinaryOp::Equals => match k {
                k if k < 0 => Expression::FALSE,
                0 => equals(set, Expression::EmptySet(sort)),
                k => {
                    let aux = self.enumerate(k, &element, &sort, true)?;
                    equals(set, aux)
                }
            },
            BinaryOp::Lte | BinaryOp::Lt => {
                let k = if op == BinaryOp::Lt { k.checked_sub(1) } else { Some(k) };
                match k {
                    None => Expression::FALSE,
                    Some(k) if k < 0 => Expression::FALSE,
                    Some(0) => equals(set, Expression::EmptySet(sort)),
                    Some(k) => {
                        let aux = self.enumerate(k, &element, &sort, false)?;
                        subset(set, aux)
                    }
                }
            }
            BinaryOp::Gte | BinaryOp::Gt => {
                let k = if op == BinaryOp::Gt { k.checked_add(1) } else { Some(k) };
                match k {
                    None => Expression::FALSE,
                    Some(k) if k <= 0 => Expression::TRUE,
                    Some(k) => {
                        let aux = self.enumerate(k, &element, &sort, true)?;
                        subset(aux, set)
                    }
                }
            }
            _ => {
                return Err(LowerError::unsupported(format!(
                    "`{}` (cardinality under `{op}`)",
                    self.model.render(expr)
                )));
            }
        };
        Ok(Lowered::with(formula, pending))
    }

    /// Declares `count` constants of sort `element` and an auxiliary set `_S` holding exactly
    /// them, returning a reference to the set.
    fn enumerate(
        &mut self,
        count: i64,
        element: &Sort,
        sort: &Sort,
        pairwise_distinct: bool,
    ) -> LowerResult<Expression> {
        if count > MAX_ENUMERATED {
            return Err(LowerError::unsupported(format!(
                "a cardinality bound of {count} (at most {MAX_ENUMERATED} tuples are enumerated)"
            )));
        }
        let mut atoms = Vec::new();
        for _ in 0..count {
            let name = self.names.fresh_atom();
            atoms.push(var(self.program.declare_constant(name, element.clone())?));
        }
        if pairwise_distinct && atoms.len() > 1 {
            self.program.assert(distinct(atoms.clone())?);
        }

        let name = self.names.fresh_set();
        debug!("enumerating {count} tuples of {element} into `{name}`");
        let aux = self.program.declare_function(name, vec![], sort.clone())?;
        self.program
            .assert(equals(var(aux), union_all(atoms.into_iter().map(singleton))?));
        Ok(var(aux))
    }
}
