//! Sort inference for expressions of a [`Program`].

use crate::{
    error::{TermError, TermResult},
    expr::{BinaryOp, Expression, MultiArityOp, UnaryOp},
    program::Program,
    sort::Sort,
};

fn relation_columns<'s>(op: &'static str, sort: &'s Sort) -> TermResult<&'s [Sort]> {
    match sort {
        Sort::Set(element) => match element.as_ref() {
            Sort::Tuple(columns) => Ok(columns),
            _ => Err(TermError::malformed(
                op,
                format!("expected a relation, got `{sort}`"),
            )),
        },
        _ => Err(TermError::malformed(
            op,
            format!("expected a relation, got `{sort}`"),
        )),
    }
}

fn same_sort(op: &'static str, lhs: Sort, rhs: Sort) -> TermResult<Sort> {
    if lhs != rhs {
        return Err(TermError::malformed(
            op,
            format!("operands have different sorts `{lhs}` and `{rhs}`"),
        ));
    }
    Ok(lhs)
}

impl Program {
    /// Computes the sort of `expr`.
    ///
    /// Only the checks needed to produce a result are performed: set operations require
    /// operands of equal sort, `join` requires matching inner columns, and calls must name a
    /// declared function or definition.
    pub fn sort_of(&self, expr: &Expression) -> TermResult<Sort> {
        match expr {
            Expression::ConstantRef(id) => Ok(self.decl(*id).sort().clone()),
            Expression::IntConstant(_) => Ok(Sort::Int),
            Expression::BooleanConstant(_) => Ok(Sort::Bool),
            Expression::EmptySet(sort) | Expression::UniverseSet(sort) => {
                if !sort.is_set() {
                    return Err(TermError::malformed(
                        "set literal",
                        format!("`{sort}` is not a set sort"),
                    ));
                }
                Ok(sort.clone())
            }
            Expression::Unary(op, inner) => match op {
                UnaryOp::Not => Ok(Sort::Bool),
                UnaryOp::Singleton => Sort::set(self.sort_of(inner)?),
                UnaryOp::Transpose => {
                    let sort = self.sort_of(inner)?;
                    let mut columns = relation_columns("transpose", &sort)?.to_vec();
                    columns.reverse();
                    Sort::relation(columns)
                }
                UnaryOp::TClosure => {
                    let sort = self.sort_of(inner)?;
                    let columns = relation_columns("tclosure", &sort)?;
                    if columns.len() != 2 || columns[0] != columns[1] {
                        return Err(TermError::malformed(
                            "tclosure",
                            format!("expected a homogeneous binary relation, got `{sort}`"),
                        ));
                    }
                    Ok(sort)
                }
                UnaryOp::Complement => self.sort_of(inner),
            },
            Expression::Binary(op, lhs, rhs) => match op {
                BinaryOp::Implies
                | BinaryOp::Eq
                | BinaryOp::Member
                | BinaryOp::Subset
                | BinaryOp::Lt
                | BinaryOp::Lte
                | BinaryOp::Gt
                | BinaryOp::Gte => Ok(Sort::Bool),
                BinaryOp::Union | BinaryOp::Intersection | BinaryOp::SetMinus => {
                    same_sort((*op).into(), self.sort_of(lhs)?, self.sort_of(rhs)?)
                }
                BinaryOp::Join => {
                    let (ls, rs) = (self.sort_of(lhs)?, self.sort_of(rhs)?);
                    let (lc, rc) = (relation_columns("join", &ls)?, relation_columns("join", &rs)?);
                    if lc.len() + rc.len() <= 2 {
                        return Err(TermError::malformed(
                            "join",
                            "joining two unary relations yields no column",
                        ));
                    }
                    if lc[lc.len() - 1] != rc[0] {
                        return Err(TermError::malformed(
                            "join",
                            format!("cannot join `{ls}` with `{rs}`: inner columns differ"),
                        ));
                    }
                    let columns = lc[..lc.len() - 1]
                        .iter()
                        .chain(rc[1..].iter())
                        .cloned()
                        .collect();
                    Sort::relation(columns)
                }
                BinaryOp::Product => {
                    let (ls, rs) = (self.sort_of(lhs)?, self.sort_of(rhs)?);
                    let columns = relation_columns("product", &ls)?
                        .iter()
                        .chain(relation_columns("product", &rs)?.iter())
                        .cloned()
                        .collect();
                    Sort::relation(columns)
                }
                BinaryOp::TupSel => {
                    let Expression::IntConstant(index) = lhs.as_ref() else {
                        return Err(TermError::malformed(
                            "tupSel",
                            "the column index must be an integer constant",
                        ));
                    };
                    match self.sort_of(rhs)? {
                        Sort::Tuple(columns) => usize::try_from(*index)
                            .ok()
                            .and_then(|i| columns.get(i).cloned())
                            .ok_or_else(|| {
                                TermError::malformed(
                                    "tupSel",
                                    format!(
                                        "column {index} is out of range for a tuple of arity {}",
                                        columns.len()
                                    ),
                                )
                            }),
                        other => Err(TermError::malformed(
                            "tupSel",
                            format!("expected a tuple, got `{other}`"),
                        )),
                    }
                }
            },
            Expression::MultiArity(op, args) => match op {
                MultiArityOp::And | MultiArityOp::Or | MultiArityOp::Distinct => Ok(Sort::Bool),
                MultiArityOp::MkTuple => {
                    let columns = args
                        .iter()
                        .map(|a| self.sort_of(a))
                        .collect::<TermResult<Vec<_>>>()?;
                    Sort::tuple(columns)
                }
                MultiArityOp::Insert => match args.last() {
                    Some(set) => self.sort_of(set),
                    None => Err(TermError::malformed("insert", "missing set operand")),
                },
            },
            Expression::Quantified { .. } => Ok(Sort::Bool),
            Expression::Ite { then_branch, .. } => self.sort_of(then_branch),
            Expression::Call { function, .. } => match self.lookup(function) {
                Some(id) => Ok(self.decl(id).sort().clone()),
                None => Err(TermError::malformed(
                    "call",
                    format!("`{function}` is not a declared function"),
                )),
            },
        }
    }
}
