use log::trace;
use relterm::{
    decl::DeclId,
    expr::{Expression, func::*},
};
use smallvec::SmallVec;

use crate::error::LowerResult;

/// An existential prefix that could not be quantified where it was created.
#[derive(Debug, Clone)]
pub(crate) struct Hoist {
    pub vars: Vec<DeclId>,
    pub guard: Expression,
}

pub(crate) type Pending = SmallVec<Hoist, 2>;

/// Result of lowering one subterm: the term itself plus the witnesses it still owes.
#[derive(Debug, Clone)]
pub(crate) struct Lowered {
    pub expr: Expression,
    pub pending: Pending,
}

impl Lowered {
    pub fn new(expr: Expression) -> Self {
        Self {
            expr,
            pending: Pending::new(),
        }
    }

    pub fn with(expr: Expression, pending: Pending) -> Self {
        Self { expr, pending }
    }

    pub fn map(self, f: impl FnOnce(Expression) -> Expression) -> Self {
        Self {
            expr: f(self.expr),
            pending: self.pending,
        }
    }

    /// Closes every pending witness around the term: `(exists (vars) (and guards... expr))`.
    pub fn drain(self) -> LowerResult<Expression> {
        if self.pending.is_empty() {
            return Ok(self.expr);
        }

        let mut vars = Vec::new();
        let mut conjuncts = Vec::new();
        for hoist in self.pending {
            vars.extend(hoist.vars);
            if !hoist.guard.is_true() {
                conjuncts.push(hoist.guard);
            }
        }
        if !self.expr.is_true() {
            conjuncts.push(self.expr);
        }
        trace!("draining {} hoisted variables", vars.len());
        Ok(exists(vars, and_all(conjuncts))?)
    }
}

/// Concatenates the pending lists of several subterms, in order.
pub(crate) fn merge(parts: impl IntoIterator<Item = Pending>) -> Pending {
    let mut pending = Pending::new();
    for part in parts {
        pending.extend(part);
    }
    pending
}
