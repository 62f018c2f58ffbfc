use std::fmt;

use crate::{expr::Expression, sort::Sort};

/// Stable handle to a [`Declaration`] stored in a [`DeclArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// `(declare-fun name (inputs...) output)`; a nullary function is a relation constant.
    Function {
        name: String,
        inputs: Vec<Sort>,
        output: Sort,
    },
    /// `(declare-const name sort)`
    Constant { name: String, sort: Sort },
    /// `(define-fun name ((x S)...) output body)`, parameters are bound variables.
    Definition {
        name: String,
        inputs: Vec<DeclId>,
        output: Sort,
        body: Expression,
    },
    /// Variable introduced by a quantifier or a definition's parameter list.
    BoundVariable { name: String, sort: Sort },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Function { name, .. }
            | Declaration::Constant { name, .. }
            | Declaration::Definition { name, .. }
            | Declaration::BoundVariable { name, .. } => name,
        }
    }

    /// Sort of a reference to this declaration. Functions and definitions report their
    /// output sort.
    pub fn sort(&self) -> &Sort {
        match self {
            Declaration::Function { output, .. } | Declaration::Definition { output, .. } => {
                output
            }
            Declaration::Constant { sort, .. } | Declaration::BoundVariable { sort, .. } => sort,
        }
    }
}

/// Append-only storage for declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclArena {
    decls: Vec<Declaration>,
}

impl DeclArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    /// Returns the declaration behind `id`.
    ///
    /// Ids are only handed out by [`DeclArena::alloc`], so an id coming from this arena always
    /// resolves; ids from another arena are a caller bug and panic.
    #[inline]
    pub fn get(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }
}
