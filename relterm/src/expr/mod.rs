//! Expression tree of the set/tuple dialect.
//!
//! Expressions own their sub-expressions and refer to declarations only through
//! [`DeclId`] handles, so a tree can be cloned, compared and moved freely while the program's
//! arena stays the single owner of every declaration.
//!
//! Every operator enum carries its SMT-LIB spelling through `strum`; the printer uses the
//! `Display` side and the reader the `FromStr` side, which keeps both directions in sync.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{decl::DeclId, sort::Sort};

pub mod func;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum UnaryOp {
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "singleton")]
    Singleton,
    #[strum(serialize = "transpose")]
    Transpose,
    #[strum(serialize = "tclosure")]
    TClosure,
    #[strum(serialize = "complement")]
    Complement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum BinaryOp {
    #[strum(serialize = "=>")]
    Implies,
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "member")]
    Member,
    #[strum(serialize = "subset")]
    Subset,
    #[strum(serialize = "union")]
    Union,
    #[strum(serialize = "intersection")]
    Intersection,
    #[strum(serialize = "setminus")]
    SetMinus,
    #[strum(serialize = "join")]
    Join,
    #[strum(serialize = "product")]
    Product,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Lte,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Gte,
    /// Tuple projection; the left operand is the column index.
    #[strum(serialize = "tupSel")]
    TupSel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum MultiArityOp {
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "distinct")]
    Distinct,
    #[strum(serialize = "mkTuple")]
    MkTuple,
    /// `(insert e1 ... en S)`: the last operand is the set.
    #[strum(serialize = "insert")]
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum QuantifierOp {
    #[strum(serialize = "forall")]
    Forall,
    #[strum(serialize = "exists")]
    Exists,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// Reference to a function, constant, definition or bound variable.
    ConstantRef(DeclId),
    IntConstant(i64),
    BooleanConstant(bool),
    /// `(as emptyset S)`; the sort is the set sort itself.
    EmptySet(Sort),
    /// `(as univset S)`; the sort is the set sort itself.
    UniverseSet(Sort),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    MultiArity(MultiArityOp, Vec<Expression>),
    Quantified {
        op: QuantifierOp,
        vars: Vec<DeclId>,
        body: Box<Expression>,
    },
    Ite {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    /// Application of a declared or defined function, by name.
    Call {
        function: String,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub const TRUE: Expression = Expression::BooleanConstant(true);
    pub const FALSE: Expression = Expression::BooleanConstant(false);

    #[inline]
    pub fn is_true(&self) -> bool {
        matches!(self, Expression::BooleanConstant(true))
    }

    #[inline]
    pub fn is_false(&self) -> bool {
        matches!(self, Expression::BooleanConstant(false))
    }

    /// Declaration referenced by a bare [`Expression::ConstantRef`].
    pub fn as_decl(&self) -> Option<DeclId> {
        match self {
            Expression::ConstantRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Visit every declaration referenced in this expression, including bound variables.
    pub fn for_each_decl(&self, f: &mut impl FnMut(DeclId)) {
        match self {
            Expression::ConstantRef(id) => f(*id),
            Expression::IntConstant(_)
            | Expression::BooleanConstant(_)
            | Expression::EmptySet(_)
            | Expression::UniverseSet(_) => {}
            Expression::Unary(_, e) => e.for_each_decl(f),
            Expression::Binary(_, a, b) => {
                a.for_each_decl(f);
                b.for_each_decl(f);
            }
            Expression::MultiArity(_, args) | Expression::Call { args, .. } => {
                args.iter().for_each(|a| a.for_each_decl(f))
            }
            Expression::Quantified { vars, body, .. } => {
                vars.iter().copied().for_each(&mut *f);
                body.for_each_decl(f);
            }
            Expression::Ite {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.for_each_decl(f);
                then_branch.for_each_decl(f);
                else_branch.for_each_decl(f);
            }
        }
    }
}
