//! Elaborated relational input: signatures, fields and facts.
//!
//! The tree is produced by an upstream elaborator; this module only fixes its shape and
//! offers builder helpers. Signatures are addressed by [`SigId`] and fields by [`FieldRef`],
//! both handed out by [`AlloyModel`].

use std::fmt::{self, Write};

use bitflags::bitflags;
use strum::{Display, EnumIs};

/// Index of a signature inside its [`AlloyModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SigId(u32);

impl SigId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Markers attached to a signature declaration.
    #[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct SigFlags: u16 {
        /// Every atom of the signature belongs to one of its `extends` children.
        const ABSTRACT = 1 << 0;

        /// The signature contains exactly one atom.
        const ONE = 1 << 1;

        /// The signature contains at most one atom.
        const LONE = 1 << 2;

        /// The signature contains at least one atom.
        const SOME = 1 << 3;

        /// A subset signature equal to its parent rather than included in it.
        const EXACT = 1 << 4;

        const META = 1 << 5;
        const PRIVATE = 1 << 6;
        const ENUM = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum Parent {
    TopLevel,
    /// `sig A extends B`: disjoint from its siblings.
    Extends(SigId),
    /// `sig A in B`
    Subset(SigId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Builtin {
    #[strum(serialize = "univ")]
    Univ,
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "iden")]
    Iden,
    #[strum(serialize = "Int")]
    Int,
}

/// Declared type of one field column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum ColumnType {
    Sig(SigId),
    Univ,
    Int,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum FieldMultiplicity {
    #[default]
    #[strum(serialize = "set")]
    Set,
    #[strum(serialize = "one")]
    One,
    #[strum(serialize = "lone")]
    Lone,
    #[strum(serialize = "some")]
    Some,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: String,
    /// Columns after the owning signature's column.
    pub columns: Vec<ColumnType>,
    pub multiplicity: FieldMultiplicity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub sig: SigId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Qualified label such as `this/A`.
    pub label: String,
    pub parent: Parent,
    pub flags: SigFlags,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOp {
    #[strum(serialize = "no")]
    No,
    #[strum(serialize = "some")]
    Some,
    #[strum(serialize = "one")]
    One,
    #[strum(serialize = "lone")]
    Lone,
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "^")]
    Closure,
    #[strum(serialize = "*")]
    ReflexiveClosure,
    #[strum(serialize = "~")]
    Transpose,
    #[strum(serialize = "int")]
    CastToInt,
    #[strum(serialize = "Int")]
    CastToSignedInt,
    #[strum(serialize = "#")]
    Cardinality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    #[strum(serialize = ".")]
    Join,
    #[strum(serialize = "+")]
    Union,
    #[strum(serialize = "&")]
    Intersection,
    #[strum(serialize = "-")]
    Difference,
    #[strum(serialize = "->")]
    Product,
    #[strum(serialize = "=")]
    Equals,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "!in")]
    NotIn,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "=>")]
    Implies,
    #[strum(serialize = "<=>")]
    Iff,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Lte,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ListOp {
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum QuantOp {
    #[strum(serialize = "all")]
    All,
    #[strum(serialize = "some")]
    Some,
    #[strum(serialize = "no")]
    No,
    #[strum(serialize = "one")]
    One,
    #[strum(serialize = "lone")]
    Lone,
}

/// `x, y: bound`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub names: Vec<String>,
    pub bound: AlloyExpr,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, bound: AlloyExpr) -> Self {
        Self {
            names: vec![name.into()],
            bound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlloyExpr {
    Sig(SigId),
    Field(FieldRef),
    Builtin(Builtin),
    /// Variable bound by an enclosing quantifier.
    Var(String),
    IntLiteral(i64),
    Unary(UnaryOp, Box<AlloyExpr>),
    Binary(BinaryOp, Box<AlloyExpr>, Box<AlloyExpr>),
    List(ListOp, Vec<AlloyExpr>),
    Quantified {
        op: QuantOp,
        decls: Vec<VarDecl>,
        body: Box<AlloyExpr>,
    },
}

macro_rules! unary_builders {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(self) -> Self {
                AlloyExpr::Unary(UnaryOp::$op, Box::new(self))
            }
        )*
    };
}

macro_rules! binary_builders {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(self, rhs: AlloyExpr) -> Self {
                AlloyExpr::Binary(BinaryOp::$op, Box::new(self), Box::new(rhs))
            }
        )*
    };
}

impl AlloyExpr {
    pub fn var(name: impl Into<String>) -> Self {
        AlloyExpr::Var(name.into())
    }

    pub fn univ() -> Self {
        AlloyExpr::Builtin(Builtin::Univ)
    }

    pub fn none() -> Self {
        AlloyExpr::Builtin(Builtin::None)
    }

    pub fn iden() -> Self {
        AlloyExpr::Builtin(Builtin::Iden)
    }

    pub fn quantified(op: QuantOp, decls: Vec<VarDecl>, body: AlloyExpr) -> Self {
        AlloyExpr::Quantified {
            op,
            decls,
            body: Box::new(body),
        }
    }

    /// `op name: bound | body` with a single variable.
    pub fn quantify(op: QuantOp, name: impl Into<String>, bound: AlloyExpr, body: AlloyExpr) -> Self {
        Self::quantified(op, vec![VarDecl::new(name, bound)], body)
    }

    unary_builders! {
        no => No,
        some => Some,
        one => One,
        lone => Lone,
        not => Not,
        closure => Closure,
        reflexive_closure => ReflexiveClosure,
        transpose => Transpose,
        cast_to_int => CastToInt,
        cast_to_signed_int => CastToSignedInt,
        cardinality => Cardinality,
    }

    binary_builders! {
        join => Join,
        union => Union,
        intersection => Intersection,
        difference => Difference,
        product => Product,
        equals => Equals,
        not_equals => NotEquals,
        in_ => In,
        not_in => NotIn,
        and => And,
        or => Or,
        implies => Implies,
        iff => Iff,
        lt => Lt,
        lte => Lte,
        gt => Gt,
        gte => Gte,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub name: String,
    pub body: AlloyExpr,
}

/// A complete elaborated specification.
#[derive(Debug, Clone, Default)]
pub struct AlloyModel {
    signatures: Vec<Signature>,
    facts: Vec<Fact>,
}

impl AlloyModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signature; its parent, if any, must already be part of this model.
    pub fn add_signature(
        &mut self,
        label: impl Into<String>,
        parent: Parent,
        flags: SigFlags,
    ) -> SigId {
        let id = SigId(self.signatures.len() as u32);
        self.signatures.push(Signature {
            label: label.into(),
            parent,
            flags,
            fields: Vec::new(),
        });
        id
    }

    /// Adds a field to `sig` and returns a handle to it.
    ///
    /// `sig` must come from [`AlloyModel::add_signature`] on this model; a handle from another
    /// model is a caller bug and panics.
    pub fn add_field(
        &mut self,
        sig: SigId,
        label: impl Into<String>,
        columns: Vec<ColumnType>,
        multiplicity: FieldMultiplicity,
    ) -> FieldRef {
        let fields = &mut self.signatures[sig.index()].fields;
        fields.push(Field {
            label: label.into(),
            columns,
            multiplicity,
        });
        FieldRef {
            sig,
            index: fields.len() - 1,
        }
    }

    pub fn add_fact(&mut self, name: impl Into<String>, body: AlloyExpr) {
        self.facts.push(Fact {
            name: name.into(),
            body,
        });
    }

    pub fn signature(&self, id: SigId) -> Option<&Signature> {
        self.signatures.get(id.index())
    }

    pub fn field(&self, field: FieldRef) -> Option<&Field> {
        self.signature(field.sig)
            .and_then(|s| s.fields.get(field.index))
    }

    pub fn signatures(&self) -> impl Iterator<Item = (SigId, &Signature)> {
        self.signatures
            .iter()
            .enumerate()
            .map(|(i, s)| (SigId(i as u32), s))
    }

    /// Signatures declared as `extends` children of `parent`.
    pub fn children(&self, parent: SigId) -> impl Iterator<Item = SigId> + '_ {
        self.signatures()
            .filter(move |(_, s)| s.parent == Parent::Extends(parent))
            .map(|(id, _)| id)
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Renders `expr` in relational syntax, resolving signature and field labels.
    pub fn render(&self, expr: &AlloyExpr) -> String {
        let mut out = String::new();
        let _ = self.render_into(expr, &mut out);
        out
    }

    fn render_into(&self, expr: &AlloyExpr, out: &mut String) -> fmt::Result {
        match expr {
            AlloyExpr::Sig(id) => match self.signature(*id) {
                Some(sig) => write!(out, "{}", sig.label),
                None => write!(out, "<sig {}>", id.index()),
            },
            AlloyExpr::Field(field) => match self.field(*field) {
                Some(f) => write!(out, "{}", f.label),
                None => write!(out, "<field {}.{}>", field.sig.index(), field.index),
            },
            AlloyExpr::Builtin(b) => write!(out, "{b}"),
            AlloyExpr::Var(name) => write!(out, "{name}"),
            AlloyExpr::IntLiteral(n) => write!(out, "{n}"),
            AlloyExpr::Unary(op, inner) => {
                let space = if op.to_string().chars().all(char::is_alphabetic) {
                    " "
                } else {
                    ""
                };
                write!(out, "{op}{space}(")?;
                self.render_into(inner, out)?;
                write!(out, ")")
            }
            AlloyExpr::Binary(op, lhs, rhs) => {
                write!(out, "(")?;
                self.render_into(lhs, out)?;
                match op {
                    BinaryOp::Join => write!(out, "{op}")?,
                    _ => write!(out, " {op} ")?,
                }
                self.render_into(rhs, out)?;
                write!(out, ")")
            }
            AlloyExpr::List(op, operands) => {
                write!(out, "(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(out, " {op} ")?;
                    }
                    self.render_into(operand, out)?;
                }
                write!(out, ")")
            }
            AlloyExpr::Quantified { op, decls, body } => {
                write!(out, "({op} ")?;
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        write!(out, ", ")?;
                    }
                    write!(out, "{}: ", decl.names.join(", "))?;
                    self.render_into(&decl.bound, out)?;
                }
                write!(out, " | ")?;
                self.render_into(body, out)?;
                write!(out, ")")
            }
        }
    }
}
