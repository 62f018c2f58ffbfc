//! Lowering of elaborated relational specifications into the set/tuple dialect of
//! [`relterm`].
//!
//! Callers build an [`ast::AlloyModel`] (signatures, fields and facts), pick a
//! [`config::TranslatorConfig`] and hand both to [`lower::translate`] together with a
//! [`names::NameAllocator`]. The resulting [`relterm::program::Program`] is printed with
//! [`relterm::printer`]; [`lower::compile`] does both steps at once.
//!
//! ```
//! use relcore::prelude::*;
//!
//! let mut model = AlloyModel::new();
//! let a = model.add_signature("this/A", Parent::TopLevel, SigFlags::ONE);
//! model.add_fact("nonempty", AlloyExpr::Sig(a).some());
//!
//! let mut names = NameAllocator::new();
//! let text = compile(&model, &mut names, &TranslatorConfig::default()).unwrap();
//! assert!(text.contains("(declare-fun this_A () (Set (Tuple Atom)))"));
//! assert!(text.contains("; one this/A"));
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod lower;
pub mod names;

pub mod prelude {
    pub use crate::ast::{
        AlloyExpr, AlloyModel, BinaryOp, Builtin, ColumnType, Fact, Field, FieldMultiplicity,
        FieldRef, ListOp, Parent, QuantOp, SigFlags, SigId, Signature, UnaryOp, VarDecl,
    };
    pub use crate::config::TranslatorConfig;
    pub use crate::error::{LowerError, LowerResult};
    pub use crate::lower::{Translator, compile, translate};
    pub use crate::names::NameAllocator;
}
