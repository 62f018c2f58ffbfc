//! Relterm: a typed term model for sorted first-order logic with finite sets and tuples.
//!
//! The crate covers the solver-facing half of a relational-logic compilation:
//!  - [`sort::Sort`] and [`expr::Expression`] are closed enums describing SMT-LIB terms of the
//!    finite-sets theory (`member`, `subset`, `join`, `product`, `transpose`, `tclosure`, ...).
//!  - [`program::Program`] owns an arena of declarations addressed by [`decl::DeclId`] and the
//!    ordered lists of sorts, declarations, definitions and assertions.
//!  - [`printer`] renders a program as a deterministic SMT-LIB script (plain or colored).
//!  - [`parser`] reads the solver's model report (or a full script) back into a [`program::Program`].
//!
//! Example
//! ```
//! use relterm::prelude::*;
//!
//! let mut program = Program::new();
//! program.declare_sort("Atom", 0).unwrap();
//! let rel = Sort::relation(vec![Sort::atom()]).unwrap();
//! let a = program.declare_function("this_A", vec![], rel.clone()).unwrap();
//! program.assert(equals(
//!     Expression::ConstantRef(a),
//!     Expression::EmptySet(rel),
//! ));
//!
//! let text = print(&program).unwrap();
//! assert!(text.contains("(declare-fun this_A () (Set (Tuple Atom)))"));
//! assert!(text.ends_with("(assert (= this_A (as emptyset (Set (Tuple Atom)))))\n"));
//! ```

/// Declarations and the declaration arena.
pub mod decl;
/// Error type shared by the term model, printer and parser.
pub mod error;
/// Expressions, operators and free-function builders.
pub mod expr;
/// Reader for solver models and SMT-LIB scripts.
pub mod parser;
/// SMT-LIB serializer built on `pretty`.
pub mod printer;
/// Programs: ordered top-level commands plus the owning arena.
pub mod program;
/// Sorts of the finite-sets theory.
pub mod sort;
/// Sort inference over expressions.
pub mod typing;

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - Term model types (`Sort`, `Expression`, operators, declarations, `Program`)
    //! - Free-function builders from `expr::func`
    //! - Printer and parser entrypoints
    pub use crate::decl::{DeclArena, DeclId, Declaration};
    pub use crate::error::{TermError, TermResult};
    pub use crate::expr::func::*;
    pub use crate::expr::{BinaryOp, Expression, MultiArityOp, QuantifierOp, UnaryOp};
    pub use crate::parser::{parse_model, parse_script};
    pub use crate::printer::{PRELUDE, print, print_with_width};
    pub use crate::program::{Assertion, Program, SortDeclaration};
    pub use crate::sort::Sort;
}
