use std::fmt;

use crate::error::{TermError, TermResult};

/// Name of the uninterpreted sort used for relational atoms.
pub const ATOM: &str = "Atom";

/// Sort of a term.
///
/// The element sort of a [`Sort::Set`] is always a tuple or an atomic sort; the checked
/// constructors [`Sort::set`] and [`Sort::relation`] reject anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    /// A sort introduced with `declare-sort` (e.g. `Atom`, `UnaryIntTup`).
    Uninterpreted(String),
    Set(Box<Sort>),
    Tuple(Vec<Sort>),
    Int,
    Real,
    String,
    Bool,
}

impl Sort {
    /// The `Atom` sort.
    pub fn atom() -> Self {
        Sort::Uninterpreted(ATOM.to_string())
    }

    pub fn uninterpreted(name: impl Into<String>) -> Self {
        Sort::Uninterpreted(name.into())
    }

    /// Tuple sort over `elements`; a tuple has at least one column.
    pub fn tuple(elements: Vec<Sort>) -> TermResult<Self> {
        if elements.is_empty() {
            return Err(TermError::malformed(
                "Sort::tuple",
                "a tuple sort needs at least one element sort",
            ));
        }
        Ok(Sort::Tuple(elements))
    }

    /// Set sort over `element`. Nested sets are rejected.
    pub fn set(element: Sort) -> TermResult<Self> {
        if element.is_set() {
            return Err(TermError::malformed(
                "Sort::set",
                format!("the element sort of a set cannot itself be a set, got `{element}`"),
            ));
        }
        Ok(Sort::Set(Box::new(element)))
    }

    /// Relation sort `(Set (Tuple columns...))`.
    pub fn relation(columns: Vec<Sort>) -> TermResult<Self> {
        Sort::set(Sort::tuple(columns)?)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        matches!(self, Sort::Set(_))
    }

    /// `true` for sorts that are neither sets nor tuples.
    #[inline]
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Sort::Set(_) | Sort::Tuple(_))
    }

    /// Columns of a relation sort, or of a bare tuple sort.
    pub fn columns(&self) -> Option<&[Sort]> {
        match self {
            Sort::Set(element) => match element.as_ref() {
                Sort::Tuple(columns) => Some(columns),
                _ => None,
            },
            Sort::Tuple(columns) => Some(columns),
            _ => None,
        }
    }

    /// Number of columns of a relation or tuple sort, `0` otherwise.
    pub fn arity(&self) -> usize {
        self.columns().map_or(0, <[Sort]>::len)
    }

    /// Element sort of a set.
    pub fn element(&self) -> Option<&Sort> {
        match self {
            Sort::Set(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Uninterpreted(name) => write!(f, "{name}"),
            Sort::Set(element) => write!(f, "(Set {element})"),
            Sort::Tuple(elements) => {
                write!(f, "(Tuple")?;
                for element in elements {
                    write!(f, " {element}")?;
                }
                write!(f, ")")
            }
            Sort::Int => write!(f, "Int"),
            Sort::Real => write!(f, "Real"),
            Sort::String => write!(f, "String"),
            Sort::Bool => write!(f, "Bool"),
        }
    }
}
