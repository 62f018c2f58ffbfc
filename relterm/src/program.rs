use std::collections::BTreeMap;

use crate::{
    decl::{DeclArena, DeclId, Declaration},
    error::{TermError, TermResult},
    expr::Expression,
    sort::Sort,
};

/// `(declare-sort name arity)`, optionally annotated with the cardinality a model reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDeclaration {
    pub name: String,
    pub arity: u32,
    pub cardinality: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// Printed as a `; name` comment line before the assertion.
    pub name: Option<String>,
    pub expr: Expression,
}

/// A complete solver program, also used as the in-memory form of a solver model.
///
/// The program owns every declaration through its [`DeclArena`]. Top-level names
/// (sorts, functions, constants, definitions) are unique; bound variables live only in the
/// arena and may shadow each other freely.
#[derive(Debug, Clone, Default)]
pub struct Program {
    arena: DeclArena,
    sorts: Vec<SortDeclaration>,
    function_declarations: Vec<DeclId>,
    constant_declarations: Vec<DeclId>,
    function_definitions: Vec<DeclId>,
    assertions: Vec<Assertion>,
    index: BTreeMap<String, DeclId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_fresh(&self, constructor: &'static str, name: &str) -> TermResult<()> {
        if self.index.contains_key(name) {
            return Err(TermError::malformed(
                constructor,
                format!("the name `{name}` is already declared in this program"),
            ));
        }
        Ok(())
    }

    fn register(&mut self, decl: Declaration) -> DeclId {
        let name = decl.name().to_string();
        let id = self.arena.alloc(decl);
        self.index.insert(name, id);
        id
    }

    pub fn declare_sort(&mut self, name: impl Into<String>, arity: u32) -> TermResult<()> {
        let name = name.into();
        if self.sort_declaration(&name).is_some() {
            return Err(TermError::malformed(
                "declare_sort",
                format!("the sort `{name}` is already declared in this program"),
            ));
        }
        self.sorts.push(SortDeclaration {
            name,
            arity,
            cardinality: None,
        });
        Ok(())
    }

    /// Records the cardinality reported for an already declared sort.
    pub fn set_sort_cardinality(&mut self, name: &str, cardinality: u64) -> TermResult<()> {
        match self.sorts.iter_mut().find(|s| s.name == name) {
            Some(sort) => {
                sort.cardinality = Some(cardinality);
                Ok(())
            }
            None => Err(TermError::malformed(
                "set_sort_cardinality",
                format!("the sort `{name}` is not declared"),
            )),
        }
    }

    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        inputs: Vec<Sort>,
        output: Sort,
    ) -> TermResult<DeclId> {
        let name = name.into();
        self.check_fresh("declare_function", &name)?;
        let id = self.register(Declaration::Function {
            name,
            inputs,
            output,
        });
        self.function_declarations.push(id);
        Ok(id)
    }

    pub fn declare_constant(&mut self, name: impl Into<String>, sort: Sort) -> TermResult<DeclId> {
        let name = name.into();
        self.check_fresh("declare_constant", &name)?;
        let id = self.register(Declaration::Constant { name, sort });
        self.constant_declarations.push(id);
        Ok(id)
    }

    /// Adds a `define-fun`. Every input must be a bound variable of this program.
    pub fn define_function(
        &mut self,
        name: impl Into<String>,
        inputs: Vec<DeclId>,
        output: Sort,
        body: Expression,
    ) -> TermResult<DeclId> {
        let name = name.into();
        self.check_fresh("define_function", &name)?;
        if let Some(bad) = inputs
            .iter()
            .find(|id| !matches!(self.arena.get(**id), Declaration::BoundVariable { .. }))
        {
            return Err(TermError::malformed(
                "define_function",
                format!(
                    "parameter `{}` of `{name}` is not a bound variable",
                    self.arena.get(*bad).name()
                ),
            ));
        }
        let id = self.register(Declaration::Definition {
            name,
            inputs,
            output,
            body,
        });
        self.function_definitions.push(id);
        Ok(id)
    }

    /// Allocates a bound variable. Bound variables are not part of the top-level namespace.
    pub fn bound_variable(&mut self, name: impl Into<String>, sort: Sort) -> DeclId {
        self.arena.alloc(Declaration::BoundVariable {
            name: name.into(),
            sort,
        })
    }

    pub fn assert(&mut self, expr: Expression) {
        self.assertions.push(Assertion { name: None, expr });
    }

    pub fn assert_named(&mut self, name: impl Into<String>, expr: Expression) {
        self.assertions.push(Assertion {
            name: Some(name.into()),
            expr,
        });
    }

    #[inline]
    pub fn decl(&self, id: DeclId) -> &Declaration {
        self.arena.get(id)
    }

    /// Looks up a top-level function, constant or definition by name.
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.index.get(name).copied()
    }

    pub fn sort_declaration(&self, name: &str) -> Option<&SortDeclaration> {
        self.sorts.iter().find(|s| s.name == name)
    }

    pub fn arena(&self) -> &DeclArena {
        &self.arena
    }

    pub fn sorts(&self) -> &[SortDeclaration] {
        &self.sorts
    }

    pub fn function_declarations(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.function_declarations
            .iter()
            .map(|id| (*id, self.arena.get(*id)))
    }

    pub fn constant_declarations(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.constant_declarations
            .iter()
            .map(|id| (*id, self.arena.get(*id)))
    }

    pub fn function_definitions(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.function_definitions
            .iter()
            .map(|id| (*id, self.arena.get(*id)))
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }
}
