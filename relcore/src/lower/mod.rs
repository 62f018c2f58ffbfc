//! Lowering of an [`AlloyModel`] into a [`Program`] of the set/tuple dialect.
//!
//! A [`Translator`] lives for exactly one compilation. It first declares the built-in sorts
//! and relations, then one relation per signature and field, then emits the structural
//! assertions implied by the signature hierarchy, and finally lowers every fact.
//!
//! Existential witnesses introduced below a connective travel upwards in [`hoist::Lowered`]
//! until a construct able to bind them drains the list.

use log::{debug, info};
use relterm::{
    decl::DeclId,
    expr::{Expression, func::*},
    printer,
    program::Program,
    sort::Sort,
};

use crate::{
    ast::{AlloyExpr, AlloyModel, FieldRef, SigId},
    config::TranslatorConfig,
    error::{LowerError, LowerResult},
    names::NameAllocator,
};

mod cardinality;
mod expr;
mod hoist;
mod scope;
mod signature;

use scope::Scope;

pub const ATOM_UNIV: &str = "atomUniv";
pub const ATOM_NONE: &str = "atomNone";
pub const ATOM_IDEN: &str = "atomIden";

pub const UNARY_INT_TUP: &str = "UnaryIntTup";
pub const BINARY_INT_TUP: &str = "BinaryIntTup";
pub const TERNARY_INT_TUP: &str = "TernaryIntTup";

pub const VALUE_OF_UNARY: &str = "value_of_unaryIntTup";
pub const VALUE_OF_BINARY: &str = "value_of_binaryIntTup";
pub const VALUE_OF_TERNARY: &str = "value_of_ternaryIntTup";

/// Whether a formula sits directly under a fact, possibly through conjunctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Top,
    Nested,
}

#[derive(Debug, Clone, Copy)]
struct Builtins {
    univ: DeclId,
    none: DeclId,
    iden: DeclId,
}

/// State of a single compilation.
pub struct Translator<'a> {
    model: &'a AlloyModel,
    names: &'a mut NameAllocator,
    config: &'a TranslatorConfig,
    program: Program,
    builtins: Builtins,
    signatures: Vec<DeclId>,
    fields: Vec<Vec<DeclId>>,
}

fn unary_relation() -> LowerResult<Sort> {
    Ok(Sort::relation(vec![Sort::atom()])?)
}

fn int_tup_sort(name: &str) -> Sort {
    Sort::uninterpreted(name)
}

impl<'a> Translator<'a> {
    /// Creates a translator with the built-in sorts and relations already declared.
    pub fn new(
        model: &'a AlloyModel,
        names: &'a mut NameAllocator,
        config: &'a TranslatorConfig,
    ) -> LowerResult<Self> {
        if config.lowering.reset_names {
            names.reset();
        }

        let mut program = Program::new();
        let builtins = Self::declare_builtins(&mut program)?;
        Ok(Self {
            model,
            names,
            config,
            program,
            builtins,
            signatures: Vec::new(),
            fields: Vec::new(),
        })
    }

    fn declare_builtins(program: &mut Program) -> LowerResult<Builtins> {
        program.declare_sort(relterm::sort::ATOM, 0)?;
        for name in [UNARY_INT_TUP, BINARY_INT_TUP, TERNARY_INT_TUP] {
            program.declare_sort(name, 0)?;
        }

        for (function, input, width) in [
            (VALUE_OF_UNARY, UNARY_INT_TUP, 1),
            (VALUE_OF_BINARY, BINARY_INT_TUP, 2),
            (VALUE_OF_TERNARY, TERNARY_INT_TUP, 3),
        ] {
            program.declare_function(
                function,
                vec![int_tup_sort(input)],
                Sort::tuple(vec![Sort::Int; width])?,
            )?;
        }

        let unary = unary_relation()?;
        let binary = Sort::relation(vec![Sort::atom(), Sort::atom()])?;
        let univ = program.declare_function(ATOM_UNIV, vec![], unary.clone())?;
        let none = program.declare_function(ATOM_NONE, vec![], unary.clone())?;
        let iden = program.declare_function(ATOM_IDEN, vec![], binary)?;

        program.assert(equals(var(none), Expression::EmptySet(unary.clone())));
        program.assert(equals(var(univ), Expression::UniverseSet(unary)));

        let x = program.bound_variable("x", Sort::atom());
        let y = program.bound_variable("y", Sort::atom());
        let pair = mk_tuple(vec![var(x), var(y)])?;
        program.assert(forall(
            vec![x, y],
            equals(member(pair, var(iden)), equals(var(x), var(y))),
        )?);

        Ok(Builtins { univ, none, iden })
    }

    /// Runs the whole compilation and hands back the finished program.
    pub fn run(mut self) -> LowerResult<Program> {
        info!(
            "lowering {} signatures and {} facts",
            self.model.signatures().count(),
            self.model.facts().len()
        );

        self.declare_signatures()?;
        self.declare_fields()?;
        self.signature_constraints()?;
        if self.config.lowering.field_typing {
            self.field_typing()?;
        }
        self.field_multiplicities()?;

        let model = self.model;
        for fact in model.facts() {
            self.fact(&fact.name, &fact.body)?;
        }

        info!(
            "lowered model into {} declarations and {} assertions",
            self.program.function_declarations().count() + self.program.constant_declarations().count(),
            self.program.assertions().len()
        );
        Ok(self.program)
    }

    /// Lowers `body` as a closed formula and asserts it under `name`.
    fn fact(&mut self, name: &str, body: &AlloyExpr) -> LowerResult<()> {
        debug!("lowering fact `{name}`: {}", self.model.render(body));
        let lowered = self.lower(body, &Scope::default(), Position::Top)?;
        let formula = lowered.drain()?;
        self.program.assert_named(name, formula);
        Ok(())
    }

    fn sig_relation(&self, id: SigId) -> LowerResult<DeclId> {
        self.signatures.get(id.index()).copied().ok_or_else(|| {
            LowerError::unsupported(format!("reference to undeclared signature #{}", id.index()))
        })
    }

    fn field_relation(&self, field: FieldRef) -> LowerResult<DeclId> {
        self.fields
            .get(field.sig.index())
            .and_then(|fields| fields.get(field.index))
            .copied()
            .ok_or_else(|| {
                LowerError::unsupported(format!(
                    "reference to undeclared field #{} of signature #{}",
                    field.index,
                    field.sig.index()
                ))
            })
    }

    fn sort_of(&self, expr: &Expression) -> LowerResult<Sort> {
        Ok(self.program.sort_of(expr)?)
    }
}

/// Lowers `model` into a fresh program.
pub fn translate(
    model: &AlloyModel,
    names: &mut NameAllocator,
    config: &TranslatorConfig,
) -> LowerResult<Program> {
    Translator::new(model, names, config)?.run()
}

/// Lowers `model` and serializes the result at the configured width.
pub fn compile(
    model: &AlloyModel,
    names: &mut NameAllocator,
    config: &TranslatorConfig,
) -> LowerResult<String> {
    let program = translate(model, names, config)?;
    Ok(printer::print_with_width(&program, config.printer.width)?)
}
