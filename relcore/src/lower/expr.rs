use log::trace;
use relterm::{
    decl::DeclId,
    expr::{Expression, func::*},
    sort::Sort,
};

use crate::{
    ast::{AlloyExpr, BinaryOp, Builtin, ListOp, QuantOp, UnaryOp, VarDecl},
    error::{LowerError, LowerResult},
    lower::{
        BINARY_INT_TUP, Position, TERNARY_INT_TUP, Translator, UNARY_INT_TUP, VALUE_OF_BINARY,
        VALUE_OF_TERNARY, VALUE_OF_UNARY, int_tup_sort,
        hoist::{Hoist, Lowered, Pending, merge},
        scope::Scope,
        unary_relation,
    },
};

/// Variables introduced by the declarations of one quantifier.
struct Binding {
    vars: Vec<DeclId>,
    guards: Vec<Expression>,
    scope: Scope,
}

/// A symbolic tuple ranging over the element sort of some relation.
struct Witness {
    vars: Vec<DeclId>,
    tuple: Expression,
    all_int: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Multiplicity {
    Some,
    One,
    Lone,
}

/// Strips integer casts, which are the identity once lowered.
pub(super) fn uncast(mut expr: &AlloyExpr) -> &AlloyExpr {
    while let AlloyExpr::Unary(UnaryOp::CastToInt | UnaryOp::CastToSignedInt, inner) = expr {
        expr = inner.as_ref();
    }
    expr
}

fn is_counted(expr: &AlloyExpr) -> bool {
    matches!(uncast(expr), AlloyExpr::Unary(UnaryOp::Cardinality, _))
}

fn and_non_trivial(terms: impl IntoIterator<Item = Expression>) -> Expression {
    and_all(terms.into_iter().filter(|t| !t.is_true()))
}

impl Translator<'_> {
    pub(super) fn lower(
        &mut self,
        expr: &AlloyExpr,
        scope: &Scope,
        position: Position,
    ) -> LowerResult<Lowered> {
        match expr {
            AlloyExpr::Sig(id) => Ok(Lowered::new(var(self.sig_relation(*id)?))),
            AlloyExpr::Field(field) => Ok(Lowered::new(var(self.field_relation(*field)?))),
            AlloyExpr::Builtin(builtin) => Ok(Lowered::new(self.builtin(*builtin)?)),
            AlloyExpr::Var(name) => scope
                .get(name)
                .map(|id| Lowered::new(var(id)))
                .ok_or_else(|| LowerError::Scope { name: name.clone() }),
            AlloyExpr::IntLiteral(n) => Ok(Lowered::new(singleton(mk_tuple(vec![int(*n)])?))),
            AlloyExpr::Unary(op, inner) => self.unary(expr, *op, inner, scope),
            AlloyExpr::Binary(op, lhs, rhs) => self.binary(expr, *op, lhs, rhs, scope, position),
            AlloyExpr::List(ListOp::And, operands) => self.conjunction(operands, scope, position),
            AlloyExpr::List(ListOp::Or, operands) => self.disjunction(operands, scope),
            AlloyExpr::Quantified { op, decls, body } => self.quantifier(*op, decls, body, scope),
        }
    }

    fn builtin(&self, builtin: Builtin) -> LowerResult<Expression> {
        match builtin {
            Builtin::Univ => Ok(var(self.builtins.univ)),
            Builtin::None => Ok(var(self.builtins.none)),
            Builtin::Iden => Ok(var(self.builtins.iden)),
            Builtin::Int => Err(LowerError::unsupported("the built-in signature Int")),
        }
    }

    pub(super) fn fresh_bound(&mut self, sort: Sort) -> DeclId {
        let name = self.names.fresh_variable();
        self.program.bound_variable(name, sort)
    }

    /// Turns a scalar reference into a one-element relation.
    fn promote(&self, expr: Expression) -> LowerResult<Expression> {
        let Some(id) = expr.as_decl() else {
            return Ok(expr);
        };
        let sort = self.program.decl(id).sort();
        if sort.is_atomic() {
            Ok(singleton(mk_tuple(vec![expr])?))
        } else if matches!(sort, Sort::Tuple(_)) {
            Ok(singleton(expr))
        } else {
            Ok(expr)
        }
    }

    /// Lowers `expr` in a relational position.
    pub(super) fn relation(&mut self, expr: &AlloyExpr, scope: &Scope) -> LowerResult<Lowered> {
        let Lowered { expr, pending } = self.lower(expr, scope, Position::Nested)?;
        Ok(Lowered::with(self.promote(expr)?, pending))
    }

    fn binary_relation(
        &mut self,
        expr: &AlloyExpr,
        inner: &AlloyExpr,
        scope: &Scope,
    ) -> LowerResult<Lowered> {
        let lowered = self.relation(inner, scope)?;
        let sort = self.sort_of(&lowered.expr)?;
        if sort.arity() != 2 {
            return Err(LowerError::unsupported(format!(
                "`{}` over a relation of sort {sort}",
                self.model.render(expr)
            )));
        }
        Ok(lowered)
    }

    fn formula(&mut self, expr: &AlloyExpr, scope: &Scope) -> LowerResult<Expression> {
        self.lower(expr, scope, Position::Nested)?.drain()
    }

    fn unary(
        &mut self,
        expr: &AlloyExpr,
        op: UnaryOp,
        inner: &AlloyExpr,
        scope: &Scope,
    ) -> LowerResult<Lowered> {
        match op {
            UnaryOp::Not => Ok(Lowered::new(not(self.formula(inner, scope)?))),
            UnaryOp::Closure => Ok(self.binary_relation(expr, inner, scope)?.map(closure)),
            UnaryOp::ReflexiveClosure => {
                let iden = var(self.builtins.iden);
                Ok(self
                    .binary_relation(expr, inner, scope)?
                    .map(|r| union(closure(r), iden)))
            }
            UnaryOp::Transpose => Ok(self.binary_relation(expr, inner, scope)?.map(transpose)),
            UnaryOp::CastToInt | UnaryOp::CastToSignedInt => {
                self.lower(inner, scope, Position::Nested)
            }
            UnaryOp::Cardinality => Err(LowerError::unsupported(format!(
                "`{}` outside of a comparison with an integer literal",
                self.model.render(expr)
            ))),
            UnaryOp::No => self.no(inner, scope),
            UnaryOp::Some => self.multiplicity(Multiplicity::Some, inner, scope),
            UnaryOp::One => self.multiplicity(Multiplicity::One, inner, scope),
            UnaryOp::Lone => self.multiplicity(Multiplicity::Lone, inner, scope),
        }
    }

    /// Allocates one variable per column of `sort`, an integer column ranging over
    /// `UnaryIntTup` through its value.
    fn witness(&mut self, sort: &Sort, what: &AlloyExpr) -> LowerResult<Witness> {
        let columns = sort.columns().ok_or_else(|| {
            LowerError::unsupported(format!(
                "`{}` of non-relational sort {sort}",
                self.model.render(what)
            ))
        })?;

        let mut vars = Vec::with_capacity(columns.len());
        let mut elements = Vec::with_capacity(columns.len());
        let mut all_int = true;
        for column in columns {
            match column {
                Sort::Int => {
                    let u = self.fresh_bound(int_tup_sort(UNARY_INT_TUP));
                    elements.push(tup_sel(0, call(VALUE_OF_UNARY, vec![var(u)])));
                    vars.push(u);
                }
                Sort::Uninterpreted(_) => {
                    let x = self.fresh_bound(column.clone());
                    elements.push(var(x));
                    vars.push(x);
                    all_int = false;
                }
                other => {
                    return Err(LowerError::unsupported(format!(
                        "`{}` with a column of sort {other}",
                        self.model.render(what)
                    )));
                }
            }
        }
        Ok(Witness {
            vars,
            tuple: mk_tuple(elements)?,
            all_int,
        })
    }

    fn multiplicity(
        &mut self,
        mult: Multiplicity,
        inner: &AlloyExpr,
        scope: &Scope,
    ) -> LowerResult<Lowered> {
        let Lowered {
            expr: set,
            mut pending,
        } = self.relation(inner, scope)?;
        let sort = self.sort_of(&set)?;
        let Witness {
            mut vars,
            tuple,
            all_int,
        } = self.witness(&sort, inner)?;

        let mut guard = match mult {
            Multiplicity::Some => member(tuple.clone(), set),
            Multiplicity::One => equals(singleton(tuple.clone()), set),
            Multiplicity::Lone => subset(set, singleton(tuple.clone())),
        };

        let companion = match vars.len() {
            2 => Some((BINARY_INT_TUP, VALUE_OF_BINARY)),
            3 => Some((TERNARY_INT_TUP, VALUE_OF_TERNARY)),
            _ => None,
        };
        if all_int && let Some((companion, value_of)) = companion {
            let b = self.fresh_bound(int_tup_sort(companion));
            guard = and(guard, equals(call(value_of, vec![var(b)]), tuple));
            vars.push(b);
        }

        trace!("hoisting {mult:?} witness over {} variables", vars.len());
        pending.push(Hoist { vars, guard });
        Ok(Lowered::with(Expression::TRUE, pending))
    }

    fn no(&mut self, inner: &AlloyExpr, scope: &Scope) -> LowerResult<Lowered> {
        let set = self.relation(inner, scope)?;
        let sort = self.sort_of(&set.expr)?;
        if !set.pending.is_empty() {
            return Ok(set.map(|s| equals(s, Expression::EmptySet(sort))));
        }
        let Witness { vars, tuple, .. } = self.witness(&sort, inner)?;
        Ok(Lowered::new(forall(vars, not(member(tuple, set.expr)))?))
    }

    /// Lowers both operands of a relational operator.
    fn operands(
        &mut self,
        lhs: &AlloyExpr,
        rhs: &AlloyExpr,
        scope: &Scope,
    ) -> LowerResult<(Expression, Expression, Pending)> {
        let a = self.relation(lhs, scope)?;
        let b = self.relation(rhs, scope)?;
        Ok((a.expr, b.expr, merge([a.pending, b.pending])))
    }

    fn binary(
        &mut self,
        expr: &AlloyExpr,
        op: BinaryOp,
        lhs: &AlloyExpr,
        rhs: &AlloyExpr,
        scope: &Scope,
        position: Position,
    ) -> LowerResult<Lowered> {
        match op {
            BinaryOp::Equals
            | BinaryOp::NotEquals
            | BinaryOp::Lt
            | BinaryOp::Lte
            | BinaryOp::Gt
            | BinaryOp::Gte
                if is_counted(lhs) || is_counted(rhs) =>
            {
                self.cardinality(expr, op, lhs, rhs, scope, position)
            }

            BinaryOp::Join => {
                let (a, b, pending) = self.operands(lhs, rhs, scope)?;
                if self.sort_of(&a)?.arity() == 1 && self.sort_of(&b)?.arity() == 1 {
                    return Err(LowerError::unsupported(format!(
                        "`{}` joins two unary relations",
                        self.model.render(expr)
                    )));
                }
                Ok(Lowered::with(join(a, b), pending))
            }
            BinaryOp::Union => self.set_operation(lhs, rhs, scope, union),
            BinaryOp::Intersection => self.set_operation(lhs, rhs, scope, intersection),
            BinaryOp::Difference => self.set_operation(lhs, rhs, scope, difference),
            BinaryOp::Product => self.set_operation(lhs, rhs, scope, product),
            BinaryOp::Equals => self.set_operation(lhs, rhs, scope, equals),
            BinaryOp::In => self.set_operation(lhs, rhs, scope, subset),
            BinaryOp::NotEquals => {
                let inner = self.set_operation(lhs, rhs, scope, equals)?;
                Ok(Lowered::new(not(inner.drain()?)))
            }
            BinaryOp::NotIn => {
                let inner = self.set_operation(lhs, rhs, scope, subset)?;
                Ok(Lowered::new(not(inner.drain()?)))
            }

            BinaryOp::And => self.conjunction([lhs, rhs], scope, position),
            BinaryOp::Or => self.disjunction([lhs, rhs], scope),
            BinaryOp::Implies => {
                let a = self.formula(lhs, scope)?;
                let b = self.formula(rhs, scope)?;
                Ok(Lowered::new(implies(a, b)))
            }
            BinaryOp::Iff => {
                let a = self.formula(lhs, scope)?;
                let b = self.formula(rhs, scope)?;
                Ok(Lowered::new(equals(a, b)))
            }

            BinaryOp::Lt => self.comparison(lhs, rhs, scope, lt),
            BinaryOp::Lte => self.comparison(lhs, rhs, scope, lte),
            BinaryOp::Gt => self.comparison(lhs, rhs, scope, gt),
            BinaryOp::Gte => self.comparison(lhs, rhs, scope, gte),
        }
    }

    fn set_operation(
        &mut self,
        lhs: &AlloyExpr,
        rhs: &AlloyExpr,
        scope: &Scope,
        build: fn(Expression, Expression) -> Expression,
    ) -> LowerResult<Lowered> {
        let (a, b, pending) = self.operands(lhs, rhs, scope)?;
        Ok(Lowered::with(build(a, b), pending))
    }

    fn conjunction<'e>(
        &mut self,
        operands: impl IntoIterator<Item = &'e AlloyExpr>,
        scope: &Scope,
        position: Position,
    ) -> LowerResult<Lowered> {
        let mut terms = Vec::new();
        let mut pending = Pending::new();
        for operand in operands {
            let lowered = self.lower(operand, scope, position)?;
            terms.push(lowered.expr);
            pending.extend(lowered.pending);
        }
        let conjunction = Lowered::with(and_non_trivial(terms), pending);
        Ok(Lowered::new(conjunction.drain()?))
    }

    fn disjunction<'e>(
        &mut self,
        operands: impl IntoIterator<Item = &'e AlloyExpr>,
        scope: &Scope,
    ) -> LowerResult<Lowered> {
        let terms = operands
            .into_iter()
            .map(|operand| self.formula(operand, scope))
            .collect::<LowerResult<Vec<_>>>()?;
        Ok(Lowered::new(or_all(terms)))
    }

    /// Integer value of `expr`: a literal as is, a unary `Int` relation through a hoisted
    /// `UnaryIntTup` witness.
    fn int_value(&mut self, expr: &AlloyExpr, scope: &Scope) -> LowerResult<(Expression, Pending)> {
        if let AlloyExpr::IntLiteral(n) = uncast(expr) {
            return Ok((int(*n), Pending::new()));
        }

        let Lowered {
            expr: set,
            mut pending,
        } = self.relation(expr, scope)?;
        let sort = self.sort_of(&set)?;
        if sort != Sort::relation(vec![Sort::Int])? {
            return Err(LowerError::unsupported(format!(
                "integer comparison over `{}` of sort {sort}",
                self.model.render(expr)
            )));
        }

        let u = self.fresh_bound(int_tup_sort(UNARY_INT_TUP));
        let value = call(VALUE_OF_UNARY, vec![var(u)]);
        pending.push(Hoist {
            vars: vec![u],
            guard: equals(singleton(value.clone()), set),
        });
        Ok((tup_sel(0, value), pending))
    }

    fn comparison(
        &mut self,
        lhs: &AlloyExpr,
        rhs: &AlloyExpr,
        scope: &Scope,
        build: fn(Expression, Expression) -> Expression,
    ) -> LowerResult<Lowered> {
        let (a, pa) = self.int_value(lhs, scope)?;
        let (b, pb) = self.int_value(rhs, scope)?;
        Ok(Lowered::with(build(a, b), merge([pa, pb])))
    }

    /// Binds the variables of `decls` left to right; later bounds see earlier variables.
    fn bind(&mut self, decls: &[VarDecl], scope: &Scope) -> LowerResult<Binding> {
        let mut scope = scope.clone();
        let mut vars = Vec::new();
        let mut guards = Vec::new();

        for decl in decls {
            let bound = self.relation(&decl.bound, &scope)?;
            let sort = self.sort_of(&bound.expr)?;
            if !bound.pending.is_empty() || sort != unary_relation()? {
                return Err(LowerError::unsupported(format!(
                    "quantifier bound `{}` of sort {sort}",
                    self.model.render(&decl.bound)
                )));
            }

            let mut inner = scope.clone();
            for name in &decl.names {
                let x = self.fresh_bound(Sort::atom());
                guards.push(member(mk_tuple(vec![var(x)])?, bound.expr.clone()));
                vars.push(x);
                inner = inner.bind(name, x);
            }
            scope = inner;
        }

        Ok(Binding {
            vars,
            guards,
            scope,
        })
    }

    fn quantifier(
        &mut self,
        op: QuantOp,
        decls: &[VarDecl],
        body: &AlloyExpr,
        scope: &Scope,
    ) -> LowerResult<Lowered> {
        match op {
            QuantOp::All => {
                let xs = self.bind(decls, scope)?;
                let body = self.formula(body, &xs.scope)?;
                Ok(Lowered::new(forall(xs.vars, implies(and_all(xs.guards), body))?))
            }
            QuantOp::No => {
                let xs = self.bind(decls, scope)?;
                let body = self.formula(body, &xs.scope)?;
                Ok(Lowered::new(forall(
                    xs.vars,
                    implies(and_all(xs.guards), not(body)),
                )?))
            }
            QuantOp::Some => {
                let xs = self.bind(decls, scope)?;
                let inner = self.lower(body, &xs.scope, Position::Nested)?;
                let mut pending = Pending::new();
                pending.push(Hoist {
                    vars: xs.vars,
                    guard: and_all(xs.guards),
                });
                pending.extend(inner.pending);
                Ok(Lowered::with(inner.expr, pending))
            }
            QuantOp::One => {
                let xs = self.bind(decls, scope)?;
                let inner = self.lower(body, &xs.scope, Position::Nested)?;
                let ys = self.bind(decls, scope)?;
                let other = self.formula(body, &ys.scope)?;

                let same = and_all(
                    ys.vars
                        .iter()
                        .zip(&xs.vars)
                        .map(|(y, x)| equals(var(*y), var(*x))),
                );
                let mut antecedent = ys.guards;
                antecedent.push(other);
                let unique = forall(ys.vars, implies(and_non_trivial(antecedent), same))?;

                let mut pending = Pending::new();
                pending.push(Hoist {
                    vars: xs.vars,
                    guard: and_all(xs.guards),
                });
                pending.extend(inner.pending);
                Ok(Lowered::with(and_non_trivial([inner.expr, unique]), pending))
            }
            QuantOp::Lone => {
                let xs = self.bind(decls, scope)?;
                let first = self.formula(body, &xs.scope)?;
                let ys = self.bind(decls, scope)?;
                let second = self.formula(body, &ys.scope)?;

                let same = and_all(
                    xs.vars
                        .iter()
                        .zip(&ys.vars)
                        .map(|(x, y)| equals(var(*x), var(*y))),
                );
                let antecedent = xs
                    .guards
                    .into_iter()
                    .chain([first])
                    .chain(ys.guards)
                    .chain([second]);
                let vars = xs.vars.into_iter().chain(ys.vars).collect();
                Ok(Lowered::new(forall(
                    vars,
                    implies(and_non_trivial(antecedent), same),
                )?))
            }
        }
    }
}
