use log::debug;
use relterm::{
    expr::{Expression, func::*},
    sort::Sort,
};

use crate::{
    ast::{AlloyExpr, ColumnType, FieldMultiplicity, FieldRef, Parent, QuantOp, SigFlags, SigId},
    error::{LowerError, LowerResult},
    lower::{Translator, unary_relation},
};

/// Symbol used for a relation label: `this/A` becomes `this_A`.
pub fn sanitize(label: &str) -> String {
    label.replace(['/', '\''], "_")
}

fn column_sort(column: ColumnType) -> Sort {
    match column {
        ColumnType::Sig(_) | ColumnType::Univ => Sort::atom(),
        ColumnType::Int => Sort::Int,
    }
}

impl Translator<'_> {
    pub(super) fn declare_signatures(&mut self) -> LowerResult<()> {
        let relation = unary_relation()?;
        let model = self.model;
        for (_, sig) in model.signatures() {
            let name = sanitize(&sig.label);
            debug!("declaring signature `{}` as `{name}`", sig.label);
            let decl = self.program.declare_function(name, vec![], relation.clone())?;
            self.signatures.push(decl);
        }
        Ok(())
    }

    pub(super) fn declare_fields(&mut self) -> LowerResult<()> {
        let model = self.model;
        for (_, sig) in model.signatures() {
            let owner = sanitize(&sig.label);
            let mut decls = Vec::with_capacity(sig.fields.len());
            for field in &sig.fields {
                if field.columns.is_empty() {
                    return Err(LowerError::unsupported(format!(
                        "field `{}` of `{}` without columns",
                        field.label, sig.label
                    )));
                }
                let name = format!("{owner}_{}", sanitize(&field.label));
                let columns = std::iter::once(Sort::atom())
                    .chain(field.columns.iter().copied().map(column_sort))
                    .collect();
                let sort = Sort::relation(columns)?;
                debug!("declaring field `{}.{}` as `{name}` : {sort}", sig.label, field.label);
                decls.push(self.program.declare_function(name, vec![], sort)?);
            }
            self.fields.push(decls);
        }
        Ok(())
    }

    /// Hierarchy, multiplicity markers, abstractness and disjointness of signatures.
    pub(super) fn signature_constraints(&mut self) -> LowerResult<()> {
        let model = self.model;
        for (id, sig) in model.signatures() {
            let relation = var(self.sig_relation(id)?);
            match sig.parent {
                Parent::TopLevel => {
                    let univ = var(self.builtins.univ);
                    self.program
                        .assert_named(format!("{} in univ", sig.label), subset(relation.clone(), univ));
                }
                Parent::Extends(parent) | Parent::Subset(parent) => {
                    let parent_label = self.label(parent)?;
                    let parent = var(self.sig_relation(parent)?);
                    if sig.parent.is_subset() && sig.flags.contains(SigFlags::EXACT) {
                        self.program.assert_named(
                            format!("{} = {parent_label}", sig.label),
                            equals(relation.clone(), parent),
                        );
                    } else {
                        self.program.assert_named(
                            format!("{} in {parent_label}", sig.label),
                            subset(relation.clone(), parent),
                        );
                    }
                }
            }

            if sig.flags.contains(SigFlags::ABSTRACT) {
                let children = model
                    .children(id)
                    .map(|child| self.sig_relation(child).map(var))
                    .collect::<LowerResult<Vec<_>>>()?;
                if !children.is_empty() {
                    self.program.assert_named(
                        format!("abstract {}", sig.label),
                        equals(relation, union_all(children)?),
                    );
                }
            }

            let markers = [
                (SigFlags::ONE, AlloyExpr::one as fn(AlloyExpr) -> AlloyExpr, "one"),
                (SigFlags::LONE, AlloyExpr::lone, "lone"),
                (SigFlags::SOME, AlloyExpr::some, "some"),
            ];
            for (flag, build, keyword) in markers {
                if sig.flags.contains(flag) {
                    self.fact(&format!("{keyword} {}", sig.label), &build(AlloyExpr::Sig(id)))?;
                }
            }
        }

        let top_level: Vec<SigId> = model
            .signatures()
            .filter(|(_, sig)| sig.parent.is_top_level())
            .map(|(id, _)| id)
            .collect();
        self.disjoint(&top_level)?;
        for (id, _) in model.signatures() {
            let children: Vec<SigId> = model.children(id).collect();
            self.disjoint(&children)?;
        }
        Ok(())
    }

    fn label(&self, id: SigId) -> LowerResult<String> {
        self.model
            .signature(id)
            .map(|sig| sig.label.clone())
            .ok_or_else(|| {
                LowerError::unsupported(format!(
                    "reference to undeclared signature #{}",
                    id.index()
                ))
            })
    }

    /// Asserts `A & B = none` for every pair of `sigs`.
    fn disjoint(&mut self, sigs: &[SigId]) -> LowerResult<()> {
        let empty = Expression::EmptySet(unary_relation()?);
        for (i, a) in sigs.iter().enumerate() {
            for b in &sigs[i + 1..] {
                let name = format!("disj {}, {}", self.label(*a)?, self.label(*b)?);
                let overlap = intersection(var(self.sig_relation(*a)?), var(self.sig_relation(*b)?));
                self.program.assert_named(name, equals(overlap, empty.clone()));
            }
        }
        Ok(())
    }

    fn column_relation(&self, column: ColumnType) -> LowerResult<Expression> {
        match column {
            ColumnType::Sig(sig) => Ok(var(self.sig_relation(sig)?)),
            ColumnType::Univ => Ok(var(self.builtins.univ)),
            ColumnType::Int => Err(LowerError::unsupported(
                "an Int column in a product of signatures",
            )),
        }
    }

    /// Constrains every field column to its declared signature.
    pub(super) fn field_typing(&mut self) -> LowerResult<()> {
        let model = self.model;
        for (id, sig) in model.signatures() {
            let owner = var(self.sig_relation(id)?);
            for (index, field) in sig.fields.iter().enumerate() {
                let relation = var(self.field_relation(FieldRef { sig: id, index })?);
                let name = format!("{} <: {}", sig.label, field.label);

                if !field.columns.iter().any(ColumnType::is_int) {
                    let bound = field.columns.iter().try_fold(owner.clone(), |acc, column| {
                        Ok::<_, LowerError>(product(acc, self.column_relation(*column)?))
                    })?;
                    self.program.assert_named(name, subset(relation, bound));
                    continue;
                }

                // Int columns have no relation to range over; only atom columns get a guard.
                let owner_var = self.fresh_bound(Sort::atom());
                let mut vars = vec![owner_var];
                let mut guards = vec![member(mk_tuple(vec![var(owner_var)])?, owner.clone())];
                for column in field.columns.iter().copied() {
                    let v = self.fresh_bound(column_sort(column));
                    vars.push(v);
                    if !column.is_int() {
                        guards.push(member(mk_tuple(vec![var(v)])?, self.column_relation(column)?));
                    }
                }
                let tuple = mk_tuple(vars.iter().copied().map(var).collect())?;
                let formula = forall(vars, implies(member(tuple, relation), and_all(guards)))?;
                self.program.assert_named(name, formula);
            }
        }
        Ok(())
    }

    /// `all this: S | mult this.f` for every single-column field declared `one`, `lone` or `some`.
    pub(super) fn field_multiplicities(&mut self) -> LowerResult<()> {
        let model = self.model;
        for (id, sig) in model.signatures() {
            for (index, field) in sig.fields.iter().enumerate() {
                let build: fn(AlloyExpr) -> AlloyExpr = match field.multiplicity {
                    FieldMultiplicity::Set => continue,
                    FieldMultiplicity::One => AlloyExpr::one,
                    FieldMultiplicity::Lone => AlloyExpr::lone,
                    FieldMultiplicity::Some => AlloyExpr::some,
                };
                if field.columns.len() != 1 {
                    return Err(LowerError::unsupported(format!(
                        "`{}` multiplicity on the {}-column field `{}.{}`",
                        field.multiplicity,
                        field.columns.len() + 1,
                        sig.label,
                        field.label
                    )));
                }

                let joined = AlloyExpr::var("this").join(AlloyExpr::Field(FieldRef { sig: id, index }));
                let body = AlloyExpr::quantify(QuantOp::All, "this", AlloyExpr::Sig(id), build(joined));
                self.fact(
                    &format!("{} {}.{}", field.multiplicity, sig.label, field.label),
                    &body,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn sanitize_replaces_path_and_prime() {
        assert_eq!(sanitize("this/A"), "this_A");
        assert_eq!(sanitize("util/ordering/Ord'"), "util_ordering_Ord_");
        assert_eq!(sanitize("Plain"), "Plain");
    }
}
