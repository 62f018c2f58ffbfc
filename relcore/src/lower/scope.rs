use im::OrdMap;
use relterm::decl::DeclId;

/// Variables visible at some point of a fact, by source name.
///
/// Binding returns a new scope and leaves `self` untouched, so sibling subterms never see
/// each other's variables.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    vars: OrdMap<String, DeclId>,
}

impl Scope {
    pub fn bind(&self, name: &str, id: DeclId) -> Scope {
        Scope {
            vars: self.vars.update(name.to_string(), id),
        }
    }

    pub fn get(&self, name: &str) -> Option<DeclId> {
        self.vars.get(name).copied()
    }
}
