use log::trace;

/// Source of fresh names for lowering-generated symbols.
///
/// Each namespace counts independently: `_x<n>` for bound variables, `_a<n>` for auxiliary
/// constants and `_S<n>` for auxiliary sets. Counters start at one and only grow until
/// [`NameAllocator::reset`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameAllocator {
    variables: u64,
    atoms: u64,
    sets: u64,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_variable(&mut self) -> String {
        self.variables += 1;
        let name = format!("_x{}", self.variables);
        trace!("allocated bound variable `{name}`");
        name
    }

    pub fn fresh_atom(&mut self) -> String {
        self.atoms += 1;
        let name = format!("_a{}", self.atoms);
        trace!("allocated auxiliary atom `{name}`");
        name
    }

    pub fn fresh_set(&mut self) -> String {
        self.sets += 1;
        let name = format!("_S{}", self.sets);
        trace!("allocated auxiliary set `{name}`");
        name
    }

    /// Restarts every namespace from zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_count_independently() {
        let mut names = NameAllocator::new();
        assert_eq!(names.fresh_variable(), "_x1");
        assert_eq!(names.fresh_variable(), "_x2");
        assert_eq!(names.fresh_atom(), "_a1");
        assert_eq!(names.fresh_set(), "_S1");
        assert_eq!(names.fresh_variable(), "_x3");
    }

    #[test]
    fn reset_restarts_every_namespace() {
        let mut names = NameAllocator::new();
        for _ in 0..5 {
            names.fresh_variable();
            names.fresh_atom();
        }
        names.fresh_set();
        names.reset();
        assert_eq!(names, NameAllocator::new());
        assert_eq!(names.fresh_variable(), "_x1");
        assert_eq!(names.fresh_atom(), "_a1");
        assert_eq!(names.fresh_set(), "_S1");
    }
}
