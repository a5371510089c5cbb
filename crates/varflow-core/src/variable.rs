//! Variable records and the traits connecting them to compiled formulas

use std::fmt;

/// Index of a variable in a [`VariableRegistry`](crate::VariableRegistry) arena.
///
/// Ids are stable for the lifetime of the variable: the registry never moves a
/// live record, so a `VarId` captured at compile time remains a valid accessor
/// until that variable is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub u32);

impl VarId {
    /// Arena slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Read access to current variable values, keyed by [`VarId`].
///
/// Implemented by the registry; compiled formulas evaluate against this so
/// they never perform a name lookup at runtime.
pub trait ValueSource {
    /// Current cached value of the variable. Callers pass ids they obtained
    /// from the same registry, so a stale id is a logic error; implementations
    /// return NaN rather than panic.
    fn value(&self, id: VarId) -> f64;
}

/// A compiled formula body, evaluated over a snapshot of variable values.
///
/// Implementations must be pure: two calls without an intervening change in
/// the underlying values return bit-identical results.
pub trait Formula: fmt::Debug + Send {
    /// Evaluate against the given values
    fn eval(&self, values: &dyn ValueSource) -> f64;

    /// Names of the variables this formula references (diagnostics only)
    fn variable_names(&self) -> Vec<&str>;
}

/// The two kinds of variable
#[derive(Debug)]
pub enum VariableKind {
    /// A leaf value set directly by the caller
    Input,
    /// A value derived from a compiled formula over other variables
    Computed {
        /// The compiled formula body
        formula: Box<dyn Formula>,
        /// Direct dependencies, resolved at compile time
        dependencies: Vec<VarId>,
        /// True when the cached value is stale relative to the dependencies
        dirty: bool,
    },
}

/// A named variable with a cached numeric value
#[derive(Debug)]
pub struct Variable {
    name: String,
    value: f64,
    kind: VariableKind,
}

impl Variable {
    /// Create an input (leaf) variable
    pub fn input(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            kind: VariableKind::Input,
        }
    }

    /// Create a computed variable. It starts dirty with a NaN placeholder
    /// value; the first read or propagation pass computes the real value.
    pub fn computed(
        name: impl Into<String>,
        formula: Box<dyn Formula>,
        dependencies: Vec<VarId>,
    ) -> Self {
        Self {
            name: name.into(),
            value: f64::NAN,
            kind: VariableKind::Computed {
                formula,
                dependencies,
                dirty: true,
            },
        }
    }

    /// Variable name (unique within its registry)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cached value. For a dirty computed variable this is stale; the engine
    /// recomputes before exposing it through its read path.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Overwrite the cached value
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Variable kind
    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    /// Replace the kind in place (formula rebinding). The cached value is
    /// kept; the caller marks the variable dirty as appropriate.
    pub fn set_kind(&mut self, kind: VariableKind) {
        self.kind = kind;
    }

    /// True for input (leaf) variables
    pub fn is_input(&self) -> bool {
        matches!(self.kind, VariableKind::Input)
    }

    /// Direct dependencies of a computed variable; empty for inputs
    pub fn dependencies(&self) -> &[VarId] {
        match &self.kind {
            VariableKind::Input => &[],
            VariableKind::Computed { dependencies, .. } => dependencies,
        }
    }

    /// Staleness of a computed variable; inputs are never dirty
    pub fn is_dirty(&self) -> bool {
        matches!(self.kind, VariableKind::Computed { dirty: true, .. })
    }

    /// Set the dirty flag on a computed variable; no-op for inputs
    pub fn set_dirty(&mut self, value: bool) {
        if let VariableKind::Computed { dirty, .. } = &mut self.kind {
            *dirty = value;
        }
    }

    /// The compiled formula of a computed variable
    pub fn formula(&self) -> Option<&dyn Formula> {
        match &self.kind {
            VariableKind::Input => None,
            VariableKind::Computed { formula, .. } => Some(formula.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Const(f64);

    impl Formula for Const {
        fn eval(&self, _values: &dyn ValueSource) -> f64 {
            self.0
        }

        fn variable_names(&self) -> Vec<&str> {
            Vec::new()
        }
    }

    #[test]
    fn test_input_variable() {
        let v = Variable::input("x", 2.5);
        assert_eq!(v.name(), "x");
        assert_eq!(v.value(), 2.5);
        assert!(v.is_input());
        assert!(!v.is_dirty());
        assert!(v.dependencies().is_empty());
    }

    #[test]
    fn test_computed_starts_dirty() {
        let v = Variable::computed("y", Box::new(Const(1.0)), vec![VarId(0)]);
        assert!(!v.is_input());
        assert!(v.is_dirty());
        assert!(v.value().is_nan());
        assert_eq!(v.dependencies(), &[VarId(0)]);
    }

    #[test]
    fn test_dirty_flag_ignored_on_inputs() {
        let mut v = Variable::input("x", 0.0);
        v.set_dirty(true);
        assert!(!v.is_dirty());
    }
}
