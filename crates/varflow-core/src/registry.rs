//! Arena-backed variable storage with name resolution

use crate::error::{CoreError, Result};
use crate::variable::{Formula, ValueSource, VarId, Variable};
use ahash::AHashMap;

/// Name resolution exposed to the formula compiler.
///
/// A one-method seam so the compiler can run against any variable store.
pub trait VariableResolver {
    /// Resolve a variable name to its id, or `None` if undefined
    fn resolve(&self, name: &str) -> Option<VarId>;
}

/// Owns all [`Variable`] records and resolves names to ids.
///
/// Variables live in an index-addressed arena; removal leaves a tombstone so
/// surviving ids stay valid, and freed slots are reused by later insertions.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    slots: Vec<Option<Variable>>,
    names: AHashMap<String, VarId>,
    free: Vec<VarId>,
}

impl VariableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live variables
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the registry holds no variables
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True if a variable with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Add an input (leaf) variable
    pub fn add_input(&mut self, name: &str, value: f64) -> Result<VarId> {
        self.insert(Variable::input(name, value))
    }

    /// Add a computed variable; it starts dirty
    pub fn add_computed(
        &mut self,
        name: &str,
        formula: Box<dyn Formula>,
        dependencies: Vec<VarId>,
    ) -> Result<VarId> {
        self.insert(Variable::computed(name, formula, dependencies))
    }

    fn insert(&mut self, variable: Variable) -> Result<VarId> {
        if self.names.contains_key(variable.name()) {
            return Err(CoreError::DuplicateVariable(variable.name().to_string()));
        }
        let name = variable.name().to_string();
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(variable);
                id
            }
            None => {
                let id = VarId(self.slots.len() as u32);
                self.slots.push(Some(variable));
                id
            }
        };
        self.names.insert(name, id);
        Ok(id)
    }

    /// Remove a variable, freeing its slot for reuse.
    ///
    /// The caller (the engine) is responsible for ensuring nothing still
    /// depends on it; the registry only manages storage.
    pub fn remove(&mut self, id: VarId) -> Option<Variable> {
        let variable = self.slots.get_mut(id.index())?.take()?;
        self.names.remove(variable.name());
        self.free.push(id);
        Some(variable)
    }

    /// Look up a variable by id
    pub fn get(&self, id: VarId) -> Option<&Variable> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Mutable lookup by id
    pub fn get_mut(&mut self, id: VarId) -> Option<&mut Variable> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Look up a variable by name
    pub fn by_name(&self, name: &str) -> Option<&Variable> {
        self.get(self.resolve(name)?)
    }

    /// Iterate over live `(id, variable)` pairs in arena order
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (VarId(i as u32), v)))
    }
}

impl VariableResolver for VariableRegistry {
    fn resolve(&self, name: &str) -> Option<VarId> {
        self.names.get(name).copied()
    }
}

impl ValueSource for VariableRegistry {
    fn value(&self, id: VarId) -> f64 {
        self.get(id).map_or(f64::NAN, |v| v.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_and_resolve() {
        let mut registry = VariableRegistry::new();
        let x = registry.add_input("x", 1.0).unwrap();
        let y = registry.add_input("y", 2.0).unwrap();

        assert_eq!(registry.resolve("x"), Some(x));
        assert_eq!(registry.resolve("y"), Some(y));
        assert_eq!(registry.resolve("z"), None);
        assert_eq!(registry.value(x), 1.0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = VariableRegistry::new();
        registry.add_input("x", 1.0).unwrap();
        let err = registry.add_input("x", 2.0).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateVariable(name) if name == "x"));
    }

    #[test]
    fn test_remove_keeps_other_ids_stable() {
        let mut registry = VariableRegistry::new();
        let x = registry.add_input("x", 1.0).unwrap();
        let y = registry.add_input("y", 2.0).unwrap();

        registry.remove(x).unwrap();
        assert_eq!(registry.resolve("x"), None);
        assert_eq!(registry.value(y), 2.0);

        // Freed slot is reused
        let z = registry.add_input("z", 3.0).unwrap();
        assert_eq!(z, x);
        assert_eq!(registry.value(z), 3.0);
    }

    #[test]
    fn test_stale_id_reads_nan() {
        let mut registry = VariableRegistry::new();
        let x = registry.add_input("x", 1.0).unwrap();
        registry.remove(x).unwrap();
        assert!(registry.value(x).is_nan());
    }
}
