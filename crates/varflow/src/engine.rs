//! The reactive evaluation engine
//!
//! Ties the variable registry, dependency graph, function table and change
//! observers together: defining a formula registers its dependencies, setting
//! an input invalidates and recomputes every transitive dependent in
//! dependency order, and observers hear about each settled value change.

use crate::error::Result;
use ahash::AHashMap;
use varflow_core::{
    CoreError, DependencyGraph, ValueSource, VarId, Variable, VariableKind, VariableRegistry,
    VariableResolver,
};
use varflow_formula::{compile, parse_formula, FunctionRegistry};

/// A settled value change, delivered to observers
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// Name of the variable that changed
    pub name: String,
    /// Value before the change (NaN placeholder on a first computation)
    pub old: f64,
    /// Value after the change
    pub new: f64,
}

/// Handle for removing a change observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer callback. Must not mutate the engine it observes; callbacks run
/// synchronously on the mutating thread after the graph has settled.
pub type ChangeCallback = Box<dyn FnMut(&ValueChange) + Send>;

/// Counters from one propagation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Number of computed variables that were recomputed
    pub recomputed: usize,
    /// Number of variables whose value actually changed (bitwise), the
    /// input itself included
    pub changed: usize,
}

/// The reactive formula engine.
///
/// Single-writer by construction: every mutating operation takes `&mut self`,
/// so a full "set value → propagate → notify" transaction is exclusive.
///
/// # Example
///
/// ```rust
/// use varflow::Engine;
///
/// let mut engine = Engine::new();
/// engine.define_input("x", 1.0).unwrap();
/// engine.define_formula("y", "x * 2").unwrap();
///
/// engine.set_value("x", 21.0).unwrap();
/// assert_eq!(engine.value("y").unwrap(), 42.0);
/// ```
pub struct Engine {
    registry: VariableRegistry,
    graph: DependencyGraph,
    functions: FunctionRegistry,
    observers: AHashMap<String, Vec<(SubscriptionId, ChangeCallback)>>,
    next_subscription: u64,
}

impl Engine {
    /// Create an engine with the built-in function set
    pub fn new() -> Self {
        Self::with_functions(FunctionRegistry::new())
    }

    /// Create an engine with a caller-supplied function table
    pub fn with_functions(functions: FunctionRegistry) -> Self {
        Self {
            registry: VariableRegistry::new(),
            graph: DependencyGraph::new(),
            functions,
            observers: AHashMap::new(),
            next_subscription: 0,
        }
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// True if no variables are defined
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Read-only view of a variable's current record, cached value included.
    /// For a dirty computed variable the cached value is stale; use
    /// [`value`](Self::value) to force a recomputation.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.registry.by_name(name)
    }

    /// Iterate over all variables in arena order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.registry.iter().map(|(_, v)| v)
    }

    /// Names referenced by a computed variable's formula; `None` for inputs
    /// and unknown names
    pub fn references(&self, name: &str) -> Option<Vec<&str>> {
        self.get(name)?.formula().map(|f| f.variable_names())
    }

    /// Define an input (leaf) variable
    pub fn define_input(&mut self, name: &str, value: f64) -> Result<VarId> {
        Ok(self.registry.add_input(name, value)?)
    }

    /// Define a computed variable from formula text.
    ///
    /// Tokenizes, parses and compiles the formula, then registers the
    /// variable and its dependency edges. The variable starts dirty; its
    /// first read computes the value. Fails on any lexical/parse/compile
    /// error or a duplicate name, in which case nothing was registered.
    ///
    /// A fresh name cannot close a dependency cycle (no edges point at it
    /// yet); rebinding an existing variable goes through
    /// [`set_formula`](Self::set_formula), which does cycle-check.
    pub fn define_formula(&mut self, name: &str, formula: &str) -> Result<VarId> {
        if self.registry.contains(name) {
            return Err(CoreError::DuplicateVariable(name.to_string()).into());
        }

        let parsed = parse_formula(formula)?;
        let compiled = compile(&parsed, &self.registry, &self.functions)?;
        let dependencies = compiled.var_ids.clone();

        let id = self
            .registry
            .add_computed(name, Box::new(compiled), dependencies.clone())?;
        self.graph.add_edges(id, &dependencies);
        Ok(id)
    }

    /// Rebind an existing variable to a new formula.
    ///
    /// Works on computed variables and on inputs (an input becomes computed).
    /// The new formula is compiled and cycle-checked before anything is
    /// touched, so on failure the old binding and edges remain exactly in
    /// force. On success the variable and all its transitive dependents
    /// become dirty; recomputation happens on the next read or propagation.
    pub fn set_formula(&mut self, name: &str, formula: &str) -> Result<()> {
        let id = self.resolve(name)?;

        let parsed = parse_formula(formula)?;
        let compiled = compile(&parsed, &self.registry, &self.functions)?;
        let dependencies = compiled.var_ids.clone();

        if let Some(via) = self.graph.would_cycle(id, &dependencies) {
            return Err(CoreError::CircularDependency {
                variable: name.to_string(),
                via: self.name_of(via),
            }
            .into());
        }

        self.graph.clear_precedents(id);
        self.graph.add_edges(id, &dependencies);

        if let Some(var) = self.registry.get_mut(id) {
            var.set_kind(VariableKind::Computed {
                formula: Box::new(compiled),
                dependencies,
                dirty: true,
            });
        }
        for dependent in self.graph.collect_dependents(id) {
            if let Some(var) = self.registry.get_mut(dependent) {
                var.set_dirty(true);
            }
        }
        Ok(())
    }

    /// Set an input variable's value and propagate.
    ///
    /// If the new value is bit-identical to the current one, nothing happens:
    /// no recomputation, no notification, zeroed stats. Otherwise every
    /// transitive dependent is marked dirty once, recomputed in dependency
    /// order, and one notification per actually-changed variable (the input
    /// included) is delivered after the graph has settled.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<PropagationStats> {
        let id = self.resolve(name)?;

        let old = match self.registry.get(id) {
            Some(var) if var.is_input() => var.value(),
            _ => return Err(CoreError::NotAnInput(name.to_string()).into()),
        };

        let mut stats = PropagationStats::default();
        if old.to_bits() == value.to_bits() {
            return Ok(stats);
        }

        if let Some(var) = self.registry.get_mut(id) {
            var.set_value(value);
        }

        let mut changes = vec![ValueChange {
            name: name.to_string(),
            old,
            new: value,
        }];

        for dependent in self.graph.collect_dependents(id) {
            if let Some(var) = self.registry.get_mut(dependent) {
                var.set_dirty(true);
            }
        }

        for dependent in self.graph.recalc_order(id) {
            stats.recomputed += self.ensure_clean(dependent, &mut changes);
        }

        stats.changed = changes.len();
        self.notify(&changes);
        Ok(stats)
    }

    /// Current value of a variable.
    ///
    /// A clean variable returns its cached value. A dirty computed variable
    /// is recomputed on demand (dependencies first), cached, and any settled
    /// changes are notified, exactly as in a propagation pass.
    pub fn value(&mut self, name: &str) -> Result<f64> {
        let id = self.resolve(name)?;

        let mut changes = Vec::new();
        self.ensure_clean(id, &mut changes);
        self.notify(&changes);

        Ok(self.registry.value(id))
    }

    /// One-shot evaluation of formula text, without registering anything.
    ///
    /// Referenced computed variables are settled first, exactly as a read
    /// through [`value`](Self::value) would settle them, so the result never
    /// sees a stale or placeholder cache entry.
    pub fn evaluate(&mut self, formula: &str) -> Result<f64> {
        let parsed = parse_formula(formula)?;
        let compiled = compile(&parsed, &self.registry, &self.functions)?;

        let mut changes = Vec::new();
        for &id in &compiled.var_ids {
            self.ensure_clean(id, &mut changes);
        }
        self.notify(&changes);

        Ok(compiled.program.eval(&self.registry))
    }

    /// Remove a variable.
    ///
    /// Fails with [`CoreError::HasDependents`] while any computed variable
    /// still references it. Its observers are dropped with it.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let id = self.resolve(name)?;

        if self.graph.dependents_of(id).next().is_some() {
            return Err(CoreError::HasDependents(name.to_string()).into());
        }

        self.graph.clear_edges(id);
        self.registry.remove(id);
        self.observers.remove(name);
        Ok(())
    }

    /// Subscribe to settled value changes of one variable.
    ///
    /// Callbacks for a variable run in subscription order. A callback must
    /// not mutate this engine (hard caller contract, not guarded at runtime).
    pub fn subscribe(&mut self, name: &str, callback: ChangeCallback) -> Result<SubscriptionId> {
        self.resolve(name)?;

        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers
            .entry(name.to_string())
            .or_default()
            .push((id, callback));
        Ok(id)
    }

    /// Drop a subscription. Returns false if the id is no longer known.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        for callbacks in self.observers.values_mut() {
            if let Some(index) = callbacks.iter().position(|(id, _)| *id == subscription) {
                drop(callbacks.remove(index));
                return true;
            }
        }
        false
    }

    // === Internals ===

    fn resolve(&self, name: &str) -> Result<VarId> {
        self.registry
            .resolve(name)
            .ok_or_else(|| CoreError::UnknownVariable(name.to_string()).into())
    }

    fn name_of(&self, id: VarId) -> String {
        self.registry
            .get(id)
            .map_or_else(|| id.to_string(), |v| v.name().to_string())
    }

    /// Recompute `id` if dirty, dependencies first. Returns the number of
    /// recomputations performed; appends to `changes` when a cached value
    /// actually changed. Each variable transitions to clean exactly once per
    /// pass, so diamonds never recompute twice.
    fn ensure_clean(&mut self, id: VarId, changes: &mut Vec<ValueChange>) -> usize {
        let dependencies = match self.registry.get(id) {
            Some(var) if var.is_dirty() => var.dependencies().to_vec(),
            _ => return 0,
        };

        let mut recomputed = 0;
        for dep in dependencies {
            recomputed += self.ensure_clean(dep, changes);
        }

        let (old, new) = {
            let Some(var) = self.registry.get(id) else {
                return recomputed;
            };
            let Some(formula) = var.formula() else {
                return recomputed;
            };
            (var.value(), formula.eval(&self.registry))
        };

        if let Some(var) = self.registry.get_mut(id) {
            var.set_value(new);
            var.set_dirty(false);
            if old.to_bits() != new.to_bits() {
                changes.push(ValueChange {
                    name: var.name().to_string(),
                    old,
                    new,
                });
            }
        }
        recomputed + 1
    }

    /// Deliver settled changes to observers, in change order then
    /// subscription order
    fn notify(&mut self, changes: &[ValueChange]) {
        for change in changes {
            if let Some(callbacks) = self.observers.get_mut(&change.name) {
                for (_, callback) in callbacks.iter_mut() {
                    callback(change);
                }
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
