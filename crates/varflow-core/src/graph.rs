//! Dependency tracking between variables
//!
//! Tracks which variables depend on which other variables, enabling
//! invalidation and ordered recomputation when an input changes.

use crate::variable::VarId;
use ahash::{AHashMap, AHashSet};

/// Dependency graph over registry variables.
///
/// Holds ids only; the registry owns the variables themselves. Edges run both
/// ways: `dependents` maps a variable to the variables that reference it,
/// `precedents` maps a variable to the variables it references.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Variable → variables that depend on it
    dependents: AHashMap<VarId, AHashSet<VarId>>,
    /// Variable → variables it depends on
    precedents: AHashMap<VarId, AHashSet<VarId>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` depends on each id in `precedents`.
    ///
    /// The caller runs [`would_cycle`](Self::would_cycle) first; this method
    /// inserts unconditionally.
    pub fn add_edges(&mut self, dependent: VarId, precedents: &[VarId]) {
        for &precedent in precedents {
            self.dependents
                .entry(precedent)
                .or_default()
                .insert(dependent);
            self.precedents
                .entry(dependent)
                .or_default()
                .insert(precedent);
        }
    }

    /// Remove only the depends-on edges of `variable`, keeping edges from
    /// variables that depend on it. Used when a formula is rebound: the new
    /// dependency set replaces the old one, but dependents stay wired.
    pub fn clear_precedents(&mut self, variable: VarId) {
        if let Some(precedents) = self.precedents.remove(&variable) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&variable);
                }
            }
        }
    }

    /// Remove every edge touching `variable`, in both directions
    pub fn clear_edges(&mut self, variable: VarId) {
        if let Some(precedents) = self.precedents.remove(&variable) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&variable);
                }
            }
        }

        if let Some(dependents) = self.dependents.remove(&variable) {
            for dependent in dependents {
                if let Some(precs) = self.precedents.get_mut(&dependent) {
                    precs.remove(&variable);
                }
            }
        }
    }

    /// Check whether binding `candidate` to `dependencies` would close a
    /// cycle, BEFORE any edge is inserted. Returns the dependency through
    /// which the cycle closes, or `None` if the binding is safe.
    ///
    /// A cycle exists iff `candidate` is transitively reachable from one of
    /// the proposed dependencies along existing depends-on edges. Edges
    /// currently outgoing from `candidate` need no special handling: the walk
    /// only reaches them through `candidate` itself, which already reports
    /// the cycle.
    pub fn would_cycle(&self, candidate: VarId, dependencies: &[VarId]) -> Option<VarId> {
        for &dep in dependencies {
            if dep == candidate || self.reaches(dep, candidate) {
                return Some(dep);
            }
        }
        None
    }

    /// DFS over depends-on edges from `start`, looking for `target`
    fn reaches(&self, start: VarId, target: VarId) -> bool {
        let mut visited = AHashSet::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(precedents) = self.precedents.get(&id) {
                stack.extend(precedents.iter().copied());
            }
        }
        false
    }

    /// Variables that directly depend on `variable`
    pub fn dependents_of(&self, variable: VarId) -> impl Iterator<Item = VarId> + '_ {
        self.dependents
            .get(&variable)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Variables that `variable` directly depends on
    pub fn precedents_of(&self, variable: VarId) -> impl Iterator<Item = VarId> + '_ {
        self.precedents
            .get(&variable)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All transitive dependents of `start`, each collected once even when
    /// reachable through multiple paths. `start` itself is not included.
    pub fn collect_dependents(&self, start: VarId) -> AHashSet<VarId> {
        let mut result = AHashSet::new();
        let mut stack: Vec<VarId> = self.dependents_of(start).collect();

        while let Some(id) = stack.pop() {
            if result.insert(id) {
                stack.extend(self.dependents_of(id));
            }
        }
        result
    }

    /// Recomputation order for the transitive dependents of `start`:
    /// dependencies before dependents, `start` excluded.
    ///
    /// DFS post-order over the dependents edges yields dependent-first order;
    /// reversing it gives a valid topological order of the reachable
    /// subgraph. The graph is kept acyclic by construction, so the in-stack
    /// guard is belt only.
    pub fn recalc_order(&self, start: VarId) -> Vec<VarId> {
        let mut result = Vec::new();
        let mut visited = AHashSet::new();
        let mut in_stack = AHashSet::new();

        self.post_order(start, &mut result, &mut visited, &mut in_stack);

        result.pop(); // drop `start`
        result.reverse();
        result
    }

    fn post_order(
        &self,
        variable: VarId,
        result: &mut Vec<VarId>,
        visited: &mut AHashSet<VarId>,
        in_stack: &mut AHashSet<VarId>,
    ) {
        if visited.contains(&variable) || in_stack.contains(&variable) {
            return;
        }

        in_stack.insert(variable);
        if let Some(dependents) = self.dependents.get(&variable) {
            // Visit in descending id order: the reversed post-order then
            // resolves topological ties in ascending id order, keeping
            // recomputation and notification order deterministic
            let mut dependents: Vec<VarId> = dependents.iter().copied().collect();
            dependents.sort_unstable_by(|a, b| b.cmp(a));
            for dependent in dependents {
                self.post_order(dependent, result, visited, in_stack);
            }
        }
        in_stack.remove(&variable);

        visited.insert(variable);
        result.push(variable);
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edges() {
        let mut graph = DependencyGraph::new();
        let (a, b) = (VarId(0), VarId(1));

        graph.add_edges(b, &[a]);

        assert!(graph.dependents_of(a).any(|v| v == b));
        assert!(graph.precedents_of(b).any(|v| v == a));
    }

    #[test]
    fn test_clear_edges_is_symmetric() {
        let mut graph = DependencyGraph::new();
        let (a, b, c) = (VarId(0), VarId(1), VarId(2));

        graph.add_edges(c, &[a, b]);
        graph.clear_edges(c);

        assert_eq!(graph.dependents_of(a).count(), 0);
        assert_eq!(graph.dependents_of(b).count(), 0);
        assert_eq!(graph.precedents_of(c).count(), 0);
    }

    #[test]
    fn test_clear_precedents_keeps_dependents() {
        let mut graph = DependencyGraph::new();
        let (a, b, c) = (VarId(0), VarId(1), VarId(2));

        // b depends on a; c depends on b
        graph.add_edges(b, &[a]);
        graph.add_edges(c, &[b]);

        graph.clear_precedents(b);

        assert_eq!(graph.precedents_of(b).count(), 0);
        assert_eq!(graph.dependents_of(a).count(), 0);
        // c -> b edge survives
        assert!(graph.dependents_of(b).any(|v| v == c));
    }

    #[test]
    fn test_would_cycle_direct_and_transitive() {
        let mut graph = DependencyGraph::new();
        let (a, b, c) = (VarId(0), VarId(1), VarId(2));

        // b depends on a, c depends on b
        graph.add_edges(b, &[a]);
        graph.add_edges(c, &[b]);

        // a = f(c) would close a -> b -> c -> a
        assert_eq!(graph.would_cycle(a, &[c]), Some(c));
        // self reference
        assert_eq!(graph.would_cycle(a, &[a]), Some(a));
        // a fresh variable depending on c is fine
        assert_eq!(graph.would_cycle(VarId(3), &[c]), None);
    }

    #[test]
    fn test_collect_dependents_diamond() {
        let mut graph = DependencyGraph::new();
        let (x, y, z, w) = (VarId(0), VarId(1), VarId(2), VarId(3));

        // y and z depend on x; w depends on both
        graph.add_edges(y, &[x]);
        graph.add_edges(z, &[x]);
        graph.add_edges(w, &[y, z]);

        let dirty = graph.collect_dependents(x);
        assert_eq!(dirty.len(), 3);
        assert!(dirty.contains(&y) && dirty.contains(&z) && dirty.contains(&w));
    }

    #[test]
    fn test_recalc_order_dependencies_first() {
        let mut graph = DependencyGraph::new();
        let (x, y, z, w) = (VarId(0), VarId(1), VarId(2), VarId(3));

        graph.add_edges(y, &[x]);
        graph.add_edges(z, &[x]);
        graph.add_edges(w, &[y, z]);

        let order = graph.recalc_order(x);
        assert_eq!(order.len(), 3);

        let pos = |id: VarId| order.iter().position(|&v| v == id).unwrap();
        assert!(pos(y) < pos(w));
        assert!(pos(z) < pos(w));

        // Ties resolve in ascending id order
        assert_eq!(order, vec![y, z, w]);
    }
}
