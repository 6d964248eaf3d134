//! Dependency Graph Utility
//!
//! A small general-purpose directed graph used to sequence and validate
//! scan/verification ordering: Kahn topological sort, in/out-degree maps,
//! and unweighted BFS hop distances. Vertices are any `Ord + Clone` type;
//! adjacency lives in a `BTreeMap` so every traversal is deterministic.
//!
//! Cyclic input is an expected outcome, not an error: `topo_sort` returns
//! `None` and `bfs_distance` simply omits unreachable vertices.

use std::collections::{BTreeMap, VecDeque};

/// Directed graph over generic vertices. Self-loops and parallel edges are
/// permitted; both count toward degrees.
#[derive(Debug, Clone, Default)]
pub struct DepGraph<V: Ord + Clone> {
    adjacency: BTreeMap<V, Vec<V>>,
}

impl<V: Ord + Clone> DepGraph<V> {
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
        }
    }

    /// Insert a vertex. Inserting an existing vertex is a no-op.
    pub fn add_vertex(&mut self, vertex: V) {
        self.adjacency.entry(vertex).or_default();
    }

    /// Insert an edge `from -> to`, inserting both endpoints if absent.
    pub fn add_edge(&mut self, from: V, to: V) {
        self.add_vertex(to.clone());
        self.adjacency.entry(from).or_default().push(to);
    }

    /// Remove one occurrence of the edge `from -> to`. Returns whether an
    /// edge was removed; parallel edges are removed one call at a time.
    pub fn remove_edge(&mut self, from: &V, to: &V) -> bool {
        match self.adjacency.get_mut(from) {
            Some(targets) => match targets.iter().position(|t| t == to) {
                Some(idx) => {
                    targets.remove(idx);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Remove a vertex and every edge touching it. Returns whether the
    /// vertex existed.
    pub fn remove_vertex(&mut self, vertex: &V) -> bool {
        if self.adjacency.remove(vertex).is_none() {
            return false;
        }
        for targets in self.adjacency.values_mut() {
            targets.retain(|t| t != vertex);
        }
        true
    }

    pub fn contains(&self, vertex: &V) -> bool {
        self.adjacency.contains_key(vertex)
    }

    /// Vertices in sorted order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.adjacency.keys()
    }

    /// Outgoing edge targets of a vertex, in insertion order.
    pub fn neighbors(&self, vertex: &V) -> &[V] {
        self.adjacency.get(vertex).map_or(&[], Vec::as_slice)
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Incoming edge count per vertex. Every vertex appears in the map,
    /// sources included at zero; parallel edges each count.
    pub fn in_degrees(&self) -> BTreeMap<V, usize> {
        let mut degrees: BTreeMap<V, usize> =
            self.adjacency.keys().map(|v| (v.clone(), 0)).collect();
        for targets in self.adjacency.values() {
            for target in targets {
                if let Some(count) = degrees.get_mut(target) {
                    *count += 1;
                }
            }
        }
        degrees
    }

    /// Outgoing edge count per vertex.
    pub fn out_degrees(&self) -> BTreeMap<V, usize> {
        self.adjacency
            .iter()
            .map(|(v, targets)| (v.clone(), targets.len()))
            .collect()
    }

    /// Kahn topological sort. Returns `None` when the graph has a cycle,
    /// signalled by fewer ordered vertices than the graph holds.
    ///
    /// Deterministic: the queue is seeded in vertex sort order, so equal
    /// graphs always produce the same order.
    pub fn topo_sort(&self) -> Option<Vec<V>> {
        let mut degrees = self.in_degrees();
        let mut queue: VecDeque<V> = degrees
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(v, _)| v.clone())
            .collect();

        let mut order = Vec::with_capacity(self.vertex_count());
        while let Some(vertex) = queue.pop_front() {
            for target in self.neighbors(&vertex) {
                if let Some(count) = degrees.get_mut(target) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(target.clone());
                    }
                }
            }
            order.push(vertex);
        }

        if order.len() == self.vertex_count() {
            Some(order)
        } else {
            None
        }
    }

    pub fn is_dag(&self) -> bool {
        self.topo_sort().is_some()
    }

    /// Shortest hop count from `start` to every reachable vertex. Vertices
    /// absent from the result are unreachable; an unknown start yields an
    /// empty map.
    pub fn bfs_distance(&self, start: &V) -> BTreeMap<V, usize> {
        let mut distances = BTreeMap::new();
        if !self.contains(start) {
            return distances;
        }

        distances.insert(start.clone(), 0);
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(vertex) = queue.pop_front() {
            let next = distances[&vertex] + 1;
            for target in self.neighbors(&vertex) {
                if !distances.contains_key(target) {
                    distances.insert(target.clone(), next);
                    queue.push_back(target.clone());
                }
            }
        }
        distances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> DepGraph<u32> {
        let mut g = DepGraph::new();
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(1, 2);
        g.add_edge(2, 3);
        g
    }

    fn position<V: Ord + Clone>(order: &[V], v: &V) -> usize {
        order.iter().position(|o| o == v).unwrap()
    }

    #[test]
    fn test_add_vertex_idempotent() {
        let mut g = DepGraph::new();
        g.add_vertex("a");
        g.add_vertex("a");
        assert_eq!(g.vertex_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_add_edge_inserts_endpoints() {
        let mut g = DepGraph::new();
        g.add_edge("a", "b");
        assert!(g.contains(&"a"));
        assert!(g.contains(&"b"));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_parallel_and_self_edges_count() {
        let mut g = DepGraph::new();
        g.add_edge(1, 2);
        g.add_edge(1, 2);
        g.add_edge(2, 2);

        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.in_degrees()[&2], 3);
        assert_eq!(g.out_degrees()[&1], 2);
        assert_eq!(g.in_degrees()[&1], 0);
    }

    #[test]
    fn test_topo_sort_respects_edges() {
        let g = diamond();
        let order = g.topo_sort().unwrap();

        assert_eq!(order.len(), 4);
        assert!(position(&order, &0) < position(&order, &1));
        assert!(position(&order, &1) < position(&order, &2));
        assert!(position(&order, &2) < position(&order, &3));
        assert!(g.is_dag());
    }

    #[test]
    fn test_topo_sort_reports_cycle() {
        let mut g = diamond();
        g.add_edge(3, 0);

        assert_eq!(g.topo_sort(), None);
        assert!(!g.is_dag());
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut g = DepGraph::new();
        g.add_edge("a", "a");
        assert_eq!(g.topo_sort(), None);
    }

    #[test]
    fn test_topo_sort_deterministic() {
        let g = diamond();
        assert_eq!(g.topo_sort(), g.topo_sort());
    }

    #[test]
    fn test_bfs_prefers_shortest_path() {
        let g = diamond();
        let dist = g.bfs_distance(&0);

        assert_eq!(dist[&0], 0);
        assert_eq!(dist[&1], 1);
        // direct edge 0 -> 2 beats the 0 -> 1 -> 2 path
        assert_eq!(dist[&2], 1);
        assert_eq!(dist[&3], 2);
    }

    #[test]
    fn test_bfs_unreachable_is_absent() {
        let mut g = diamond();
        g.add_vertex(9);

        let dist = g.bfs_distance(&0);
        assert!(!dist.contains_key(&9));

        // edges point away from 3, so only 3 itself is reachable
        let from_sink = g.bfs_distance(&3);
        assert_eq!(from_sink.len(), 1);
        assert_eq!(from_sink[&3], 0);
    }

    #[test]
    fn test_bfs_unknown_start() {
        let g = diamond();
        assert!(g.bfs_distance(&42).is_empty());
    }

    #[test]
    fn test_remove_edge_one_at_a_time() {
        let mut g = DepGraph::new();
        g.add_edge(1, 2);
        g.add_edge(1, 2);

        assert!(g.remove_edge(&1, &2));
        assert_eq!(g.edge_count(), 1);
        assert!(g.remove_edge(&1, &2));
        assert!(!g.remove_edge(&1, &2));
    }

    #[test]
    fn test_remove_vertex_purges_edges() {
        let mut g = diamond();
        assert!(g.remove_vertex(&2));

        assert_eq!(g.vertex_count(), 3);
        assert!(!g.neighbors(&0).contains(&2));
        assert!(g.neighbors(&1).is_empty());
        assert!(!g.remove_vertex(&2));
    }
}
