// src/relations/two_lp.rs

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use num::bigint::BigInt;

use crate::bigint::bitarray::BigBitArray;
use crate::relations::relation::{LargePrimeStrategy, Origin, PartialRelation, Relation};
use crate::relations::store::{classify_residual, Classification, RelationSink};

/// Virtual graph vertex standing in for "no second large prime". Real large
/// primes are always > max_factor ≥ 2, so 1 never collides with one; a
/// 1-LP partial on prime `p` is stored as edge `(p, VIRTUAL_UNIT_VERTEX)` so
/// it can close a cycle with a 2-LP partial that also touches `p` (§4.7).
const VIRTUAL_UNIT_VERTEX: i64 = 1;

/// An edge between the two large primes of a 2-LP partial.
struct Edge {
    a: i64,
    b: i64,
    partial: PartialRelation,
}

struct CycleGraph {
    adjacency: HashMap<i64, Vec<usize>>,
    edges: Vec<Edge>,
}

impl CycleGraph {
    fn new() -> Self {
        CycleGraph {
            adjacency: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// BFS for a path of edge indices connecting `start` to `target`, if both
    /// already live in the forest. `None` means they're unconnected (or one
    /// is brand new).
    fn find_path(&self, start: i64, target: i64) -> Option<Vec<usize>> {
        if !self.adjacency.contains_key(&start) || !self.adjacency.contains_key(&target) {
            return None;
        }
        let mut visited: HashMap<i64, (i64, usize)> = HashMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited.insert(start, (start, usize::MAX));
        while let Some(node) = queue.pop_front() {
            if node == target {
                break;
            }
            if let Some(edges) = self.adjacency.get(&node) {
                for &edge_idx in edges {
                    let edge = &self.edges[edge_idx];
                    let next = if edge.a == node { edge.b } else { edge.a };
                    if !visited.contains_key(&next) {
                        visited.insert(next, (node, edge_idx));
                        queue.push_back(next);
                    }
                }
            }
        }
        if !visited.contains_key(&target) {
            return None;
        }
        let mut path = Vec::new();
        let mut cur = target;
        while cur != start {
            let (prev, edge_idx) = visited[&cur];
            path.push(edge_idx);
            cur = prev;
        }
        Some(path)
    }

    fn add_edge(&mut self, a: i64, b: i64, partial: PartialRelation) -> usize {
        let idx = self.edges.len();
        self.edges.push(Edge { a, b, partial });
        self.adjacency.entry(a).or_default().push(idx);
        self.adjacency.entry(b).or_default().push(idx);
        idx
    }
}

/// Two-large-prime store: partials form edges in a graph keyed by their two
/// primes; a cycle (both primes already reachable from each other) yields a
/// full relation by combining every partial along the closing path (§4.7).
pub struct TwoLpStore {
    max_factor: i64,
    max_large_prime: i64,
    fulls: Mutex<Vec<Relation>>,
    graph: Mutex<CycleGraph>,
}

impl TwoLpStore {
    pub fn new(max_factor: i64, max_large_prime: i64) -> Self {
        TwoLpStore {
            max_factor,
            max_large_prime,
            fulls: Mutex::new(Vec::new()),
            graph: Mutex::new(CycleGraph::new()),
        }
    }

    pub fn full_count(&self) -> usize {
        self.fulls.lock().unwrap().len()
    }

    pub fn take_fulls(&self) -> Vec<Relation> {
        self.fulls.lock().unwrap().clone()
    }

    fn insert_edge(&self, p: i64, q: i64, candidate: PartialRelation) {
        let mut graph = self.graph.lock().unwrap();
        if let Some(path) = graph.find_path(p, q) {
            let mut parts: Vec<&PartialRelation> = path.iter().map(|&idx| &graph.edges[idx].partial).collect();
            parts.push(&candidate);
            let (q_of_x, x, d, exp_vec) = PartialRelation::combine(&parts);
            drop(graph);
            self.fulls.lock().unwrap().push(Relation {
                q_of_x,
                x,
                d,
                exp_vec,
                origin: Origin::TwoLp,
            });
            self.graph.lock().unwrap().add_edge(p, q, candidate);
        } else {
            graph.add_edge(p, q, candidate);
        }
    }
}

impl RelationSink for TwoLpStore {
    fn try_add(&self, q_of_x: BigInt, x: BigInt, d: BigInt, exp_vec: BigBitArray, residual: BigInt) {
        match classify_residual(&residual, self.max_factor, self.max_large_prime, LargePrimeStrategy::Two) {
            Classification::Full => {
                self.fulls.lock().unwrap().push(Relation {
                    q_of_x,
                    x,
                    d,
                    exp_vec,
                    origin: Origin::Full,
                });
            }
            Classification::OneLargePrime(p) => {
                let candidate = PartialRelation::new(q_of_x, x, d, exp_vec, vec![p]);
                self.insert_edge(p, VIRTUAL_UNIT_VERTEX, candidate);
            }
            Classification::TwoLargePrimes(p, q) => {
                let candidate = PartialRelation::new(q_of_x, x, d, exp_vec, vec![p, q]);
                self.insert_edge(p, q, candidate);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigint::bitarray::BigBitArray;

    #[test]
    fn triangle_of_partials_closes_a_cycle() {
        let store = TwoLpStore::new(97, 10_000);
        let ev = BigBitArray::new(64);
        // Edges (101,103), (103,107) connect a path; (101,107) closes a cycle.
        store.try_add(BigInt::from(101 * 103), BigInt::from(1), BigInt::from(2), ev.clone(), BigInt::from(101 * 103));
        assert_eq!(store.full_count(), 0);
        store.try_add(BigInt::from(103 * 107), BigInt::from(2), BigInt::from(3), ev.clone(), BigInt::from(103 * 107));
        assert_eq!(store.full_count(), 0);
        store.try_add(BigInt::from(101 * 107), BigInt::from(3), BigInt::from(5), ev, BigInt::from(101 * 107));
        assert_eq!(store.full_count(), 1);
    }

    #[test]
    fn unrelated_edges_stay_disconnected() {
        let store = TwoLpStore::new(97, 10_000);
        let ev = BigBitArray::new(64);
        store.try_add(BigInt::from(101 * 103), BigInt::from(1), BigInt::from(2), ev.clone(), BigInt::from(101 * 103));
        store.try_add(BigInt::from(109 * 113), BigInt::from(2), BigInt::from(3), ev, BigInt::from(109 * 113));
        assert_eq!(store.full_count(), 0);
    }

    #[test]
    fn one_large_prime_partial_closes_cycle_via_virtual_vertex() {
        let store = TwoLpStore::new(97, 10_000);
        let ev = BigBitArray::new(64);
        // A 1-LP partial on 101 is edge (101,1); a 2-LP partial (101,107)
        // shares vertex 101 but not 107 with anything else, so only two
        // partials on the SAME singleton prime close a cycle through "1".
        store.try_add(BigInt::from(101), BigInt::from(1), BigInt::from(2), ev.clone(), BigInt::from(101));
        assert_eq!(store.full_count(), 0);
        store.try_add(BigInt::from(101), BigInt::from(2), BigInt::from(3), ev, BigInt::from(101));
        assert_eq!(store.full_count(), 1);
    }
}
