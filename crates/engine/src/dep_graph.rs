//! Dependency graph for formula cells.
//!
//! Tracks children (cells a formula reads from) and parents (formula cells
//! that read a given cell). Edges are keyed by address and resolved through
//! the sheet's owning map, never by direct references between cells, so a
//! parent set survives the clearing of the cell it belongs to.
//!
//! # Edge Direction
//!
//! ```text
//! children[B] = {A, ...}  means  "B's formula reads A"
//! parents[A]  = {B, ...}  is the reverse edge
//! ```
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** A ∈ children[B] iff B ∈ parents[A].
//! 2. **No dangling entries:** empty sets are removed, not stored.
//! 3. **Acyclic:** `replace_edges` is only called after `would_create_cycle`
//!    cleared the candidate set, so the committed relation stays a DAG.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::addr::Addr;

#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// For each formula cell B, the cells its formula reads.
    children: FxHashMap<Addr, FxHashSet<Addr>>,

    /// For each referenced cell A, the formula cells reading it.
    parents: FxHashMap<Addr, FxHashSet<Addr>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cells this cell's formula reads (child edges).
    pub fn children(&self, cell: Addr) -> impl Iterator<Item = Addr> + '_ {
        self.children
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// The formula cells that read this cell (parent edges).
    pub fn parents(&self, cell: Addr) -> impl Iterator<Item = Addr> + '_ {
        self.parents
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// True if at least one formula references this cell.
    pub fn is_referenced(&self, cell: Addr) -> bool {
        self.parents.contains_key(&cell)
    }

    /// Replace all child edges for a formula cell atomically.
    ///
    /// Removes the cell from all its old children's parent sets, then wires
    /// the new set. Pass an empty set to clear the cell's child edges; its
    /// own parent set is untouched either way.
    pub fn replace_edges(&mut self, cell: Addr, new_children: FxHashSet<Addr>) {
        if let Some(old_children) = self.children.remove(&cell) {
            for child in old_children {
                if let Some(parents) = self.parents.get_mut(&child) {
                    parents.remove(&cell);
                    if parents.is_empty() {
                        self.parents.remove(&child);
                    }
                }
            }
        }

        if new_children.is_empty() {
            return;
        }

        for child in &new_children {
            self.parents.entry(*child).or_default().insert(cell);
        }
        self.children.insert(cell, new_children);
    }

    /// Drop a cell's child edges (formula replaced by text, or cell cleared).
    pub fn clear_cell(&mut self, cell: Addr) {
        self.replace_edges(cell, FxHashSet::default());
    }

    /// Would giving `cell` the child set `new_children` close a cycle?
    ///
    /// Walks child edges depth-first over the graph as it would look after
    /// the assignment: `cell`'s own children are the candidate set, every
    /// other cell keeps its current edges. Two markers distinguish a node on
    /// the active path (a true cycle when met again) from one already fully
    /// explored (a shared dependency, which is a legal DAG shape).
    ///
    /// Does not modify the graph.
    pub fn would_create_cycle(&self, cell: Addr, new_children: &[Addr]) -> bool {
        if new_children.contains(&cell) {
            return true;
        }

        struct Frame {
            cell: Addr,
            children: Vec<Addr>,
            next: usize,
        }

        let children_of = |c: Addr| -> Vec<Addr> {
            if c == cell {
                new_children.to_vec()
            } else {
                self.children(c).collect()
            }
        };

        let mut on_path: FxHashSet<Addr> = FxHashSet::default();
        let mut explored: FxHashSet<Addr> = FxHashSet::default();

        on_path.insert(cell);
        let mut stack = vec![Frame {
            cell,
            children: children_of(cell),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.children.len() {
                let w = frame.children[frame.next];
                frame.next += 1;

                if on_path.contains(&w) {
                    return true;
                }
                if explored.contains(&w) {
                    continue;
                }
                on_path.insert(w);
                stack.push(Frame {
                    cell: w,
                    children: children_of(w),
                    next: 0,
                });
            } else {
                let finished = stack.pop().unwrap();
                on_path.remove(&finished.cell);
                explored.insert(finished.cell);
            }
        }

        false
    }

    /// The cell plus every cell reachable from it via parent edges: the set
    /// whose computed value could depend on the cell, directly or not.
    pub fn parent_closure(&self, cell: Addr) -> FxHashSet<Addr> {
        let mut closure = FxHashSet::default();
        let mut stack = vec![cell];
        while let Some(c) = stack.pop() {
            if !closure.insert(c) {
                continue;
            }
            stack.extend(self.parents(c));
        }
        closure
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        for (cell, children) in &self.children {
            for child in children {
                assert!(
                    self.parents.get(child).is_some_and(|s| s.contains(cell)),
                    "missing parent edge: {child:?} should list {cell:?}"
                );
            }
        }
        for (cell, parents) in &self.parents {
            for parent in parents {
                assert!(
                    self.children.get(parent).is_some_and(|s| s.contains(cell)),
                    "missing child edge: {parent:?} should list {cell:?}"
                );
            }
        }
        for (cell, children) in &self.children {
            assert!(!children.is_empty(), "empty child set stored for {cell:?}");
        }
        for (cell, parents) in &self.parents {
            assert!(!parents.is_empty(), "empty parent set stored for {cell:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(row: i32, col: i32) -> Addr {
        Addr::new(row, col)
    }

    fn set(cells: &[Addr]) -> FxHashSet<Addr> {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = DepGraph::new();
        assert_eq!(graph.children(a(0, 0)).count(), 0);
        assert_eq!(graph.parents(a(0, 0)).count(), 0);
        assert!(!graph.is_referenced(a(0, 0)));
        graph.assert_consistent();
    }

    #[test]
    fn test_single_edge() {
        // B1 = A1
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);

        graph.replace_edges(b1, set(&[a1]));
        graph.assert_consistent();

        assert_eq!(graph.children(b1).collect::<Vec<_>>(), vec![a1]);
        assert_eq!(graph.parents(a1).collect::<Vec<_>>(), vec![b1]);
        assert!(graph.is_referenced(a1));
        assert!(!graph.is_referenced(b1));
    }

    #[test]
    fn test_multiple_parents() {
        // B1 = A1, C1 = A1
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);
        let c1 = a(0, 2);

        graph.replace_edges(b1, set(&[a1]));
        graph.replace_edges(c1, set(&[a1]));
        graph.assert_consistent();

        let mut parents: Vec<_> = graph.parents(a1).collect();
        parents.sort();
        assert_eq!(parents, vec![b1, c1]);
    }

    #[test]
    fn test_rewiring() {
        // B1 = A1, then B1 = A2: the old reverse edge must disappear
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let a2 = a(1, 0);
        let b1 = a(0, 1);

        graph.replace_edges(b1, set(&[a1]));
        graph.replace_edges(b1, set(&[a2]));
        graph.assert_consistent();

        assert_eq!(graph.children(b1).collect::<Vec<_>>(), vec![a2]);
        assert_eq!(graph.parents(a2).collect::<Vec<_>>(), vec![b1]);
        assert_eq!(graph.parents(a1).count(), 0);
        assert!(!graph.is_referenced(a1));
    }

    #[test]
    fn test_unwiring() {
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);

        graph.replace_edges(b1, set(&[a1]));
        graph.clear_cell(b1);
        graph.assert_consistent();

        assert_eq!(graph.children(b1).count(), 0);
        assert_eq!(graph.parents(a1).count(), 0);
    }

    #[test]
    fn test_clearing_referenced_cell_keeps_its_parents() {
        // B1 = A1; clearing A1 must not forget that B1 references it
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);

        graph.replace_edges(b1, set(&[a1]));
        graph.clear_cell(a1); // A1 has no children; a no-op
        graph.assert_consistent();

        assert_eq!(graph.parents(a1).collect::<Vec<_>>(), vec![b1]);
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let graph = DepGraph::new();
        let a1 = a(0, 0);
        assert!(graph.would_create_cycle(a1, &[a1]));
    }

    #[test]
    fn test_two_cell_cycle() {
        // A1 = B1, then B1 = A1
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);

        graph.replace_edges(a1, set(&[b1]));
        assert!(graph.would_create_cycle(b1, &[a1]));
    }

    #[test]
    fn test_indirect_cycle() {
        // B = A, C = B, then A = C
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);
        let c1 = a(0, 2);

        graph.replace_edges(b1, set(&[a1]));
        graph.replace_edges(c1, set(&[b1]));
        assert!(graph.would_create_cycle(a1, &[c1]));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        //     C1
        //    /  \
        //   A1   B1
        //    \  /
        //     D1
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);
        let c1 = a(0, 2);
        let d1 = a(0, 3);

        graph.replace_edges(a1, set(&[c1]));
        graph.replace_edges(b1, set(&[c1]));
        assert!(!graph.would_create_cycle(d1, &[a1, b1]));

        graph.replace_edges(d1, set(&[a1, b1]));
        graph.assert_consistent();
    }

    #[test]
    fn test_reassignment_ignores_old_edges() {
        // A1 = B1. Reassigning A1 = C1 must validate against the new edge
        // set, not the union with the old one.
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);
        let c1 = a(0, 2);

        graph.replace_edges(a1, set(&[b1]));
        graph.replace_edges(b1, set(&[c1]));

        // B1 = A1 closes A1 -> B1 -> A1.
        assert!(graph.would_create_cycle(b1, &[a1]));
        // B1 = D1 is acyclic; B1's current edge to C1 is being replaced and
        // must not participate in the check.
        let d1 = a(0, 3);
        assert!(!graph.would_create_cycle(b1, &[d1]));
    }

    #[test]
    fn test_deep_chain_cycle() {
        // A chain of 100 cells, then close it at the far end.
        let mut graph = DepGraph::new();
        for i in 1..100 {
            graph.replace_edges(a(i, 0), set(&[a(i - 1, 0)]));
        }
        graph.assert_consistent();
        assert!(graph.would_create_cycle(a(0, 0), &[a(99, 0)]));
        assert!(!graph.would_create_cycle(a(0, 0), &[a(0, 1)]));
    }

    #[test]
    fn test_parent_closure_chain() {
        // A = B, B = C: closure of C is {C, B, A}
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);
        let c1 = a(0, 2);

        graph.replace_edges(a1, set(&[b1]));
        graph.replace_edges(b1, set(&[c1]));

        let closure = graph.parent_closure(c1);
        assert_eq!(closure, set(&[a1, b1, c1]));
    }

    #[test]
    fn test_parent_closure_isolated_cell() {
        let graph = DepGraph::new();
        let closure = graph.parent_closure(a(5, 5));
        assert_eq!(closure, set(&[a(5, 5)]));
    }

    #[test]
    fn test_parent_closure_fanout() {
        // B1 = A1, C1 = A1, D1 = B1
        let mut graph = DepGraph::new();
        let a1 = a(0, 0);
        let b1 = a(0, 1);
        let c1 = a(0, 2);
        let d1 = a(0, 3);

        graph.replace_edges(b1, set(&[a1]));
        graph.replace_edges(c1, set(&[a1]));
        graph.replace_edges(d1, set(&[b1]));

        assert_eq!(graph.parent_closure(a1), set(&[a1, b1, c1, d1]));
        assert_eq!(graph.parent_closure(b1), set(&[b1, d1]));
    }
}
