//! Planner-consumed graph contract (spec C9, §6 "Planner contract", §9
//! "Cyclic references"): an arena of nodes addressed by integer index,
//! with predecessor/successor adjacency kept in sync on every mutation.

use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult};

/// Opaque node address into the plan arena (spec `[ADD]` "Arena indices").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// The node graph the host's planner mutates and orders; this crate only
/// maintains the adjacency and rejects cycles, it does not itself order
/// the graph into an execution sequence (spec Non-goals).
#[derive(Debug, Default)]
pub struct PlanGraph {
    nodes: HashSet<NodeId>,
    successors: HashMap<NodeId, Vec<NodeId>>,
    predecessors: HashMap<NodeId, Vec<NodeId>>,
    next_id: u32,
}

impl PlanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id);
        self.successors.entry(id).or_default();
        self.predecessors.entry(id).or_default();
        id
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// `config_graph()` (spec §6): the predecessor/successor maps as the
    /// planner consumes them.
    pub fn config_graph(&self) -> (&HashMap<NodeId, Vec<NodeId>>, &HashMap<NodeId, Vec<NodeId>>) {
        (&self.predecessors, &self.successors)
    }

    /// Adds edge `a -> b`; rejects the mutation (leaving the graph
    /// unchanged) if it would introduce a cycle (spec §6, §9).
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> CoreResult<()> {
        self.require_node(a)?;
        self.require_node(b)?;
        self.successors.entry(a).or_default().push(b);
        self.predecessors.entry(b).or_default().push(a);

        if self.has_cycle() {
            // Undo: this mutation is the only one we just made.
            self.successors.get_mut(&a).unwrap().retain(|&x| x != b);
            self.predecessors.get_mut(&b).unwrap().retain(|&x| x != a);
            tracing::debug!(?a, ?b, "rejected edge that would create a cycle");
            return Err(CoreError::plan(format!("edge {a:?} -> {b:?} would create a cycle")));
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> CoreResult<()> {
        self.require_node(a)?;
        self.require_node(b)?;
        if let Some(succ) = self.successors.get_mut(&a) {
            succ.retain(|&x| x != b);
        }
        if let Some(pred) = self.predecessors.get_mut(&b) {
            pred.retain(|&x| x != a);
        }
        Ok(())
    }

    pub fn remove_node(&mut self, n: NodeId) -> CoreResult<()> {
        self.require_node(n)?;
        let succs = self.successors.remove(&n).unwrap_or_default();
        let preds = self.predecessors.remove(&n).unwrap_or_default();
        for s in &succs {
            if let Some(p) = self.predecessors.get_mut(s) {
                p.retain(|&x| x != n);
            }
        }
        for p in &preds {
            if let Some(s) = self.successors.get_mut(p) {
                s.retain(|&x| x != n);
            }
        }
        self.nodes.remove(&n);
        Ok(())
    }

    /// Rewires every edge that referenced `old` to reference `new` instead,
    /// then removes `old` (spec §6 `replace(old, new)`).
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> CoreResult<()> {
        self.require_node(old)?;
        self.require_node(new)?;
        let succs = self.successors.get(&old).cloned().unwrap_or_default();
        let preds = self.predecessors.get(&old).cloned().unwrap_or_default();
        for s in succs {
            self.remove_edge(old, s)?;
            if s != new {
                self.add_edge(new, s)?;
            }
        }
        for p in preds {
            self.remove_edge(p, old)?;
            if p != new {
                self.add_edge(p, new)?;
            }
        }
        self.remove_node(old)
    }

    fn require_node(&self, id: NodeId) -> CoreResult<()> {
        if self.has_node(id) {
            Ok(())
        } else {
            Err(CoreError::plan(format!("unknown node {id:?}")))
        }
    }

    /// Stack-based DFS cycle detection, run after every edge addition
    /// (spec §9 "Design Notes").
    fn has_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<NodeId, Mark> = HashMap::new();

        for &start in &self.nodes {
            if marks.contains_key(&start) {
                continue;
            }
            let mut stack = vec![(start, 0usize)];
            let mut path = vec![start];
            marks.insert(start, Mark::Visiting);

            while let Some((node, child_idx)) = stack.pop() {
                let empty = Vec::new();
                let children = self.successors.get(&node).unwrap_or(&empty);
                if child_idx < children.len() {
                    let child = children[child_idx];
                    stack.push((node, child_idx + 1));
                    match marks.get(&child) {
                        Some(Mark::Visiting) => return true,
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child, Mark::Visiting);
                            path.push(child);
                            stack.push((child, 0));
                        }
                    }
                } else {
                    marks.insert(node, Mark::Done);
                    path.pop();
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_rejects_cycles() {
        let mut g = PlanGraph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        g.add_edge(a, b).unwrap();
        g.add_edge(b, c).unwrap();
        let err = g.add_edge(c, a).unwrap_err();
        assert!(matches!(err, CoreError::PlanError { .. }));
    }

    #[test]
    fn remove_node_cleans_up_both_adjacency_maps() {
        let mut g = PlanGraph::new();
        let a = g.add_node();
        let b = g.add_node();
        g.add_edge(a, b).unwrap();
        g.remove_node(a).unwrap();
        let (preds, _) = g.config_graph();
        assert!(preds.get(&b).unwrap().is_empty());
    }

    #[test]
    fn replace_rewires_predecessors_to_new_node() {
        let mut g = PlanGraph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        g.add_edge(a, b).unwrap();
        g.replace(b, c).unwrap();
        let (_, succs) = g.config_graph();
        assert_eq!(succs.get(&a).unwrap(), &vec![c]);
        assert!(!g.has_node(b));
    }

    #[test]
    fn self_loop_is_rejected() {
        let mut g = PlanGraph::new();
        let a = g.add_node();
        let err = g.add_edge(a, a).unwrap_err();
        assert!(matches!(err, CoreError::PlanError { .. }));
    }
}
