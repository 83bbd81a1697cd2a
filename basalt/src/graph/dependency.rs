/// Dense node id inside one frame's dependency graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub u16);

/// Dependency DAG over resource versions and passes. Edges point from
/// producers to consumers; a node's reference count is its number of
/// outgoing edges, so an unconsumed node starts at zero and culling
/// cascades backwards along incoming edges.
pub(crate) struct DependencyGraph {
    ref_counts: Vec<u16>,
    uncullable: Vec<bool>,
    outgoing: Vec<Vec<NodeId>>,
    incoming: Vec<Vec<NodeId>>,
}

impl DependencyGraph {
    pub(crate) fn new() -> Self {
        Self {
            ref_counts: Vec::new(),
            uncullable: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub(crate) fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.ref_counts.len() as u16);
        self.ref_counts.push(0);
        self.uncullable.push(false);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId) {
        // Duplicate edges would double-count references.
        if self.outgoing[from.0 as usize].contains(&to) {
            return;
        }
        self.outgoing[from.0 as usize].push(to);
        self.incoming[to.0 as usize].push(from);
    }

    pub(crate) fn mark_uncullable(&mut self, node: NodeId) {
        self.uncullable[node.0 as usize] = true;
    }

    /// Flood-culls every node no surviving consumer can reach. Seeds the
    /// reference counts from the outgoing edge counts, pushes unreferenced
    /// cullable nodes, and propagates removals along incoming edges.
    pub(crate) fn cull(&mut self) {
        for (index, neighbors) in self.outgoing.iter().enumerate() {
            self.ref_counts[index] = neighbors.len() as u16;
        }

        let mut stack: Vec<usize> = (0..self.ref_counts.len())
            .filter(|&index| self.ref_counts[index] == 0 && !self.uncullable[index])
            .collect();

        while let Some(node) = stack.pop() {
            for &NodeId(from) in &self.incoming[node] {
                let from = from as usize;
                self.ref_counts[from] -= 1;
                if self.ref_counts[from] == 0 && !self.uncullable[from] {
                    stack.push(from);
                }
            }
        }
    }

    /// Valid after [`DependencyGraph::cull`].
    pub(crate) fn is_alive(&self, node: NodeId) -> bool {
        self.ref_counts[node.0 as usize] > 0 || self.uncullable[node.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds the pass/resource shape used by the frame graph: each pass
    /// node points at the resource nodes it produces, each resource node
    /// points at the passes that read it.
    fn pass_chain(graph: &mut DependencyGraph, length: usize) -> (Vec<NodeId>, Vec<NodeId>) {
        let mut passes = Vec::new();
        let mut resources = Vec::new();
        for i in 0..length {
            let pass = graph.add_node();
            let resource = graph.add_node();
            graph.add_edge(pass, resource);
            if i > 0 {
                graph.add_edge(resources[i - 1], pass);
            }
            passes.push(pass);
            resources.push(resource);
        }
        (passes, resources)
    }

    #[test]
    fn test_side_effect_pass_always_survives() {
        let mut graph = DependencyGraph::new();
        let (passes, _) = pass_chain(&mut graph, 3);
        graph.mark_uncullable(passes[2]);
        graph.cull();

        for pass in &passes {
            assert!(graph.is_alive(*pass));
        }
    }

    #[test]
    fn test_unobserved_chain_is_culled() {
        let mut graph = DependencyGraph::new();
        let (passes, resources) = pass_chain(&mut graph, 3);
        // No side effects anywhere: everything is dead.
        graph.cull();

        for pass in passes.iter().chain(resources.iter()) {
            assert!(!graph.is_alive(*pass));
        }
    }

    #[test]
    fn test_dead_branch_does_not_keep_writer_alive() {
        let mut graph = DependencyGraph::new();
        let (passes, _) = pass_chain(&mut graph, 3);
        graph.mark_uncullable(passes[2]);

        // Pass D writes a fresh texture nobody reads.
        let pass_d = graph.add_node();
        let texture_d = graph.add_node();
        graph.add_edge(pass_d, texture_d);

        graph.cull();

        assert!(graph.is_alive(passes[0]));
        assert!(graph.is_alive(passes[1]));
        assert!(graph.is_alive(passes[2]));
        assert!(!graph.is_alive(pass_d));
        assert!(!graph.is_alive(texture_d));
    }

    #[test]
    fn test_survivors_are_closed_under_writers() {
        let mut graph = DependencyGraph::new();
        // A writes r0; B reads r0 and writes r1; C (side effect) reads r1.
        let pass_a = graph.add_node();
        let r0 = graph.add_node();
        graph.add_edge(pass_a, r0);

        let pass_b = graph.add_node();
        let r1 = graph.add_node();
        graph.add_edge(r0, pass_b);
        graph.add_edge(pass_b, r1);

        let pass_c = graph.add_node();
        graph.add_edge(r1, pass_c);
        graph.mark_uncullable(pass_c);

        // An unrelated resource with no readers.
        let orphan = graph.add_node();

        graph.cull();

        assert!(graph.is_alive(pass_a));
        assert!(graph.is_alive(pass_b));
        assert!(graph.is_alive(pass_c));
        assert!(graph.is_alive(r0));
        assert!(graph.is_alive(r1));
        assert!(!graph.is_alive(orphan));
    }
}
