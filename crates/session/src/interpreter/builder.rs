use rustc_hash::FxHashMap;
use tensorgraph_core::graph::Graph;

use super::session::InterpreterSession;
use crate::SessionError;

pub struct InterpreterSessionBuilder<'a> {
    graph: &'a Graph,
    enable_profiling: bool,
}

impl<'a> InterpreterSessionBuilder<'a> {
    pub const fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            enable_profiling: false,
        }
    }

    pub const fn with_profiling_enabled(mut self, enable_profiling: bool) -> Self {
        self.enable_profiling = enable_profiling;
        self
    }

    pub fn build(self) -> Result<InterpreterSession<'a>, SessionError> {
        let graph = self.graph;
        let sorted_nodes = graph.topo_sort_nodes()?;
        let node_order: FxHashMap<_, _> = sorted_nodes
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        log::debug!(
            "session opened: {} nodes, {} placeholders",
            sorted_nodes.len(),
            graph.inputs.len()
        );

        Ok(InterpreterSession {
            graph,
            sorted_nodes,
            node_order,
            enable_profiling: self.enable_profiling,
        })
    }
}
