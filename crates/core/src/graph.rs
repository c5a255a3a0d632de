use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::{
    analysis::shape::ShapeError,
    node::{Node, NodeArena, NodeId},
    tensor::TensorError,
    value::{ValueArena, ValueId},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("An operation named {0:?} already exists in the graph")]
    DuplicateName(String),

    #[error("Value {0:?} does not belong to this graph")]
    UnknownValue(ValueId),

    #[error("The graph contains a cycle")]
    Cycle,

    #[error("Shape: {0}")]
    Shape(#[from] ShapeError),

    #[error("Tensor: {0}")]
    Tensor(#[from] TensorError),
}

/// A dataflow graph. Every value is produced by exactly one node.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    pub nodes: NodeArena,
    pub values: ValueArena,
    /// Outputs of placeholder nodes, in creation order.
    pub inputs: Vec<ValueId>,
    names: FxHashMap<String, NodeId>,
    producers: FxHashMap<ValueId, NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node` to the graph. Its name must be unique.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.names.contains_key(&node.name) {
            return Err(GraphError::DuplicateName(node.name));
        }
        for &id in node.inputs.iter().chain(node.outputs.iter()) {
            if self.values.get(id).is_none() {
                return Err(GraphError::UnknownValue(id));
            }
        }

        let name = node.name.clone();
        let outputs = node.outputs.clone();
        let is_placeholder = node.op.is_placeholder();
        let id = self.nodes.alloc(node);

        log::debug!("add node {name:?} ({:?})", self.nodes[id].op.name());
        self.names.insert(name, id);
        for out in outputs {
            self.producers.insert(out, id);
            if is_placeholder {
                self.inputs.push(out);
            }
        }

        Ok(id)
    }

    /// Looks up an operation by name.
    pub fn operation(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// The node that produces `value`.
    pub fn producer(&self, value: ValueId) -> Option<NodeId> {
        self.producers.get(&value).copied()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a name not yet used by any operation, derived from `base`
    /// the same way default op names are: `base`, `base_1`, `base_2`, ...
    pub fn unique_name(&self, base: &str) -> String {
        if !self.names.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}_{i}"))
            .find(|name| !self.names.contains_key(name))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn get_value_users(&self) -> FxHashMap<ValueId, FxHashSet<NodeId>> {
        let mut value_users: FxHashMap<ValueId, FxHashSet<NodeId>> = FxHashMap::default();

        for (node_id, node) in self.nodes.iter() {
            for &input in node.inputs.iter() {
                value_users.entry(input).or_default().insert(node_id);
            }
        }

        value_users
    }

    /// Orders all nodes so that every node comes after the producers of its
    /// inputs. Ties are broken by creation order.
    pub fn topo_sort_nodes(&self) -> Result<Vec<NodeId>, GraphError> {
        let value_users = self.get_value_users();

        let mut nodes = vec![];
        let mut num_node_inputs = FxHashMap::default();
        let mut que = vec![];

        for (id, node) in self.nodes.iter() {
            let inputs = node.inputs.iter().collect::<FxHashSet<_>>();
            num_node_inputs.insert(id, inputs.len());
            if inputs.is_empty() {
                que.push(id);
            }
        }
        que.reverse();

        while let Some(id) = que.pop() {
            nodes.push(id);
            let mut ready = vec![];
            for output in self.nodes[id].outputs.iter() {
                let Some(users) = value_users.get(output) else {
                    continue;
                };
                for n in users.iter() {
                    let Some(count) = num_node_inputs.get_mut(n) else {
                        continue;
                    };
                    *count -= 1;
                    if *count == 0 {
                        ready.push(*n);
                    }
                }
            }
            ready.sort_by_key(|id| std::cmp::Reverse(id.index()));
            que.extend(ready);
        }

        if nodes.len() != self.nodes.len() {
            return Err(GraphError::Cycle);
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{op::Op, tensor::Tensor};

    fn constant(g: &mut Graph, name: &str, t: Tensor) -> ValueId {
        let out = g.values.new_val_named(name);
        g.add_node(
            Node::new(Op::Constant(crate::op::Constant { value: t }))
                .with_name(name)
                .with_out(out),
        )
        .unwrap();
        out
    }

    #[test]
    fn names_are_unique() {
        let mut g = Graph::new();
        let x = constant(&mut g, "x", Tensor::scalar(1i32));
        assert_eq!(g.unique_name("x"), "x_1");
        assert_eq!(g.unique_name("y"), "y");

        let out = g.values.new_val();
        let err = g
            .add_node(Node::new(Op::Add).with_name("x").with_ins(vec![x, x]).with_out(out))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateName("x".into()));
    }

    #[test]
    fn lookup_by_name_and_producer() {
        let mut g = Graph::new();
        let x = constant(&mut g, "x", Tensor::scalar(1i32));
        let id = g.operation("x").unwrap();
        assert_eq!(g.producer(x), Some(id));
        assert!(g.operation("nope").is_none());
    }

    #[test]
    fn topo_sort_respects_dependencies() {
        let mut g = Graph::new();
        let a = constant(&mut g, "a", Tensor::scalar(1i32));
        let b = constant(&mut g, "b", Tensor::scalar(2i32));
        let ab = g.values.new_val();
        let abb = g.values.new_val();
        // Inserted out of order on purpose: the consumer is created before its producer.
        let late = g.values.new_val();
        let sum2 = g
            .add_node(Node::new(Op::Mul).with_name("mul").with_ins(vec![ab, late]).with_out(abb))
            .unwrap();
        let sum1 = g
            .add_node(Node::new(Op::Add).with_ins(vec![a, b]).with_out(ab))
            .unwrap();
        let last = g
            .add_node(Node::new(Op::Sub).with_ins(vec![a, a]).with_out(late))
            .unwrap();

        let order = g.topo_sort_nodes().unwrap();
        let pos = |id| order.iter().position(|&n| n == id).unwrap();
        assert_eq!(order.len(), 5);
        assert!(pos(sum1) < pos(sum2));
        assert!(pos(last) < pos(sum2));
    }

    #[test]
    fn topo_sort_detects_cycles() {
        let mut g = Graph::new();
        let x = g.values.new_val();
        let y = g.values.new_val();
        g.add_node(Node::new(Op::Add).with_ins(vec![x, x]).with_out(y))
            .unwrap();
        g.add_node(Node::new(Op::Sub).with_ins(vec![y, y]).with_out(x))
            .unwrap();
        assert_eq!(g.topo_sort_nodes(), Err(GraphError::Cycle));
    }
}
