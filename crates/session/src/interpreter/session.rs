use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};
use tensorgraph_core::{
    analysis::shape::is_compatible,
    graph::{Graph, GraphError},
    node::NodeId,
    op::Op,
    tensor::{Tensor, TypedFixedShape},
    value::ValueId,
};

use super::kernels;
use crate::{Session, SessionError};

/// Executes a graph node by node on the host. Borrows the graph, so it can
/// never outlive it.
pub struct InterpreterSession<'a> {
    pub(super) graph: &'a Graph,
    pub(super) sorted_nodes: Vec<NodeId>,
    pub(super) node_order: FxHashMap<NodeId, usize>,
    pub(super) enable_profiling: bool,
}

/// Represents a node to execute and values to be freed after the execution of the node.
#[derive(Debug)]
struct NodeExecutionPlan {
    node_id: NodeId,
    free_vals: Vec<ValueId>,
}

impl<'a> InterpreterSession<'a> {
    /// Validates feeds against the declared shapes of the values they replace
    /// and returns the set of fed values. Each value may be fed at most once.
    fn check_feeds(
        &self,
        feeds: &[(ValueId, Tensor)],
    ) -> Result<FxHashSet<ValueId>, SessionError> {
        let mut fed = FxHashSet::default();
        for (id, tensor) in feeds {
            let value = self
                .graph
                .values
                .get(*id)
                .ok_or(GraphError::UnknownValue(*id))?;
            if !fed.insert(*id) {
                return Err(SessionError::DuplicateFeed(
                    value.name.clone().unwrap_or_default(),
                ));
            }
            let Some(expected) = &value.shape else {
                continue;
            };
            let actual = tensor.typed_shape();
            if !is_compatible(expected, &actual) {
                return Err(SessionError::FeedMismatch {
                    name: value.name.clone().unwrap_or_default(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(fed)
    }

    /// Collects the nodes needed to compute `fetches`, stopping at fed values,
    /// and schedules each intermediate value to be freed after its last use.
    fn create_execution_plan(
        &self,
        fed: &FxHashSet<ValueId>,
        fetches: &[ValueId],
    ) -> Result<Vec<NodeExecutionPlan>, SessionError> {
        let mut needed = FxHashSet::default();
        let mut stack = fetches.to_vec();

        while let Some(val) = stack.pop() {
            if fed.contains(&val) {
                continue;
            }
            let node_id = self
                .graph
                .producer(val)
                .ok_or(GraphError::UnknownValue(val))?;
            if !needed.insert(node_id) {
                continue;
            }
            let node = &self.graph.nodes[node_id];
            if node.op.is_placeholder() {
                return Err(SessionError::MissingFeed(node.name.clone()));
            }
            stack.extend(node.inputs.iter().copied());
        }

        let mut order = needed.into_iter().collect::<Vec<_>>();
        order.sort_by_key(|id| self.node_order[id]);

        let mut last_use = FxHashMap::default();
        for (i, &node_id) in order.iter().enumerate() {
            for &input in &self.graph.nodes[node_id].inputs {
                last_use.insert(input, i);
            }
        }

        let mut plan = order
            .into_iter()
            .map(|node_id| NodeExecutionPlan {
                node_id,
                free_vals: vec![],
            })
            .collect::<Vec<_>>();
        for (val, i) in last_use {
            if !fetches.contains(&val) {
                plan[i].free_vals.push(val);
            }
        }

        Ok(plan)
    }

    fn run_node(
        &self,
        profile: &mut FxHashMap<&'static str, Duration>,
        values: &mut FxHashMap<ValueId, Tensor>,
        node_id: NodeId,
    ) -> Result<(), SessionError> {
        let node = &self.graph.nodes[node_id];
        let inputs = node
            .inputs
            .iter()
            .map(|id| {
                values.get(id).ok_or_else(|| {
                    SessionError::Message(format!("{}: input not computed", node.name).into())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let start = Instant::now();

        // Actual kernel runs here.
        let outputs = match &node.op {
            Op::Placeholder(_) => return Err(SessionError::MissingFeed(node.name.clone())),
            Op::Constant(c) => vec![c.value.clone()],
            op if op.is_binary_elemwise() => {
                let mut outputs = op
                    .compute_output_shapes(&inputs)?
                    .into_iter()
                    .map(|TypedFixedShape { dims, elem_ty }| Tensor::zeros_of_type(elem_ty, dims))
                    .collect::<Vec<_>>();
                kernels::compute_binary(op, &inputs, &mut outputs)?;
                outputs
            }
            op => {
                return Err(SessionError::Kernel {
                    op: op.name(),
                    message: "no kernel for this operation".into(),
                })
            }
        };

        *profile.entry(node.op.name()).or_default() += start.elapsed();

        for (&val, output) in node.outputs.iter().zip(outputs) {
            values.insert(val, output);
        }

        Ok(())
    }
}

impl Session for InterpreterSession<'_> {
    fn run(
        &self,
        feeds: Vec<(ValueId, Tensor)>,
        fetches: &[ValueId],
    ) -> Result<Vec<Tensor>, SessionError> {
        let start = Instant::now();

        if fetches.is_empty() {
            return Err(SessionError::NoFetches);
        }

        let fed = self.check_feeds(&feeds)?;
        let plan = self.create_execution_plan(&fed, fetches)?;
        log::debug!("running {} of {} nodes", plan.len(), self.sorted_nodes.len());

        let mut values = feeds.into_iter().collect::<FxHashMap<_, _>>();
        let mut profile = FxHashMap::default();

        for step in &plan {
            self.run_node(&mut profile, &mut values, step.node_id)?;

            for val in &step.free_vals {
                values.remove(val);
            }
        }

        if self.enable_profiling {
            log::info!(
                "Kernel execution time: {:#?}",
                profile.values().sum::<Duration>()
            );
            log::info!("Total execution time: {:#?}", start.elapsed());
            log::info!("Profile: {:#?}", profile);
        }

        fetches
            .iter()
            .map(|id| {
                values.get(id).cloned().ok_or_else(|| {
                    SessionError::Message(format!("fetched value {id:?} was not computed").into())
                })
            })
            .collect()
    }
}
