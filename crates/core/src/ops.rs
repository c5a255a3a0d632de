//! A typed convenience layer for building graphs.
//!
//! ```
//! use tensorgraph_core::{graph::Graph, ops::Ops};
//!
//! let mut graph = Graph::new();
//! let mut ops = Ops::create(&mut graph);
//! let a = ops.placeholder::<i32>([3]).unwrap();
//! let b = ops.placeholder::<i32>([3]).unwrap();
//! let sum = ops.add(a, b).unwrap();
//! assert_eq!(graph.num_nodes(), 3);
//! # let _ = sum;
//! ```

use std::{fmt, marker::PhantomData};

use crate::{
    dim::Dimensions,
    graph::{Graph, GraphError},
    node::{Node, NodeId},
    op::{Constant, Op, Placeholder},
    tensor::{Tensor, TensorElemTypeExt, TensorError, TypedShape},
    value::ValueId,
};

/// A handle to an output of a graph node whose elements are `T`.
pub struct Operand<T> {
    node: NodeId,
    value: ValueId,
    _elem: PhantomData<fn() -> T>,
}

impl<T> Operand<T> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn value(&self) -> ValueId {
        self.value
    }
}

impl<T> Clone for Operand<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Operand<T> {}

impl<T> PartialEq for Operand<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Operand<T> {}

impl<T> fmt::Debug for Operand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operand")
            .field("node", &self.node)
            .field("value", &self.value)
            .finish()
    }
}

/// Builds nodes in a graph. Each builder method adds one node with one output.
pub struct Ops<'g> {
    graph: &'g mut Graph,
    name: Option<String>,
}

impl<'g> Ops<'g> {
    pub fn create(graph: &'g mut Graph) -> Self {
        Self { graph, name: None }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Names the next node created by this builder.
    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// An input slot of rank `dims.len()`. Fixed axes must match when fed.
    pub fn placeholder<T: TensorElemTypeExt>(
        &mut self,
        dims: impl Into<Dimensions>,
    ) -> Result<Operand<T>, GraphError> {
        self.build(
            Op::Placeholder(Placeholder {
                elem_ty: T::get_type(),
                dims: Some(dims.into()),
            }),
            vec![],
        )
    }

    /// An input slot that accepts a tensor of any shape.
    pub fn placeholder_of_unknown_shape<T: TensorElemTypeExt>(
        &mut self,
    ) -> Result<Operand<T>, GraphError> {
        self.build(
            Op::Placeholder(Placeholder {
                elem_ty: T::get_type(),
                dims: None,
            }),
            vec![],
        )
    }

    /// Fails with [`GraphError::Tensor`] if `value` does not hold `T` elements.
    pub fn constant<T: TensorElemTypeExt>(
        &mut self,
        value: Tensor,
    ) -> Result<Operand<T>, GraphError> {
        if value.elem_ty() != T::get_type() {
            self.name = None;
            return Err(TensorError::TypeMismatch {
                actual: value.elem_ty(),
                requested: T::get_type(),
            }
            .into());
        }
        self.build(Op::Constant(Constant { value }), vec![])
    }

    pub fn add<T: TensorElemTypeExt>(
        &mut self,
        x: Operand<T>,
        y: Operand<T>,
    ) -> Result<Operand<T>, GraphError> {
        self.build(Op::Add, vec![x.value, y.value])
    }

    pub fn sub<T: TensorElemTypeExt>(
        &mut self,
        x: Operand<T>,
        y: Operand<T>,
    ) -> Result<Operand<T>, GraphError> {
        self.build(Op::Sub, vec![x.value, y.value])
    }

    pub fn mul<T: TensorElemTypeExt>(
        &mut self,
        x: Operand<T>,
        y: Operand<T>,
    ) -> Result<Operand<T>, GraphError> {
        self.build(Op::Mul, vec![x.value, y.value])
    }

    pub fn div<T: TensorElemTypeExt>(
        &mut self,
        x: Operand<T>,
        y: Operand<T>,
    ) -> Result<Operand<T>, GraphError> {
        self.build(Op::Div, vec![x.value, y.value])
    }

    fn build<T>(&mut self, op: Op, inputs: Vec<ValueId>) -> Result<Operand<T>, GraphError> {
        let name = match self.name.take() {
            Some(name) => name,
            None => self.graph.unique_name(op.name()),
        };
        if self.graph.operation(&name).is_some() {
            return Err(GraphError::DuplicateName(name));
        }

        let mut input_shapes = vec![];
        for &id in &inputs {
            let value = self.graph.values.get(id).ok_or(GraphError::UnknownValue(id))?;
            // Values created by this builder always carry a shape.
            let shape = value.shape.clone().ok_or(GraphError::UnknownValue(id))?;
            input_shapes.push(shape);
        }
        let input_shapes = input_shapes.iter().collect::<Vec<&TypedShape>>();
        let mut shapes = op.infer_static_shapes(&input_shapes)?;
        let shape = shapes.remove(0);

        let value = self
            .graph
            .values
            .new_val_named_and_shaped(name.clone(), shape);
        let node = self.graph.add_node(
            Node::new(op)
                .with_name(name)
                .with_ins(inputs)
                .with_out(value),
        )?;

        Ok(Operand {
            node,
            value,
            _elem: PhantomData,
        })
    }
}
