use crate::{
    dim::Dimensions,
    tensor::{Tensor, TensorElemType, TypedShape},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Placeholder(Placeholder),
    Constant(Constant),
    Add,
    Sub,
    Mul,
    Div,
}

/// An input slot that must be fed when a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub elem_ty: TensorElemType,
    pub dims: Option<Dimensions>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub value: Tensor,
}

impl Op {
    pub const BIN_IN_A: usize = 0;
    pub const BIN_IN_B: usize = 1;
    pub const BIN_OUT: usize = 0;

    pub fn name(&self) -> &'static str {
        match self {
            Op::Placeholder(_) => "Placeholder",
            Op::Constant(_) => "Const",
            Op::Add => "Add",
            Op::Sub => "Sub",
            Op::Mul => "Mul",
            Op::Div => "Div",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Op::Placeholder(_))
    }

    pub fn is_binary_elemwise(&self) -> bool {
        matches!(self, Op::Add | Op::Sub | Op::Mul | Op::Div)
    }
}

impl Placeholder {
    pub fn typed_shape(&self) -> TypedShape {
        TypedShape::new(self.dims.clone(), self.elem_ty)
    }
}
