use std::borrow::Cow;

use thiserror::Error;

use crate::{
    op::Op,
    tensor::{Tensor, TensorElemType, TypedFixedShape, TypedShape},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{op}: shapes {lhs} and {rhs} are not broadcastable")]
    Incompatible {
        op: &'static str,
        lhs: String,
        rhs: String,
    },

    #[error("{op}: element types {lhs:?} and {rhs:?} differ")]
    ElemType {
        op: &'static str,
        lhs: TensorElemType,
        rhs: TensorElemType,
    },

    #[error("Something went wrong: {0}")]
    Message(Cow<'static, str>),
}

impl Op {
    /// Computes the output shapes of the operation from concrete inputs.
    pub fn compute_output_shapes(
        &self,
        inputs: &[&Tensor],
    ) -> Result<Vec<TypedFixedShape>, ShapeError> {
        match self {
            Op::Placeholder(_) => Err(ShapeError::Message(
                "placeholder outputs come from feeds".into(),
            )),
            Op::Constant(c) => Ok(vec![c.value.typed_shape()]),
            Op::Add | Op::Sub | Op::Mul | Op::Div => {
                let [x, y] = inputs else {
                    return Err(ShapeError::Message(
                        format!("{}: expected 2 inputs, got {}", self.name(), inputs.len()).into(),
                    ));
                };
                let elem_ty = self.check_elem_types(x.elem_ty(), y.elem_ty())?;
                let dims = x
                    .dims()
                    .broadcast(y.dims())
                    .ok_or_else(|| ShapeError::Incompatible {
                        op: self.name(),
                        lhs: format!("{:?}", x.dims()),
                        rhs: format!("{:?}", y.dims()),
                    })?;
                Ok(vec![TypedFixedShape::new(dims, elem_ty)])
            }
        }
    }

    /// Infers the declared output shapes while the graph is being built.
    /// Only definite conflicts are reported; unknown axes are accepted.
    pub fn infer_static_shapes(
        &self,
        inputs: &[&TypedShape],
    ) -> Result<Vec<TypedShape>, ShapeError> {
        match self {
            Op::Placeholder(p) => Ok(vec![p.typed_shape()]),
            Op::Constant(c) => Ok(vec![c.value.typed_shape().into()]),
            Op::Add | Op::Sub | Op::Mul | Op::Div => {
                let [x, y] = inputs else {
                    return Err(ShapeError::Message(
                        format!("{}: expected 2 inputs, got {}", self.name(), inputs.len()).into(),
                    ));
                };
                let elem_ty = self.check_elem_types(x.elem_ty, y.elem_ty)?;
                let dims = match (&x.dims, &y.dims) {
                    (Some(xd), Some(yd)) => {
                        Some(xd.broadcast(yd).ok_or_else(|| ShapeError::Incompatible {
                            op: self.name(),
                            lhs: format!("{xd:?}"),
                            rhs: format!("{yd:?}"),
                        })?)
                    }
                    _ => None,
                };
                Ok(vec![TypedShape::new(dims, elem_ty)])
            }
        }
    }

    fn check_elem_types(
        &self,
        lhs: TensorElemType,
        rhs: TensorElemType,
    ) -> Result<TensorElemType, ShapeError> {
        if lhs != rhs {
            return Err(ShapeError::ElemType {
                op: self.name(),
                lhs,
                rhs,
            });
        }
        Ok(lhs)
    }
}

/// Checks a fed tensor against the shape declared for the value.
pub fn is_compatible(declared: &TypedShape, actual: &TypedFixedShape) -> bool {
    declared.elem_ty == actual.elem_ty
        && declared
            .dims
            .as_ref()
            .map_or(true, |dims| dims.is_compatible_with(&actual.dims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::{Dimension, Dimensions};

    #[test]
    fn add_broadcasts_at_run_time() {
        let x = Tensor::zeros::<i32>(vec![2, 1].into());
        let y = Tensor::zeros::<i32>(vec![3].into());
        let shapes = Op::Add.compute_output_shapes(&[&x, &y]).unwrap();
        assert_eq!(
            shapes,
            vec![TypedFixedShape::new(vec![2, 3].into(), TensorElemType::I32)]
        );
    }

    #[test]
    fn add_rejects_mismatched_shapes() {
        let x = Tensor::zeros::<i32>(vec![3].into());
        let y = Tensor::zeros::<i32>(vec![2].into());
        let err = Op::Add.compute_output_shapes(&[&x, &y]).unwrap_err();
        assert_eq!(err.to_string(), "Add: shapes [3] and [2] are not broadcastable");
    }

    #[test]
    fn mul_rejects_mixed_types() {
        let x = Tensor::zeros::<i32>(vec![3].into());
        let y = Tensor::zeros::<f32>(vec![3].into());
        assert!(matches!(
            Op::Mul.compute_output_shapes(&[&x, &y]),
            Err(ShapeError::ElemType { op: "Mul", .. })
        ));
    }

    #[test]
    fn static_inference_keeps_unknown_rank() {
        let x = TypedShape::new(None, TensorElemType::F32);
        let y = TypedShape::new(Some([3].into()), TensorElemType::F32);
        let shapes = Op::Sub.infer_static_shapes(&[&x, &y]).unwrap();
        assert_eq!(shapes, vec![TypedShape::new(None, TensorElemType::F32)]);
    }

    #[test]
    fn static_inference_resolves_unknown_axis() {
        let x = TypedShape::new(
            Some(Dimensions::new(vec![Dimension::Unknown])),
            TensorElemType::I64,
        );
        let y = TypedShape::new(Some([3].into()), TensorElemType::I64);
        let shapes = Op::Add.infer_static_shapes(&[&x, &y]).unwrap();
        assert_eq!(shapes[0].dims, Some([3].into()));
    }

    #[test]
    fn feed_compatibility() {
        let declared = TypedShape::new(Some([3].into()), TensorElemType::I32);
        let ok = TypedFixedShape::new(vec![3].into(), TensorElemType::I32);
        let short = TypedFixedShape::new(vec![2].into(), TensorElemType::I32);
        let float = TypedFixedShape::new(vec![3].into(), TensorElemType::F32);
        assert!(is_compatible(&declared, &ok));
        assert!(!is_compatible(&declared, &short));
        assert!(!is_compatible(&declared, &float));
        assert!(is_compatible(
            &TypedShape::new(None, TensorElemType::I32),
            &short
        ));
    }
}
