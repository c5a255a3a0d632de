use tensorgraph_core::{
    op::Op,
    tensor::{Tensor, TensorElemType, TensorElemTypeExt},
};

use crate::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Element arithmetic. Integers wrap on overflow; `None` means the result is undefined.
trait Arith: TensorElemTypeExt {
    fn apply(op: BinOp, a: Self, b: Self) -> Option<Self>;
}

macro_rules! impl_int_arith {
    ($($ty:ty),*) => {$(
        impl Arith for $ty {
            fn apply(op: BinOp, a: Self, b: Self) -> Option<Self> {
                match op {
                    BinOp::Add => Some(a.wrapping_add(b)),
                    BinOp::Sub => Some(a.wrapping_sub(b)),
                    BinOp::Mul => Some(a.wrapping_mul(b)),
                    BinOp::Div if b == 0 => None,
                    BinOp::Div => Some(a.wrapping_div(b)),
                }
            }
        }
    )*};
}

impl_int_arith!(i32, i64);

impl Arith for f32 {
    fn apply(op: BinOp, a: Self, b: Self) -> Option<Self> {
        Some(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        })
    }
}

pub(super) fn compute_binary(
    op: &Op,
    inputs: &[&Tensor],
    outputs: &mut [Tensor],
) -> Result<(), SessionError> {
    let bin = match op {
        Op::Add => BinOp::Add,
        Op::Sub => BinOp::Sub,
        Op::Mul => BinOp::Mul,
        Op::Div => BinOp::Div,
        _ => {
            return Err(SessionError::Kernel {
                op: op.name(),
                message: "not a binary element-wise operation".into(),
            })
        }
    };
    let input_a = inputs[Op::BIN_IN_A];
    let input_b = inputs[Op::BIN_IN_B];
    let output = &mut outputs[Op::BIN_OUT];

    match output.elem_ty() {
        TensorElemType::F32 => compute::<f32>(op, bin, input_a, input_b, output),
        TensorElemType::I32 => compute::<i32>(op, bin, input_a, input_b, output),
        TensorElemType::I64 => compute::<i64>(op, bin, input_a, input_b, output),
        TensorElemType::Bool => Err(SessionError::Kernel {
            op: op.name(),
            message: "arithmetic on boolean tensors is not supported".into(),
        }),
    }
}

fn compute<T: Arith>(
    op: &Op,
    bin: BinOp,
    input_a: &Tensor,
    input_b: &Tensor,
    output: &mut Tensor,
) -> Result<(), SessionError> {
    let undefined = || SessionError::Kernel {
        op: op.name(),
        message: "integer division by zero".into(),
    };
    let dims = output.dims().clone();
    let a = input_a.data::<T>();
    let b = input_b.data::<T>();

    if input_a.dims() == &dims && input_b.dims() == &dims {
        for ((o, &x), &y) in output.data_mut::<T>().iter_mut().zip(a).zip(b) {
            *o = T::apply(bin, x, y).ok_or_else(undefined)?;
        }
        return Ok(());
    }

    let not_broadcastable = |t: &Tensor| SessionError::Kernel {
        op: op.name(),
        message: format!("cannot broadcast {:?} to {:?}", t.dims(), dims),
    };
    let a_strides = input_a
        .strides_for_broadcasting(&dims)
        .ok_or_else(|| not_broadcastable(input_a))?;
    let b_strides = input_b
        .strides_for_broadcasting(&dims)
        .ok_or_else(|| not_broadcastable(input_b))?;
    let out_strides = dims.strides();

    for (i, o) in output.data_mut::<T>().iter_mut().enumerate() {
        let mut rem = i;
        let mut ai = 0;
        let mut bi = 0;
        for (axis, &stride) in out_strides.iter().enumerate() {
            let idx = rem / stride;
            rem %= stride;
            ai += idx * a_strides[axis];
            bi += idx * b_strides[axis];
        }
        *o = T::apply(bin, a[ai], b[bi]).ok_or_else(undefined)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: Op, a: &Tensor, b: &Tensor) -> Result<Tensor, SessionError> {
        let shape = op.compute_output_shapes(&[a, b])?.remove(0);
        let mut outputs = vec![Tensor::zeros_of_type(shape.elem_ty, shape.dims)];
        compute_binary(&op, &[a, b], &mut outputs)?;
        Ok(outputs.remove(0))
    }

    #[test]
    fn add_i32() {
        let a = Tensor::from_slice(&[1i32, 2, 3]);
        let b = Tensor::from_slice(&[4i32, 5, 6]);
        assert_eq!(run(Op::Add, &a, &b).unwrap().data::<i32>(), &[5, 7, 9]);
    }

    #[test]
    fn add_wraps_on_overflow() {
        let a = Tensor::from_slice(&[i32::MAX]);
        let b = Tensor::from_slice(&[1i32]);
        assert_eq!(run(Op::Add, &a, &b).unwrap().data::<i32>(), &[i32::MIN]);
    }

    #[test]
    fn sub_broadcasts_column_against_row() {
        let a = Tensor::new(vec![2, 1].into(), vec![10i64, 20]);
        let b = Tensor::from_slice(&[1i64, 2, 3]);
        let out = run(Op::Sub, &a, &b).unwrap();
        assert_eq!(out.dims().as_slice(), &[2, 3]);
        assert_eq!(out.data::<i64>(), &[9, 8, 7, 19, 18, 17]);
    }

    #[test]
    fn mul_by_scalar() {
        let a = Tensor::new(vec![2, 2].into(), vec![1.0f32, 2.0, 3.0, 4.0]);
        let b = Tensor::scalar(0.5f32);
        assert!(run(Op::Mul, &a, &b)
            .unwrap()
            .allclose(&[0.5f32, 1.0, 1.5, 2.0]));
    }

    #[test]
    fn integer_division_by_zero_fails() {
        let a = Tensor::from_slice(&[1i32, 2]);
        let b = Tensor::from_slice(&[1i32, 0]);
        assert!(matches!(
            run(Op::Div, &a, &b),
            Err(SessionError::Kernel { op: "Div", .. })
        ));
    }

    #[test]
    fn float_division_by_zero_is_infinite() {
        let a = Tensor::from_slice(&[1.0f32]);
        let b = Tensor::from_slice(&[0.0f32]);
        assert!(run(Op::Div, &a, &b).unwrap().data::<f32>()[0].is_infinite());
    }

    #[test]
    fn bool_arithmetic_is_rejected() {
        let a = Tensor::from_slice(&[true]);
        let b = Tensor::from_slice(&[false]);
        assert!(matches!(
            run(Op::Add, &a, &b),
            Err(SessionError::Kernel { op: "Add", .. })
        ));
    }
}
