use std::{cell::RefCell, fmt, sync::Arc};

use ndarray::{ArrayD, CowArray, IxDyn};
use rand::{
    distributions::Standard, prelude::Distribution, rngs::StdRng, thread_rng, Rng, SeedableRng,
};
use thiserror::Error;

use crate::{
    dim::Dimensions,
    fixed_dim::{FixedDimension, FixedDimensions},
};

thread_local!(static RNG: RefCell<StdRng> =
    RefCell::new(StdRng::from_rng(thread_rng()).expect("Failed to seed StdRng.")));

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dims: FixedDimensions,
    stride: FixedDimensions,
    data: TensorData,
}

/// Element storage. Shared between clones until one of them is written to.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Bool(Arc<Vec<bool>>),
    F32(Arc<Vec<f32>>),
    I32(Arc<Vec<i32>>),
    I64(Arc<Vec<i64>>),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TensorError {
    #[error("Element type mismatch: tensor holds {actual:?}, requested {requested:?}")]
    TypeMismatch {
        actual: TensorElemType,
        requested: TensorElemType,
    },

    #[error("Cannot copy {elems} elements into a buffer of length {len}")]
    LengthMismatch { elems: usize, len: usize },

    #[error("Shape {dims:?} needs {expected} elements but {actual} were given")]
    ElementCount {
        dims: FixedDimensions,
        expected: usize,
        actual: usize,
    },

    #[error("Tensor of shape {0:?} is not a scalar")]
    NotScalar(FixedDimensions),
}

/// Represents a type and shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedFixedShape {
    pub dims: FixedDimensions,
    pub elem_ty: TensorElemType,
}

/// Represents a type and a statically declared shape. `dims` is `None` when
/// even the rank is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedShape {
    pub dims: Option<Dimensions>,
    pub elem_ty: TensorElemType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorElemType {
    Bool,
    F32,
    I32,
    I64,
}

pub trait TensorElemTypeExt: PartialEq + PartialOrd + Copy + fmt::Debug + 'static {
    fn get_type() -> TensorElemType;
    fn zero() -> Self;
    fn close(a: Self, b: Self) -> bool;
    fn wrap(data: Vec<Self>) -> TensorData;
    fn unwrap_ref(data: &TensorData) -> Option<&[Self]>;
    fn unwrap_mut(data: &mut TensorData) -> Option<&mut Vec<Self>>;
}

impl Tensor {
    /// Creates a tensor. Panics if `data.len()` disagrees with `dims`.
    pub fn new<T: TensorElemTypeExt>(dims: FixedDimensions, data: Vec<T>) -> Self {
        match Self::try_new(dims, data) {
            Ok(t) => t,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new<T: TensorElemTypeExt>(
        dims: FixedDimensions,
        data: Vec<T>,
    ) -> Result<Self, TensorError> {
        let expected = dims.total_elems();
        if data.len() != expected {
            return Err(TensorError::ElementCount {
                dims,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            stride: dims.strides(),
            data: T::wrap(data),
            dims,
        })
    }

    /// Creates a rank-1 tensor holding a copy of `data`.
    pub fn from_slice<T: TensorElemTypeExt>(data: &[T]) -> Self {
        Self::new(vec![data.len()].into(), data.to_vec())
    }

    pub fn scalar<T: TensorElemTypeExt>(value: T) -> Self {
        Self::new(FixedDimensions::scalar(), vec![value])
    }

    pub fn zeros<T: TensorElemTypeExt>(dims: FixedDimensions) -> Self {
        let total_elems = dims.total_elems();
        Self::new(dims, vec![T::zero(); total_elems])
    }

    pub fn zeros_of_type(ty: TensorElemType, dims: FixedDimensions) -> Self {
        match ty {
            TensorElemType::Bool => Self::zeros::<bool>(dims),
            TensorElemType::F32 => Self::zeros::<f32>(dims),
            TensorElemType::I32 => Self::zeros::<i32>(dims),
            TensorElemType::I64 => Self::zeros::<i64>(dims),
        }
    }

    pub fn rand<T>(dims: FixedDimensions) -> Self
    where
        T: TensorElemTypeExt,
        Standard: Distribution<T>,
    {
        let total_elems = dims.total_elems();
        Self::new(
            dims,
            RNG.with(|r| {
                (&mut *r.borrow_mut())
                    .sample_iter(Standard)
                    .take(total_elems)
                    .collect::<Vec<T>>()
            }),
        )
    }

    pub fn rand_of_type(ty: TensorElemType, dims: FixedDimensions) -> Self {
        match ty {
            TensorElemType::Bool => Self::rand::<bool>(dims),
            TensorElemType::F32 => Self::rand::<f32>(dims),
            TensorElemType::I32 => Self::rand::<i32>(dims),
            TensorElemType::I64 => Self::rand::<i64>(dims),
        }
    }

    pub fn seed_rng_from_u64(seed: u64) {
        RNG.with(|r| *r.borrow_mut() = StdRng::seed_from_u64(seed));
    }

    pub fn dims(&self) -> &FixedDimensions {
        &self.dims
    }

    pub fn strides(&self) -> &[FixedDimension] {
        self.stride.as_slice()
    }

    pub fn num_elems(&self) -> usize {
        self.dims.total_elems()
    }

    pub fn elem_ty(&self) -> TensorElemType {
        match self.data {
            TensorData::Bool(_) => TensorElemType::Bool,
            TensorData::F32(_) => TensorElemType::F32,
            TensorData::I32(_) => TensorElemType::I32,
            TensorData::I64(_) => TensorElemType::I64,
        }
    }

    pub fn typed_shape(&self) -> TypedFixedShape {
        TypedFixedShape::new(self.dims.clone(), self.elem_ty())
    }

    /// Panics if `T` is not the element type of the tensor.
    pub fn data<T: TensorElemTypeExt>(&self) -> &[T] {
        assert_eq!(self.elem_ty(), T::get_type());
        T::unwrap_ref(&self.data).unwrap_or(&[])
    }

    /// Panics if `T` is not the element type of the tensor.
    pub fn data_mut<T: TensorElemTypeExt>(&mut self) -> &mut [T] {
        assert_eq!(self.elem_ty(), T::get_type());
        match T::unwrap_mut(&mut self.data) {
            Some(data) => data.as_mut_slice(),
            None => &mut [],
        }
    }

    pub fn try_data<T: TensorElemTypeExt>(&self) -> Result<&[T], TensorError> {
        T::unwrap_ref(&self.data).ok_or(TensorError::TypeMismatch {
            actual: self.elem_ty(),
            requested: T::get_type(),
        })
    }

    /// Copies the elements in row-major order into `dst`, which must be
    /// exactly as long as the tensor.
    pub fn copy_to<T: TensorElemTypeExt>(&self, dst: &mut [T]) -> Result<(), TensorError> {
        let data = self.try_data::<T>()?;
        if data.len() != dst.len() {
            return Err(TensorError::LengthMismatch {
                elems: data.len(),
                len: dst.len(),
            });
        }
        dst.copy_from_slice(data);
        Ok(())
    }

    pub fn scalar_value<T: TensorElemTypeExt>(&self) -> Result<T, TensorError> {
        let data = self.try_data::<T>()?;
        match data {
            [x] if self.dims.is_scalar() => Ok(*x),
            _ => Err(TensorError::NotScalar(self.dims.clone())),
        }
    }

    pub fn to_ndarray<T: TensorElemTypeExt>(&self) -> Result<ArrayD<T>, TensorError> {
        let data = self.try_data::<T>()?;
        ArrayD::from_shape_vec(IxDyn(self.dims.as_slice()), data.to_vec()).map_err(|_| {
            TensorError::ElementCount {
                dims: self.dims.clone(),
                expected: self.dims.total_elems(),
                actual: data.len(),
            }
        })
    }

    pub fn allclose<T: TensorElemTypeExt>(&self, other: &[T]) -> bool {
        let Ok(x) = self.try_data::<T>() else {
            return false;
        };
        if x.len() != other.len() {
            return false;
        }

        x.iter().zip(other.iter()).all(|(&x, &y)| T::close(x, y))
    }

    pub fn verify(&self) -> bool {
        let len = match &self.data {
            TensorData::Bool(d) => d.len(),
            TensorData::F32(d) => d.len(),
            TensorData::I32(d) => d.len(),
            TensorData::I64(d) => d.len(),
        };
        len == self.dims.total_elems()
    }

    pub fn strides_for_broadcasting(&self, dims: &[FixedDimension]) -> Option<FixedDimensions> {
        self.dims.strides_for_broadcasting_to(dims)
    }
}

impl TypedFixedShape {
    pub fn new(dims: FixedDimensions, elem_ty: TensorElemType) -> Self {
        Self { dims, elem_ty }
    }
}

impl TypedShape {
    pub fn new(dims: Option<Dimensions>, elem_ty: TensorElemType) -> Self {
        Self { dims, elem_ty }
    }
}

impl From<TypedFixedShape> for TypedShape {
    fn from(typed: TypedFixedShape) -> Self {
        Self {
            dims: Some(typed.dims.into()),
            elem_ty: typed.elem_ty,
        }
    }
}

impl TensorElemType {
    pub fn size(&self) -> usize {
        match self {
            TensorElemType::Bool => std::mem::size_of::<bool>(),
            TensorElemType::F32 => std::mem::size_of::<f32>(),
            TensorElemType::I32 => std::mem::size_of::<i32>(),
            TensorElemType::I64 => std::mem::size_of::<i64>(),
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub fn is_f32(&self) -> bool {
        matches!(self, Self::F32)
    }

    pub fn is_i32(&self) -> bool {
        matches!(self, Self::I32)
    }

    pub fn is_i64(&self) -> bool {
        matches!(self, Self::I64)
    }
}

macro_rules! impl_elem_type {
    ($ty:ty, $variant:ident, $zero:expr) => {
        impl TensorElemTypeExt for $ty {
            fn get_type() -> TensorElemType {
                TensorElemType::$variant
            }

            fn zero() -> Self {
                $zero
            }

            fn close(a: Self, b: Self) -> bool {
                a == b
            }

            fn wrap(data: Vec<Self>) -> TensorData {
                TensorData::$variant(Arc::new(data))
            }

            fn unwrap_ref(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(d) => Some(d.as_slice()),
                    _ => None,
                }
            }

            fn unwrap_mut(data: &mut TensorData) -> Option<&mut Vec<Self>> {
                match data {
                    TensorData::$variant(d) => Some(Arc::make_mut(d)),
                    _ => None,
                }
            }
        }
    };
}

impl_elem_type!(bool, Bool, false);
impl_elem_type!(i32, I32, 0i32);
impl_elem_type!(i64, I64, 0i64);

impl TensorElemTypeExt for f32 {
    fn get_type() -> TensorElemType {
        TensorElemType::F32
    }

    fn zero() -> Self {
        0f32
    }

    fn close(a: Self, b: Self) -> bool {
        let atol = 1e-5;
        let rtol = 1e-8;
        ((a - b).abs() <= (atol + rtol * b.abs()))
            || (a.is_infinite() && b.is_infinite() && a.is_sign_positive() == b.is_sign_positive())
    }

    fn wrap(data: Vec<Self>) -> TensorData {
        TensorData::F32(Arc::new(data))
    }

    fn unwrap_ref(data: &TensorData) -> Option<&[Self]> {
        match data {
            TensorData::F32(d) => Some(d.as_slice()),
            _ => None,
        }
    }

    fn unwrap_mut(data: &mut TensorData) -> Option<&mut Vec<Self>> {
        match data {
            TensorData::F32(d) => Some(Arc::make_mut(d)),
            _ => None,
        }
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn dump<T: TensorElemTypeExt>(f: &mut fmt::Formatter<'_>, data: &[T]) -> fmt::Result {
            const MAX_ELEMS: usize = 10;
            if data.len() > MAX_ELEMS {
                write!(f, "[")?;
                for e in data[0..MAX_ELEMS / 2].iter() {
                    write!(f, "{e:?}, ")?;
                }
                write!(f, "...")?;
                for e in data[data.len() - MAX_ELEMS / 2..].iter() {
                    write!(f, ", {e:?}")?;
                }
                write!(f, "]")
            } else {
                write!(f, "{data:?}")
            }
        }

        write!(f, "Tensor({:?}, {:?}, ", self.dims, self.elem_ty())?;
        match &self.data {
            TensorData::F32(d) => dump(f, d.as_slice())?,
            TensorData::I32(d) => dump(f, d.as_slice())?,
            TensorData::I64(d) => dump(f, d.as_slice())?,
            TensorData::Bool(d) => dump(f, d.as_slice())?,
        }
        write!(f, ")")
    }
}

impl<T: TensorElemTypeExt> From<&CowArray<'_, T, IxDyn>> for Tensor {
    fn from(arr: &CowArray<T, IxDyn>) -> Self {
        let dims = arr.shape().to_vec().into();
        let data = arr.iter().cloned().collect();
        Self::new(dims, data)
    }
}
