use std::{
    fmt,
    ops::{Deref, Index},
    slice::SliceIndex,
};

pub type FixedDimension = usize;

/// Concrete dimensions of a runtime tensor.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct FixedDimensions(pub Vec<FixedDimension>);

impl fmt::Debug for FixedDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl FixedDimensions {
    pub fn scalar() -> Self {
        Self(vec![])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A scalar has rank 0. `[1, 1]` holds one element but is not a scalar.
    pub fn is_scalar(&self) -> bool {
        self.is_empty()
    }

    pub fn total_elems(&self) -> usize {
        self.0.iter().product()
    }

    pub fn as_slice(&self) -> &[FixedDimension] {
        self.0.as_slice()
    }

    pub fn broadcast(&self, other: impl AsRef<Self>) -> Option<Self> {
        broadcast(&[self, other.as_ref()])
    }

    pub fn strides(&self) -> Self {
        compute_strides(self)
    }

    /// Strides that read `self` as if it had been broadcast to `dims`.
    /// Broadcast axes get a stride of zero.
    pub fn strides_for_broadcasting_to(&self, dims: &[FixedDimension]) -> Option<Self> {
        if dims.len() < self.len() {
            return None;
        }

        let strides = compute_strides(self);
        let mut new_strides = vec![0; dims.len()];
        for ((&from, &stride), (&to, new)) in self
            .0
            .iter()
            .rev()
            .zip(strides.0.iter().rev())
            .zip(dims.iter().rev().zip(new_strides.iter_mut().rev()))
        {
            if from == to {
                *new = stride;
            } else if from != 1 {
                return None;
            }
        }

        Some(new_strides.into())
    }
}

pub(crate) fn compute_strides(dims: &FixedDimensions) -> FixedDimensions {
    let mut strides = vec![];
    for i in 0..dims.len() {
        strides.push(dims[i + 1..].iter().product());
    }
    strides.into()
}

/// Numpy-style broadcasting. Returns `None` if `shapes` is empty or
/// any two trailing-aligned axes differ and neither is 1.
pub fn broadcast(shapes: &[impl AsRef<FixedDimensions>]) -> Option<FixedDimensions> {
    let mut shape = vec![];
    let max_len = shapes
        .iter()
        .map(AsRef::as_ref)
        .map(FixedDimensions::len)
        .max()?;
    for i in 0..max_len {
        let mut size = 1;
        for shape in shapes.iter().map(AsRef::as_ref) {
            let len = shape.len();
            let dim = if i < len { shape[len - i - 1] } else { 1 };
            if dim == 1 {
                continue;
            }
            if size != 1 && dim != size {
                return None;
            }
            size = dim
        }
        shape.push(size)
    }
    shape.reverse();
    Some(shape.into())
}

impl AsRef<FixedDimensions> for FixedDimensions {
    fn as_ref(&self) -> &FixedDimensions {
        self
    }
}

impl<I> Index<I> for FixedDimensions
where
    I: SliceIndex<[FixedDimension]>,
{
    type Output = <I as SliceIndex<[FixedDimension]>>::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<FixedDimension>> for FixedDimensions {
    fn from(v: Vec<FixedDimension>) -> FixedDimensions {
        FixedDimensions(v)
    }
}

impl<const N: usize> From<[FixedDimension; N]> for FixedDimensions {
    fn from(v: [FixedDimension; N]) -> FixedDimensions {
        FixedDimensions(v.to_vec())
    }
}

impl Deref for FixedDimensions {
    type Target = Vec<usize>;
    fn deref(&self) -> &Vec<usize> {
        &self.0
    }
}

#[test]
fn total_elems() {
    assert_eq!(FixedDimensions(vec![2, 3]).total_elems(), 6);
    assert_eq!(FixedDimensions(vec![3]).total_elems(), 3);
    assert_eq!(FixedDimensions::scalar().total_elems(), 1);
}

#[test]
fn strides() {
    assert_eq!(FixedDimensions::from([2, 3, 4]).strides(), [12, 4, 1].into());
    assert_eq!(FixedDimensions::from([3]).strides(), [1].into());
}

#[test]
fn broadcast_same() {
    let x = FixedDimensions::from([3]);
    assert_eq!(x.broadcast(&x).unwrap(), x);
}

#[test]
fn broadcast_column_and_row() {
    let col = FixedDimensions::from([2, 1]);
    let row = FixedDimensions::from([3]);
    assert_eq!(col.broadcast(row).unwrap(), [2, 3].into());
}

#[test]
fn broadcast_scalar() {
    let x = FixedDimensions::from([4, 2]);
    assert_eq!(x.broadcast(FixedDimensions::scalar()).unwrap(), x);
}

#[test]
fn broadcast_mismatch() {
    let x = FixedDimensions::from([3]);
    let y = FixedDimensions::from([2]);
    assert!(x.broadcast(y).is_none());
}

#[test]
fn strides_for_broadcasting() {
    let x = FixedDimensions::from([2, 1]);
    assert_eq!(
        x.strides_for_broadcasting_to(&[2, 3]).unwrap(),
        [1, 0].into()
    );
    let y = FixedDimensions::from([3]);
    assert_eq!(
        y.strides_for_broadcasting_to(&[2, 3]).unwrap(),
        [0, 1].into()
    );
    assert!(y.strides_for_broadcasting_to(&[2, 4]).is_none());
}

#[test]
fn only_rank_zero_is_scalar() {
    assert!(FixedDimensions::scalar().is_scalar());
    assert!(!FixedDimensions::from([1]).is_scalar());
    assert!(!FixedDimensions::from([1, 1]).is_scalar());
}
