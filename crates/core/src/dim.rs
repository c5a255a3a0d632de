use std::fmt;

use crate::fixed_dim::{FixedDimension, FixedDimensions};

/// A statically declared dimension. `Unknown` matches any size at run time.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Fixed(FixedDimension),
    Unknown,
}

/// Statically declared dimensions of a value. The rank is always known.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Dimensions(pub Vec<Dimension>);

impl Dimension {
    pub fn as_fixed(&self) -> Option<FixedDimension> {
        match self {
            Self::Fixed(d) => Some(*d),
            Self::Unknown => None,
        }
    }

    pub fn is_compatible_with(&self, dim: FixedDimension) -> bool {
        match self {
            Self::Fixed(d) => *d == dim,
            Self::Unknown => true,
        }
    }
}

impl Dimensions {
    pub fn new(dims: Vec<Dimension>) -> Self {
        Self(dims)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Dimension] {
        &self.0
    }

    /// Returns the concrete dimensions if every axis is known.
    pub fn as_fixed(&self) -> Option<FixedDimensions> {
        self.0
            .iter()
            .map(Dimension::as_fixed)
            .collect::<Option<Vec<_>>>()
            .map(FixedDimensions)
    }

    pub fn is_compatible_with(&self, dims: &FixedDimensions) -> bool {
        self.len() == dims.len()
            && self
                .0
                .iter()
                .zip(dims.iter())
                .all(|(s, &d)| s.is_compatible_with(d))
    }

    /// Broadcasts two declared shapes. Unknown axes stay unknown unless the
    /// other side pins them to a size other than 1. Returns `None` only on a
    /// definite conflict between two fixed axes.
    pub fn broadcast(&self, other: &Self) -> Option<Self> {
        let len = self.len().max(other.len());
        let mut dims = Vec::with_capacity(len);
        for i in 0..len {
            let x = axis_from_back(self, i);
            let y = axis_from_back(other, i);
            let dim = match (x, y) {
                (Dimension::Fixed(1), d) | (d, Dimension::Fixed(1)) => d,
                (Dimension::Fixed(a), Dimension::Fixed(b)) if a == b => Dimension::Fixed(a),
                (Dimension::Fixed(_), Dimension::Fixed(_)) => return None,
                (Dimension::Fixed(d), Dimension::Unknown)
                | (Dimension::Unknown, Dimension::Fixed(d)) => Dimension::Fixed(d),
                (Dimension::Unknown, Dimension::Unknown) => Dimension::Unknown,
            };
            dims.push(dim);
        }
        dims.reverse();
        Some(Self(dims))
    }
}

fn axis_from_back(dims: &Dimensions, i: usize) -> Dimension {
    let len = dims.len();
    if i < len {
        dims.0[len - i - 1]
    } else {
        Dimension::Fixed(1)
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(d) => write!(f, "{d}"),
            Self::Unknown => write!(f, "?"),
        }
    }
}

impl fmt::Debug for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl From<FixedDimensions> for Dimensions {
    fn from(dims: FixedDimensions) -> Self {
        Dimensions(dims.0.into_iter().map(Dimension::Fixed).collect())
    }
}

impl From<Vec<FixedDimension>> for Dimensions {
    fn from(dims: Vec<FixedDimension>) -> Self {
        Dimensions(dims.into_iter().map(Dimension::Fixed).collect())
    }
}

impl<const N: usize> From<[FixedDimension; N]> for Dimensions {
    fn from(dims: [FixedDimension; N]) -> Self {
        Dimensions(dims.into_iter().map(Dimension::Fixed).collect())
    }
}

#[test]
fn compatibility() {
    let declared = Dimensions::new(vec![Dimension::Unknown, Dimension::Fixed(3)]);
    assert!(declared.is_compatible_with(&vec![7, 3].into()));
    assert!(!declared.is_compatible_with(&vec![7, 2].into()));
    assert!(!declared.is_compatible_with(&vec![3].into()));
}

#[test]
fn static_broadcast() {
    let x = Dimensions::from([2, 1]);
    let y = Dimensions::from([3]);
    assert_eq!(x.broadcast(&y).unwrap(), Dimensions::from([2, 3]));

    let u = Dimensions::new(vec![Dimension::Unknown]);
    assert_eq!(u.broadcast(&Dimensions::from([3])).unwrap(), Dimensions::from([3]));
    assert_eq!(u.broadcast(&Dimensions::from([1])).unwrap(), u);

    assert!(Dimensions::from([3]).broadcast(&Dimensions::from([2])).is_none());
}

#[test]
fn debug_format() {
    let dims = Dimensions::new(vec![Dimension::Unknown, Dimension::Fixed(3)]);
    assert_eq!(format!("{dims:?}"), "[?, 3]");
}
