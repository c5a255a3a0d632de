pub mod interpreter;

use std::borrow::Cow;

use tensorgraph_core::{
    analysis::shape::ShapeError,
    graph::GraphError,
    ops::Operand,
    tensor::{Tensor, TensorError, TypedFixedShape, TypedShape},
    value::ValueId,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Errors arising from shape inference.
    #[error("Shape: {0}")]
    Shape(#[from] ShapeError),

    #[error("Graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Tensor: {0}")]
    Tensor(#[from] TensorError),

    #[error("Cannot feed {actual:?} to {name:?}, which expects {expected:?}")]
    FeedMismatch {
        name: String,
        expected: TypedShape,
        actual: TypedFixedShape,
    },

    #[error("Value {0:?} was fed more than once")]
    DuplicateFeed(String),

    #[error("No value was fed to placeholder {0:?}")]
    MissingFeed(String),

    #[error("Nothing to fetch")]
    NoFetches,

    #[error("{op}: {message}")]
    Kernel { op: &'static str, message: String },

    /// General error messages.
    #[error("Something went wrong: {0}")]
    Message(Cow<'static, str>),
}

pub trait Session {
    /// Runs the graph once. `feeds` override values (usually placeholders);
    /// the returned tensors are in the order of `fetches`.
    fn run(
        &self,
        feeds: Vec<(ValueId, Tensor)>,
        fetches: &[ValueId],
    ) -> Result<Vec<Tensor>, SessionError>;

    fn runner(&self) -> Runner<'_, Self> {
        Runner {
            session: self,
            feeds: vec![],
            fetches: vec![],
        }
    }
}

/// Collects feeds and fetches for a single run.
pub struct Runner<'s, S: ?Sized> {
    session: &'s S,
    feeds: Vec<(ValueId, Tensor)>,
    fetches: Vec<ValueId>,
}

impl<'s, S: Session + ?Sized> Runner<'s, S> {
    pub fn feed<T>(self, operand: Operand<T>, tensor: Tensor) -> Self {
        self.feed_value(operand.value(), tensor)
    }

    pub fn feed_value(mut self, value: ValueId, tensor: Tensor) -> Self {
        self.feeds.push((value, tensor));
        self
    }

    pub fn fetch<T>(self, operand: Operand<T>) -> Self {
        self.fetch_value(operand.value())
    }

    pub fn fetch_value(mut self, value: ValueId) -> Self {
        self.fetches.push(value);
        self
    }

    pub fn run(self) -> Result<Vec<Tensor>, SessionError> {
        self.session.run(self.feeds, &self.fetches)
    }
}
