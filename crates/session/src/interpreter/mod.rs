mod builder;
mod kernels;
mod session;

pub use builder::InterpreterSessionBuilder;
pub use session::InterpreterSession;
