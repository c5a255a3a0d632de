pub mod analysis;
pub mod dim;
pub mod fixed_dim;
pub mod graph;
pub mod node;
pub mod op;
pub mod ops;
pub mod tensor;
pub mod value;
