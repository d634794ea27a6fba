//! Traversal construction and decoding of textual query results

pub mod builder;
pub mod property_block;
pub mod traversal;

pub use builder::TraversalBuilder;
pub use property_block::PropertyBlock;
pub use traversal::{Traversal, TraversalOp};
