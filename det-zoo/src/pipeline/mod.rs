//! Assembly and execution of batch operator sequences.

mod batch;
mod composer;
mod defaults;

pub use batch::*;
pub use composer::*;
pub use defaults::*;
