pub mod builder;
pub mod grouper;
pub mod partitioner;
pub mod prerequisites;
pub mod sequencer;

pub use builder::*;
pub use grouper::*;
pub use partitioner::*;
pub use prerequisites::*;
pub use sequencer::*;
