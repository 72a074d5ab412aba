pub mod change_detector;
pub mod engine;
pub mod ledger;
pub mod memory;
pub mod reconciler;

pub use change_detector::*;
pub use engine::*;
pub use ledger::*;
pub use memory::*;
pub use reconciler::*;
