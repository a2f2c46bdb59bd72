pub mod layout;
pub mod model;
pub mod trace;

pub use model::cpu::CpuModel;
pub use model::heap::HeapModel;
pub use model::{NodeId, ProfileShape};
pub use trace::{Trace, parse_auto};
