mod cancellation;
mod core;
mod stats;
mod types;

pub use cancellation::{stop_signal, StopListener, StopSignal};
pub use core::ProcessSupervisor;
pub use stats::SupervisorStats;
pub use types::*;
