mod hooks;
mod orchestrator;
mod phase;

pub use hooks::{NoopHooks, NoopRefresher, ProviderRefresher, RestartHooks, TracingHooks};
pub use orchestrator::RestartOrchestrator;
pub use phase::{PhaseMachine, RunTicket};
