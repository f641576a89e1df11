mod executor;
mod limiter;
mod policy;

pub use executor::RetryExecutor;
pub use limiter::RetryLimiter;
pub use policy::{RetryPolicy, JITTER_FACTOR};

#[cfg(test)]
mod tests;
