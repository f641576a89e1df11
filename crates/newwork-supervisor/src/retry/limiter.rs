use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Sliding-window cap on attempts. History is purged lazily on every query.
#[derive(Debug)]
pub struct RetryLimiter {
    max_attempts: usize,
    window: Duration,
    attempts: VecDeque<Instant>,
}

impl RetryLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: VecDeque::with_capacity(max_attempts),
        }
    }

    fn purge(&mut self, now: Instant) {
        while let Some(&oldest) = self.attempts.front() {
            if now.saturating_duration_since(oldest) > self.window {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn can_attempt(&mut self) -> bool {
        self.purge(Instant::now());
        self.attempts.len() < self.max_attempts
    }

    pub fn record_attempt(&mut self) {
        let now = Instant::now();
        self.purge(now);
        self.attempts.push_back(now);
    }

    /// Time until the oldest attempt leaves the window, or `None` when an
    /// attempt is allowed right now.
    pub fn wait_time(&mut self) -> Option<Duration> {
        let now = Instant::now();
        self.purge(now);

        if self.attempts.len() < self.max_attempts {
            return None;
        }

        self.attempts
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
    }

    pub fn attempts_in_window(&mut self) -> usize {
        self.purge(Instant::now());
        self.attempts.len()
    }

    pub fn reset(&mut self) {
        self.attempts.clear();
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
