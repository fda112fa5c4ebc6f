use tokio::time::Instant;

/// A monotonic simulation clock, in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Seconds elapsed since the clock was created, measured on the tokio timer. When tokio time is
/// paused (as in tests) the clock only advances with the runtime's virtual time, which makes
/// packet and frame timestamps reproducible.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    origin: Instant,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
