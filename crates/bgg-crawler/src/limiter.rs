use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// Source of time for [`RateLimiter`].
pub trait Clock {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

/// Ensures at least `delay` elapses between the completions of successive
/// [`RateLimiter::wait`] calls.
///
/// It assumes a single caller issuing requests sequentially.
pub struct RateLimiter<C = SystemClock> {
    delay: Duration,
    jitter: Duration,
    last_call: Option<Instant>,
    clock: C,
}

impl<C> fmt::Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("delay", &self.delay)
            .field("jitter", &self.jitter)
            .field("last_call", &self.last_call)
            .finish()
    }
}

impl RateLimiter {
    pub fn new(delay_s: f32) -> Self {
        Self::with_clock(delay_s, 0.0, SystemClock)
    }
}

impl<C> RateLimiter<C>
where
    C: Clock,
{
    pub fn with_clock(delay_s: f32, jitter_s: f32, clock: C) -> Self {
        Self {
            delay: seconds(delay_s),
            jitter: seconds(jitter_s),
            last_call: None,
            clock,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Blocks until the configured delay has elapsed since the previous call.
    ///
    /// The first call never blocks. A zero delay makes this a no-op besides
    /// recording the call time.
    pub fn wait(&mut self) {
        if let Some(last_call) = self.last_call {
            let elapsed = self.clock.now().saturating_duration_since(last_call);
            if elapsed < self.delay {
                self.clock.sleep(self.delay - elapsed + self.jitter / 2);
            }
        }
        self.last_call = Some(self.clock.now());
    }
}

// Negative, NaN or overflowing values all mean "no delay"
fn seconds(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs.max(0.0)).unwrap_or(Duration::ZERO)
}
