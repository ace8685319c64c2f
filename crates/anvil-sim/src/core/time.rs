/// Caps the frame rate of a host loop that may call faster than wanted.
/// Ticks arriving before `interval_ms` has passed since the last admitted
/// frame are rejected.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    interval_ms: f64,
    last: Option<f64>,
}

impl FrameLimiter {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last: None,
        }
    }

    /// Returns `true` and records `now_ms` if a frame may run.
    pub fn admit(&mut self, now_ms: f64) -> bool {
        match self.last {
            Some(last) if now_ms - last < self.interval_ms => false,
            _ => {
                self.last = Some(now_ms);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_admitted() {
        let mut limiter = FrameLimiter::new(1000.0 / 60.0);
        assert!(limiter.admit(0.0));
    }

    #[test]
    fn rejects_ticks_inside_interval() {
        let mut limiter = FrameLimiter::new(1000.0 / 60.0);
        assert!(limiter.admit(100.0));
        assert!(!limiter.admit(105.0));
        assert!(!limiter.admit(116.0));
        assert!(limiter.admit(116.7));
    }

    #[test]
    fn rejected_ticks_do_not_move_the_window() {
        let mut limiter = FrameLimiter::new(10.0);
        assert!(limiter.admit(0.0));
        assert!(!limiter.admit(9.0));
        assert!(limiter.admit(10.0));
    }
}
