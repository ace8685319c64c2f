/// Interaction status shown in the banner at the top of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    ReadyToSwing,
    Dragging,
    Released,
    FrozenPointerLeft,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Ready => "Hammer Ready",
            Status::ReadyToSwing => "Hammer Ready - Drag to Swing",
            Status::Dragging => "Dragging Hammer",
            Status::Released => "Hammer Released",
            Status::FrozenPointerLeft => "Hammer Frozen (Mouse Left)",
        }
    }
}

/// Holds the latest status and falls back to [`Status::Ready`] once it goes stale.
#[derive(Debug, Clone)]
pub struct StatusBanner {
    status: Status,
    changed_at: Option<f64>,
    revert_ms: f64,
}

impl StatusBanner {
    pub fn new(revert_ms: f64) -> Self {
        Self {
            status: Status::Ready,
            changed_at: None,
            revert_ms,
        }
    }

    pub fn set(&mut self, status: Status, now_ms: f64) {
        self.status = status;
        self.changed_at = Some(now_ms);
    }

    pub fn current(&self, now_ms: f64) -> Status {
        match self.changed_at {
            Some(at) if now_ms - at >= self.revert_ms => Status::Ready,
            _ => self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_ready() {
        let banner = StatusBanner::new(2000.0);
        assert_eq!(banner.current(0.0), Status::Ready);
        assert_eq!(banner.current(1e9), Status::Ready);
    }

    #[test]
    fn reverts_two_seconds_after_last_change() {
        let mut banner = StatusBanner::new(2000.0);
        banner.set(Status::Dragging, 1000.0);
        assert_eq!(banner.current(2999.0), Status::Dragging);
        banner.set(Status::Released, 2500.0);
        assert_eq!(banner.current(3100.0), Status::Released);
        assert_eq!(banner.current(4499.0), Status::Released);
        assert_eq!(banner.current(4500.0), Status::Ready);
    }

    #[test]
    fn labels() {
        assert_eq!(Status::FrozenPointerLeft.label(), "Hammer Frozen (Mouse Left)");
        assert_eq!(Status::ReadyToSwing.label(), "Hammer Ready - Drag to Swing");
    }
}
