//! Per-frame coalescing of pointer moves.
//!
//! Browsers deliver pointer moves far more often than the screen refreshes.
//! The host queues every move here and calls `take` once per animation
//! frame; only the most recent move survives.

/// Holds at most one pending pointer position.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameThrottle {
    pending: Option<(f32, f32)>,
}

impl FrameThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a move. Returns `true` if a frame must be requested (nothing
    /// was pending yet).
    pub fn queue(&mut self, x: f32, y: f32) -> bool {
        let first = self.pending.is_none();
        self.pending = Some((x, y));
        first
    }

    /// Take the pending move for this frame, if any.
    pub fn take(&mut self) -> Option<(f32, f32)> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop a pending move without applying it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_coalesces_to_last_move() {
        let mut t = FrameThrottle::new();
        assert!(t.queue(1.0, 1.0));
        assert!(!t.queue(2.0, 2.0));
        assert!(!t.queue(3.0, 5.0));
        assert_eq!(t.take(), Some((3.0, 5.0)));
        assert_eq!(t.take(), None);
        assert!(t.queue(4.0, 4.0));
        t.cancel();
        assert!(!t.is_pending());
    }
}
