//! Link monitor
//!
//! Turns decode outcomes into a user-facing link status: frames per second
//! while frames arrive, "no signal" after a run of empty polls.

use crate::config::LinkConfig;

/// Link status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Nothing decoded recently
    NoSignal,
    /// Frames arriving at `fps_x10 / 10` per second
    Receiving { fps_x10: u16 },
}

/// Tracks frame rate and idle polls
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    config: LinkConfig,
    status: LinkStatus,
    /// Start of the current FPS window, set by the first frame
    window_start_ms: Option<u64>,
    /// Frames counted in the current window
    window_frames: u32,
    /// Idle polls since the last frame
    idle_polls: u8,
}

impl LinkMonitor {
    /// Create a monitor; the link starts as [`LinkStatus::NoSignal`]
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            status: LinkStatus::NoSignal,
            window_start_ms: None,
            window_frames: 0,
            idle_polls: 0,
        }
    }

    /// Current status
    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// Record a decoded frame at `now_ms`
    ///
    /// Returns the new status when an FPS window closes and the reported
    /// value changes.
    pub fn record_frame(&mut self, now_ms: u64) -> Option<LinkStatus> {
        self.idle_polls = 0;

        // The opening frame only marks the window start
        let Some(start) = self.window_start_ms else {
            self.window_start_ms = Some(now_ms);
            self.window_frames = 0;
            return None;
        };
        self.window_frames = self.window_frames.saturating_add(1);

        let elapsed = now_ms.saturating_sub(start);
        if elapsed < u64::from(self.config.fps_window_ms) || elapsed == 0 {
            return None;
        }

        let fps_x10 = u64::from(self.window_frames) * 10_000 / elapsed;
        self.window_start_ms = Some(now_ms);
        self.window_frames = 0;

        self.set(LinkStatus::Receiving {
            fps_x10: fps_x10.min(u64::from(u16::MAX)) as u16,
        })
    }

    /// Record a poll that produced no frame
    ///
    /// Returns [`LinkStatus::NoSignal`] on the poll that crosses the
    /// threshold.
    pub fn record_idle(&mut self) -> Option<LinkStatus> {
        self.idle_polls = self.idle_polls.saturating_add(1);
        if self.idle_polls < self.config.no_signal_polls {
            return None;
        }

        // A frame after the outage opens a fresh window
        self.window_start_ms = None;
        self.window_frames = 0;
        self.set(LinkStatus::NoSignal)
    }

    fn set(&mut self, status: LinkStatus) -> Option<LinkStatus> {
        if status == self.status {
            return None;
        }
        self.status = status;
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> LinkMonitor {
        LinkMonitor::new(LinkConfig::default())
    }

    #[test]
    fn test_starts_without_signal() {
        assert_eq!(monitor().status(), LinkStatus::NoSignal);
    }

    #[test]
    fn test_fps_reported_when_window_closes() {
        let mut link = monitor();

        // 11 frames 100 ms apart, the first opens the window
        let mut changes = Vec::new();
        for i in 0..=10u64 {
            if let Some(status) = link.record_frame(i * 100) {
                changes.push(status);
            }
        }

        assert_eq!(changes, [LinkStatus::Receiving { fps_x10: 100 }]);
        assert_eq!(link.status(), LinkStatus::Receiving { fps_x10: 100 });
    }

    #[test]
    fn test_steady_rate_is_not_reported_twice() {
        let mut link = monitor();
        let mut changes = 0;
        for i in 0..=40u64 {
            if link.record_frame(i * 250).is_some() {
                changes += 1;
            }
        }
        // 4 frames per window from the first one on
        assert_eq!(changes, 1);
        assert_eq!(link.status(), LinkStatus::Receiving { fps_x10: 40 });
    }

    #[test]
    fn test_no_signal_after_threshold() {
        let mut link = monitor();
        for i in 0..=10u64 {
            link.record_frame(i * 100);
        }

        for _ in 0..4 {
            assert_eq!(link.record_idle(), None);
        }
        assert_eq!(link.record_idle(), Some(LinkStatus::NoSignal));
        // Already down, nothing new to report
        assert_eq!(link.record_idle(), None);
    }

    #[test]
    fn test_frame_resets_idle_run() {
        let mut link = monitor();
        for i in 0..=10u64 {
            link.record_frame(i * 100);
        }

        for _ in 0..4 {
            link.record_idle();
        }
        link.record_frame(1100);
        for _ in 0..4 {
            assert_eq!(link.record_idle(), None);
        }
        assert!(matches!(link.status(), LinkStatus::Receiving { .. }));
    }

    #[test]
    fn test_recovery_needs_a_full_window() {
        let mut link = monitor();
        for _ in 0..5 {
            link.record_idle();
        }
        assert_eq!(link.record_frame(10_000), None);
        assert_eq!(link.record_frame(10_500), None);
        assert_eq!(
            link.record_frame(11_000),
            Some(LinkStatus::Receiving { fps_x10: 20 })
        );
    }

    #[test]
    fn test_steady_rate_reported_once() {
        let mut link = monitor();
        let changes: Vec<_> = (0..=30u64)
            .filter_map(|i| link.record_frame(i * 100))
            .collect();
        assert_eq!(changes, [LinkStatus::Receiving { fps_x10: 100 }]);
    }

    #[test]
    fn test_window_after_outage_excludes_opening_frame() {
        let mut link = monitor();
        for i in 0..=10u64 {
            link.record_frame(i * 100);
        }
        for _ in 0..5 {
            link.record_idle();
        }
        assert_eq!(link.status(), LinkStatus::NoSignal);

        let changes: Vec<_> = (0..=10u64)
            .filter_map(|i| link.record_frame(5_000 + i * 200))
            .collect();
        // 5 frames after the opening one over 1000 ms
        assert_eq!(changes, [LinkStatus::Receiving { fps_x10: 50 }]);
    }
}
