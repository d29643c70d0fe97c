//! Frame throttling for the animation loop.
//!
//! The host calls [`FrameScheduler::tick`] on every presentation callback. A
//! tick is accepted only once a full frame interval has passed since the last
//! accepted one. The time left over past a whole interval is carried into the
//! next wait, so the long-run rate converges on the target instead of
//! drifting below it. The animation clock advances by a fixed step per
//! accepted tick and never looks at wall time.

use tracing::debug;

/// Animation clock increment per accepted tick.
pub const CLOCK_STEP: f32 = 0.016;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SchedulerState {
    /// Created, not started yet.
    Idle,
    /// Accepting ticks.
    Running,
    /// Torn down; ticks are ignored until restarted.
    Stopped,
}

/// Returned for an accepted tick: run the simulators and paint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCommand {
    /// Animation clock after this tick.
    pub clock: f32,
    /// Number of accepted ticks so far, including this one.
    pub frame: u64,
    /// Host timestamp the tick arrived with.
    pub timestamp_ms: f64,
}

pub struct FrameScheduler {
    interval_ms: f64,
    state: SchedulerState,
    last_accepted_ms: Option<f64>,
    clock: f32,
    frames: u64,
    skipped: u64,
}

impl FrameScheduler {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval_ms: 1000.0 / target_fps.max(1) as f64,
            state: SchedulerState::Idle,
            last_accepted_ms: None,
            clock: 0.0,
            frames: 0,
            skipped: 0,
        }
    }

    /// Begin accepting ticks. The first tick afterwards is always accepted.
    pub fn start(&mut self) {
        self.state = SchedulerState::Running;
        self.last_accepted_ms = None;
        debug!(interval_ms = self.interval_ms, "Frame scheduler started");
    }

    pub fn stop(&mut self) {
        if self.state == SchedulerState::Running {
            debug!(
                frames = self.frames,
                skipped = self.skipped,
                "Frame scheduler stopped"
            );
        }
        self.state = SchedulerState::Stopped;
    }

    /// Offer a presentation callback at `timestamp_ms`.
    pub fn tick(&mut self, timestamp_ms: f64) -> Option<RenderCommand> {
        if self.state != SchedulerState::Running {
            return None;
        }

        if let Some(last) = self.last_accepted_ms {
            let elapsed = timestamp_ms - last;
            if elapsed < self.interval_ms {
                self.skipped += 1;
                return None;
            }
            self.last_accepted_ms = Some(timestamp_ms - elapsed % self.interval_ms);
        } else {
            self.last_accepted_ms = Some(timestamp_ms);
        }

        self.clock += CLOCK_STEP;
        self.frames += 1;
        Some(RenderCommand {
            clock: self.clock,
            frame: self.frames,
            timestamp_ms,
        })
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Change the frame interval. Takes effect from the next tick; the clock
    /// and frame count carry on.
    pub fn set_interval_ms(&mut self, interval_ms: f64) {
        self.interval_ms = interval_ms.max(1.0);
        debug!(interval_ms = self.interval_ms, "Frame interval changed");
    }

    /// Accepted ticks.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Ticks dropped because they came too early.
    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(fps: u32) -> FrameScheduler {
        let mut s = FrameScheduler::new(fps);
        s.start();
        s
    }

    #[test]
    fn test_idle_and_stopped_ignore_ticks() {
        let mut s = FrameScheduler::new(30);
        assert_eq!(s.state, SchedulerState::Idle);
        assert!(s.tick(0.0).is_none());
        s.start();
        assert!(s.tick(0.0).is_some());
        s.stop();
        assert!(s.tick(1000.0).is_none());
        assert_eq!(s.state, SchedulerState::Stopped);
    }

    #[test]
    fn test_first_tick_after_start_is_accepted() {
        let mut s = running(30);
        let cmd = s.tick(12345.0).unwrap();
        assert_eq!(cmd.frame, 1);
        assert!((cmd.clock - CLOCK_STEP).abs() < 1e-6);
    }

    #[test]
    fn test_early_ticks_are_skipped() {
        let mut s = running(30);
        s.tick(0.0).unwrap();
        assert!(s.tick(10.0).is_none());
        assert!(s.tick(33.0).is_none());
        assert!(s.tick(33.4).is_some());
        assert_eq!(s.skipped_count(), 2);
    }

    #[test]
    fn test_remainder_is_carried() {
        let mut s = running(30);
        s.tick(0.0).unwrap();
        // 50ms late: 16.67ms of it counts towards the next frame.
        s.tick(50.0).unwrap();
        assert!(s.tick(60.0).is_none());
        assert!(s.tick(66.7).is_some());
    }

    #[test]
    fn test_clock_ignores_wall_delta() {
        let mut s = running(30);
        s.tick(0.0).unwrap();
        let cmd = s.tick(5000.0).unwrap();
        assert!((cmd.clock - 2.0 * CLOCK_STEP).abs() < 1e-6);
    }

    #[test]
    fn test_sixty_hz_display_halves_to_thirty() {
        let mut s = running(30);
        let step = 1000.0 / 60.0;
        let accepted = (0..600)
            .filter(|i| s.tick(*i as f64 * step).is_some())
            .count();
        // 10 seconds at 30 FPS.
        assert!((295..=301).contains(&accepted), "accepted {accepted}");
    }

    #[test]
    fn test_never_faster_than_target() {
        let mut s = running(30);
        let interval = s.interval_ms();
        let step = 0.5;
        let mut last: Option<f64> = None;
        let mut accepted = 0;
        for i in 0..20_000 {
            let ts = i as f64 * step;
            if s.tick(ts).is_some() {
                if let Some(prev) = last {
                    assert!(ts - prev >= interval - step, "gap {}", ts - prev);
                }
                last = Some(ts);
                accepted += 1;
            }
        }
        // 10 seconds of callbacks.
        assert!(accepted <= 10 * 30 + 1, "accepted {accepted}");
    }

    #[test]
    fn test_restart_accepts_immediately() {
        let mut s = running(30);
        s.tick(100.0).unwrap();
        s.stop();
        s.start();
        assert!(s.tick(101.0).is_some());
        assert_eq!(s.frame_count(), 2);
    }

    #[test]
    fn test_backwards_timestamp_is_skipped() {
        let mut s = running(24);
        s.tick(500.0).unwrap();
        assert!(s.tick(400.0).is_none());
    }

    #[test]
    fn test_interval_change_keeps_clock() {
        let mut s = running(30);
        s.tick(0.0).unwrap();
        s.set_interval_ms(1000.0 / 24.0);
        assert!(s.tick(35.0).is_none());
        let cmd = s.tick(42.0).unwrap();
        assert_eq!(cmd.frame, 2);
        assert!((cmd.clock - 2.0 * CLOCK_STEP).abs() < 1e-6);
    }
}
