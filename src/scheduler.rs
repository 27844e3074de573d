use crate::error::HallResult;
use crate::hall::Hall;
use crate::viewport::Viewport;
use std::time::{Duration, Instant};

/// Quiet period a resize must survive before it takes effect
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);
/// Longest step handed to the camera after a stall
pub const MAX_FRAME_DT: f64 = 0.1;

/// Coalesces bursts of resize requests into the last one
#[derive(Debug, Clone, Copy)]
pub struct ResizeDebouncer {
    pending: Option<(Viewport, Instant)>,
    window: Duration,
}

impl ResizeDebouncer {
    pub fn new(window: Duration) -> Self {
        ResizeDebouncer {
            pending: None,
            window,
        }
    }

    pub fn push(&mut self, viewport: Viewport, at: Instant) {
        self.pending = Some((viewport, at));
    }

    /// Returns the pending size once the window has passed without a newer one
    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        let (viewport, at) = self.pending?;
        if now.saturating_duration_since(at) >= self.window {
            self.pending = None;
            Some(viewport)
        } else {
            None
        }
    }
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}

/// Frames per second, recomputed once a second
#[derive(Debug, Clone, Copy)]
pub struct FpsCounter {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        FpsCounter {
            frames_since_last_update: 0,
            last_fps_calculation: now,
            fps: 0.0,
        }
    }

    pub fn record(&mut self, now: Instant) -> f64 {
        self.frames_since_last_update += 1;
        let duration = now.saturating_duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }
        self.fps
    }

    #[cfg(test)]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub dt: f64,
    pub fps: f64,
}

/// Anything that can present a finished frame
pub trait RenderSurface {
    fn submit(&mut self, hall: &Hall, stats: &FrameStats) -> HallResult<()>;
}

/// Paces frames and runs each one in order: hall tick, then render submission
#[derive(Debug)]
pub struct FrameScheduler {
    interval: Duration,
    last_frame: Option<Instant>,
    counter: FpsCounter,
    frame: u64,
}

impl FrameScheduler {
    pub fn new(interval: Duration, now: Instant) -> Self {
        FrameScheduler {
            interval,
            last_frame: None,
            counter: FpsCounter::new(now),
            frame: 0,
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left before the next frame is due
    pub fn time_until_next(&self, now: Instant) -> Duration {
        match self.last_frame {
            Some(last) => (last + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    pub fn run_frame<S: RenderSurface>(
        &mut self,
        hall: &mut Hall,
        surface: &mut S,
        now: Instant,
    ) -> HallResult<FrameStats> {
        let dt = match self.last_frame {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => self.interval.as_secs_f64(),
        }
        .min(MAX_FRAME_DT);
        self.last_frame = Some(now);

        hall.tick(dt, now);

        self.frame += 1;
        let stats = FrameStats {
            frame: self.frame,
            dt,
            fps: self.counter.record(now),
        };
        surface.submit(hall, &stats)?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SPAWN;
    use crate::config::HallConfig;
    use crate::input::InputEvent;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct RecordingSurface {
        frames: Vec<(FrameStats, f64)>,
    }

    impl RenderSurface for RecordingSurface {
        fn submit(&mut self, hall: &Hall, stats: &FrameStats) -> HallResult<()> {
            self.frames.push((*stats, hall.rig().position.z));
            Ok(())
        }
    }

    #[test]
    fn debouncer_keeps_only_the_last_size() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();
        debouncer.push(Viewport::new(80, 24), start);
        debouncer.push(Viewport::new(90, 30), start + Duration::from_millis(60));
        assert!(debouncer.poll(start + Duration::from_millis(120)).is_none());
        let applied = debouncer.poll(start + Duration::from_millis(160)).unwrap();
        assert_eq!(applied.cols, 90);
        assert!(debouncer.poll(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn fps_is_reported_after_a_second() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        for i in 1..30 {
            assert_eq!(counter.record(start + Duration::from_millis(i * 33)), 0.0);
        }
        let fps = counter.record(start + Duration::from_secs(1));
        assert_relative_eq!(fps, 30.0);
    }

    #[test]
    fn frame_renders_after_the_tick() {
        let start = Instant::now();
        let mut hall = Hall::new(HallConfig::desktop(), Viewport::new(120, 40));
        let mut scheduler = FrameScheduler::new(Duration::from_millis(33), start);
        let mut surface = RecordingSurface::default();

        hall.push_event(InputEvent::Key {
            name: "KeyW".to_string(),
            pressed: true,
        });
        let stats = scheduler.run_frame(&mut hall, &mut surface, start).unwrap();
        assert_eq!(stats.frame, 1);
        // the surface saw the camera after it moved
        assert!(surface.frames[0].1 < SPAWN.z);
    }

    #[test]
    fn dt_follows_wall_clock_with_a_cap() {
        let start = Instant::now();
        let mut hall = Hall::new(HallConfig::desktop(), Viewport::new(120, 40));
        let mut scheduler = FrameScheduler::new(Duration::from_millis(33), start);
        let mut surface = RecordingSurface::default();

        scheduler.run_frame(&mut hall, &mut surface, start).unwrap();
        let second = start + Duration::from_millis(50);
        let stats = scheduler.run_frame(&mut hall, &mut surface, second).unwrap();
        assert_relative_eq!(stats.dt, 0.05, epsilon = 1e-9);

        let stalled = second + Duration::from_secs(3);
        let stats = scheduler.run_frame(&mut hall, &mut surface, stalled).unwrap();
        assert_relative_eq!(stats.dt, MAX_FRAME_DT);
        assert_eq!(surface.frames.len(), 3);
    }

    #[test]
    fn next_frame_waits_for_interval() {
        let start = Instant::now();
        let mut hall = Hall::new(HallConfig::desktop(), Viewport::new(120, 40));
        let mut scheduler = FrameScheduler::new(Duration::from_millis(33), start);
        assert_eq!(scheduler.time_until_next(start), Duration::ZERO);
        scheduler
            .run_frame(&mut hall, &mut RecordingSurface::default(), start)
            .unwrap();
        assert_eq!(
            scheduler.time_until_next(start + Duration::from_millis(10)),
            Duration::from_millis(23)
        );
        assert_eq!(
            scheduler.time_until_next(start + Duration::from_millis(40)),
            Duration::ZERO
        );
    }
}
