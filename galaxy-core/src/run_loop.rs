//! Explicit frame loop with a stop flag
//!
//! The stop flag is checked at the top of every iteration; once set, no
//! further frame is produced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::time::{Clock, FrameTime};

/// Cloneable handle that ends a [`RunLoop`]
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Paces frames for [`RunLoop::run`]
pub trait Scheduler {
    /// Monotonic milliseconds
    fn now_ms(&self) -> f64;
    /// Block until the next frame is due; `frame_start_ms` is when the
    /// previous frame began
    fn wait_for_next_frame(&mut self, frame_start_ms: f64);
}

#[derive(Debug, Default)]
pub struct RunLoop {
    clock: Clock,
    stop: StopHandle,
}

impl RunLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Produce the next frame, or `None` once stopped.
    ///
    /// Callback-driven hosts (animation frames) call this once per callback
    /// and stop rescheduling when it returns `None`.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameTime> {
        if self.stop.is_stopped() {
            return None;
        }
        Some(self.clock.tick(now_ms))
    }

    /// Drive `tick` until stopped or until it fails. Returns the number of
    /// frames run.
    pub fn run<S, F, E>(&mut self, scheduler: &mut S, mut tick: F) -> Result<u64, E>
    where
        S: Scheduler + ?Sized,
        F: FnMut(FrameTime) -> Result<(), E>,
    {
        let mut frames = 0;
        loop {
            let start = scheduler.now_ms();
            let Some(time) = self.frame(start) else {
                break;
            };
            tick(time)?;
            frames += 1;
            scheduler.wait_for_next_frame(start);
        }
        tracing::debug!(frames, "run loop stopped");
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Advances a fake clock by a fixed step per frame
    struct FakeScheduler {
        now: f64,
        step: f64,
        waits: usize,
    }

    impl Scheduler for FakeScheduler {
        fn now_ms(&self) -> f64 {
            self.now
        }

        fn wait_for_next_frame(&mut self, _frame_start_ms: f64) {
            self.now += self.step;
            self.waits += 1;
        }
    }

    #[test]
    fn test_runs_until_stopped() {
        let mut run_loop = RunLoop::new();
        let stop = run_loop.stop_handle();
        let mut scheduler = FakeScheduler { now: 0.0, step: 20.0, waits: 0 };
        let mut times = Vec::new();

        let frames = run_loop
            .run(&mut scheduler, |time| {
                times.push(time);
                if time.frame == 4 {
                    stop.stop();
                }
                Ok::<_, ()>(())
            })
            .unwrap();

        assert_eq!(frames, 5);
        assert_eq!(scheduler.waits, 5);
        assert!((times[4].elapsed - 0.08).abs() < 1e-6);
        assert!((times[3].delta - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_stopped_before_start_runs_nothing() {
        let mut run_loop = RunLoop::new();
        run_loop.stop_handle().stop();
        let mut scheduler = FakeScheduler { now: 0.0, step: 16.0, waits: 0 };
        let frames = run_loop
            .run(&mut scheduler, |_| -> Result<(), ()> { panic!("tick after stop") })
            .unwrap();
        assert_eq!(frames, 0);
        assert!(run_loop.frame(100.0).is_none());
    }

    #[test]
    fn test_tick_error_ends_loop() {
        let mut run_loop = RunLoop::new();
        let mut scheduler = FakeScheduler { now: 0.0, step: 16.0, waits: 0 };
        let result = run_loop.run(&mut scheduler, |time| {
            if time.frame == 2 {
                Err("boom")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("boom"));
    }
}
