/// Frame clock and viewport sizes

/// Delta reported for the very first frame, in milliseconds
const FIRST_DELTA_MS: f64 = 16.0;

/// Timing of a single frame, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    pub elapsed: f32,
    pub delta: f32,
    /// Frames ticked before this one
    pub frame: u64,
}

/// Turns monotonic timestamps into elapsed/delta pairs.
///
/// The clock never reads a time source itself; callers pass `now_ms` from
/// whatever monotonic source their platform offers.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    start_ms: Option<f64>,
    current_ms: f64,
    frame: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now_ms: f64) -> FrameTime {
        let (start, delta) = match self.start_ms {
            None => {
                self.start_ms = Some(now_ms);
                (now_ms, FIRST_DELTA_MS)
            }
            // A clock that steps backwards yields a zero delta, never negative
            Some(start) => (start, (now_ms - self.current_ms).max(0.0)),
        };
        self.current_ms = now_ms.max(self.current_ms);

        let time = FrameTime {
            elapsed: ((self.current_ms - start) / 1000.0) as f32,
            delta: (delta / 1000.0) as f32,
            frame: self.frame,
        };
        self.frame += 1;
        time
    }
}

/// Viewport dimensions in CSS pixels (or terminal cells)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizes {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Sizes {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.width = width;
        self.height = height;
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    /// Size of the drawing buffer in device pixels
    pub fn drawing_buffer(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }
}

// High-DPI screens beyond 2x cost fill rate for little visible gain
fn clamp_pixel_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(2.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_uses_default_delta() {
        let mut clock = Clock::new();
        let t = clock.tick(5_000.0);
        assert_eq!(t.elapsed, 0.0);
        assert!((t.delta - 0.016).abs() < 1e-6);
        assert_eq!(t.frame, 0);
    }

    #[test]
    fn test_elapsed_and_delta() {
        let mut clock = Clock::new();
        clock.tick(1_000.0);
        clock.tick(1_020.0);
        let t = clock.tick(1_500.0);
        assert!((t.elapsed - 0.5).abs() < 1e-6);
        assert!((t.delta - 0.48).abs() < 1e-6);
        assert_eq!(t.frame, 2);
    }

    #[test]
    fn test_backwards_time_is_ignored() {
        let mut clock = Clock::new();
        clock.tick(100.0);
        clock.tick(200.0);
        let t = clock.tick(150.0);
        assert_eq!(t.delta, 0.0);
        assert!((t.elapsed - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_ratio_clamped() {
        let mut sizes = Sizes::new(800, 600, 3.0);
        assert_eq!(sizes.pixel_ratio, 2.0);
        assert_eq!(sizes.drawing_buffer(), (1600, 1200));
        sizes.resize(400, 0, f32::NAN);
        assert_eq!(sizes.pixel_ratio, 1.0);
        assert_eq!(sizes.aspect(), 400.0);
    }
}
