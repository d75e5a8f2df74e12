//! Zoom easing for the orthographic camera
//!
//! Input handlers only move the zoom *target*. Once per tick the current
//! zoom covers a fixed fraction of the remaining distance, so it approaches
//! the target asymptotically and never overshoots. The target is held
//! inside `[min, max]` so repeated steps can neither overflow nor sink into
//! values a single step can no longer move.

/// Default zoom bounds
pub const DEFAULT_MIN_ZOOM: f32 = 0.1;
pub const DEFAULT_MAX_ZOOM: f32 = 10.0;

/// Direction of a discrete zoom request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: scrolling up (`delta_y < 0`) zooms in
    ///
    /// Only the sign matters; a zero delta requests nothing.
    pub fn from_wheel(delta_y: f32) -> Option<Self> {
        if delta_y < 0.0 {
            Some(Self::In)
        } else if delta_y > 0.0 {
            Some(Self::Out)
        } else {
            None
        }
    }
}

/// Eased zoom value
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomEasing {
    current: f32,
    target: f32,
    /// Multiplier per zoom-in step (zoom-out uses its reciprocal)
    step_factor: f32,
    /// Fraction of the remaining distance covered per tick
    easing: f32,
    min: f32,
    max: f32,
}

impl ZoomEasing {
    /// Create a controller resting at `start` with the default bounds
    pub fn new(start: f32, step_factor: f32, easing: f32) -> Self {
        Self {
            current: start,
            target: start,
            step_factor,
            easing,
            min: DEFAULT_MIN_ZOOM,
            max: DEFAULT_MAX_ZOOM,
        }
        .with_bounds(DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM)
    }

    /// Restrict the target to `[min, max]`, pulling the resting value in
    pub fn with_bounds(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self.target = self.clamp(self.target);
        self.current = self.clamp(self.current);
        self
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Scale the target by one step in `direction`
    pub fn request_step(&mut self, direction: ZoomDirection) {
        let target = match direction {
            ZoomDirection::In => self.target * self.step_factor,
            ZoomDirection::Out => self.target / self.step_factor,
        };
        self.target = self.clamp(target);
    }

    /// Advance one tick; returns true if the current zoom moved
    pub fn tick(&mut self) -> bool {
        let before = self.current;
        self.current += (self.target - self.current) * self.easing;
        self.current != before
    }
}
