//! Pointer-drag rotation with post-release momentum
//!
//! While the pointer is held, movement rotates the active object directly
//! and the last scaled delta is remembered as velocity. After release the
//! velocity keeps rotating the object, decaying geometrically each tick
//! until it is snapped to rest.

/// Rotation increment in radians
///
/// Horizontal pointer motion turns the object about its Y axis, vertical
/// motion about its X axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationDelta {
    /// Radians about the X axis
    pub x: f32,
    /// Radians about the Y axis
    pub y: f32,
}

impl RotationDelta {
    /// Add this increment to an Euler rotation `[x, y, z]`
    pub fn apply(&self, rotation: &mut [f32; 3]) {
        rotation[0] += self.x;
        rotation[1] += self.y;
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Derived drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    /// Released with velocity still above rest
    Coasting,
}

/// Drag and momentum controller
#[derive(Debug, Clone)]
pub struct DragMomentum {
    dragging: bool,
    last_x: f32,
    last_y: f32,
    /// Scaled pointer velocity (horizontal, vertical) in radians per tick
    velocity_x: f32,
    velocity_y: f32,
    sensitivity: f32,
    damping: f32,
    rest_threshold: f32,
}

impl DragMomentum {
    pub fn new(sensitivity: f32, damping: f32, rest_threshold: f32) -> Self {
        Self {
            dragging: false,
            last_x: 0.0,
            last_y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            sensitivity,
            damping,
            rest_threshold,
        }
    }

    pub fn phase(&self) -> DragPhase {
        if self.dragging {
            DragPhase::Dragging
        } else if self.velocity_x != 0.0 || self.velocity_y != 0.0 {
            DragPhase::Coasting
        } else {
            DragPhase::Idle
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Current velocity as (horizontal, vertical)
    pub fn velocity(&self) -> (f32, f32) {
        (self.velocity_x, self.velocity_y)
    }

    /// Start a drag at pointer position `(x, y)`; a non-finite position is ignored
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        self.dragging = true;
        self.last_x = x;
        self.last_y = y;
        self.velocity_x = 0.0;
        self.velocity_y = 0.0;
    }

    /// Track pointer motion; returns the rotation to apply while dragging
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<RotationDelta> {
        if !self.dragging {
            return None;
        }

        let velocity_x = (x - self.last_x) * self.sensitivity;
        let velocity_y = (y - self.last_y) * self.sensitivity;
        if !(velocity_x.is_finite() && velocity_y.is_finite()) {
            return None;
        }

        self.velocity_x = velocity_x;
        self.velocity_y = velocity_y;
        self.last_x = x;
        self.last_y = y;

        Some(RotationDelta {
            x: self.velocity_y,
            y: self.velocity_x,
        })
    }

    /// End the drag; the recorded velocity carries on
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Pointer left the 3D layer; same as releasing it
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// One tick of momentum
    ///
    /// Returns the increment to apply, then decays the velocity. Call only
    /// when there is an active object to receive it; with no receiver the
    /// velocity is held rather than decayed.
    pub fn coast(&mut self) -> Option<RotationDelta> {
        if self.dragging || self.phase() == DragPhase::Idle {
            return None;
        }

        let delta = RotationDelta {
            x: self.velocity_y,
            y: self.velocity_x,
        };

        self.velocity_x = self.decay(self.velocity_x);
        self.velocity_y = self.decay(self.velocity_y);

        Some(delta)
    }

    fn decay(&self, velocity: f32) -> f32 {
        let next = velocity * self.damping;
        if next.abs() < self.rest_threshold || !next.is_finite() {
            0.0
        } else {
            next
        }
    }
}

/// Number of coast ticks until a velocity of magnitude `v0` drops below `epsilon`
pub fn ticks_to_rest(v0: f32, damping: f32, epsilon: f32) -> u32 {
    let v0 = f64::from(v0.abs());
    let epsilon = f64::from(epsilon);
    if v0 < epsilon {
        return 0;
    }
    let ticks = ((epsilon / v0).ln() / f64::from(damping).ln()).ceil();
    ticks.max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> DragMomentum {
        DragMomentum::new(0.005, 0.93, 1e-6)
    }

    #[test]
    fn starts_idle() {
        let drag = controller();
        assert_eq!(drag.phase(), DragPhase::Idle);
        assert_eq!(drag.velocity(), (0.0, 0.0));
    }

    #[test]
    fn move_without_press_does_nothing() {
        let mut drag = controller();
        assert_eq!(drag.pointer_move(10.0, 10.0), None);
        assert_eq!(drag.phase(), DragPhase::Idle);
    }

    #[test]
    fn non_finite_pointer_positions_are_dropped() {
        let mut drag = controller();
        drag.pointer_down(f32::NAN, 0.0);
        assert!(!drag.is_dragging());

        drag.pointer_down(0.0, 0.0);
        drag.pointer_move(10.0, 0.0);
        assert_eq!(drag.pointer_move(f32::INFINITY, 0.0), None);
        assert_eq!(drag.pointer_move(0.0, f32::NAN), None);
        assert!((drag.velocity().0 - 0.05).abs() < 1e-6);

        // Tracking resumes from the last good position
        let delta = drag.pointer_move(20.0, 0.0).expect("dragging");
        assert!((delta.y - 0.05).abs() < 1e-6);
    }

    #[test]
    fn drag_rotates_by_scaled_delta() {
        let mut drag = controller();
        drag.pointer_down(100.0, 100.0);
        let delta = drag.pointer_move(120.0, 90.0).expect("dragging");

        // Horizontal motion turns about Y, vertical about X
        assert!((delta.y - 0.1).abs() < 1e-6);
        assert!((delta.x + 0.05).abs() < 1e-6);
        assert_eq!(drag.velocity(), (delta.y, delta.x));
    }

    #[test]
    fn pointer_down_resets_velocity() {
        let mut drag = controller();
        drag.pointer_down(0.0, 0.0);
        drag.pointer_move(50.0, 0.0);
        drag.pointer_up();
        assert_eq!(drag.phase(), DragPhase::Coasting);

        drag.pointer_down(5.0, 5.0);
        assert_eq!(drag.velocity(), (0.0, 0.0));
        assert_eq!(drag.phase(), DragPhase::Dragging);
    }

    #[test]
    fn no_momentum_while_dragging() {
        let mut drag = controller();
        drag.pointer_down(0.0, 0.0);
        drag.pointer_move(10.0, 0.0);
        assert_eq!(drag.coast(), None);
        // Velocity is recorded, not consumed
        assert!(drag.velocity().0 > 0.0);
    }

    #[test]
    fn release_keeps_velocity_and_coasts() {
        let mut drag = controller();
        drag.pointer_down(0.0, 0.0);
        drag.pointer_move(20.0, 0.0);
        drag.pointer_leave();

        let first = drag.coast().expect("coasting");
        assert!((first.y - 0.1).abs() < 1e-6);
        let second = drag.coast().expect("coasting");
        assert!((second.y - 0.1 * 0.93).abs() < 1e-6);
    }

    #[test]
    fn momentum_decays_strictly_then_rests() {
        let mut drag = controller();
        drag.pointer_down(0.0, 0.0);
        drag.pointer_move(40.0, -40.0);
        drag.pointer_up();

        let mut previous = f32::INFINITY;
        let mut ticks = 0;
        while let Some(delta) = drag.coast() {
            let magnitude = delta.y.abs();
            assert!(magnitude < previous);
            previous = magnitude;
            ticks += 1;
            assert!(ticks < 1000, "momentum never settled");
        }

        assert_eq!(drag.phase(), DragPhase::Idle);
        assert_eq!(drag.velocity(), (0.0, 0.0));
    }

    #[test]
    fn ticks_to_rest_matches_geometric_decay() {
        let v0 = 0.2_f32;
        let damping = 0.93_f32;
        let epsilon = 1e-3_f32;
        let n = ticks_to_rest(v0, damping, epsilon);

        let decayed = f64::from(v0) * f64::from(damping).powi(n as i32);
        assert!(decayed < f64::from(epsilon));
        let one_short = f64::from(v0) * f64::from(damping).powi(n as i32 - 1);
        assert!(one_short >= f64::from(epsilon));
    }

    #[test]
    fn ticks_to_rest_is_zero_below_epsilon() {
        assert_eq!(ticks_to_rest(1e-4, 0.93, 1e-3), 0);
        assert_eq!(ticks_to_rest(-1e-4, 0.93, 1e-3), 0);
    }

    #[test]
    fn rotation_delta_applies_to_euler_angles() {
        let mut rotation = [0.0, 1.0, 2.0];
        RotationDelta { x: 0.5, y: -0.25 }.apply(&mut rotation);
        assert_eq!(rotation, [0.5, 0.75, 2.0]);
    }
}
