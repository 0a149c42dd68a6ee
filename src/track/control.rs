//! Step-wise pan/tilt tracking controller.
//!
//! The controller holds the rig's commanded angles and decides, once per
//! frame, whether to nudge them toward the tracked face. Control is
//! deliberately simple: fixed-degree steps, a deadzone around the frame
//! center, saturating clamps at the mechanical limits, and a wall-clock rate
//! gate so servo traffic is bounded regardless of frame rate. No velocity
//! control, no smoothing, no prediction.

use std::time::{Duration, Instant};

use crate::detect::result::BoundingBox;
use crate::frame::FrameGeometry;

/// Per-axis servo configuration, in degrees.
#[derive(Clone, Copy, Debug)]
pub struct AxisConfig {
    /// Rest angle; the controller starts here.
    pub center: i32,
    /// Lower mechanical limit.
    pub min: i32,
    /// Upper mechanical limit.
    pub max: i32,
    /// Degrees moved per qualifying update.
    pub step: i32,
    /// Reverse the movement direction to match the physical mounting.
    pub invert: bool,
}

/// Mutable controller state, persists across iterations.
///
/// Invariant: each angle stays within its axis limits at all times,
/// including the initial value.
#[derive(Clone, Copy, Debug)]
pub struct ControllerState {
    pub pan_angle: i32,
    pub tilt_angle: i32,
    last_update: Option<Instant>,
}

/// One servo command. An absent axis means "leave that axis unchanged";
/// it is omitted from the outbound request rather than resent at its old
/// value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub pan: Option<i32>,
    pub tilt: Option<i32>,
}

impl ActuatorCommand {
    pub fn is_empty(&self) -> bool {
        self.pan.is_none() && self.tilt.is_none()
    }
}

pub struct TrackingController {
    pan: AxisConfig,
    tilt: AxisConfig,
    deadzone_fraction: f32,
    update_interval: Duration,
    state: ControllerState,
}

impl TrackingController {
    pub fn new(
        pan: AxisConfig,
        tilt: AxisConfig,
        deadzone_fraction: f32,
        update_interval: Duration,
    ) -> Self {
        let state = ControllerState {
            pan_angle: pan.center.clamp(pan.min, pan.max),
            tilt_angle: tilt.center.clamp(tilt.min, tilt.max),
            last_update: None,
        };
        Self {
            pan,
            tilt,
            deadzone_fraction,
            update_interval,
            state,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Run one control iteration.
    ///
    /// Returns a command only when the rate gate passes and at least one axis
    /// steps. With no target, or while gated, state and timer are untouched.
    /// When the gate passes but both axes sit inside the deadzone, nothing is
    /// sent and the timer still advances, so the next command is a full
    /// interval away. (The original rig firmware received an empty request in
    /// that case; suppressing it only reduces actuator traffic.)
    pub fn update(
        &mut self,
        target: Option<&BoundingBox>,
        frame: FrameGeometry,
        now: Instant,
    ) -> Option<ActuatorCommand> {
        let target = target?;

        if let Some(last) = self.state.last_update {
            if now.duration_since(last) <= self.update_interval {
                return None;
            }
        }

        let (fx, fy) = target.center();
        let (cx, cy) = frame.center();
        let error_x = fx - cx;
        let error_y = fy - cy;
        let deadzone_x = frame.width as f32 * self.deadzone_fraction;
        let deadzone_y = frame.height as f32 * self.deadzone_fraction;

        let command = ActuatorCommand {
            pan: step_axis(&mut self.state.pan_angle, &self.pan, error_x, deadzone_x),
            tilt: step_axis(&mut self.state.tilt_angle, &self.tilt, error_y, deadzone_y),
        };
        self.state.last_update = Some(now);

        if command.is_empty() {
            None
        } else {
            Some(command)
        }
    }
}

/// Step one axis toward the target. Returns the commanded angle when the
/// error escapes the deadzone, `None` otherwise. Clamping saturates: at a
/// limit the angle stays pinned and keeps being commanded at the limit.
fn step_axis(angle: &mut i32, axis: &AxisConfig, error: i32, deadzone: f32) -> Option<i32> {
    if (error.abs() as f32) <= deadzone {
        return None;
    }
    let mut direction = if error > 0 { 1 } else { -1 };
    if axis.invert {
        direction = -direction;
    }
    *angle = angle
        .saturating_add(direction * axis.step)
        .clamp(axis.min, axis.max);
    Some(*angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: FrameGeometry = FrameGeometry {
        width: 320,
        height: 240,
    };

    fn pan_axis() -> AxisConfig {
        AxisConfig {
            center: 90,
            min: 30,
            max: 150,
            step: 2,
            invert: false,
        }
    }

    fn tilt_axis() -> AxisConfig {
        AxisConfig {
            center: 90,
            min: 45,
            max: 135,
            step: 2,
            invert: false,
        }
    }

    fn controller() -> TrackingController {
        TrackingController::new(
            pan_axis(),
            tilt_axis(),
            0.07,
            Duration::from_millis(300),
        )
    }

    /// A face well to the right of center, vertically centered.
    fn face_right() -> BoundingBox {
        BoundingBox::new(260, 100, 40, 40)
    }

    /// A face dead-center in a 320x240 frame.
    fn face_centered() -> BoundingBox {
        BoundingBox::new(140, 100, 40, 40)
    }

    #[test]
    fn no_target_leaves_state_untouched() {
        let mut ctl = controller();
        let now = Instant::now();
        assert_eq!(ctl.update(None, FRAME, now), None);
        assert_eq!(ctl.state().pan_angle, 90);
        assert_eq!(ctl.state().tilt_angle, 90);
        // Timer untouched: an immediate follow-up with a target still passes
        // the gate.
        assert!(ctl.update(Some(&face_right()), FRAME, now).is_some());
    }

    #[test]
    fn first_update_steps_toward_target() {
        let mut ctl = controller();
        let cmd = ctl
            .update(Some(&face_right()), FRAME, Instant::now())
            .expect("ungated update with off-center target must command");
        assert_eq!(cmd.pan, Some(92));
        assert_eq!(cmd.tilt, None);
        assert_eq!(ctl.state().pan_angle, 92);
    }

    #[test]
    fn centered_face_moves_nothing_but_advances_timer() {
        let mut ctl = controller();
        let t0 = Instant::now();
        // deadzone_x = 22.4px, deadzone_y = 16.8px; zero error is inside both.
        assert_eq!(ctl.update(Some(&face_centered()), FRAME, t0), None);
        assert_eq!(ctl.state().pan_angle, 90);
        assert_eq!(ctl.state().tilt_angle, 90);
        // The timer advanced: an off-center face within the interval is gated.
        let t1 = t0 + Duration::from_millis(100);
        assert_eq!(ctl.update(Some(&face_right()), FRAME, t1), None);
        assert_eq!(ctl.state().pan_angle, 90);
    }

    #[test]
    fn error_inside_deadzone_never_moves_axis() {
        let mut ctl = controller();
        // Face center at (182,120): error_x = 22 <= 22.4.
        let near = BoundingBox::new(162, 100, 40, 40);
        let mut now = Instant::now();
        for _ in 0..10 {
            ctl.update(Some(&near), FRAME, now);
            assert_eq!(ctl.state().pan_angle, 90);
            now += Duration::from_secs(1);
        }
    }

    #[test]
    fn rate_gate_blocks_within_interval() {
        let mut ctl = controller();
        let t0 = Instant::now();
        assert!(ctl.update(Some(&face_right()), FRAME, t0).is_some());
        // Strictly inside the interval, and exactly at it: both gated.
        assert_eq!(
            ctl.update(Some(&face_right()), FRAME, t0 + Duration::from_millis(299)),
            None
        );
        assert_eq!(
            ctl.update(Some(&face_right()), FRAME, t0 + Duration::from_millis(300)),
            None
        );
        assert_eq!(ctl.state().pan_angle, 92);
        // Past the interval the next step goes through.
        let cmd = ctl
            .update(Some(&face_right()), FRAME, t0 + Duration::from_millis(301))
            .unwrap();
        assert_eq!(cmd.pan, Some(94));
    }

    #[test]
    fn constant_error_steps_monotonically_then_pins() {
        let mut ctl = controller();
        let mut now = Instant::now();
        let face = face_right();
        for i in 1..=30 {
            let cmd = ctl.update(Some(&face), FRAME, now).unwrap();
            assert_eq!(cmd.pan, Some(90 + 2 * i));
            now += Duration::from_secs(1);
        }
        assert_eq!(ctl.state().pan_angle, 150);
        // Pinned at the limit: still commanded, never past it.
        let cmd = ctl.update(Some(&face), FRAME, now).unwrap();
        assert_eq!(cmd.pan, Some(150));
        assert_eq!(ctl.state().pan_angle, 150);
    }

    #[test]
    fn invert_reverses_direction_and_clamps_at_min() {
        let mut pan = pan_axis();
        pan.invert = true;
        let mut ctl =
            TrackingController::new(pan, tilt_axis(), 0.07, Duration::from_millis(300));
        let mut now = Instant::now();
        let face = face_right();

        let cmd = ctl.update(Some(&face), FRAME, now).unwrap();
        assert_eq!(cmd.pan, Some(88));

        for _ in 0..40 {
            now += Duration::from_secs(1);
            ctl.update(Some(&face), FRAME, now);
        }
        assert_eq!(ctl.state().pan_angle, 30);
    }

    #[test]
    fn face_below_center_raises_tilt() {
        let mut ctl = controller();
        // Face center at (160, 200): error_y = 80 > 16.8.
        let low = BoundingBox::new(140, 180, 40, 40);
        let cmd = ctl.update(Some(&low), FRAME, Instant::now()).unwrap();
        assert_eq!(cmd.pan, None);
        assert_eq!(cmd.tilt, Some(92));
    }

    #[test]
    fn angles_never_escape_limits() {
        let mut ctl = controller();
        let mut now = Instant::now();
        // Alternate extreme targets in all four corners for many iterations.
        let corners = [
            BoundingBox::new(0, 0, 10, 10),
            BoundingBox::new(310, 0, 10, 10),
            BoundingBox::new(0, 230, 10, 10),
            BoundingBox::new(310, 230, 10, 10),
        ];
        for i in 0..500 {
            ctl.update(Some(&corners[i % 4]), FRAME, now);
            let state = ctl.state();
            assert!((30..=150).contains(&state.pan_angle));
            assert!((45..=135).contains(&state.tilt_angle));
            now += Duration::from_millis(173);
        }
    }

    #[test]
    fn off_center_start_is_clamped_into_limits() {
        let mut pan = pan_axis();
        pan.center = 90;
        pan.min = 100;
        pan.max = 140;
        let ctl = TrackingController::new(pan, tilt_axis(), 0.07, Duration::from_millis(300));
        assert_eq!(ctl.state().pan_angle, 100);
    }
}
