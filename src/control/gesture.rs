//! Gesture mapper — turns vertical pointer drags on a control into
//! parameter deltas.
//!
//! Dragging up increases the value. The mapper only reports how far the
//! pointer moved in parameter units; the parameter store does the clamping.

use crate::params::ParamId;

use super::layout::{Control, hit_test};

/// Value change per pixel of vertical drag, before the parameter's own scale.
pub const DEFAULT_SENSITIVITY: f64 = 0.005;

/// Pointer must land strictly closer than this to a control's center.
pub const DEFAULT_HIT_RADIUS: f64 = 30.0;

/// A bounded change requested by a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDelta {
    pub param: ParamId,
    /// Raw drag delta: `(last_y - y) * sensitivity`.
    pub delta: f64,
}

impl ParamDelta {
    /// Delta in the parameter's units (drag delta × the parameter's drag scale).
    pub fn scaled(&self) -> f64 {
        self.delta * self.param.spec().drag_scale.unwrap_or(1.0)
    }
}

/// Tracks the active (dragged) and hovered controls.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureMapper {
    sensitivity: f64,
    hit_radius: f64,
    active: Option<ParamId>,
    last_y: f64,
    hovered: Option<ParamId>,
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY, DEFAULT_HIT_RADIUS)
    }
}

impl GestureMapper {
    pub fn new(sensitivity: f64, hit_radius: f64) -> Self {
        GestureMapper {
            sensitivity,
            hit_radius,
            active: None,
            last_y: 0.0,
            hovered: None,
        }
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn hit_radius(&self) -> f64 {
        self.hit_radius
    }

    /// Control being dragged, if any.
    pub fn active(&self) -> Option<ParamId> {
        self.active
    }

    /// Control under the pointer, if any.
    pub fn hovered(&self) -> Option<ParamId> {
        self.hovered
    }

    /// Grab the control under the pointer. Returns it, or `None` if the
    /// press missed every control.
    pub fn pointer_down(&mut self, controls: &[Control], x: f64, y: f64) -> Option<ParamId> {
        let hit = hit_test(controls, x, y, self.hit_radius).map(|c| c.param);
        if hit.is_some() {
            self.active = hit;
            self.last_y = y;
        }
        hit
    }

    /// Update hover and, while a control is held, report the drag since
    /// the previous event.
    pub fn pointer_move(&mut self, controls: &[Control], x: f64, y: f64) -> Option<ParamDelta> {
        self.hovered = hit_test(controls, x, y, self.hit_radius).map(|c| c.param);

        let param = self.active?;
        let delta = (self.last_y - y) * self.sensitivity;
        self.last_y = y;
        Some(ParamDelta { param, delta })
    }

    pub fn pointer_up(&mut self) {
        self.active = None;
    }

    /// The pointer left the surface: release and clear hover.
    pub fn pointer_leave(&mut self) {
        self.active = None;
        self.hovered = None;
    }
}
