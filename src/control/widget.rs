//! Widgets — knob and slider drawing as a list of canvas commands.
//!
//! The core does not own a canvas. [`render_panel`] returns draw commands
//! that a host replays on a 2D context in order.

use std::f64::consts::PI;

use serde::Serialize;

use crate::params::{ParamId, ParameterSet};

use super::layout::{Control, ControlKind};

pub const KNOB_RADIUS: f64 = 30.0;
/// Knob sweep, clockwise from lower left to lower right.
pub const KNOB_START_ANGLE: f64 = PI * 0.75;
pub const KNOB_END_ANGLE: f64 = PI * 2.25;

pub const SLIDER_WIDTH: f64 = 20.0;
pub const SLIDER_HEIGHT: f64 = 100.0;

const TRACK_COLOR: &str = "#4A5568";
const VALUE_COLOR: &str = "#60A5FA";
const TEXT_COLOR: &str = "#FFFFFF";
const SLIDER_TRACK_COLOR: &str = "#333";
const TOOLTIP_BACKGROUND: &str = "rgba(0, 0, 0, 0.8)";
const LABEL_FONT: &str = "16px Arial";
const VALUE_FONT: &str = "14px Arial";

/// One 2D canvas operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DrawCommand {
    Clear {
        width: f64,
        height: f64,
    },
    /// Stroked circle.
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: &'static str,
        line_width: f64,
    },
    /// Stroked arc, angles in radians.
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        color: &'static str,
        line_width: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: &'static str,
        line_width: f64,
    },
    /// Filled rectangle.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: &'static str,
    },
    /// Centered text.
    Text {
        x: f64,
        y: f64,
        text: String,
        font: &'static str,
        color: &'static str,
    },
}

/// `value` (in [0, 1]) as a whole percentage.
pub fn percent(value: f64) -> String {
    format!("{}%", (value * 100.0).round() as i64)
}

/// Angle of the knob indicator for a normalized value.
pub fn knob_angle(value: f64) -> f64 {
    KNOB_START_ANGLE + (KNOB_END_ANGLE - KNOB_START_ANGLE) * value.clamp(0.0, 1.0)
}

/// Draw a knob centered on `(x, y)` showing normalized `value`.
pub fn render_knob(x: f64, y: f64, value: f64, label: &str) -> Vec<DrawCommand> {
    let angle = knob_angle(value);
    vec![
        DrawCommand::Circle {
            x,
            y,
            radius: KNOB_RADIUS,
            color: TRACK_COLOR,
            line_width: 3.0,
        },
        DrawCommand::Arc {
            x,
            y,
            radius: KNOB_RADIUS - 5.0,
            start_angle: KNOB_START_ANGLE,
            end_angle: angle,
            color: VALUE_COLOR,
            line_width: 5.0,
        },
        DrawCommand::Line {
            x1: x,
            y1: y,
            x2: x + angle.cos() * KNOB_RADIUS * 0.8,
            y2: y + angle.sin() * KNOB_RADIUS * 0.8,
            color: TEXT_COLOR,
            line_width: 2.0,
        },
        DrawCommand::Text {
            x,
            y: y + KNOB_RADIUS + 15.0,
            text: label.to_string(),
            font: LABEL_FONT,
            color: TEXT_COLOR,
        },
        DrawCommand::Text {
            x,
            y: y + KNOB_RADIUS + 40.0,
            text: percent(value),
            font: VALUE_FONT,
            color: TEXT_COLOR,
        },
    ]
}

/// Draw a vertical slider centered on `(x, y)` showing normalized `value`.
pub fn render_slider(x: f64, y: f64, value: f64, label: &str) -> Vec<DrawCommand> {
    let value = value.clamp(0.0, 1.0);
    let top = y - SLIDER_HEIGHT / 2.0;
    let handle_y = top + SLIDER_HEIGHT * (1.0 - value);
    vec![
        DrawCommand::Text {
            x,
            y: top - 15.0,
            text: percent(value),
            font: VALUE_FONT,
            color: TEXT_COLOR,
        },
        DrawCommand::Rect {
            x: x - SLIDER_WIDTH / 2.0,
            y: top,
            width: SLIDER_WIDTH,
            height: SLIDER_HEIGHT,
            color: SLIDER_TRACK_COLOR,
        },
        DrawCommand::Rect {
            x: x - SLIDER_WIDTH / 2.0,
            y: handle_y - 2.0,
            width: SLIDER_WIDTH,
            height: 4.0,
            color: TEXT_COLOR,
        },
        DrawCommand::Text {
            x,
            y: y + SLIDER_HEIGHT / 2.0 + 15.0,
            text: label.to_string(),
            font: LABEL_FONT,
            color: TEXT_COLOR,
        },
    ]
}

/// Help bar along the bottom edge of a `width` × `height` viewport.
pub fn render_tooltip(width: f64, height: f64, text: &str) -> Vec<DrawCommand> {
    vec![
        DrawCommand::Rect {
            x: 10.0,
            y: height - 40.0,
            width: width - 20.0,
            height: 30.0,
            color: TOOLTIP_BACKGROUND,
        },
        DrawCommand::Text {
            x: width / 2.0,
            y: height - 20.0,
            text: text.to_string(),
            font: LABEL_FONT,
            color: TEXT_COLOR,
        },
    ]
}

/// Full frame: clear, every control at its current value, then the
/// tooltip of the hovered control.
pub fn render_panel(
    controls: &[Control],
    params: &ParameterSet,
    hovered: Option<ParamId>,
    width: f64,
    height: f64,
) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::Clear { width, height }];
    for control in controls {
        let spec = control.param.spec();
        let value = params.normalized(control.param);
        commands.extend(match control.kind {
            ControlKind::Knob => render_knob(control.x, control.y, value, spec.label),
            ControlKind::Slider => render_slider(control.x, control.y, value, spec.label),
        });
    }
    if let Some(param) = hovered {
        commands.extend(render_tooltip(width, height, param.spec().tooltip));
    }
    commands
}

/// Evenly divided grid for generic widget placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetGrid {
    cols: u32,
    rows: u32,
}

impl Default for WidgetGrid {
    fn default() -> Self {
        WidgetGrid { cols: 8, rows: 6 }
    }
}

impl WidgetGrid {
    pub fn new(cols: u32, rows: u32) -> Self {
        WidgetGrid {
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Pixel center of cell `(gx, gy)`.
    pub fn cell_center(&self, gx: u32, gy: u32, width: f64, height: f64) -> (f64, f64) {
        let cell_w = width / f64::from(self.cols);
        let cell_h = height / f64::from(self.rows);
        ((f64::from(gx) + 0.5) * cell_w, (f64::from(gy) + 0.5) * cell_h)
    }

    /// Cell containing pixel `(x, y)`, or `None` outside the grid.
    pub fn cell_at(&self, x: f64, y: f64, width: f64, height: f64) -> Option<(u32, u32)> {
        if !(0.0..width).contains(&x) || !(0.0..height).contains(&y) {
            return None;
        }
        let gx = (x / (width / f64::from(self.cols))).floor() as u32;
        let gy = (y / (height / f64::from(self.rows))).floor() as u32;
        Some((gx.min(self.cols - 1), gy.min(self.rows - 1)))
    }

    /// Place a control for `param` in cell `(gx, gy)`.
    pub fn place(
        &self,
        param: ParamId,
        kind: ControlKind,
        gx: u32,
        gy: u32,
        width: f64,
        height: f64,
    ) -> Control {
        let (x, y) = self.cell_center(gx, gy, width, height);
        Control { param, kind, x, y }
    }
}
