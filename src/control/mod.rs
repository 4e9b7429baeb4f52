//! On-screen controls: placement, pointer gestures and drawing.

pub mod gesture;
pub mod layout;
pub mod widget;

pub use gesture::{GestureMapper, ParamDelta};
pub use layout::{Control, ControlKind, Layout, Placement};
pub use widget::{DrawCommand, WidgetGrid};
