//! Home-screen widget pipeline: the storage bridge the app writes through
//! and the renderer the widget host runs at redraw time.

pub mod bridge;
pub mod render;

pub use bridge::WidgetBridge;
pub use render::WidgetView;
