pub mod export;
pub mod preview;
pub mod svg;
pub mod theme;

pub use export::{export_png, ExportError, ExportOptions, ExportedImage};
pub use preview::{render_preview, CardLayout, PreviewStyle};
pub use theme::{DimensionPreset, Theme};
