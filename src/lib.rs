//! LumaEdit: a non-destructive raster image editing engine.
//!
//! The [`editor::Editor`] owns one source image and derives a display image
//! from it through the filter pipeline. Geometric transforms rewrite the
//! source, filters never do, and every committed edit can be undone.

pub mod logger;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod config;
pub mod editor;
pub mod error;
pub mod io;
pub mod ops;

pub use canvas::PixelBuffer;
pub use editor::{Editor, RenderSurface};
pub use error::{DecodeError, EditError, EncodeError};
