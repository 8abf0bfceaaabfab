//! SketchCanvas Render Library
//!
//! SVG rendering with eraser masks, image export, and the host-facing
//! canvas handle.

pub mod export;
pub mod handle;
pub mod renderer;
pub mod svg;

pub use export::{
    BoxFuture, ExportCoordinator, ExportError, ExportImageOptions, ExportResult, FetchError,
    FetchedImage, ImageFetcher, ImageFormat, RasterError, RasterImage, Rasterizer, SvgDocument,
};
pub use handle::{SketchCanvas, SketchCanvasBuilder, SketchCanvasHandle};
pub use renderer::{DrawGroup, ElementIds, RenderOptions, partition, render, render_stroke};
pub use svg::SvgElement;
