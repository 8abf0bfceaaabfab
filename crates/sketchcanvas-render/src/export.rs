//! SVG and raster export.

use crate::renderer::{RenderOptions, render};
use crate::svg::SvgElement;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, RgbImage, RgbaImage};
use kurbo::Size;
use peniko::color::{Srgb, parse_color};
use sketchcanvas_core::{CanvasError, Stroke};
use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

/// Boxed future for export operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Surface is not mounted")]
    NotReady,
    #[error("No rasterizer configured")]
    NoRasterizer,
    #[error("Rasterization failed: {0}")]
    Rasterize(String),
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error(transparent)]
    Core(#[from] CanvasError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Failure reported by an [`ImageFetcher`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FetchError(pub String);

/// Failure reported by a [`Rasterizer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RasterError(pub String);

/// Raster output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Optional output size for raster exports. Missing dimensions use the
/// mounted surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Rasterizer output - straight (non-premultiplied) RGBA pixels.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Bytes of a fetched background image.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Turns SVG markup into pixels.
pub trait Rasterizer {
    fn rasterize<'a>(
        &'a self,
        svg: &'a str,
        width: u32,
        height: u32,
    ) -> BoxFuture<'a, Result<RasterImage, RasterError>>;
}

/// Loads the background image so exports can embed it.
pub trait ImageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedImage, FetchError>>;
}

/// A standalone SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub root: SvgElement,
    pub size: Size,
}

impl SvgDocument {
    pub fn to_markup(&self) -> String {
        self.root.to_markup()
    }
}

/// Builds export documents and drives the rasterizer.
#[derive(Clone)]
pub struct ExportCoordinator {
    options: RenderOptions,
    rasterizer: Option<Rc<dyn Rasterizer>>,
    fetcher: Option<Rc<dyn ImageFetcher>>,
}

impl std::fmt::Debug for ExportCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportCoordinator")
            .field("options", &self.options)
            .field("rasterizer", &self.rasterizer.is_some())
            .field("fetcher", &self.fetcher.is_some())
            .finish()
    }
}

impl ExportCoordinator {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            rasterizer: None,
            fetcher: None,
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Rc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Rc<dyn ImageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Options used for live rendering.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a document pinned to the surface size. Without the background
    /// image the canvas color fill is used.
    pub fn export_svg_document(
        &self,
        strokes: &[Stroke],
        surface: Size,
        include_background_image: bool,
    ) -> SvgDocument {
        let background = if include_background_image {
            self.options.background_image.clone()
        } else {
            None
        };
        let options = self
            .options
            .clone()
            .with_size(surface)
            .with_background_image(background);
        SvgDocument {
            root: render(strokes, &options),
            size: surface,
        }
    }

    /// Rasterize and encode the strokes as a `data:` URI.
    ///
    /// The returned future owns everything it needs, so the canvas stays
    /// usable while it is pending.
    pub fn export_raster(
        &self,
        strokes: Arc<Vec<Stroke>>,
        surface: Option<Size>,
        format: ImageFormat,
        include_background_image: bool,
        size: ExportImageOptions,
    ) -> BoxFuture<'static, ExportResult<String>> {
        let options = self.options.clone();
        let rasterizer = self.rasterizer.clone();
        let fetcher = self.fetcher.clone();
        Box::pin(async move {
            let surface = surface.ok_or(ExportError::NotReady)?;
            let rasterizer = rasterizer.ok_or(ExportError::NoRasterizer)?;

            let background = match options.background_image.as_deref() {
                Some(url) if include_background_image => {
                    inline_background(fetcher.as_deref(), url).await
                }
                _ => None,
            };

            let width = size.width.unwrap_or(surface.width.round() as u32);
            let height = size.height.unwrap_or(surface.height.round() as u32);
            if width == 0 || height == 0 {
                return Err(ExportError::Rasterize(format!(
                    "invalid output size {width}x{height}"
                )));
            }

            // The viewBox keeps the live coordinate system; only the output
            // size changes.
            let canvas_color = options.canvas_color.clone();
            let options = options.with_size(surface).with_background_image(background);
            let mut root = render(&strokes, &options);
            root.set_attr("width", width);
            root.set_attr("height", height);
            let markup = root.to_markup();

            let image = rasterizer
                .rasterize(&markup, width, height)
                .await
                .map_err(|err| ExportError::Rasterize(err.to_string()))?;
            let bytes = encode(image, format, &canvas_color)?;
            log::info!(
                "exported {} strokes as {} ({}x{}, {} bytes)",
                strokes.len(),
                format.mime_type(),
                width,
                height,
                bytes.len()
            );
            Ok(data_uri(format.mime_type(), &bytes))
        })
    }
}

fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Resolve the background reference for a raster export. Without a fetcher
/// the URL is left for the rasterizer to resolve.
async fn inline_background(fetcher: Option<&dyn ImageFetcher>, url: &str) -> Option<String> {
    let Some(fetcher) = fetcher else {
        return Some(url.to_string());
    };
    match fetcher.fetch(url).await {
        Ok(image) => Some(data_uri(&image.mime_type, &image.bytes)),
        Err(err) => {
            log::warn!("Background image {url} could not be loaded, exporting without it: {err}");
            None
        }
    }
}

fn encode(image: RasterImage, format: ImageFormat, canvas_color: &str) -> ExportResult<Vec<u8>> {
    let RasterImage {
        rgba_data,
        width,
        height,
    } = image;
    let expected = width as usize * height as usize * 4;
    if rgba_data.len() != expected {
        return Err(ExportError::Rasterize(format!(
            "expected {expected} bytes for {width}x{height}, got {}",
            rgba_data.len()
        )));
    }
    let pixels = RgbaImage::from_raw(width, height, rgba_data)
        .ok_or_else(|| ExportError::Rasterize("pixel buffer does not match size".into()))?;

    let mut out = Cursor::new(Vec::new());
    match format {
        ImageFormat::Png => {
            DynamicImage::ImageRgba8(pixels).write_to(&mut out, image::ImageFormat::Png)?;
        }
        ImageFormat::Jpeg => {
            let flat = flatten(&pixels, jpeg_background(canvas_color));
            DynamicImage::ImageRgb8(flat).write_to(&mut out, image::ImageFormat::Jpeg)?;
        }
    }
    Ok(out.into_inner())
}

/// Opaque fill behind JPEG exports.
fn jpeg_background(canvas_color: &str) -> [u8; 3] {
    const WHITE: [u8; 3] = [255, 255, 255];
    match parse_color(canvas_color) {
        Ok(color) => {
            let rgba = color.to_alpha_color::<Srgb>().to_rgba8();
            over([rgba.r, rgba.g, rgba.b], rgba.a, WHITE)
        }
        Err(err) => {
            log::warn!("Canvas color {canvas_color:?} is not a color ({err:?}), using white");
            WHITE
        }
    }
}

fn over(src: [u8; 3], alpha: u8, dst: [u8; 3]) -> [u8; 3] {
    let a = alpha as u32;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2])]
}

fn flatten(pixels: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0;
        image::Rgb(over([r, g, b], a, background))
    })
}
