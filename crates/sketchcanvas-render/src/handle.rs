//! Host-facing canvas handle.

use crate::export::{
    BoxFuture, ExportCoordinator, ExportError, ExportImageOptions, ExportResult, ImageFetcher,
    ImageFormat, Rasterizer,
};
use crate::renderer::{RenderOptions, render};
use crate::svg::SvgElement;
use kurbo::Size;
use sketchcanvas_core::geometry::SharedCurveGenerator;
use sketchcanvas_core::{
    Canvas, CanvasConfig, CanvasResult, Clock, CommandSender, EventHandler, PointerInput, Stroke,
    SystemClock,
};
use std::rc::Rc;

/// Operations a host can invoke on a mounted canvas.
pub trait SketchCanvasHandle {
    /// Toggle erase mode for subsequent strokes.
    fn set_erase_mode(&mut self, erase: bool);

    /// Clear the canvas; undo restores it.
    fn clear_canvas(&mut self);

    /// Clear the canvas and drop all history.
    fn reset_canvas(&mut self);

    fn undo(&mut self);

    fn redo(&mut self);

    /// Append strokes as one undoable unit.
    fn load_paths(&mut self, paths: Vec<Stroke>);

    fn export_paths(&self) -> BoxFuture<'static, Vec<Stroke>>;

    /// Export a raster image as a `data:` URI.
    fn export_image(
        &self,
        format: ImageFormat,
        options: ExportImageOptions,
    ) -> BoxFuture<'static, ExportResult<String>>;

    /// Export SVG markup.
    fn export_svg(&self) -> BoxFuture<'static, ExportResult<String>>;

    /// Total drawing time in milliseconds.
    fn get_sketching_time(&self) -> BoxFuture<'static, CanvasResult<u64>>;
}

/// Builder for [`SketchCanvas`].
pub struct SketchCanvasBuilder {
    config: CanvasConfig,
    clock: Box<dyn Clock>,
    curve_generator: SharedCurveGenerator,
    rasterizer: Option<Rc<dyn Rasterizer>>,
    fetcher: Option<Rc<dyn ImageFetcher>>,
}

impl SketchCanvasBuilder {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
            curve_generator: SharedCurveGenerator::default(),
            rasterizer: None,
            fetcher: None,
        }
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the default Bezier smoothing.
    pub fn curve_generator(mut self, generator: SharedCurveGenerator) -> Self {
        self.curve_generator = generator;
        self
    }

    pub fn rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Some(Rc::new(rasterizer));
        self
    }

    pub fn image_fetcher(mut self, fetcher: impl ImageFetcher + 'static) -> Self {
        self.fetcher = Some(Rc::new(fetcher));
        self
    }

    pub fn build(self) -> SketchCanvas {
        let mut exporter =
            ExportCoordinator::new(RenderOptions::from_config(&self.config, self.curve_generator));
        if let Some(rasterizer) = self.rasterizer {
            exporter = exporter.with_rasterizer(rasterizer);
        }
        if let Some(fetcher) = self.fetcher {
            exporter = exporter.with_fetcher(fetcher);
        }
        SketchCanvas {
            canvas: Canvas::with_clock(self.config, self.clock),
            surface: None,
            exporter,
        }
    }
}

/// A drawing surface plus its renderer and exporters.
#[derive(Debug)]
pub struct SketchCanvas {
    canvas: Canvas,
    /// Pixel size of the surface, once mounted.
    surface: Option<Size>,
    exporter: ExportCoordinator,
}

impl SketchCanvas {
    pub fn new(config: CanvasConfig) -> Self {
        SketchCanvasBuilder::new(config).build()
    }

    pub fn builder(config: CanvasConfig) -> SketchCanvasBuilder {
        SketchCanvasBuilder::new(config)
    }

    /// Record the surface size. Exports need a mounted surface.
    pub fn mount(&mut self, width: f64, height: f64) {
        log::debug!("mounted {} at {}x{}", self.canvas.config().id, width, height);
        self.surface = Some(Size::new(width, height));
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface_size(&self) -> Option<Size> {
        self.surface
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn config(&self) -> &CanvasConfig {
        self.canvas.config()
    }

    pub fn erase_mode(&self) -> bool {
        self.canvas.erase_mode()
    }

    pub fn can_undo(&self) -> bool {
        self.canvas.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.canvas.history().can_redo()
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        self.canvas.pointer_down(input);
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        self.canvas.pointer_move(input);
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        self.canvas.pointer_up(input);
    }

    pub fn subscribe(&mut self, handler: impl EventHandler + 'static) {
        self.canvas.subscribe(handler);
    }

    pub fn command_sender(&self) -> CommandSender {
        self.canvas.command_sender()
    }

    /// Apply commands queued through a [`CommandSender`].
    pub fn process_pending(&mut self) {
        self.canvas.process_pending();
    }

    /// Render the live tree.
    pub fn render(&self) -> SvgElement {
        render(&self.canvas.snapshot(), self.exporter.options())
    }
}

impl SketchCanvasHandle for SketchCanvas {
    fn set_erase_mode(&mut self, erase: bool) {
        self.canvas.set_erase_mode(erase);
    }

    fn clear_canvas(&mut self) {
        self.canvas.clear();
    }

    fn reset_canvas(&mut self) {
        self.canvas.reset();
    }

    fn undo(&mut self) {
        self.canvas.undo();
    }

    fn redo(&mut self) {
        self.canvas.redo();
    }

    fn load_paths(&mut self, paths: Vec<Stroke>) {
        self.canvas.load_paths(paths);
    }

    fn export_paths(&self) -> BoxFuture<'static, Vec<Stroke>> {
        let paths = self.canvas.export_paths();
        Box::pin(async move { paths })
    }

    fn export_image(
        &self,
        format: ImageFormat,
        options: ExportImageOptions,
    ) -> BoxFuture<'static, ExportResult<String>> {
        self.exporter.export_raster(
            self.canvas.snapshot(),
            self.surface,
            format,
            self.canvas.config().export_with_background_image,
            options,
        )
    }

    fn export_svg(&self) -> BoxFuture<'static, ExportResult<String>> {
        let result = self.surface.ok_or(ExportError::NotReady).map(|surface| {
            let document = self.exporter.export_svg_document(
                &self.canvas.snapshot(),
                surface,
                self.canvas.config().export_with_background_image,
            );
            log::info!("exported {} strokes as SVG", self.canvas.history().len());
            document.to_markup()
        });
        Box::pin(async move { result })
    }

    fn get_sketching_time(&self) -> BoxFuture<'static, CanvasResult<u64>> {
        let result = self.canvas.sketching_time();
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchcanvas_core::{CanvasError, ManualClock, PathDescriptor, StrokeMode};

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
                return result;
            }
        }
    }

    fn config() -> CanvasConfig {
        CanvasConfig {
            id: "h".into(),
            ..CanvasConfig::default()
        }
    }

    fn draw(canvas: &mut SketchCanvas, points: &[(f64, f64)]) {
        let (x, y) = points[0];
        canvas.pointer_down(PointerInput::mouse(x, y));
        for &(x, y) in &points[1..] {
            canvas.pointer_move(PointerInput::mouse(x, y));
        }
        let (x, y) = points[points.len() - 1];
        canvas.pointer_up(PointerInput::mouse(x, y));
    }

    #[test]
    fn test_exports_need_mount() {
        let canvas = SketchCanvas::new(config());
        assert!(matches!(block_on(canvas.export_svg()), Err(ExportError::NotReady)));
        assert!(matches!(
            block_on(canvas.export_image(ImageFormat::Png, ExportImageOptions::default())),
            Err(ExportError::NotReady)
        ));
    }

    #[test]
    fn test_export_svg_after_mount() {
        let mut canvas = SketchCanvas::new(config());
        canvas.mount(300.0, 150.0);
        draw(&mut canvas, &[(0.0, 0.0), (10.0, 10.0)]);
        let svg = block_on(canvas.export_svg()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 300 150""#));
        assert!(svg.contains("h__stroke-group-0__paths__0"));
    }

    #[test]
    fn test_live_render_uses_css_size() {
        let canvas = SketchCanvas::new(config());
        let tree = canvas.render();
        assert_eq!(tree.get_attr("width"), Some("100%"));
        assert!(tree.get_attr("viewBox").is_none());
    }

    #[test]
    fn test_export_paths_is_a_snapshot() {
        let mut canvas = SketchCanvas::new(config());
        draw(&mut canvas, &[(0.0, 0.0), (1.0, 1.0)]);
        let pending = canvas.export_paths();
        draw(&mut canvas, &[(5.0, 5.0)]);
        let paths = block_on(pending);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].mode, StrokeMode::Draw);
    }

    #[test]
    fn test_sketching_time_through_handle() {
        let canvas = SketchCanvas::new(config());
        assert!(matches!(
            block_on(canvas.get_sketching_time()),
            Err(CanvasError::TimestampDisabled)
        ));

        let clock = ManualClock::new(0);
        let mut canvas = SketchCanvas::builder(CanvasConfig {
            with_timestamp: true,
            ..config()
        })
        .clock(clock.clone())
        .build();
        canvas.pointer_down(PointerInput::mouse(0.0, 0.0));
        clock.advance(75);
        canvas.pointer_up(PointerInput::mouse(0.0, 0.0));
        assert_eq!(block_on(canvas.get_sketching_time()).unwrap(), 75);
    }

    #[test]
    fn test_handle_operations() {
        let mut canvas = SketchCanvas::new(config());
        draw(&mut canvas, &[(0.0, 0.0), (1.0, 1.0)]);
        canvas.clear_canvas();
        assert!(canvas.canvas().history().is_empty());
        canvas.undo();
        assert_eq!(canvas.canvas().history().len(), 1);
        canvas.reset_canvas();
        assert!(!canvas.can_undo());
        assert!(!canvas.can_redo());

        canvas.set_erase_mode(true);
        assert!(canvas.erase_mode());
        canvas.load_paths(Vec::new());
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_builder_curve_generator() {
        let mut canvas = SketchCanvas::builder(config())
            .curve_generator(SharedCurveGenerator::new(|_: &[kurbo::Point]| {
                PathDescriptor::Empty
            }))
            .build();
        draw(&mut canvas, &[(0.0, 0.0), (4.0, 4.0)]);
        let tree = canvas.render();
        assert!(tree.find_by_id("h__stroke-group-0").unwrap().children.is_empty());
    }
}
