//! End-to-end flow through the public canvas handle.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sketchcanvas_core::{CanvasConfig, CanvasEvent, PointerInput, StrokeMode, paths_from_json, paths_to_json};
use sketchcanvas_render::{
    BoxFuture, ExportImageOptions, FetchError, FetchedImage, ImageFetcher, ImageFormat,
    RasterError, RasterImage, Rasterizer, SketchCanvas, SketchCanvasHandle,
};
use std::cell::RefCell;
use std::rc::Rc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

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

/// Returns a fully transparent image and remembers the markup it saw.
#[derive(Clone, Default)]
struct FakeRasterizer {
    seen: Rc<RefCell<Vec<String>>>,
}

impl Rasterizer for FakeRasterizer {
    fn rasterize<'a>(
        &'a self,
        svg: &'a str,
        width: u32,
        height: u32,
    ) -> BoxFuture<'a, Result<RasterImage, RasterError>> {
        self.seen.borrow_mut().push(svg.to_string());
        Box::pin(async move {
            Ok(RasterImage {
                rgba_data: vec![0; (width * height * 4) as usize],
                width,
                height,
            })
        })
    }
}

struct FakeFetcher {
    available: bool,
}

impl ImageFetcher for FakeFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedImage, FetchError>> {
        let available = self.available;
        Box::pin(async move {
            if available {
                Ok(FetchedImage {
                    bytes: vec![1, 2, 3],
                    mime_type: "image/png".into(),
                })
            } else {
                Err(FetchError(format!("cannot load {url}")))
            }
        })
    }
}

fn config() -> CanvasConfig {
    CanvasConfig {
        id: "flow".into(),
        ..CanvasConfig::default()
    }
}

fn draw(canvas: &mut SketchCanvas, from: (f64, f64), to: (f64, f64)) {
    canvas.pointer_down(PointerInput::mouse(from.0, from.1));
    canvas.pointer_move(PointerInput::mouse(to.0, to.1));
    canvas.pointer_up(PointerInput::mouse(to.0, to.1));
}

#[test]
fn test_draw_erase_undo_and_export() {
    init_logger();
    let rasterizer = FakeRasterizer::default();
    let mut canvas = SketchCanvas::builder(config())
        .rasterizer(rasterizer.clone())
        .build();
    canvas.mount(64.0, 32.0);

    let completed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&completed);
    canvas.subscribe(move |event: &CanvasEvent| {
        if let CanvasEvent::StrokeCompleted { is_eraser, .. } = event {
            sink.borrow_mut().push(*is_eraser);
        }
    });

    draw(&mut canvas, (0.0, 0.0), (10.0, 10.0));
    canvas.set_erase_mode(true);
    draw(&mut canvas, (5.0, 5.0), (6.0, 6.0));
    canvas.set_erase_mode(false);
    draw(&mut canvas, (20.0, 20.0), (30.0, 30.0));
    assert_eq!(*completed.borrow(), vec![false, true, false]);

    let paths = block_on(canvas.export_paths());
    assert_eq!(paths.len(), 3);
    assert_eq!(paths[1].mode, StrokeMode::Erase);

    let tree = canvas.render();
    assert_eq!(
        tree.find_by_id("flow__stroke-group-0").unwrap().get_attr("mask"),
        Some("url(#flow__eraser-mask-0)")
    );
    assert!(tree.find_by_id("flow__stroke-group-1").unwrap().get_attr("mask").is_none());

    canvas.undo();
    assert_eq!(block_on(canvas.export_paths()).len(), 2);
    canvas.redo();
    assert_eq!(block_on(canvas.export_paths()), paths);

    let uri = block_on(canvas.export_image(ImageFormat::Png, ExportImageOptions::default()))
        .unwrap();
    let png = STANDARD
        .decode(uri.trim_start_matches("data:image/png;base64,"))
        .unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 32));
    assert!(rasterizer.seen.borrow()[0].contains("flow__eraser-0"));
}

#[test]
fn test_jpeg_export_is_flattened_onto_canvas_color() {
    init_logger();
    let mut canvas = SketchCanvas::builder(config())
        .rasterizer(FakeRasterizer::default())
        .build();
    canvas.mount(16.0, 16.0);
    let uri = block_on(canvas.export_image(
        ImageFormat::Jpeg,
        ExportImageOptions {
            width: Some(8),
            height: Some(8),
        },
    ))
    .unwrap();
    assert!(uri.starts_with("data:image/jpeg;base64,"));
    let jpeg = STANDARD
        .decode(uri.trim_start_matches("data:image/jpeg;base64,"))
        .unwrap();
    let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (8, 8));
    for pixel in decoded.pixels() {
        assert!(pixel.0.iter().all(|&c| c > 240), "expected white, got {pixel:?}");
    }
}

#[test]
fn test_background_image_in_exports() {
    init_logger();
    let config = CanvasConfig {
        background_image: "https://example.com/paper.png".into(),
        export_with_background_image: true,
        ..config()
    };

    let rasterizer = FakeRasterizer::default();
    let canvas_ok = {
        let mut canvas = SketchCanvas::builder(config.clone())
            .rasterizer(rasterizer.clone())
            .image_fetcher(FakeFetcher { available: true })
            .build();
        canvas.mount(10.0, 10.0);
        canvas
    };
    block_on(canvas_ok.export_image(ImageFormat::Png, ExportImageOptions::default())).unwrap();
    assert!(rasterizer.seen.borrow()[0].contains("data:image/png;base64,AQID"));

    let svg = block_on(canvas_ok.export_svg()).unwrap();
    assert!(svg.contains("https://example.com/paper.png"));

    let rasterizer = FakeRasterizer::default();
    let mut canvas = SketchCanvas::builder(config)
        .rasterizer(rasterizer.clone())
        .image_fetcher(FakeFetcher { available: false })
        .build();
    canvas.mount(10.0, 10.0);
    block_on(canvas.export_image(ImageFormat::Png, ExportImageOptions::default())).unwrap();
    assert!(!rasterizer.seen.borrow()[0].contains("paper.png"));
}

#[test]
fn test_paths_round_trip_through_load() {
    init_logger();
    let mut source = SketchCanvas::new(config());
    draw(&mut source, (0.0, 0.0), (3.0, 4.0));
    draw(&mut source, (1.0, 1.0), (2.0, 2.0));
    let json = paths_to_json(&block_on(source.export_paths())).unwrap();

    let mut target = SketchCanvas::new(config());
    target.load_paths(paths_from_json(&json).unwrap());
    assert_eq!(block_on(target.export_paths()), block_on(source.export_paths()));
    target.undo();
    assert!(block_on(target.export_paths()).is_empty());
}

#[test]
fn test_handler_can_queue_commands() {
    init_logger();
    let mut canvas = SketchCanvas::new(config());
    let sender = canvas.command_sender();
    // Erasing once is enough: switch back to draw mode after any eraser stroke.
    canvas.subscribe(move |event: &CanvasEvent| {
        if let CanvasEvent::StrokeCompleted { is_eraser: true, .. } = event {
            sender.set_erase_mode(false);
        }
    });
    canvas.set_erase_mode(true);
    draw(&mut canvas, (0.0, 0.0), (1.0, 1.0));
    assert!(!canvas.erase_mode());
    draw(&mut canvas, (0.0, 0.0), (1.0, 1.0));
    let modes: Vec<StrokeMode> = block_on(canvas.export_paths()).iter().map(|s| s.mode).collect();
    assert_eq!(modes, vec![StrokeMode::Erase, StrokeMode::Draw]);
}
