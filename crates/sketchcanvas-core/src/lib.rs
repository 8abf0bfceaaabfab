//! SketchCanvas Core Library
//!
//! Stroke data model, curve generation, undo/redo history and pointer
//! session handling for the SketchCanvas drawing surface.

pub mod canvas;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod input;
pub mod queue;
pub mod stroke;

pub use canvas::Canvas;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AxisAlign, CanvasConfig, PreserveAspectRatio};
pub use error::{CanvasError, CanvasResult};
pub use events::{CanvasEvent, EventBus, EventHandler};
pub use geometry::{BezierSmoothing, CurveGenerator, PathDescriptor, SharedCurveGenerator, generate_path};
pub use history::History;
pub use input::{AllowedPointerType, PointerButton, PointerInput, PointerSession, PointerType, SessionOptions};
pub use queue::{Command, CommandQueue, CommandSender};
pub use stroke::{Stroke, StrokeMode, StrokeStyle, paths_from_json, paths_to_json};
