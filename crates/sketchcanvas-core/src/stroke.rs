//! Stroke data model and the path interchange format.

use crate::error::{CanvasError, CanvasResult};
use kurbo::Point;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Whether a stroke adds ink or masks ink beneath it.
///
/// Serialized as the `drawMode` boolean (`true` for [`StrokeMode::Draw`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrokeMode {
    #[default]
    Draw,
    Erase,
}

impl StrokeMode {
    /// Map the interchange `drawMode` flag to a mode.
    pub fn from_draw_flag(draw_mode: bool) -> Self {
        if draw_mode {
            StrokeMode::Draw
        } else {
            StrokeMode::Erase
        }
    }

    pub fn is_draw(self) -> bool {
        self == StrokeMode::Draw
    }

    pub fn is_erase(self) -> bool {
        self == StrokeMode::Erase
    }
}

impl Serialize for StrokeMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_draw())
    }
}

impl<'de> Deserialize<'de> for StrokeMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bool::deserialize(deserializer).map(Self::from_draw_flag)
    }
}

/// Style snapshot taken when a stroke begins.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
    pub mode: StrokeMode,
}

impl StrokeStyle {
    /// Eraser strokes are always painted black into the mask layer.
    pub const ERASER_COLOR: &'static str = "#000000";

    pub fn draw(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            mode: StrokeMode::Draw,
        }
    }

    pub fn erase(width: f64) -> Self {
        Self {
            color: Self::ERASER_COLOR.to_string(),
            width,
            mode: StrokeMode::Erase,
        }
    }
}

/// One continuous pointer-down-to-up drawing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Points in canvas-local coordinates, in drawing order.
    #[serde(rename = "paths")]
    pub points: Vec<Point>,
    pub stroke_width: f64,
    pub stroke_color: String,
    #[serde(rename = "drawMode")]
    pub mode: StrokeMode,
    /// Epoch milliseconds at pointer-down, when timestamping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<u64>,
    /// Epoch milliseconds at pointer-up. `Some(0)` while still drawing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<u64>,
}

impl Stroke {
    /// Start a stroke at `point` with the given style.
    pub fn begin(point: Point, style: &StrokeStyle, start_timestamp: Option<u64>) -> Self {
        Self {
            points: vec![point],
            stroke_width: style.width,
            stroke_color: style.color.clone(),
            mode: style.mode,
            start_timestamp,
            end_timestamp: start_timestamp.map(|_| 0),
        }
    }

    /// Create a finished stroke from existing points.
    pub fn from_points(points: Vec<Point>, style: &StrokeStyle) -> Self {
        Self {
            points,
            stroke_width: style.width,
            stroke_color: style.color.clone(),
            mode: style.mode,
            start_timestamp: None,
            end_timestamp: None,
        }
    }

    /// Add a point to the stroke.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_eraser(&self) -> bool {
        self.mode.is_erase()
    }

    /// Elapsed drawing time in milliseconds.
    ///
    /// Strokes without timestamps, or whose end is not finalized yet,
    /// contribute nothing.
    pub fn duration_ms(&self) -> u64 {
        match (self.start_timestamp, self.end_timestamp) {
            (Some(start), Some(end)) if end >= start => end - start,
            _ => 0,
        }
    }
}

/// Serialize strokes into the JSON interchange format.
pub fn paths_to_json(strokes: &[Stroke]) -> CanvasResult<String> {
    serde_json::to_string(strokes).map_err(CanvasError::InvalidPaths)
}

/// Parse strokes from the JSON interchange format.
pub fn paths_from_json(json: &str) -> CanvasResult<Vec<Stroke>> {
    serde_json::from_str(json).map_err(CanvasError::InvalidPaths)
}
