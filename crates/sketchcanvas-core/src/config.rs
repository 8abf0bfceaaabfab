//! Canvas configuration.

use crate::error::{CanvasError, CanvasResult};
use crate::input::AllowedPointerType;
use crate::stroke::StrokeStyle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Alignment along one axis for `preserveAspectRatio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisAlign {
    Min,
    Mid,
    Max,
}

impl AxisAlign {
    fn name(self) -> &'static str {
        match self {
            AxisAlign::Min => "Min",
            AxisAlign::Mid => "Mid",
            AxisAlign::Max => "Max",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Min" => Some(AxisAlign::Min),
            "Mid" => Some(AxisAlign::Mid),
            "Max" => Some(AxisAlign::Max),
            _ => None,
        }
    }
}

/// How the background image is fitted into the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PreserveAspectRatio {
    /// Stretch to fill, ignoring the aspect ratio.
    #[default]
    None,
    Align {
        x: AxisAlign,
        y: AxisAlign,
        /// `slice` covers the canvas, `meet` fits inside it.
        slice: bool,
    },
}

impl fmt::Display for PreserveAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreserveAspectRatio::None => f.write_str("none"),
            PreserveAspectRatio::Align { x, y, slice } => {
                write!(f, "x{}Y{}", x.name(), y.name())?;
                if *slice {
                    f.write_str(" slice")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for PreserveAspectRatio {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CanvasError::InvalidAspectRatio(s.to_string());
        let mut parts = s.split_whitespace();
        let align = parts.next().ok_or_else(invalid)?;
        if align == "none" {
            return if parts.next().is_none() {
                Ok(PreserveAspectRatio::None)
            } else {
                Err(invalid())
            };
        }
        let slice = match parts.next() {
            None | Some("meet") => false,
            Some("slice") => true,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        // Shape is x{Min|Mid|Max}Y{Min|Mid|Max}.
        let rest = align.strip_prefix('x').ok_or_else(invalid)?;
        let (x, y) = rest.split_once('Y').ok_or_else(invalid)?;
        Ok(PreserveAspectRatio::Align {
            x: AxisAlign::parse(x).ok_or_else(invalid)?,
            y: AxisAlign::parse(y).ok_or_else(invalid)?,
            slice,
        })
    }
}

impl TryFrom<String> for PreserveAspectRatio {
    type Error = CanvasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PreserveAspectRatio> for String {
    fn from(value: PreserveAspectRatio) -> Self {
        value.to_string()
    }
}

/// Options recognized by the drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// CSS width of the surface.
    pub width: String,
    /// CSS height of the surface.
    pub height: String,
    /// Class name for the host container.
    pub class_name: String,
    /// Inline style overrides for the root `<svg>`.
    pub svg_style: BTreeMap<String, String>,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub eraser_width: f64,
    pub canvas_color: String,
    /// Background image URL. Empty means none.
    pub background_image: String,
    pub preserve_background_image_aspect_ratio: PreserveAspectRatio,
    pub export_with_background_image: bool,
    pub allow_only_pointer_type: AllowedPointerType,
    pub read_only: bool,
    pub with_timestamp: bool,
    /// Minimum milliseconds between move notifications. 0 disables throttling.
    pub throttle_time: u64,
    /// Prefix for every element id, so several canvases can share a page.
    pub id: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: "100%".to_string(),
            class_name: String::new(),
            svg_style: BTreeMap::new(),
            stroke_color: "red".to_string(),
            stroke_width: 4.0,
            eraser_width: 8.0,
            canvas_color: "white".to_string(),
            background_image: String::new(),
            preserve_background_image_aspect_ratio: PreserveAspectRatio::None,
            export_with_background_image: false,
            allow_only_pointer_type: AllowedPointerType::All,
            read_only: false,
            with_timestamp: false,
            throttle_time: 0,
            id: format!("sketch-canvas-{}", Uuid::new_v4().simple()),
        }
    }
}

impl CanvasConfig {
    /// Load a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        serde_json::from_str(json).map_err(CanvasError::InvalidConfig)
    }

    /// Background image URL, if one is configured.
    pub fn background_image(&self) -> Option<&str> {
        let url = self.background_image.trim();
        (!url.is_empty()).then_some(url)
    }

    /// Style for new strokes in the given mode.
    pub fn stroke_style(&self, erase: bool) -> StrokeStyle {
        if erase {
            StrokeStyle::erase(self.eraser_width)
        } else {
            StrokeStyle::draw(self.stroke_color.clone(), self.stroke_width)
        }
    }

    /// Inline style attribute for the root `<svg>`, if any.
    pub fn svg_style_attr(&self) -> Option<String> {
        if self.svg_style.is_empty() {
            return None;
        }
        Some(
            self.svg_style
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
