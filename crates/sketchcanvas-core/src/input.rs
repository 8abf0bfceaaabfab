//! Pointer session handling: turns down/move/up events into stroke commands.

use crate::queue::Command;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Kind of device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
}

/// Which devices may draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowedPointerType {
    #[default]
    All,
    Mouse,
    Pen,
    Touch,
}

impl AllowedPointerType {
    pub fn allows(self, pointer_type: PointerType) -> bool {
        match self {
            AllowedPointerType::All => true,
            AllowedPointerType::Mouse => pointer_type == PointerType::Mouse,
            AllowedPointerType::Pen => pointer_type == PointerType::Pen,
            AllowedPointerType::Touch => pointer_type == PointerType::Touch,
        }
    }
}

/// Button that changed state for a down/up event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Auxiliary,
    /// Stylus eraser end or barrel button.
    Eraser,
}

/// A pointer event already translated into canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub pointer_type: PointerType,
    pub button: PointerButton,
    /// Whether the device reports its eraser button as held.
    pub eraser_held: bool,
    pub position: Point,
}

impl PointerInput {
    pub fn new(pointer_type: PointerType, position: Point) -> Self {
        Self {
            pointer_type,
            button: PointerButton::Primary,
            eraser_held: false,
            position,
        }
    }

    pub fn mouse(x: f64, y: f64) -> Self {
        Self::new(PointerType::Mouse, Point::new(x, y))
    }

    pub fn pen(x: f64, y: f64) -> Self {
        Self::new(PointerType::Pen, Point::new(x, y))
    }

    pub fn touch(x: f64, y: f64) -> Self {
        Self::new(PointerType::Touch, Point::new(x, y))
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_eraser_held(mut self, held: bool) -> Self {
        self.eraser_held = held;
        self
    }

    /// Stylus eraser forces erase mode for the stroke it starts.
    fn forces_erase(&self) -> bool {
        self.pointer_type == PointerType::Pen
            && (self.button == PointerButton::Eraser || self.eraser_held)
    }

    /// Mice only draw with the primary button.
    fn is_drawing_button(&self) -> bool {
        self.pointer_type != PointerType::Mouse || self.button == PointerButton::Primary
    }
}

/// Session filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub allowed: AllowedPointerType,
    pub read_only: bool,
    /// Minimum milliseconds between move flushes. 0 flushes every move.
    pub throttle_ms: u64,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    /// Moves not yet handed to the history.
    pending: Vec<Point>,
    last_flush_ms: u64,
}

/// Converts one down → moves → up cycle into exactly one stroke.
#[derive(Debug, Clone, Default)]
pub struct PointerSession {
    options: SessionOptions,
    active: Option<ActiveSession>,
}

impl PointerSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            active: None,
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Whether a pointer is currently down.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn accepts(&self, input: &PointerInput) -> bool {
        if self.options.read_only {
            return false;
        }
        if !self.options.allowed.allows(input.pointer_type) {
            log::debug!("ignoring {:?} pointer", input.pointer_type);
            return false;
        }
        true
    }

    /// Handle pointer-down. `erase_mode` is the persistent eraser toggle.
    pub fn pointer_down(
        &mut self,
        input: PointerInput,
        erase_mode: bool,
        now_ms: u64,
    ) -> Option<Command> {
        if !self.accepts(&input) || !input.is_drawing_button() || self.active.is_some() {
            return None;
        }
        self.active = Some(ActiveSession {
            pending: Vec::new(),
            last_flush_ms: now_ms,
        });
        Some(Command::BeginStroke {
            point: input.position,
            erase: erase_mode || input.forces_erase(),
        })
    }

    /// Handle pointer-move. Returns the points due for the history, if any.
    pub fn pointer_move(&mut self, input: PointerInput, now_ms: u64) -> Option<Command> {
        if !self.accepts(&input) {
            return None;
        }
        let throttle_ms = self.options.throttle_ms;
        let session = self.active.as_mut()?;
        if throttle_ms == 0 {
            return Some(Command::ExtendStroke(vec![input.position]));
        }

        session.pending.push(input.position);
        if now_ms.saturating_sub(session.last_flush_ms) < throttle_ms {
            return None;
        }
        session.last_flush_ms = now_ms;
        Some(Command::ExtendStroke(std::mem::take(&mut session.pending)))
    }

    /// Handle pointer-up. Flushes held-back moves before ending the stroke.
    pub fn pointer_up(&mut self, input: PointerInput) -> Vec<Command> {
        if !self.accepts(&input) || !input.is_drawing_button() {
            return Vec::new();
        }
        let Some(session) = self.active.take() else {
            return Vec::new();
        };
        let mut commands = Vec::with_capacity(2);
        if !session.pending.is_empty() {
            commands.push(Command::ExtendStroke(session.pending));
        }
        commands.push(Command::EndStroke);
        commands
    }
}
