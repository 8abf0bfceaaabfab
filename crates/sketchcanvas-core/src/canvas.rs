//! Canvas state: history, pointer session and the command queue.

use crate::clock::{Clock, SystemClock};
use crate::config::CanvasConfig;
use crate::error::{CanvasError, CanvasResult};
use crate::events::{CanvasEvent, EventBus, EventHandler};
use crate::history::History;
use crate::input::{PointerInput, PointerSession, SessionOptions};
use crate::queue::{Command, CommandQueue, CommandSender};
use crate::stroke::Stroke;
use std::fmt;
use std::sync::Arc;

/// One drawing surface's state.
///
/// Every mutation is queued as a [`Command`] and applied in order; events
/// for a command are emitted before the next command is applied.
pub struct Canvas {
    config: CanvasConfig,
    history: History,
    session: PointerSession,
    /// Persistent eraser toggle. Never creates a stroke by itself.
    erase_mode: bool,
    clock: Box<dyn Clock>,
    queue: CommandQueue,
    events: EventBus,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("config", &self.config)
            .field("history", &self.history)
            .field("session", &self.session)
            .field("erase_mode", &self.erase_mode)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    /// Create a canvas using the system clock.
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create a canvas with a custom time source.
    pub fn with_clock(config: CanvasConfig, clock: impl Clock + 'static) -> Self {
        let session = PointerSession::new(SessionOptions {
            allowed: config.allow_only_pointer_type,
            read_only: config.read_only,
            throttle_ms: config.throttle_time,
        });
        Self {
            config,
            history: History::new(),
            session,
            erase_mode: false,
            clock: Box::new(clock),
            queue: CommandQueue::new(),
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn erase_mode(&self) -> bool {
        self.erase_mode
    }

    /// Register an event handler.
    pub fn subscribe(&mut self, handler: impl EventHandler + 'static) {
        self.events.subscribe(handler);
    }

    /// A handle for queueing commands, usable from inside event handlers.
    pub fn command_sender(&self) -> CommandSender {
        self.queue.sender()
    }

    /// Queue a command and apply everything pending.
    pub fn submit(&mut self, command: Command) {
        self.queue.push(command);
        self.process_pending();
    }

    /// Apply queued commands until the queue is empty.
    pub fn process_pending(&mut self) {
        while let Some(command) = self.queue.pop() {
            self.apply(command);
        }
    }

    pub fn set_erase_mode(&mut self, erase: bool) {
        self.submit(Command::SetEraseMode(erase));
    }

    pub fn undo(&mut self) {
        self.submit(Command::Undo);
    }

    pub fn redo(&mut self) {
        self.submit(Command::Redo);
    }

    /// Clear the canvas. The next `undo` brings everything back.
    pub fn clear(&mut self) {
        self.submit(Command::Clear);
    }

    /// Drop all strokes and history.
    pub fn reset(&mut self) {
        self.submit(Command::Reset);
    }

    /// Append strokes; one `undo` removes the whole batch.
    pub fn load_paths(&mut self, strokes: Vec<Stroke>) {
        self.submit(Command::LoadPaths(strokes));
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        let now = self.clock.now_ms();
        if let Some(command) = self.session.pointer_down(input, self.erase_mode, now) {
            self.submit(command);
        }
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        let now = self.clock.now_ms();
        if let Some(command) = self.session.pointer_move(input, now) {
            self.submit(command);
        }
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        for command in self.session.pointer_up(input) {
            self.queue.push(command);
        }
        self.process_pending();
    }

    /// Shared snapshot of the current strokes.
    pub fn snapshot(&self) -> Arc<Vec<Stroke>> {
        self.history.snapshot()
    }

    /// Owned copy of the current strokes.
    pub fn export_paths(&self) -> Vec<Stroke> {
        self.history.export_paths()
    }

    /// Total drawing time in milliseconds.
    pub fn sketching_time(&self) -> CanvasResult<u64> {
        if !self.config.with_timestamp {
            return Err(CanvasError::TimestampDisabled);
        }
        Ok(self.history.sketching_time())
    }

    fn timestamp(&self) -> Option<u64> {
        self.config.with_timestamp.then(|| self.clock.now_ms())
    }

    fn apply(&mut self, command: Command) {
        log::trace!("applying {}", command.name());
        let changed = match command {
            Command::BeginStroke { point, erase } => {
                let style = self.config.stroke_style(erase);
                let start = self.timestamp();
                self.history.begin_stroke(point, &style, start)
            }
            Command::ExtendStroke(points) => self.history.extend_stroke(&points),
            Command::EndStroke => {
                let end = self.timestamp();
                match self.history.end_stroke(end) {
                    Some(stroke) => {
                        if end.is_some() {
                            self.emit_changed();
                        }
                        let is_eraser = stroke.is_eraser();
                        self.events
                            .emit(CanvasEvent::StrokeCompleted { stroke, is_eraser });
                    }
                    None => log::debug!("end_stroke without a stroke in progress"),
                }
                false
            }
            Command::SetEraseMode(erase) => {
                self.erase_mode = erase;
                false
            }
            Command::Undo => self.history.undo(),
            Command::Redo => self.history.redo(),
            Command::Clear => self.history.clear(),
            Command::Reset => self.history.reset(),
            Command::LoadPaths(strokes) => self.history.load_paths(strokes),
        };
        if changed {
            self.emit_changed();
        }
    }

    fn emit_changed(&mut self) {
        self.events.emit(CanvasEvent::Changed(self.history.snapshot()));
    }
}
