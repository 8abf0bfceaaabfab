//! FIFO queue for canvas mutations.
//!
//! Every change to the history goes through one [`CommandQueue`], applied one
//! command at a time against the latest state. A [`CommandSender`] can be
//! cloned into event handlers; whatever they send is applied after the command
//! currently being processed, in send order.

use crate::stroke::Stroke;
use kurbo::Point;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A single mutation of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Pointer went down. `erase` is already resolved from the toggle and
    /// the device's eraser button.
    BeginStroke { point: Point, erase: bool },
    /// Points to append to the stroke in progress.
    ExtendStroke(Vec<Point>),
    /// Pointer went up.
    EndStroke,
    SetEraseMode(bool),
    Undo,
    Redo,
    Clear,
    Reset,
    LoadPaths(Vec<Stroke>),
}

impl Command {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::BeginStroke { .. } => "begin_stroke",
            Command::ExtendStroke(_) => "extend_stroke",
            Command::EndStroke => "end_stroke",
            Command::SetEraseMode(_) => "set_erase_mode",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::Clear => "clear",
            Command::Reset => "reset",
            Command::LoadPaths(_) => "load_paths",
        }
    }
}

/// Pending commands, shared with every [`CommandSender`].
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: Rc<RefCell<VecDeque<Command>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: Command) {
        self.pending.borrow_mut().push_back(command);
    }

    pub fn pop(&self) -> Option<Command> {
        self.pending.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// A handle that enqueues into this queue.
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            queue: self.clone(),
        }
    }
}

/// Cloneable handle for requesting canvas mutations.
///
/// Commands sent here are applied the next time the canvas drains its
/// queue: right after the current command when sent from an event handler,
/// or on the next canvas call otherwise.
#[derive(Debug, Clone)]
pub struct CommandSender {
    queue: CommandQueue,
}

impl CommandSender {
    pub fn send(&self, command: Command) {
        self.queue.push(command);
    }

    pub fn undo(&self) {
        self.send(Command::Undo);
    }

    pub fn redo(&self) {
        self.send(Command::Redo);
    }

    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    pub fn load_paths(&self, strokes: Vec<Stroke>) {
        self.send(Command::LoadPaths(strokes));
    }

    pub fn set_erase_mode(&self, erase: bool) {
        self.send(Command::SetEraseMode(erase));
    }
}
