//! Notifications emitted to the host.

use crate::stroke::Stroke;
use std::fmt;
use std::sync::Arc;

/// Something the host may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// The current strokes changed, for any reason.
    Changed(Arc<Vec<Stroke>>),
    /// A pointer session finished its stroke.
    StrokeCompleted { stroke: Stroke, is_eraser: bool },
}

/// Receives canvas events.
pub trait EventHandler {
    fn handle_event(&mut self, event: &CanvasEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&CanvasEvent),
{
    fn handle_event(&mut self, event: &CanvasEvent) {
        self(event)
    }
}

/// Broadcasts events to every subscribed handler, in subscription order.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.len()))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl EventHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn emit(&mut self, event: CanvasEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
