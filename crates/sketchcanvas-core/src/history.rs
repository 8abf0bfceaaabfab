//! Stroke history: current strokes, undo stack and the pre-clear snapshot.
//!
//! `current` is shared copy-on-write, so snapshots handed out to observers
//! and exporters never change after the fact. Strokes are grouped into undo
//! units: every drawn stroke is its own unit, every `load_paths` batch is one
//! unit, and `undo`/`redo` always move whole units.

use crate::stroke::{Stroke, StrokeStyle};
use kurbo::Point;
use std::sync::Arc;

/// Strokes plus the undo unit sizes that partition them.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    strokes: Arc<Vec<Stroke>>,
    units: Vec<usize>,
}

impl Snapshot {
    fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

/// The canonical stroke history of one canvas.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// What is currently on the canvas.
    current: Snapshot,
    /// Units removed by `undo`, restorable by `redo` (LIFO).
    undo_stack: Vec<Vec<Stroke>>,
    /// `current` as it was right before the last `clear`.
    reset_stack: Snapshot,
    /// Index into `current` of the stroke being drawn.
    active: Option<usize>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared snapshot of the current strokes.
    pub fn snapshot(&self) -> Arc<Vec<Stroke>> {
        Arc::clone(&self.current.strokes)
    }

    /// Owned copy of the current strokes.
    pub fn export_paths(&self) -> Vec<Stroke> {
        self.current.strokes.as_ref().clone()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.current.strokes
    }

    pub fn len(&self) -> usize {
        self.current.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.strokes.is_empty()
    }

    /// Whether a stroke session is in progress.
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// The stroke being drawn, if any.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.and_then(|i| self.current.strokes.get(i))
    }

    /// Units waiting to be redone, oldest first.
    pub fn undo_stack(&self) -> &[Vec<Stroke>] {
        &self.undo_stack
    }

    /// Strokes that the next `undo` would bring back after a `clear`.
    pub fn reset_stack(&self) -> &[Stroke] {
        &self.reset_stack.strokes
    }

    pub fn can_undo(&self) -> bool {
        !self.reset_stack.is_empty() || !self.current.units.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Start a new stroke. Ignored while another stroke is in progress.
    ///
    /// Starting new work always discards the redo history.
    pub fn begin_stroke(
        &mut self,
        point: Point,
        style: &StrokeStyle,
        start_timestamp: Option<u64>,
    ) -> bool {
        if self.active.is_some() {
            log::debug!("begin_stroke ignored: a stroke is already in progress");
            return false;
        }

        let strokes = Arc::make_mut(&mut self.current.strokes);
        strokes.push(Stroke::begin(point, style, start_timestamp));
        self.current.units.push(1);
        self.active = Some(strokes.len() - 1);

        if !self.undo_stack.is_empty() {
            log::debug!("discarding {} redo unit(s)", self.undo_stack.len());
            self.undo_stack.clear();
        }
        true
    }

    /// Append points to the stroke in progress.
    pub fn extend_stroke(&mut self, points: &[Point]) -> bool {
        let Some(index) = self.active else {
            return false;
        };
        if points.is_empty() {
            return false;
        }
        let strokes = Arc::make_mut(&mut self.current.strokes);
        match strokes.get_mut(index) {
            Some(stroke) => {
                stroke.points.extend_from_slice(points);
                true
            }
            None => false,
        }
    }

    /// Seal the stroke in progress and return it.
    ///
    /// `end_timestamp` is only recorded on strokes that were timestamped
    /// when they began.
    pub fn end_stroke(&mut self, end_timestamp: Option<u64>) -> Option<Stroke> {
        let index = self.active.take()?;
        if let Some(end) = end_timestamp {
            let timestamped = self
                .current
                .strokes
                .get(index)
                .is_some_and(|stroke| stroke.start_timestamp.is_some());
            if timestamped {
                let strokes = Arc::make_mut(&mut self.current.strokes);
                strokes[index].end_timestamp = Some(end);
            }
        }
        self.current.strokes.get(index).cloned()
    }

    /// Undo the last unit, or bring back the strokes removed by `clear`.
    ///
    /// A pending pre-clear snapshot takes precedence and is consumed once.
    /// Returns true if anything changed.
    pub fn undo(&mut self) -> bool {
        if !self.reset_stack.is_empty() {
            self.current = std::mem::take(&mut self.reset_stack);
            self.active = None;
            log::debug!("undo restored {} cleared stroke(s)", self.current.strokes.len());
            return true;
        }

        let Some(size) = self.current.units.pop() else {
            return false;
        };
        let strokes = Arc::make_mut(&mut self.current.strokes);
        let unit = strokes.split_off(strokes.len().saturating_sub(size));
        self.undo_stack.push(unit);
        self.drop_stale_session();
        true
    }

    /// Redo the last undone unit. Returns true if anything changed.
    pub fn redo(&mut self) -> bool {
        let Some(unit) = self.undo_stack.pop() else {
            return false;
        };
        self.current.units.push(unit.len());
        Arc::make_mut(&mut self.current.strokes).extend(unit);
        true
    }

    /// Move everything on the canvas into the reset stack.
    ///
    /// The redo history is left alone; a second `clear` overwrites the
    /// reset stack. Returns true if the canvas had strokes.
    pub fn clear(&mut self) -> bool {
        let changed = !self.current.is_empty();
        self.reset_stack = std::mem::take(&mut self.current);
        self.active = None;
        changed
    }

    /// Append strokes as a single undo unit.
    pub fn load_paths(&mut self, strokes: Vec<Stroke>) -> bool {
        if strokes.is_empty() {
            return false;
        }
        self.current.units.push(strokes.len());
        Arc::make_mut(&mut self.current.strokes).extend(strokes);
        true
    }

    /// Drop all strokes and both stacks. Cannot be undone.
    pub fn reset(&mut self) -> bool {
        let changed = !self.current.is_empty();
        *self = Self::default();
        changed
    }

    /// Total drawing time of the current strokes, in milliseconds.
    pub fn sketching_time(&self) -> u64 {
        self.current.strokes.iter().map(Stroke::duration_ms).sum()
    }

    fn drop_stale_session(&mut self) {
        if self.active.is_some_and(|i| i >= self.current.strokes.len()) {
            log::debug!("stroke in progress was removed from history");
            self.active = None;
        }
    }
}
