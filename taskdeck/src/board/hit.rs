//! Pointer collision testing for drag targets.
//!
//! Resolution priority: direct pointer containment first, preferring
//! card targets over column backgrounds, then a bounding-rectangle
//! overlap fallback that catches pointers sitting on borders and
//! gutters between lanes.

use ratatui::layout::Rect;
use taskdeck_proto::task::{TaskId, TaskStatus};

use super::drag::DropTarget;

/// Drag ghost extent, in terminal cells. The renderer draws the ghost
/// at this size and the overlap fallback assumes the same footprint.
pub const GHOST_WIDTH: u16 = 20;
pub const GHOST_HEIGHT: u16 = 3;

/// Screen regions that can accept a drop.
///
/// The board renderer rebuilds this every frame while registering the
/// areas it actually drew, so hit testing always matches the screen.
#[derive(Debug, Default)]
pub struct HitMap {
    cards: Vec<(Rect, TaskId)>,
    columns: Vec<(Rect, TaskStatus)>,
}

impl HitMap {
    /// Drops all regions, ready for the next frame.
    pub fn clear(&mut self) {
        self.cards.clear();
        self.columns.clear();
    }

    /// Registers a card's drawn area.
    pub fn push_card(&mut self, area: Rect, task: TaskId) {
        self.cards.push((area, task));
    }

    /// Registers a column's drawn area.
    pub fn push_column(&mut self, area: Rect, status: TaskStatus) {
        self.columns.push((area, status));
    }

    /// Resolves the drop target under the pointer.
    ///
    /// Containment wins outright, and a contained card beats the column
    /// it is drawn inside. Past that, a card-sized ghost centered on
    /// the pointer is intersected with every region and the largest
    /// overlap wins, cards taking precedence on equal area.
    #[must_use]
    pub fn resolve(&self, x: u16, y: u16) -> Option<DropTarget> {
        if let Some(&(_, task)) = self.cards.iter().find(|(area, _)| contains(*area, x, y)) {
            return Some(DropTarget::Card(task));
        }
        if let Some(&(_, status)) = self.columns.iter().find(|(area, _)| contains(*area, x, y)) {
            return Some(DropTarget::Column(status));
        }

        let ghost = ghost_rect(x, y);
        let mut best: Option<(u32, DropTarget)> = None;
        let targets = self
            .cards
            .iter()
            .map(|&(area, task)| (area, DropTarget::Card(task)))
            .chain(
                self.columns
                    .iter()
                    .map(|&(area, status)| (area, DropTarget::Column(status))),
            );
        for (area, target) in targets {
            let overlap = overlap_area(ghost, area);
            if overlap > 0 && best.is_none_or(|(top, _)| overlap > top) {
                best = Some((overlap, target));
            }
        }
        best.map(|(_, target)| target)
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x
        && x < area.x.saturating_add(area.width)
        && y >= area.y
        && y < area.y.saturating_add(area.height)
}

fn ghost_rect(x: u16, y: u16) -> Rect {
    Rect {
        x: x.saturating_sub(GHOST_WIDTH / 2),
        y: y.saturating_sub(GHOST_HEIGHT / 2),
        width: GHOST_WIDTH,
        height: GHOST_HEIGHT,
    }
}

fn overlap_area(a: Rect, b: Rect) -> u32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = a.x.saturating_add(a.width).min(b.x.saturating_add(b.width));
    let y2 = a
        .y
        .saturating_add(a.height)
        .min(b.y.saturating_add(b.height));
    if x2 > x1 && y2 > y1 {
        u32::from(x2 - x1) * u32::from(y2 - y1)
    } else {
        0
    }
}
