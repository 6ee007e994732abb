//! The live window of materialized thumbnail entries.
//!
//! `ThumbWindow` holds the small slice of the collection that is on screen
//! (or near it), ordered by row number, together with the bounding area of
//! all entries. Entries are created when they enter the near-visible range
//! and destroyed when they leave it; the identity of a surviving entry is
//! observable through its serial, which reconciliation preserves on reuse.

use crate::geometry::{Layout, Mode};
use crate::services::{GroupId, ImageId, RowId};

/// Which sides of a thumbnail carry a group border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupBorders {
    pub left: bool,
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
}

impl GroupBorders {
    pub const NONE: GroupBorders = GroupBorders {
        left: false,
        top: false,
        right: false,
        bottom: false,
    };

    pub fn any(&self) -> bool {
        self.left || self.top || self.right || self.bottom
    }
}

/// One materialized thumbnail entry.
///
/// At most one entry per image id exists in the window at any time.
#[derive(Debug)]
pub struct Thumb {
    pub imgid: ImageId,
    pub rowid: RowId,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub selected: bool,
    pub mouse_over: bool,
    pub group_id: Option<GroupId>,
    /// True when the image belongs to a group with more than one member.
    pub grouped: bool,
    pub borders: GroupBorders,
    /// Set when overlay or preference changes require the host to reload
    /// the entry's info/overlay content before the next paint.
    pub dirty: bool,
    serial: u64,
}

impl Thumb {
    pub(crate) fn new(imgid: ImageId, rowid: RowId, x: i32, y: i32, size: i32, serial: u64) -> Self {
        Thumb {
            imgid,
            rowid,
            x,
            y,
            width: size,
            height: size,
            selected: false,
            mouse_over: false,
            group_id: None,
            grouped: false,
            borders: GroupBorders::NONE,
            dirty: false,
            serial,
        }
    }

    /// Creation identity, preserved when reconciliation reuses the entry.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Bounding rectangle of all window entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Ordered window of thumbnail entries plus the derived bounding area.
///
/// The area is recomputed exactly when membership changes and is never
/// stale when read.
#[derive(Debug, Default)]
pub struct ThumbWindow {
    thumbs: Vec<Thumb>,
    area: Area,
    next_serial: u64,
}

impl ThumbWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.thumbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbs.is_empty()
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn first(&self) -> Option<&Thumb> {
        self.thumbs.first()
    }

    pub fn last(&self) -> Option<&Thumb> {
        self.thumbs.last()
    }

    pub fn get(&self, index: usize) -> Option<&Thumb> {
        self.thumbs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Thumb> {
        self.thumbs.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Thumb> {
        self.thumbs.iter_mut()
    }

    /// Index of the entry holding `imgid`, if materialized.
    pub fn position_of(&self, imgid: ImageId) -> Option<usize> {
        self.thumbs.iter().position(|t| t.imgid == imgid)
    }

    pub fn find(&self, imgid: ImageId) -> Option<&Thumb> {
        self.thumbs.iter().find(|t| t.imgid == imgid)
    }

    /// Entry covering the point `(x, y)`, if any.
    pub fn thumb_at(&self, x: i32, y: i32) -> Option<&Thumb> {
        self.thumbs
            .iter()
            .find(|t| t.x <= x && t.x + t.width > x && t.y <= y && t.y + t.height > y)
    }

    /// Mints a fresh creation serial for a new entry.
    pub(crate) fn alloc_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    /// Inserts an entry before all current ones. The caller guarantees its
    /// row number precedes the current first entry.
    pub(crate) fn push_front(&mut self, thumb: Thumb) {
        debug_assert!(self
            .thumbs
            .first()
            .map(|f| thumb.rowid < f.rowid)
            .unwrap_or(true));
        debug_assert!(self.position_of(thumb.imgid).is_none());
        self.thumbs.insert(0, thumb);
    }

    /// Appends an entry after all current ones. The caller guarantees its
    /// row number follows the current last entry.
    pub(crate) fn push_back(&mut self, thumb: Thumb) {
        debug_assert!(self
            .thumbs
            .last()
            .map(|l| thumb.rowid > l.rowid)
            .unwrap_or(true));
        debug_assert!(self.position_of(thumb.imgid).is_none());
        self.thumbs.push(thumb);
    }

    /// Takes all entries out, leaving the window empty. Used by the full
    /// redraw to diff against the previous state.
    pub(crate) fn take_all(&mut self) -> Vec<Thumb> {
        std::mem::take(&mut self.thumbs)
    }

    /// Swaps in a freshly built ordered list and recomputes the area.
    ///
    /// Reconciliation builds the replacement separately and commits it here
    /// in one step, so re-entrant observers never see a half-updated window.
    pub(crate) fn replace(&mut self, thumbs: Vec<Thumb>, thumb_size: i32) {
        self.thumbs = thumbs;
        self.recompute_area(thumb_size);
    }

    /// Shifts every entry by `(dx, dy)` and moves the area with them.
    pub(crate) fn shift_all(&mut self, dx: i32, dy: i32) {
        for t in &mut self.thumbs {
            t.x += dx;
            t.y += dy;
        }
        self.area.x += dx;
        self.area.y += dy;
    }

    /// Removes entries that are completely outside the viewport.
    /// Returns the number of removed entries.
    pub(crate) fn remove_offscreen(&mut self, layout: &Layout) -> usize {
        let before = self.thumbs.len();
        let size = layout.thumb_size;
        let (vw, vh) = (layout.view_width, layout.view_height);
        let strip = layout.mode == Mode::Strip;
        self.thumbs.retain(|t| {
            let gone_v = t.y + size <= 0 || t.y > vh;
            let gone_h = strip && (t.x + size <= 0 || t.x > vw);
            !(gone_v || gone_h)
        });
        before - self.thumbs.len()
    }

    /// Recomputes the bounding area from scratch.
    pub(crate) fn recompute_area(&mut self, thumb_size: i32) {
        if self.thumbs.is_empty() {
            self.area = Area::default();
            return;
        }
        let mut x1 = i32::MAX;
        let mut y1 = i32::MAX;
        let mut x2 = i32::MIN;
        let mut y2 = i32::MIN;
        for t in &self.thumbs {
            x1 = x1.min(t.x);
            y1 = y1.min(t.y);
            x2 = x2.max(t.x);
            y2 = y2.max(t.y);
        }
        self.area = Area {
            x: x1,
            y: y1,
            width: x2 + thumb_size - x1,
            height: y2 + thumb_size - y1,
        };
    }
}
