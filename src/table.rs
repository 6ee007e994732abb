//! The thumbnail table: offset anchoring, incremental moves and full
//! reconciliation.
//!
//! `ThumbTable` is the stateful core of the grid. It owns the live
//! [`ThumbWindow`](crate::window::ThumbWindow) and keeps it consistent with
//! the collection through two paths: `move_by` shifts the existing entries
//! and fills/prunes the edges (cost proportional to what enters or leaves
//! the screen), while `full_redraw` rebuilds the target range and reconciles
//! it against the previous window by image id so surviving entries keep
//! their identity. The anchor is `offset`, the 1-based collection row of the
//! top-left (grid) or centered (strip) entry; it is persisted across
//! sessions together with the offset image id, which lets a reload re-anchor
//! on the same image even when its row number changed.

use std::rc::Rc;

use tracing::{debug, info};

use crate::act_on::ActOn;
use crate::geometry::{cells_to_cover, Layout, Mode};
use crate::groups;
use crate::services::{ImageId, PointerState, RowId, Services};
use crate::window::{Thumb, ThumbWindow};

/// Persisted anchor row, shared by grid and strip.
pub const SETTING_LAST_OFFSET: &str = "grid/last_offset";
/// Persisted overlay mode.
pub const SETTING_OVERLAYS: &str = "grid/overlays";
/// Persisted grid column count.
pub const SETTING_IMAGES_PER_ROW: &str = "grid/images_per_row";

pub const MAX_ZOOM: i32 = 25;
const DEFAULT_ZOOM: i64 = 5;

/// Bound on the ensure-visible stepping loop. Each step moves at least one
/// row toward the target, so this is only a safety net against a blocked
/// move that still reports progress.
const MAX_ENSURE_STEPS: usize = 32;

/// How thumbnail overlays (rating, labels, filename) are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    Hidden,
    Hover,
    Always,
}

impl OverlayMode {
    fn from_setting(v: i64) -> Self {
        match v {
            0 => OverlayMode::Hidden,
            2 => OverlayMode::Always,
            _ => OverlayMode::Hover,
        }
    }

    fn as_setting(self) -> i64 {
        match self {
            OverlayMode::Hidden => 0,
            OverlayMode::Hover => 1,
            OverlayMode::Always => 2,
        }
    }
}

/// Keyboard navigation moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMove {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Start,
    End,
}

/// How the collection changed, as reported by the host.
#[derive(Debug, Clone)]
pub enum CollectionChange {
    /// Same query, different results: rows were removed, added or reordered.
    /// `changed` lists the images affected; `next` is the first image after
    /// the changed block that survived, if any.
    Reload {
        changed: Vec<ImageId>,
        next: Option<ImageId>,
    },
    /// A different query entirely; the view restarts at the top.
    NewQuery,
}

/// Vertical scrollbar model in fractional row units.
///
/// `position` counts the rows above the viewport (including a partial row
/// when a sub-row move is in effect), `total` the rows of the whole
/// collection and `page` the fully visible rows per screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollbarState {
    pub position: f32,
    pub total: f32,
    pub page: f32,
}

pub struct ThumbTable {
    services: Services,
    pointer: Rc<PointerState>,
    mode: Mode,
    zoom: i32,
    view_width: i32,
    view_height: i32,
    layout: Option<Layout>,
    window: ThumbWindow,
    /// Collection row anchoring the viewport (top-left in grid, centered
    /// in strip).
    offset: RowId,
    /// Image currently at the anchor row, kept to survive row renumbering.
    offset_imgid: Option<ImageId>,
    overlays: OverlayMode,
    /// Consecutive rejected scroll-to-top attempts with a misaligned first
    /// row; past 2 the window is realigned with a full redraw.
    realign_top_try: u8,
    /// Set while a scrollbar-initiated change runs, so state updates it
    /// provokes don't feed back into another scrollbar change.
    code_scrolling: bool,
    /// Set while an ensure-visible sequence runs, so the redraws it causes
    /// don't restart another ensure.
    ensuring: bool,
    drag_list: Option<Vec<ImageId>>,
}

impl ThumbTable {
    pub fn new(services: Services, pointer: Rc<PointerState>) -> Self {
        let zoom = services
            .settings
            .get_int(SETTING_IMAGES_PER_ROW)
            .unwrap_or(DEFAULT_ZOOM)
            .clamp(1, MAX_ZOOM as i64) as i32;
        let offset = services.settings.get_int(SETTING_LAST_OFFSET).unwrap_or(1).max(1);
        let overlays =
            OverlayMode::from_setting(services.settings.get_int(SETTING_OVERLAYS).unwrap_or(1));
        info!(offset, zoom, "Thumb table created");
        Self {
            services,
            pointer,
            mode: Mode::Grid,
            zoom,
            view_width: 0,
            view_height: 0,
            layout: None,
            window: ThumbWindow::new(),
            offset,
            offset_imgid: None,
            overlays,
            realign_top_try: 0,
            code_scrolling: false,
            ensuring: false,
            drag_list: None,
        }
    }

    pub fn window(&self) -> &ThumbWindow {
        &self.window
    }

    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    pub fn offset(&self) -> RowId {
        self.offset
    }

    pub fn offset_image(&self) -> Option<ImageId> {
        self.offset_imgid
    }

    pub fn overlays(&self) -> OverlayMode {
        self.overlays
    }

    /// Updates the viewport size and redraws if the geometry changed.
    pub fn set_viewport(&mut self, width: i32, height: i32) {
        self.view_width = width;
        self.view_height = height;
        self.full_redraw(false);
    }

    /// Switches between grid and strip layout.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.full_redraw(true);
    }

    pub fn set_overlays(&mut self, overlays: OverlayMode) {
        if self.overlays == overlays {
            return;
        }
        self.overlays = overlays;
        self.services
            .settings
            .set_int(SETTING_OVERLAYS, overlays.as_setting());
        for t in self.window.iter_mut() {
            t.dirty = true;
        }
    }

    /// Recomputes the derived layout. Returns true when a redraw is in
    /// order, i.e. the geometry changed or `force` is set; a degenerate
    /// viewport always returns false.
    fn compute_sizes(&mut self, force: bool) -> bool {
        let Some(new) = Layout::compute(self.mode, self.view_width, self.view_height, self.zoom)
        else {
            self.layout = None;
            return false;
        };
        let changed = self.layout != Some(new);
        if changed {
            if self.layout.map(|l| l.thumb_size) != Some(new.thumb_size) {
                // content must be re-rendered at the new size
                for t in self.window.iter_mut() {
                    t.dirty = true;
                }
            }
            self.layout = Some(new);
        }
        changed || force
    }

    fn make_thumb(&mut self, imgid: ImageId, rowid: RowId, x: i32, y: i32, size: i32) -> Thumb {
        let serial = self.window.alloc_serial();
        let mut t = Thumb::new(imgid, rowid, x, y, size, serial);
        if let Some(info) = self.services.images.info(imgid) {
            t.group_id = Some(info.group_id);
            t.grouped = info.grouped;
        }
        t.selected = self.services.selection.is_selected(imgid);
        t
    }

    /// Rebuilds the window from the anchor, reconciling against the current
    /// entries by image id so surviving ones are moved instead of recreated.
    /// Without `force` this is a no-op unless the geometry changed.
    /// Returns true when a rebuild happened.
    pub fn full_redraw(&mut self, force: bool) -> bool {
        if !self.compute_sizes(force) {
            return false;
        }
        let Some(layout) = self.layout else {
            return false;
        };
        self.drag_list = None;

        let per_row = layout.thumbs_per_row as i64;
        let mut posx;
        let mut posy = 0;
        let first_row;
        let mut empty_start: i64 = 0;
        match layout.mode {
            Mode::Grid => {
                posx = layout.center_offset;
                // keep the first row full, whatever the stored anchor
                self.offset = (self.offset - 1) / per_row * per_row + 1;
                first_row = self.offset;
            }
            Mode::Strip => {
                // the anchor is the centered image; load starts half a
                // window earlier, padding with empty slots near row 1
                first_row = (self.offset - layout.rows as i64 / 2).max(1);
                empty_start = -(self.offset - layout.rows as i64 / 2 - 1).min(0);
                posx = (layout.view_width - layout.rows * layout.thumb_size) / 2
                    + empty_start as i32 * layout.thumb_size;
            }
        }

        debug!(
            force,
            w = layout.view_width,
            h = layout.view_height,
            zoom = layout.thumbs_per_row,
            rows = layout.rows,
            size = layout.thumb_size,
            offset = self.offset,
            "Reloading thumbs"
        );

        let wanted = self.services.collection.range(first_row, layout.slots() - empty_start);
        let mut old = self.window.take_all();
        let mut newlist: Vec<Thumb> = Vec::with_capacity(wanted.len());
        let mut created = 0;
        self.offset_imgid = None;

        for (nrow, nid) in wanted {
            if let Some(i) = old.iter().position(|t| t.imgid == nid) {
                let mut t = old.swap_remove(i);
                t.rowid = nrow; // may have changed on reload
                t.x = posx;
                t.y = posy;
                if t.width != layout.thumb_size {
                    t.width = layout.thumb_size;
                    t.height = layout.thumb_size;
                    t.dirty = true;
                }
                newlist.push(t);
            } else {
                let t = self.make_thumb(nid, nrow, posx, posy, layout.thumb_size);
                newlist.push(t);
                created += 1;
            }
            if nrow == self.offset {
                self.offset_imgid = Some(nid);
            }
            let (nx, ny) = layout.next_pos(posx, posy);
            posx = nx;
            posy = ny;
        }
        drop(old); // entries with no counterpart in the new range
        self.window.replace(newlist, layout.thumb_size);
        if self.offset_imgid.is_none() {
            self.offset_imgid = self.services.collection.image_at(self.offset);
        }
        debug!(created, reused = self.window.len() - created, "Thumbs reloaded");

        // arriving in the grid with a selection (typically from the strip),
        // bring the first selected image on screen
        if layout.mode == Mode::Grid && !self.ensuring {
            if let Some(first_sel) = self.services.selection.first_id() {
                self.ensuring = true;
                self.ensure_visible(first_sel);
                self.ensuring = false;
            }
        }

        groups::refresh_selection(&mut self.window, &*self.services.selection);
        if let Some(layout) = self.layout {
            groups::refresh_hover(&mut self.window, &layout, self.services.view.hover_id());
        }
        true
    }

    /// Shifts the window by `(x, y)` pixels, filling and pruning the edges.
    ///
    /// With `clamp`, the move is validated against the collection bounds
    /// first: no scrolling above row 1 or past the last image, and only the
    /// mode's scroll axis is honored. Returns false when nothing moved.
    pub fn move_by(&mut self, x: i32, y: i32, clamp: bool) -> bool {
        if self.window.is_empty() {
            return false;
        }
        let Some(layout) = self.layout else {
            return false;
        };
        let mut posx = x;
        let mut posy = y;

        if clamp {
            match layout.mode {
                Mode::Grid => {
                    posx = 0;
                    if posy == 0 {
                        return false;
                    }
                    let (first_rowid, first_x, first_y) = {
                        let f = self.window.first().expect("window not empty");
                        (f.rowid, f.x, f.y)
                    };
                    // stop when row 1 is fully shown
                    if first_rowid == 1 && posy > 0 && first_y >= 0 {
                        // the top row can end up misaligned (e.g. after a
                        // strip/grid transition); count the blocked tries
                        // and realign with a full redraw past 2
                        if first_x != layout.center_offset {
                            self.realign_top_try += 1;
                            if self.realign_top_try > 2 {
                                self.realign_top_try = 0;
                                self.full_redraw(true);
                                return true;
                            }
                        }
                        return false;
                    }
                    self.realign_top_try = 0;

                    let (last_rowid, last_y) = {
                        let l = self.window.last().expect("window not empty");
                        (l.rowid, l.y)
                    };
                    if layout.thumbs_per_row == 1 && posy < 0 && self.window.len() == 1 {
                        // single column: never leave empty space under the
                        // last image, it would vanish from screen
                        if self.services.collection.count() <= last_rowid {
                            return false;
                        }
                    } else if last_y + layout.thumb_size < layout.view_height
                        && posy < 0
                        && self.window.area().y == 0
                    {
                        // last image fully shown and top row aligned
                        return false;
                    }
                }
                Mode::Strip => {
                    posy = 0;
                    if posx == 0 {
                        return false;
                    }
                    let first = self.window.first().expect("window not empty");
                    if first.rowid == 1
                        && posx > 0
                        && first.x >= layout.view_width / 2 - layout.thumb_size
                    {
                        return false;
                    }
                    let last = self.window.last().expect("window not empty");
                    if last.x < layout.view_width / 2 && posx < 0 {
                        return false;
                    }
                }
            }
        }
        if posx == 0 && posy == 0 {
            return false;
        }

        let old_area_y = self.window.area().y;
        self.window.shift_all(posx, posy);

        let mut changed = self.load_needed(layout);
        changed += self.window.remove_offscreen(&layout);
        if changed > 0 {
            self.window.recompute_area(layout.thumb_size);
        }

        match layout.mode {
            Mode::Grid => {
                // the pre-move area offset accounts for a pending sub-row
                // scroll position
                let rows_moved = ((posy + old_area_y) / layout.thumb_size) as i64;
                self.offset = (self.offset - rows_moved * layout.thumbs_per_row as i64).max(1);
            }
            Mode::Strip => {
                self.offset = (self.offset - (posx / layout.thumb_size) as i64).max(1);
            }
        }
        self.offset_imgid = self.services.collection.image_at(self.offset);
        self.services.settings.set_int(SETTING_LAST_OFFSET, self.offset);
        true
    }

    /// Materializes entries for the space uncovered at either edge of the
    /// window. Returns the number of created entries.
    fn load_needed(&mut self, layout: Layout) -> usize {
        if self.window.is_empty() {
            return 0;
        }
        let mut changed = 0;
        let per_row = layout.thumbs_per_row as i64;

        // space opened up before the first entry
        let (first_rowid, first_x, first_y) = {
            let f = self.window.first().expect("window not empty");
            (f.rowid, f.x, f.y)
        };
        let leading = match layout.mode {
            Mode::Grid => first_y,
            Mode::Strip => first_x,
        };
        if first_rowid > 1 && leading > 0 {
            let nb = cells_to_cover(leading, layout.thumb_size);
            let before = self
                .services
                .collection
                .range_before(first_rowid, nb as i64 * per_row);
            let (mut posx, mut posy) = layout.prev_pos(first_x, first_y);
            for (nrow, nid) in before {
                if posy < layout.view_height {
                    let t = self.make_thumb(nid, nrow, posx, posy, layout.thumb_size);
                    self.window.push_front(t);
                    changed += 1;
                }
                let p = layout.prev_pos(posx, posy);
                posx = p.0;
                posy = p.1;
            }
        }

        // space left after the last entry; a partial last row means the
        // collection end is already on screen
        let (last_rowid, last_x, last_y) = {
            let l = self.window.last().expect("window not empty");
            (l.rowid, l.x, l.y)
        };
        let (wanted, space) = match layout.mode {
            Mode::Grid => (
                last_y + layout.thumb_size < layout.view_height
                    && last_x >= layout.thumb_size * (layout.thumbs_per_row - 1),
                layout.view_height - (last_y + layout.thumb_size),
            ),
            Mode::Strip => (
                last_x + layout.thumb_size < layout.view_width,
                layout.view_width - (last_x + layout.thumb_size),
            ),
        };
        if wanted {
            let nb = cells_to_cover(space, layout.thumb_size);
            let after = self
                .services
                .collection
                .range(last_rowid + 1, nb as i64 * per_row);
            let (mut posx, mut posy) = layout.next_pos(last_x, last_y);
            for (nrow, nid) in after {
                if posy + layout.thumb_size >= 0 {
                    let t = self.make_thumb(nid, nrow, posx, posy, layout.thumb_size);
                    self.window.push_back(t);
                    changed += 1;
                }
                let p = layout.next_pos(posx, posy);
                posx = p.0;
                posy = p.1;
            }
        }
        changed
    }

    /// Applies a wheel step: one row in grid mode (snapping back to full-row
    /// alignment when a sub-row scroll is pending), one thumbnail in strip
    /// mode. Negative delta scrolls toward row 1. The hovered image is
    /// re-resolved from the pointer afterwards.
    pub fn scroll(&mut self, delta: i32) -> bool {
        let Some(layout) = self.layout else {
            return false;
        };
        let moved = match (layout.mode, delta < 0) {
            (Mode::Grid, true) => {
                let area_y = self.window.area().y;
                let step = if area_y == 0 { layout.thumb_size } else { -area_y };
                self.move_by(0, step, true)
            }
            (Mode::Grid, false) => {
                let area_y = self.window.area().y;
                self.move_by(0, -layout.thumb_size - area_y, true)
            }
            (Mode::Strip, true) => self.move_by(layout.thumb_size, 0, true),
            (Mode::Strip, false) => self.move_by(-layout.thumb_size, 0, true),
        };
        if moved && self.pointer.inside() {
            let (px, py) = self.pointer.position();
            if let Some(id) = self.window.thumb_at(px, py).map(|t| t.imgid) {
                self.services.view.set_hover_id(Some(id));
                self.hover_changed();
            }
        }
        moved
    }

    /// Current vertical scrollbar model, grid mode only.
    pub fn scrollbar_state(&self) -> Option<ScrollbarState> {
        let layout = self.layout?;
        if layout.mode != Mode::Grid {
            return None;
        }
        let per_row = layout.thumbs_per_row as i64;
        let nbid = self.services.collection.count().max(1);

        let mut before = ((self.offset - 1) / per_row) as f32;
        if (self.offset - 1) % per_row != 0 {
            before += 1.0;
        }
        let area_y = self.window.area().y;
        if area_y != 0 {
            before += -(area_y as f32) / layout.thumb_size as f32;
        }
        let mut after = ((nbid - self.offset) / per_row) as f32;
        if (nbid - self.offset) % per_row != 0 {
            after += 1.0;
        }
        Some(ScrollbarState {
            position: before,
            total: before + after,
            page: (layout.rows - 1) as f32,
        })
    }

    /// Jumps to an absolute scrollbar position in fractional row units: the
    /// integral part picks the top row, the fractional part becomes a
    /// sub-row pixel shift so dragging the bar scrolls smoothly.
    pub fn scrollbar_changed(&mut self, y: f32) {
        if self.window.is_empty() || self.code_scrolling {
            return;
        }
        let Some(layout) = self.layout else {
            return;
        };
        if layout.mode != Mode::Grid {
            return;
        }
        self.code_scrolling = true;

        let per_row = layout.thumbs_per_row as i64;
        let first_offset = (self.offset - 1) % per_row;
        let line = y.floor() as i64;
        self.offset = if first_offset == 0 {
            // first line is full, so it's counted
            1 + line * per_row
        } else if line == 0 {
            1
        } else {
            first_offset + (line - 1) * per_row
        }
        .max(1);
        self.full_redraw(true);

        let sub_row = (y - y.floor()) * layout.thumb_size as f32;
        self.move_by(0, -(sub_row as i32), false);

        self.code_scrolling = false;
    }

    /// Moves the anchor to `offset`, optionally redrawing now.
    pub fn set_offset(&mut self, offset: RowId, redraw: bool) -> bool {
        if offset < 1 || offset == self.offset {
            return false;
        }
        self.offset = offset;
        self.services.settings.set_int(SETTING_LAST_OFFSET, offset);
        if redraw {
            self.full_redraw(true);
        }
        true
    }

    /// Anchors the view on a specific image.
    pub fn set_offset_image(&mut self, imgid: ImageId, redraw: bool) -> bool {
        self.offset_imgid = Some(imgid);
        let row = self.services.collection.row_of(imgid).unwrap_or(0);
        self.set_offset(row, redraw)
    }

    /// Scrolls forward so the first shown row starts a fresh alignment
    /// cycle. Grid mode only.
    pub fn reset_first_offset(&mut self) -> bool {
        if self.mode != Mode::Grid || self.window.is_empty() {
            return false;
        }
        let Some(layout) = self.layout else {
            return false;
        };
        let per_row = layout.thumbs_per_row as i64;
        let first_rowid = self.window.first().expect("window not empty").rowid;
        let shift = per_row - (first_rowid - 1) % per_row;
        if shift == 0 {
            return false;
        }
        self.set_offset(self.offset + shift, true)
    }

    /// Changes the grid column count, keeping the image under the pointer
    /// (or the hovered / centered / first image) anchored on screen.
    pub fn set_zoom(&mut self, zoom: i32) {
        let zoom = zoom.clamp(1, MAX_ZOOM);
        if zoom == self.zoom {
            return;
        }
        if self.mode == Mode::Grid && !self.window.is_empty() {
            self.zoom_around(zoom);
        }
        self.zoom = zoom;
        self.services
            .settings
            .set_int(SETTING_IMAGES_PER_ROW, zoom as i64);
        self.full_redraw(false);
    }

    /// The point and row the zoom should pivot on.
    fn zoom_anchor(&self) -> Option<(i32, i32, RowId)> {
        if self.pointer.inside() {
            let (x, y) = self.pointer.position();
            if let Some(t) = self.window.thumb_at(x, y) {
                return Some((x, y, t.rowid));
            }
        }
        if let Some(id) = self.services.view.hover_id() {
            if let Some(t) = self.window.find(id) {
                return Some((t.x + t.width / 2, t.y + t.height / 2, t.rowid));
            }
        }
        let layout = self.layout?;
        let (cx, cy) = (layout.view_width / 2, layout.view_height / 2);
        if let Some(t) = self.window.thumb_at(cx, cy) {
            return Some((cx, cy, t.rowid));
        }
        self.window
            .first()
            .map(|t| (t.x + t.width / 2, t.y + t.height / 2, t.rowid))
    }

    fn zoom_around(&mut self, newzoom: i32) {
        let Some(layout) = self.layout else {
            return;
        };
        let Some((x, y, rowid)) = self.zoom_anchor() else {
            return;
        };
        let new_size = layout.view_width / newzoom;
        if new_size <= 0 {
            return;
        }
        // cells that will precede the anchor at the new zoom
        let new_pos = (y / new_size) as i64 * newzoom as i64 + (x / new_size) as i64;
        self.set_offset(rowid - new_pos, false);
    }

    /// Keyboard navigation. The hovered image is the navigation base; on
    /// the very first move with no hover, the anchor row is adopted without
    /// moving (page and start/end keys move right away). With `select`,
    /// the base image is selected first and the selection extended to the
    /// target afterwards.
    pub fn key_move(&mut self, mv: KeyMove, select: bool) -> bool {
        let Some(layout) = self.layout else {
            return false;
        };
        let mut baseid = self.services.view.hover_id();
        let first_move = baseid.is_none();
        if select {
            if let Some(id) = baseid {
                self.services.selection.select(id);
            }
        }

        let mut newrow: Option<RowId> = None;
        if first_move {
            newrow = Some(self.offset);
            baseid = self.offset_imgid;
        }
        if !first_move
            || matches!(
                mv,
                KeyMove::PageUp | KeyMove::PageDown | KeyMove::Start | KeyMove::End
            )
        {
            let per_row = layout.thumbs_per_row as i64;
            let page = per_row * (layout.rows as i64 - 1);
            let baserow = baseid
                .and_then(|id| self.services.collection.row_of(id))
                .unwrap_or(1);
            let maxrow = self.services.collection.max_row().max(1);
            newrow = Some(match mv {
                KeyMove::Left => (baserow - 1).max(1),
                KeyMove::Right => (baserow + 1).min(maxrow),
                KeyMove::Up => (baserow - per_row).max(1),
                KeyMove::Down => (baserow + per_row).min(maxrow),
                KeyMove::PageUp => {
                    let mut n = baserow - page;
                    while n < 1 {
                        n += per_row;
                    }
                    if n == baserow {
                        1
                    } else {
                        n
                    }
                }
                KeyMove::PageDown => {
                    let mut n = baserow + page;
                    while n > maxrow {
                        n -= per_row;
                    }
                    if n == baserow {
                        maxrow
                    } else {
                        n
                    }
                }
                KeyMove::Start => 1,
                KeyMove::End => maxrow,
            });
        }

        let imgid = newrow.and_then(|r| self.services.collection.image_at(r));
        self.services.view.set_hover_id(imgid);
        self.hover_changed();

        if let Some(row) = newrow {
            self.ensure_row_visible(row);
        }
        if select {
            if let Some(id) = imgid {
                self.services.selection.select_range(id);
                self.selection_changed();
            }
        }
        true
    }

    /// Scrolls, one step at a time, until `row` is fully visible or a move
    /// is rejected (collection bound reached).
    pub fn ensure_row_visible(&mut self, row: RowId) -> bool {
        let row = row.max(1);
        for _ in 0..MAX_ENSURE_STEPS {
            if self.window.is_empty() {
                return false;
            }
            let Some(layout) = self.layout else {
                return false;
            };
            match layout.mode {
                Mode::Grid => {
                    let per_row = layout.thumbs_per_row as i64;
                    let first_rowid = self.window.first().expect("window not empty").rowid;
                    let last_rowid = self.grid_last_fully_visible().rowid;
                    if first_rowid > row {
                        let rows = ((first_rowid - row) / per_row).max(1) as i32;
                        if !self.move_by(0, rows * layout.thumb_size, true) {
                            return false;
                        }
                    } else if last_rowid < row {
                        let rows = ((row - last_rowid) / per_row).max(1) as i32;
                        if !self.move_by(0, -rows * layout.thumb_size, true) {
                            return false;
                        }
                    } else {
                        return true;
                    }
                }
                Mode::Strip => {
                    let first_rowid = self.window.first().expect("window not empty").rowid;
                    let last_rowid = self.window.last().expect("window not empty").rowid;
                    if row < first_rowid {
                        let step = (first_rowid - row).max(1) as i32 * layout.thumb_size;
                        if !self.move_by(step, 0, true) {
                            return false;
                        }
                    } else if row > last_rowid {
                        let step = (row - last_rowid).max(1) as i32 * layout.thumb_size;
                        if !self.move_by(-step, 0, true) {
                            return false;
                        }
                    } else {
                        let (x, width) = match self.window.iter().find(|t| t.rowid == row) {
                            Some(t) => (t.x, t.width),
                            None => return false,
                        };
                        if x < 0 {
                            if !self.move_by(-x, 0, true) {
                                return false;
                            }
                        } else if x + width > layout.view_width {
                            if !self.move_by(layout.view_width - x - width, 0, true) {
                                return false;
                            }
                        } else {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Scrolls until `imgid` is fully visible.
    pub fn ensure_visible(&mut self, imgid: ImageId) -> bool {
        if imgid < 1 {
            return false;
        }
        match self.services.collection.row_of(imgid) {
            Some(row) => self.ensure_row_visible(row),
            None => false,
        }
    }

    /// Whether the image is currently fully visible.
    pub fn check_visible(&self, imgid: ImageId) -> bool {
        if imgid < 1 || self.window.is_empty() {
            return false;
        }
        let Some(layout) = self.layout else {
            return false;
        };
        let Some(row) = self.services.collection.row_of(imgid) else {
            return false;
        };
        match layout.mode {
            Mode::Grid => {
                let first = self.window.first().expect("window not empty");
                let last = self.grid_last_fully_visible();
                first.rowid <= row && last.rowid >= row
            }
            Mode::Strip => self
                .window
                .iter()
                .find(|t| t.rowid == row)
                .map(|t| t.x >= 0 && t.x + t.width <= layout.view_width)
                .unwrap_or(false),
        }
    }

    /// Last entry of the last fully visible grid row (the bottom window row
    /// may be only partially on screen).
    fn grid_last_fully_visible(&self) -> &Thumb {
        let layout = self.layout.expect("grid layout present");
        let pos = (self.window.len() - 1)
            .min(((layout.thumbs_per_row * (layout.rows - 1)).max(1) - 1) as usize);
        self.window.get(pos).expect("window not empty")
    }

    /// Re-reads selection flags for all entries. Returns the number that
    /// changed.
    pub fn selection_changed(&mut self) -> usize {
        groups::refresh_selection(&mut self.window, &*self.services.selection)
    }

    /// Re-applies the hover flag and group borders after the hovered image
    /// changed. Returns true when a repaint is needed.
    pub fn hover_changed(&mut self) -> bool {
        let Some(layout) = self.layout else {
            return false;
        };
        groups::refresh_hover(&mut self.window, &layout, self.services.view.hover_id())
    }

    /// Full rebuild after a preference change; every entry also reloads its
    /// rendered content.
    pub fn preferences_changed(&mut self) {
        self.full_redraw(true);
        for t in self.window.iter_mut() {
            t.dirty = true;
        }
    }

    /// Reacts to a collection content change, keeping the anchor on the
    /// same image when it survived and falling back to the nearest
    /// surviving neighbor otherwise.
    pub fn collection_changed(&mut self, change: CollectionChange) {
        match change {
            CollectionChange::NewQuery => {
                self.offset = 1;
                self.offset_imgid = self.services.collection.image_at(1);
                self.services.settings.set_int(SETTING_LAST_OFFSET, 1);
                self.full_redraw(true);
            }
            CollectionChange::Reload { changed, next } => {
                self.reload(&changed, next);
            }
        }
    }

    fn reload(&mut self, changed: &[ImageId], next: Option<ImageId>) {
        let old_hover = self.services.view.hover_id();

        // the strip follows the selection: re-anchor on the first selected
        // image first, remembering where we were
        let mut saved_anchor: Option<ImageId> = None;
        if self.mode == Mode::Strip {
            if let Some(selid) = self.services.selection.first_id() {
                if Some(selid) != self.offset_imgid {
                    saved_anchor = self.offset_imgid;
                    self.offset = self.services.collection.row_of(selid).unwrap_or(1);
                    self.offset_imgid = Some(selid);
                    self.full_redraw(true);
                }
            }
        }

        let mut newid = self
            .offset_imgid
            .or_else(|| self.services.collection.image_at(self.offset));

        // if the anchor image is in the changed list and its row moved, it
        // was reordered away; anchor on the next untouched image instead
        if let (Some(id), Some(n)) = (self.offset_imgid, next) {
            if changed.contains(&id) && self.services.collection.row_of(id) != Some(self.offset) {
                newid = Some(n);
            }
        }

        let mut nrow = newid.and_then(|id| self.services.collection.row_of(id));

        // the anchor image vanished from the collection; the old window
        // still lists its neighbors, pick the first surviving one after it,
        // then before it
        if nrow.is_none() {
            if let Some(pos) = newid.and_then(|id| self.window.position_of(id)) {
                for i in pos + 1..self.window.len() {
                    let cand = self.window.get(i).expect("index in range").imgid;
                    if let Some(r) = self.services.collection.row_of(cand) {
                        newid = Some(cand);
                        nrow = Some(r);
                        break;
                    }
                }
                if nrow.is_none() {
                    for i in (0..pos).rev() {
                        let cand = self.window.get(i).expect("index in range").imgid;
                        if let Some(r) = self.services.collection.row_of(cand) {
                            newid = Some(cand);
                            nrow = Some(r);
                            break;
                        }
                    }
                }
            }
        }

        let offset_changed = nrow.unwrap_or(1).max(1) != self.offset;
        match nrow.filter(|r| *r >= 1) {
            Some(r) => {
                self.offset_imgid = newid;
                self.offset = r;
            }
            None => {
                self.offset_imgid = self.services.collection.image_at(1);
                self.offset = 1;
            }
        }
        if offset_changed {
            self.services.settings.set_int(SETTING_LAST_OFFSET, self.offset);
        }
        self.full_redraw(true);

        // restore the strip position if the saved image is still around
        if let Some(old) = saved_anchor {
            if Some(old) != self.offset_imgid {
                if let Some(r) = self.services.collection.row_of(old) {
                    self.offset = r;
                    self.offset_imgid = Some(old);
                    self.full_redraw(true);
                }
            }
        }

        // if the previously hovered image is gone, hover its successor;
        // skipped when the pointer is elsewhere and active images rule
        if let (Some(old_h), Some(n)) = (old_hover, next) {
            if self.pointer.inside() || self.services.view.active_images().is_empty() {
                let old_present = self.window.find(old_h).is_some();
                let next_present = self.window.find(n).is_some();
                if !old_present && next_present {
                    self.services.view.set_hover_id(Some(n));
                    self.hover_changed();
                }
            }
        }
    }

    /// Starts a drag with the current act-on set (in collection order).
    /// Returns the number of dragged images.
    pub fn begin_drag(&mut self, act_on: &ActOn) -> usize {
        let list = act_on.images(true, false, true);
        let n = list.len();
        debug!(count = n, "Drag started");
        self.drag_list = Some(list);
        n
    }

    pub fn drag_ids(&self) -> &[ImageId] {
        self.drag_list.as_deref().unwrap_or(&[])
    }

    pub fn end_drag(&mut self) {
        self.drag_list = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Selection, Settings, SharedViewState, ViewState};
    use crate::store::{store_services, GridStore};
    use std::path::Path;

    struct Fixture {
        store: Rc<GridStore>,
        view: Rc<SharedViewState>,
        pointer: Rc<PointerState>,
        table: ThumbTable,
    }

    /// n standalone images, ids 1..=n, collected in order. No viewport yet.
    fn fixture(n: i64) -> Fixture {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = Rc::new(GridStore::open_in_memory().unwrap());
        for id in 1..=n {
            store
                .upsert_image(id, id, Path::new(&format!("/p/{id}.jpg")))
                .unwrap();
        }
        store.set_collection(&(1..=n).collect::<Vec<_>>()).unwrap();

        let view = SharedViewState::new();
        let pointer = PointerState::new();
        let services = store_services(store.clone(), view.clone());
        let table = ThumbTable::new(services, pointer.clone());
        Fixture {
            store,
            view,
            pointer,
            table,
        }
    }

    /// 500x250 viewport, default zoom 5: thumb 100, 5 columns, 3 rows.
    fn grid_fixture(n: i64) -> Fixture {
        let mut f = fixture(n);
        f.table.set_viewport(500, 250);
        f
    }

    fn window_rows(table: &ThumbTable) -> Vec<RowId> {
        table.window().iter().map(|t| t.rowid).collect()
    }

    #[test]
    fn full_redraw_lays_out_two_full_rows() {
        let f = grid_fixture(10);
        let layout = f.table.layout().unwrap();
        assert_eq!(layout.thumb_size, 100);
        assert_eq!(layout.thumbs_per_row, 5);

        assert_eq!(f.table.window().len(), 10);
        assert_eq!(f.table.offset(), 1);
        assert_eq!(f.table.offset_image(), Some(1));

        let first = f.table.window().find(1).unwrap();
        assert_eq!((first.x, first.y), (0, 0));
        let sixth = f.table.window().find(6).unwrap();
        assert_eq!((sixth.x, sixth.y), (0, 100));
    }

    #[test]
    fn degenerate_viewport_is_ignored() {
        let mut f = fixture(10);
        f.table.set_viewport(10, 10);
        assert!(f.table.layout().is_none());
        assert!(f.table.window().is_empty());
        assert!(!f.table.move_by(0, -100, true));
    }

    #[test]
    fn redraw_is_idempotent_and_preserves_identity() {
        let mut f = grid_fixture(10);
        let before: Vec<(ImageId, RowId, i32, i32, u64)> = f
            .table
            .window()
            .iter()
            .map(|t| (t.imgid, t.rowid, t.x, t.y, t.serial()))
            .collect();

        assert!(f.table.full_redraw(true));
        let after: Vec<(ImageId, RowId, i32, i32, u64)> = f
            .table
            .window()
            .iter()
            .map(|t| (t.imgid, t.rowid, t.x, t.y, t.serial()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reconciliation_reuses_overlapping_entries() {
        let mut f = grid_fixture(30);
        let serial_6 = f.table.window().find(6).unwrap().serial();
        assert!(f.table.window().find(1).is_some());

        f.table.set_offset(6, true);
        assert_eq!(f.table.offset(), 6);
        // image 6 survived the redraw with its identity intact
        assert_eq!(f.table.window().find(6).unwrap().serial(), serial_6);
        assert!(f.table.window().find(1).is_none());
        assert_eq!(f.table.offset_image(), Some(6));
    }

    #[test]
    fn move_is_rejected_at_collection_end() {
        let mut f = grid_fixture(10);
        // the whole collection is on screen, nothing to scroll to
        assert!(!f.table.move_by(0, -100, true));
        assert_eq!(f.table.offset(), 1);
    }

    #[test]
    fn move_is_rejected_at_top() {
        let mut f = grid_fixture(30);
        assert!(!f.table.move_by(0, 100, true));
        assert_eq!(f.table.offset(), 1);
    }

    #[test]
    fn unclamped_move_allows_sub_row_shift() {
        let mut f = grid_fixture(30);
        assert!(f.table.move_by(0, -50, false));
        assert_eq!(f.table.window().area().y, -50);
        // less than a full row: the anchor stays put
        assert_eq!(f.table.offset(), 1);
    }

    #[test]
    fn scroll_steps_one_row_and_back() {
        let mut f = grid_fixture(30);
        assert!(f.table.scroll(1));
        assert_eq!(f.table.offset(), 6);
        assert_eq!(f.table.offset_image(), Some(6));
        assert_eq!(f.table.window().first().unwrap().rowid, 6);
        assert_eq!(f.table.window().area().y, 0);

        assert!(f.table.scroll(-1));
        assert_eq!(f.table.offset(), 1);
        assert_eq!(f.table.window().find(1).unwrap().y, 0);
    }

    #[test]
    fn window_rows_stay_contiguous_under_moves() {
        let mut f = grid_fixture(100);
        for dy in [-100, -250, 130, -70, -500, 400, -300, 250, -90] {
            f.table.move_by(0, dy, true);
            let rows = window_rows(&f.table);
            assert!(!rows.is_empty());
            for pair in rows.windows(2) {
                assert_eq!(pair[1], pair[0] + 1, "gap after move {dy}: {rows:?}");
            }
            assert!(*rows.first().unwrap() >= 1);
            assert!(*rows.last().unwrap() <= 100);
        }
    }

    #[test]
    fn scrollbar_state_reflects_position() {
        let f = grid_fixture(30);
        let s = f.table.scrollbar_state().unwrap();
        assert_eq!(s.position, 0.0);
        assert_eq!(s.total, 6.0);
        assert_eq!(s.page, 2.0);
    }

    #[test]
    fn scrollbar_jump_to_line() {
        let mut f = grid_fixture(30);
        f.table.scrollbar_changed(2.0);
        assert_eq!(f.table.offset(), 11);
        assert_eq!(f.table.window().first().unwrap().rowid, 11);
        assert_eq!(f.table.scrollbar_state().unwrap().position, 2.0);
    }

    #[test]
    fn scrollbar_fraction_shifts_sub_row() {
        let mut f = grid_fixture(30);
        f.table.scrollbar_changed(1.5);
        assert_eq!(f.table.offset(), 6);
        assert_eq!(f.table.window().area().y, -50);
        assert_eq!(f.table.scrollbar_state().unwrap().position, 1.5);
    }

    #[test]
    fn key_move_navigates_and_selects() {
        let mut f = grid_fixture(30);
        // no hover yet: the first move only adopts the anchor
        assert!(f.table.key_move(KeyMove::Right, false));
        assert_eq!(f.view.hover_id(), Some(1));

        assert!(f.table.key_move(KeyMove::Right, false));
        assert_eq!(f.view.hover_id(), Some(2));
        assert!(f.table.key_move(KeyMove::Down, false));
        assert_eq!(f.view.hover_id(), Some(7));
        assert!(f.table.key_move(KeyMove::Left, false));
        assert_eq!(f.view.hover_id(), Some(6));

        // shift-style selection from 6 to 8
        assert!(f.table.key_move(KeyMove::Right, true));
        assert!(f.table.key_move(KeyMove::Right, true));
        assert_eq!(f.store.ids(true, true), vec![6, 7, 8]);
        assert!(f.table.window().find(7).unwrap().selected);
    }

    #[test]
    fn key_move_page_and_end() {
        let mut f = grid_fixture(100);
        f.view.set_hover_id(Some(1));
        assert!(f.table.key_move(KeyMove::PageDown, false));
        // a page is (rows - 1) * columns = 10
        assert_eq!(f.view.hover_id(), Some(11));

        assert!(f.table.key_move(KeyMove::End, false));
        assert_eq!(f.view.hover_id(), Some(100));
        assert!(f.table.check_visible(100));

        assert!(f.table.key_move(KeyMove::Start, false));
        assert_eq!(f.view.hover_id(), Some(1));
        assert!(f.table.check_visible(1));
    }

    #[test]
    fn ensure_visible_scrolls_far_targets_on_screen() {
        let mut f = grid_fixture(100);
        assert!(!f.table.check_visible(97));
        assert!(f.table.ensure_visible(97));
        assert!(f.table.check_visible(97));
        // and back up
        assert!(f.table.ensure_visible(3));
        assert!(f.table.check_visible(3));
    }

    #[test]
    fn strip_key_move_right_scrolls_edge_into_view() {
        let mut f = fixture(10);
        f.table.set_mode(Mode::Strip);
        f.table.set_viewport(500, 100);
        f.view.set_hover_id(Some(5));
        f.table.ensure_visible(5);

        assert!(f.table.key_move(KeyMove::Right, false));
        assert_eq!(f.view.hover_id(), Some(6));
        let t = f.table.window().find(6).unwrap();
        assert!(t.x >= 0 && t.x + t.width <= 500);
        assert!(f.table.check_visible(6));
    }

    #[test]
    fn strip_centers_anchor_row() {
        let mut f = fixture(20);
        f.table.set_mode(Mode::Strip);
        f.table.set_viewport(500, 100);
        f.table.set_offset(10, true);
        // the anchor sits in the middle slot of the viewport
        let t = f.table.window().iter().find(|t| t.rowid == 10).unwrap();
        assert_eq!(t.x, 200);
        assert_eq!(f.table.offset_image(), Some(10));
    }

    #[test]
    fn strip_reload_follows_selection_and_restores_anchor() {
        let mut f = fixture(20);
        f.table.set_mode(Mode::Strip);
        f.table.set_viewport(500, 100);
        f.table.set_offset_image(10, true);
        f.store.select(4);

        // the anchor image survived: the strip jumps to the selection and
        // then comes back to it
        f.table.collection_changed(CollectionChange::Reload {
            changed: vec![],
            next: None,
        });
        assert_eq!(f.table.offset_image(), Some(10));
        assert_eq!(f.table.offset(), 10);

        // the anchor image is gone: the strip stays on the selection
        let remaining: Vec<ImageId> = (1..=20).filter(|id| *id != 10).collect();
        f.store.set_collection(&remaining).unwrap();
        f.table.collection_changed(CollectionChange::Reload {
            changed: vec![10],
            next: Some(11),
        });
        assert_eq!(f.table.offset_image(), Some(4));
        assert_eq!(f.table.offset(), 4);
    }

    #[test]
    fn single_column_never_scrolls_past_last_image() {
        let mut f = fixture(3);
        f.table.set_zoom(1);
        f.table.set_viewport(120, 150);

        f.table.set_offset(3, true);
        assert_eq!(f.table.window().len(), 1);
        // the last image alone on screen, nothing below to scroll to
        assert!(!f.table.move_by(0, -50, true));
        assert_eq!(f.table.offset(), 3);

        // one row earlier the same scroll still has somewhere to go
        f.table.set_offset(2, true);
        assert!(f.table.move_by(0, -120, true));
        assert_eq!(f.table.offset(), 3);
    }

    #[test]
    fn misaligned_top_row_realigns_after_blocked_scrolls() {
        let mut f = fixture(30);
        // 512 / 5 leaves a centering offset of one pixel
        f.table.set_viewport(512, 250);
        let center = f.table.layout().unwrap().center_offset;
        assert_eq!(center, 1);

        // knock the columns off their resting positions
        assert!(f.table.move_by(7, 0, false));
        assert_ne!(f.table.window().first().unwrap().x, center);

        // upward scrolls at row 1 are rejected twice, the third one snaps
        // the grid back into alignment
        assert!(!f.table.move_by(0, 100, true));
        assert!(!f.table.move_by(0, 100, true));
        assert!(f.table.move_by(0, 100, true));
        let first = f.table.window().first().unwrap();
        assert_eq!(first.x, center);
        assert_eq!(first.y, 0);
        assert_eq!(f.table.offset(), 1);
    }

    #[test]
    fn zoom_keeps_hovered_image_near_anchor() {
        let mut f = grid_fixture(30);
        f.view.set_hover_id(Some(13));
        f.table.set_zoom(2);

        assert_eq!(f.table.zoom(), 2);
        let layout = f.table.layout().unwrap();
        assert_eq!(layout.thumbs_per_row, 2);
        assert_eq!(layout.thumb_size, 250);
        // the hovered image's neighborhood stays on screen
        assert_eq!(f.table.offset(), 9);
        assert!(f.table.window().find(12).is_some());
        assert_eq!(f.store.get_int(SETTING_IMAGES_PER_ROW), Some(2));
    }

    #[test]
    fn collection_reload_follows_surviving_anchor() {
        let mut f = grid_fixture(20);
        f.table.set_offset(6, true);
        assert_eq!(f.table.offset_image(), Some(6));

        // images 1..3 leave the collection; image 6 moves up to row 3
        f.store.set_collection(&(4..=20).collect::<Vec<_>>()).unwrap();
        f.table.collection_changed(CollectionChange::Reload {
            changed: vec![1, 2, 3],
            next: Some(4),
        });
        // image 6 is now row 3; the grid snaps to its line start
        assert_eq!(f.table.offset(), 1);
        assert_eq!(f.table.offset_image(), Some(4));
        assert!(f.table.window().find(6).is_some());
    }

    #[test]
    fn collection_reload_replaces_deleted_anchor() {
        let mut f = grid_fixture(20);
        f.table.set_offset(6, true);

        let remaining: Vec<ImageId> = (1..=20).filter(|id| *id != 6).collect();
        f.store.set_collection(&remaining).unwrap();
        f.table.collection_changed(CollectionChange::Reload {
            changed: vec![6],
            next: Some(7),
        });
        assert_eq!(f.table.offset_image(), Some(7));
    }

    #[test]
    fn collection_new_query_resets_to_top() {
        let mut f = grid_fixture(30);
        f.table.set_offset(11, true);
        f.table.collection_changed(CollectionChange::NewQuery);
        assert_eq!(f.table.offset(), 1);
        assert_eq!(f.table.offset_image(), Some(1));
        assert_eq!(f.store.get_int(SETTING_LAST_OFFSET), Some(1));
    }

    #[test]
    fn reload_rehovers_successor_of_gone_image() {
        let mut f = grid_fixture(20);
        f.pointer.set_position(50, 50);
        f.view.set_hover_id(Some(2));

        let remaining: Vec<ImageId> = (1..=20).filter(|id| *id != 2).collect();
        f.store.set_collection(&remaining).unwrap();
        f.table.collection_changed(CollectionChange::Reload {
            changed: vec![2],
            next: Some(3),
        });
        assert_eq!(f.view.hover_id(), Some(3));
        assert!(f.table.window().find(3).unwrap().mouse_over);
    }

    #[test]
    fn selection_and_hover_flags_follow_services() {
        let mut f = grid_fixture(10);
        f.store.select(4);
        assert_eq!(f.table.selection_changed(), 1);
        assert!(f.table.window().find(4).unwrap().selected);

        f.view.set_hover_id(Some(9));
        assert!(f.table.hover_changed());
        assert!(f.table.window().find(9).unwrap().mouse_over);
    }

    #[test]
    fn overlay_change_marks_entries_dirty() {
        let mut f = grid_fixture(10);
        f.table.set_overlays(OverlayMode::Always);
        assert!(f.table.window().iter().all(|t| t.dirty));
        assert_eq!(f.store.get_int(SETTING_OVERLAYS), Some(2));
    }

    #[test]
    fn reset_first_offset_advances_one_row() {
        let mut f = grid_fixture(30);
        assert!(f.table.reset_first_offset());
        assert_eq!(f.table.offset(), 6);
    }

    #[test]
    fn offset_is_persisted_across_tables() {
        let mut f = grid_fixture(30);
        f.table.scroll(1);
        assert_eq!(f.store.get_int(SETTING_LAST_OFFSET), Some(6));

        let services = store_services(f.store.clone(), f.view.clone());
        let mut reborn = ThumbTable::new(services, f.pointer.clone());
        reborn.set_viewport(500, 250);
        assert_eq!(reborn.offset(), 6);
        assert_eq!(reborn.window().first().unwrap().rowid, 6);
    }

    #[test]
    fn drag_list_lifecycle() {
        let mut f = grid_fixture(10);
        f.store.select(2);
        f.store.select(5);
        let services = store_services(f.store.clone(), f.view.clone());
        let act_on = ActOn::new(services, f.pointer.clone());

        assert_eq!(f.table.begin_drag(&act_on), 2);
        assert_eq!(f.table.drag_ids(), &[2, 5]);
        f.table.end_drag();
        assert!(f.table.drag_ids().is_empty());
    }
}
