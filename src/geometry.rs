//! Pure layout geometry for the two grid modes.
//!
//! `Layout` captures everything derived from the viewport: thumbnail size,
//! rows, columns and the horizontal centering offset. Cell stepping
//! (`next_pos` / `prev_pos`) walks the grid in collection order.

/// Viewports at or below this size (in either dimension) are considered
/// degenerate and produce no layout at all.
pub const MIN_VIEW_SIZE: i32 = 20;

/// Layout mode of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Multi-row, multi-column grid ("filemanager").
    Grid,
    /// Single horizontal row ("filmstrip"), centered on the anchor image.
    Strip,
}

/// Derived geometry for one viewport size / zoom combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub mode: Mode,
    pub view_width: i32,
    pub view_height: i32,
    /// Columns in grid mode, always 1 in strip mode.
    pub thumbs_per_row: i32,
    /// Row capacity of the window, including the partially visible row.
    pub rows: i32,
    /// Edge length of a (square) thumbnail in pixels.
    pub thumb_size: i32,
    /// Horizontal offset centering the grid when columns don't fill the
    /// viewport exactly. Always 0 in strip mode.
    pub center_offset: i32,
}

impl Layout {
    /// Computes the layout for a viewport, or `None` when the viewport is
    /// degenerate and reconciliation should be skipped entirely.
    ///
    /// Grid thumbnails are `min(width / columns, height)` so they stay
    /// square and never overflow vertically. Strip thumbnails fill the
    /// viewport height; the row count is forced odd so the center slot
    /// aligns with the anchor image.
    pub fn compute(mode: Mode, view_width: i32, view_height: i32, zoom: i32) -> Option<Layout> {
        if view_width <= MIN_VIEW_SIZE || view_height <= MIN_VIEW_SIZE {
            return None;
        }

        match mode {
            Mode::Grid => {
                let thumbs_per_row = zoom.max(1);
                let thumb_size = (view_width / thumbs_per_row).min(view_height).max(1);
                let rows = view_height / thumb_size + 1;
                let center_offset = (view_width - thumbs_per_row * thumb_size) / 2;
                Some(Layout {
                    mode,
                    view_width,
                    view_height,
                    thumbs_per_row,
                    rows,
                    thumb_size,
                    center_offset,
                })
            }
            Mode::Strip => {
                let thumb_size = view_height;
                let mut rows = view_width / thumb_size;
                if rows % 2 == 1 {
                    rows += 2;
                } else {
                    rows += 1;
                }
                Some(Layout {
                    mode,
                    view_width,
                    view_height,
                    thumbs_per_row: 1,
                    rows,
                    thumb_size,
                    center_offset: 0,
                })
            }
        }
    }

    /// Number of window slots the layout can hold.
    pub fn slots(&self) -> i64 {
        self.rows as i64 * self.thumbs_per_row as i64
    }

    /// Position of the cell following `(x, y)` in collection order.
    pub fn next_pos(&self, x: i32, y: i32) -> (i32, i32) {
        match self.mode {
            Mode::Grid => {
                let nx = x + self.thumb_size;
                if nx + self.thumb_size > self.view_width {
                    (self.center_offset, y + self.thumb_size)
                } else {
                    (nx, y)
                }
            }
            Mode::Strip => (x + self.thumb_size, y),
        }
    }

    /// Position of the cell preceding `(x, y)` in collection order.
    pub fn prev_pos(&self, x: i32, y: i32) -> (i32, i32) {
        match self.mode {
            Mode::Grid => {
                let nx = x - self.thumb_size;
                if nx < 0 {
                    (
                        (self.thumbs_per_row - 1) * self.thumb_size + self.center_offset,
                        y - self.thumb_size,
                    )
                } else {
                    (nx, y)
                }
            }
            Mode::Strip => (x - self.thumb_size, y),
        }
    }
}

/// Number of whole thumbnails needed to cover `space` pixels, rounding up.
pub(crate) fn cells_to_cover(space: i32, thumb_size: i32) -> i32 {
    if thumb_size <= 0 || space <= 0 {
        return 0;
    }
    space / thumb_size + i32::from(space % thumb_size != 0)
}
