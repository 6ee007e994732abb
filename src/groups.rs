//! Hover and group-border annotation over the live window.
//!
//! Borders are drawn around a hovered group as a whole, not around each of
//! its members: a side only carries a border when the neighbor on that side
//! is not part of the same group (or does not exist). Adjacency is window
//! order; row wraps break horizontal adjacency in grid mode.

use crate::geometry::{Layout, Mode};
use crate::services::{GroupId, ImageId, Selection};
use crate::window::{GroupBorders, ThumbWindow};

/// Recomputes `mouse_over` flags and group borders after a hover change.
/// Returns true when any entry changed and a repaint is needed.
pub(crate) fn refresh_hover(
    window: &mut ThumbWindow,
    layout: &Layout,
    hover: Option<ImageId>,
) -> bool {
    let mut changed = false;
    let mut group: Option<GroupId> = None;

    for t in window.iter_mut() {
        let over = hover == Some(t.imgid);
        if t.mouse_over != over {
            t.mouse_over = over;
            changed = true;
        }
        if over && t.grouped {
            group = t.group_id;
        }
        // no borders may remain from the previous hover
        if t.borders.any() {
            t.borders = GroupBorders::NONE;
            changed = true;
        }
    }

    let Some(gid) = group else {
        return changed;
    };

    let area = window.area();
    let per_row = layout.thumbs_per_row.max(1) as usize;
    let len = window.len();
    let mut borders = vec![GroupBorders::NONE; len];

    let in_group =
        |w: &ThumbWindow, i: usize| w.get(i).map(|n| n.group_id == Some(gid)).unwrap_or(false);

    for pos in 0..len {
        let th = match window.get(pos) {
            Some(t) if t.group_id == Some(gid) => t,
            _ => continue,
        };
        let b = &mut borders[pos];

        match layout.mode {
            Mode::Grid => {
                // left border, unless the group continues from the left on
                // the same row
                b.left = !(pos > 0 && th.x != area.x && in_group(window, pos - 1));
                // right border, unless the group continues to the right
                let at_row_end = th.x + th.width + th.width / 2 >= area.x + area.width;
                b.right = !(pos + 1 < len && !at_row_end && in_group(window, pos + 1));
                // vertical neighbors sit one full row away in window order
                b.top = !(pos >= per_row && in_group(window, pos - per_row));
                b.bottom = !(pos + per_row < len && in_group(window, pos + per_row));
            }
            Mode::Strip => {
                // single row: nothing above or below, always close the band
                b.top = true;
                b.bottom = true;
                b.left = !(pos > 0 && in_group(window, pos - 1));
                b.right = !(pos + 1 < len && in_group(window, pos + 1));
            }
        }
    }

    for (pos, t) in window.iter_mut().enumerate() {
        if t.borders != borders[pos] {
            t.borders = borders[pos];
            changed = true;
        }
    }
    changed
}

/// Re-reads selection membership for every window entry.
/// Returns the number of entries whose flag changed.
pub(crate) fn refresh_selection(window: &mut ThumbWindow, selection: &dyn Selection) -> usize {
    let mut changed = 0;
    for t in window.iter_mut() {
        let selected = selection.is_selected(t.imgid);
        if t.selected != selected {
            t.selected = selected;
            changed += 1;
        }
    }
    changed
}
