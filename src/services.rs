//! Collaborator interfaces consumed by the grid core.
//!
//! The core owns no widgets and no global state: the collection query engine,
//! selection store, grouping store, image metadata cache and UI-level view
//! state are all injected behind these traits. Everything runs on the single
//! UI thread, so implementations use interior mutability instead of locks.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

/// Stable identifier of an image's content.
pub type ImageId = i64;
/// 1-based position of an image within the current collection ordering.
pub type RowId = i64;
/// Identifier of a user-defined image group.
pub type GroupId = i64;

/// Read-only metadata about one image, as served by the image cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub group_id: GroupId,
    /// True when the group holds more than this image.
    pub grouped: bool,
    pub path: PathBuf,
}

/// The ordered, filtered image collection. Row numbers are 1-based and
/// contiguous; they only change on a reload event.
pub trait Collection {
    fn count(&self) -> i64;

    /// Highest row number, 0 when the collection is empty.
    fn max_row(&self) -> RowId;

    /// Rows with `row >= from_row`, ascending, at most `limit` entries.
    fn range(&self, from_row: RowId, limit: i64) -> Vec<(RowId, ImageId)>;

    /// Rows with `row < before_row`, descending, at most `limit` entries.
    fn range_before(&self, before_row: RowId, limit: i64) -> Vec<(RowId, ImageId)>;

    fn row_of(&self, id: ImageId) -> Option<RowId>;
    fn image_at(&self, row: RowId) -> Option<ImageId>;
}

/// The explicit selection store.
pub trait Selection {
    /// Selected ids. `only_visible` restricts to images present in the
    /// current collection; `ordered` returns them in collection order
    /// (slower, needs a join against the collection).
    fn ids(&self, only_visible: bool, ordered: bool) -> Vec<ImageId>;

    fn is_selected(&self, id: ImageId) -> bool;

    /// First selected image in collection order.
    fn first_id(&self) -> Option<ImageId>;

    fn select(&self, id: ImageId);

    /// Extend the selection from the last single-selected image to `to`.
    fn select_range(&self, to: ImageId);

    /// Whether the selection is attached to a filtered collection. When it
    /// is not, group expansion in the act-on set is skipped entirely.
    fn has_collection_filter(&self) -> bool;
}

/// The grouping store.
pub trait Grouping {
    /// Members of a group; with `collection_filter` set, restricted to
    /// images matching the current collection filter.
    fn members_of(&self, group: GroupId, collection_filter: bool) -> Vec<ImageId>;

    /// Whether this group is currently expanded in the UI.
    fn is_expanded(&self, group: GroupId) -> bool;
}

/// Read-only image metadata lookup. Implementations are expected to be fast
/// (indexed or cached); see [`crate::cache::InfoCache`].
pub trait ImageCache {
    fn info(&self, id: ImageId) -> Option<ImageInfo>;
}

/// Process-wide view state the core reads (and, for hover, writes back).
pub trait ViewState {
    fn hover_id(&self) -> Option<ImageId>;
    fn set_hover_id(&self, id: Option<ImageId>);

    /// Images pinned by a non-grid view (darkroom edit, culling). They act
    /// as a higher-priority implicit selection.
    fn active_images(&self) -> Vec<ImageId>;

    /// The user's "treat groups as one unit" preference.
    fn grouping_enabled(&self) -> bool;
}

/// Opaque key/value preference storage. Only simple scalar state is kept
/// here (last offset row, overlay mode).
pub trait Settings {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&self, key: &str, value: i64);
}

/// Bundle of all injected collaborators.
#[derive(Clone)]
pub struct Services {
    pub collection: Rc<dyn Collection>,
    pub selection: Rc<dyn Selection>,
    pub grouping: Rc<dyn Grouping>,
    pub images: Rc<dyn ImageCache>,
    pub view: Rc<dyn ViewState>,
    pub settings: Rc<dyn Settings>,
}

/// Pointer state shared between the grid table and the act-on resolver.
///
/// The host adapter updates it on enter/leave/motion events; the core only
/// reads it. `position` is in grid-local pixel coordinates.
#[derive(Debug, Default)]
pub struct PointerState {
    inside: Cell<bool>,
    position: Cell<(i32, i32)>,
}

impl PointerState {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn inside(&self) -> bool {
        self.inside.get()
    }

    pub fn set_inside(&self, inside: bool) {
        self.inside.set(inside);
    }

    pub fn position(&self) -> (i32, i32) {
        self.position.get()
    }

    pub fn set_position(&self, x: i32, y: i32) {
        self.position.set((x, y));
        self.inside.set(true);
    }
}

/// In-memory [`ViewState`] suitable for hosts without their own state bus,
/// and for tests.
#[derive(Debug, Default)]
pub struct SharedViewState {
    hover: Cell<Option<ImageId>>,
    active: RefCell<Vec<ImageId>>,
    grouping: Cell<bool>,
}

impl SharedViewState {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn set_active_images(&self, ids: Vec<ImageId>) {
        *self.active.borrow_mut() = ids;
    }

    pub fn set_grouping_enabled(&self, enabled: bool) {
        self.grouping.set(enabled);
    }
}

impl ViewState for SharedViewState {
    fn hover_id(&self) -> Option<ImageId> {
        self.hover.get()
    }

    fn set_hover_id(&self, id: Option<ImageId>) {
        self.hover.set(id);
    }

    fn active_images(&self) -> Vec<ImageId> {
        self.active.borrow().clone()
    }

    fn grouping_enabled(&self) -> bool {
        self.grouping.get()
    }
}

/// In-memory [`Settings`] for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RefCell<std::collections::HashMap<String, i64>>,
}

impl MemorySettings {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

impl Settings for MemorySettings {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.borrow().get(key).copied()
    }

    fn set_int(&self, key: &str, value: i64) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_state_tracks_motion() {
        let pointer = PointerState::new();
        assert!(!pointer.inside());

        pointer.set_position(120, 40);
        assert!(pointer.inside());
        assert_eq!(pointer.position(), (120, 40));

        pointer.set_inside(false);
        assert!(!pointer.inside());
    }

    #[test]
    fn shared_view_state_roundtrip() {
        let view = SharedViewState::new();
        assert_eq!(view.hover_id(), None);

        view.set_hover_id(Some(7));
        assert_eq!(view.hover_id(), Some(7));

        view.set_active_images(vec![3, 4]);
        assert_eq!(view.active_images(), vec![3, 4]);

        view.set_grouping_enabled(true);
        assert!(view.grouping_enabled());
    }

    #[test]
    fn memory_settings_roundtrip() {
        let settings = MemorySettings::new();
        assert_eq!(settings.get_int("grid/last_offset"), None);
        settings.set_int("grid/last_offset", 42);
        assert_eq!(settings.get_int("grid/last_offset"), Some(42));
    }
}
