//! Resolution of the "images to act on" set.
//!
//! Toolbox actions (rate, delete, export, drag) apply to a context-dependent
//! set of images: the hovered thumbnail beats the active images, which beat
//! the explicit selection. Grouped images may pull in their hidden group
//! members when the caller asks for the non-visible variant. Because this
//! set is queried on every pointer move, two memoized caches (one per
//! visibility flavor) are kept and invalidated on hover, pointer-enter and
//! active-image changes.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::services::{ImageId, PointerState, Services};

#[derive(Debug, Default)]
struct ActOnCache {
    ok: bool,
    ordered: bool,
    images: Vec<ImageId>,
    hover: Option<ImageId>,
    active: Vec<ImageId>,
    inside_grid: bool,
}

impl ActOnCache {
    /// A cache stays valid while the hover target, the pointer-inside flag
    /// and the active image list are unchanged. When the pointer is inside
    /// the grid the hover id dominates, so active images are only compared
    /// by length there.
    fn still_valid(&self, services: &Services, inside_grid: bool) -> bool {
        if !self.ok
            || self.hover != services.view.hover_id()
            || self.inside_grid != inside_grid
        {
            return false;
        }
        let active = services.view.active_images();
        if self.active.len() != active.len() {
            return false;
        }
        inside_grid || self.active == active
    }
}

/// Stateful resolver with one cache per visibility flavor.
pub struct ActOn {
    services: Services,
    pointer: Rc<PointerState>,
    visible: RefCell<ActOnCache>,
    all: RefCell<ActOnCache>,
}

impl ActOn {
    pub fn new(services: Services, pointer: Rc<PointerState>) -> Self {
        Self {
            services,
            pointer,
            visible: RefCell::new(ActOnCache::default()),
            all: RefCell::new(ActOnCache::default()),
        }
    }

    /// The images an action should apply to.
    ///
    /// With `only_visible` the list holds exactly the thumbnails the user
    /// can see; without it, collapsed group members of each entry are pulled
    /// in as well. `ordered` requests collection order at the price of a
    /// join. `force` bypasses the cache.
    pub fn images(&self, only_visible: bool, force: bool, ordered: bool) -> Vec<ImageId> {
        self.update_cache(only_visible, force, ordered);
        self.cache(only_visible).borrow().images.clone()
    }

    /// Like [`ActOn::images`] but only the count, ordering-agnostic so a
    /// valid cache of either ordering is reused as is.
    pub fn count(&self, only_visible: bool, force: bool) -> usize {
        if !force {
            let cache = self.cache(only_visible).borrow();
            if cache.still_valid(&self.services, self.pointer.inside()) {
                return cache.images.len();
            }
        }
        self.update_cache(only_visible, force, false);
        self.cache(only_visible).borrow().images.len()
    }

    /// The single most relevant image: hover first, then the first active
    /// image, then the first selected image in collection order.
    pub fn main_image(&self) -> Option<ImageId> {
        if let Some(hover) = self.services.view.hover_id() {
            return Some(hover);
        }
        if let Some(first) = self.services.view.active_images().first() {
            return Some(*first);
        }
        self.services.selection.first_id()
    }

    /// Invalidates one cache, forcing a rebuild on next query.
    pub fn reset(&self, only_visible: bool) {
        self.cache(only_visible).borrow_mut().ok = false;
    }

    fn cache(&self, only_visible: bool) -> &RefCell<ActOnCache> {
        if only_visible {
            &self.visible
        } else {
            &self.all
        }
    }

    /// Rebuilds the cache unless it is still valid. Returns true when a
    /// rebuild happened.
    fn update_cache(&self, only_visible: bool, force: bool, ordered: bool) -> bool {
        let inside_grid = self.pointer.inside();
        {
            let cache = self.cache(only_visible).borrow();
            if !force && cache.ordered == ordered && cache.still_valid(&self.services, inside_grid)
            {
                return false;
            }
        }

        // explicitly selected images first; the all flavor routes each one
        // through group expansion, so a collapsed group drags its filtered
        // members along with the selected image
        let mut list = if only_visible {
            self.services.selection.ids(true, ordered)
        } else {
            let mut expanded = Vec::new();
            for id in self.services.selection.ids(false, ordered) {
                self.insert(&mut expanded, id, false);
            }
            expanded
        };

        // active images (culling, darkroom) act as a higher level of
        // selection on top
        let active = self.services.view.active_images();
        for &id in &active {
            self.insert(&mut list, id, only_visible);
            // an active image can be out of the collection, so make sure
            // the id itself always lands in the list
            if !only_visible {
                self.insert(&mut list, id, true);
            }
        }

        debug!(
            flavor = if only_visible { "visible" } else { "all" },
            count = list.len(),
            "Rebuilt act-on cache"
        );

        let mut cache = self.cache(only_visible).borrow_mut();
        *cache = ActOnCache {
            ok: true,
            ordered,
            images: list,
            hover: self.services.view.hover_id(),
            active,
            inside_grid,
        };
        true
    }

    /// Appends `id` (or, for a collapsed group, its filtered members) to
    /// `list`, skipping duplicates.
    fn insert(&self, list: &mut Vec<ImageId>, id: ImageId, only_visible: bool) {
        if only_visible {
            if !list.contains(&id) {
                list.push(id);
            }
            return;
        }

        let Some(info) = self.services.images.info(id) else {
            return;
        };
        if !self.services.view.grouping_enabled()
            || self.services.grouping.is_expanded(info.group_id)
            || !self.services.selection.has_collection_filter()
        {
            if !list.contains(&id) {
                list.push(id);
            }
        } else {
            for member in self.services.grouping.members_of(info.group_id, true) {
                if !list.contains(&member) {
                    list.push(member);
                }
            }
        }
    }
}
