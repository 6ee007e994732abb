//! Virtualized thumbnail grid for large image collections.
//!
//! Only the images around the viewport are materialized as [`Thumb`]
//! entries in a [`ThumbWindow`]; everything else lives as rows in the
//! backing [`GridStore`]. The [`ThumbTable`] keeps the window consistent
//! with the collection through incremental moves and id-based
//! reconciliation, anchored on a persisted collection row so the position
//! survives restarts and collection reloads.
//!
//! The table never talks to the database directly. It goes through the
//! collaborator traits in [`services`] ([`Collection`], [`Selection`],
//! [`Grouping`], [`ImageCache`], [`ViewState`], [`Settings`]), bundled in a
//! [`Services`] value; [`store_services`] wires them all to a `GridStore`.
//! [`ActOn`] resolves which images a command applies to (hover beats
//! active beats selection) and [`dnd`] covers drag-and-drop payloads.

pub mod act_on;
pub mod cache;
pub mod dnd;
pub mod geometry;
mod groups;
pub mod services;
pub mod store;
pub mod table;
pub mod window;

pub use act_on::ActOn;
pub use cache::InfoCache;
pub use dnd::{DropAction, DropPayload};
pub use geometry::{Layout, Mode};
pub use services::{
    Collection, GroupId, Grouping, ImageCache, ImageId, ImageInfo, MemorySettings, PointerState,
    RowId, Selection, Services, Settings, SharedViewState, ViewState,
};
pub use store::{store_services, GridStore, StoreError};
pub use table::{
    CollectionChange, KeyMove, OverlayMode, ScrollbarState, ThumbTable, MAX_ZOOM,
};
pub use window::{Area, GroupBorders, Thumb, ThumbWindow};
