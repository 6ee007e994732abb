//! Drag-and-drop payload encoding and drop resolution.
//!
//! Dragging thumbnails exports two payload flavors: an opaque image-id blob
//! for in-application reordering and a `text/uri-list` so external targets
//! receive file paths. Dropping resolves against the live window to find
//! the reorder target.

use crate::services::{ImageCache, ImageId};
use crate::window::ThumbWindow;

/// Encodes image ids as little-endian u32 words, the in-application drag
/// payload format.
pub fn imgid_bytes(ids: &[ImageId]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ids.len() * 4);
    for &id in ids {
        out.extend_from_slice(&(id as u32).to_le_bytes());
    }
    out
}

/// Decodes an image-id payload. Trailing bytes that do not fill a whole
/// word are ignored.
pub fn imgids_from_bytes(bytes: &[u8]) -> Vec<ImageId> {
    bytes
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]) as ImageId)
        .collect()
}

/// Builds a `text/uri-list` payload from the images' file paths. Ids with
/// no cache entry are skipped.
pub fn uri_list(images: &dyn ImageCache, ids: &[ImageId]) -> String {
    let mut uris = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(info) = images.info(id) {
            uris.push(format!("file://{}", info.path.display()));
        }
    }
    uris.join("\r\n")
}

/// Raw drop payload as delivered by the host toolkit.
pub enum DropPayload {
    ImageIds(Vec<u8>),
    UriList(String),
}

/// What the host should do with a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// External files were dropped; import these URIs.
    LoadUris(Vec<String>),
    /// Thumbnails were dropped; move `ids` before `target` in the custom
    /// sort order, or to the end when the drop landed on empty space.
    ReorderBefore {
        target: Option<ImageId>,
        ids: Vec<ImageId>,
    },
    None,
}

/// Resolves a drop at grid-local `(x, y)` into a host action.
pub fn resolve_drop(window: &ThumbWindow, x: i32, y: i32, payload: DropPayload) -> DropAction {
    match payload {
        DropPayload::ImageIds(bytes) => {
            let ids = imgids_from_bytes(&bytes);
            if ids.is_empty() {
                return DropAction::None;
            }
            let target = window.thumb_at(x, y).map(|t| t.imgid);
            DropAction::ReorderBefore { target, ids }
        }
        DropPayload::UriList(text) => {
            let uris: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_owned)
                .collect();
            if uris.is_empty() {
                DropAction::None
            } else {
                DropAction::LoadUris(uris)
            }
        }
    }
}
