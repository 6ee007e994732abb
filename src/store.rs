//! SQLite-backed reference implementation of the collaborator services.
//!
//! `GridStore` keeps the collection row mapping, image grouping metadata,
//! the explicit selection and the persisted preferences in one database
//! (in-memory or on disk) and implements the `Collection`, `Selection`,
//! `Grouping`, `ImageCache` and `Settings` traits on top of it. Hosts with
//! their own engines can ignore this module entirely; the crate's scenario
//! tests run against it.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::services::{
    Collection, GroupId, Grouping, ImageCache, ImageId, ImageInfo, RowId, Selection, Settings,
};

/// Errors opening or creating the backing database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no usable project directory for the database")]
    NoProjectDirs,
}

/// SQLite-backed storage for the collection, selection, grouping and
/// settings services.
///
/// All access happens on the single UI thread; the connection sits behind a
/// `RefCell` so a shared `Rc<GridStore>` can serve every trait.
pub struct GridStore {
    conn: RefCell<Connection>,
    expanded_group: Cell<Option<GroupId>>,
    last_single_select: Cell<Option<ImageId>>,
    filter_attached: Cell<bool>,
}

impl GridStore {
    /// Opens or creates the database at the default XDG location
    /// (`XDG_CONFIG_HOME/thumbgrid/grid.sqlite`).
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&Self::default_db_path()?)
    }

    /// Returns the default database path based on XDG directories.
    pub fn default_db_path() -> Result<PathBuf, StoreError> {
        let proj_dirs = ProjectDirs::from("", "", "thumbgrid").ok_or(StoreError::NoProjectDirs)?;
        let config_dir = proj_dirs.config_dir().to_path_buf();
        std::fs::create_dir_all(&config_dir).map_err(|source| StoreError::Io {
            path: config_dir.clone(),
            source,
        })?;
        Ok(config_dir.join("grid.sqlite"))
    }

    /// Opens or creates the database at the specified path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let store = Self::from_connection(Connection::open(path)?)?;
        info!("Opened grid store at {:?}", path);
        Ok(store)
    }

    /// Opens a fresh in-memory database. Used by tests and by hosts that
    /// rebuild the collection from an external engine on startup.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let store = Self {
            conn: RefCell::new(conn),
            expanded_group: Cell::new(None),
            last_single_select: Cell::new(None),
            filter_attached: Cell::new(true),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        self.conn.borrow().execute_batch(
            "
            -- Image metadata (grouping and file location)
            CREATE TABLE IF NOT EXISTS images (
                id INTEGER PRIMARY KEY,
                group_id INTEGER NOT NULL,
                path TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_images_group ON images(group_id);

            -- Current collection ordering: rowid is the 1-based row number
            CREATE TABLE IF NOT EXISTS collected_images (
                rowid INTEGER PRIMARY KEY,
                imgid INTEGER NOT NULL UNIQUE
            );

            -- Images matching the collection filter before group collapse
            CREATE TABLE IF NOT EXISTS filtered_images (
                imgid INTEGER PRIMARY KEY
            );

            -- Explicit selection
            CREATE TABLE IF NOT EXISTS selected_images (
                imgid INTEGER PRIMARY KEY
            );

            -- Simple key/value preferences
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            ",
        )?;
        debug!("Grid store tables created/verified");
        Ok(())
    }

    // =========================================================================
    // Population
    // =========================================================================

    /// Inserts or replaces one image's metadata.
    pub fn upsert_image(&self, id: ImageId, group_id: GroupId, path: &Path) -> Result<()> {
        self.conn
            .borrow()
            .execute(
                "INSERT OR REPLACE INTO images (id, group_id, path) VALUES (?1, ?2, ?3)",
                params![id, group_id, path.to_string_lossy()],
            )
            .context("Failed to upsert image")?;
        Ok(())
    }

    /// Replaces the collection ordering with `ids`, assigning contiguous
    /// 1-based row numbers. Also resets the filter-match set to the same
    /// ids; use [`GridStore::set_filter_matches`] afterwards when the
    /// filter matches more images than the (group-collapsed) collection.
    pub fn set_collection(&self, ids: &[ImageId]) -> Result<()> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM collected_images", [])?;
        tx.execute("DELETE FROM filtered_images", [])?;
        {
            let mut insert_row =
                tx.prepare_cached("INSERT INTO collected_images (rowid, imgid) VALUES (?1, ?2)")?;
            let mut insert_filtered =
                tx.prepare_cached("INSERT OR IGNORE INTO filtered_images (imgid) VALUES (?1)")?;
            for (i, id) in ids.iter().enumerate() {
                insert_row.execute(params![i as i64 + 1, id])?;
                insert_filtered.execute(params![id])?;
            }
        }
        tx.commit()?;
        debug!("Collection replaced with {} rows", ids.len());
        Ok(())
    }

    /// Replaces the set of images matching the collection filter (the
    /// superset of the collection when groups are collapsed).
    pub fn set_filter_matches(&self, ids: &[ImageId]) -> Result<()> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM filtered_images", [])?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT OR IGNORE INTO filtered_images (imgid) VALUES (?1)")?;
            for id in ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn clear_selection(&self) -> Result<()> {
        self.conn
            .borrow()
            .execute("DELETE FROM selected_images", [])
            .context("Failed to clear selection")?;
        self.last_single_select.set(None);
        Ok(())
    }

    pub fn deselect(&self, id: ImageId) -> Result<()> {
        self.conn
            .borrow()
            .execute("DELETE FROM selected_images WHERE imgid = ?1", params![id])
            .context("Failed to deselect image")?;
        Ok(())
    }

    /// Marks which group is currently expanded in the UI (at most one).
    pub fn set_expanded_group(&self, group: Option<GroupId>) {
        self.expanded_group.set(group);
    }

    /// Detaches the collection filter from the selection, as happens when
    /// no collection query is active. Act-on group expansion is skipped in
    /// that state.
    pub fn set_filter_attached(&self, attached: bool) {
        self.filter_attached.set(attached);
    }

    fn query_ids(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<ImageId>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare_cached(sql)?;
        let mut out = Vec::new();
        let mut rows = stmt.query(args)?;
        while let Some(row) = rows.next()? {
            out.push(row.get(0)?);
        }
        Ok(out)
    }
}

/// Convenience for building the full `Services` bundle around one store.
pub fn store_services(
    store: Rc<GridStore>,
    view: Rc<dyn crate::services::ViewState>,
) -> crate::services::Services {
    crate::services::Services {
        collection: store.clone(),
        selection: store.clone(),
        grouping: store.clone(),
        images: store.clone(),
        settings: store,
        view,
    }
}

fn or_warn<T>(what: &str, result: Result<T>, fallback: T) -> T {
    match result {
        Ok(v) => v,
        Err(err) => {
            warn!("Grid store query '{}' failed: {:?}", what, err);
            fallback
        }
    }
}

impl Collection for GridStore {
    fn count(&self) -> i64 {
        let r = self
            .conn
            .borrow()
            .query_row("SELECT COUNT(*) FROM collected_images", [], |r| r.get(0))
            .context("count");
        or_warn("count", r, 0)
    }

    fn max_row(&self) -> RowId {
        let r = self
            .conn
            .borrow()
            .query_row(
                "SELECT COALESCE(MAX(rowid), 0) FROM collected_images",
                [],
                |r| r.get(0),
            )
            .context("max_row");
        or_warn("max_row", r, 0)
    }

    fn range(&self, from_row: RowId, limit: i64) -> Vec<(RowId, ImageId)> {
        let run = || -> Result<Vec<(RowId, ImageId)>> {
            let conn = self.conn.borrow();
            let mut stmt = conn.prepare_cached(
                "SELECT rowid, imgid FROM collected_images
                 WHERE rowid >= ?1 ORDER BY rowid LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![from_row, limit], |r| Ok((r.get(0)?, r.get(1)?)))?;
            Ok(rows.collect::<rusqlite::Result<_>>()?)
        };
        or_warn("range", run(), Vec::new())
    }

    fn range_before(&self, before_row: RowId, limit: i64) -> Vec<(RowId, ImageId)> {
        let run = || -> Result<Vec<(RowId, ImageId)>> {
            let conn = self.conn.borrow();
            let mut stmt = conn.prepare_cached(
                "SELECT rowid, imgid FROM collected_images
                 WHERE rowid < ?1 ORDER BY rowid DESC LIMIT ?2",
            )?;
            let rows =
                stmt.query_map(params![before_row, limit], |r| Ok((r.get(0)?, r.get(1)?)))?;
            Ok(rows.collect::<rusqlite::Result<_>>()?)
        };
        or_warn("range_before", run(), Vec::new())
    }

    fn row_of(&self, id: ImageId) -> Option<RowId> {
        let r = self
            .conn
            .borrow()
            .query_row(
                "SELECT rowid FROM collected_images WHERE imgid = ?1",
                params![id],
                |r| r.get(0),
            )
            .optional()
            .context("row_of");
        or_warn("row_of", r, None)
    }

    fn image_at(&self, row: RowId) -> Option<ImageId> {
        let r = self
            .conn
            .borrow()
            .query_row(
                "SELECT imgid FROM collected_images WHERE rowid = ?1",
                params![row],
                |r| r.get(0),
            )
            .optional()
            .context("image_at");
        or_warn("image_at", r, None)
    }
}

impl Selection for GridStore {
    fn ids(&self, only_visible: bool, ordered: bool) -> Vec<ImageId> {
        let sql = match (only_visible, ordered) {
            (true, true) => {
                "SELECT s.imgid FROM selected_images s
                 JOIN collected_images c ON c.imgid = s.imgid
                 ORDER BY c.rowid"
            }
            (true, false) => {
                "SELECT s.imgid FROM selected_images s
                 JOIN collected_images c ON c.imgid = s.imgid"
            }
            (false, true) => {
                "SELECT s.imgid FROM selected_images s
                 LEFT JOIN collected_images c ON c.imgid = s.imgid
                 ORDER BY c.rowid IS NULL, c.rowid"
            }
            (false, false) => "SELECT imgid FROM selected_images",
        };
        or_warn("selection ids", self.query_ids(sql, &[]), Vec::new())
    }

    fn is_selected(&self, id: ImageId) -> bool {
        let r = self
            .conn
            .borrow()
            .query_row(
                "SELECT 1 FROM selected_images WHERE imgid = ?1",
                params![id],
                |r| r.get::<_, i32>(0),
            )
            .optional()
            .context("is_selected");
        or_warn("is_selected", r, None).is_some()
    }

    fn first_id(&self) -> Option<ImageId> {
        let r = self
            .conn
            .borrow()
            .query_row(
                "SELECT s.imgid FROM selected_images s
                 JOIN collected_images c ON c.imgid = s.imgid
                 ORDER BY c.rowid LIMIT 1",
                [],
                |r| r.get(0),
            )
            .optional()
            .context("first_id");
        or_warn("first_id", r, None)
    }

    fn select(&self, id: ImageId) {
        let r = self
            .conn
            .borrow()
            .execute(
                "INSERT OR IGNORE INTO selected_images (imgid) VALUES (?1)",
                params![id],
            )
            .context("select");
        or_warn("select", r, 0);
        self.last_single_select.set(Some(id));
    }

    fn select_range(&self, to: ImageId) {
        let anchor = self.last_single_select.get().unwrap_or(to);
        let (Some(a), Some(b)) = (self.row_of(anchor), self.row_of(to)) else {
            self.select(to);
            return;
        };
        let (lo, hi) = (a.min(b), a.max(b));
        let r = self
            .conn
            .borrow()
            .execute(
                "INSERT OR IGNORE INTO selected_images (imgid)
                 SELECT imgid FROM collected_images WHERE rowid BETWEEN ?1 AND ?2",
                params![lo, hi],
            )
            .context("select_range");
        or_warn("select_range", r, 0);
    }

    fn has_collection_filter(&self) -> bool {
        self.filter_attached.get()
    }
}

impl Grouping for GridStore {
    fn members_of(&self, group: GroupId, collection_filter: bool) -> Vec<ImageId> {
        let (sql, args): (&str, Vec<&dyn rusqlite::ToSql>) = if collection_filter {
            (
                "SELECT id FROM images
                 WHERE group_id = ?1
                   AND id IN (SELECT imgid FROM filtered_images)
                 ORDER BY id",
                vec![&group],
            )
        } else {
            (
                "SELECT id FROM images WHERE group_id = ?1 ORDER BY id",
                vec![&group],
            )
        };
        or_warn("members_of", self.query_ids(sql, &args), Vec::new())
    }

    fn is_expanded(&self, group: GroupId) -> bool {
        self.expanded_group.get() == Some(group)
    }
}

impl ImageCache for GridStore {
    fn info(&self, id: ImageId) -> Option<ImageInfo> {
        let r = self
            .conn
            .borrow()
            .query_row(
                "SELECT group_id, path,
                        EXISTS(SELECT 1 FROM images o
                               WHERE o.group_id = images.group_id AND o.id <> images.id)
                 FROM images WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ImageInfo {
                        group_id: row.get(0)?,
                        path: PathBuf::from(row.get::<_, String>(1)?),
                        grouped: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("image info");
        or_warn("image info", r, None)
    }
}

impl Settings for GridStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        let r = self
            .conn
            .borrow()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()
            .context("get_int");
        or_warn("get_int", r, None)
    }

    fn set_int(&self, key: &str, value: i64) {
        let r = self
            .conn
            .borrow()
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .context("set_int");
        or_warn("set_int", r, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// n images, ids 1..=n, each its own group, collected in id order.
    fn store_with(n: i64) -> GridStore {
        let store = GridStore::open_in_memory().unwrap();
        for id in 1..=n {
            store
                .upsert_image(id, id, Path::new(&format!("/photos/img_{id:04}.raw")))
                .unwrap();
        }
        let ids: Vec<ImageId> = (1..=n).collect();
        store.set_collection(&ids).unwrap();
        store
    }

    #[test]
    fn open_on_disk() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("grid.sqlite");
        let store = GridStore::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(store.count(), 0);
        assert_eq!(store.max_row(), 0);
    }

    #[test]
    fn collection_rows_are_contiguous_and_one_based() {
        let store = store_with(5);
        assert_eq!(store.count(), 5);
        assert_eq!(store.max_row(), 5);
        assert_eq!(store.row_of(1), Some(1));
        assert_eq!(store.row_of(5), Some(5));
        assert_eq!(store.image_at(3), Some(3));
        assert_eq!(store.image_at(6), None);
        assert_eq!(store.row_of(99), None);
    }

    #[test]
    fn range_queries() {
        let store = store_with(10);
        let fwd = store.range(4, 3);
        assert_eq!(fwd, vec![(4, 4), (5, 5), (6, 6)]);

        let back = store.range_before(4, 2);
        assert_eq!(back, vec![(3, 3), (2, 2)]);

        assert!(store.range(11, 5).is_empty());
        assert!(store.range_before(1, 5).is_empty());
    }

    #[test]
    fn reload_changes_row_of_surviving_image() {
        let store = store_with(4);
        assert_eq!(store.row_of(3), Some(3));
        // image 2 filtered out, image 3 moves up
        store.set_collection(&[1, 3, 4]).unwrap();
        assert_eq!(store.row_of(3), Some(2));
        assert_eq!(store.row_of(2), None);
    }

    #[test]
    fn selection_membership_and_order() {
        let store = store_with(6);
        store.select(5);
        store.select(2);
        assert!(store.is_selected(2));
        assert!(!store.is_selected(3));

        // collection order, not insertion order
        assert_eq!(store.ids(true, true), vec![2, 5]);
        assert_eq!(store.first_id(), Some(2));

        // selected image outside the collection only shows with
        // only_visible = false
        store.select(99);
        assert_eq!(store.ids(true, true), vec![2, 5]);
        let all = store.ids(false, true);
        assert_eq!(all, vec![2, 5, 99]);
    }

    #[test]
    fn select_range_spans_rows() {
        let store = store_with(8);
        store.select(3);
        store.select_range(6);
        assert_eq!(store.ids(true, true), vec![3, 4, 5, 6]);
    }

    #[test]
    fn group_members_respect_filter() {
        let store = GridStore::open_in_memory().unwrap();
        for (id, group) in [(1, 1), (2, 1), (3, 1), (4, 4)] {
            store
                .upsert_image(id, group, Path::new(&format!("/p/{id}.jpg")))
                .unwrap();
        }
        // collapsed collection shows the group head only, but the filter
        // matches the whole group
        store.set_collection(&[1, 4]).unwrap();
        store.set_filter_matches(&[1, 2, 3, 4]).unwrap();

        assert_eq!(store.members_of(1, false), vec![1, 2, 3]);
        assert_eq!(store.members_of(1, true), vec![1, 2, 3]);

        store.set_filter_matches(&[1, 2, 4]).unwrap();
        assert_eq!(store.members_of(1, true), vec![1, 2]);
    }

    #[test]
    fn image_info_reports_grouping() {
        let store = GridStore::open_in_memory().unwrap();
        store.upsert_image(1, 1, Path::new("/p/a.jpg")).unwrap();
        store.upsert_image(2, 1, Path::new("/p/b.jpg")).unwrap();
        store.upsert_image(3, 3, Path::new("/p/c.jpg")).unwrap();

        let info = store.info(1).unwrap();
        assert_eq!(info.group_id, 1);
        assert!(info.grouped);
        assert_eq!(info.path, PathBuf::from("/p/a.jpg"));

        assert!(!store.info(3).unwrap().grouped);
        assert!(store.info(42).is_none());
    }

    #[test]
    fn expanded_group_flag() {
        let store = store_with(2);
        assert!(!store.is_expanded(1));
        store.set_expanded_group(Some(1));
        assert!(store.is_expanded(1));
        assert!(!store.is_expanded(2));
    }

    #[test]
    fn settings_roundtrip() {
        let store = store_with(1);
        assert_eq!(store.get_int("grid/last_offset"), None);
        store.set_int("grid/last_offset", 7);
        store.set_int("grid/last_offset", 9);
        assert_eq!(store.get_int("grid/last_offset"), Some(9));
    }
}
