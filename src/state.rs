use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info};

use crate::data::filter::{filtered_indices, FilterSelection};
use crate::data::loader::{self, LoadError};
use crate::data::model::PreparedTable;
use crate::data::prepare;

// ---------------------------------------------------------------------------
// CacheKey – identity of the two input files
// ---------------------------------------------------------------------------

/// Identity of a (train, store) input pair: canonical paths plus file size
/// and mtime. Two equal keys mean the prepared table can be reused as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    train: PathBuf,
    store: PathBuf,
    train_stamp: FileStamp,
    store_stamp: FileStamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl CacheKey {
    /// Capture the current identity of both sources. Fails (naming the
    /// resource) when either file cannot be inspected.
    pub fn capture(train_path: &Path, store_path: &Path) -> Result<Self, LoadError> {
        Ok(CacheKey {
            train: canonical(train_path)?,
            store: canonical(store_path)?,
            train_stamp: stamp(train_path)?,
            store_stamp: stamp(store_path)?,
        })
    }
}

fn canonical(path: &Path) -> Result<PathBuf, LoadError> {
    path.canonicalize().map_err(|source| LoadError::MissingSource {
        path: path.display().to_string(),
        source,
    })
}

fn stamp(path: &Path) -> Result<FileStamp, LoadError> {
    let meta = std::fs::metadata(path).map_err(|source| LoadError::MissingSource {
        path: path.display().to_string(),
        source,
    })?;
    Ok(FileStamp {
        len: meta.len(),
        modified: meta.modified().ok(),
    })
}

// ---------------------------------------------------------------------------
// DashboardState – session state around the immutable prepared table
// ---------------------------------------------------------------------------

/// The dashboard session: the memoized prepared table, the current filter
/// selection, and the cached filtered view.
///
/// The table is built at most once per input identity; filter interactions
/// only ever recompute `visible_indices`.
#[derive(Debug, Default)]
pub struct DashboardState {
    cached: Option<CachedTable>,

    /// Current selection (None until a table is loaded).
    pub selection: Option<FilterSelection>,

    /// Indices of records passing the current selection.
    pub visible_indices: Vec<usize>,
}

#[derive(Debug)]
struct CachedTable {
    key: CacheKey,
    table: PreparedTable,
}

impl DashboardState {
    /// Load and prepare the table for the given sources, reusing the cached
    /// one when the inputs are unchanged. On a rebuild the selection resets
    /// to select-all over the new table; on a cache hit it is left alone.
    pub fn load(
        &mut self,
        train_path: &Path,
        store_path: &Path,
    ) -> Result<&PreparedTable, LoadError> {
        let key = CacheKey::capture(train_path, store_path)?;

        let hit = matches!(&self.cached, Some(c) if c.key == key);
        if !hit {
            info!("building prepared table from {}", train_path.display());
            let rows = loader::load(train_path, store_path)?;
            let table = prepare::prepare(rows);
            self.selection = Some(FilterSelection::select_all(&table));
            self.visible_indices = (0..table.len()).collect();
            let cached = self.cached.insert(CachedTable { key, table });
            return Ok(&cached.table);
        }

        debug!("prepared table cache hit for {}", train_path.display());
        match &self.cached {
            Some(c) => Ok(&c.table),
            None => unreachable!("cache hit implies a cached table"),
        }
    }

    /// The prepared table, if one has been loaded.
    pub fn table(&self) -> Option<&PreparedTable> {
        self.cached.as_ref().map(|c| &c.table)
    }

    /// Recompute the filtered view from the current selection.
    pub fn refilter(&mut self) {
        if let (Some(c), Some(sel)) = (&self.cached, &self.selection) {
            self.visible_indices = filtered_indices(&c.table, sel);
            debug!("refilter: {} rows visible", self.visible_indices.len());
        }
    }

    /// Replace the whole selection and refilter.
    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = Some(selection);
        self.refilter();
    }

    /// Reset every dimension to select-all over the live table.
    pub fn select_all_filters(&mut self) {
        if let Some(c) = &self.cached {
            self.selection = Some(FilterSelection::select_all(&c.table));
        }
        self.refilter();
    }
}
