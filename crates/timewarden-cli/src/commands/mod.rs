pub mod settings;
pub mod sites;
pub mod status;
pub mod usage;

use std::path::Path;
use std::sync::Arc;

use timewarden_core::storage::{SqliteKv, Storage};

/// Open the typed store, at the given path or the default location.
pub fn open_storage(db: Option<&Path>) -> Result<Storage, Box<dyn std::error::Error>> {
    let kv = match db {
        Some(path) => SqliteKv::open(path)?,
        None => SqliteKv::open_default()?,
    };
    Ok(Storage::new(Arc::new(kv)))
}
