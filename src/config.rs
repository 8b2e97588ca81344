//! Catalog construction settings.

use std::path::PathBuf;

/// Default file holding the persisted catalog.
pub const DEFAULT_STORE_FILE: &str = "movies.json";
/// Library receiving persisted records that carry no owner tag.
pub const DEFAULT_LIBRARY: &str = "default";

/// Settings for [`crate::core::catalog::Catalog::open`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// File the catalog is loaded from and saved to.
    pub store_path: PathBuf,
    /// Library that untagged store lines are loaded into.
    pub default_library: String,
    /// Save unsaved changes when the catalog is dropped.
    pub persist_on_drop: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            default_library: DEFAULT_LIBRARY.to_string(),
            persist_on_drop: true,
        }
    }
}

impl CatalogConfig {
    /// Default settings pointed at `path`.
    pub fn with_store_path(path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: path.into(),
            ..Self::default()
        }
    }
}
