//! Categories and the category store.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{KeyValueStore, SlotGuard};

/// Rotation palette for categories created without a color
pub const COLOR_PALETTE: [&str; 8] = [
    "#2563eb", "#16a34a", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#84cc16", "#e11d48",
];

/// Color for category keys with no definition
pub const FALLBACK_COLOR: &str = "#64748b";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub color: String,
}

impl Category {
    pub fn new(key: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            color: color.into(),
        }
    }

    /// Case-insensitive key comparison used for uniqueness
    pub fn same_key(&self, key: &str) -> bool {
        self.key.to_lowercase() == key.to_lowercase()
    }
}

/// Palette entry for the category added after `existing` others
pub fn pick_color(palette: &[String], existing: usize) -> Option<&str> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[existing % palette.len()].as_str())
}

/// Color of the category whose key equals `key` exactly, if defined
pub fn color_of<'a>(key: &str, categories: &'a [Category]) -> Option<&'a str> {
    categories
        .iter()
        .find(|category| category.key == key)
        .map(|category| category.color.as_str())
}

/// Persisted, ordered category collection
///
/// Same soft-fail contract as the task store; records are read as-is.
#[derive(Clone)]
pub struct CategoryStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl fmt::Debug for CategoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryStore").field("key", &self.key).finish()
    }
}

impl CategoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn try_load(&self) -> Result<Vec<Category>> {
        match self.kv.get(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    pub fn load(&self) -> Vec<Category> {
        self.try_load().unwrap_or_else(|err| {
            tracing::warn!(key = %self.key, error = %err, "failed to load categories");
            Vec::new()
        })
    }

    pub fn try_save(&self, categories: &[Category]) -> Result<()> {
        let json = serde_json::to_string_pretty(categories)?;
        self.kv.set(&self.key, &json)
    }

    pub fn save(&self, categories: &[Category]) {
        if let Err(err) = self.try_save(categories) {
            tracing::warn!(key = %self.key, error = %err, "failed to save categories");
        }
    }

    pub fn lock(&self) -> Result<SlotGuard<'_>> {
        self.kv.lock(&self.key)
    }
}
