//! Persisted "current statement"
//!
//! A single JSON document `{"current_execution": "<statement>"}` that each
//! reduction overwrites. Readers may ask for the whole statement or for the
//! first subscript key of its assignment target.

use crate::error::ChainResult;
use lazy_regex::regex;
use lookup_chain_expr::{assemble, parse_statement};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name used by the process-wide store
pub const DEFAULT_STORE_FILE: &str = "variable.json";

static GLOBAL_STORE: Lazy<StatementStore> = Lazy::new(|| StatementStore::new(DEFAULT_STORE_FILE));

/// On-disk document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedStatement {
    pub current_execution: String,
}

/// Single-slot store for the most recently reduced statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementStore {
    path: PathBuf,
}

impl StatementStore {
    /// Store backed by `path`; nothing is touched until the first update
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by `path`, creating missing parent directories
    pub fn init(path: impl Into<PathBuf>) -> ChainResult<Self> {
        let store = Self::new(path);
        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(store)
    }

    /// Store using [`DEFAULT_STORE_FILE`] inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_STORE_FILE))
    }

    /// Process-wide store in the working directory
    pub fn global() -> &'static StatementStore {
        &GLOBAL_STORE
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the stored statement
    pub fn update(&self, statement: &str) -> ChainResult<()> {
        let document = PersistedStatement {
            current_execution: statement.to_string(),
        };
        fs::write(&self.path, serde_json::to_string(&document)?)?;
        tracing::debug!(path = %self.path.display(), statement, "updated current statement");
        Ok(())
    }

    /// Read the stored document, `None` before the first update
    pub fn get(&self) -> ChainResult<Option<PersistedStatement>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// The stored statement text
    pub fn current(&self) -> ChainResult<Option<String>> {
        Ok(self.get()?.map(|doc| doc.current_execution))
    }

    /// First subscript key of the stored statement's target
    pub fn first_key(&self) -> ChainResult<Option<String>> {
        match self.current()? {
            Some(statement) => extract_first_key(&statement),
            None => Ok(None),
        }
    }
}

/// First key of the assignment target's subscript
///
/// `df.at['a','b'] = 5` yields `a`. Statements without a target, or whose
/// target has no subscript, yield `None`.
pub fn extract_first_key(statement: &str) -> ChainResult<Option<String>> {
    let parsed = parse_statement(statement)?;
    let target = match parsed.target {
        Some(target) => assemble(&target)?,
        None => return Ok(None),
    };

    let key = regex!(r"\[(.*)\]")
        .captures(&target)
        .and_then(|caps| caps.get(1))
        .and_then(|keys| keys.as_str().split(',').next())
        .map(|key| key.trim().trim_matches(|c| c == '\'' || c == '"').to_string());
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = StatementStore::in_dir(dir.path());
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(store.first_key().unwrap(), None);
    }

    #[test]
    fn test_update_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = StatementStore::in_dir(dir.path());
        store.update("x='1'").unwrap();
        store.update("y='2'").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("y='2'"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"current_execution":"y='2'"}"#);
    }

    #[test]
    fn test_init_creates_parents() {
        let dir = TempDir::new().unwrap();
        let store = StatementStore::init(dir.path().join("nested/state/variable.json")).unwrap();
        store.update("x").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_extract_first_key() {
        assert_eq!(extract_first_key("x['a','b'] = 5").unwrap().as_deref(), Some("a"));
        assert_eq!(
            extract_first_key("df.at[\"row\", 'col'] = LOOKUP(k, v)").unwrap().as_deref(),
            Some("row")
        );
        assert_eq!(extract_first_key("x = 5").unwrap(), None);
        assert_eq!(extract_first_key("LOOKUP(k, v)").unwrap(), None);
    }

    #[test]
    fn test_first_key_from_store() {
        let dir = TempDir::new().unwrap();
        let store = StatementStore::in_dir(dir.path());
        store.update("df.at['2021','revenue']='5'").unwrap();
        assert_eq!(store.first_key().unwrap().as_deref(), Some("2021"));
    }
}
