use crate::config::Settings;
use crate::error::Result;
use crate::models::Snippet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Read access to the configured snippets and matching switches.
pub trait SnippetRegistry: Send + Sync {
    /// All snippets in registry order.
    fn snippets(&self) -> Arc<Vec<Snippet>>;
    fn buffer_length(&self) -> usize;
    fn is_enabled(&self) -> bool;
}

/// Load all snippets from a JSON file
pub fn load_snippets(path: &Path) -> Result<Vec<Snippet>> {
    let content = fs::read_to_string(path)?;

    // Handle empty database file
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    Ok(serde_json::from_str(&content)?)
}

/// Snippets read from a JSON file, reloaded when the file changes. A file
/// that fails to parse keeps the previously loaded snippets.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    buffer_length: usize,
    enabled: AtomicBool,
    // Modification time of the last load attempt; `None` until the first one
    cached: Mutex<(Option<Option<SystemTime>>, Arc<Vec<Snippet>>)>,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            path: path.into(),
            buffer_length: settings.buffer_length,
            enabled: AtomicBool::new(settings.enabled),
            cached: Mutex::new((None, Arc::new(Vec::new()))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "snippet matching toggled");
    }
}

impl SnippetRegistry for FileRegistry {
    fn snippets(&self) -> Arc<Vec<Snippet>> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();

        let Ok(mut cached) = self.cached.lock() else {
            return Arc::new(Vec::new());
        };

        if cached.0 == Some(modified) {
            return Arc::clone(&cached.1);
        }
        cached.0 = Some(modified);

        match load_snippets(&self.path) {
            Ok(snippets) => {
                tracing::info!(
                    path = %self.path.display(),
                    count = snippets.len(),
                    "loaded snippets"
                );
                cached.1 = Arc::new(snippets);
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to load snippets"
                );
            }
        }
        Arc::clone(&cached.1)
    }

    fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnippetKind;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch_later(path: &Path, secs: u64) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn snippets_load_in_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(
            &path,
            r#"[
                { "key": "btw", "value": "by the way" },
                { "key": "now", "type": "js", "value": "() => Date.now()" }
            ]"#,
        )
        .unwrap();

        let registry = FileRegistry::new(&path, &Settings::default());
        let snippets = registry.snippets();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].key, "btw");
        assert_eq!(snippets[1].kind, SnippetKind::Js);
        assert_eq!(registry.buffer_length(), 30);
        assert!(registry.is_enabled());
    }

    #[test]
    fn edits_are_picked_up_and_bad_edits_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(&path, r#"[{ "key": "a", "value": "1" }]"#).unwrap();
        let registry = FileRegistry::new(&path, &Settings::default());
        assert_eq!(registry.snippets()[0].value, "1");

        fs::write(&path, r#"[{ "key": "a", "value": "2" }]"#).unwrap();
        touch_later(&path, 2);
        assert_eq!(registry.snippets()[0].value, "2");

        fs::write(&path, "[{ not json").unwrap();
        touch_later(&path, 4);
        assert_eq!(registry.snippets()[0].value, "2");
    }

    #[test]
    fn missing_file_is_an_empty_registry() {
        let registry = FileRegistry::new("/nonexistent/snippets.json", &Settings::default());
        assert!(registry.snippets().is_empty());
    }

    #[test]
    fn enabled_flag_toggles() {
        let settings = Settings {
            enabled: false,
            ..Settings::default()
        };
        let registry = FileRegistry::new("/nonexistent/snippets.json", &settings);
        assert!(!registry.is_enabled());
        registry.set_enabled(true);
        assert!(registry.is_enabled());
    }
}
