//! Render cache for incremental builds.
//!
//! Rendering is pure, so its output is fully determined by its inputs. This
//! module uses that to skip work on rebuilds: a build whose inputs have not
//! changed does nothing, and a build whose inputs did change rewrites only
//! the files whose bytes differ.
//!
//! # Design
//!
//! ## Fingerprint
//!
//! SHA-256 over the JSON of the site config and the documents sorted by
//! slug, plus the crate version (templates and highlighters are code, so a
//! new binary must re-render). Sorting makes the fingerprint independent of
//! scan order, matching the renderer's own order independence.
//!
//! ## Per-file hashes
//!
//! Each output file is recorded as `relative path → SHA-256 of contents`.
//! After a render, a file is written only if its hash differs from the
//! recorded one or the file disappeared from disk. Files recorded by the
//! previous build that the new site no longer produces (a deleted post, a
//! tag nobody uses any more) are removed, so the output directory always
//! holds exactly one page per document.
//!
//! ## Storage
//!
//! The manifest is a JSON file at `<output_dir>/.render-cache.json`.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `build` to [invalidate](RenderCache::invalidate) the
//! manifest: everything is re-rendered and rewritten, and files recorded by
//! the previous build are still cleaned up.

use crate::config::SiteConfig;
use crate::types::Document;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

/// Name of the cache manifest file within the output directory.
pub const MANIFEST_FILENAME: &str = ".render-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// On-disk record of the last build.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderCache {
    pub version: u32,
    /// Fingerprint of the inputs the recorded files were rendered from.
    pub fingerprint: String,
    /// Relative output path → SHA-256 of its contents.
    pub entries: BTreeMap<String, String>,
}

impl RenderCache {
    /// Create an empty manifest (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            fingerprint: String::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(MANIFEST_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("ignoring unreadable {}: {e}", path.display());
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let path = output_dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Forget the fingerprint and file hashes but keep the recorded paths.
    ///
    /// The next write rewrites every file and still removes stale ones.
    pub fn invalidate(&mut self) {
        self.fingerprint.clear();
        for hash in self.entries.values_mut() {
            hash.clear();
        }
    }

    /// True when the recorded build came from `fingerprint` and all its
    /// files are still on disk.
    pub fn is_fresh(&self, fingerprint: &str, output_dir: &Path) -> bool {
        !self.entries.is_empty()
            && self.fingerprint == fingerprint
            && self
                .entries
                .keys()
                .all(|path| output_dir.join(path).is_file())
    }

    /// True when `path` was recorded with `content_hash` and still exists.
    pub fn is_unchanged(&self, path: &str, content_hash: &str, output_dir: &Path) -> bool {
        self.entries.get(path).is_some_and(|h| h == content_hash)
            && output_dir.join(path).is_file()
    }

    /// Recorded paths that are absent from `current`.
    pub fn stale_paths<'a>(
        &'a self,
        current: &'a BTreeMap<String, String>,
    ) -> impl Iterator<Item = &'a str> {
        self.entries
            .keys()
            .filter(|path| !current.contains_key(*path))
            .map(String::as_str)
    }
}

/// SHA-256 fingerprint of the render inputs, as a hex string.
pub fn fingerprint(config: &SiteConfig, documents: &[Document]) -> serde_json::Result<String> {
    let mut sorted: Vec<&Document> = documents.iter().collect();
    sorted.sort_by(|a, b| a.slug.cmp(&b.slug).then_with(|| a.date.cmp(&b.date)));

    let mut hasher = Sha256::new();
    hasher.update(b"simple-blog\0");
    hasher.update(env!("CARGO_PKG_VERSION").as_bytes());
    hasher.update(b"\0");
    hasher.update(serde_json::to_vec(config)?);
    hasher.update(b"\0");
    hasher.update(serde_json::to_vec(&sorted)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 of file contents, returned as a hex string.
pub fn hash_content(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Summary of what a build did to the output directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Inputs matched the previous build; nothing was rendered.
    pub skipped: bool,
    pub written: u32,
    pub unchanged: u32,
    pub removed: u32,
}

impl CacheStats {
    pub fn write(&mut self) {
        self.written += 1;
    }

    pub fn keep(&mut self) {
        self.unchanged += 1;
    }

    pub fn remove(&mut self) {
        self.removed += 1;
    }

    pub fn total(&self) -> u32 {
        self.written + self.unchanged
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return write!(f, "up to date, nothing rendered");
        }
        write!(
            f,
            "{} written, {} unchanged",
            self.written, self.unchanged
        )?;
        if self.removed > 0 {
            write!(f, ", {} removed", self.removed)?;
        }
        Ok(())
    }
}
