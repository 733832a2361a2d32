//! Writing the rendered site to disk.
//!
//! Stage 3 of the build pipeline. Takes a [`RenderedSite`] and materializes it
//! in the output directory, consulting the [render cache](crate::cache) so
//! that rebuilds only touch what changed.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Home page: every post, newest first
//! ├── hello-world/
//! │   └── index.html             # One directory per post
//! ├── tags/
//! │   └── rust/
//! │       └── index.html         # Posts carrying a tag
//! ├── feed.xml                   # RSS 2.0
//! └── .render-cache.json         # Fingerprint + per-file hashes
//! ```
//!
//! Anything else in the output directory is left alone. Only files the
//! previous build recorded in its cache manifest are ever removed.

use crate::cache::{self, CacheStats, RenderCache};
use crate::highlight::HighlighterRegistry;
use crate::render::{self, RenderError, RenderedSite};
use crate::scan::{self, Content, ScanError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("refusing to write outside the output directory: {0}")]
    UnsafePath(String),
}

/// Outcome of a full build.
#[derive(Debug)]
pub struct BuildResult {
    pub content: Content,
    /// `None` when the cache showed nothing changed and rendering was skipped.
    pub site: Option<RenderedSite>,
    pub stats: CacheStats,
}

/// Scan `source`, render, and write the site to `output_dir`.
///
/// With `use_cache`, an unchanged input fingerprint skips rendering entirely,
/// and otherwise only files whose bytes changed are rewritten. Without it
/// every file is rewritten. Either way, files the previous build recorded
/// that the site no longer produces are removed.
pub fn build(
    source: &Path,
    output_dir: &Path,
    use_cache: bool,
    highlighters: &HighlighterRegistry,
) -> Result<BuildResult, GenerateError> {
    let content = scan::scan(source)?;
    let fingerprint = cache::fingerprint(&content.config, &content.documents)?;

    let mut cache = RenderCache::load(output_dir);
    if !use_cache {
        cache.invalidate();
    }

    if cache.is_fresh(&fingerprint, output_dir) {
        log::info!("inputs unchanged, skipping render ({fingerprint})");
        let stats = CacheStats {
            skipped: true,
            unchanged: cache.entries.len() as u32,
            ..CacheStats::default()
        };
        return Ok(BuildResult {
            content,
            site: None,
            stats,
        });
    }

    let site = render::render(&content.config, &content.documents, highlighters)?;
    let stats = write_site(&site, output_dir, &mut cache)?;
    cache.fingerprint = fingerprint;
    cache.save(output_dir)?;
    log::info!("wrote {}: {stats}", output_dir.display());

    Ok(BuildResult {
        content,
        site: Some(site),
        stats,
    })
}

/// Scan and render in memory without touching the output directory.
pub fn check(
    source: &Path,
    highlighters: &HighlighterRegistry,
) -> Result<(Content, RenderedSite), GenerateError> {
    let content = scan::scan(source)?;
    let site = render::render(&content.config, &content.documents, highlighters)?;
    Ok((content, site))
}

/// Write every file of `site` under `output_dir`, updating `cache` in place.
///
/// Files whose content hash matches the cache and that still exist on disk are
/// left untouched. Files the cache recorded but `site` no longer produces are
/// deleted, along with any directories that become empty.
pub fn write_site(
    site: &RenderedSite,
    output_dir: &Path,
    cache: &mut RenderCache,
) -> Result<CacheStats, GenerateError> {
    fs::create_dir_all(output_dir)?;

    let mut stats = CacheStats::default();
    let mut current = BTreeMap::new();

    for (rel_path, contents) in site.files() {
        if !is_contained(&rel_path) {
            return Err(GenerateError::UnsafePath(rel_path));
        }
        let hash = cache::hash_content(contents.as_bytes());
        if cache.is_unchanged(&rel_path, &hash, output_dir) {
            log::debug!("unchanged {rel_path}");
            stats.keep();
        } else {
            let path = output_dir.join(&rel_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
            log::debug!("wrote {rel_path}");
            stats.write();
        }
        current.insert(rel_path, hash);
    }

    let stale: Vec<String> = cache.stale_paths(&current).map(str::to_string).collect();
    for rel_path in stale {
        if !is_contained(&rel_path) {
            log::warn!("ignoring cache entry outside the output directory: {rel_path}");
            continue;
        }
        let path = output_dir.join(&rel_path);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("removed {rel_path}");
                stats.remove();
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        remove_empty_parents(&path, output_dir);
    }

    cache.entries = current;
    Ok(stats)
}

/// True for a non-empty relative path made only of normal components.
fn is_contained(rel_path: &str) -> bool {
    let path = Path::new(rel_path);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Remove now-empty directories between `path` and `root` (exclusive).
fn remove_empty_parents(path: &Path, root: &Path) {
    let mut dir = path.parent();
    while let Some(d) = dir {
        if d == root || !d.starts_with(root) {
            break;
        }
        // Fails on non-empty directories, which ends the climb.
        if fs::remove_dir(d).is_err() {
            break;
        }
        dir = d.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MANIFEST_FILENAME;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn registry() -> HighlighterRegistry {
        HighlighterRegistry::with_defaults()
    }

    // =========================================================================
    // build
    // =========================================================================

    #[test]
    fn build_writes_expected_layout() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        let result = build(source.path(), out.path(), true, &registry()).unwrap();

        for rel in [
            "index.html",
            "hello-world/index.html",
            "rust-and-csharp/index.html",
            "part-one/index.html",
            "tags/rust/index.html",
            "tags/meta/index.html",
            "feed.xml",
            MANIFEST_FILENAME,
        ] {
            assert!(out.path().join(rel).is_file(), "missing {rel}");
        }
        assert!(!result.stats.skipped);
        assert_eq!(result.stats.unchanged, 0);
        assert_eq!(result.stats.removed, 0);
    }

    #[test]
    fn written_pages_match_render() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        let result = build(source.path(), out.path(), true, &registry()).unwrap();
        let site = result.site.unwrap();

        let on_disk = fs::read_to_string(out.path().join("hello-world/index.html")).unwrap();
        assert_eq!(on_disk, page_html(&site, "hello-world"));
        assert_eq!(
            feed_slugs(&site),
            vec!["part-one", "rust-and-csharp", "hello-world"]
        );
    }

    #[test]
    fn second_build_is_skipped() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        let first = build(source.path(), out.path(), true, &registry()).unwrap();
        let second = build(source.path(), out.path(), true, &registry()).unwrap();

        assert!(second.stats.skipped);
        assert!(second.site.is_none());
        assert_eq!(second.stats.unchanged, first.stats.written);
    }

    #[test]
    fn no_cache_rewrites_everything() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        let first = build(source.path(), out.path(), true, &registry()).unwrap();
        let again = build(source.path(), out.path(), false, &registry()).unwrap();

        assert!(!again.stats.skipped);
        assert_eq!(again.stats.written, first.stats.written);
        assert_eq!(again.stats.unchanged, 0);
    }

    #[test]
    fn no_cache_still_removes_pages_of_deleted_posts() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        build(source.path(), out.path(), true, &registry()).unwrap();

        fs::remove_file(source.path().join("posts/2024-01-05-hello-world.md")).unwrap();
        let result = build(source.path(), out.path(), false, &registry()).unwrap();
        assert_eq!(result.stats.removed, 2);
        assert!(!out.path().join("hello-world").exists());
        assert!(!out.path().join("tags/meta").exists());

        // The manifest no longer mentions them either.
        let cache = RenderCache::load(out.path());
        assert!(!cache.entries.contains_key("hello-world/index.html"));
        let again = build(source.path(), out.path(), true, &registry()).unwrap();
        assert!(again.stats.skipped);
    }

    #[test]
    fn deleted_output_file_is_restored() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        build(source.path(), out.path(), true, &registry()).unwrap();
        fs::remove_file(out.path().join("hello-world/index.html")).unwrap();

        let result = build(source.path(), out.path(), true, &registry()).unwrap();
        assert!(!result.stats.skipped);
        assert_eq!(result.stats.written, 1);
        assert!(out.path().join("hello-world/index.html").is_file());
    }

    #[test]
    fn editing_one_post_rewrites_only_affected_files() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        let first = build(source.path(), out.path(), true, &registry()).unwrap();

        let post = source.path().join("posts/series/part-one.md");
        let text = fs::read_to_string(&post).unwrap();
        fs::write(&post, format!("{text}\nAn extra paragraph.\n")).unwrap();

        let result = build(source.path(), out.path(), true, &registry()).unwrap();
        assert!(!result.stats.skipped);
        // Only the post body changed; listings show titles and dates only.
        assert_eq!(result.stats.written, 1);
        assert_eq!(result.stats.unchanged, first.stats.written - 1);
    }

    #[test]
    fn removed_post_removes_its_page_and_tag() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        build(source.path(), out.path(), true, &registry()).unwrap();
        assert!(out.path().join("tags/meta/index.html").is_file());

        fs::remove_file(source.path().join("posts/2024-01-05-hello-world.md")).unwrap();
        let result = build(source.path(), out.path(), true, &registry()).unwrap();

        assert!(!out.path().join("hello-world").exists());
        assert!(!out.path().join("tags/meta").exists());
        assert_eq!(result.stats.removed, 2);
        assert!(out.path().join("tags/rust/index.html").is_file());
    }

    #[test]
    fn unrelated_output_files_are_kept() {
        let source = setup_fixtures();
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("CNAME"), "vertin.dev").unwrap();
        build(source.path(), out.path(), false, &registry()).unwrap();
        fs::remove_file(source.path().join("posts/2024-01-05-hello-world.md")).unwrap();
        build(source.path(), out.path(), true, &registry()).unwrap();

        assert!(out.path().join("CNAME").is_file());
    }

    #[test]
    fn build_propagates_scan_errors() {
        let source = setup_fixtures();
        fs::write(source.path().join("posts/broken.md"), "no front matter").unwrap();
        let out = TempDir::new().unwrap();
        let err = build(source.path(), out.path(), true, &registry()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Scan(ScanError::MissingFrontMatter(_))
        ));
        assert!(!out.path().join("index.html").exists());
    }

    #[test]
    fn build_propagates_duplicate_slugs() {
        let source = setup_fixtures();
        fs::write(
            source.path().join("posts/copy.md"),
            "+++\ntitle = \"Copy\"\nslug = \"hello-world\"\ndate = 2024-02-01\n+++\nbody\n",
        )
        .unwrap();
        let out = TempDir::new().unwrap();
        let err = build(source.path(), out.path(), true, &registry()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Render(RenderError::DuplicateSlug(ref s)) if s == "hello-world"
        ));
    }

    // =========================================================================
    // check
    // =========================================================================

    #[test]
    fn check_renders_without_writing() {
        let source = setup_fixtures();
        let (content, site) = check(source.path(), &registry()).unwrap();
        assert_eq!(site.pages.len(), content.documents.len());
        assert!(!source.path().join("dist").exists());
    }

    // =========================================================================
    // write_site
    // =========================================================================

    #[test]
    fn write_site_records_hashes() {
        let source = setup_fixtures();
        let (_, site) = check(source.path(), &registry()).unwrap();
        let out = TempDir::new().unwrap();
        let mut cache = RenderCache::empty();
        let stats = write_site(&site, out.path(), &mut cache).unwrap();

        assert_eq!(stats.written as usize, site.files().len());
        assert_eq!(
            cache.entries.get("feed.xml"),
            Some(&cache::hash_content(site.feed.xml.as_bytes()))
        );
    }

    #[test]
    fn write_site_refuses_paths_outside_output() {
        let source = setup_fixtures();
        let (_, mut site) = check(source.path(), &registry()).unwrap();
        let mut page = site.pages["hello-world"].clone();
        page.slug = "../escape".into();
        site.pages.insert(page.slug.clone(), page);

        let parent = TempDir::new().unwrap();
        let out = parent.path().join("dist");
        let err = write_site(&site, &out, &mut RenderCache::empty()).unwrap_err();
        assert!(matches!(err, GenerateError::UnsafePath(ref p) if p == "../escape/index.html"));
        assert!(!parent.path().join("escape").exists());
    }

    #[test]
    fn stale_entries_outside_output_are_not_deleted() {
        let source = setup_fixtures();
        let (_, site) = check(source.path(), &registry()).unwrap();
        let parent = TempDir::new().unwrap();
        let out = parent.path().join("dist");
        let victim = parent.path().join("keep.txt");
        fs::write(&victim, "precious").unwrap();

        let mut cache = RenderCache::empty();
        cache.entries.insert("../keep.txt".into(), "h".into());
        cache.entries.insert("/etc/hostname".into(), "h".into());
        let stats = write_site(&site, &out, &mut cache).unwrap();

        assert!(victim.is_file());
        assert_eq!(stats.removed, 0);
        assert!(!cache.entries.contains_key("../keep.txt"));
    }

    #[test]
    fn is_contained_accepts_only_plain_relative_paths() {
        assert!(is_contained("index.html"));
        assert!(is_contained("tags/rust/index.html"));
        assert!(!is_contained(""));
        assert!(!is_contained("/index.html"));
        assert!(!is_contained("../x"));
        assert!(!is_contained("a/../../x"));
        assert!(!is_contained("./index.html"));
    }

    #[test]
    fn remove_empty_parents_stops_at_root() {
        let out = TempDir::new().unwrap();
        let nested = out.path().join("tags/rust");
        fs::create_dir_all(&nested).unwrap();
        remove_empty_parents(&nested.join("index.html"), out.path());
        assert!(!out.path().join("tags").exists());
        assert!(out.path().is_dir());
    }
}
