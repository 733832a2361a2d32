//! Shared test utilities for the simple-blog test suite.
//!
//! Provides fixture setup plus lookup helpers and bulk extractors over
//! [`Content`] and [`RenderedSite`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let content = scan(tmp.path()).unwrap();
//!
//! let hello = find_document(&content, "hello-world");
//! assert_eq!(hello.tags, vec!["meta"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::render::RenderedSite;
use crate::scan::Content;
use crate::types::Document;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a scanned document by slug. Panics if not found.
pub fn find_document<'a>(content: &'a Content, slug: &str) -> &'a Document {
    content
        .documents
        .iter()
        .find(|d| d.slug == slug)
        .unwrap_or_else(|| {
            let slugs = document_slugs(content);
            panic!("document '{slug}' not found. Available: {slugs:?}")
        })
}

/// HTML of a rendered post page. Panics if not found.
pub fn page_html<'a>(site: &'a RenderedSite, slug: &str) -> &'a str {
    site.pages
        .get(slug)
        .map(|p| p.html.as_str())
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = site.pages.keys().map(String::as_str).collect();
            panic!("page '{slug}' not found. Available: {slugs:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All document slugs in scan order.
pub fn document_slugs(content: &Content) -> Vec<&str> {
    content.documents.iter().map(|d| d.slug.as_str()).collect()
}

/// Feed entry slugs in feed order.
pub fn feed_slugs(site: &RenderedSite) -> Vec<&str> {
    site.feed.entries.iter().map(|e| e.slug.as_str()).collect()
}
