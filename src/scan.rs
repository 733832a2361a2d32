//! Content scanning.
//!
//! Stage 1 of the build pipeline. Loads the site config and every post from
//! the content directory, producing the inputs of [`render`](crate::render).
//!
//! ## Directory Structure
//!
//! ```text
//! content/                         # Content root
//! ├── config.toml                  # Site configuration (title required)
//! └── posts/                       # Walked recursively
//!     ├── 2024-01-05-hello.md      # Date prefix is optional
//!     ├── rust-tips.md
//!     └── series/
//!         └── part-one.md
//! ```
//!
//! ## Front Matter
//!
//! Every post starts with a TOML block fenced by `+++` lines:
//!
//! ```text
//! +++
//! title = "Hello"
//! date = 2024-01-05            # or "2024-01-05"
//! tags = ["rust", "notes"]     # optional
//! slug = "custom-slug"         # optional
//! description = "Summary"      # optional
//! +++
//!
//! Markdown body...
//! ```
//!
//! `slug` and `date` fall back to the filename (see [`naming`](crate::naming)).
//! Unknown keys are rejected. Hidden files and directories are skipped.
//!
//! Duplicate slugs are not detected here; the renderer rejects them.

use crate::config::{self, ConfigError, SiteConfig};
use crate::naming::{parse_post_name, slugify};
use crate::types::Document;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("No +++ front matter block in {0}")]
    MissingFrontMatter(PathBuf),
    #[error("Front matter error in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid date {1:?} in {0} (expected YYYY-MM-DD)")]
    InvalidDate(PathBuf, String),
    #[error("No date in front matter or filename: {0}")]
    MissingDate(PathBuf),
    #[error("Cannot derive a slug for {0}")]
    EmptySlug(PathBuf),
}

/// Directory under the content root holding the posts.
pub const POSTS_DIR: &str = "posts";

const FENCE: &str = "+++";

/// Everything loaded from the content directory.
#[derive(Debug)]
pub struct Content {
    pub config: SiteConfig,
    /// Posts in path order.
    pub documents: Vec<Document>,
    /// Source file of each document, relative to the content root.
    /// Same length and order as `documents`.
    pub sources: Vec<PathBuf>,
}

impl Content {
    /// Documents paired with their source paths.
    pub fn entries(&self) -> impl Iterator<Item = (&Document, &Path)> {
        self.documents
            .iter()
            .zip(self.sources.iter().map(PathBuf::as_path))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrontMatter {
    title: String,
    #[serde(default)]
    date: Option<toml::Value>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Load config and posts from `root`.
///
/// The config is loaded first, so an invalid config fails before any post is
/// read. A missing `posts/` directory means an empty blog.
pub fn scan(root: &Path) -> Result<Content, ScanError> {
    let config = config::load_config(root)?;

    let posts_dir = root.join(POSTS_DIR);
    let mut documents = Vec::new();
    let mut sources = Vec::new();

    if posts_dir.is_dir() {
        for path in collect_posts(&posts_dir)? {
            let content = fs::read_to_string(&path)?;
            documents.push(parse_post(&path, &content)?);
            sources.push(path.strip_prefix(root).unwrap_or(&path).to_path_buf());
        }
    } else {
        log::info!("no {} directory in {}", POSTS_DIR, root.display());
    }
    log::debug!("scanned {} posts", documents.len());

    Ok(Content {
        config,
        documents,
        sources,
    })
}

/// All `.md` files under `dir`, sorted by path, skipping hidden entries.
fn collect_posts(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut posts = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("md"))
                .unwrap_or(false)
        {
            posts.push(path.to_path_buf());
        }
    }
    Ok(posts)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Parse one post file into a [`Document`].
///
/// `path` is used for the filename fallbacks and error messages only.
pub fn parse_post(path: &Path, content: &str) -> Result<Document, ScanError> {
    let (front, body) = split_front_matter(content)
        .ok_or_else(|| ScanError::MissingFrontMatter(path.to_path_buf()))?;
    let front: FrontMatter = toml::from_str(front).map_err(|source| ScanError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let parsed = parse_post_name(&stem);

    let date = match &front.date {
        Some(value) => front_matter_date(value)
            .ok_or_else(|| ScanError::InvalidDate(path.to_path_buf(), value.to_string()))?,
        None => parsed
            .date
            .ok_or_else(|| ScanError::MissingDate(path.to_path_buf()))?,
    };

    let slug = match front.slug.as_deref() {
        Some(explicit) => slugify(explicit),
        None => parsed.slug,
    };
    if slug.is_empty() {
        return Err(ScanError::EmptySlug(path.to_path_buf()));
    }

    Ok(Document {
        slug,
        title: front.title,
        date,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
        tags: front.tags,
        description: front.description.filter(|d| !d.trim().is_empty()),
    })
}

/// Split `+++`-fenced front matter from the body.
///
/// Returns `None` if the file does not open with a fence or the fence is
/// never closed.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix(FENCE)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Accept a TOML date (`2024-01-05`, or a datetime with a date part) or a
/// `"YYYY-MM-DD"` string.
fn front_matter_date(value: &toml::Value) -> Option<NaiveDate> {
    match value {
        toml::Value::Datetime(dt) => {
            let d = dt.date?;
            NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day))
        }
        toml::Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn parse(name: &str, content: &str) -> Result<Document, ScanError> {
        parse_post(Path::new(name), content)
    }

    // =========================================================================
    // Front matter parsing
    // =========================================================================

    #[test]
    fn parse_full_front_matter() {
        let doc = parse(
            "whatever.md",
            "+++\ntitle = \"Hello\"\ndate = 2024-01-05\ntags = [\"rust\"]\nslug = \"Hi There\"\ndescription = \"Summary\"\n+++\n\nBody text\n",
        )
        .unwrap();
        assert_eq!(doc.title, "Hello");
        assert_eq!(doc.date, date("2024-01-05"));
        assert_eq!(doc.tags, vec!["rust"]);
        assert_eq!(doc.slug, "hi-there");
        assert_eq!(doc.description.as_deref(), Some("Summary"));
        assert_eq!(doc.body, "Body text\n");
    }

    #[test]
    fn string_date_accepted() {
        let doc = parse("x.md", "+++\ntitle = \"X\"\ndate = \"2023-12-31\"\n+++\n").unwrap();
        assert_eq!(doc.date, date("2023-12-31"));
    }

    #[test]
    fn datetime_uses_date_part() {
        let doc = parse("x.md", "+++\ntitle = \"X\"\ndate = 2023-12-31T23:59:00Z\n+++\n").unwrap();
        assert_eq!(doc.date, date("2023-12-31"));
    }

    #[test]
    fn filename_supplies_slug_and_date() {
        let doc = parse("posts/2024-02-10-My-First-Post.md", "+++\ntitle = \"First\"\n+++\nhi").unwrap();
        assert_eq!(doc.slug, "my-first-post");
        assert_eq!(doc.date, date("2024-02-10"));
        assert_eq!(doc.body, "hi");
    }

    #[test]
    fn front_matter_date_beats_filename() {
        let doc = parse(
            "2024-02-10-post.md",
            "+++\ntitle = \"P\"\ndate = 2020-01-01\n+++\n",
        )
        .unwrap();
        assert_eq!(doc.date, date("2020-01-01"));
    }

    #[test]
    fn crlf_line_endings() {
        let doc = parse("x.md", "+++\r\ntitle = \"X\"\r\ndate = 2024-01-01\r\n+++\r\nbody\r\n").unwrap();
        assert_eq!(doc.title, "X");
        assert_eq!(doc.body, "body\r\n");
    }

    #[test]
    fn missing_front_matter_is_error() {
        let err = parse("x.md", "# Just markdown\n").unwrap_err();
        assert!(matches!(err, ScanError::MissingFrontMatter(_)));
    }

    #[test]
    fn unclosed_front_matter_is_error() {
        let err = parse("x.md", "+++\ntitle = \"X\"\n").unwrap_err();
        assert!(matches!(err, ScanError::MissingFrontMatter(_)));
    }

    #[test]
    fn missing_title_is_error() {
        let err = parse("2024-01-01-x.md", "+++\ntags = []\n+++\n").unwrap_err();
        assert!(matches!(err, ScanError::FrontMatter { .. }));
    }

    #[test]
    fn unknown_front_matter_key_is_error() {
        let err = parse("2024-01-01-x.md", "+++\ntitle = \"X\"\ndraft = true\n+++\n").unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn missing_date_is_error() {
        let err = parse("undated.md", "+++\ntitle = \"X\"\n+++\n").unwrap_err();
        assert!(matches!(err, ScanError::MissingDate(_)));
    }

    #[test]
    fn malformed_date_is_error() {
        let err = parse("x.md", "+++\ntitle = \"X\"\ndate = \"yesterday\"\n+++\n").unwrap_err();
        assert!(matches!(err, ScanError::InvalidDate(_, _)));
    }

    #[test]
    fn unsluggable_name_is_error() {
        let err = parse("2024-01-01-日本.md", "+++\ntitle = \"X\"\n+++\n").unwrap_err();
        assert!(matches!(err, ScanError::EmptySlug(_)));
    }

    #[test]
    fn unsluggable_front_matter_slug_is_error() {
        let err = parse(
            "2024-01-01-fine-name.md",
            "+++\ntitle = \"X\"\nslug = \"日本\"\n+++\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::EmptySlug(_)));
    }

    #[test]
    fn blank_description_dropped() {
        let doc = parse("2024-01-01-x.md", "+++\ntitle = \"X\"\ndescription = \"  \"\n+++\n").unwrap();
        assert_eq!(doc.description, None);
    }

    // =========================================================================
    // Directory scanning
    // =========================================================================

    #[test]
    fn scan_fixture_content() {
        let tmp = setup_fixtures();
        let content = scan(tmp.path()).unwrap();

        assert_eq!(content.config.title, "vertin.dev");
        assert_eq!(content.documents.len(), content.sources.len());
        assert_eq!(
            document_slugs(&content),
            vec!["hello-world", "rust-and-csharp", "part-one"]
        );

        let hello = find_document(&content, "hello-world");
        assert_eq!(hello.date, date("2024-01-05"));
        let part_one = find_document(&content, "part-one");
        assert_eq!(part_one.tags, vec!["series"]);
    }

    #[test]
    fn scan_records_relative_sources() {
        let tmp = setup_fixtures();
        let content = scan(tmp.path()).unwrap();
        let (_, source) = content
            .entries()
            .find(|(doc, _)| doc.slug == "part-one")
            .unwrap();
        assert_eq!(source, Path::new("posts/series/part-one.md"));
    }

    #[test]
    fn scan_skips_hidden_and_non_markdown() {
        let tmp = setup_fixtures();
        let posts = tmp.path().join(POSTS_DIR);
        fs::write(posts.join(".draft.md"), "not front matter").unwrap();
        fs::create_dir_all(posts.join(".hidden")).unwrap();
        fs::write(posts.join(".hidden/secret.md"), "nope").unwrap();
        fs::write(posts.join("notes.txt"), "ignored").unwrap();

        let content = scan(tmp.path()).unwrap();
        assert_eq!(content.documents.len(), 3);
    }

    #[test]
    fn scan_without_posts_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "title = \"Empty\"\n").unwrap();
        let content = scan(tmp.path()).unwrap();
        assert!(content.documents.is_empty());
    }

    #[test]
    fn scan_fails_on_invalid_config_first() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("config.toml"), "description = \"no title\"\n").unwrap();
        // A broken post must not be reached.
        fs::write(tmp.path().join(POSTS_DIR).join("broken.md"), "nope").unwrap();
        let err = scan(tmp.path()).unwrap_err();
        assert!(matches!(err, ScanError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn scan_reports_broken_post() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join(POSTS_DIR).join("broken.md"), "nope").unwrap();
        let err = scan(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("broken.md"));
    }
}
