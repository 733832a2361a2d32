//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every post and tag is
//! shown by its positional index and title first, with source files and
//! output paths as secondary context. The output reads as a content
//! inventory while still letting users trace each entry to a file.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Posts
//! 001 Hello, world (2024-01-05)
//!     Source: posts/2024-01-05-hello-world.md
//!     Tags: meta
//!     Description: Why this blog exists.
//!
//! Config
//!     Title: vertin.dev
//!     Theme: dark
//!     Links: 2
//! ```
//!
//! ## Build
//!
//! ```text
//! Home → index.html
//! 001 Series, part one → part-one/index.html
//! 002 Hello, world → hello-world/index.html
//!
//! Tags
//! 001 #meta (1 post) → tags/meta/index.html
//!
//! Feed → feed.xml (2 entries)
//! Cache: 5 written, 0 unchanged (5 files)
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::generate::BuildResult;
use crate::naming::slugify;
use crate::render::{FEED_PATH, RenderedSite};
use crate::scan::Content;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn count_noun(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Positional index + title, with an optional post count.
///
/// ```text
/// 001 Hello, world
/// 001 #rust (2 posts)
/// ```
fn entity_header(index: usize, title: &str, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} {} ({})", format_index(index), title, count_noun(n, "post", "posts")),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format scan output: every post with its source file, then the config.
pub fn format_scan_output(content: &Content) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];

    if content.documents.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, (doc, source)) in content.entries().enumerate() {
        let title = format!("{} ({})", doc.title, doc.date.format("%Y-%m-%d"));
        lines.push(entity_header(i + 1, &title, None));
        lines.push(format!("{}Source: {}", indent(1), source.display()));
        if !doc.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), doc.tags.join(", ")));
        }
        if let Some(desc) = &doc.description {
            lines.push(format!("{}Description: {}", indent(1), truncate_desc(desc, 60)));
        }
    }

    let config = &content.config;
    lines.push(String::new());
    lines.push("Config".to_string());
    lines.push(format!("{}Title: {}", indent(1), config.title));
    lines.push(format!("{}Theme: {}", indent(1), config.theme.as_str()));
    lines.push(format!("{}Links: {}", indent(1), config.links.len()));
    if let Some(url) = &config.canonical_url {
        lines.push(format!("{}URL: {}", indent(1), url));
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(content: &Content) {
    for line in format_scan_output(content) {
        println!("{}", line);
    }
}

// ============================================================================
// Render / build output
// ============================================================================

/// Format the pages of a rendered site, each mapped to its output path.
pub fn format_site_output(site: &RenderedSite) -> Vec<String> {
    let mut lines = vec!["Home \u{2192} index.html".to_string()];

    for (i, entry) in site.feed.entries.iter().enumerate() {
        lines.push(format!(
            "{} \u{2192} {}/index.html",
            entity_header(i + 1, &entry.title, None),
            entry.slug
        ));
    }

    if !site.tags.is_empty() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        for (i, (tag_slug, page)) in site.tags.iter().enumerate() {
            let count = site
                .feed
                .entries
                .iter()
                .filter(|e| e.tags.iter().any(|t| slugify(t) == *tag_slug))
                .count();
            lines.push(format!(
                "{} \u{2192} tags/{}/index.html",
                entity_header(i + 1, &format!("#{}", page.title), Some(count)),
                tag_slug
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Feed \u{2192} {} ({})",
        FEED_PATH,
        count_noun(site.feed.entries.len(), "entry", "entries")
    ));
    lines
}

/// Format build output: the written site (if rendered) plus cache stats.
pub fn format_build_output(result: &BuildResult) -> Vec<String> {
    let mut lines = match &result.site {
        Some(site) => format_site_output(site),
        None => vec![format!(
            "{} unchanged",
            count_noun(result.content.documents.len(), "post", "posts")
        )],
    };
    lines.push(format!(
        "Cache: {} ({})",
        result.stats,
        count_noun(result.stats.total() as usize, "file", "files")
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(result: &BuildResult) {
    for line in format_build_output(result) {
        println!("{}", line);
    }
}

/// Print the rendered-in-memory site for `check`.
pub fn print_site_output(site: &RenderedSite) {
    for line in format_site_output(site) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
