//! # Simple Blog
//!
//! A small static blog generator. Markdown posts with TOML front matter go
//! in, a directory of plain HTML pages and an RSS feed come out.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Scan      content/   →  Content        (config.toml + posts/*.md → documents)
//! 2. Render    Content    →  RenderedSite   (pure: documents → HTML strings + feed)
//! 3. Generate  site       →  dist/          (writes changed files, drops stale ones)
//! ```
//!
//! Rendering is a pure function of the config and the document set. It does
//! no I/O, and reordering the input documents never changes its output. That
//! property is what the [render cache](cache) relies on: if the inputs
//! fingerprint the same as last time, there is nothing to do.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: loads the config and parses every post under `posts/` |
//! | [`render`] | Stage 2: renders index, post, and tag pages with Maud |
//! | [`generate`] | Stage 3: writes the rendered site, consulting the cache |
//! | [`feed`] | Feed ordering and RSS 2.0 serialization |
//! | [`highlight`] | Pluggable code block highlighting, keyed by language |
//! | [`config`] | `config.toml` loading, validation, merging, and theme CSS |
//! | [`cache`] | Input fingerprint and per-file hashes for incremental builds |
//! | [`types`] | The [`Document`](types::Document) every stage passes around |
//! | [`naming`] | `YYYY-MM-DD-slug` filename convention and slug normalization |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/). Templates are
//! checked at compile time and every interpolation is escaped, so a post
//! title like `<script>` can never inject markup. Only rendered markdown and
//! highlighter output are inserted raw.
//!
//! ## Highlighting Is a Capability
//!
//! The renderer never knows which languages exist. It hands each fenced code
//! block to whatever [`Highlighter`](highlight::Highlighter) is registered for
//! the block's language, and escapes the code verbatim when none is.
//!
//! ## Front Matter in TOML
//!
//! Posts use `+++`-fenced TOML front matter, the same format as the site
//! config, so the whole input side goes through one parser.

pub mod cache;
pub mod config;
pub mod feed;
pub mod generate;
pub mod highlight;
pub mod naming;
pub mod output;
pub mod render;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
