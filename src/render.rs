//! Site rendering.
//!
//! Stage 2 of the build pipeline and the core of the generator: a pure
//! function from `(SiteConfig, documents, highlighters)` to a
//! [`RenderedSite`]. No filesystem access happens here; writing is
//! [`generate`](crate::generate)'s job.
//!
//! ## Rendered Pages
//!
//! - **Post pages** (`/{slug}/index.html`): exactly one per document
//! - **Home page** (`/index.html`): avatar, title, description, post list
//! - **Tag pages** (`/tags/{tag}/index.html`): post list filtered by tag
//! - **Feed** (`/feed.xml`): RSS 2.0, see [`feed`](crate::feed)
//!
//! Every page carries the site navigation built from `config.links` in their
//! configured order, the favicon, and the theme stylesheet inlined in
//! `<style>`.
//!
//! ## Guarantees
//!
//! - Config is validated before any document is looked at.
//! - Duplicate slugs fail the whole render; no partial site is returned.
//! - Output depends only on the inputs: rendering twice yields identical
//!   bytes, and shuffling the document list changes nothing.
//!
//! ## HTML Generation
//!
//! Templates are [maud](https://maud.lambda.xyz/) macros, so every
//! interpolated value is escaped. Markdown bodies go through pulldown-cmark;
//! fenced code blocks are routed to the registered
//! [`Highlighter`](crate::highlight::Highlighter) for their language.

use crate::config::{self, SiteConfig};
use crate::feed::{self, FeedDocument};
use crate::highlight::HighlighterRegistry;
use crate::naming::slugify;
use crate::types::Document;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),
    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),
    #[error("Invalid slug {0:?}: use lowercase letters, digits and single dashes")]
    InvalidSlug(String),
}

/// Generated HTML for one document or listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Document slug, tag slug for tag pages, empty for the home page.
    pub slug: String,
    pub title: String,
    pub html: String,
}

/// Everything one render produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSite {
    pub index: RenderedPage,
    /// One page per document, keyed by slug.
    pub pages: BTreeMap<String, RenderedPage>,
    /// One listing per tag, keyed by tag slug.
    pub tags: BTreeMap<String, RenderedPage>,
    pub feed: FeedDocument,
}

/// Output path of the feed, relative to the site root.
pub const FEED_PATH: &str = "feed.xml";

impl RenderedSite {
    /// Every output file as `(relative path, contents)`, in a stable order.
    pub fn files(&self) -> Vec<(String, &str)> {
        let mut files = Vec::with_capacity(self.pages.len() + self.tags.len() + 2);
        files.push(("index.html".to_string(), self.index.html.as_str()));
        for page in self.pages.values() {
            files.push((format!("{}/index.html", page.slug), page.html.as_str()));
        }
        for page in self.tags.values() {
            files.push((format!("tags/{}/index.html", page.slug), page.html.as_str()));
        }
        files.push((FEED_PATH.to_string(), self.feed.xml.as_str()));
        files
    }
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Render the whole site.
///
/// Fails with [`RenderError::ConfigInvalid`] before touching any document if
/// the config is unusable, with [`RenderError::InvalidSlug`] if a slug is not
/// already in [`slugify`] form, and with [`RenderError::DuplicateSlug`] if two
/// documents share a slug.
pub fn render(
    config: &SiteConfig,
    documents: &[Document],
    highlighters: &HighlighterRegistry,
) -> Result<RenderedSite, RenderError> {
    config
        .validate()
        .map_err(|e| RenderError::ConfigInvalid(e.to_string()))?;

    let mut seen = BTreeSet::new();
    for doc in documents {
        if doc.slug.is_empty() || slugify(&doc.slug) != doc.slug {
            return Err(RenderError::InvalidSlug(doc.slug.clone()));
        }
        if !seen.insert(doc.slug.as_str()) {
            return Err(RenderError::DuplicateSlug(doc.slug.clone()));
        }
    }

    let css = format!("{}\n\n{}", config::generate_theme_css(config.theme), CSS_STATIC);
    let ordered = feed::sorted(documents);

    let pages: BTreeMap<String, RenderedPage> = ordered
        .iter()
        .map(|doc| {
            let page = render_post_page(config, doc, highlighters, &css);
            (doc.slug.clone(), page)
        })
        .collect();
    log::debug!("rendered {} post pages", pages.len());

    let tags = collect_tags(&ordered)
        .into_iter()
        .map(|(tag_slug, (label, docs))| {
            let page = render_tag_page(config, &tag_slug, &label, &docs, &css);
            (tag_slug, page)
        })
        .collect::<BTreeMap<_, _>>();
    log::debug!("rendered {} tag pages", tags.len());

    let index = render_index(config, &ordered, &css);
    let feed = feed::build_feed(config, &ordered);

    Ok(RenderedSite {
        index,
        pages,
        tags,
        feed,
    })
}

/// Group documents by tag slug, keeping feed order within each group.
///
/// The label shown for a tag is its spelling on the newest post using it.
fn collect_tags<'a>(
    ordered: &[&'a Document],
) -> BTreeMap<String, (String, Vec<&'a Document>)> {
    let mut tags: BTreeMap<String, (String, Vec<&'a Document>)> = BTreeMap::new();
    for &doc in ordered {
        for (tag_slug, tag) in doc_tags(doc) {
            tags.entry(tag_slug)
                .or_insert_with(|| (tag.to_string(), Vec::new()))
                .1
                .push(doc);
        }
    }
    tags
}

/// A document's tags as `(slug, label)`, deduplicated by slug.
///
/// Tags that slugify to nothing are dropped.
fn doc_tags(doc: &Document) -> Vec<(String, &str)> {
    let mut seen = BTreeSet::new();
    doc.tags
        .iter()
        .filter_map(|tag| {
            let tag_slug = slugify(tag);
            (!tag_slug.is_empty() && seen.insert(tag_slug.clone()))
                .then_some((tag_slug, tag.as_str()))
        })
        .collect()
}

/// Convert markdown to HTML, passing fenced code blocks through the registry.
pub fn render_markdown(body: &str, highlighters: &HighlighterRegistry) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut events = Vec::new();
    let mut code_block: Option<(String, String)> = None;

    for event in Parser::new_ext(body, options) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                if highlighters.get(&info).is_some() =>
            {
                code_block = Some((info.to_string(), String::new()));
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) if code_block.is_some() => {
                if let Some((info, code)) = code_block.take()
                    && let (Some(highlighter), Some(language)) =
                        (highlighters.get(&info), crate::highlight::code_language(&info))
                {
                    let fragment = highlighter.highlight(&code, language);
                    events.push(Event::Html(CowStr::from(fragment)));
                }
            }
            other => events.push(other),
        }
    }

    let mut out = String::new();
    md_html::push_html(&mut out, events.into_iter());
    out
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure.
fn base_document(config: &SiteConfig, title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(config.lang) data-theme=(config.theme.as_str()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if !config.description.is_empty() {
                    meta name="description" content=(config.description);
                }
                @if !config.favicon.is_empty() {
                    link rel="icon" href=(config.favicon);
                }
                link rel="alternate" type="application/rss+xml" title=(config.title) href={ "/" (FEED_PATH) };
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

/// Renders the site navigation from `config.links`, preserving order.
pub fn render_nav(config: &SiteConfig) -> Markup {
    html! {
        nav.site-nav {
            ul {
                @for link in &config.links {
                    li {
                        a href=(link.url) rel="me" { (link.title) }
                    }
                }
            }
        }
    }
}

/// Compact header used on post and tag pages.
fn site_header(config: &SiteConfig) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (config.title) }
            (render_nav(config))
        }
    }
}

/// Full header used on the home page: avatar, title, description.
fn home_header(config: &SiteConfig) -> Markup {
    let avatar_class = match &config.avatar_class {
        Some(extra) => format!("avatar {extra}"),
        None => "avatar".to_string(),
    };
    html! {
        header.home-header {
            @if !config.avatar.is_empty() {
                img class=(avatar_class) src=(config.avatar) alt=(config.title);
            }
            h1 { (config.title) }
            @if !config.description.is_empty() {
                p.site-description { (config.description) }
            }
            (render_nav(config))
        }
    }
}

fn post_date(config: &SiteConfig, doc: &Document) -> Markup {
    html! {
        time datetime=(doc.date.format("%Y-%m-%d").to_string()) { (config.date_style.format(doc.date)) }
    }
}

fn tag_links(doc: &Document) -> Markup {
    html! {
        @let tags = doc_tags(doc);
        @if !tags.is_empty() {
            ul.post-tags {
                @for (tag_slug, tag) in &tags {
                    li { a href={ "/tags/" (tag_slug) "/" } { "#" (tag) } }
                }
            }
        }
    }
}

/// A list of post summaries in the order given.
fn post_list(config: &SiteConfig, docs: &[&Document]) -> Markup {
    html! {
        ul.post-list {
            @for doc in docs {
                li.post-summary {
                    a href={ "/" (doc.slug) "/" } {
                        h2 { (doc.title) }
                    }
                    (post_date(config, doc))
                    @if let Some(desc) = &doc.description {
                        p { (desc) }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_index(config: &SiteConfig, ordered: &[&Document], css: &str) -> RenderedPage {
    let content = html! {
        (home_header(config))
        main.index-page {
            @if ordered.is_empty() {
                p.empty { "No posts yet." }
            } @else {
                (post_list(config, ordered))
            }
        }
    };
    RenderedPage {
        slug: String::new(),
        title: config.title.clone(),
        html: base_document(config, &config.title, css, content).into_string(),
    }
}

fn render_post_page(
    config: &SiteConfig,
    doc: &Document,
    highlighters: &HighlighterRegistry,
    css: &str,
) -> RenderedPage {
    let body_html = render_markdown(&doc.body, highlighters);
    let page_title = format!("{} | {}", doc.title, config.title);

    let content = html! {
        (site_header(config))
        main.post-page {
            article {
                header.post-header {
                    h1 { (doc.title) }
                    p.post-meta {
                        (post_date(config, doc))
                        @if let Some(author) = &config.author {
                            " · "
                            span.author { (author) }
                        }
                    }
                    (tag_links(doc))
                }
                div.post-body {
                    (PreEscaped(body_html))
                }
            }
        }
    };

    RenderedPage {
        slug: doc.slug.clone(),
        title: doc.title.clone(),
        html: base_document(config, &page_title, css, content).into_string(),
    }
}

fn render_tag_page(
    config: &SiteConfig,
    tag_slug: &str,
    label: &str,
    docs: &[&Document],
    css: &str,
) -> RenderedPage {
    let page_title = format!("#{} | {}", label, config.title);
    let content = html! {
        (site_header(config))
        main.tag-page {
            h1 { "#" (label) }
            (post_list(config, docs))
        }
    };
    RenderedPage {
        slug: tag_slug.to_string(),
        title: label.to_string(),
        html: base_document(config, &page_title, css, content).into_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
