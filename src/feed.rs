//! Feed generation.
//!
//! Aggregates every document into a [`FeedDocument`]: the ordered entry list
//! (also used for the home page and tag listings) and its RSS 2.0
//! serialization.
//!
//! ## Ordering
//!
//! Newest first. Documents published on the same day are ordered by slug,
//! ascending, so the output never depends on input order.

use crate::config::SiteConfig;
use crate::types::Document;
use chrono::{NaiveDate, NaiveTime};
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder};
use std::cmp::Ordering;

/// One feed item, derived from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl From<&Document> for FeedEntry {
    fn from(doc: &Document) -> Self {
        Self {
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            date: doc.date,
            description: doc.description.clone(),
            tags: doc.tags.clone(),
        }
    }
}

/// Ordered summary of all documents plus its RSS serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub entries: Vec<FeedEntry>,
    /// RSS 2.0 XML.
    pub xml: String,
}

/// Feed order: publish date descending, then slug ascending.
pub fn feed_order(a: &Document, b: &Document) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug))
}

/// Sort borrowed documents into feed order.
pub fn sorted<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Vec<&'a Document> {
    let mut docs: Vec<&Document> = documents.into_iter().collect();
    docs.sort_by(|a, b| feed_order(a, b));
    docs
}

/// Build the feed from documents already in feed order.
pub fn build_feed(config: &SiteConfig, ordered: &[&Document]) -> FeedDocument {
    let entries: Vec<FeedEntry> = ordered.iter().map(|doc| FeedEntry::from(*doc)).collect();
    let xml = to_rss(config, &entries);
    FeedDocument { entries, xml }
}

/// Absolute (or root-relative without `canonical_url`) URL of a post.
pub fn post_url(config: &SiteConfig, slug: &str) -> String {
    format!("{}/{}/", config.base_url(), slug)
}

fn to_rss(config: &SiteConfig, entries: &[FeedEntry]) -> String {
    let items: Vec<rss::Item> = entries
        .iter()
        .map(|entry| entry_to_item(config, entry))
        .collect();

    let link = match config.base_url() {
        "" => "/".to_string(),
        base => format!("{base}/"),
    };

    ChannelBuilder::default()
        .title(config.title.clone())
        .link(link)
        .description(config.description.clone())
        .language(Some(config.lang.clone()))
        .generator(Some(format!("simple-blog {}", env!("CARGO_PKG_VERSION"))))
        .items(items)
        .build()
        .to_string()
}

fn entry_to_item(config: &SiteConfig, entry: &FeedEntry) -> rss::Item {
    let link = post_url(config, &entry.slug);
    let pub_date = entry.date.and_time(NaiveTime::MIN).and_utc().to_rfc2822();
    let categories = entry
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
        .collect::<Vec<_>>();

    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .pub_date(Some(pub_date))
        .description(entry.description.clone())
        .author(config.author.clone())
        .categories(categories)
        .build()
}
