//! Filename parsing for the `YYYY-MM-DD-name` post convention.
//!
//! Post files may carry their publish date as a prefix. The prefix is
//! stripped before the name becomes a slug:
//! - `2024-01-05-Hello-World.md` → date 2024-01-05, slug `hello-world`
//! - `hello-world.md` → no date, slug `hello-world`
//! - `2024-13-01-oops.md` → not a valid date, slug `2024-13-01-oops`
//!
//! Front matter always wins over what the filename says; see
//! [`scan`](crate::scan).

use chrono::NaiveDate;

/// Result of parsing a post file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present and a real calendar date.
    pub date: Option<NaiveDate>,
    /// Raw name after the date prefix. The full stem when there is no prefix.
    pub name: String,
    /// URL-safe slug derived from `name`.
    pub slug: String,
}

/// Parse a post file stem following the optional `YYYY-MM-DD-name` convention.
pub fn parse_post_name(stem: &str) -> ParsedName {
    if let (Some(prefix), Some(rest)) = (stem.get(..10), stem.get(10..))
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        let name = rest.strip_prefix('-').unwrap_or(rest);
        // A bare date (`2024-01-05.md`) keeps the date as its slug.
        let name = if name.is_empty() { prefix } else { name };
        return ParsedName {
            date: Some(date),
            name: name.to_string(),
            slug: slugify(name),
        };
    }
    ParsedName {
        date: None,
        name: stem.to_string(),
        slug: slugify(stem),
    }
}

/// Lowercase ASCII alphanumerics; every other run of characters becomes one `-`.
///
/// Leading and trailing separators are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dated_multi_word_name() {
        let p = parse_post_name("2024-01-05-Hello-World");
        assert_eq!(p.date, Some(date(2024, 1, 5)));
        assert_eq!(p.name, "Hello-World");
        assert_eq!(p.slug, "hello-world");
    }

    #[test]
    fn undated_name() {
        let p = parse_post_name("rust-tips");
        assert_eq!(p.date, None);
        assert_eq!(p.name, "rust-tips");
        assert_eq!(p.slug, "rust-tips");
    }

    #[test]
    fn invalid_date_prefix_is_part_of_name() {
        let p = parse_post_name("2024-13-01-oops");
        assert_eq!(p.date, None);
        assert_eq!(p.slug, "2024-13-01-oops");
    }

    #[test]
    fn bare_date_keeps_date_as_slug() {
        let p = parse_post_name("2024-02-29");
        assert_eq!(p.date, Some(date(2024, 2, 29)));
        assert_eq!(p.slug, "2024-02-29");
    }

    #[test]
    fn short_stem_is_not_a_date() {
        let p = parse_post_name("2024");
        assert_eq!(p.date, None);
        assert_eq!(p.slug, "2024");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Hello,   World!"), "hello-world");
        assert_eq!(slugify("--C# in 2024--"), "c-in-2024");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Michał's notes"), "micha-s-notes");
        assert_eq!(slugify("日本語"), "");
    }
}
