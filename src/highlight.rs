//! Syntax highlighting plugins.
//!
//! Highlighting is a capability registered up front, not a side effect of
//! loading a module: callers build a [`HighlighterRegistry`], register one
//! [`Highlighter`] per language, and hand the registry to
//! [`render`](crate::render::render). During markdown rendering every fenced
//! code block whose language has a registered highlighter is replaced by the
//! highlighter's HTML. Unregistered languages fall through to the plain
//! `<pre><code class="language-…">` markup.
//!
//! ## Output Contract
//!
//! A highlighter returns the complete HTML for one code block, including the
//! `<pre>` wrapper. It must escape the code: the output is inserted verbatim.

use maud::html;
use std::collections::BTreeMap;

/// Turns a block of source code into an HTML fragment.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, language: &str) -> String;
}

/// Highlighters keyed by lowercase language name.
#[derive(Default)]
pub struct HighlighterRegistry {
    highlighters: BTreeMap<String, Box<dyn Highlighter>>,
}

impl HighlighterRegistry {
    /// An empty registry: every code block renders unhighlighted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Rust and C# highlighters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_aliases(&["rust", "rs"], KeywordHighlighter::rust());
        registry.register_aliases(&["csharp", "cs", "c#"], KeywordHighlighter::csharp());
        registry
    }

    /// Register `highlighter` for `language`, replacing any previous one.
    pub fn register(&mut self, language: &str, highlighter: impl Highlighter + 'static) {
        self.highlighters
            .insert(language.to_ascii_lowercase(), Box::new(highlighter));
    }

    /// Register one highlighter under several language names.
    pub fn register_aliases<H>(&mut self, languages: &[&str], highlighter: H)
    where
        H: Highlighter + Clone + 'static,
    {
        for language in languages {
            self.register(language, highlighter.clone());
        }
    }

    /// Look up by the first word of a fenced code block info string.
    ///
    /// `"rust ignore"` and `"Rust,no_run"` both resolve to `rust`.
    pub fn get(&self, info: &str) -> Option<&dyn Highlighter> {
        let language = code_language(info)?;
        self.highlighters
            .get(&language.to_ascii_lowercase())
            .map(|h| h.as_ref())
    }

    /// Registered language names in sorted order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.highlighters.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HighlighterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.languages()).finish()
    }
}

/// First word of a code block info string, if any.
pub fn code_language(info: &str) -> Option<&str> {
    info.split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .filter(|lang| !lang.is_empty())
}

// ============================================================================
// Keyword highlighter
// ============================================================================

/// A small lexer-based highlighter for C-family languages.
///
/// Recognizes keywords, string and char literals, numbers, and `//` line
/// comments. Each token class is wrapped in `<span class="tok-…">`.
#[derive(Debug, Clone)]
pub struct KeywordHighlighter {
    keywords: &'static [&'static str],
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "async", "await", "base", "bool", "break", "case", "catch", "class", "const",
    "continue", "default", "do", "else", "enum", "false", "finally", "for", "foreach", "if",
    "in", "int", "interface", "internal", "is", "namespace", "new", "null", "out", "override",
    "private", "protected", "public", "readonly", "record", "return", "sealed", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "using", "var", "virtual",
    "void", "while",
];

impl KeywordHighlighter {
    pub fn new(keywords: &'static [&'static str]) -> Self {
        Self { keywords }
    }

    pub fn rust() -> Self {
        Self::new(RUST_KEYWORDS)
    }

    pub fn csharp() -> Self {
        Self::new(CSHARP_KEYWORDS)
    }

    fn tokens<'a>(&self, code: &'a str) -> Vec<(Option<&'static str>, &'a str)> {
        let mut tokens = Vec::new();
        let bytes = code.as_bytes();
        let mut plain_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            let (class, end) = match bytes[i] {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    let end = code[i..].find('\n').map_or(code.len(), |n| i + n);
                    ("tok-comment", end)
                }
                b'"' | b'\'' => {
                    let end = if bytes[i] == b'"' {
                        string_end(bytes, i)
                    } else {
                        char_literal_end(code, i)
                    };
                    match end {
                        Some(end) => ("tok-string", end),
                        None => {
                            i += 1;
                            continue;
                        }
                    }
                }
                b'0'..=b'9' if !is_ident_byte(bytes, i.wrapping_sub(1)) => {
                    let end = scan_while(bytes, i, |b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
                    ("tok-number", end)
                }
                b if b.is_ascii_alphabetic() || b == b'_' => {
                    let end = scan_while(bytes, i, |b| b.is_ascii_alphanumeric() || b == b'_');
                    if self.keywords.iter().any(|k| *k == &code[i..end]) {
                        ("tok-keyword", end)
                    } else {
                        i = end;
                        continue;
                    }
                }
                _ => {
                    i += 1;
                    continue;
                }
            };
            if plain_start < i {
                tokens.push((None, &code[plain_start..i]));
            }
            tokens.push((Some(class), &code[i..end]));
            i = end;
            plain_start = end;
        }
        if plain_start < code.len() {
            tokens.push((None, &code[plain_start..]));
        }
        tokens
    }
}

impl Highlighter for KeywordHighlighter {
    fn highlight(&self, code: &str, language: &str) -> String {
        let tokens = self.tokens(code);
        html! {
            pre.highlight {
                code class={ "language-" (language) } {
                    @for (class, text) in &tokens {
                        @match class {
                            Some(class) => { span class=(class) { (text) } }
                            None => { (text) }
                        }
                    }
                }
            }
        }
        .into_string()
    }
}

fn is_ident_byte(bytes: &[u8], i: usize) -> bool {
    bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

fn scan_while(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut end = start;
    while end < bytes.len() && pred(bytes[end]) {
        end += 1;
    }
    end
}

/// End (exclusive) of a `"…"` literal starting at `start`, honoring `\` escapes.
///
/// String literals never span lines here.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// End (exclusive) of a char literal such as `'x'`, `'\n'` or `'\u{1F600}'`.
///
/// Returns `None` for anything else, which keeps lifetimes (`'a`) plain.
fn char_literal_end(code: &str, start: usize) -> Option<usize> {
    let rest = &code[start + 1..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    let mut len = first.len_utf8();
    if first == '\\' {
        let escaped = chars.next()?;
        len += escaped.len_utf8();
        if escaped == 'u' {
            len += rest[len..].find('}')? + 1;
        }
    }
    rest[len..].starts_with('\'').then_some(start + 1 + len + 1)
}
