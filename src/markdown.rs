// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! A small Markdown-to-HTML converter for message text.
//!
//! This is not a CommonMark implementation. It understands the constructs that
//! show up in coding-session transcripts: headers, bold and italic emphasis,
//! inline code, links, flat lists and paragraphs. Anything it does not
//! recognize is emitted as escaped literal text.
//!
//! Conversion happens in a fixed order:
//!
//! 1. fenced code blocks are lifted out ([`crate::codeblock::extract`]),
//! 2. each remaining line is classified at block level,
//! 3. inline text is tokenized so code spans become atomic before emphasis and
//!    link scanning,
//! 4. leaf text is escaped as it is written out,
//! 5. code blocks are put back ([`crate::codeblock::restore`]).

use crate::codeblock::{self, Extracted};
use crate::escape::escape_into;

/// Converts Markdown `text` to an HTML fragment.
///
/// # Example
///
/// ```
/// use cc2html::markdown::render_markdown;
///
/// let html = render_markdown("# Title\n\nSome **bold** and `code`.");
/// assert!(html.contains("<h1>Title</h1>"));
/// assert!(html.contains("<strong>bold</strong>"));
/// assert!(html.contains("<code>code</code>"));
/// ```
#[must_use]
pub fn render_markdown(text: &str) -> String {
    let extracted = codeblock::extract(text);
    let markup = transform(&extracted);
    codeblock::restore(&markup, &extracted)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    const fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Block-level classification of a single source line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Placeholder(&'a str),
    Heading(usize, &'a str),
    Item {
        kind: ListKind,
        number: Option<u32>,
        text: &'a str,
    },
    Text(&'a str),
}

fn classify<'a>(line: &'a str, extracted: &Extracted) -> Line<'a> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if extracted.placeholder_index(line).is_some() {
        return Line::Placeholder(line);
    }

    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &trimmed[hashes..];
        if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
            return Line::Heading(hashes, rest.trim());
        }
    }

    for bullet in ["- ", "* ", "+ "] {
        if let Some(text) = trimmed.strip_prefix(bullet) {
            return Line::Item {
                kind: ListKind::Unordered,
                number: None,
                text: text.trim(),
            };
        }
    }

    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if (1..=9).contains(&digits)
        && let Some(text) = trimmed[digits..].strip_prefix(". ")
    {
        return Line::Item {
            kind: ListKind::Ordered,
            number: trimmed[..digits].parse().ok(),
            text: text.trim(),
        };
    }

    Line::Text(line.trim())
}

/// Accumulates block-level output while walking lines.
struct BlockWriter<'a> {
    out: String,
    paragraph: Vec<&'a str>,
    list: Option<ListKind>,
}

impl<'a> BlockWriter<'a> {
    const fn new() -> Self {
        Self {
            out: String::new(),
            paragraph: Vec::new(),
            list: None,
        }
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        self.out.push_str("<p>");
        for (i, line) in self.paragraph.drain(..).enumerate() {
            if i > 0 {
                self.out.push_str("<br>\n");
            }
            render_inline_into(&mut self.out, line);
        }
        self.out.push_str("</p>\n");
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.list.take() {
            self.out.push_str("</");
            self.out.push_str(kind.tag());
            self.out.push_str(">\n");
        }
    }

    fn flush(&mut self) {
        self.flush_paragraph();
        self.close_list();
    }

    fn line(&mut self, line: Line<'a>) {
        match line {
            Line::Blank => self.flush(),
            Line::Placeholder(token) => {
                self.flush();
                self.out.push_str(token);
                self.out.push('\n');
            }
            Line::Heading(level, text) => {
                self.flush();
                self.out.push_str(&format!("<h{level}>"));
                render_inline_into(&mut self.out, text);
                self.out.push_str(&format!("</h{level}>\n"));
            }
            Line::Item { kind, number, text } => {
                self.flush_paragraph();
                if self.list != Some(kind) {
                    self.close_list();
                    match number {
                        Some(start) if start != 1 => {
                            self.out.push_str(&format!("<ol start=\"{start}\">\n"));
                        }
                        _ => {
                            self.out.push('<');
                            self.out.push_str(kind.tag());
                            self.out.push_str(">\n");
                        }
                    }
                    self.list = Some(kind);
                }
                self.out.push_str("<li>");
                render_inline_into(&mut self.out, text);
                self.out.push_str("</li>\n");
            }
            Line::Text(text) => {
                self.close_list();
                self.paragraph.push(text);
            }
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}

/// Converts placeholder-bearing text to HTML.
///
/// Placeholder lines from `extracted` are passed through verbatim on their
/// own lines, ready for [`codeblock::restore`]. All other text is escaped
/// exactly once.
#[must_use]
pub fn transform(extracted: &Extracted) -> String {
    let mut writer = BlockWriter::new();
    for line in extracted.text().lines() {
        writer.line(classify(line, extracted));
    }
    writer.finish()
}

/// An inline token: a literal character or an atomic code span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok<'a> {
    Ch(char),
    Code(&'a str),
}

/// Splits `text` into characters and code spans.
///
/// A code span opens with a run of backticks and closes with a run of the same
/// length. An unmatched run stays literal.
fn tokenize(text: &str) -> Vec<Tok<'_>> {
    let mut toks = Vec::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if c == '`' {
            let run = rest.len() - rest.trim_start_matches('`').len();
            let after = &rest[run..];
            if let Some(end) = find_backtick_run(after, run) {
                toks.push(Tok::Code(trim_code_span(&after[..end])));
                rest = &after[end + run..];
            } else {
                toks.extend(std::iter::repeat_n(Tok::Ch('`'), run));
                rest = after;
            }
            continue;
        }
        toks.push(Tok::Ch(c));
        rest = &rest[c.len_utf8()..];
    }
    toks
}

/// Finds the byte offset of a backtick run of exactly `len` in `text`.
fn find_backtick_run(text: &str, len: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let start = i;
            while i < bytes.len() && bytes[i] == b'`' {
                i += 1;
            }
            if i - start == len {
                return Some(start);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Strips one padding space from each side, as in `` ` `x` ` ``.
fn trim_code_span(code: &str) -> &str {
    match code.strip_prefix(' ').and_then(|c| c.strip_suffix(' ')) {
        Some(inner) if !inner.trim().is_empty() => inner,
        _ => code,
    }
}

fn is_space(tok: Option<&Tok<'_>>) -> bool {
    matches!(tok, Some(Tok::Ch(c)) if c.is_whitespace())
}

fn is_star(tok: Option<&Tok<'_>>) -> bool {
    tok == Some(&Tok::Ch('*'))
}

/// End index of a `**strong**` run opening at `i`.
fn strong_end(toks: &[Tok<'_>], i: usize) -> Option<usize> {
    if !is_star(toks.get(i)) || !is_star(toks.get(i + 1)) {
        return None;
    }
    if toks.get(i + 2).is_none() || is_space(toks.get(i + 2)) {
        return None;
    }
    (i + 3..toks.len().saturating_sub(1)).find(|&j| {
        is_star(toks.get(j)) && is_star(toks.get(j + 1)) && !is_space(toks.get(j - 1))
    })
}

/// End index of an `*emphasis*` run opening at `i`.
fn em_end(toks: &[Tok<'_>], i: usize) -> Option<usize> {
    if !is_star(toks.get(i)) {
        return None;
    }
    let first = toks.get(i + 1);
    if first.is_none() || is_space(first) || is_star(first) {
        return None;
    }
    (i + 2..toks.len()).find(|&j| {
        is_star(toks.get(j))
            && !is_star(toks.get(j - 1))
            && !is_star(toks.get(j + 1))
            && !is_space(toks.get(j - 1))
    })
}

/// A `[label](url)` link starting at index `i`.
struct Link {
    label: std::ops::Range<usize>,
    url: String,
    end: usize,
}

fn link_at(toks: &[Tok<'_>], i: usize) -> Option<Link> {
    if toks.get(i) != Some(&Tok::Ch('[')) {
        return None;
    }
    // Labels and targets cannot contain `[`, so no scan runs past the next one.
    let close = (i + 1..toks.len()).find(|&k| matches!(toks[k], Tok::Ch('[' | ']')))?;
    if toks[close] != Tok::Ch(']')
        || close == i + 1
        || toks.get(close + 1) != Some(&Tok::Ch('('))
    {
        return None;
    }
    let mut url = String::new();
    for (k, tok) in toks.iter().enumerate().skip(close + 2) {
        match *tok {
            Tok::Ch(')') if !url.is_empty() => {
                return Some(Link {
                    label: i + 1..close,
                    url,
                    end: k + 1,
                });
            }
            Tok::Ch(c) if !c.is_whitespace() && c != ')' && c != '[' => url.push(c),
            _ => return None,
        }
    }
    None
}

/// Writes buffered literal text, escaped, and clears the buffer.
fn flush_plain(plain: &mut String, out: &mut String) {
    if !plain.is_empty() {
        escape_into(out, plain);
        plain.clear();
    }
}

fn render_tokens(toks: &[Tok<'_>], out: &mut String) {
    let mut plain = String::new();
    let mut i = 0;
    while i < toks.len() {
        if let Some(end) = strong_end(toks, i) {
            flush_plain(&mut plain, out);
            out.push_str("<strong>");
            render_tokens(&toks[i + 2..end], out);
            out.push_str("</strong>");
            i = end + 2;
            continue;
        }
        if let Some(end) = em_end(toks, i) {
            flush_plain(&mut plain, out);
            out.push_str("<em>");
            render_tokens(&toks[i + 1..end], out);
            out.push_str("</em>");
            i = end + 1;
            continue;
        }
        if let Some(link) = link_at(toks, i) {
            flush_plain(&mut plain, out);
            out.push_str("<a href=\"");
            escape_into(out, &link.url);
            out.push_str("\">");
            render_tokens(&toks[link.label], out);
            out.push_str("</a>");
            i = link.end;
            continue;
        }
        match toks[i] {
            Tok::Code(code) => {
                flush_plain(&mut plain, out);
                out.push_str("<code>");
                escape_into(out, code);
                out.push_str("</code>");
            }
            Tok::Ch(c) => plain.push(c),
        }
        i += 1;
    }
    flush_plain(&mut plain, out);
}

fn render_inline_into(out: &mut String, text: &str) {
    render_tokens(&tokenize(text), out);
}

/// Renders a single line of inline Markdown (no block structure).
#[must_use]
pub fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    render_inline_into(&mut out, text);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headers() {
        assert_eq!(render_markdown("# One"), "<h1>One</h1>\n");
        assert_eq!(render_markdown("### Three"), "<h3>Three</h3>\n");
        assert_eq!(render_markdown("###### Six"), "<h6>Six</h6>\n");
    }

    #[test]
    fn hashes_without_space_are_text() {
        assert_eq!(render_markdown("#hashtag"), "<p>#hashtag</p>\n");
        assert_eq!(render_markdown("####### seven"), "<p>####### seven</p>\n");
    }

    #[test]
    fn renders_emphasis() {
        assert_eq!(render_inline("**bold**"), "<strong>bold</strong>");
        assert_eq!(render_inline("*italic*"), "<em>italic</em>");
        assert_eq!(
            render_inline("a **b** and *c* d"),
            "a <strong>b</strong> and <em>c</em> d"
        );
        assert_eq!(
            render_inline("*outer **inner** outer*"),
            "<em>outer <strong>inner</strong> outer</em>"
        );
    }

    #[test]
    fn unmatched_emphasis_is_literal() {
        assert_eq!(render_inline("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(render_inline("**open"), "**open");
        assert_eq!(render_inline("a*"), "a*");
    }

    #[test]
    fn inline_code_is_protected_from_emphasis() {
        assert_eq!(
            render_inline("run `a **b** *c*` now"),
            "run <code>a **b** *c*</code> now"
        );
        assert_eq!(
            render_inline("**bold `x*y` bold**"),
            "<strong>bold <code>x*y</code> bold</strong>"
        );
    }

    #[test]
    fn inline_code_is_escaped() {
        assert_eq!(render_inline("`<div>`"), "<code>&lt;div&gt;</code>");
    }

    #[test]
    fn double_backtick_spans() {
        assert_eq!(render_inline("``a ` b``"), "<code>a ` b</code>");
        assert_eq!(render_inline("`` `x` ``"), "<code>`x`</code>");
    }

    #[test]
    fn unmatched_backtick_is_literal() {
        assert_eq!(render_inline("it`s"), "it`s");
    }

    #[test]
    fn renders_links() {
        assert_eq!(
            render_inline("see [the docs](https://example.com/a?b=1&c=2)"),
            "see <a href=\"https://example.com/a?b=1&amp;c=2\">the docs</a>"
        );
        assert_eq!(
            render_inline("[**bold** link](x)"),
            "<a href=\"x\"><strong>bold</strong> link</a>"
        );
    }

    #[test]
    fn malformed_links_are_literal() {
        assert_eq!(render_inline("[text] (url)"), "[text] (url)");
        assert_eq!(render_inline("[text](has space)"), "[text](has space)");
        assert_eq!(render_inline("[](x)"), "[](x)");
        assert_eq!(render_inline("[a](b"), "[a](b");
    }

    #[test]
    fn link_label_ends_at_next_bracket() {
        assert_eq!(render_inline("[[a](b)"), "[<a href=\"b\">a</a>");
        assert_eq!(render_inline("[x [y](z)"), "[x <a href=\"z\">y</a>");

        let brackets = "[".repeat(50_000);
        assert_eq!(render_inline(&brackets), brackets);

        assert_eq!(render_inline("[a](x[a](y)"), "[a](x<a href=\"y\">a</a>");
        let open_links = "[a](x".repeat(20_000);
        assert_eq!(render_inline(&open_links), open_links);
    }

    #[test]
    fn groups_consecutive_list_items() {
        let html = render_markdown("- one\n- two\n* three");
        assert_eq!(html, "<ul>\n<li>one</li>\n<li>two</li>\n<li>three</li>\n</ul>\n");
    }

    #[test]
    fn renders_ordered_lists() {
        assert_eq!(
            render_markdown("1. a\n2. b"),
            "<ol>\n<li>a</li>\n<li>b</li>\n</ol>\n"
        );
        assert_eq!(
            render_markdown("3. c\n4. d"),
            "<ol start=\"3\">\n<li>c</li>\n<li>d</li>\n</ol>\n"
        );
    }

    #[test]
    fn switching_list_kind_starts_new_list() {
        let html = render_markdown("- a\n1. b");
        assert_eq!(html, "<ul>\n<li>a</li>\n</ul>\n<ol>\n<li>b</li>\n</ol>\n");
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let html = render_markdown("first line\nsecond line\n\nnew para");
        assert_eq!(
            html,
            "<p>first line<br>\nsecond line</p>\n<p>new para</p>\n"
        );
    }

    #[test]
    fn text_after_list_closes_it() {
        let html = render_markdown("- item\nafter");
        assert_eq!(html, "<ul>\n<li>item</li>\n</ul>\n<p>after</p>\n");
    }

    #[test]
    fn escapes_text_exactly_once() {
        let html = render_markdown("<script>alert('x')</script> & done");
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; &amp; done</p>\n"
        );
        assert!(!html.contains("&amp;lt;"));
    }

    #[test]
    fn code_blocks_are_opaque() {
        let html = render_markdown("Intro\n```\n# not a header\n**not bold**\n```\nOutro");

        assert!(html.contains("# not a header\n**not bold**"));
        assert!(!html.contains("<h1>"));
        assert!(!html.contains("<strong>"));
        assert!(html.starts_with("<p>Intro</p>\n<div class=\"code-block\">"));
        assert!(html.ends_with("<p>Outro</p>\n"));
    }

    #[test]
    fn code_block_breaks_paragraph_and_list() {
        let html = render_markdown("- item\n```\nx\n```\ntext");
        assert!(html.starts_with("<ul>\n<li>item</li>\n</ul>\n<div class=\"code-block\">"));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render_markdown(""), "");
        assert_eq!(render_markdown("\n\n"), "");
    }
}
