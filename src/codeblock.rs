// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Fenced code block extraction and restoration.
//!
//! Message text is scanned line by line for fenced regions before any
//! Markdown processing happens. Each region is swapped for a placeholder line
//! so that headers, emphasis and escaping never touch code. After the
//! surrounding text has been converted to HTML, [`restore`] puts the blocks
//! back as highlighted `<pre><code>` containers.
//!
//! # Example
//!
//! ```
//! use cc2html::codeblock::{extract, restore};
//!
//! let extracted = extract("Before\n```rust\nfn main() {}\n```\nAfter");
//! assert_eq!(extracted.blocks().len(), 1);
//! assert_eq!(extracted.blocks()[0].language.as_deref(), Some("rust"));
//! assert!(!extracted.text().contains("fn main"));
//!
//! let html = restore(extracted.text(), &extracted);
//! assert!(html.contains("language-rust"));
//! ```

use crate::escape::{escape, escape_into};
use once_cell::sync::OnceCell;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Base character for placeholder markers (U+FFFC OBJECT REPLACEMENT CHARACTER).
const MARKER_CHAR: char = '\u{FFFC}';

/// CSS class prefix for syntax highlighting spans.
const HIGHLIGHT_PREFIX: &str = "hl-";

static SYNTAXES: OnceCell<SyntaxSet> = OnceCell::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// A fenced code region lifted out of message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// The first word of the fence's info string, if any.
    pub language: Option<String>,
    /// The raw body between the fences, without the fence lines.
    pub code: String,
}

/// Message text with its code blocks replaced by placeholder lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    text: String,
    marker: String,
    blocks: Vec<CodeBlock>,
}

impl Extracted {
    /// The text with each code block replaced by a placeholder line.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The extracted blocks in the order they appeared.
    #[must_use]
    pub fn blocks(&self) -> &[CodeBlock] {
        &self.blocks
    }

    /// Returns the block index if `line` is one of this extraction's placeholders.
    ///
    /// The marker never occurs in the source text, so a line wrapped in it can
    /// only be a placeholder inserted by [`extract`].
    #[must_use]
    pub fn placeholder_index(&self, line: &str) -> Option<usize> {
        let index = line
            .strip_prefix(self.marker.as_str())?
            .strip_suffix(self.marker.as_str())?
            .strip_prefix("CODE")?
            .parse::<usize>()
            .ok()?;
        (index < self.blocks.len()).then_some(index)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("{marker}CODE{index}{marker}", marker = self.marker)
    }
}

/// Opening fence of a code block: the fence character and its run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    ch: char,
    len: usize,
}

impl Fence {
    /// Parses an opening fence line, returning the fence and its info string.
    fn open(line: &str) -> Option<(Self, &str)> {
        let trimmed = line.trim_start();
        let ch = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = trimmed.chars().take_while(|&c| c == ch).count();
        if len < 3 {
            return None;
        }
        // Fence characters are ASCII, so `len` is also a byte offset.
        let info = trimmed[len..].trim();
        if ch == '`' && info.contains('`') {
            return None;
        }
        Some((Self { ch, len }, info))
    }

    fn is_closed_by(self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.chars().count() >= self.len && trimmed.chars().all(|c| c == self.ch)
    }
}

/// Picks a marker string that does not occur anywhere in `text`.
fn choose_marker(text: &str) -> String {
    let mut marker = String::from(MARKER_CHAR);
    while text.contains(marker.as_str()) {
        marker.push(MARKER_CHAR);
    }
    marker
}

/// Lifts fenced code blocks out of `text`.
///
/// A fence that is never closed runs to the end of the text. The returned
/// [`Extracted`] holds the remaining prose with one placeholder line per
/// block.
#[must_use]
pub fn extract(text: &str) -> Extracted {
    let mut extracted = Extracted {
        text: String::with_capacity(text.len()),
        marker: choose_marker(text),
        blocks: Vec::new(),
    };
    let mut lines: Vec<String> = Vec::new();
    let mut open: Option<(Fence, Option<String>, Vec<&str>)> = None;

    for line in text.lines() {
        if let Some((fence, language, body)) = &mut open {
            if fence.is_closed_by(line) {
                extracted.blocks.push(CodeBlock {
                    language: language.take(),
                    code: body.join("\n"),
                });
                lines.push(extracted.placeholder(extracted.blocks.len() - 1));
                open = None;
            } else {
                body.push(line);
            }
            continue;
        }

        if let Some((fence, info)) = Fence::open(line) {
            let language = info.split_whitespace().next().map(str::to_owned);
            open = Some((fence, language, Vec::new()));
        } else {
            lines.push(line.to_owned());
        }
    }

    // Unterminated fence: the rest of the text is code.
    if let Some((_, language, body)) = open {
        extracted.blocks.push(CodeBlock {
            language,
            code: body.join("\n"),
        });
        lines.push(extracted.placeholder(extracted.blocks.len() - 1));
    }

    extracted.text = lines.join("\n");
    extracted
}

/// Replaces every placeholder line in `markup` with its rendered code block.
///
/// Placeholders must still sit on their own lines, which is how the Markdown
/// transformer emits them.
#[must_use]
pub fn restore(markup: &str, extracted: &Extracted) -> String {
    let mut out = String::with_capacity(markup.len());
    for line in markup.split_inclusive('\n') {
        let (body, newline) = line
            .strip_suffix('\n')
            .map_or((line, ""), |body| (body, "\n"));
        let block = extracted
            .placeholder_index(body)
            .and_then(|index| extracted.blocks.get(index));
        match block {
            Some(block) => {
                out.push_str(&render_code_block(block));
                out.push_str(newline);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Renders a single code block as a labelled `<pre><code>` container.
#[must_use]
pub fn render_code_block(block: &CodeBlock) -> String {
    let mut out = String::from("<div class=\"code-block\">");
    match block.language.as_deref() {
        Some(language) => {
            let language = escape(language);
            out.push_str(&format!(
                "<div class=\"code-lang\">{language}</div><pre><code class=\"language-{language}\">"
            ));
        }
        None => out.push_str("<pre><code>"),
    }
    match block
        .language
        .as_deref()
        .and_then(|language| highlight(&block.code, language))
    {
        Some(highlighted) => out.push_str(&highlighted),
        None => escape_into(&mut out, &block.code),
    }
    out.push_str("</code></pre></div>");
    out
}

/// Highlights `code` with class-based spans, or `None` for unknown languages.
fn highlight(code: &str, language: &str) -> Option<String> {
    let syntaxes = syntax_set();
    let syntax = syntaxes
        .find_syntax_by_token(language)
        .or_else(|| syntaxes.find_syntax_by_extension(language))?;
    if syntax.name == syntaxes.find_syntax_plain_text().name {
        return None;
    }

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        syntaxes,
        ClassStyle::SpacedPrefixed {
            prefix: HIGHLIGHT_PREFIX,
        },
    );
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .ok()?;
    }
    Some(generator.finalize())
}
