// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! HTML escaping for raw text.
//!
//! Every span of source text passes through [`escape`] exactly once on its way
//! into the document. Escaping twice would turn `&lt;` into `&amp;lt;`, so the
//! rendering pipeline only escapes leaf text, never assembled markup.

/// Escapes the characters that are meaningful in HTML text and attributes.
///
/// `&`, `<`, `>`, `"` and `'` are replaced with entities; everything else is
/// copied unchanged.
///
/// # Example
///
/// ```
/// use cc2html::escape::escape;
///
/// assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/b&gt;");
/// ```
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    escape_into(&mut out, text);
    out
}

/// Like [`escape`] but appends to an existing buffer.
pub fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}
