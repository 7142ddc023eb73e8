// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Line diffs for file edits.
//!
//! Edit tool calls carry the replaced text and its replacement. This module
//! turns the pair into a line-level edit script annotated with line numbers
//! on both sides, decides how much of it to show, and renders the lines as
//! HTML rows.
//!
//! # Example
//!
//! ```
//! use cc2html::diff::{DiffOp, diff_text};
//!
//! let lines = diff_text(Some("a\nb\nc"), Some("a\nB\nc"));
//! let ops: Vec<DiffOp> = lines.iter().map(|l| l.op).collect();
//! assert_eq!(ops, [DiffOp::Equal, DiffOp::Delete, DiffOp::Insert, DiffOp::Equal]);
//! assert_eq!(lines[1].old_line, Some(2));
//! assert_eq!(lines[2].new_line, Some(2));
//! ```

use crate::escape::escape_into;
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt::Write;

/// Number of lines shown before the expand marker on a collapsed diff.
pub const DIFF_PREVIEW_LINES: usize = 5;

/// The kind of a single diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// Present on both sides.
    Equal,
    /// Only in the old text.
    Delete,
    /// Only in the new text.
    Insert,
}

/// One line of an edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// What happened to the line.
    pub op: DiffOp,
    /// 1-based line number in the old text; `None` for insertions.
    pub old_line: Option<usize>,
    /// 1-based line number in the new text; `None` for deletions.
    pub new_line: Option<usize>,
    /// The line content without its terminator.
    pub text: String,
}

/// Computes the line edit script from `old` to `new`.
///
/// Uses Myers' algorithm, so the output is deterministic for a given input.
/// Within a replaced region every deletion comes before the insertions.
#[must_use]
pub fn diff_lines(old: &[&str], new: &[&str]) -> Vec<DiffLine> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(old, new);

    let mut lines: Vec<DiffLine> = diff
        .iter_all_changes()
        .map(|change| DiffLine {
            op: match change.tag() {
                ChangeTag::Equal => DiffOp::Equal,
                ChangeTag::Delete => DiffOp::Delete,
                ChangeTag::Insert => DiffOp::Insert,
            },
            old_line: change.old_index().map(|i| i + 1),
            new_line: change.new_index().map(|i| i + 1),
            text: change.value().to_owned(),
        })
        .collect();

    // Stable sort keeps each side's relative order.
    for run in lines.split_mut(|line| line.op == DiffOp::Equal) {
        run.sort_by_key(|line| line.op == DiffOp::Insert);
    }
    lines
}

/// Diffs two texts line by line. A missing side counts as empty.
#[must_use]
pub fn diff_text(old: Option<&str>, new: Option<&str>) -> Vec<DiffLine> {
    let old: Vec<&str> = old.unwrap_or_default().lines().collect();
    let new: Vec<&str> = new.unwrap_or_default().lines().collect();
    diff_lines(&old, &new)
}

/// How a diff should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffView<'a> {
    /// Old and new are identical.
    NoChanges,
    /// Short enough to show every line.
    Full(&'a [DiffLine]),
    /// Too long: show a preview and an expand marker for the rest.
    Preview {
        /// The leading lines shown while collapsed.
        shown: &'a [DiffLine],
        /// How many lines the expand marker stands for.
        hidden: usize,
    },
}

/// Applies the length policy: diffs longer than `threshold` lines collapse to
/// a [`DIFF_PREVIEW_LINES`]-line preview.
///
/// A script with no deletions or insertions is [`DiffView::NoChanges`]. A
/// diff that fits in the preview is never collapsed, whatever the threshold.
#[must_use]
pub fn summarize(lines: &[DiffLine], threshold: usize) -> DiffView<'_> {
    if lines.iter().all(|line| line.op == DiffOp::Equal) {
        DiffView::NoChanges
    } else if lines.len() <= threshold.max(DIFF_PREVIEW_LINES) {
        DiffView::Full(lines)
    } else {
        let (shown, rest) = lines.split_at(DIFF_PREVIEW_LINES);
        DiffView::Preview {
            shown,
            hidden: rest.len(),
        }
    }
}

/// Renders diff lines as rows with old/new line-number columns.
#[must_use]
pub fn render_lines(lines: &[DiffLine]) -> String {
    let mut out = String::from("<div class=\"diff-lines\">\n");
    for line in lines {
        let (class, prefix) = match line.op {
            DiffOp::Equal => ("diff-context", ""),
            DiffOp::Delete => ("diff-del", "-"),
            DiffOp::Insert => ("diff-add", "+"),
        };
        write!(
            out,
            "<div class=\"diff-line {class}\">\
             <span class=\"diff-line-num old\">{}</span>\
             <span class=\"diff-line-num new\">{}</span>\
             <span class=\"diff-prefix\">{prefix}</span>\
             <span class=\"diff-content\">",
            line_number(line.old_line),
            line_number(line.new_line),
        )
        .unwrap();
        escape_into(&mut out, &line.text);
        out.push_str("</span></div>\n");
    }
    out.push_str("</div>");
    out
}

fn line_number(n: Option<usize>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}
