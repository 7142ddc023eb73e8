// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! HTML rendering of individual session records.
//!
//! Each [`Record`] becomes one [`RenderedBlock`]. The renderer decides per
//! record kind how the block looks and whether it starts collapsed:
//!
//! - user and assistant text goes through the Markdown pipeline,
//! - thinking is hidden entirely by default, or shown collapsed,
//! - tool calls show a one-line summary with the full arguments on expand,
//! - long tool output collapses to a short preview,
//! - edit results are shown as line diffs,
//! - errors are always shown in full.
//!
//! Collapsible blocks carry both renderings. The bundled script only toggles
//! an `expanded` class on the block, so nothing is recomputed in the browser.
//!
//! # Example
//!
//! ```
//! use cc2html::parser::{Content, Record};
//! use cc2html::renderer::{RenderOptions, render_record};
//!
//! let record = Record {
//!     timestamp: None,
//!     content: Content::User("Fix the **build**".into()),
//! };
//! let block = render_record(&record, 0, &RenderOptions::default()).unwrap();
//!
//! assert_eq!(block.id, "block-0");
//! assert!(!block.collapsed);
//! assert!(block.html.contains("<strong>build</strong>"));
//! ```

use crate::diff::{self, DiffView};
use crate::escape::{escape, escape_into};
use crate::markdown::render_markdown;
use crate::parser::{Content, EditPayload, Record, ToolInvocation, ToolOutput, ToolResult};
use serde_json::Value;
use std::fmt::Write;

/// Number of lines shown before the expand marker on collapsed tool output.
pub const TEXT_PREVIEW_LINES: usize = 3;

/// Longest parameter summary shown on a tool call line, in characters.
const SUMMARY_MAX_CHARS: usize = 100;

/// Indicator colors for well-known tools.
const TOOL_COLORS: &[(&str, &str)] = &[
    ("Read", "#3b82f6"),
    ("Write", "#10b981"),
    ("Edit", "#f59e0b"),
    ("MultiEdit", "#f59e0b"),
    ("Bash", "#22c55e"),
    ("Grep", "#8b5cf6"),
    ("Glob", "#ec4899"),
    ("Task", "#06b6d4"),
    ("WebFetch", "#14b8a6"),
    ("WebSearch", "#f97316"),
    ("TodoWrite", "#a855f7"),
];

/// Indicator color for tools not in [`TOOL_COLORS`].
pub const DEFAULT_TOOL_COLOR: &str = "#6b7280";

/// The argument that best summarizes a call to each well-known tool.
const KEY_PARAMS: &[(&str, &str)] = &[
    ("Read", "file_path"),
    ("Write", "file_path"),
    ("Edit", "file_path"),
    ("MultiEdit", "file_path"),
    ("NotebookEdit", "notebook_path"),
    ("Bash", "command"),
    ("Grep", "pattern"),
    ("Glob", "pattern"),
    ("Task", "description"),
    ("WebFetch", "url"),
    ("WebSearch", "query"),
];

/// Configuration options for HTML rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether to drop thinking records from the output entirely.
    ///
    /// When disabled, thinking is rendered as a collapsed block.
    pub hide_thinking: bool,

    /// Tool output longer than this many lines starts collapsed.
    pub collapse_threshold_lines: usize,

    /// Diffs longer than this many lines start collapsed.
    pub diff_collapse_threshold_lines: usize,

    /// Whether to include the session timing panel in the document header.
    pub show_timing: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hide_thinking: true,
            collapse_threshold_lines: 20,
            diff_collapse_threshold_lines: 10,
            show_timing: true,
        }
    }
}

/// The HTML produced for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    /// Element id, also the target of the block's toggle.
    pub id: String,
    /// Whether the block starts collapsed.
    pub collapsed: bool,
    /// The markup fragment.
    pub html: String,
}

/// Returns the indicator color for a tool name.
///
/// Unknown tools get [`DEFAULT_TOOL_COLOR`].
#[must_use]
pub fn tool_color(tool_name: &str) -> &'static str {
    TOOL_COLORS
        .iter()
        .find(|(name, _)| *name == tool_name)
        .map_or(DEFAULT_TOOL_COLOR, |&(_, color)| color)
}

/// Renders every record in order, skipping those the options hide.
#[must_use]
pub fn render_records(records: &[Record], opts: &RenderOptions) -> Vec<RenderedBlock> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| render_record(record, index, opts))
        .collect()
}

/// Renders a single record.
///
/// `index` is the record's position in the session and makes the block id
/// unique. Returns `None` for records the options hide.
#[must_use]
pub fn render_record(record: &Record, index: usize, opts: &RenderOptions) -> Option<RenderedBlock> {
    let id = format!("block-{index}");
    let (collapsed, html) = match &record.content {
        Content::User(text) => (false, render_message(&id, "user", "User", text)),
        Content::Assistant(text) => (false, render_message(&id, "assistant", "Assistant", text)),
        Content::Thinking(_) if opts.hide_thinking => return None,
        Content::Thinking(text) => (true, render_thinking(&id, text)),
        Content::ToolCall(call) => render_tool_call(&id, call),
        Content::ToolResult(result) => render_tool_result(&id, result, opts),
        Content::Unknown { kind, text } => (false, render_unknown(&id, kind, text)),
    };
    Some(RenderedBlock {
        id,
        collapsed,
        html,
    })
}

fn render_message(id: &str, role: &str, label: &str, text: &str) -> String {
    format!(
        "<div class=\"message {role}-message\" id=\"{id}\">\
         <div class=\"message-role\">{label}</div>\
         <div class=\"message-text\">{}</div></div>",
        render_markdown(text)
    )
}

/// A clickable element that toggles the block with the given id.
fn toggle(id: &str, class: &str, label_html: &str) -> String {
    format!("<div class=\"{class}\" data-toggle=\"{id}\">{label_html}</div>")
}

/// Wraps the parts of a collapsible block.
///
/// `header` is always visible, `preview` only while collapsed and `full` only
/// while expanded.
fn collapsible(id: &str, class: &str, header: &str, preview: &str, full: &str) -> String {
    format!(
        "<div class=\"{class} collapsible\" id=\"{id}\">{header}\
         <div class=\"preview\">{preview}</div>\
         <div class=\"full\">{full}</div></div>"
    )
}

fn render_thinking(id: &str, text: &str) -> String {
    collapsible(
        id,
        "thinking",
        &toggle(id, "thinking-header", "Thinking"),
        "",
        &format!("<div class=\"message-text\">{}</div>", render_markdown(text)),
    )
}

fn render_tool_call(id: &str, call: &ToolInvocation) -> (bool, String) {
    let mut summary = String::new();
    write!(
        summary,
        "<span class=\"tool-dot\" style=\"background-color: {}\"></span>\
         <span class=\"tool-name\">{}</span>",
        tool_color(&call.tool_name),
        escape(&call.tool_name)
    )
    .unwrap();
    let params = summarize_params(call);
    if !params.is_empty() {
        summary.push_str("<span class=\"tool-params\">");
        escape_into(&mut summary, &params);
        summary.push_str("</span>");
    }

    if call.parameters.is_empty() {
        let html = format!(
            "<div class=\"tool-use\" id=\"{id}\"><div class=\"tool-header\">{summary}</div></div>"
        );
        return (false, html);
    }

    let detail = serde_json::to_string_pretty(&call.parameters).unwrap_or_default();
    let html = collapsible(
        id,
        "tool-use",
        &toggle(id, "tool-header", &summary),
        "",
        &format!("<pre class=\"tool-input\"><code>{}</code></pre>", escape(&detail)),
    );
    (true, html)
}

/// One-line description of a call's arguments.
fn summarize_params(call: &ToolInvocation) -> String {
    let key = KEY_PARAMS
        .iter()
        .find(|(name, _)| *name == call.tool_name)
        .and_then(|(_, key)| call.param_str(key));

    let summary = key.map_or_else(
        || {
            call.parameters
                .iter()
                .map(|(name, value)| format!("{name}={}", param_display(value)))
                .collect::<Vec<_>>()
                .join(", ")
        },
        str::to_owned,
    );
    truncate(&summary, SUMMARY_MAX_CHARS)
}

fn param_display(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", truncate(s, SUMMARY_MAX_CHARS)),
        other => other.to_string(),
    }
}

/// Cuts `s` to at most `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    let first_line = s.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max && first_line.len() == s.trim_end().len() {
        return first_line.to_owned();
    }
    let cut: String = first_line.chars().take(max).collect();
    format!("{cut}...")
}

fn render_tool_result(id: &str, result: &ToolResult, opts: &RenderOptions) -> (bool, String) {
    match (&result.output, result.is_error) {
        (ToolOutput::Text(text), true) => (false, render_error(id, text)),
        (ToolOutput::Edit(payload), true) => (false, render_failed_edit(id, payload)),
        (ToolOutput::Text(text), false) => render_text_output(id, text, opts.collapse_threshold_lines),
        (ToolOutput::Edit(payload), false) => {
            render_edit(id, payload, opts.diff_collapse_threshold_lines)
        }
    }
}

fn render_error(id: &str, text: &str) -> String {
    format!(
        "<div class=\"tool-result error\" id=\"{id}\">\
         <div class=\"result-label\">Error</div>\
         <pre><code>{}</code></pre></div>",
        escape(text)
    )
}

/// An edit that did not apply. Shows the attempted change, marked as an error.
fn render_failed_edit(id: &str, payload: &EditPayload) -> String {
    let mut out = format!(
        "<div class=\"tool-result error\" id=\"{id}\"><div class=\"result-label\">Error</div>"
    );
    if let Some(path) = &payload.file_path {
        write!(out, "<div class=\"diff-file-header\">Edit {}</div>", escape(path)).unwrap();
    }
    let lines = diff::diff_text(payload.old_text.as_deref(), payload.new_text.as_deref());
    out.push_str(&diff::render_lines(&lines));
    out.push_str("</div>");
    out
}

fn render_text_output(id: &str, text: &str, threshold: usize) -> (bool, String) {
    if text.trim().is_empty() {
        let html = format!(
            "<div class=\"tool-result empty\" id=\"{id}\"><div class=\"result-label\">(no output)</div></div>"
        );
        return (false, html);
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= threshold.max(TEXT_PREVIEW_LINES) {
        let html = format!(
            "<div class=\"tool-result\" id=\"{id}\"><pre><code>{}</code></pre></div>",
            escape(text)
        );
        return (false, html);
    }

    let hidden = lines.len() - TEXT_PREVIEW_LINES;
    let preview = format!(
        "<pre><code>{}</code></pre>{}",
        escape(&lines[..TEXT_PREVIEW_LINES].join("\n")),
        toggle(
            id,
            "expand-hint",
            &format!("Show {hidden} more lines ({} total)", lines.len())
        )
    );
    let full = format!(
        "<pre><code>{}</code></pre>{}",
        escape(text),
        toggle(id, "expand-hint", "Show less")
    );
    (true, collapsible(id, "tool-result", "", &preview, &full))
}

fn render_edit(id: &str, payload: &EditPayload, threshold: usize) -> (bool, String) {
    let lines = diff::diff_text(payload.old_text.as_deref(), payload.new_text.as_deref());
    let header = payload.file_path.as_deref().map_or_else(String::new, |path| {
        format!("<div class=\"diff-file-header\">Edit {}</div>", escape(path))
    });

    match diff::summarize(&lines, threshold) {
        DiffView::NoChanges => (
            false,
            format!(
                "<div class=\"edit-diff\" id=\"{id}\">{header}<div class=\"diff-empty\">No changes</div></div>"
            ),
        ),
        DiffView::Full(lines) => (
            false,
            format!(
                "<div class=\"edit-diff\" id=\"{id}\">{header}{}</div>",
                diff::render_lines(lines)
            ),
        ),
        DiffView::Preview { shown, hidden } => {
            let preview = format!(
                "{}{}",
                diff::render_lines(shown),
                toggle(
                    id,
                    "diff-expand-link",
                    &format!("Show full diff ({hidden} more lines)")
                )
            );
            let full = format!(
                "{}{}",
                diff::render_lines(&lines),
                toggle(id, "diff-expand-link", "Show less")
            );
            (true, collapsible(id, "edit-diff", &header, &preview, &full))
        }
    }
}

fn render_unknown(id: &str, kind: &str, text: &str) -> String {
    let kind = escape(kind);
    format!(
        "<div class=\"unknown\" id=\"{id}\" data-kind=\"{kind}\">\
         <div class=\"result-label\">unknown: {kind}</div>\
         <pre><code>{}</code></pre></div>",
        escape(text)
    )
}
