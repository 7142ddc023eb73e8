// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Assembly of the final standalone HTML document.
//!
//! The document embeds one stylesheet and one script, followed by a header
//! with the session identifier and timing, and then the rendered blocks in
//! session order.
//!
//! # Example
//!
//! ```
//! use cc2html::document::{Assets, render_session};
//! use cc2html::parser::parse_session;
//! use cc2html::renderer::RenderOptions;
//!
//! let session = parse_session(r#"{"type":"user","message":{"content":"Hello"}}"#).unwrap();
//! let html = render_session("abc123", &session, &RenderOptions::default(), &Assets::bundled());
//!
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! assert!(html.contains("Session ID: abc123"));
//! assert_eq!(html.matches("<style>").count(), 1);
//! ```

use crate::escape::escape;
use crate::parser::Session;
use crate::renderer::{RenderOptions, render_records};
use crate::timing::{SessionTiming, format_duration};
use std::borrow::Cow;
use std::fmt::Write;

/// Stylesheet compiled into the binary.
const BUNDLED_STYLE: &str = include_str!("../assets/style.css");

/// Toggle script compiled into the binary.
const BUNDLED_SCRIPT: &str = include_str!("../assets/toggle.js");

/// The style and behavior payloads embedded in every document.
///
/// Both are inserted verbatim, exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assets {
    /// CSS placed in the document's `<style>` element.
    pub style: Cow<'static, str>,
    /// JavaScript placed in the document's `<script>` element.
    pub script: Cow<'static, str>,
}

impl Assets {
    /// The stylesheet and toggle script shipped with the crate.
    #[must_use]
    pub const fn bundled() -> Self {
        Self {
            style: Cow::Borrowed(BUNDLED_STYLE),
            script: Cow::Borrowed(BUNDLED_SCRIPT),
        }
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Renders a complete HTML document for a session.
///
/// `session_id` is shown in the title and header. Blocks appear in the order
/// of `session.records`.
#[must_use]
pub fn render_session(
    session_id: &str,
    session: &Session,
    opts: &RenderOptions,
    assets: &Assets,
) -> String {
    let session_id = escape(session_id);
    let mut out = String::new();

    writeln!(
        out,
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Claude Code Session - {session_id}</title>\n\
         <style>\n{}\n</style>\n\
         </head>\n\
         <body>\n\
         <div class=\"container\">\n\
         <div class=\"header\">\n\
         <h1>Claude Code Session</h1>\n\
         <div class=\"session-info\">Session ID: {session_id}</div>",
        assets.style
    )
    .unwrap();

    if opts.show_timing {
        render_timing(&mut out, &SessionTiming::from_activity(&session.activity));
    }
    out.push_str("</div>\n<div class=\"messages\">\n");

    let blocks = render_records(&session.records, opts);
    if blocks.is_empty() {
        out.push_str("<p class=\"empty-session\">No messages found.</p>\n");
    }
    for block in blocks {
        out.push_str(&block.html);
        out.push('\n');
    }

    writeln!(
        out,
        "</div>\n</div>\n<script>\n{}\n</script>\n</body>\n</html>",
        assets.script
    )
    .unwrap();
    out
}

fn render_timing(out: &mut String, timing: &SessionTiming) {
    out.push_str("<div class=\"session-timing\">\n");
    for (label, duration) in [
        ("Total Duration", timing.total),
        ("Assistant Working Time", timing.assistant_working),
        ("Waiting for User", timing.waiting_for_user),
    ] {
        writeln!(
            out,
            "<div class=\"timing-item\"><span class=\"timing-label\">{label}:</span>\
             <span class=\"timing-value\">{}</span></div>",
            format_duration(duration)
        )
        .unwrap();
    }
    out.push_str("</div>\n");
}
