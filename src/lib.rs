// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert Claude Code session logs to standalone HTML.
//!
//! This crate provides parsing and rendering functionality for transforming
//! Claude Code's JSONL session logs into a single self-contained HTML page
//! with inlined styles and a small script for expanding collapsed blocks.
//!
//! # Overview
//!
//! Claude Code records every session as a JSONL file. This crate:
//!
//! 1. Parses the log into an ordered list of typed records
//! 2. Renders each record as an HTML block (Markdown text, highlighted code,
//!    tool calls, collapsible tool output and edit diffs)
//! 3. Assembles the blocks into one document with the bundled assets
//!
//! # Example
//!
//! ```no_run
//! use cc2html::{document, parser, renderer};
//!
//! let jsonl = std::fs::read_to_string("session.jsonl").unwrap();
//! let session = parser::parse_session(&jsonl).unwrap();
//!
//! let opts = renderer::RenderOptions {
//!     hide_thinking: false,
//!     ..Default::default()
//! };
//!
//! let html = document::render_session("session", &session, &opts, &document::Assets::bundled());
//! std::fs::write("session.html", html).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`parser`]: JSONL parsing and record types
//! - [`renderer`]: per-record HTML blocks and render options
//! - [`document`]: the complete page and its bundled assets
//! - [`markdown`]: Markdown subset used for message text
//! - [`codeblock`]: fenced code block extraction and highlighting
//! - [`diff`]: line diffs for file edits
//! - [`timing`]: session duration statistics
//! - [`escape`]: HTML escaping

#![deny(missing_docs)]

pub mod codeblock;
pub mod diff;
pub mod document;
pub mod escape;
pub mod markdown;
pub mod parser;
pub mod renderer;
pub mod timing;
