// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented scanning of fetched output windows
//!
//! A window is the raw bytes from the watcher's cursor to the current
//! end of output. Only complete lines are scanned; a trailing partial
//! line is held back so the cursor never lands mid-line and no line is
//! scanned twice. Position arithmetic runs on the raw bytes, before
//! lossy UTF-8 conversion, so invalid sequences cannot skew the cursor.

use regex::Regex;
use std::collections::BTreeMap;

/// One matched line and its frozen capture snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub line: String,
    pub captures: BTreeMap<String, String>,
}

/// Result of scanning one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Absolute cursor after the last complete line
    pub new_position: u64,
    /// Matches in line order, one per matching line
    pub matches: Vec<LineMatch>,
}

/// Scan `bytes` (starting at `from_position`) for pattern matches.
///
/// Capture groups bind positionally to `capture_names`; a group that
/// did not participate in the match is simply absent from the
/// snapshot. CR before LF is stripped so CRLF output matches the same
/// patterns as LF output.
pub fn scan_window(
    pattern: &Regex,
    capture_names: &[String],
    from_position: u64,
    bytes: &[u8],
) -> ScanOutcome {
    let Some(last_newline) = bytes.iter().rposition(|&b| b == b'\n') else {
        // no complete line yet; hold everything back
        return ScanOutcome {
            new_position: from_position,
            matches: Vec::new(),
        };
    };
    let complete = &bytes[..=last_newline];
    let new_position = from_position + complete.len() as u64;

    let text = String::from_utf8_lossy(complete);
    let body = text.strip_suffix('\n').unwrap_or(&text);

    let mut matches = Vec::new();
    for raw_line in body.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let mut captures = BTreeMap::new();
        for (index, name) in capture_names.iter().enumerate() {
            if let Some(group) = caps.get(index + 1) {
                captures.insert(name.clone(), group.as_str().to_string());
            }
        }
        matches.push(LineMatch {
            line: line.to_string(),
            captures,
        });
    }

    ScanOutcome {
        new_position,
        matches,
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
