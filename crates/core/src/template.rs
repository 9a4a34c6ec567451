// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Placeholder interpolation for action parameters

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

// constant pattern; compilation cannot fail
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("constant regex pattern is valid")
});

/// Interpolate `${name}` placeholders with values from the capture snapshot
///
/// Applied to every string-valued action parameter just before dispatch.
/// Unknown placeholders are left as-is so a timer-mode tick with no
/// captures yet still produces a usable (if verbatim) parameter.
pub fn interpolate(template: &str, vars: &BTreeMap<String, String>) -> String {
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            vars.get(name)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
