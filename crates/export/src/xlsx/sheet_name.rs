//! Worksheet naming rules.

use std::collections::HashSet;

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// Characters that may not appear in a sheet name.
pub const FORBIDDEN_SHEET_CHARS: [char; 7] = ['/', '\\', '?', '*', '[', ']', ':'];

/// Strips forbidden characters and truncates to the length limit.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN_SHEET_CHARS.contains(c))
        .take(MAX_SHEET_NAME_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whether `name` satisfies every naming rule on its own.
pub fn is_valid_sheet_name(name: &str) -> bool {
    let len = name.chars().count();
    len > 0
        && len <= MAX_SHEET_NAME_CHARS
        && !name.chars().any(|c| FORBIDDEN_SHEET_CHARS.contains(&c))
}

/// Hands out unique sheet names.
///
/// Names are compared case-insensitively. A collision gets a ` (2)`, ` (3)`...
/// suffix that replaces the tail of the name so it stays within the limit.
#[derive(Debug, Default)]
pub struct SheetNames {
    taken: HashSet<String>,
}

impl SheetNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a unique name derived from `raw` for the sheet at 1-based `position`.
    pub fn claim(&mut self, raw: &str, position: usize) -> String {
        let mut base = sanitize_sheet_name(raw);
        if base.is_empty() {
            base = format!("Sheet{}", position);
        }

        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME_CHARS.saturating_sub(suffix.chars().count());
            let head: String = base.chars().take(keep).collect();
            candidate = format!("{}{}", head.trim_end(), suffix);
            n += 1;
        }

        self.taken.insert(candidate.to_lowercase());
        candidate
    }
}
