//! Line sanitization applied before any parsing decision.
//!
//! Configuration text copied out of terminal emulators, wikis and vendor
//! export tools routinely carries non-breaking and typographic spaces.
//! Sanitization maps those to plain ASCII spaces and strips surrounding
//! whitespace; the original line is kept verbatim elsewhere, so no
//! information is lost.

/// Check if a codepoint is one of the exotic Unicode spaces normalized to
/// U+0020.
fn is_exotic_space(c: char) -> bool {
    matches!(
        c,
        '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}'
    )
}

/// Normalize exotic Unicode whitespace to ASCII space and strip leading and
/// trailing whitespace. Pure and idempotent.
pub fn sanitize(line: &str) -> String {
    let normalized: String = line
        .chars()
        .map(|c| if is_exotic_space(c) { ' ' } else { c })
        .collect();
    normalized.trim().to_string()
}
