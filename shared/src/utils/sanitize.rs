//! Bounded-string helpers for trace fields
//!
//! Field text crosses a C boundary and ends up in crash reports, so it must
//! be printable and free of embedded NULs before it is encoded. Truncation
//! happens on `char` boundaries; no lossy re-encoding step is involved.

/// Truncate `s` to at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Replace every unprintable character with `?` and trim surrounding
/// whitespace.
///
/// Unprintable here means: control characters (including `\n`, `\t` and
/// NUL) and Unicode noncharacters. Unpaired surrogates cannot occur in a
/// Rust `&str`, so they need no handling.
pub fn sanitize(s: &str) -> String {
    let scrubbed: String = s
        .chars()
        .map(|c| if is_unprintable(c) { '?' } else { c })
        .collect();
    scrubbed.trim().to_string()
}

fn is_unprintable(c: char) -> bool {
    if c.is_control() {
        return true;
    }
    // Noncharacters: U+FDD0..=U+FDEF and the last two code points of every plane.
    let cp = c as u32;
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}
