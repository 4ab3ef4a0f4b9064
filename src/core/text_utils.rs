// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Character classes and comment handling shared by the tokenizer and the
//! line driver.

pub fn is_ident_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

/// `.` is excluded so size suffixes (`MOVE.L`, `D1.W`) split off.
pub fn is_ident_char(c: u8) -> bool {
    matches!(c, b'_' | b'$') || c.is_ascii_alphanumeric()
}

pub fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t')
}

/// Split `line` at the first `;` outside a quoted string. The comment part
/// keeps its `;`.
pub fn split_comment(line: &str) -> (&str, &str) {
    let mut quote: Option<u8> = None;
    let mut bytes = line.bytes().enumerate();
    while let Some((idx, c)) = bytes.next() {
        match (quote, c) {
            (Some(_), b'\\') => {
                bytes.next();
            }
            (Some(q), _) if c == q => quote = None,
            (None, b'"' | b'\'') => quote = Some(c),
            (None, b';') => return line.split_at(idx),
            _ => {}
        }
    }
    (line, "")
}

/// Motorola-style full-line comment: `*` in column one.
pub fn is_star_comment(line: &str) -> bool {
    line.as_bytes().first() == Some(&b'*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_classes() {
        assert!(is_ident_start(b'_') && is_ident_start(b'q'));
        assert!(!is_ident_start(b'7') && !is_ident_start(b'.'));
        assert!(is_ident_char(b'7') && is_ident_char(b'$'));
        assert!(!is_ident_char(b'.') && !is_ident_char(b'\t'));
    }

    #[test]
    fn comments_outside_quotes() {
        assert_eq!(split_comment("  NOP ; x"), ("  NOP ", "; x"));
        assert_eq!(split_comment("  RTS"), ("  RTS", ""));
        assert_eq!(split_comment("  DB \";\", 1 ;c"), ("  DB \";\", 1 ", ";c"));
        assert_eq!(split_comment("  DB ';' ;c"), ("  DB ';' ", ";c"));
        assert_eq!(split_comment("  DB \"\\\";\" ;c"), ("  DB \"\\\";\" ", ";c"));
    }

    #[test]
    fn star_comment_needs_column_one() {
        assert!(is_star_comment("* banner"));
        assert!(!is_star_comment("  * 2"));
        assert!(!is_star_comment(""));
    }
}
