//! Display sanitization for text received from the diagnosis endpoint.
//!
//! Upstream strings end up in the terminal verbatim, so escape sequences
//! (cursor movement, OSC hyperlinks, clipboard writes) and stray control
//! characters are stripped before they reach a canonical result.

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';
const C1_CSI: char = '\u{009b}';

/// Strip ANSI escape sequences and control characters other than `\n` and `\t`.
///
/// Returns `Cow::Borrowed` when the input is already clean.
///
/// ```
/// use hwdiag_types::sanitize_display_text;
///
/// assert_eq!(sanitize_display_text("Reseat RAM"), "Reseat RAM");
/// assert_eq!(sanitize_display_text("Reseat\x1b[2J RAM"), "Reseat RAM");
/// ```
#[must_use]
pub fn sanitize_display_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_disallowed) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESC => match chars.peek() {
                Some('[') => {
                    chars.next();
                    skip_csi(&mut chars);
                }
                Some(']' | 'P' | '^' | '_') => {
                    chars.next();
                    skip_string_sequence(&mut chars);
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            C1_CSI => skip_csi(&mut chars),
            c if is_disallowed(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_disallowed(c: char) -> bool {
    if matches!(c, '\n' | '\t') {
        return false;
    }
    c <= '\x1f' || c == '\x7f' || ('\u{0080}'..='\u{009f}').contains(&c)
}

/// CSI: parameter/intermediate bytes up to and including a final byte.
fn skip_csi<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while let Some(&c) = chars.peek() {
        if ('\x40'..='\x7e').contains(&c) {
            chars.next();
            return;
        }
        if !('\x20'..='\x3f').contains(&c) {
            return;
        }
        chars.next();
    }
}

/// OSC/DCS/PM/APC: terminated by BEL or ST (`ESC \`).
fn skip_string_sequence<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == BEL {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}
