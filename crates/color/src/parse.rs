//! Parses CSI SGR escapes and `%x<code>` MUSH color tokens embedded in text
//! into a plain-text string plus an ordered list of state-change spans
//! (spec.md §4.B `parse_embedded_sequences`).

use crate::state::{ColorChannel, ColorState};

/// One contiguous run of `plain_text` rendered under a fixed `ColorState`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpan {
    pub position: usize,
    pub length: usize,
    pub state: ColorState,
}

/// Parses `text`, stripping embedded CSI SGR escapes and `%x<code>` tokens,
/// returning the plain text plus the ordered list of color spans covering
/// it. Span positions are strictly non-decreasing and spans are contiguous
/// (no gaps) so that summing lengths equals `plain_text.chars().count()`.
pub fn parse_embedded_sequences(text: &str) -> (String, Vec<ColorSpan>) {
    let mut plain = String::new();
    let mut spans: Vec<(usize, ColorState)> = Vec::new();
    let mut state = ColorState::default();
    let mut last_recorded: Option<ColorState> = None;
    let mut plain_chars = 0usize;

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] == '\u{1b}' && chars.get(i + 1) == Some(&'[') {
            let mut j = i + 2;
            while j < chars.len() && chars[j] != 'm' {
                j += 1;
            }
            if j < chars.len() {
                let params = &chars[i + 2..j];
                apply_sgr_params(&mut state, params);
                i = j + 1;
                continue;
            }
            // Unterminated escape: treat the ESC byte itself as plain text.
        } else if chars[i] == '%' && chars.get(i + 1) == Some(&'x') && i + 2 < chars.len() {
            apply_xcode(&mut state, chars[i + 2]);
            i += 3;
            continue;
        }
        if last_recorded != Some(state) {
            spans.push((plain_chars, state));
            last_recorded = Some(state);
        }
        plain.push(chars[i]);
        plain_chars += 1;
        i += 1;
    }

    let mut out = Vec::with_capacity(spans.len());
    for idx in 0..spans.len() {
        let (pos, st) = spans[idx];
        let end = spans.get(idx + 1).map(|(p, _)| *p).unwrap_or(plain_chars);
        out.push(ColorSpan {
            position: pos,
            length: end - pos,
            state: st,
        });
    }
    (plain, out)
}

fn apply_sgr_params(state: &mut ColorState, params: &[char]) {
    let text: String = params.iter().collect();
    let codes: Vec<i64> = if text.is_empty() {
        vec![0]
    } else {
        text.split(';').map(|p| p.parse().unwrap_or(0)).collect()
    };
    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            0 => *state = ColorState::default(),
            1 => state.highlight = true,
            4 => state.underline = true,
            5 => state.flash = true,
            7 => state.inverse = true,
            22 => state.highlight = false,
            24 => state.underline = false,
            25 => state.flash = false,
            27 => state.inverse = false,
            n @ 30..=37 => state.fg = ColorChannel::set16((n - 30) as u8),
            39 => state.fg = ColorChannel::reset(),
            n @ 40..=47 => state.bg = ColorChannel::set16((n - 40) as u8),
            49 => state.bg = ColorChannel::reset(),
            n @ 90..=97 => state.fg = ColorChannel::set16((n - 90) as u8 + 8),
            n @ 100..=107 => state.bg = ColorChannel::set16((n - 100) as u8 + 8),
            38 => i += consume_extended(&codes[i + 1..], &mut state.fg),
            48 => i += consume_extended(&codes[i + 1..], &mut state.bg),
            _ => {}
        }
        i += 1;
    }
}

/// Consumes a `5;n` or `2;r;g;b` extended-color sequence, returning how many
/// extra codes (beyond the `38`/`48` itself) were consumed.
fn consume_extended(rest: &[i64], channel: &mut ColorChannel) -> usize {
    match rest.first() {
        Some(5) => {
            if let Some(&n) = rest.get(1) {
                *channel = ColorChannel::set256(n as u8);
            }
            2
        }
        Some(2) => {
            if let (Some(&r), Some(&g), Some(&b)) = (rest.get(1), rest.get(2), rest.get(3)) {
                *channel = ColorChannel::set_rgb(r as u8, g as u8, b as u8);
            }
            4
        }
        _ => 0,
    }
}

fn apply_xcode(state: &mut ColorState, code: char) {
    match code {
        'n' => *state = ColorState::default(),
        'h' => state.highlight = true,
        'u' => state.underline = true,
        'i' => state.inverse = true,
        'f' => state.flash = true,
        'x' => state.fg = ColorChannel::set16(0),
        'r' => state.fg = ColorChannel::set16(1),
        'g' => state.fg = ColorChannel::set16(2),
        'y' => state.fg = ColorChannel::set16(3),
        'b' => state.fg = ColorChannel::set16(4),
        'm' => state.fg = ColorChannel::set16(5),
        'c' => state.fg = ColorChannel::set16(6),
        'w' => state.fg = ColorChannel::set16(7),
        'X' => state.bg = ColorChannel::set16(0),
        'R' => state.bg = ColorChannel::set16(1),
        'G' => state.bg = ColorChannel::set16(2),
        'Y' => state.bg = ColorChannel::set16(3),
        'B' => state.bg = ColorChannel::set16(4),
        'M' => state.bg = ColorChannel::set16(5),
        'C' => state.bg = ColorChannel::set16(6),
        'W' => state.bg = ColorChannel::set16(7),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_with_no_escapes_is_one_span() {
        let (plain, spans) = parse_embedded_sequences("hello");
        assert_eq!(plain, "hello");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].length, 5);
        assert!(spans[0].state.is_default());
    }

    #[test]
    fn strip_ansi_len_matches_plain_length() {
        let text = "\u{1b}[31mred\u{1b}[0m plain";
        let (plain, _) = parse_embedded_sequences(text);
        assert_eq!(plain, "red plain");
    }

    #[test]
    fn xcode_tokens_set_fg_color() {
        let (plain, spans) = parse_embedded_sequences("%xrhi%xnbye");
        assert_eq!(plain, "hibye");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].state.fg.idx16, Some(1));
        assert!(spans[1].state.is_default());
    }

    #[test]
    fn spans_are_contiguous_and_cover_whole_string() {
        let (plain, spans) = parse_embedded_sequences("a\u{1b}[1mb\u{1b}[0mc");
        let total: usize = spans.iter().map(|s| s.length).sum();
        assert_eq!(total, plain.chars().count());
        for w in spans.windows(2) {
            assert_eq!(w[0].position + w[0].length, w[1].position);
        }
    }
}
