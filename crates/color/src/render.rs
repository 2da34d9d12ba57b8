//! Produces minimal SGR transition sequences between two `ColorState`s at a
//! target color depth (spec.md §4.B `transition`), and renders a full
//! parsed text at a chosen depth.

use crate::nearest::{nearest_16, nearest_256};
use crate::parse::ColorSpan;
use crate::state::{ChannelStatus, ColorChannel, ColorState, ColorType};

/// Produces the shortest SGR sequence that moves the terminal from `from` to
/// `to` at `target`. `transition(s, s, _) == ""` always.
pub fn transition(from: &ColorState, to: &ColorState, target: ColorType) -> String {
    if from == to || target == ColorType::None {
        return String::new();
    }
    if to.is_default() {
        return "\u{1b}[0m".to_string();
    }

    let mut codes: Vec<String> = Vec::new();

    if from.fg != to.fg {
        codes.push(channel_code(&to.fg, target, false));
    }
    if from.bg != to.bg {
        codes.push(channel_code(&to.bg, target, true));
    }
    if from.highlight != to.highlight {
        codes.push(if to.highlight { "1" } else { "22" }.to_string());
    }
    if from.underline != to.underline {
        codes.push(if to.underline { "4" } else { "24" }.to_string());
    }
    if from.flash != to.flash {
        codes.push(if to.flash { "5" } else { "25" }.to_string());
    }
    if from.inverse != to.inverse {
        codes.push(if to.inverse { "7" } else { "27" }.to_string());
    }

    let codes: Vec<String> = codes.into_iter().filter(|c| !c.is_empty()).collect();
    if codes.is_empty() {
        return String::new();
    }
    format!("\u{1b}[{}m", codes.join(";"))
}

fn channel_code(channel: &ColorChannel, target: ColorType, is_bg: bool) -> String {
    let base = if is_bg { 40 } else { 30 };
    let reset_code = if is_bg { "49" } else { "39" };
    let ext_base = if is_bg { 48 } else { 38 };

    match channel.status {
        ChannelStatus::None | ChannelStatus::Reset => reset_code.to_string(),
        ChannelStatus::Set => {
            let downgraded = downgrade(channel, target);
            match downgraded {
                ColorChannel {
                    rgb: Some((r, g, b)),
                    ..
                } if target == ColorType::TrueColor => {
                    format!("{ext_base};2;{r};{g};{b}")
                }
                ColorChannel {
                    idx256: Some(n), ..
                } if target >= ColorType::Ansi256 => format!("{ext_base};5;{n}"),
                ColorChannel { idx16: Some(n), .. } => {
                    if n < 8 {
                        format!("{}", base + n)
                    } else {
                        let bright_base = if is_bg { 100 } else { 90 };
                        format!("{}", bright_base + (n - 8))
                    }
                }
                _ => reset_code.to_string(),
            }
        }
    }
}

/// Maps a channel down to the representation the target depth can express,
/// by nearest-CIELAB lookup when the source is a higher fidelity than the
/// target supports (spec.md §4.B downgrade policy).
fn downgrade(channel: &ColorChannel, target: ColorType) -> ColorChannel {
    let rgb = channel
        .rgb
        .or_else(|| channel.idx256.map(|i| crate::palette::palette_256()[i as usize]))
        .or_else(|| channel.idx16.map(|i| crate::palette::palette_16()[i as usize]));

    match target {
        ColorType::TrueColor => {
            if let Some(rgb) = rgb {
                return ColorChannel::set_rgb(rgb.0, rgb.1, rgb.2);
            }
            *channel
        }
        ColorType::Ansi256 => {
            if channel.idx256.is_some() && channel.rgb.is_none() {
                return *channel;
            }
            if let Some(rgb) = rgb {
                return ColorChannel::set256(nearest_256(rgb));
            }
            *channel
        }
        ColorType::Ansi16 => {
            if channel.idx16.is_some() && channel.rgb.is_none() && channel.idx256.is_none() {
                return *channel;
            }
            if let Some(rgb) = rgb {
                return ColorChannel::set16(nearest_16(rgb));
            }
            *channel
        }
        ColorType::None => *channel,
    }
}

/// Renders `plain` under `spans` at `target`. When `no_bleed` is set, any
/// full reset (`ESC[0m`) is followed by re-asserting the foreground of the
/// *next* span so a colored background never bleeds onto a following line
/// (spec.md §4.B).
pub fn apply_sequences(plain: &str, spans: &[ColorSpan], target: ColorType, no_bleed: bool) -> String {
    if target == ColorType::None {
        return plain.to_string();
    }
    let chars: Vec<char> = plain.chars().collect();
    let mut out = String::new();
    let mut current = ColorState::default();
    for span in spans {
        let mut seq = transition(&current, &span.state, target);
        if no_bleed && seq == "\u{1b}[0m" && !span.state.fg.is_default() {
            seq.push_str(&channel_reassert(&span.state, target));
        }
        out.push_str(&seq);
        let end = (span.position + span.length).min(chars.len());
        for c in &chars[span.position.min(chars.len())..end] {
            out.push(*c);
        }
        current = span.state;
    }
    if !current.is_default() {
        out.push_str("\u{1b}[0m");
    }
    out
}

fn channel_reassert(state: &ColorState, target: ColorType) -> String {
    let code = channel_code(&state.fg, target, false);
    if code.is_empty() {
        String::new()
    } else {
        format!("\u{1b}[{code}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_embedded_sequences;

    #[test]
    fn identical_states_transition_to_empty() {
        let s = ColorState::default();
        assert_eq!(transition(&s, &s, ColorType::TrueColor), "");
    }

    #[test]
    fn round_trip_preserves_stripped_text() {
        let text = "\u{1b}[31mred\u{1b}[0m plain";
        let (plain, spans) = parse_embedded_sequences(text);
        let rendered = apply_sequences(&plain, &spans, ColorType::Ansi16, false);
        let (restripped, _) = parse_embedded_sequences(&rendered);
        assert_eq!(restripped, plain);
    }

    #[test]
    fn none_target_strips_all_color() {
        let text = "\u{1b}[31mred\u{1b}[0m";
        let (plain, spans) = parse_embedded_sequences(text);
        let rendered = apply_sequences(&plain, &spans, ColorType::None, false);
        assert_eq!(rendered, "red");
    }

    #[test]
    fn truecolor_downgrades_to_16_by_nearest_match() {
        let mut from = ColorState::default();
        from.fg = ColorChannel::set_rgb(250, 5, 5);
        let seq = transition(&ColorState::default(), &from, ColorType::Ansi16);
        // Should choose a red-family 16-color code, not a literal 38;2;...
        assert!(!seq.contains("38;2"));
    }
}
