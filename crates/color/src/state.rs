/// Whether a channel (foreground or background) has been explicitly reset,
/// explicitly set, or left at its default terminal color (spec.md §3
/// "ColorState").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    None,
    Reset,
    Set,
}

/// One color channel (foreground or background): at most one of the three
/// representations is meaningful at a time, selected by `depth`-agnostic
/// precedence (rgb > idx256 > idx16) when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorChannel {
    pub status: ChannelStatus,
    pub idx16: Option<u8>,
    pub idx256: Option<u8>,
    pub rgb: Option<(u8, u8, u8)>,
}

impl ColorChannel {
    pub fn reset() -> Self {
        ColorChannel {
            status: ChannelStatus::Reset,
            ..Default::default()
        }
    }

    pub fn set16(idx: u8) -> Self {
        ColorChannel {
            status: ChannelStatus::Set,
            idx16: Some(idx),
            ..Default::default()
        }
    }

    pub fn set256(idx: u8) -> Self {
        ColorChannel {
            status: ChannelStatus::Set,
            idx256: Some(idx),
            ..Default::default()
        }
    }

    pub fn set_rgb(r: u8, g: u8, b: u8) -> Self {
        ColorChannel {
            status: ChannelStatus::Set,
            rgb: Some((r, g, b)),
            ..Default::default()
        }
    }

    pub fn is_default(&self) -> bool {
        self.status == ChannelStatus::None
    }
}

/// Full terminal rendition state at a point in the text (spec.md §3).
/// Designed so "no change" comparisons reduce to memory equality: two
/// `ColorState`s that would render identically always compare `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorState {
    pub fg: ColorChannel,
    pub bg: ColorChannel,
    pub highlight: bool,
    pub underline: bool,
    pub inverse: bool,
    pub flash: bool,
}

impl ColorState {
    pub fn is_default(&self) -> bool {
        *self == ColorState::default()
    }
}

/// Target color depth a descriptor renders to (spec.md §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColorType {
    None,
    Ansi16,
    Ansi256,
    TrueColor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_default() {
        assert!(ColorState::default().is_default());
    }
}
