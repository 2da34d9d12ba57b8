//! The standard xterm 256-color palette, plus a pre-computed CIELAB table
//! over it for nearest-color downgrade (spec.md §4.B).

use crate::cielab::{rgb_to_cielab, Lab};
use once_cell::sync::Lazy;

/// RGB values of the 256-color xterm palette.
pub fn palette_256() -> &'static [(u8, u8, u8); 256] {
    static PALETTE: Lazy<[(u8, u8, u8); 256]> = Lazy::new(build_palette);
    &PALETTE
}

/// CIELAB values of the 256-color palette, index-aligned with `palette_256`.
pub fn palette_256_lab() -> &'static [Lab; 256] {
    static LAB: Lazy<[Lab; 256]> = Lazy::new(|| {
        let p = palette_256();
        let mut out = [Lab::default(); 256];
        for (i, &(r, g, b)) in p.iter().enumerate() {
            out[i] = rgb_to_cielab(r, g, b);
        }
        out
    });
    &LAB
}

/// The 16-color ANSI palette (indices 0-15), used for TrueColor/256 -> 16
/// downgrade.
pub fn palette_16() -> &'static [(u8, u8, u8); 16] {
    static PALETTE: [(u8, u8, u8); 16] = [
        (0, 0, 0),
        (128, 0, 0),
        (0, 128, 0),
        (128, 128, 0),
        (0, 0, 128),
        (128, 0, 128),
        (0, 128, 128),
        (192, 192, 192),
        (128, 128, 128),
        (255, 0, 0),
        (0, 255, 0),
        (255, 255, 0),
        (0, 0, 255),
        (255, 0, 255),
        (0, 255, 255),
        (255, 255, 255),
    ];
    &PALETTE
}

pub fn palette_16_lab() -> &'static [Lab; 16] {
    static LAB: Lazy<[Lab; 16]> = Lazy::new(|| {
        let p = palette_16();
        let mut out = [Lab::default(); 16];
        for (i, &(r, g, b)) in p.iter().enumerate() {
            out[i] = rgb_to_cielab(r, g, b);
        }
        out
    });
    &LAB
}

fn build_palette() -> [(u8, u8, u8); 256] {
    let mut out = [(0u8, 0u8, 0u8); 256];
    for (i, slot) in out.iter_mut().enumerate().take(16) {
        *slot = palette_16()[i];
    }
    // 6x6x6 color cube, indices 16..232.
    const STEPS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let mut idx = 16usize;
    for r in STEPS {
        for g in STEPS {
            for b in STEPS {
                out[idx] = (r, g, b);
                idx += 1;
            }
        }
    }
    // Grayscale ramp, indices 232..256.
    for i in 0..24u8 {
        let level = 8 + i * 10;
        out[idx] = (level, level, level);
        idx += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_256_entries_and_known_anchors() {
        let p = palette_256();
        assert_eq!(p.len(), 256);
        assert_eq!(p[0], (0, 0, 0));
        assert_eq!(p[15], (255, 255, 255));
        assert_eq!(p[255], (238, 238, 238));
    }
}
