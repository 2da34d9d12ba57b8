use crate::cielab::{ciede2000, rgb_to_cielab};
use crate::palette::{palette_16_lab, palette_256_lab};

/// Nearest 256-color palette index to `rgb` by CIEDE2000 distance.
pub fn nearest_256(rgb: (u8, u8, u8)) -> u8 {
    nearest_in(rgb, palette_256_lab())
}

/// Nearest 16-color palette index to `rgb` by CIEDE2000 distance.
pub fn nearest_16(rgb: (u8, u8, u8)) -> u8 {
    nearest_in(rgb, palette_16_lab())
}

fn nearest_in(rgb: (u8, u8, u8), table: &[crate::cielab::Lab]) -> u8 {
    let target = rgb_to_cielab(rgb.0, rgb.1, rgb.2);
    let mut best_idx = 0usize;
    let mut best_dist = f64::MAX;
    for (i, lab) in table.iter().enumerate() {
        let d = ciede2000(target, *lab);
        if d < best_dist {
            best_dist = d;
            best_idx = i;
        }
    }
    best_idx as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_red_maps_to_a_red_like_256_index() {
        let idx = nearest_256((255, 0, 0));
        let (r, g, b) = crate::palette::palette_256()[idx as usize];
        assert!(r > g && r > b);
    }

    #[test]
    fn black_maps_to_black() {
        assert_eq!(nearest_16((0, 0, 0)), 0);
    }
}
