//! sRGB -> CIELAB conversion and CIEDE2000 perceptual distance, used to pick
//! the nearest palette entry when downgrading TrueColor -> 256 -> 16
//! (spec.md §4.B).

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn f_xyz(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

/// D65 reference white.
const XN: f64 = 0.95047;
const YN: f64 = 1.0;
const ZN: f64 = 1.08883;

pub fn rgb_to_cielab(r: u8, g: u8, b: u8) -> Lab {
    let (rl, gl, bl) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));
    let x = 0.4124564 * rl + 0.3575761 * gl + 0.1804375 * bl;
    let y = 0.2126729 * rl + 0.7151522 * gl + 0.0721750 * bl;
    let z = 0.0193339 * rl + 0.1191920 * gl + 0.9503041 * bl;

    let fx = f_xyz(x / XN);
    let fy = f_xyz(y / YN);
    let fz = f_xyz(z / ZN);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// CIEDE2000 perceptual color distance. Smaller is more similar; 0 for
/// identical colors.
pub fn ciede2000(c1: Lab, c2: Lab) -> f64 {
    let (l1, a1, b1) = (c1.l, c1.a, c1.b);
    let (l2, a2, b2) = (c2.l, c2.a, c2.b);

    let c_bar = ((a1 * a1 + b1 * b1).sqrt() + (a2 * a2 + b2 * b2).sqrt()) / 2.0;
    let g = 0.5 * (1.0 - (c_bar.powi(7) / (c_bar.powi(7) + 25f64.powi(7))).sqrt());

    let a1p = a1 * (1.0 + g);
    let a2p = a2 * (1.0 + g);

    let c1p = (a1p * a1p + b1 * b1).sqrt();
    let c2p = (a2p * a2p + b2 * b2).sqrt();

    let h1p = hue_deg(b1, a1p);
    let h2p = hue_deg(b2, a2p);

    let dlp = l2 - l1;
    let dcp = c2p - c1p;

    let dhp = if c1p * c2p == 0.0 {
        0.0
    } else {
        let mut diff = h2p - h1p;
        if diff > 180.0 {
            diff -= 360.0;
        } else if diff < -180.0 {
            diff += 360.0;
        }
        diff
    };
    let dhp_term = 2.0 * (c1p * c2p).sqrt() * (dhp.to_radians() / 2.0).sin();

    let lp_bar = (l1 + l2) / 2.0;
    let cp_bar = (c1p + c2p) / 2.0;

    let hp_bar = if c1p * c2p == 0.0 {
        h1p + h2p
    } else {
        let sum = h1p + h2p;
        let diff = (h1p - h2p).abs();
        if diff > 180.0 {
            if sum < 360.0 {
                (sum + 360.0) / 2.0
            } else {
                (sum - 360.0) / 2.0
            }
        } else {
            sum / 2.0
        }
    };

    let t = 1.0 - 0.17 * (hp_bar - 30.0).to_radians().cos()
        + 0.24 * (2.0 * hp_bar).to_radians().cos()
        + 0.32 * (3.0 * hp_bar + 6.0).to_radians().cos()
        - 0.20 * (4.0 * hp_bar - 63.0).to_radians().cos();

    let d_theta = 30.0 * (-(((hp_bar - 275.0) / 25.0).powi(2))).exp();
    let r_c = 2.0 * (cp_bar.powi(7) / (cp_bar.powi(7) + 25f64.powi(7))).sqrt();
    let s_l = 1.0 + (0.015 * (lp_bar - 50.0).powi(2)) / (20.0 + (lp_bar - 50.0).powi(2)).sqrt();
    let s_c = 1.0 + 0.045 * cp_bar;
    let s_h = 1.0 + 0.015 * cp_bar * t;
    let r_t = -(2.0 * d_theta.to_radians()).sin() * r_c;

    let kl = 1.0;
    let kc = 1.0;
    let kh = 1.0;

    let term_l = dlp / (kl * s_l);
    let term_c = dcp / (kc * s_c);
    let term_h = dhp_term / (kh * s_h);

    (term_l * term_l + term_c * term_c + term_h * term_h
        + r_t * term_c * term_h)
        .max(0.0)
        .sqrt()
}

fn hue_deg(b: f64, ap: f64) -> f64 {
    if ap == 0.0 && b == 0.0 {
        0.0
    } else {
        let deg = b.atan2(ap).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_colors_have_zero_distance() {
        let lab = rgb_to_cielab(120, 80, 200);
        assert!(ciede2000(lab, lab) < 1e-9);
    }

    #[test]
    fn black_and_white_are_far_apart() {
        let black = rgb_to_cielab(0, 0, 0);
        let white = rgb_to_cielab(255, 255, 255);
        assert!(ciede2000(black, white) > 50.0);
    }

    #[test]
    fn closer_color_has_smaller_distance() {
        let red = rgb_to_cielab(255, 0, 0);
        let near_red = rgb_to_cielab(250, 10, 10);
        let blue = rgb_to_cielab(0, 0, 255);
        assert!(ciede2000(red, near_red) < ciede2000(red, blue));
    }
}
