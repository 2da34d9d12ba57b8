//! Plain-text string primitives shared by the evaluator's built-in
//! function table (spec.md §8 concrete scenarios 5-6). `after`/`before`
//! match on the literal needle bytes within the haystack, including any
//! embedded escape sequences it carries; see spec.md §9's open question
//! on needle color-state matching and DESIGN.md for the resolution.

pub fn ljust(s: &str, width: usize, fill: char) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        let mut out = String::with_capacity(width);
        out.push_str(s);
        for _ in 0..(width - len) {
            out.push(fill);
        }
        out
    }
}

pub fn rjust(s: &str, width: usize, fill: char) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        let mut out = String::with_capacity(width);
        for _ in 0..(width - len) {
            out.push(fill);
        }
        out.push_str(s);
        out
    }
}

pub fn center(s: &str, width: usize, fill: char) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let total_pad = width - len;
    let left = total_pad / 2;
    let right = total_pad - left;
    let mut out = String::with_capacity(width);
    for _ in 0..left {
        out.push(fill);
    }
    out.push_str(s);
    for _ in 0..right {
        out.push(fill);
    }
    out
}

/// Everything strictly after the first occurrence of `needle`, or `""` if
/// `needle` does not occur (spec.md §8 scenario 6).
pub fn after<'a>(haystack: &'a str, needle: &str) -> &'a str {
    match haystack.find(needle) {
        Some(idx) => &haystack[idx + needle.len()..],
        None => "",
    }
}

/// Everything strictly before the first occurrence of `needle`, or the
/// whole string if `needle` does not occur.
pub fn before<'a>(haystack: &'a str, needle: &str) -> &'a str {
    match haystack.find(needle) {
        Some(idx) => &haystack[..idx],
        None => haystack,
    }
}

/// `fun_left` boundary semantics (spec.md §8): `k <= 0` -> empty,
/// `k >= len` -> the whole string.
pub fn left(s: &str, k: i64) -> String {
    if k <= 0 {
        return String::new();
    }
    s.chars().take(k as usize).collect()
}

/// `fun_mid` boundary semantics (spec.md §8): negative `start` is a window
/// shifted left from 0 (characters before 0 are simply skipped), and the
/// result never exceeds `strip_len(s)` characters.
pub fn mid(s: &str, start: i64, len: i64) -> String {
    if len <= 0 {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    let total = chars.len() as i64;
    let window_end = start + len;
    let clamped_start = start.max(0);
    let clamped_end = window_end.clamp(0, total);
    if clamped_start >= clamped_end {
        return String::new();
    }
    chars[clamped_start as usize..clamped_end as usize]
        .iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_justify() {
        assert_eq!(ljust("hi", 5, '.'), "hi...");
        assert_eq!(rjust("hi", 5, '.'), "...hi");
        assert_eq!(center("hi", 6, '-'), "--hi--");
    }

    #[test]
    fn scenario_after_before() {
        assert_eq!(after("foo=bar=baz", "="), "bar=baz");
        assert_eq!(before("foo=bar=baz", "="), "foo");
    }

    #[test]
    fn left_boundaries() {
        assert_eq!(left("hello", 0), "");
        assert_eq!(left("hello", -3), "");
        assert_eq!(left("hello", 100), "hello");
        assert_eq!(left("hello", 2), "he");
    }

    #[test]
    fn mid_boundaries() {
        assert_eq!(mid("hello", -2, 5), "hel");
        assert_eq!(mid("hello", 1, 2), "el");
        assert_eq!(mid("hello", 10, 5), "");
    }
}
