use tinymush_common::limits::LBUF_SIZE;

/// A bounded line buffer: the universal evaluation sink (spec.md §4.A).
///
/// Every append is silently truncated once the buffer reaches `max - 1`
/// bytes, leaving room for the implicit terminator the original C code wrote
/// explicitly; here that's just "the string stops growing". Appenders never
/// fail or panic on overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lbuf {
    data: String,
    max: usize,
}

impl Lbuf {
    pub fn new() -> Self {
        Self::with_capacity(LBUF_SIZE)
    }

    pub fn with_capacity(max: usize) -> Self {
        Lbuf {
            data: String::new(),
            max: max.max(1),
        }
    }

    pub fn cursor(&self) -> usize {
        self.data.len()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn remaining(&self) -> usize {
        (self.max - 1).saturating_sub(self.data.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn into_string(self) -> String {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Appends `s`, truncating whatever doesn't fit. Truncation happens on a
    /// `char` boundary so the buffer never holds a split UTF-8 sequence.
    pub fn append(&mut self, s: &str) -> usize {
        let room = self.remaining();
        if room == 0 || s.is_empty() {
            return 0;
        }
        let take = floor_char_boundary(s, room.min(s.len()));
        self.data.push_str(&s[..take]);
        take
    }

    pub fn append_char(&mut self, c: char) -> usize {
        let mut buf = [0u8; 4];
        self.append(c.encode_utf8(&mut buf))
    }
}

/// `str::floor_char_boundary` is nightly-only as of this writing; reimplemented here.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_truncates_at_max_minus_one() {
        let mut b = Lbuf::with_capacity(5);
        assert_eq!(b.append("hello world"), 4);
        assert_eq!(b.as_str(), "hell");
        assert!(b.is_full());
    }

    #[test]
    fn append_never_splits_utf8() {
        let mut b = Lbuf::with_capacity(3);
        // 'é' is 2 bytes; only 2 bytes of room, so it must fit whole or not at all.
        let n = b.append("éx");
        assert_eq!(n, 2);
        assert_eq!(b.as_str(), "é");
    }

    #[test]
    fn empty_append_never_allocates_more_than_needed() {
        let mut b = Lbuf::new();
        assert_eq!(b.append(""), 0);
        assert!(b.is_empty());
    }
}
