use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tinymush_color::{apply_sequences, parse_embedded_sequences, ColorChannel, ColorState, ColorType};
use tinymush_common::limits::{
    DEFAULT_CMD_QUOTA_MAX, DEFAULT_CONN_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS,
    DEFAULT_LOGIN_RETRIES, DEFAULT_OUTPUT_LIMIT,
};
use tinymush_common::{Dbref, DescriptorFlags};

use crate::telnet::strip_telnet;

/// Lifecycle states of a descriptor (spec.md §4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    New,
    Auth,
    Connected,
    Autodark,
    Disconnecting,
}

/// One socket's I/O state (spec.md §3 "Descriptor"): an output ring of
/// byte chunks (`TBLOCK`), an input ring of completed command lines
/// (`CBLK`), plus the quota/idle/color bookkeeping a tick drains.
pub struct Descriptor {
    pub id: u64,
    pub player: Dbref,
    pub state: ConnState,
    pub flags: DescriptorFlags,
    pub connected_at: Instant,
    pub last_active: Instant,

    output: VecDeque<u8>,
    output_limit: usize,
    pub output_lost: u64,

    raw_input: Vec<u8>,
    input_lines: VecDeque<String>,

    pub quota: i32,
    pub quota_max: i32,

    pub output_prefix: String,
    pub output_suffix: String,
    pub doing: String,
    pub colormap: Option<[u8; 16]>,
    pub color_state: ColorState,
    pub color_target: ColorType,
    pub no_bleed: bool,

    pub retries_left: u32,
    pub idle_timeout: Duration,
    pub conn_timeout: Duration,
}

impl Descriptor {
    pub fn new(id: u64, now: Instant) -> Self {
        Descriptor {
            id,
            player: Dbref::NOTHING,
            state: ConnState::New,
            flags: DescriptorFlags::empty(),
            connected_at: now,
            last_active: now,
            output: VecDeque::new(),
            output_limit: DEFAULT_OUTPUT_LIMIT,
            output_lost: 0,
            raw_input: Vec::new(),
            input_lines: VecDeque::new(),
            quota: DEFAULT_CMD_QUOTA_MAX,
            quota_max: DEFAULT_CMD_QUOTA_MAX,
            output_prefix: String::new(),
            output_suffix: String::new(),
            doing: String::new(),
            colormap: None,
            color_state: ColorState::default(),
            color_target: ColorType::None,
            no_bleed: false,
            retries_left: DEFAULT_LOGIN_RETRIES,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            conn_timeout: Duration::from_secs(DEFAULT_CONN_TIMEOUT_SECS),
        }
    }

    /// Appends bytes to the output ring, dropping the oldest bytes and
    /// counting them in `output_lost` when the ring would overflow
    /// (spec.md §4.G "Output").
    pub fn queue_write(&mut self, bytes: &[u8]) {
        if bytes.len() > self.output_limit {
            self.output_lost += (bytes.len() - self.output_limit) as u64;
            self.output.clear();
            self.output.extend(&bytes[bytes.len() - self.output_limit..]);
            return;
        }
        let projected = self.output.len() + bytes.len();
        if projected > self.output_limit {
            let overflow = projected - self.output_limit;
            for _ in 0..overflow.min(self.output.len()) {
                self.output.pop_front();
                self.output_lost += 1;
            }
        }
        self.output.extend(bytes);
    }

    /// Renders `text` through the color pipeline at this descriptor's
    /// target depth, remapping the 16 base ANSI indices through a custom
    /// `colormap` when one is set, then wraps it in the prefix/suffix and
    /// queues it for output (spec.md §4.B / §4.G).
    pub fn queue_string(&mut self, text: &str) {
        let (plain, mut spans) = parse_embedded_sequences(text);
        if let Some(map) = self.colormap {
            for span in &mut spans {
                remap_channel(&mut span.state.fg, &map);
                remap_channel(&mut span.state.bg, &map);
            }
        }
        let rendered = apply_sequences(&plain, &spans, self.color_target, self.no_bleed);
        let wrapped = format!("{}{}{}", self.output_prefix, rendered, self.output_suffix);
        self.queue_write(wrapped.as_bytes());
    }

    /// Drains up to `max_bytes` of queued output for a write to the socket.
    pub fn drain_output(&mut self, max_bytes: usize) -> Vec<u8> {
        let n = max_bytes.min(self.output.len());
        self.output.drain(..n).collect()
    }

    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }

    /// Strips telnet sequences, appends to the raw-input buffer, and
    /// enqueues a `CBLK` for every CR/LF-terminated line found
    /// (spec.md §4.G "Input").
    pub fn feed_raw_input(&mut self, bytes: &[u8]) {
        self.raw_input.extend(strip_telnet(bytes));
        loop {
            let Some(pos) = self.raw_input.iter().position(|&b| b == b'\n') else {
                break;
            };
            let mut line: Vec<u8> = self.raw_input.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.input_lines.push_back(String::from_utf8_lossy(&line).into_owned());
        }
    }

    pub fn next_command(&mut self) -> Option<String> {
        self.input_lines.pop_front()
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.input_lines.is_empty()
    }

    /// Refills the quota by `cmd_quota_incr`, capped at `quota_max`
    /// (spec.md §4.G "Quota").
    pub fn refill_quota(&mut self, incr: i32) {
        self.quota = (self.quota + incr).min(self.quota_max);
    }

    pub fn take_quota(&mut self) -> bool {
        if self.quota > 0 {
            self.quota -= 1;
            true
        } else {
            false
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_active = now;
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }
}

fn remap_channel(channel: &mut ColorChannel, map: &[u8; 16]) {
    if let Some(idx) = channel.idx16 {
        if let Some(&mapped) = map.get(idx as usize) {
            channel.idx16 = Some(mapped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_write_then_drain_round_trips() {
        let mut d = Descriptor::new(1, Instant::now());
        d.queue_write(b"hello");
        assert!(d.has_output());
        assert_eq!(d.drain_output(5), b"hello");
        assert!(!d.has_output());
    }

    #[test]
    fn overflow_drops_oldest_and_counts_loss() {
        let mut d = Descriptor::new(1, Instant::now());
        d.output_limit = 4;
        d.queue_write(b"ab");
        d.queue_write(b"cdef");
        assert_eq!(d.output_lost, 2);
        assert_eq!(d.drain_output(16), b"cdef");
    }

    #[test]
    fn feed_raw_input_splits_on_crlf_and_lf() {
        let mut d = Descriptor::new(1, Instant::now());
        d.feed_raw_input(b"who\r\ndoing\n");
        assert_eq!(d.next_command(), Some("who".to_string()));
        assert_eq!(d.next_command(), Some("doing".to_string()));
        assert_eq!(d.next_command(), None);
    }

    #[test]
    fn partial_line_stays_buffered_until_terminator() {
        let mut d = Descriptor::new(1, Instant::now());
        d.feed_raw_input(b"qui");
        assert!(!d.has_pending_commands());
        d.feed_raw_input(b"t\r\n");
        assert_eq!(d.next_command(), Some("quit".to_string()));
    }

    #[test]
    fn quota_refill_is_capped_at_max() {
        let mut d = Descriptor::new(1, Instant::now());
        d.quota = 0;
        d.quota_max = 2;
        d.refill_quota(5);
        assert_eq!(d.quota, 2);
    }

    #[test]
    fn take_quota_fails_at_zero() {
        let mut d = Descriptor::new(1, Instant::now());
        d.quota = 0;
        assert!(!d.take_quota());
    }

    #[test]
    fn queue_string_strips_color_when_target_is_none() {
        let mut d = Descriptor::new(1, Instant::now());
        d.queue_string("\u{1b}[31mred\u{1b}[0m");
        let out = d.drain_output(64);
        assert_eq!(out, b"red");
    }

    #[test]
    fn queue_string_renders_ansi_at_ansi16_target() {
        let mut d = Descriptor::new(1, Instant::now());
        d.color_target = ColorType::Ansi16;
        d.queue_string("\u{1b}[31mred\u{1b}[0m");
        let out = d.drain_output(64);
        assert!(out.starts_with(b"\x1b[31m"));
    }

    #[test]
    fn colormap_remaps_base_ansi_index() {
        let mut d = Descriptor::new(1, Instant::now());
        d.color_target = ColorType::Ansi16;
        let mut map = [0u8; 16];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = i as u8;
        }
        map[1] = 4;
        d.colormap = Some(map);
        d.queue_string("\u{1b}[31mred\u{1b}[0m");
        let out = d.drain_output(64);
        assert!(out.starts_with(b"\x1b[34m"));
    }

    #[test]
    fn queue_string_applies_prefix_and_suffix() {
        let mut d = Descriptor::new(1, Instant::now());
        d.output_prefix = ">> ".to_string();
        d.output_suffix = "\r\n".to_string();
        d.queue_string("hi");
        let out = d.drain_output(64);
        assert_eq!(out, b">> hi\r\n");
    }
}
