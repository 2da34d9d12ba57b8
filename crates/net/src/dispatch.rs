use tinymush_common::Dbref;

/// A player line split into its dispatch pieces (spec.md §4.F step 1):
/// verb up to the first space or `=`, `/`-separated switches, the
/// left-of-`=` argument, and the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub verb: String,
    pub switches: Vec<String>,
    pub left: String,
    pub right: Option<String>,
}

pub fn parse_command(line: &str) -> ParsedCommand {
    let (head, rest) = match line.split_once('=') {
        Some((h, r)) => (h, Some(r.to_string())),
        None => (line, None),
    };
    let head = head.trim_end();
    let (verb_and_switches, left) = match head.split_once(' ') {
        Some((v, l)) => (v, l.to_string()),
        None => (head, String::new()),
    };
    let mut parts = verb_and_switches.split('/');
    let verb = parts.next().unwrap_or("").to_string();
    let switches = parts.map(str::to_string).collect();
    ParsedCommand {
        verb,
        switches,
        left,
        right: rest,
    }
}

/// Logged-out commands, matched whole-message and case-insensitively
/// (spec.md §6 "Logged-out commands").
pub const LOGGED_OUT_COMMANDS: &[&str] = &[
    "WHO", "DOING", "SESSION", "INFO", "PUEBLOCLIENT", "PREFIX", "SUFFIX", "QUIT", "LOGOUT",
];

pub fn is_logged_out_command(verb: &str) -> bool {
    LOGGED_OUT_COMMANDS.contains(&verb.to_ascii_uppercase().as_str())
}

/// A tuple queued for later or deferred execution (spec.md §4.F
/// "Wait-queue"): `cause` is the object whose action enqueued this entry.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub pid: u64,
    pub cause: Dbref,
    pub enactor: Dbref,
    pub text: String,
    pub when: u64,
    pub semaphore: Option<Dbref>,
    arrival: u64,
}

/// `@wait`/`@halt`/`@ps` operate on this queue. Entries are released in
/// `(when, arrival)` order, oldest arrival first on ties, once `when <=
/// now` and (if set) the semaphore's counter is nonzero.
#[derive(Debug, Default)]
pub struct WaitQueue {
    entries: Vec<QueueEntry>,
    next_pid: u64,
    next_arrival: u64,
}

impl WaitQueue {
    pub fn new() -> Self {
        WaitQueue::default()
    }

    pub fn push(&mut self, cause: Dbref, enactor: Dbref, text: &str, when: u64, semaphore: Option<Dbref>) -> u64 {
        let pid = self.next_pid;
        self.next_pid += 1;
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.entries.push(QueueEntry {
            pid,
            cause,
            enactor,
            text: text.to_string(),
            when,
            semaphore,
            arrival,
        });
        pid
    }

    pub fn halt(&mut self, pid: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.pid != pid);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns every entry ready to run at `now`, given `semaphore_ready`
    /// (true if the entry's semaphore dbref currently permits release),
    /// in `(when, arrival)` order, and removes them from the queue.
    pub fn drain_ready(&mut self, now: u64, semaphore_ready: impl Fn(Dbref) -> bool) -> Vec<QueueEntry> {
        let mut ready = Vec::new();
        let mut remaining = Vec::new();
        for e in self.entries.drain(..) {
            let gated = e.semaphore.map(|s| !semaphore_ready(s)).unwrap_or(false);
            if e.when <= now && !gated {
                ready.push(e);
            } else {
                remaining.push(e);
            }
        }
        self.entries = remaining;
        ready.sort_by_key(|e| (e.when, e.arrival));
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verb_switches_left_right() {
        let p = parse_command("look/quiet here=there");
        assert_eq!(p.verb, "look");
        assert_eq!(p.switches, vec!["quiet".to_string()]);
        assert_eq!(p.left, "here");
        assert_eq!(p.right, Some("there".to_string()));
    }

    #[test]
    fn parses_bare_verb_with_no_args() {
        let p = parse_command("look");
        assert_eq!(p.verb, "look");
        assert!(p.left.is_empty());
        assert_eq!(p.right, None);
    }

    #[test]
    fn logged_out_lookup_is_case_insensitive() {
        assert!(is_logged_out_command("who"));
        assert!(is_logged_out_command("Info"));
        assert!(!is_logged_out_command("look"));
    }

    #[test]
    fn queue_drains_in_when_then_arrival_order() {
        let mut q = WaitQueue::new();
        q.push(Dbref(1), Dbref(1), "cmd-a", 5, None);
        q.push(Dbref(1), Dbref(1), "cmd-b", 1, None);
        q.push(Dbref(1), Dbref(1), "cmd-c", 1, None);
        let ready = q.drain_ready(10, |_| true);
        let texts: Vec<&str> = ready.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["cmd-b", "cmd-c", "cmd-a"]);
        assert!(q.is_empty());
    }

    #[test]
    fn semaphore_gated_entry_is_not_drained_until_ready() {
        let mut q = WaitQueue::new();
        q.push(Dbref(1), Dbref(1), "gated", 0, Some(Dbref(5)));
        assert!(q.drain_ready(0, |_| false).is_empty());
        assert_eq!(q.len(), 1);
        let ready = q.drain_ready(0, |_| true);
        assert_eq!(ready.len(), 1);
    }

    #[test]
    fn halt_removes_by_pid() {
        let mut q = WaitQueue::new();
        let pid = q.push(Dbref(1), Dbref(1), "x", 0, None);
        assert!(q.halt(pid));
        assert!(q.is_empty());
        assert!(!q.halt(pid));
    }
}
