//! Fixed upper bounds used throughout the core to keep evaluation and
//! storage allocation-bounded (spec.md GLOSSARY: LBUF / MBUF / SBUF).

/// Large line buffer: the universal evaluation sink.
pub const LBUF_SIZE: usize = 8192;
/// Medium buffer: player names, passwords, single-line commands.
pub const MBUF_SIZE: usize = 512;
/// Small buffer: flag letters, short tokens.
pub const SBUF_SIZE: usize = 64;

/// Default number of dense indexed q-registers (`q0..q35`).
pub const DEFAULT_NUM_Q_REGS: usize = 36;
/// Named-register table growth chunk.
pub const NUM_ENV_VARS: usize = 10;
/// Hard ceiling on named registers per evaluation frame.
pub const DEFAULT_REGISTER_LIMIT: usize = 200;

/// Default cap on `[...]` / function-call recursion depth.
pub const DEFAULT_MAX_ITER_NESTING: usize = 50;
/// Default cap on function invocations per top-level evaluation.
pub const DEFAULT_FUNC_INVK_LIM: u64 = 2_500_000;
/// Default cap on parent-chain length (`@parent`).
pub const DEFAULT_PARENT_NEST_LIM: usize = 10;
/// Default cap on per-object named variables (`x()`/`setvar`).
pub const DEFAULT_NUMVARS_LIM: usize = 50;
/// Default cap on per-object data-stack depth.
pub const DEFAULT_STACK_LIM: usize = 50;
/// Default cap on total cells in a per-object grid.
pub const DEFAULT_MAX_GRID_SIZE: usize = 10_000;
/// Default cap on total attribute bytes stored on one object.
pub const DEFAULT_ATTR_BYTES_CAP: usize = 1_000_000;

/// Built-in attribute numbers are below this; user-defined attributes start here.
pub const FIRST_USER_ATTR: u32 = 256;

/// Default cap on a descriptor's queued-but-unwritten output, in bytes.
pub const DEFAULT_OUTPUT_LIMIT: usize = 32_768;
/// Default per-descriptor command quota ceiling (spec.md §4.G).
pub const DEFAULT_CMD_QUOTA_MAX: i32 = 100;
/// Default quota refilled per `timeslice`.
pub const DEFAULT_CMD_QUOTA_INCR: i32 = 1;
/// Default idle timeout (seconds) for an authenticated, non-privileged player.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3600;
/// Default timeout (seconds) for an unauthenticated connection.
pub const DEFAULT_CONN_TIMEOUT_SECS: u64 = 300;
/// Default login retries before a `NEW` descriptor is closed with `R_BADLOGIN`.
pub const DEFAULT_LOGIN_RETRIES: u32 = 3;

/// Chartab mapping a q-register name char (`0-9,a-z,A-Z`) to a dense index
/// `0..36`, or `None` if the char cannot name a dense register.
pub fn qreg_chartab(c: char) -> Option<usize> {
    match c {
        '0'..='9' => Some(c as usize - '0' as usize),
        'a'..='z' => Some(10 + (c as usize - 'a' as usize)),
        'A'..='Z' => Some(10 + (c as usize - 'A' as usize)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chartab_covers_digits_and_letters() {
        assert_eq!(qreg_chartab('0'), Some(0));
        assert_eq!(qreg_chartab('9'), Some(9));
        assert_eq!(qreg_chartab('a'), Some(10));
        assert_eq!(qreg_chartab('z'), Some(35));
        assert_eq!(qreg_chartab('A'), Some(10));
        assert_eq!(qreg_chartab('!'), None);
    }
}
