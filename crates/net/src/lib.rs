mod descriptor;
mod dispatch;
mod login;
mod password;
mod telnet;

pub use descriptor::{ConnState, Descriptor};
pub use dispatch::{is_logged_out_command, parse_command, ParsedCommand, QueueEntry, WaitQueue, LOGGED_OUT_COMMANDS};
pub use login::{apply_autodark, dark_connect_allowed, guest_site_allowed, idle_action, parse_connect, IdleAction, LoginCommand};
pub use password::{hash_password, verify_password};
pub use telnet::{connect_negotiation, strip_telnet};
