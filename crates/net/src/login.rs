use tinymush_common::{DescriptorFlags, Flags1};

/// Outcome of parsing a `NEW`-state input line (spec.md §4.H).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCommand {
    Connect { user: String, password: String, dark: bool },
    Create { user: String, password: String },
    Quit,
    Unrecognized,
}

/// Parses `connect <user> <password>`, `cd <user> <password>` (dark
/// connect), `create <user> <password>`, and `quit`, honoring a quoted
/// `"first last"` user name (spec.md §6 "Login grammar").
pub fn parse_connect(line: &str) -> LoginCommand {
    let trimmed = line.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower == "quit" {
        return LoginCommand::Quit;
    }
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((v, r)) => (v.to_ascii_lowercase(), r.trim_start()),
        None => return LoginCommand::Unrecognized,
    };
    let (user, password) = match parse_user_and_rest(rest) {
        Some(pair) => pair,
        None => return LoginCommand::Unrecognized,
    };
    match verb.as_str() {
        "connect" | "co" => LoginCommand::Connect { user, password, dark: false },
        "cd" => LoginCommand::Connect { user, password, dark: true },
        "create" | "cr" => LoginCommand::Create { user, password },
        _ => LoginCommand::Unrecognized,
    }
}

fn parse_user_and_rest(rest: &str) -> Option<(String, String)> {
    if let Some(stripped) = rest.strip_prefix('"') {
        let end = stripped.find('"')?;
        let user = stripped[..end].to_string();
        let password = stripped[end + 1..].trim_start().to_string();
        Some((user, password))
    } else {
        let (user, password) = rest.split_once(char::is_whitespace)?;
        Some((user.to_string(), password.trim_start().to_string()))
    }
}

/// `connect DARK` only succeeds for Wizard/God (spec.md §4.H).
pub fn dark_connect_allowed(flags: Flags1) -> bool {
    flags.contains(Flags1::WIZARD)
}

/// Whether a `Guest` name from an `H_GUEST`-unflagged site is permitted
/// (spec.md §8 scenario 8: a guest connection from a non-guest site is
/// refused with "Guest Site Forbidden").
pub fn guest_site_allowed(site_allows_guests: bool) -> bool {
    site_allows_guests
}

/// Idle policy evaluated once per tick per connected descriptor
/// (spec.md §4.H "Idle policy").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    None,
    GoAutodark,
    Disconnect,
}

pub fn idle_action(flags: Flags1, already_hidden: bool, over_idle: bool) -> IdleAction {
    if !over_idle {
        return IdleAction::None;
    }
    if !flags.can_idle() {
        return IdleAction::None;
    }
    if flags.can_hide() && !already_hidden {
        IdleAction::GoAutodark
    } else {
        IdleAction::Disconnect
    }
}

/// Descriptor flag transition on entering AUTODARK.
pub fn apply_autodark(flags: &mut DescriptorFlags) {
    flags.insert(DescriptorFlags::AUTODARK);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_connect() {
        assert_eq!(
            parse_connect("connect Bob hunter2"),
            LoginCommand::Connect { user: "Bob".to_string(), password: "hunter2".to_string(), dark: false }
        );
    }

    #[test]
    fn parses_dark_connect_abbreviation() {
        assert_eq!(
            parse_connect("cd Wizard secretpass"),
            LoginCommand::Connect { user: "Wizard".to_string(), password: "secretpass".to_string(), dark: true }
        );
    }

    #[test]
    fn parses_quoted_name_with_spaces() {
        assert_eq!(
            parse_connect(r#"connect "first last" pw"#),
            LoginCommand::Connect { user: "first last".to_string(), password: "pw".to_string(), dark: false }
        );
    }

    #[test]
    fn parses_create() {
        assert_eq!(
            parse_connect("create NewPlayer pw"),
            LoginCommand::Create { user: "NewPlayer".to_string(), password: "pw".to_string() }
        );
    }

    #[test]
    fn quit_is_recognized_case_insensitively() {
        assert_eq!(parse_connect("QUIT"), LoginCommand::Quit);
    }

    #[test]
    fn unknown_verb_is_unrecognized() {
        assert_eq!(parse_connect("frobnicate x y"), LoginCommand::Unrecognized);
    }

    #[test]
    fn only_wizard_may_dark_connect() {
        assert!(dark_connect_allowed(Flags1::WIZARD));
        assert!(!dark_connect_allowed(Flags1::empty()));
    }

    #[test]
    fn idle_policy_sends_hideable_players_dark_first() {
        assert_eq!(idle_action(Flags1::STAFF, false, true), IdleAction::GoAutodark);
        assert_eq!(idle_action(Flags1::STAFF, true, true), IdleAction::Disconnect);
        assert_eq!(idle_action(Flags1::empty(), false, true), IdleAction::Disconnect);
        assert_eq!(idle_action(Flags1::empty(), false, false), IdleAction::None);
    }
}
