use tinymush_common::{Dbref, Flags1};
use tinymush_db::ObjectDb;

/// Named predicates over an actor's flag word, as tested by the lock
/// grammar (spec.md §4.I item 1) and by command-level permission checks.
pub fn has_named_flag(flags: Flags1, name: &str) -> bool {
    match name.to_ascii_uppercase().as_str() {
        "WIZARD" => flags.contains(Flags1::WIZARD),
        "ROYALTY" => flags.contains(Flags1::ROYALTY),
        "STAFF" => flags.contains(Flags1::STAFF),
        "DARK" => flags.contains(Flags1::DARK),
        "HIDDEN" => flags.contains(Flags1::HIDDEN),
        "NOBLEED" => flags.contains(Flags1::NO_BLEED),
        "GUEST" => flags.contains(Flags1::GUEST),
        "ANSI" => flags.contains(Flags1::ANSI),
        "CONNECTED" => flags.contains(Flags1::CONNECTED),
        _ => false,
    }
}

/// `controls(actor, target)`: Wizards control everything; everyone else
/// controls only what they own.
pub fn controls(db: &ObjectDb, actor: Dbref, target: Dbref) -> bool {
    let Ok(actor_obj) = db.get(actor) else { return false };
    if actor_obj.flags1.contains(Flags1::WIZARD) {
        return true;
    }
    match db.get(target) {
        Ok(target_obj) => target_obj.owner == actor || target == actor,
        Err(_) => false,
    }
}

pub fn is_privileged(db: &ObjectDb, actor: Dbref) -> bool {
    db.get(actor)
        .map(|o| o.flags1.is_privileged())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_flag_name_is_false() {
        assert!(!has_named_flag(Flags1::WIZARD, "BOGUS"));
    }

    #[test]
    fn wizard_flag_name_is_case_insensitive() {
        assert!(has_named_flag(Flags1::WIZARD, "wizard"));
        assert!(has_named_flag(Flags1::WIZARD, "Wizard"));
    }
}
