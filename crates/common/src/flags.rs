use bitflags::bitflags;

bitflags! {
    /// First 32-bit object flag word. Mirrors the subset of classic MUSH
    /// flags that the evaluator and ACL layer need to test directly; the
    /// remaining bits of the real three flag words are modeled as opaque
    /// storage (`Object::flags2`/`flags3`) since this core never interprets
    /// them.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct Flags1: u32 {
        const WIZARD      = 1 << 0;
        const ROYALTY     = 1 << 1;
        const STAFF       = 1 << 2;
        const DARK        = 1 << 3;
        const HIDDEN      = 1 << 4;
        const NO_BLEED    = 1 << 5;
        const GOING       = 1 << 6;
        const CONNECTED   = 1 << 7;
        const GUEST       = 1 << 8;
        const ANSI        = 1 << 9;
        const COLOR_256    = 1 << 10;
        const COLOR_24BIT  = 1 << 11;
        const HTML        = 1 << 12;
        const PUEBLO      = 1 << 13;
    }
}

impl Flags1 {
    pub fn is_privileged(self) -> bool {
        self.intersects(Flags1::WIZARD | Flags1::ROYALTY | Flags1::STAFF)
    }

    pub fn can_idle(self) -> bool {
        !self.contains(Flags1::WIZARD)
    }

    pub fn can_hide(self) -> bool {
        self.intersects(Flags1::WIZARD | Flags1::ROYALTY | Flags1::STAFF)
    }
}

bitflags! {
    /// Attribute-level flags (ownership/visibility of a single attribute).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct AttrFlags: u16 {
        const NO_COMMAND = 1 << 0;
        const PRIVATE    = 1 << 1;
        const LOCKED     = 1 << 2;
        const DARK       = 1 << 3;
        const WIZARD     = 1 << 4;
    }
}

bitflags! {
    /// Descriptor lifecycle/state flags (spec.md §3 "Descriptor").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct DescriptorFlags: u8 {
        const CONNECTED    = 1 << 0;
        const AUTODARK     = 1 << 1;
        const PUEBLO_CLIENT = 1 << 2;
    }
}
