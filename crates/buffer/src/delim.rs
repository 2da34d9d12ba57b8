/// Delimiter used to split or join tokens (spec.md §4.A).
///
/// `Space` is the MUSH default (any run of one space splits, consistent with
/// how most list functions behave when no explicit separator is given).
/// `Null` and `Crlf` are the two named pseudo-delimiters (spec.md §4.A):
/// `Null` never matches (the whole string is one token), `Crlf` splits
/// on a literal `\r\n` or bare `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delim {
    Space,
    Single(char),
    Multi(String),
    Null,
    Crlf,
}

impl Delim {
    pub fn from_str_arg(s: &str) -> Delim {
        match s {
            "" => Delim::Space,
            _ if s.chars().count() == 1 => Delim::Single(s.chars().next().expect("checked")),
            _ => Delim::Multi(s.to_string()),
        }
    }

    pub fn as_separator(&self) -> String {
        match self {
            Delim::Space => " ".to_string(),
            Delim::Single(c) => c.to_string(),
            Delim::Multi(s) => s.clone(),
            Delim::Null => String::new(),
            Delim::Crlf => "\r\n".to_string(),
        }
    }

    /// Splits `text` on this delimiter. `Null` always returns a single token.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Delim::Space => {
                if text.is_empty() {
                    vec![""]
                } else {
                    text.split(' ').collect()
                }
            }
            Delim::Single(c) => text.split(*c).collect(),
            Delim::Multi(sep) if !sep.is_empty() => text.split(sep.as_str()).collect(),
            Delim::Multi(_) => vec![text],
            Delim::Null => vec![text],
            Delim::Crlf => text.split("\r\n").flat_map(|l| l.split('\n')).collect(),
        }
    }

    pub fn join(&self, parts: &[&str]) -> String {
        parts.join(&self.as_separator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_splits_on_single_space_runs() {
        assert_eq!(Delim::Space.split("a  b"), vec!["a", "", "b"]);
    }

    #[test]
    fn null_never_splits() {
        assert_eq!(Delim::Null.split("a b c"), vec!["a b c"]);
    }

    #[test]
    fn custom_multi_char_delim() {
        let d = Delim::from_str_arg("::");
        assert_eq!(d.split("a::b::c"), vec!["a", "b", "c"]);
        assert_eq!(d.join(&["a", "b", "c"]), "a::b::c");
    }
}
