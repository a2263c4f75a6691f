use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed enumeration of vendor CLI identities the core admits.
///
/// Each identity names exactly one provider record; adding a vendor means adding a variant
/// here plus an implementation of `Provider` in `freshell-providers`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Claude,
    Codex,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Claude => "claude",
            ProviderId::Codex => "codex",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "claude" => Some(ProviderId::Claude),
            "codex" => Some(ProviderId::Codex),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_parse() {
        for id in [ProviderId::Claude, ProviderId::Codex] {
            assert_eq!(ProviderId::parse(id.as_str()), Some(id));
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(ProviderId::parse("gemini"), None);
        assert_eq!(ProviderId::parse(""), None);
    }
}
