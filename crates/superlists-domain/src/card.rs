use crate::section::SectionMarker;

/// Titles starting with this are comment cards and never count toward WiP.
pub const COMMENT_PREFIX: &str = "//";
/// Badge text (case-insensitive) that marks a card as blocked.
pub const BLOCKED_BADGE: &str = "blocked";

/// Flags derived from a card's title and badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardTraits {
    pub is_section: bool,
    pub is_comment: bool,
    pub is_blocked: bool,
}

impl CardTraits {
    pub fn derive<S: AsRef<str>>(title: &str, badges: &[S], marker: &SectionMarker) -> Self {
        Self {
            is_section: marker.is_section(title),
            is_comment: is_comment(title),
            is_blocked: badges
                .iter()
                .any(|badge| badge.as_ref().to_lowercase().contains(BLOCKED_BADGE)),
        }
    }

    /// Whether the card counts toward a WiP limit.
    pub fn is_work_card(&self) -> bool {
        !self.is_section && !self.is_comment
    }
}

pub fn is_comment(title: &str) -> bool {
    title.starts_with(COMMENT_PREFIX)
}

/// Splits `"Name: value"` badge text into a custom field.
pub fn parse_field(badge: &str) -> Option<(String, String)> {
    let (name, value) = badge.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
