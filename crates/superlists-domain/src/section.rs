use regex::Regex;
use superlists_core::{Settings, SuperListsError, SuperListsResult};

/// Recognises section cards by a repeated marker character.
#[derive(Debug, Clone)]
pub struct SectionMarker {
    identifier: String,
    runs: Regex,
}

/// How a title edit moves a card in or out of section status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionChange {
    /// Neither title is a section.
    Unchanged,
    /// Both titles are sections; only the displayed title changes.
    Retitled,
    Removed,
    Created,
}

impl SectionMarker {
    pub fn new(marker: char, repeat: usize) -> SuperListsResult<Self> {
        if repeat == 0 {
            return Err(SuperListsError::invalid(
                "section marker repeat count must be at least 1",
            ));
        }
        let pattern = format!(
            "(?:{}){{{},}}",
            regex::escape(marker.encode_utf8(&mut [0; 4])),
            repeat
        );
        let runs = Regex::new(&pattern).map_err(|e| SuperListsError::invalid(e.to_string()))?;
        Ok(Self {
            identifier: marker.to_string().repeat(repeat),
            runs,
        })
    }

    pub fn from_settings(settings: &Settings) -> SuperListsResult<Self> {
        Self::new(settings.section_char, settings.section_repeat)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_section(&self, title: &str) -> bool {
        title.contains(&self.identifier)
    }

    /// Removes every run of the marker long enough to count and trims the ends.
    pub fn stripped_title(&self, title: &str) -> String {
        self.runs.replace_all(title, "").trim().to_string()
    }

    pub fn classify_change(&self, old_title: &str, new_title: &str) -> SectionChange {
        match (self.is_section(old_title), self.is_section(new_title)) {
            (false, false) => SectionChange::Unchanged,
            (true, true) => SectionChange::Retitled,
            (true, false) => SectionChange::Removed,
            (false, true) => SectionChange::Created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes() -> SectionMarker {
        SectionMarker::new('#', 2).unwrap()
    }

    #[test]
    fn test_section_title_is_stripped() {
        let marker = hashes();
        assert!(marker.is_section("## Section ##"));
        assert_eq!(marker.stripped_title("## Section ##"), "Section");
    }

    #[test]
    fn test_short_runs_survive() {
        let marker = hashes();
        assert!(!marker.is_section("# Heading"));
        assert_eq!(marker.stripped_title("# Heading #"), "# Heading #");
        assert_eq!(marker.stripped_title("A ### B"), "A  B");
    }

    #[test]
    fn test_regex_characters_are_escaped() {
        let marker = SectionMarker::new('*', 3).unwrap();
        assert!(marker.is_section("*** Later ***"));
        assert_eq!(marker.stripped_title("*** Later *****"), "Later");
        assert_eq!(marker.stripped_title("a.b"), "a.b");

        let dots = SectionMarker::new('.', 2).unwrap();
        assert_eq!(dots.stripped_title("ab.. cd"), "ab cd");
        assert_eq!(dots.stripped_title("a.b"), "a.b");
    }

    #[test]
    fn test_stripped_title_is_idempotent_and_run_free() {
        let marker = SectionMarker::new('=', 2).unwrap();
        let titles = [
            "== Todo ==",
            "= = =",
            "=== a == b = c ====",
            "x=y",
            "   ==   ",
            "",
            "====",
            "= == =",
        ];
        for title in titles {
            let once = marker.stripped_title(title);
            assert!(!once.contains("=="), "{title:?} -> {once:?}");
            assert_eq!(marker.stripped_title(&once), once);
        }
    }

    #[test]
    fn test_zero_repeat_is_rejected() {
        assert!(matches!(
            SectionMarker::new('#', 0),
            Err(SuperListsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_classify_change() {
        let marker = hashes();
        assert_eq!(marker.classify_change("a", "b"), SectionChange::Unchanged);
        assert_eq!(marker.classify_change("## a", "## b"), SectionChange::Retitled);
        assert_eq!(marker.classify_change("## a", "a"), SectionChange::Removed);
        assert_eq!(marker.classify_change("a", "a ##"), SectionChange::Created);
    }

    #[test]
    fn test_from_settings() {
        let marker = SectionMarker::from_settings(&Settings::default()).unwrap();
        assert_eq!(marker.identifier(), "###");
    }
}
