use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WipStatus {
    #[default]
    Neutral,
    Reached,
    Exceeded,
}

impl WipStatus {
    pub fn classify(count: usize, limit: Option<u32>) -> Self {
        let Some(limit) = limit else {
            return Self::Neutral;
        };
        let limit = limit as usize;
        if count > limit {
            Self::Exceeded
        } else if count == limit {
            Self::Reached
        } else {
            Self::Neutral
        }
    }
}

/// Badge content: a count, optionally against a limit (`"4 / 3"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipBadge {
    pub count: usize,
    pub limit: Option<u32>,
}

impl WipBadge {
    pub fn plain(count: usize) -> Self {
        Self { count, limit: None }
    }

    pub fn limited(count: usize, limit: u32) -> Self {
        Self {
            count,
            limit: Some(limit),
        }
    }

    pub fn status(&self) -> WipStatus {
        WipStatus::classify(self.count, self.limit)
    }
}

impl fmt::Display for WipBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) => write!(f, "{} / {}", self.count, limit),
            None => write!(f, "{}", self.count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_against_limit() {
        for limit in [0u32, 1, 3, 7] {
            for count in 0..10usize {
                let status = WipStatus::classify(count, Some(limit));
                let expected = if count == limit as usize {
                    WipStatus::Reached
                } else if count > limit as usize {
                    WipStatus::Exceeded
                } else {
                    WipStatus::Neutral
                };
                assert_eq!(status, expected, "count {count} limit {limit}");
            }
        }
    }

    #[test]
    fn test_absent_limit_is_neutral() {
        assert_eq!(WipStatus::classify(0, None), WipStatus::Neutral);
        assert_eq!(WipStatus::classify(99, None), WipStatus::Neutral);
    }

    #[test]
    fn test_badge_text() {
        assert_eq!(WipBadge::limited(4, 3).to_string(), "4 / 3");
        assert_eq!(WipBadge::limited(4, 3).status(), WipStatus::Exceeded);
        assert_eq!(WipBadge::limited(5, 5).status(), WipStatus::Reached);
        assert_eq!(WipBadge::plain(2).to_string(), "2");
    }
}
