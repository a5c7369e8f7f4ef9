//! List-name conventions.
//!
//! A list name may carry a WiP limit as a trailing `[N]` and a group prefix
//! as the text before its first `.`, e.g. `"Delta.Sub1 [3]"`.

use std::ops::Range;

const GROUP_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListName<'a> {
    raw: &'a str,
}

impl<'a> ListName<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The limit declared by a trailing `[N]`, if any.
    pub fn wip_limit(&self) -> Option<u32> {
        self.limit_suffix().map(|(_, limit)| limit)
    }

    /// The name with any `[N]` suffix removed.
    pub fn display_name(&self) -> &'a str {
        match self.limit_suffix() {
            Some((start, _)) => self.raw[..start].trim(),
            None => self.raw.trim(),
        }
    }

    /// Text before the first `.`; `None` when the name has no `.` at all.
    pub fn group_prefix(&self) -> Option<&'a str> {
        self.raw
            .find(GROUP_SEPARATOR)
            .map(|index| &self.raw[..index])
    }

    fn limit_suffix(&self) -> Option<(usize, u32)> {
        let trimmed = self.raw.trim_end();
        let inner_end = trimmed.strip_suffix(']')?.len();
        let open = trimmed[..inner_end].rfind('[')?;
        let digits = &trimmed[open + 1..inner_end];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(|limit| (open, limit))
    }
}

/// Two lists are related when both names contain `.` and share the text before it.
pub fn are_related(a: &str, b: &str) -> bool {
    match (ListName::new(a).group_prefix(), ListName::new(b).group_prefix()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Maximal runs of adjacent related names with at least two members.
///
/// Indexes refer to `names`, which must be in board order.
pub fn plan_groups<S: AsRef<str>>(names: &[S]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for index in 1..=names.len() {
        let continues =
            index < names.len() && are_related(names[index - 1].as_ref(), names[index].as_ref());
        if !continues {
            if index - start >= 2 {
                runs.push(start..index);
            }
            start = index;
        }
    }
    runs
}
