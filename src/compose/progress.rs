use std::collections::HashMap;

use crate::models::OutlineEntry;

/// Completion counts for an outline against a content snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Count outline entries whose header maps to non-empty text.
    pub fn measure(outline: &[OutlineEntry], content: &HashMap<String, String>) -> Self {
        let completed = outline
            .iter()
            .filter(|entry| {
                content
                    .get(&entry.header)
                    .is_some_and(|text| !text.is_empty())
            })
            .count();
        Self {
            completed,
            total: outline.len(),
        }
    }

    /// Completion ratio in `[0, 1]`; zero for an empty outline.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> f64 {
        self.ratio() * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} sections ({:.0}%)",
            self.completed,
            self.total,
            self.percent()
        )
    }
}

/// Completion ratio of `outline` given `content`.
pub fn progress(outline: &[OutlineEntry], content: &HashMap<String, String>) -> f64 {
    Progress::measure(outline, content).ratio()
}
