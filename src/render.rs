//! Plain-text rendering of an essay's outline with per-section status.

use crate::compose::{EssaySession, SectionState};
use crate::models::OutlineEntry;

const PENDING: char = '○';
const GENERATING: char = '◌';
const WRITTEN: char = '●';
const FAILED: char = '✗';

/// What a section looks like from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    Pending,
    Generating,
    Written,
    Failed,
}

impl SectionStatus {
    fn symbol(self) -> char {
        match self {
            Self::Pending => PENDING,
            Self::Generating => GENERATING,
            Self::Written => WRITTEN,
            Self::Failed => FAILED,
        }
    }

    /// Status of `entry` within `session`. Text in the store wins over a
    /// failed retry; an outstanding request wins over both.
    pub fn of(session: &EssaySession, entry: &OutlineEntry) -> Self {
        if session.state(&entry.header) == SectionState::Generating {
            return Self::Generating;
        }
        if session
            .section_text(&entry.header)
            .is_some_and(|t| !t.is_empty())
        {
            return Self::Written;
        }
        if session.last_failure(&entry.header).is_some() {
            Self::Failed
        } else {
            Self::Pending
        }
    }
}

/// Render the outline as a numbered list with status symbols.
///
/// Example output:
/// ```text
/// AI in medicine
/// 1/2 sections (50%)
///
/// 1. ○ Intro
///      Set the scene
/// 2. ● Evidence
///      Summarize the trials
/// ```
pub fn render_outline(session: &EssaySession) -> String {
    let mut output = String::new();
    output.push_str(session.topic());
    output.push('\n');
    output.push_str(&session.progress().to_string());
    output.push('\n');

    if !session.has_outline() {
        output.push_str("\n(no outline yet)\n");
        return output;
    }

    output.push('\n');
    for (i, entry) in session.outline().iter().enumerate() {
        let status = SectionStatus::of(session, entry);
        output.push_str(&format!("{}. {} {}\n", i + 1, status.symbol(), entry.header));
        if !entry.description.is_empty() {
            output.push_str("     ");
            output.push_str(&entry.description);
            output.push('\n');
        }
        if status == SectionStatus::Failed {
            if let Some(message) = session.last_failure(&entry.header) {
                output.push_str("     error: ");
                output.push_str(&message);
                output.push('\n');
            }
        }
    }
    output
}
