use std::collections::HashMap;

use crate::models::OutlineEntry;

const HEADER_MARKER: &str = "## ";
const SECTION_SEPARATOR: &str = "\n\n";

/// Render the essay as markdown, one section per outline entry.
///
/// Sections follow outline order, never the content map's order. A header
/// with no generated text still gets its section, with an empty body.
///
/// ```text
/// ## Intro
///
///
///
/// ## Body
///
/// text
/// ```
pub fn assemble(outline: &[OutlineEntry], content: &HashMap<String, String>) -> String {
    outline
        .iter()
        .map(|entry| render_section(entry, content.get(&entry.header).map(String::as_str)))
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

fn render_section(entry: &OutlineEntry, body: Option<&str>) -> String {
    format!(
        "{}{}{}{}",
        HEADER_MARKER,
        entry.header,
        SECTION_SEPARATOR,
        body.unwrap_or("")
    )
}
