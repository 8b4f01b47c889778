//! Wizard region boundary detection.

use std::ops::Range;

use serde::Serialize;

/// The start marker must appear within this many lines of the top of the
/// file for the wizard section to exist.
pub const SCAN_LIMIT: usize = 200;

/// Marked region of a header file containing configuration annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    /// Line index of the start marker.
    pub start: usize,
    /// Exclusive upper bound: the end-marker line index, or one past the
    /// last line when no end marker was found.
    pub end: usize,
}

impl Region {
    /// Annotated lines, exclusive of both marker lines.
    pub fn content(&self) -> Range<usize> {
        self.start + 1..self.end
    }
}

/// Locate the wizard region, or `None` when the file carries no
/// configuration section (a normal, non-error outcome).
///
/// Both markers are matched as case-insensitive substrings.
pub(crate) fn find_region(
    lines: &[&str],
    start_marker: &str,
    end_marker: Option<&str>,
) -> Option<Region> {
    let start_marker = start_marker.to_lowercase();
    let start = lines
        .iter()
        .take(SCAN_LIMIT)
        .position(|line| line.to_lowercase().contains(&start_marker))?;

    let end = end_marker
        .map(str::to_lowercase)
        .and_then(|marker| {
            lines[start + 1..]
                .iter()
                .position(|line| line.to_lowercase().contains(&marker))
        })
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    debug!("wizard region: lines {}..{}", start, end);
    Some(Region { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "<<< Use Configuration Wizard in Context Menu >>>";
    const END: &str = "<<< end of configuration section >>>";

    #[test]
    fn test_markers_found() {
        let start_line = format!("// {START}");
        let end_line = format!("// {END}");
        let lines: Vec<&str> = vec!["// header", &start_line, "// <q> A", &end_line, "#define A 1"];
        let region = find_region(&lines, START, Some(END)).unwrap();
        assert_eq!(region.start, 1);
        assert_eq!(region.end, 3);
        assert_eq!(region.content(), 2..3);
    }

    #[test]
    fn test_case_insensitive() {
        let lines = ["//--- <<< USE CONFIGURATION WIZARD IN CONTEXT MENU >>> ---"];
        let refs: Vec<&str> = lines.to_vec();
        assert!(find_region(&refs, START, Some(END)).is_some());
    }

    #[test]
    fn test_no_start_marker() {
        let lines: Vec<&str> = vec!["int main(void) {", "}"];
        assert_eq!(find_region(&lines, START, Some(END)), None);
    }

    #[test]
    fn test_start_marker_beyond_scan_limit() {
        let mut lines = vec!["// filler"; SCAN_LIMIT];
        let marker_line = format!("// {START}");
        lines.push(&marker_line);
        assert_eq!(find_region(&lines, START, Some(END)), None);
    }

    #[test]
    fn test_missing_end_marker_extends_to_eof() {
        let marker_line = format!("// {START}");
        let lines = vec![&marker_line as &str, "// <q> A", "#define A 1"];
        let region = find_region(&lines, START, Some(END)).unwrap();
        assert_eq!(region.end, 3);
        assert_eq!(region.content(), 1..3);
    }
}
