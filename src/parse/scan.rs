//! Macro and assignment occurrence scanner.
//!
//! Non-tag, non-comment lines inside the wizard region are matched against a
//! `#define NAME [VALUE]` form first and an `identifier = VALUE;` form
//! second. Matches are collected in line order; anything else is skipped
//! silently.

use std::ops::Range;

/// A recognized `#define`/assignment, used to supply an item's real value.
///
/// Occurrences are owned by the parse pass; items reference their values by
/// copy during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroOccurrence {
    /// Macro or variable name.
    pub name: String,
    /// Textual value (defaulted to `"1"` for value-less defines).
    pub value: String,
    /// Line index the occurrence was found on.
    pub line_index: usize,
    /// Raw line text.
    pub line_text: String,
}

/// Scan one line for a macro/assignment occurrence.
pub(crate) fn scan_line(index: usize, line: &str) -> Option<MacroOccurrence> {
    let (name, span) = value_span(line)?;
    let value = if span.is_empty() {
        "1".to_string()
    } else {
        line[span].to_string()
    };
    Some(MacroOccurrence {
        name,
        value,
        line_index: index,
        line_text: line.to_string(),
    })
}

/// Name and byte span of the value text within a macro/assignment line.
///
/// The span is empty for a value-less `#define`; the rewrite pass inserts a
/// separator when substituting into an empty span.
pub(crate) fn value_span(line: &str) -> Option<(String, Range<usize>)> {
    define_span(line).or_else(|| assignment_span(line))
}

/// Match `#define NAME [VALUE]`.
fn define_span(line: &str) -> Option<(String, Range<usize>)> {
    let mut pos = skip_ws(line, 0);
    if !line[pos..].starts_with('#') {
        return None;
    }
    pos = skip_ws(line, pos + 1);
    if !line[pos..].starts_with("define") {
        return None;
    }
    pos += "define".len();
    let after_kw = skip_ws(line, pos);
    if after_kw == pos {
        // "#defineFOO" is not a define
        return None;
    }
    pos = after_kw;
    let name_end = ident_end(line, pos)?;
    let name = line[pos..name_end].to_string();
    let value_start = skip_ws(line, name_end);
    let value_end = line.trim_end().len().max(value_start);
    Some((name, value_start..value_end))
}

/// Match `identifier = VALUE ;` (trailing statement terminator required).
fn assignment_span(line: &str) -> Option<(String, Range<usize>)> {
    let eq = line.find('=')?;
    // reject `==` and compound operators like `+=`
    if line[eq + 1..].starts_with('=') {
        return None;
    }
    let left = line[..eq].trim_end();
    let name_start = left
        .rfind(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .map(|i| i + left[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    let name = &left[name_start..];
    if name.is_empty() || name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    let semi = eq + 1 + line[eq + 1..].find(';')?;
    let value_start = skip_ws(line, eq + 1);
    let value_end = line[..semi].trim_end().len();
    if value_end <= value_start {
        return None;
    }
    Some((name.to_string(), value_start..value_end))
}

fn skip_ws(line: &str, mut pos: usize) -> usize {
    let bytes = line.as_bytes();
    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
        pos += 1;
    }
    pos
}

/// End of the identifier starting at `pos`, or `None` if there is none.
fn ident_end(line: &str, pos: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    if pos >= bytes.len() || !(bytes[pos].is_ascii_alphabetic() || bytes[pos] == b'_') {
        return None;
    }
    let mut end = pos + 1;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_with_value() {
        let occ = scan_line(3, "#define CLK_DIV 0x38").unwrap();
        assert_eq!(occ.name, "CLK_DIV");
        assert_eq!(occ.value, "0x38");
        assert_eq!(occ.line_index, 3);
    }

    #[test]
    fn test_define_without_value() {
        let occ = scan_line(0, "#define FEATURE_EN").unwrap();
        assert_eq!(occ.name, "FEATURE_EN");
        assert_eq!(occ.value, "1");
    }

    #[test]
    fn test_define_indented_and_spaced() {
        let occ = scan_line(0, "  #  define STACK_SIZE (2U)").unwrap();
        assert_eq!(occ.name, "STACK_SIZE");
        assert_eq!(occ.value, "(2U)");
    }

    #[test]
    fn test_assignment() {
        let occ = scan_line(0, "uint32_t clock_hz = 48000000;").unwrap();
        assert_eq!(occ.name, "clock_hz");
        assert_eq!(occ.value, "48000000");
    }

    #[test]
    fn test_assignment_requires_terminator() {
        assert_eq!(scan_line(0, "clock_hz = 48000000"), None);
    }

    #[test]
    fn test_comparison_is_not_assignment() {
        assert_eq!(scan_line(0, "a == b;"), None);
        assert_eq!(scan_line(0, "x += 1;"), None);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        assert_eq!(scan_line(0, "#definebroken 1"), None);
        assert_eq!(scan_line(0, "#define 123 4"), None);
        assert_eq!(scan_line(0, "typedef int foo;"), None);
        assert_eq!(scan_line(0, ""), None);
    }

    #[test]
    fn test_value_span_round_trip() {
        let line = "#define CLK_DIV 0x38";
        let (name, span) = value_span(line).unwrap();
        assert_eq!(name, "CLK_DIV");
        assert_eq!(&line[span], "0x38");

        let line = "uint32_t clock_hz = 48000000 ;";
        let (_, span) = value_span(line).unwrap();
        assert_eq!(&line[span], "48000000");
    }
}
