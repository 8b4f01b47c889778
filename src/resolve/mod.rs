//! Value resolution.
//!
//! Walks the built tree breadth-first, matches each value-bearing item to
//! a macro/assignment occurrence (by declared identifier, or by position
//! after the annotation line with an optional skip count) and derives its
//! display representation.
//!
//! Resolution never fails the parse: an item with no matching occurrence,
//! or whose value cannot be formatted, is demoted to a notice carrying
//! diagnostic detail and an error style marker, and its children are still
//! processed.

use std::collections::VecDeque;

use crate::data::{ConfigItem, ItemKind, Location};
use crate::parse::builder::Arena;
use crate::parse::scan::MacroOccurrence;

/// Display value derivation.
pub mod display;

pub use display::{STRING_PLACEHOLDER, ValueError};

/// Resolve every item in the arena against the occurrence list.
pub(crate) fn resolve(arena: &mut Arena, occurrences: &[MacroOccurrence]) {
    let mut queue: VecDeque<usize> = arena.roots().to_vec().into();
    while let Some(id) = queue.pop_front() {
        // children are processed regardless of this item's outcome
        queue.extend(arena.children(id).iter().copied());
        resolve_item(arena.item_mut(id), occurrences);
    }
}

fn resolve_item(item: &mut ConfigItem, occurrences: &[MacroOccurrence]) {
    match item.kind {
        ItemKind::Group => return,
        ItemKind::Code { .. } => {
            // fully resolved during building; a block that captured nothing
            // has no location and surfaces like any other unmatched item
            if item.location.is_none() {
                warn!("code block `{}` captured no lines", item.name);
                item.demote_to_notice("no source lines captured");
            }
            return;
        }
        ItemKind::Notice => {
            item.location = Some(Location::line(item.source_line));
            return;
        }
        _ => {}
    }

    let Some(occurrence) = find_occurrence(item, occurrences) else {
        warn!(
            "no definition found for `{}` (line {})",
            item.name, item.source_line
        );
        item.demote_to_notice("no matching definition found");
        return;
    };

    item.raw_value = occurrence.value.clone();
    item.location = Some(Location::line(occurrence.line_index));
    trace!(
        "`{}` resolved from line {}: `{}`",
        item.name, occurrence.line_index, item.raw_value
    );

    if let Err(err) = display::format_item(item) {
        warn!("`{}`: {}", item.name, err);
        item.demote_to_notice(&err.to_string());
    }
}

/// Find the occurrence supplying this item's value.
///
/// An explicit identifier matches by name irrespective of position. Without
/// one, the first occurrence strictly after the annotation line is taken,
/// advanced by the item's skip count so one annotation can own the Nth
/// following macro.
fn find_occurrence<'a>(
    item: &ConfigItem,
    occurrences: &'a [MacroOccurrence],
) -> Option<&'a MacroOccurrence> {
    if let Some(identifier) = &item.identifier {
        return occurrences.iter().find(|o| &o.name == identifier);
    }
    let first = occurrences
        .iter()
        .position(|o| o.line_index > item.source_line)?;
    occurrences.get(first + item.skip_count.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ItemStyle;
    use crate::parse::builder::build;

    fn resolve_lines(lines: &[&str]) -> Vec<ConfigItem> {
        let mut result = build(lines, 0..lines.len());
        resolve(&mut result.arena, &result.occurrences);
        result.arena.into_items()
    }

    #[test]
    fn test_positional_match() {
        let items = resolve_lines(&["// <q> Enable Feature", "#define FEATURE_EN 1"]);
        assert_eq!(items[0].raw_value, "1");
        assert_eq!(items[0].display_value.as_deref(), Some("1"));
        assert_eq!(items[0].location, Some(Location::line(1)));
    }

    #[test]
    fn test_skip_count_advances_past_macros() {
        let items = resolve_lines(&[
            "// <o1> Second Value",
            "#define FIRST 10",
            "#define SECOND 20",
        ]);
        assert_eq!(items[0].raw_value, "20");
    }

    #[test]
    fn test_identifier_match_ignores_position() {
        let items = resolve_lines(&[
            "#define TARGET 7",
            "// <o TARGET> Bound Option",
            "#define OTHER 9",
        ]);
        assert_eq!(items[0].raw_value, "7");
        assert_eq!(items[0].location, Some(Location::line(0)));
    }

    #[test]
    fn test_unmatched_item_demoted() {
        let items = resolve_lines(&["// <o> Orphan Option"]);
        assert!(matches!(items[0].kind, ItemKind::Notice));
        assert_eq!(items[0].style, ItemStyle::Error);
        assert!(!items[0].detail.is_empty());
        assert_eq!(items[0].location, Some(Location::line(0)));
    }

    #[test]
    fn test_value_error_demotes_too() {
        let items = resolve_lines(&["// <o> Needs Number", "#define TEXTUAL abc"]);
        assert!(matches!(items[0].kind, ItemKind::Notice));
        assert_eq!(items[0].style, ItemStyle::Error);
    }

    #[test]
    fn test_children_of_failed_item_still_resolve() {
        let items = resolve_lines(&[
            "// <e MISSING_MACRO> Broken Section",
            "// <q> Child Flag",
            "#define CHILD_EN 1",
            "// </e>",
        ]);
        assert!(matches!(items[0].kind, ItemKind::Notice));
        assert_eq!(items[0].children[0].raw_value, "1");
    }

    #[test]
    fn test_notice_location_is_own_line() {
        let items = resolve_lines(&["// <n> Read the errata"]);
        assert_eq!(items[0].location, Some(Location::line(0)));
        assert_eq!(items[0].style, ItemStyle::Normal);
    }

    #[test]
    fn test_section_value_resolves() {
        let items = resolve_lines(&[
            "// <e.1> Peripheral - enables the block",
            "#define PERIPH_CTRL 0x02",
            "// </e>",
        ]);
        assert_eq!(items[0].raw_value, "0x02");
        assert_eq!(items[0].display_value.as_deref(), Some("1"));
    }
}
