//! Write-back pass.
//!
//! Re-applies a (possibly edited) tree to the original line array:
//!
//! - value-bearing items substitute their `raw_value` into the matched
//!   `#define`/assignment form at `location.start`;
//! - code items add or remove the leading comment marker on every line of
//!   their span, according to whether `raw_value` is `"!"` (disabled) or
//!   empty (enabled).
//!
//! Unchanged items reproduce their lines byte-for-byte, so a parse followed
//! by an edit-free rewrite returns the input text exactly.

use crate::data::{ConfigItem, ItemKind};
use crate::parse::tag::COMMENT;
use crate::parse::{ConfigTree, scan};

/// Apply the tree's values to `lines`, returning the rewritten text lines.
pub fn apply<S: AsRef<str>>(tree: &ConfigTree, lines: &[S]) -> Vec<String> {
    let mut out: Vec<String> = lines.iter().map(|l| l.as_ref().to_string()).collect();
    for item in &tree.items {
        apply_item(item, &mut out);
    }
    out
}

fn apply_item(item: &ConfigItem, out: &mut Vec<String>) {
    match &item.kind {
        ItemKind::Group | ItemKind::Notice => {}
        ItemKind::Code { .. } => {
            if let Some(location) = item.location {
                let disabled = item.raw_value == "!";
                let end = location.last().min(out.len() - 1);
                for line in &mut out[location.start..=end] {
                    toggle_comment(line, disabled);
                }
            }
        }
        _ => {
            if let Some(location) = item.location
                && let Some(line) = out.get_mut(location.start)
            {
                substitute_value(line, &item.raw_value);
            }
        }
    }
    for child in &item.children {
        apply_item(child, out);
    }
}

/// Substitute `raw` into the value span of a macro/assignment line.
fn substitute_value(line: &mut String, raw: &str) {
    let Some((name, span)) = scan::value_span(line) else {
        warn!("cannot rewrite line `{line}`: no macro or assignment form");
        return;
    };
    if span.is_empty() {
        // value-less define; "1" is its implied value already
        if raw != "1" {
            line.insert_str(span.start, &format!(" {raw}"));
        }
        return;
    }
    if &line[span.clone()] != raw {
        trace!("rewriting `{name}` value to `{raw}`");
        line.replace_range(span, raw);
    }
}

/// Comment or uncomment one line, preserving indentation.
fn toggle_comment(line: &mut String, disabled: bool) {
    let indent = line.len() - line.trim_start().len();
    let commented = line[indent..].starts_with(COMMENT);
    if disabled && !commented {
        line.insert_str(indent, "// ");
    } else if !disabled && commented {
        let mut end = indent + COMMENT.len();
        if line[end..].starts_with(' ') {
            end += 1;
        }
        line.replace_range(indent..end, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::WizardParser;

    const HEADER: &[&str] = &[
        "// <<< Use Configuration Wizard in Context Menu >>>",
        "// <q> Enable Feature",
        "#define FEATURE_EN 1",
        "// <c> Init Block",
        "init_a();",
        "init_b();",
        "// </c>",
        "// <<< end of configuration section >>>",
    ];

    #[test]
    fn test_no_edit_reproduces_input() {
        let tree = WizardParser::new().parse(HEADER).unwrap();
        let out = apply(&tree, HEADER);
        assert_eq!(out, HEADER);
    }

    #[test]
    fn test_edited_bool_rewrites_one_line() {
        let mut tree = WizardParser::new().parse(HEADER).unwrap();
        tree.items[0].raw_value = "0".to_string();
        let out = apply(&tree, HEADER);
        assert_eq!(out[2], "#define FEATURE_EN 0");
        for (index, line) in out.iter().enumerate() {
            if index != 2 {
                assert_eq!(line, HEADER[index]);
            }
        }
        // the edited text re-parses to the new value
        let reparsed = WizardParser::new().parse(&out).unwrap();
        assert_eq!(reparsed.items[0].raw_value, "0");
    }

    #[test]
    fn test_disabling_code_comments_span() {
        let mut tree = WizardParser::new().parse(HEADER).unwrap();
        tree.items[1].raw_value = "!".to_string();
        let out = apply(&tree, HEADER);
        assert_eq!(out[4], "// init_a();");
        assert_eq!(out[5], "// init_b();");

        let reparsed = WizardParser::new().parse(&out).unwrap();
        assert_eq!(reparsed.items[1].raw_value, "!");
    }

    #[test]
    fn test_enabling_code_uncomments_span() {
        let disabled: Vec<String> = {
            let mut tree = WizardParser::new().parse(HEADER).unwrap();
            tree.items[1].raw_value = "!".to_string();
            apply(&tree, HEADER)
        };
        let mut tree = WizardParser::new().parse(&disabled).unwrap();
        tree.items[1].raw_value = String::new();
        let out = apply(&tree, &disabled);
        assert_eq!(out, HEADER);
    }

    #[test]
    fn test_value_less_define_round_trip() {
        let lines = &[
            "// <<< Use Configuration Wizard in Context Menu >>>",
            "// <q> Bare Flag",
            "#define BARE_FLAG",
        ];
        let tree = WizardParser::new().parse(lines).unwrap();
        assert_eq!(tree.items[0].raw_value, "1");
        // the implied "1" must not be materialized on an edit-free rewrite
        assert_eq!(apply(&tree, lines), lines);

        let mut tree = WizardParser::new().parse(lines).unwrap();
        tree.items[0].raw_value = "0".to_string();
        let out = apply(&tree, lines);
        assert_eq!(out[2], "#define BARE_FLAG 0");
    }

    #[test]
    fn test_toggle_preserves_indentation() {
        let mut line = "    call();".to_string();
        toggle_comment(&mut line, true);
        assert_eq!(line, "    // call();");
        toggle_comment(&mut line, false);
        assert_eq!(line, "    call();");
    }
}
