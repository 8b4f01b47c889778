//! Annotation tag grammar.
//!
//! Every annotation line has the shape `// <tag-specific-syntax>`. This
//! module classifies one line into a [`Tag`], including the suffix elements
//! that may follow the tag letter (skip counts, bit ranges, identifiers) and
//! the inline sub-properties an option line may carry after its name.
//!
//! The tokenizer is hand-written over `&str`; the surface syntax is small
//! enough that a pattern-matching dependency is not worth carrying.

use crate::data::{
    BitField, DisplayTransform, EnumChoice, NumericBase, NumericRange, OptionSpec, TransformOp,
};

/// Line-comment marker that introduces every annotation line.
pub const COMMENT: &str = "//";

/// One classified annotation line.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// `<h> NAME`
    GroupOpen { name: String },
    /// `</h>`
    GroupClose,
    /// `<e[skip][.bit] [identifier]> NAME [ - description]`
    SectionOpen {
        skip: Option<usize>,
        bit: Option<u32>,
        identifier: Option<String>,
        name: String,
        description: String,
    },
    /// `</e>`
    SectionClose,
    /// `<i> TEXT`, appended to the previous item's detail list.
    Tooltip(String),
    /// `<d> VALUE`, sets the previous item's default.
    DefaultValue(String),
    /// `<c[skip]> NAME [ - description]`, or `<!c...>` for a hidden block.
    CodeOpen {
        skip: Option<usize>,
        hidden: bool,
        name: String,
        description: String,
    },
    /// `</c>`
    CodeClose,
    /// `<q[skip] [identifier]> NAME [ - description]`
    BoolOpen {
        skip: Option<usize>,
        identifier: Option<String>,
        name: String,
        description: String,
    },
    /// `<o[skip][.bitStart[..bitEnd]] [identifier]> NAME [suffix]`
    OptionOpen {
        skip: Option<usize>,
        identifier: Option<String>,
        name: String,
        spec: OptionSpec,
    },
    /// `<s[skip][.maxLen] [identifier]> NAME [ - description]`
    TextOpen {
        skip: Option<usize>,
        max_length: Option<usize>,
        identifier: Option<String>,
        name: String,
        description: String,
    },
    /// `<CHOICE=> DESCRIPTION`, appended to the previous option's choices.
    Choices(Vec<EnumChoice>),
    /// `<n> NAME`
    NoticeOpen { name: String },
}

/// Classify one line, or `None` if it is not an annotation line.
pub fn parse_tag(line: &str) -> Option<Tag> {
    let (head, tail) = bracket(line)?;
    match head {
        "/h" => return Some(Tag::GroupClose),
        "/e" => return Some(Tag::SectionClose),
        "/c" => return Some(Tag::CodeClose),
        _ => {}
    }

    if head.ends_with('=') {
        // enum-choice line; the tail may chain further `<v=>` groups
        let after_comment = line.trim_start().strip_prefix(COMMENT)?.trim_start();
        let groups = scan_suffix_groups(after_comment);
        if groups.choices.is_empty() {
            return None;
        }
        return Some(Tag::Choices(groups.choices));
    }

    let (letter, hidden, affix) = if let Some(rest) = head.strip_prefix("!c") {
        ('c', true, rest)
    } else {
        let mut chars = head.chars();
        let c = chars.next()?;
        (c, false, chars.as_str())
    };

    let affix = parse_affix(affix)?;
    match letter {
        'h' if affix.is_bare() => Some(Tag::GroupOpen {
            name: tail.trim().to_string(),
        }),
        'i' if affix.is_bare() => Some(Tag::Tooltip(tail.trim().to_string())),
        'd' if affix.is_bare() => Some(Tag::DefaultValue(tail.trim().to_string())),
        'n' if affix.is_bare() => Some(Tag::NoticeOpen {
            name: tail.trim().to_string(),
        }),
        'e' => {
            let (name, description) = split_description(tail);
            Some(Tag::SectionOpen {
                skip: affix.skip,
                bit: affix.dot.map(|(start, _)| start),
                identifier: affix.identifier,
                name,
                description,
            })
        }
        'c' if affix.dot.is_none() && affix.identifier.is_none() => {
            let (name, description) = split_description(tail);
            Some(Tag::CodeOpen {
                skip: affix.skip,
                hidden,
                name,
                description,
            })
        }
        'q' if affix.dot.is_none() => {
            let (name, description) = split_description(tail);
            Some(Tag::BoolOpen {
                skip: affix.skip,
                identifier: affix.identifier,
                name,
                description,
            })
        }
        'o' => {
            let bit_field = affix.dot.map(|(start, end)| BitField { start, end });
            let (name, suffix) = match tail.find('<') {
                Some(pos) => (tail[..pos].trim().to_string(), &tail[pos..]),
                None => (tail.trim().to_string(), ""),
            };
            let groups = scan_suffix_groups(suffix);
            let mut spec = OptionSpec {
                bit_field,
                ..OptionSpec::default()
            };
            // inline choices and sub-property tags are mutually exclusive;
            // choices win when both are present
            if groups.choices.is_empty() {
                spec.range = groups.range;
                spec.transform = groups.transform;
                spec.base = groups.base;
            } else {
                spec.choices = groups.choices;
            }
            Some(Tag::OptionOpen {
                skip: affix.skip,
                identifier: affix.identifier,
                name,
                spec,
            })
        }
        's' => {
            let (name, description) = split_description(tail);
            Some(Tag::TextOpen {
                skip: affix.skip,
                max_length: affix.dot.map(|(start, _)| start as usize),
                identifier: affix.identifier,
                name,
                description,
            })
        }
        _ => None,
    }
}

/// Text inside the first `<...>` pair and the remainder after `>`.
///
/// The line must be a `//` comment whose first non-blank character after the
/// marker is `<`.
fn bracket(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix(COMMENT)?;
    let rest = rest.trim_start().strip_prefix('<')?;
    let close = rest.find('>')?;
    Some((&rest[..close], &rest[close + 1..]))
}

/// Suffix elements following a tag letter inside the brackets.
#[derive(Debug, Default)]
struct TagAffix {
    skip: Option<usize>,
    dot: Option<(u32, Option<u32>)>,
    identifier: Option<String>,
}

impl TagAffix {
    fn is_bare(&self) -> bool {
        self.skip.is_none() && self.dot.is_none() && self.identifier.is_none()
    }
}

/// Parse `[digits][.digits[..digits]][ identifier]`, the text between a tag
/// letter and the closing `>`. Returns `None` on anything else, which makes
/// the whole line a non-tag comment.
fn parse_affix(s: &str) -> Option<TagAffix> {
    let mut affix = TagAffix::default();
    let mut rest = s;

    let digits = leading_digits(rest);
    if !digits.is_empty() {
        affix.skip = digits.parse().ok();
        rest = &rest[digits.len()..];
    }

    if let Some(after_dot) = rest.strip_prefix('.') {
        let digits = leading_digits(after_dot);
        if digits.is_empty() {
            return None;
        }
        let start: u32 = digits.parse().ok()?;
        rest = &after_dot[digits.len()..];
        let mut end = None;
        if let Some(after_range) = rest.strip_prefix("..") {
            let digits = leading_digits(after_range);
            if digits.is_empty() {
                return None;
            }
            end = Some(digits.parse().ok()?);
            rest = &after_range[digits.len()..];
        }
        affix.dot = Some((start, end));
    }

    if rest.is_empty() {
        return Some(affix);
    }
    // an identifier must be separated from the suffix digits by whitespace
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let ident = rest.trim();
    if !is_identifier(ident) {
        return None;
    }
    affix.identifier = Some(ident.to_string());
    Some(affix)
}

fn leading_digits(s: &str) -> &str {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    &s[..end]
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split `NAME [ - description]` on the first ` - ` separator.
fn split_description(tail: &str) -> (String, String) {
    match tail.find(" - ") {
        Some(pos) => (
            tail[..pos].trim().to_string(),
            tail[pos + 3..].trim().to_string(),
        ),
        None => (tail.trim().to_string(), String::new()),
    }
}

/// Sub-property groups scanned from an option suffix or a choice line.
#[derive(Debug, Default)]
struct SuffixGroups {
    choices: Vec<EnumChoice>,
    range: Option<NumericRange>,
    transform: Option<DisplayTransform>,
    base: Option<NumericBase>,
}

/// Scan `<...>` groups with their trailing text out of `s`.
///
/// `<v=> desc` groups collect enumerated choices; `<LO-HI[:STEP]>`,
/// `<#op VAL>` and `<f.x>` groups collect sub-properties. Unrecognized
/// groups are ignored.
fn scan_suffix_groups(s: &str) -> SuffixGroups {
    let mut groups = SuffixGroups::default();
    let mut rest = s;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            break;
        };
        let content = &after[..close];
        let tail = &after[close + 1..];
        let text_end = tail.find('<').unwrap_or(tail.len());
        let text = tail[..text_end].trim();

        if let Some(value) = content.strip_suffix('=') {
            groups.choices.push(EnumChoice {
                value: value.trim().to_string(),
                description: text.to_string(),
            });
        } else if let Some(body) = content.strip_prefix('#') {
            groups.transform = parse_transform(body);
        } else if let Some(body) = content.strip_prefix("f.") {
            groups.base = parse_base(body);
        } else if let Some(range) = parse_range(content) {
            groups.range = Some(range);
        }
        rest = tail;
    }
    groups
}

fn parse_transform(s: &str) -> Option<DisplayTransform> {
    let mut chars = s.chars();
    let operator = TransformOp::from_char(chars.next()?)?;
    let operand = parse_number_literal(chars.as_str().trim())?;
    Some(DisplayTransform { operator, operand })
}

fn parse_base(s: &str) -> Option<NumericBase> {
    match s.trim() {
        "d" => Some(NumericBase::Decimal),
        "h" => Some(NumericBase::Hex),
        "o" => Some(NumericBase::Octal),
        "b" => Some(NumericBase::Binary),
        _ => None,
    }
}

fn parse_range(s: &str) -> Option<NumericRange> {
    let (body, step) = match s.split_once(':') {
        Some((body, step)) => (body, Some(step)),
        None => (s, None),
    };
    let (lo, hi) = body.split_once('-')?;
    let step = match step {
        Some(step) => Some(parse_number_literal(step.trim())?),
        None => None,
    };
    Some(NumericRange {
        start: parse_number_literal(lo.trim())?,
        end: parse_number_literal(hi.trim())?,
        step,
    })
}

/// Parse a whole string as a `0x`-prefixed hex or decimal/float literal.
pub(crate) fn parse_number_literal(s: &str) -> Option<f64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_tags() {
        assert_eq!(
            parse_tag("// <h> Timer Configuration"),
            Some(Tag::GroupOpen {
                name: "Timer Configuration".to_string()
            })
        );
        assert_eq!(parse_tag("// </h>"), Some(Tag::GroupClose));
        // arbitrary words in brackets are not tags
        assert_eq!(parse_tag("// <hello>"), None);
    }

    #[test]
    fn test_section_tag() {
        let tag = parse_tag("//   <e1.4 UART_EN> UART - serial port").unwrap();
        assert_eq!(
            tag,
            Tag::SectionOpen {
                skip: Some(1),
                bit: Some(4),
                identifier: Some("UART_EN".to_string()),
                name: "UART".to_string(),
                description: "serial port".to_string(),
            }
        );
        assert_eq!(parse_tag("// </e>"), Some(Tag::SectionClose));
    }

    #[test]
    fn test_bool_tag() {
        let tag = parse_tag("// <q> Enable Feature").unwrap();
        assert_eq!(
            tag,
            Tag::BoolOpen {
                skip: None,
                identifier: None,
                name: "Enable Feature".to_string(),
                description: String::new(),
            }
        );
        // bools accept no dotted suffix
        assert_eq!(parse_tag("// <q.3> Broken"), None);
    }

    #[test]
    fn test_code_tags() {
        let tag = parse_tag("// <c3> Init Block - startup code").unwrap();
        assert_eq!(
            tag,
            Tag::CodeOpen {
                skip: Some(3),
                hidden: false,
                name: "Init Block".to_string(),
                description: "startup code".to_string(),
            }
        );
        let tag = parse_tag("// <!c> Hidden Block").unwrap();
        assert!(matches!(tag, Tag::CodeOpen { hidden: true, .. }));
        assert_eq!(parse_tag("// </c>"), Some(Tag::CodeClose));
    }

    #[test]
    fn test_option_bit_range() {
        let tag = parse_tag("// <o.3..5> Clock Div").unwrap();
        let Tag::OptionOpen { spec, name, .. } = tag else {
            panic!("expected option");
        };
        assert_eq!(name, "Clock Div");
        assert_eq!(
            spec.bit_field,
            Some(BitField {
                start: 3,
                end: Some(5)
            })
        );
    }

    #[test]
    fn test_option_inline_choices() {
        let tag = parse_tag("// <o> Mode <0=> Disabled <1=> Enabled").unwrap();
        let Tag::OptionOpen { spec, .. } = tag else {
            panic!("expected option");
        };
        assert_eq!(spec.choices.len(), 2);
        assert_eq!(spec.choices[0].value, "0");
        assert_eq!(spec.choices[0].description, "Disabled");
        assert_eq!(spec.choices[1].value, "1");
        assert_eq!(spec.choices[1].description, "Enabled");
    }

    #[test]
    fn test_option_sub_properties() {
        let tag = parse_tag("// <o> Timeout <10-1000:10> <#/8> <f.h>").unwrap();
        let Tag::OptionOpen { spec, .. } = tag else {
            panic!("expected option");
        };
        assert_eq!(
            spec.range,
            Some(NumericRange {
                start: 10.0,
                end: 1000.0,
                step: Some(10.0)
            })
        );
        assert_eq!(
            spec.transform,
            Some(DisplayTransform {
                operator: TransformOp::Div,
                operand: 8.0
            })
        );
        assert_eq!(spec.base, Some(NumericBase::Hex));
        assert!(spec.choices.is_empty());
    }

    #[test]
    fn test_option_choices_win_over_props() {
        let tag = parse_tag("// <o> Mixed <0=> Off <10-20>").unwrap();
        let Tag::OptionOpen { spec, .. } = tag else {
            panic!("expected option");
        };
        assert_eq!(spec.choices.len(), 1);
        assert_eq!(spec.range, None);
    }

    #[test]
    fn test_string_tag() {
        let tag = parse_tag("// <s.32 DEVICE_NAME> Device Name").unwrap();
        assert_eq!(
            tag,
            Tag::TextOpen {
                skip: None,
                max_length: Some(32),
                identifier: Some("DEVICE_NAME".to_string()),
                name: "Device Name".to_string(),
                description: String::new(),
            }
        );
    }

    #[test]
    fn test_choice_line() {
        let tag = parse_tag("//   <0x10=> Fast mode").unwrap();
        let Tag::Choices(choices) = tag else {
            panic!("expected choices");
        };
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].value, "0x10");
        assert_eq!(choices[0].description, "Fast mode");
    }

    #[test]
    fn test_tooltip_default_notice() {
        assert_eq!(
            parse_tag("// <i> Applies after reset"),
            Some(Tag::Tooltip("Applies after reset".to_string()))
        );
        assert_eq!(
            parse_tag("// <d> 0x20"),
            Some(Tag::DefaultValue("0x20".to_string()))
        );
        assert_eq!(
            parse_tag("// <n> See errata sheet"),
            Some(Tag::NoticeOpen {
                name: "See errata sheet".to_string()
            })
        );
    }

    #[test]
    fn test_non_tag_lines() {
        assert_eq!(parse_tag("#define FOO 1"), None);
        assert_eq!(parse_tag("// plain comment"), None);
        assert_eq!(parse_tag("// < >"), None);
        assert_eq!(parse_tag(""), None);
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(parse_number_literal("0x38"), Some(56.0));
        assert_eq!(parse_number_literal("0XFF"), Some(255.0));
        assert_eq!(parse_number_literal("1.5"), Some(1.5));
        assert_eq!(parse_number_literal("garbage"), None);
    }
}
