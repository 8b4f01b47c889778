//! Display formatting for resolved values.
//!
//! Derives the human-readable `display_value` of an item from its resolved
//! `raw_value`: bit extraction, inverse arithmetic transforms and numeric
//! base rendering for flags and options, quoted-text extraction for strings.

use crate::data::{BitField, ConfigItem, ItemKind, NumericBase, OptionSpec};

/// Placeholder substituted for the quoted text in a string item's
/// `display_format`.
pub const STRING_PLACEHOLDER: &str = "{}";

/// A value error raised while deriving an item's display value.
///
/// The resolver catches this at the same item and demotes it to a notice;
/// no error escapes the top-level parse entry point.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// The resolved text holds no numeric token but the item kind needs one.
    #[error("expected a numeric value, got `{value}`")]
    NotNumeric {
        /// Offending raw value.
        value: String,
    },
    /// The resolved text matches none of the declared enumerated choices.
    #[error("`{value}` does not match any declared choice")]
    NoSuchChoice {
        /// Offending raw value.
        value: String,
    },
}

/// First numeric token found in a string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NumberToken {
    pub value: f64,
    pub hex: bool,
}

/// Scan for the first `0x`-prefixed hex or decimal/float token anywhere in
/// `s`, ignoring surrounding text.
pub(crate) fn first_number(s: &str) -> Option<NumberToken> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        if bytes[i] == b'0'
            && i + 2 < bytes.len()
            && (bytes[i + 1] | 0x20) == b'x'
            && bytes[i + 2].is_ascii_hexdigit()
        {
            let mut end = i + 2;
            while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
                end += 1;
            }
            let value = u64::from_str_radix(&s[i + 2..end], 16).ok()? as f64;
            return Some(NumberToken { value, hex: true });
        }
        let mut end = i + 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            end += 2;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        let value = s[i..end].parse::<f64>().ok()?;
        return Some(NumberToken { value, hex: false });
    }
    None
}

/// Compute `display_value` (and `display_format` for strings) for a
/// freshly resolved item.
pub(crate) fn format_item(item: &mut ConfigItem) -> Result<(), ValueError> {
    match item.kind.clone() {
        ItemKind::Section { bit_field } => format_flag(item, bit_field),
        ItemKind::Bool => format_flag(item, None),
        ItemKind::Option(spec) => format_option(item, &spec),
        ItemKind::Text { .. } => {
            format_text(item);
            Ok(())
        }
        ItemKind::Group | ItemKind::Code { .. } | ItemKind::Notice => Ok(()),
    }
}

fn format_flag(item: &mut ConfigItem, bit_field: Option<BitField>) -> Result<(), ValueError> {
    let token = first_number(&item.raw_value).ok_or_else(|| ValueError::NotNumeric {
        value: item.raw_value.clone(),
    })?;
    let value = match bit_field {
        Some(bf) => bf.extract(token.value as u64) as f64,
        None => token.value,
    };
    item.display_value = Some(fmt_plain(value));
    Ok(())
}

fn format_option(item: &mut ConfigItem, spec: &OptionSpec) -> Result<(), ValueError> {
    let raw = item.raw_value.clone();
    let Some(token) = first_number(&raw) else {
        // a non-numeric value is legal only on an identified option whose
        // value matches one of the declared choices
        if item.identifier.is_some() {
            if let Some(choice) = spec.choices.iter().find(|c| c.value == raw) {
                item.display_value = Some(choice.value.clone());
                return Ok(());
            }
            return Err(ValueError::NoSuchChoice { value: raw });
        }
        return Err(ValueError::NotNumeric { value: raw });
    };

    let hex = match spec.base {
        Some(NumericBase::Hex) => true,
        Some(_) => false,
        None => token.hex,
    };
    let (value, padded) = match spec.bit_field {
        Some(bf) => (bf.extract(token.value as u64) as f64, true),
        None => (token.value, false),
    };
    let mut display = render_numeric(value, hex, spec.base, padded);
    if let Some(transform) = spec.transform {
        let shown = transform.operator.apply_inverse(value, transform.operand);
        // non-finite transform results fall back to the untransformed value
        if shown.is_finite() {
            display = fmt_plain(shown);
        }
    }
    item.display_value = Some(display);
    Ok(())
}

/// Render a numeric option value in its base.
///
/// Hex results of a bit-field extraction are zero-padded to the next
/// power-of-two nibble count.
fn render_numeric(value: f64, hex: bool, base: Option<NumericBase>, padded: bool) -> String {
    if hex {
        let digits = format!("{:x}", value as u64);
        if padded {
            let width = digits.len().next_power_of_two();
            return format!("0x{digits:0>width$}");
        }
        return format!("0x{digits}");
    }
    match base {
        Some(NumericBase::Octal) => format!("0o{:o}", value as u64),
        Some(NumericBase::Binary) => format!("0b{:b}", value as u64),
        _ => fmt_plain(value),
    }
}

fn format_text(item: &mut ConfigItem) {
    let raw = item.raw_value.clone();
    if let Some(open) = raw.find('"')
        && let Some(offset) = raw[open + 1..].find('"')
    {
        let close = open + 1 + offset;
        item.display_value = Some(raw[open + 1..close].to_string());
        item.display_format = Some(format!(
            "{}{}{}",
            &raw[..=open],
            STRING_PLACEHOLDER,
            &raw[close..]
        ));
        return;
    }
    // no quoted text; show the raw value as-is
    item.display_value = Some(raw);
}

/// Decimal rendering: integral values print without a fraction.
fn fmt_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
