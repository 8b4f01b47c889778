use serde::Serialize;

/// Source span that, when rewritten, reproduces an item's value.
///
/// `start` and `end` are indices into the line array handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    /// First line of the span.
    pub start: usize,
    /// Last line of the span (inclusive); `None` for single-line spans.
    pub end: Option<usize>,
}

impl Location {
    /// Single-line location.
    pub fn line(index: usize) -> Self {
        Location {
            start: index,
            end: None,
        }
    }

    /// Last line of the span, falling back to `start`.
    pub fn last(&self) -> usize {
        self.end.unwrap_or(self.start)
    }
}

/// Inclusive bit range within a resolved numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitField {
    /// First bit of the field.
    pub start: u32,
    /// Last bit of the field (inclusive); `None` means a single bit.
    pub end: Option<u32>,
}

impl BitField {
    /// Width of the field in bits.
    pub fn width(&self) -> u32 {
        match self.end {
            Some(end) if end > self.start => end - self.start + 1,
            _ => 1,
        }
    }

    /// Extract the field from `value`: shift right by `start`, mask to width.
    pub fn extract(&self, value: u64) -> u64 {
        let shifted = value.checked_shr(self.start).unwrap_or(0);
        let width = self.width();
        if width >= 64 {
            shifted
        } else {
            shifted & ((1u64 << width) - 1)
        }
    }
}

/// Numeric range constraint declared by a `<LO-HI[:STEP]>` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    /// Lower bound.
    pub start: f64,
    /// Upper bound.
    pub end: f64,
    /// Optional step between accepted values.
    pub step: Option<f64>,
}

/// One enumerated choice declared by `<VALUE=> DESCRIPTION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumChoice {
    /// Stored value the choice stands for.
    pub value: String,
    /// Human-readable label.
    pub description: String,
}

/// Arithmetic operator of a display transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransformOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl TransformOp {
    /// Parse the operator character of a `<#op VAL>` suffix.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(TransformOp::Add),
            '-' => Some(TransformOp::Sub),
            '*' => Some(TransformOp::Mul),
            '/' => Some(TransformOp::Div),
            _ => None,
        }
    }

    /// Apply the algebraic inverse of the operator.
    ///
    /// The declared operator reconstructs the stored value from the displayed
    /// one, so deriving the displayed value applies the inverse.
    pub fn apply_inverse(&self, value: f64, operand: f64) -> f64 {
        match self {
            TransformOp::Add => value - operand,
            TransformOp::Sub => value + operand,
            TransformOp::Mul => value / operand,
            TransformOp::Div => value * operand,
        }
    }
}

/// Arithmetic relation between the value displayed to a user and the value
/// actually stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayTransform {
    /// Declared operator.
    pub operator: TransformOp,
    /// Declared operand.
    pub operand: f64,
}

/// Numeric rendering base selected by a `<f.x>` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumericBase {
    /// `<f.d>`
    Decimal,
    /// `<f.h>`
    Hex,
    /// `<f.o>`
    Octal,
    /// `<f.b>`
    Binary,
}

/// UI style marker attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ItemStyle {
    /// No special styling.
    #[default]
    Normal,
    /// The item failed to resolve and carries diagnostic detail.
    Error,
}

/// Sub-properties of an `option` item.
///
/// Inline enumerated choices and the range/transform/base sub-properties are
/// mutually exclusive on one annotation line; choices may also accumulate
/// from following `<VALUE=>` lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionSpec {
    /// Bit range within the resolved value exposed as the option's value.
    pub bit_field: Option<BitField>,
    /// Accepted numeric range.
    pub range: Option<NumericRange>,
    /// Enumerated choices.
    pub choices: Vec<EnumChoice>,
    /// Display transform.
    pub transform: Option<DisplayTransform>,
    /// Declared rendering base.
    pub base: Option<NumericBase>,
}

/// Item kind with kind-specific payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ItemKind {
    /// `<h>` heading; structural only, carries no value.
    Group,
    /// `<e>` enable section; its value toggles the whole subtree.
    ///
    /// A declared bit-field is forced to a single bit.
    Section {
        /// Single-bit field within the resolved value.
        bit_field: Option<BitField>,
    },
    /// `<c>` code region toggled between commented-out and active.
    Code {
        /// `<!c>` marks the block as hidden/inverted.
        hidden: bool,
    },
    /// `<q>` checkbox bound to a numeric macro.
    Bool,
    /// `<o>` numeric or enumerated option.
    Option(OptionSpec),
    /// `<s>` quoted string value.
    Text {
        /// Maximum accepted string length.
        max_length: Option<usize>,
    },
    /// `<n>` display note without an associated value.
    ///
    /// Items that fail to resolve are demoted to this kind.
    Notice,
}

impl ItemKind {
    /// Whether the kind binds to a macro/assignment occurrence.
    pub fn carries_value(&self) -> bool {
        matches!(
            self,
            ItemKind::Section { .. } | ItemKind::Bool | ItemKind::Option(_) | ItemKind::Text { .. }
        )
    }
}

/// One node of the configuration tree.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigItem {
    /// Kind and kind-specific payload.
    pub kind: ItemKind,
    /// Display name.
    pub name: String,
    /// Short description following the name on the annotation line.
    pub description: String,
    /// Tooltip lines accumulated from `<i>` annotations.
    pub detail: Vec<String>,
    /// Source span that reproduces this item's value when rewritten.
    pub location: Option<Location>,
    /// Line index where the annotation began.
    pub source_line: usize,
    /// Explicit macro/variable name binding, if the tag declared one.
    pub identifier: Option<String>,
    /// Canonical value string to be written back to the file.
    pub raw_value: String,
    /// Human-readable representation of the resolved value.
    pub display_value: Option<String>,
    /// `raw_value` with the quoted text replaced by a placeholder
    /// (string items only).
    pub display_format: Option<String>,
    /// Default value declared by a `<d>` annotation.
    pub default_value: Option<String>,
    /// Occurrences (or capture lines, for code items) to skip during
    /// positional matching.
    pub skip_count: Option<usize>,
    /// UI style marker.
    pub style: ItemStyle,
    /// Child items in source order.
    pub children: Vec<ConfigItem>,
}

impl ConfigItem {
    /// New item with empty value state.
    pub fn new(kind: ItemKind, name: impl Into<String>, source_line: usize) -> Self {
        ConfigItem {
            kind,
            name: name.into(),
            description: String::new(),
            detail: Vec::new(),
            location: None,
            source_line,
            identifier: None,
            raw_value: String::new(),
            display_value: None,
            display_format: None,
            default_value: None,
            skip_count: None,
            style: ItemStyle::default(),
            children: Vec::new(),
        }
    }

    /// Option sub-properties, if this is an option item.
    pub fn option_spec(&self) -> Option<&OptionSpec> {
        match &self.kind {
            ItemKind::Option(spec) => Some(spec),
            _ => None,
        }
    }

    /// Demote the item to a notice carrying diagnostic text.
    ///
    /// This is how resolution failures surface: the item keeps its place in
    /// the tree, its location points at its own annotation line, and the
    /// diagnostic is appended to the name and detail list.
    pub fn demote_to_notice(&mut self, diagnostic: &str) {
        self.kind = ItemKind::Notice;
        self.location = Some(Location::line(self.source_line));
        self.name = format!("{} ({})", self.name, diagnostic);
        self.detail.push(diagnostic.to_string());
        self.style = ItemStyle::Error;
    }

    /// Depth-first traversal over this item and its descendants.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a ConfigItem, usize)) {
        fn go<'a>(item: &'a ConfigItem, depth: usize, f: &mut impl FnMut(&'a ConfigItem, usize)) {
            f(item, depth);
            for child in &item.children {
                go(child, depth + 1, f);
            }
        }
        go(self, 0, f);
    }
}
