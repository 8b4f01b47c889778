//! Wizard annotation parsing.
//!
//! [`WizardParser`] is the entry point: configured with the marker
//! substrings that delimit the wizard region, it turns a line array into a
//! [`ConfigTree`] in one pass: boundary detection, tree building, value
//! resolution and display formatting. Parsing is a pure function of the
//! input lines; no state survives between invocations.

use serde::Serialize;

use crate::data::ConfigItem;

/// Wizard region boundary detection.
pub mod bounds;

/// Tree builder state machine.
pub(crate) mod builder;

/// Macro and assignment occurrence scanner.
pub(crate) mod scan;

/// Annotation tag grammar.
pub mod tag;

pub use bounds::Region;
pub use scan::MacroOccurrence;

/// Conventional CMSIS start marker.
pub const DEFAULT_START_MARKER: &str = "<<< Use Configuration Wizard in Context Menu >>>";

/// Conventional CMSIS end marker.
pub const DEFAULT_END_MARKER: &str = "<<< end of configuration section >>>";

/// Annotation parser configured with region marker substrings.
///
/// # Example
///
/// ```rust
/// use cfgwizard::WizardParser;
///
/// let header = "\
/// // <<< Use Configuration Wizard in Context Menu >>>
/// // <q> Enable Feature
/// #define FEATURE_EN 1
/// // <<< end of configuration section >>>";
///
/// let tree = WizardParser::new().parse_str(header).unwrap();
/// assert_eq!(tree.items[0].raw_value, "1");
/// ```
#[derive(Debug, Clone)]
pub struct WizardParser {
    start_marker: String,
    end_marker: Option<String>,
}

impl Default for WizardParser {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardParser {
    /// Parser with the conventional CMSIS markers.
    pub fn new() -> Self {
        WizardParser {
            start_marker: DEFAULT_START_MARKER.to_string(),
            end_marker: Some(DEFAULT_END_MARKER.to_string()),
        }
    }

    /// Parser with custom markers.
    ///
    /// Without an end marker the region always extends to the end of the
    /// file.
    pub fn with_markers(start: impl Into<String>, end: Option<String>) -> Self {
        WizardParser {
            start_marker: start.into(),
            end_marker: end,
        }
    }

    /// Parse a line array (newline-stripped, right-trimmed lines).
    ///
    /// Returns `None` when the file carries no wizard section, which is a
    /// normal outcome. Individual items that fail to resolve are
    /// returned as error-styled notices; no failure aborts the parse.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> Option<ConfigTree> {
        let refs: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        let region = bounds::find_region(&refs, &self.start_marker, self.end_marker.as_deref())?;
        let mut result = builder::build(&refs, region.content());
        crate::resolve::resolve(&mut result.arena, &result.occurrences);
        Some(ConfigTree {
            region,
            items: result.arena.into_items(),
        })
    }

    /// Parse raw file text, splitting and right-trimming lines.
    pub fn parse_str(&self, text: &str) -> Option<ConfigTree> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        self.parse(&lines)
    }
}

/// Finished configuration tree handed to the caller.
///
/// The caller owns the tree and may edit `raw_value` fields before handing
/// it to the [`rewrite`](crate::rewrite) pass.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigTree {
    /// The wizard region the tree was parsed from.
    pub region: Region,
    /// Root items in source order.
    pub items: Vec<ConfigItem>,
}

impl ConfigTree {
    /// Depth-first traversal over all items.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a ConfigItem, usize)) {
        for item in &self.items {
            item.walk(f);
        }
    }

    /// All items, depth-first.
    pub fn flatten(&self) -> Vec<&ConfigItem> {
        let mut out = Vec::new();
        self.walk(&mut |item, _| out.push(item));
        out
    }

    /// First item with the given name, depth-first.
    pub fn get(&self, name: &str) -> Option<&ConfigItem> {
        self.flatten().into_iter().find(|item| item.name == name)
    }

    /// Serialize the tree to a JSON value.
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("tree serialization cannot fail")
    }
}
