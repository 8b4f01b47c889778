//! # cfgwizard
//!
//! A Rust library for parsing CMSIS Configuration Wizard annotations in
//! embedded C/C++ headers.
//!
//! Firmware headers often carry a wizard-annotated region: comment tags
//! such as `<h>`, `<q>` and `<o>` that declare an editable configuration
//! tree, each entry backed by the `#define` or assignment that follows it
//! in the file. `cfgwizard` extracts that tree, reconciles every item with
//! its real value, and can write edited values back into the original text
//! losslessly.
//!
//! ## Features
//!
//! - Full tag grammar: groups, enable sections, checkboxes, numeric and
//!   enumerated options, strings, notes, toggleable code regions
//! - Bit-field extraction, numeric range and base suffixes, inverse
//!   arithmetic display transforms
//! - Identifier-bound or positional macro matching with skip counts
//! - Localized error recovery: unresolved items become error-styled
//!   notices instead of failing the parse
//! - Lossless write-back of edited values and code-region toggles
//! - JSON export of the parsed tree (serde)
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgwizard::WizardParser;
//!
//! let header = "\
//! // <<< Use Configuration Wizard in Context Menu >>>
//! // <h> Clock
//! //   <o CLK_DIV> Divider <1-128>
//! #define CLK_DIV 8
//! // </h>
//! // <<< end of configuration section >>>";
//!
//! let tree = WizardParser::new().parse_str(header).unwrap();
//! let divider = tree.get("Divider").unwrap();
//! assert_eq!(divider.display_value.as_deref(), Some("8"));
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Configuration tree data structures
//! - [`parse`] - Boundary detection, tag grammar and tree building
//! - [`resolve`] - Value resolution and display formatting
//! - [`rewrite`] - Write-back of edited values into the source text

#[macro_use]
extern crate log;

/// Configuration tree data structures.
pub mod data;

/// Wizard annotation parsing.
pub mod parse;

/// Value resolution and display formatting.
pub mod resolve;

/// Write-back of edited values into the source text.
pub mod rewrite;

pub use data::{ConfigItem, ItemKind, ItemStyle};
pub use parse::{ConfigTree, DEFAULT_END_MARKER, DEFAULT_START_MARKER, WizardParser};
pub use resolve::ValueError;
