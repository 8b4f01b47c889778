//! Configuration tree data structures.
//!
//! This module provides the data model produced by the wizard parser:
//!
//! - [`item`] - Configuration items and their kind-specific payloads
//!
//! The tree is exclusively owned by parent→children containment; root items
//! are owned by the [`ConfigTree`](crate::parse::ConfigTree) returned to the
//! caller. Callers may edit `raw_value` fields and hand the tree to the
//! [`rewrite`](crate::rewrite) pass to write changes back into the source
//! text.

/// Configuration item representation.
pub mod item;

pub use item::{
    BitField, ConfigItem, DisplayTransform, EnumChoice, ItemKind, ItemStyle, Location, NumericBase,
    NumericRange, OptionSpec, TransformOp,
};
