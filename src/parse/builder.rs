//! Tree builder state machine.
//!
//! Consumes the wizard region line by line, producing an arena of items and,
//! in parallel, the ordered list of macro/assignment occurrences found on
//! non-annotation lines.
//!
//! The open-scope stack and the "last element" reference are indices into
//! the arena; the finished tree owns nodes by parent→children containment
//! and is materialized by [`Arena::into_items`].

use std::ops::Range;

use crate::data::{BitField, ConfigItem, ItemKind, Location};

use super::scan::{self, MacroOccurrence};
use super::tag::{COMMENT, Tag, parse_tag};

/// Arena of items under construction.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

#[derive(Debug)]
struct Node {
    item: ConfigItem,
    children: Vec<usize>,
}

impl Arena {
    fn push(&mut self, parent: Option<usize>, item: ConfigItem) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            item,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children(&self, id: usize) -> &[usize] {
        &self.nodes[id].children
    }

    pub fn item(&self, id: usize) -> &ConfigItem {
        &self.nodes[id].item
    }

    pub fn item_mut(&mut self, id: usize) -> &mut ConfigItem {
        &mut self.nodes[id].item
    }

    /// Materialize the ownership tree.
    ///
    /// Children always carry a larger index than their parent, so walking
    /// the arena backwards moves every node into its parent before the
    /// parent itself is moved.
    pub fn into_items(self) -> Vec<ConfigItem> {
        let mut slots: Vec<Option<ConfigItem>> = Vec::with_capacity(self.nodes.len());
        let mut child_lists: Vec<Vec<usize>> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes {
            slots.push(Some(node.item));
            child_lists.push(node.children);
        }
        for id in (0..slots.len()).rev() {
            let children: Vec<ConfigItem> = child_lists[id]
                .iter()
                .map(|&c| slots[c].take().expect("child moved twice"))
                .collect();
            if let Some(item) = slots[id].as_mut() {
                item.children = children;
            }
        }
        self.roots
            .iter()
            .map(|&r| slots[r].take().expect("root moved twice"))
            .collect()
    }
}

/// Output of the build pass.
pub(crate) struct BuildResult {
    pub arena: Arena,
    pub occurrences: Vec<MacroOccurrence>,
}

/// Run the state machine over the region's content lines.
pub(crate) fn build(lines: &[&str], content: Range<usize>) -> BuildResult {
    let mut builder = Builder {
        arena: Arena::default(),
        scope: Vec::new(),
        last: None,
        code_lines: 0,
        occurrences: Vec::new(),
    };
    for index in content {
        builder.feed(index, lines[index]);
    }
    trace!(
        "built {} items, {} occurrences",
        builder.arena.nodes.len(),
        builder.occurrences.len()
    );
    BuildResult {
        arena: builder.arena,
        occurrences: builder.occurrences,
    }
}

struct Builder {
    arena: Arena,
    /// Open group/section/code scopes, innermost last.
    scope: Vec<usize>,
    /// Most recently created item.
    last: Option<usize>,
    /// Lines consumed inside the open code capture region.
    code_lines: usize,
    occurrences: Vec<MacroOccurrence>,
}

impl Builder {
    fn feed(&mut self, index: usize, line: &str) {
        let tag = parse_tag(line);

        // 1. closing tag of the innermost open scope
        if let (Some(&top), Some(t)) = (self.scope.last(), tag.as_ref())
            && scope_closes(&self.arena.item(top).kind, t)
        {
            self.scope.pop();
            self.last = None;
            return;
        }

        // 2. a new group opens regardless of capture state
        if let Some(Tag::GroupOpen { name }) = &tag {
            let id = self.insert(ConfigItem::new(ItemKind::Group, name.clone(), index));
            self.scope.push(id);
            return;
        }

        // 3./5. capture lines into the open code item
        if self.capturing() {
            self.capture(index, line);
            self.code_lines += 1;
            return;
        }

        // 4. any other annotation constructs or mutates an item
        if let Some(t) = tag {
            self.apply(t, index);
            self.code_lines = 0;
            return;
        }

        // 6. plain comments are ignored, everything else may be a macro
        if line.trim_start().starts_with(COMMENT) {
            return;
        }
        if let Some(occ) = scan::scan_line(index, line) {
            trace!("occurrence `{}` = `{}` at line {}", occ.name, occ.value, index);
            self.occurrences.push(occ);
        }
    }

    /// Whether the current line falls inside an active code capture region.
    ///
    /// True only while the last created item is a code block and, if it
    /// declared a skip count, fewer lines than that count were captured.
    fn capturing(&self) -> bool {
        let Some(last) = self.last else {
            return false;
        };
        let item = self.arena.item(last);
        if !matches!(item.kind, ItemKind::Code { .. }) {
            return false;
        }
        match item.skip_count {
            Some(limit) => self.code_lines < limit,
            None => true,
        }
    }

    fn capture(&mut self, index: usize, line: &str) {
        let item = self.arena.item_mut(self.last.expect("capture without code item"));
        match &mut item.location {
            Some(location) => location.end = Some(index),
            None => {
                item.location = Some(Location {
                    start: index,
                    end: Some(index),
                })
            }
        }
        // a commented line anywhere in the capture marks the block disabled
        if line.trim_start().starts_with(COMMENT) {
            item.raw_value = "!".to_string();
        }
    }

    fn insert(&mut self, item: ConfigItem) -> usize {
        let id = self.arena.push(self.scope.last().copied(), item);
        self.last = Some(id);
        self.code_lines = 0;
        id
    }

    fn apply(&mut self, tag: Tag, index: usize) {
        match tag {
            Tag::GroupOpen { name } => {
                // normally handled before the capture check
                let id = self.insert(ConfigItem::new(ItemKind::Group, name, index));
                self.scope.push(id);
            }
            Tag::SectionOpen {
                skip,
                bit,
                identifier,
                name,
                description,
            } => {
                // a section bit-field is always a single bit
                let kind = ItemKind::Section {
                    bit_field: bit.map(|b| BitField {
                        start: b,
                        end: Some(b),
                    }),
                };
                let mut item = ConfigItem::new(kind, name, index);
                item.description = description;
                item.identifier = identifier;
                item.skip_count = skip;
                let id = self.insert(item);
                self.scope.push(id);
            }
            Tag::CodeOpen {
                skip,
                hidden,
                name,
                description,
            } => {
                let mut item = ConfigItem::new(ItemKind::Code { hidden }, name, index);
                item.description = description;
                item.skip_count = skip;
                let id = self.insert(item);
                self.scope.push(id);
            }
            Tag::BoolOpen {
                skip,
                identifier,
                name,
                description,
            } => {
                let mut item = ConfigItem::new(ItemKind::Bool, name, index);
                item.description = description;
                item.identifier = identifier;
                item.skip_count = skip;
                self.insert(item);
            }
            Tag::OptionOpen {
                skip,
                identifier,
                name,
                spec,
            } => {
                let mut item = ConfigItem::new(ItemKind::Option(spec), name, index);
                item.identifier = identifier;
                item.skip_count = skip;
                self.insert(item);
            }
            Tag::TextOpen {
                skip,
                max_length,
                identifier,
                name,
                description,
            } => {
                let mut item = ConfigItem::new(ItemKind::Text { max_length }, name, index);
                item.description = description;
                item.identifier = identifier;
                item.skip_count = skip;
                self.insert(item);
            }
            Tag::NoticeOpen { name } => {
                self.insert(ConfigItem::new(ItemKind::Notice, name, index));
            }
            Tag::Tooltip(text) => {
                if let Some(last) = self.last {
                    self.arena.item_mut(last).detail.push(text);
                }
            }
            Tag::DefaultValue(value) => {
                if let Some(last) = self.last {
                    self.arena.item_mut(last).default_value = Some(value);
                }
            }
            Tag::Choices(choices) => {
                // choice lines only apply to a preceding option
                if let Some(last) = self.last
                    && let ItemKind::Option(spec) = &mut self.arena.item_mut(last).kind
                {
                    spec.choices.extend(choices);
                }
            }
            // stray closing tags match no open scope and are dropped
            Tag::GroupClose | Tag::SectionClose | Tag::CodeClose => {}
        }
    }
}

fn scope_closes(kind: &ItemKind, tag: &Tag) -> bool {
    matches!(
        (kind, tag),
        (ItemKind::Group, Tag::GroupClose)
            | (ItemKind::Section { .. }, Tag::SectionClose)
            | (ItemKind::Code { .. }, Tag::CodeClose)
    )
}
