//! Concrete syntax tree produced by a parse.
//!
//! Nodes form an ordered N-ary tree through a first-child / next-sibling
//! representation: each node exclusively owns its first child and its next
//! sibling, and the children of a node are the chain starting at its first
//! child.
//!
//! A node's `kind` is the label of the rule that produced it and its `value`
//! is the exact slice of input that rule consumed.

use std::fmt;

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::stack::ensure_sufficient_stack;

// ============================================================================
// SPAN
// ============================================================================

/// Byte range `[start, end)` into the parsed input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "Invalid span: {{start: {start}, end: {end}}}");
        Self { start, end }
    }

    /// Zero-width span at `pos`.
    pub fn point(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ============================================================================
// SYNTAX TREE
// ============================================================================

/// A node of the concrete syntax tree.
///
/// # Examples
///
/// ```rust
/// use sprig::{Span, SyntaxTree};
/// let mut sum = SyntaxTree::new("sum", "1+2", Span::new(0, 3));
/// sum.insert_child(SyntaxTree::new("digit", "1", Span::new(0, 1)));
/// sum.insert_child(SyntaxTree::new("digit", "2", Span::new(2, 3)));
/// let kinds: Vec<_> = sum.children().map(|c| c.kind()).collect();
/// assert_eq!(kinds, ["digit", "digit"]);
/// ```
///
/// `Clone`, `PartialEq` and `Debug` cover a node and its descendants, not the
/// siblings that follow it.
pub struct SyntaxTree {
    kind: String,
    value: String,
    span: Span,
    child: Option<Box<SyntaxTree>>,
    sibling: Option<Box<SyntaxTree>>,
}

impl SyntaxTree {
    /// Creates a leaf node with no children and no siblings.
    pub fn new(kind: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            span,
            child: None,
            sibling: None,
        }
    }

    /// Creates a node whose children are `children`, in order.
    ///
    /// Any sibling links the children already carry are replaced.
    pub fn with_children(
        kind: impl Into<String>,
        value: impl Into<String>,
        span: Span,
        children: Vec<SyntaxTree>,
    ) -> Self {
        let mut node = Self::new(kind, value, span);
        node.child = link_siblings(children);
        node
    }

    /// The label of the rule that produced this node. Empty for transparent rules.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The exact input text this node consumed.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn first_child(&self) -> Option<&SyntaxTree> {
        self.child.as_deref()
    }

    pub fn next_sibling(&self) -> Option<&SyntaxTree> {
        self.sibling.as_deref()
    }

    /// Iterates over the direct children of this node, left to right.
    pub fn children(&self) -> Children<'_> {
        Children {
            next: self.first_child(),
        }
    }

    pub fn has_children(&self) -> bool {
        self.child.is_some()
    }

    /// Appends `child` (and any siblings it already carries) as the last
    /// child(ren) of this node.
    pub fn insert_child(&mut self, child: SyntaxTree) {
        let mut slot = &mut self.child;
        while let Some(node) = slot {
            slot = &mut node.sibling;
        }
        *slot = Some(Box::new(child));
    }

    /// Finds the first node labeled `kind`, searching depth-first from this node.
    pub fn find(&self, kind: &str) -> Option<&SyntaxTree> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.kind == kind {
                return Some(node);
            }
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Renders the subtree rooted here, one node per line, as `kind:"value"`
    /// with two spaces of indentation per level.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.walk(&mut |node, depth| {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format!("{}:\"{}\"\n", node.kind, node.value));
        });
        out
    }

    /// Visits this node and its descendants in pre-order, passing each node's depth.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a SyntaxTree, usize)) {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            visit(node, depth);
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

// The derived impls would recurse once per sibling, so siblings are walked
// in loops and only nesting depth recurses.

impl Clone for SyntaxTree {
    fn clone(&self) -> Self {
        let children = self
            .children()
            .map(|child| ensure_sufficient_stack(|| child.clone()))
            .collect();
        Self::with_children(self.kind.clone(), self.value.clone(), self.span, children)
    }
}

impl PartialEq for SyntaxTree {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.kind != b.kind || a.value != b.value || a.span != b.span {
                return false;
            }
            let (mut left, mut right) = (a.children(), b.children());
            loop {
                match (left.next(), right.next()) {
                    (Some(l), Some(r)) => pending.push((l, r)),
                    (None, None) => break,
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for SyntaxTree {}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| {
            f.debug_struct("SyntaxTree")
                .field("kind", &self.kind)
                .field("value", &self.value)
                .field("span", &self.span)
                .field("children", &DebugChildren(self))
                .finish()
        })
    }
}

struct DebugChildren<'a>(&'a SyntaxTree);

impl fmt::Debug for DebugChildren<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.children()).finish()
    }
}

/// Links `nodes` into a sibling chain and returns its head.
fn link_siblings(nodes: Vec<SyntaxTree>) -> Option<Box<SyntaxTree>> {
    let mut head = None;
    for mut node in nodes.into_iter().rev() {
        node.sibling = head;
        head = Some(Box::new(node));
    }
    head
}

/// Iterator over the direct children of a [`SyntaxTree`] node.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    next: Option<&'a SyntaxTree>,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a SyntaxTree;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next_sibling();
        Some(node)
    }
}

// Long sibling chains (e.g. thousands of repetitions) would overflow the
// stack under the default recursive drop, so unlink and drop in a loop.
impl Drop for SyntaxTree {
    fn drop(&mut self) {
        let mut pending: Vec<Box<SyntaxTree>> = Vec::new();
        pending.extend(self.child.take());
        pending.extend(self.sibling.take());
        while let Some(mut node) = pending.pop() {
            pending.extend(node.child.take());
            pending.extend(node.sibling.take());
        }
    }
}

impl Serialize for SyntaxTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children: Vec<&SyntaxTree> = self.children().collect();
        let mut st = serializer.serialize_struct("SyntaxTree", 4)?;
        st.serialize_field("type", &self.kind)?;
        st.serialize_field("value", &self.value)?;
        st.serialize_field("span", &self.span)?;
        st.serialize_field("children", &children)?;
        st.end()
    }
}
