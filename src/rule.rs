//! Grammar productions and the `apply` envelope.
//!
//! A [`Rule`] is either a named reference, resolved against the
//! [`Grammar`](crate::Grammar) the first time it is applied, or a primitive
//! matcher built by the functions in [`combinators`](crate::combinators).
//!
//! Every rule, whatever its kind, is applied through [`Rule::apply`]. The
//! envelope there owns backtracking: it opens a tree node, dispatches, and on
//! failure throws the node away and rewinds the cursor. Combinators therefore
//! never roll anything back themselves.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::combinators::Matcher;
use crate::grammar::{Grammar, GrammarKey, RuleId};
use crate::stack::ensure_sufficient_stack;
use crate::ParseState;

/// A caller-supplied primitive: inspect the state, advance the cursor on
/// success, and report whether it matched.
pub type MatchFn = Arc<dyn Fn(&mut ParseState<'_>) -> bool + Send + Sync>;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A single grammar production.
///
/// Rules are plain values. Combinators capture copies of their arguments,
/// so no two uses of a combinator share match state.
///
/// # Examples
///
/// ```rust
/// use sprig::combinators::{in_range, one_or_more, rule};
/// use sprig::Grammar;
///
/// let mut grammar = Grammar::new();
/// grammar.define("digits", one_or_more(rule("digit")));
/// grammar.define("digit", in_range('0', '9'));
///
/// let result = grammar.parse("digits", "042");
/// let tree = result.tree().unwrap();
/// assert_eq!(tree.kind(), "digits");
/// assert_eq!(tree.value(), "042");
/// assert_eq!(result.position(), 3);
/// ```
#[derive(Clone)]
pub struct Rule {
    label: String,
    body: Body,
}

#[derive(Clone)]
pub(crate) enum Body {
    Reference(Reference),
    Primitive(Matcher),
}

/// A named reference plus the lazily cached slot it resolved to, tagged with
/// the grammar that slot belongs to.
#[derive(Clone)]
pub(crate) struct Reference {
    pub(crate) name: String,
    resolved: OnceCell<(GrammarKey, RuleId)>,
}

impl Reference {
    /// Looks the name up once and caches a hit. Misses are not cached, so a
    /// name defined after a failed lookup still resolves on a later parse.
    /// Applied against any grammar other than the cached one, the name is
    /// looked up afresh every time.
    fn resolve(&self, grammar: &Grammar) -> Option<RuleId> {
        let key = grammar.key();
        match self.resolved.get() {
            Some(&(cached, id)) if cached == key => return Some(id),
            Some(_) => return grammar.id_of(&self.name),
            None => {}
        }
        let id = grammar.id_of(&self.name)?;
        trace!(rule = %self.name, ?id, "resolved reference");
        match self.resolved.get_or_init(|| (key, id)) {
            &(cached, cached_id) if cached == key => Some(cached_id),
            _ => Some(id),
        }
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl Rule {
    pub(crate) fn primitive(matcher: Matcher) -> Self {
        Self {
            label: String::new(),
            body: Body::Primitive(matcher),
        }
    }

    /// An unlabeled reference to the rule defined under `name`.
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            label: String::new(),
            body: Body::Reference(Reference {
                name: name.into(),
                resolved: OnceCell::new(),
            }),
        }
    }

    /// Wraps a caller-supplied match function as an unlabeled primitive.
    ///
    /// The function moves the cursor with [`ParseState::advance`] or
    /// [`ParseState::set_position`]. A cursor left inside a multi-byte
    /// character is rounded up to the end of that character. Rewinding after
    /// a `false` return is done by [`Rule::apply`], not by the function.
    ///
    /// ```rust
    /// use sprig::{Grammar, Rule};
    ///
    /// // Matches one ASCII uppercase letter.
    /// let upper = Rule::custom(|state| match state.remaining().bytes().next() {
    ///     Some(b) if b.is_ascii_uppercase() => {
    ///         state.advance(1);
    ///         true
    ///     }
    ///     _ => false,
    /// });
    /// let mut grammar = Grammar::new();
    /// grammar.define("upper", upper);
    /// assert!(grammar.parse("upper", "Q").tree().is_some());
    /// assert!(grammar.parse("upper", "q").tree().is_none());
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut ParseState<'_>) -> bool + Send + Sync + 'static,
    {
        Self::primitive(Matcher::Custom(Arc::new(f)))
    }

    /// Replaces this rule's label. An empty label makes the rule transparent.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The referenced name, if this rule is a reference.
    pub fn reference_name(&self) -> Option<&str> {
        match &self.body {
            Body::Reference(r) => Some(&r.name),
            Body::Primitive(_) => None,
        }
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }

    /// Direct sub-rules captured by this rule's matcher.
    pub(crate) fn subrules(&self) -> &[Rule] {
        match &self.body {
            Body::Reference(_) => &[],
            Body::Primitive(m) => m.subrules(),
        }
    }

    /// Clears every cached resolution in this rule and its sub-rules, so the
    /// copy resolves against whichever grammar it is stored in.
    pub(crate) fn forget_resolutions(&mut self) {
        match &mut self.body {
            Body::Reference(r) => r.resolved = OnceCell::new(),
            Body::Primitive(m) => m.subrules_mut().iter_mut().for_each(Rule::forget_resolutions),
        }
    }
}

// ============================================================================
// APPLY
// ============================================================================

impl Rule {
    /// Applies this rule at the current cursor.
    ///
    /// Returns `true` and leaves the cursor after the match on success. On
    /// failure returns `false` with the cursor exactly where it was on entry,
    /// including any spaces skipped before matching, and no tree nodes added.
    /// Once the state carries a fatal error every call fails immediately.
    pub fn apply(&self, state: &mut ParseState<'_>) -> bool {
        if state.is_aborted() {
            return false;
        }

        let target = match &self.body {
            Body::Reference(r) => r.resolve(state.grammar()),
            Body::Primitive(_) => None,
        };

        let rewind_to = state.position();
        state.skip_whitespace();
        state.begin_node(&self.label);

        if state.depth() > state.max_depth() {
            state.abort_too_deep();
            state.discard_node();
            state.set_position(rewind_to);
            return false;
        }

        let matched = ensure_sufficient_stack(|| match &self.body {
            Body::Reference(_) => {
                let grammar = state.grammar();
                target
                    .and_then(|id| grammar.get(id))
                    .is_some_and(|rule| rule.apply(state))
            }
            Body::Primitive(matcher) => matcher.run(state),
        });

        if matched && !state.is_aborted() {
            state.complete_node();
            true
        } else {
            state.discard_node();
            state.set_position(rewind_to);
            false
        }
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0)
    }
}

impl Rule {
    /// Writes this rule, parenthesized when its precedence is below `min_prec`.
    pub(crate) fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        match &self.body {
            Body::Reference(r) => f.write_str(&r.name),
            Body::Primitive(m) if m.precedence() < min_prec => {
                f.write_str("(")?;
                m.fmt_body(f)?;
                f.write_str(")")
            }
            Body::Primitive(m) => m.fmt_body(f),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("body", &format_args!("{self}"))
            .finish()
    }
}
