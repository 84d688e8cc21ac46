//! Cursor-aware parsing hooks.
//!
//! Completion and selection parsing are ordinary diet/body parses with an
//! [`AssistState`] attached. Wrap sites in the parsers consult the state:
//! the first name/member-access overlapping the cursor (or covering the
//! selection range) becomes the assist node, recorded here exactly once per
//! parse together with its completion identifier, replaced source range, and
//! an optional rendered parent context.
//!
//! The cursor convention follows the "complete behind" model: the offset
//! points at the last typed character, so an identifier token owns the
//! cursor when `token.start <= cursor < token.end`, and the completion
//! identifier is the token text truncated just past the cursor.

use quarry_core::TextRange;
use smol_str::SmolStr;

/// The identifier characters from `start` through the cursor, extended to
/// the next character boundary so multi-byte identifiers cannot split.
pub(crate) fn completion_prefix(source: &str, start: u32, cursor: u32) -> &str {
    let mut end = (cursor as usize + 1).min(source.len());
    while end < source.len() && !source.is_char_boundary(end) {
        end += 1;
    }
    &source[start as usize..end]
}

/// What kind of cursor the parse carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistMode {
    /// Completion at a single offset.
    Complete { cursor: u32 },
    /// Selection of an inclusive `[start, end]` character range.
    Select { start: u32, end: u32 },
}

/// The assist node's rendered parent context, claimed by the innermost
/// interested construct.
#[derive(Debug, Clone)]
pub(crate) enum ParentSlot {
    /// An annotation array initializer holds the node; the owning
    /// annotation fills in its name and member once known.
    ArrayInitPending,
    Done(String),
}

/// The product of an assist parse: at most one node.
#[derive(Debug, Clone)]
pub struct AssistCapture {
    /// Display form of the assist node (`<CompleteOnName:foo>`).
    pub node: String,
    /// Display form of the parent context, if one claimed the node.
    pub parent: Option<String>,
    /// The identifier characters from token start through the cursor.
    pub completion_identifier: SmolStr,
    /// The exact source span a textual completion insertion would replace.
    pub replaced_range: TextRange,
}

#[derive(Debug)]
pub(crate) struct AssistState {
    pub(crate) mode: AssistMode,
    pub(crate) capture: Option<AssistCapture>,
    pub(crate) parent: Option<ParentSlot>,
    /// A capture exists whose parent has not been claimed yet.
    pub(crate) unclaimed: bool,
}

impl AssistState {
    pub(crate) fn new(mode: AssistMode) -> Self {
        Self {
            mode,
            capture: None,
            parent: None,
            unclaimed: false,
        }
    }

    /// The completion cursor, while no node has been captured yet.
    pub(crate) fn pending_cursor(&self) -> Option<u32> {
        match self.mode {
            AssistMode::Complete { cursor } if self.capture.is_none() => Some(cursor),
            _ => None,
        }
    }

    /// The selection range, while no node has been captured yet.
    pub(crate) fn pending_selection(&self) -> Option<(u32, u32)> {
        match self.mode {
            AssistMode::Select { start, end } if self.capture.is_none() => Some((start, end)),
            _ => None,
        }
    }

    pub(crate) fn is_complete_mode(&self) -> bool {
        matches!(self.mode, AssistMode::Complete { .. })
    }

    pub(crate) fn record(
        &mut self,
        node: String,
        completion_identifier: SmolStr,
        replaced_range: TextRange,
    ) {
        debug_assert!(self.capture.is_none(), "second assist node in one parse");
        self.capture = Some(AssistCapture {
            node,
            parent: None,
            completion_identifier,
            replaced_range,
        });
        self.unclaimed = true;
    }

    /// Claim the freshly captured node for a parent context. The first
    /// (innermost) claim wins; later claims are ignored.
    pub(crate) fn claim_parent(&mut self, display: String) {
        if self.unclaimed && self.parent.is_none() {
            self.parent = Some(ParentSlot::Done(display));
            self.unclaimed = false;
        }
    }

    /// Mark the capture as living inside an annotation array initializer;
    /// the annotation parser later resolves the pending slot to the
    /// `<AssistNodeParentAnnotationArrayInitializer:...>` tag.
    pub(crate) fn claim_array_initializer(&mut self) {
        if self.unclaimed && self.parent.is_none() {
            self.parent = Some(ParentSlot::ArrayInitPending);
            self.unclaimed = false;
        }
    }

    /// Resolve a pending array-initializer claim, or fall back to a
    /// member-value-pair claim for a still-unclaimed capture.
    pub(crate) fn resolve_annotation_value(
        &mut self,
        annotation_name: &str,
        member_name: &str,
        value_display: impl FnOnce() -> String,
    ) {
        if matches!(self.parent, Some(ParentSlot::ArrayInitPending)) {
            self.parent = Some(ParentSlot::Done(format!(
                "<AssistNodeParentAnnotationArrayInitializer:@{annotation_name}({member_name})>"
            )));
        } else if self.unclaimed && self.parent.is_none() {
            self.parent = Some(ParentSlot::Done(format!(
                "{member_name} = {}",
                value_display()
            )));
            self.unclaimed = false;
        }
    }

    pub(crate) fn finish(mut self) -> Option<AssistCapture> {
        let parent = match self.parent.take() {
            Some(ParentSlot::Done(display)) => Some(display),
            // A pending array claim whose annotation never completed keeps
            // the node but reports no parent.
            Some(ParentSlot::ArrayInitPending) | None => None,
        };
        self.capture.map(|mut capture| {
            capture.parent = parent;
            capture
        })
    }
}
