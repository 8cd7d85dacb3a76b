//! Text edits, fixes and conflict-checked batch application.
//!
//! Edits are computed against an immutable snapshot of a document and only
//! turned into new text once every edit of a fix has been validated, so a
//! failed or cancelled fix never leaves a half-edited document behind.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::DocumentId;
use crate::types::Span;

/// Replaces `span` with `new_text`; an empty span inserts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextEdit {
    /// Range being replaced.
    pub span: Span,
    /// Replacement text.
    pub new_text: String,
}

impl TextEdit {
    /// Inserts `text` at `offset`.
    #[must_use]
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            span: Span::empty(offset),
            new_text: text.into(),
        }
    }

    /// Replaces `span` with `text`.
    #[must_use]
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: text.into(),
        }
    }

    /// Returns true if this edit only inserts.
    #[must_use]
    pub fn is_insert(&self) -> bool {
        self.span.is_empty()
    }

    /// Returns true if the two ranges cannot both be applied.
    ///
    /// Ranges overlap, or one inserts strictly inside the other's replaced range.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let (a, b) = (self.span, other.span);
        match (self.is_insert(), other.is_insert()) {
            (true, true) => false,
            (true, false) => b.start < a.start && a.start < b.end,
            (false, true) => a.start < b.start && b.start < a.end,
            (false, false) => a.start < b.end && b.start < a.end,
        }
    }

    /// Returns true if the edits collide when queued from different fixes.
    ///
    /// Adds same-offset insertions of different text to [`TextEdit::overlaps`].
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        if self == other {
            return false;
        }
        self.overlaps(other)
            || (self.is_insert() && other.is_insert() && self.span.start == other.span.start)
    }
}

/// Errors applying edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// The span reaches past the end of the text.
    #[error("edit {start}..{end} is outside the document (length {len})")]
    OutOfBounds {
        /// Span start.
        start: usize,
        /// Span end.
        end: usize,
        /// Document length.
        len: usize,
    },

    /// The span does not start or end on a character boundary.
    #[error("edit offset {offset} is not on a character boundary")]
    NotCharBoundary {
        /// The offending offset.
        offset: usize,
    },

    /// Two edits of the same fix overlap.
    #[error("edits {first:?} and {second:?} overlap")]
    Overlap {
        /// First span.
        first: Span,
        /// Second span.
        second: Span,
    },
}

fn validate(text: &str, edit: &TextEdit) -> Result<(), EditError> {
    let Span { start, end } = edit.span;
    if start > end || end > text.len() {
        return Err(EditError::OutOfBounds {
            start,
            end,
            len: text.len(),
        });
    }
    for offset in [start, end] {
        if !text.is_char_boundary(offset) {
            return Err(EditError::NotCharBoundary { offset });
        }
    }
    Ok(())
}

/// Applies edits to `text`, returning the new text.
///
/// Insertions at the same offset keep their given order and precede a
/// replacement starting there.
///
/// # Errors
///
/// Returns an error if any edit is out of range or two edits overlap.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    for edit in edits {
        validate(text, edit)?;
    }
    for (i, a) in edits.iter().enumerate() {
        if let Some(b) = edits[i + 1..].iter().find(|b| a.overlaps(b)) {
            return Err(EditError::Overlap {
                first: a.span,
                second: b.span,
            });
        }
    }

    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.span.start, e.span.end));

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in ordered {
        output.push_str(&text[cursor..edit.span.start]);
        output.push_str(&edit.new_text);
        cursor = edit.span.end;
    }
    output.push_str(&text[cursor..]);
    Ok(output)
}

/// A titled group of edits to one document, applied all or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Title shown to the user.
    pub title: String,
    /// Groups equivalent fixes for fix-all operations.
    pub equivalence_key: String,
    /// Document the edits apply to.
    pub document: DocumentId,
    /// Edits, in generation order.
    pub edits: Vec<TextEdit>,
}

impl Fix {
    /// Applies the fix to a snapshot of the document text.
    ///
    /// # Errors
    ///
    /// Returns an error if any edit is invalid; `text` is left untouched.
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        apply_edits(text, &self.edits)
    }

    fn first_offset(&self) -> usize {
        self.edits
            .iter()
            .map(|e| e.span.start)
            .min()
            .unwrap_or(usize::MAX)
    }
}

/// Why a fix was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollisionReason {
    /// One of its edits collides with an edit already accepted.
    Overlap {
        /// Span of the colliding edit.
        span: Span,
        /// Title of the fix that owns the accepted edit.
        accepted: String,
    },
    /// Its own edits are invalid.
    Invalid {
        /// Rendered [`EditError`].
        message: String,
    },
}

/// A fix skipped during batch application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// Title of the skipped fix.
    pub title: String,
    /// Equivalence key of the skipped fix.
    pub equivalence_key: String,
    /// Why it was skipped.
    pub reason: CollisionReason,
}

/// Result of applying many fixes to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// The edited text.
    pub text: String,
    /// Titles of the fixes applied, in application order.
    pub applied: Vec<String>,
    /// Fixes that were skipped.
    pub collisions: Vec<Collision>,
}

/// Applies many fixes to one document.
///
/// Fixes are ordered by their first edit offset, then equivalence key, so
/// the outcome does not depend on the order they were queued in. Edits that
/// are byte-identical across fixes are applied once. A fix whose edits
/// collide with an already accepted fix is skipped and reported; the rest
/// of the batch still applies.
///
/// # Errors
///
/// Only fails if accepted edits cannot be applied, which validation rules out.
pub fn apply_batch(text: &str, fixes: &[Fix]) -> Result<BatchOutcome, EditError> {
    let mut ordered: Vec<&Fix> = fixes.iter().collect();
    ordered.sort_by(|a, b| {
        a.first_offset()
            .cmp(&b.first_offset())
            .then_with(|| a.equivalence_key.cmp(&b.equivalence_key))
            .then_with(|| a.title.cmp(&b.title))
    });

    let mut accepted: Vec<(TextEdit, usize)> = Vec::new();
    let mut applied = Vec::new();
    let mut collisions = Vec::new();

    for fix in ordered {
        if let Err(error) = apply_edits(text, &fix.edits) {
            warn!("Skipping invalid fix '{}': {}", fix.title, error);
            collisions.push(Collision {
                title: fix.title.clone(),
                equivalence_key: fix.equivalence_key.clone(),
                reason: CollisionReason::Invalid {
                    message: error.to_string(),
                },
            });
            continue;
        }

        let conflict = fix.edits.iter().find_map(|edit| {
            accepted
                .iter()
                .find(|(other, _)| edit.conflicts_with(other))
                .map(|(_, owner)| (edit.span, *owner))
        });
        if let Some((span, owner)) = conflict {
            let accepted_title = applied.get(owner).cloned().unwrap_or_default();
            debug!(
                "Fix '{}' collides with '{}' at {}..{}",
                fix.title, accepted_title, span.start, span.end
            );
            collisions.push(Collision {
                title: fix.title.clone(),
                equivalence_key: fix.equivalence_key.clone(),
                reason: CollisionReason::Overlap {
                    span,
                    accepted: accepted_title,
                },
            });
            continue;
        }

        let owner = applied.len();
        for edit in &fix.edits {
            if !accepted.iter().any(|(other, _)| other == edit) {
                accepted.push((edit.clone(), owner));
            }
        }
        applied.push(fix.title.clone());
    }

    let edits: Vec<TextEdit> = accepted.into_iter().map(|(edit, _)| edit).collect();
    Ok(BatchOutcome {
        text: apply_edits(text, &edits)?,
        applied,
        collisions,
    })
}

/// Cooperative cancellation signal for fix computation.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(title: &str, key: &str, edits: Vec<TextEdit>) -> Fix {
        Fix {
            title: title.to_string(),
            equivalence_key: key.to_string(),
            document: DocumentId(0),
            edits,
        }
    }

    #[test]
    fn inserts_precede_replacement_at_same_offset() {
        let edits = [
            TextEdit::replace(Span::new(4, 8), "beta"),
            TextEdit::insert(4, "["),
        ];
        assert_eq!(apply_edits("one alfa two", &edits).unwrap(), "one [beta two");
    }

    #[test]
    fn insert_inside_replacement_is_rejected() {
        let edits = [
            TextEdit::replace(Span::new(0, 6), "x"),
            TextEdit::insert(3, "y"),
        ];
        assert!(matches!(
            apply_edits("abcdefgh", &edits),
            Err(EditError::Overlap { .. })
        ));
    }

    #[test]
    fn out_of_bounds_and_char_boundary_are_rejected() {
        assert!(matches!(
            apply_edits("abc", &[TextEdit::insert(10, "x")]),
            Err(EditError::OutOfBounds { .. })
        ));
        assert!(matches!(
            apply_edits("é", &[TextEdit::insert(1, "x")]),
            Err(EditError::NotCharBoundary { offset: 1 })
        ));
    }

    #[test]
    fn batch_merges_identical_edits() {
        let text = "using A;\nM(); N();";
        let import = TextEdit::insert(8, "\nusing B;");
        let fixes = [
            fix("second", "k", vec![import.clone(), TextEdit::insert(16, "t")]),
            fix("first", "k", vec![import, TextEdit::insert(11, "t")]),
        ];
        let outcome = apply_batch(text, &fixes).unwrap();
        assert_eq!(outcome.text, "using A;\nusing B;\nM(t); N(t);");
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn batch_skips_only_the_colliding_fix() {
        let text = "M(CancellationToken.None); N();";
        let none = Span::new(2, 24);
        let fixes = [
            fix("Pass parameter 'token'", "a", vec![TextEdit::replace(none, "token")]),
            fix("Pass field '_token'", "b", vec![TextEdit::replace(none, "_token")]),
            fix("Pass parameter 'token' to N", "c", vec![TextEdit::insert(29, "token")]),
        ];
        let outcome = apply_batch(text, &fixes).unwrap();
        assert_eq!(outcome.text, "M(token); N(token);");
        assert_eq!(outcome.collisions.len(), 1);
        assert_eq!(outcome.collisions[0].title, "Pass field '_token'");
        assert_eq!(
            outcome.collisions[0].reason,
            CollisionReason::Overlap {
                span: none,
                accepted: "Pass parameter 'token'".to_string(),
            }
        );
    }

    #[test]
    fn same_offset_inserts_collide_across_fixes() {
        let a = TextEdit::insert(2, "x");
        let b = TextEdit::insert(2, "y");
        assert!(!a.overlaps(&b));
        assert!(a.conflicts_with(&b));
        assert!(!a.conflicts_with(&a.clone()));
    }

    #[test]
    fn batch_is_order_independent() {
        let text = "f(); g();";
        let a = fix("a", "k", vec![TextEdit::insert(2, "x")]);
        let b = fix("b", "k", vec![TextEdit::insert(7, "y")]);
        let forward = apply_batch(text, &[a.clone(), b.clone()]).unwrap();
        let backward = apply_batch(text, &[b, a]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.text, "f(x); g(y);");
    }

    #[test]
    fn cancellation_flag_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
