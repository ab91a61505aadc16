//! Ordered, fail-closed patch application
//!
//! Each block's `search` text must occur literally in the current,
//! already-partially-patched document; the first occurrence is replaced.
//! No regex, no whitespace normalization. An unmatched block fails the
//! whole operation with no partial result: an applied patch must change
//! exactly the text the assistant pointed at, never a similar-looking
//! occurrence elsewhere. That trades recall for precision on purpose.

use super::extract::CodePatchBlock;

/// How much of a failing block's anchor text the error carries
const ANCHOR_EXCERPT_LEN: usize = 120;

/// Patch application failure
///
/// Means the reply is stale or wrong, not the document. The anchor
/// excerpt lets the user see what the assistant thought was there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("Patch block {index} does not match the document; anchor text: {anchor:?}")]
    SearchNotFound { index: usize, anchor: String },

    #[error("Patch list is empty")]
    EmptyPatchList,
}

/// Apply patch blocks to a document, strictly in listed order
///
/// Returns the new document, or the first failure with nothing applied
/// from the caller's point of view (the input is untouched; the partially
/// patched intermediate is discarded).
pub fn apply_patches(document: &str, patches: &[CodePatchBlock]) -> Result<String, PatchError> {
    if patches.is_empty() {
        return Err(PatchError::EmptyPatchList);
    }

    let mut current = document.to_string();
    for (index, block) in patches.iter().enumerate() {
        match current.find(&block.search) {
            Some(pos) => {
                current.replace_range(pos..pos + block.search.len(), &block.replace);
            }
            None => {
                return Err(PatchError::SearchNotFound {
                    index,
                    anchor: truncate_anchor(&block.search),
                });
            }
        }
    }

    Ok(current)
}

/// Truncate anchor text for error display, on a char boundary
fn truncate_anchor(search: &str) -> String {
    if search.len() <= ANCHOR_EXCERPT_LEN {
        return search.to_string();
    }
    let mut end = ANCHOR_EXCERPT_LEN;
    while !search.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &search[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(search: &str, replace: &str) -> CodePatchBlock {
        CodePatchBlock {
            search: search.to_string(),
            replace: replace.to_string(),
        }
    }

    #[test]
    fn test_single_block() {
        let result = apply_patches("A\nB\nC", &[block("B", "B2")]).unwrap();
        assert_eq!(result, "A\nB2\nC");
    }

    #[test]
    fn test_sequential_application_on_evolving_document() {
        // Second block's search matches the output of the first
        let result = apply_patches("A", &[block("A", "X"), block("X", "Y")]).unwrap();
        assert_eq!(result, "Y");
    }

    #[test]
    fn test_order_sensitivity() {
        // Listed order rewrites "ab" first, so the second block finds the
        // "b" that the first block produced, not the original one.
        let patches = [block("ab", "b"), block("b", "z")];
        let result = apply_patches("ab", &patches).unwrap();
        assert_eq!(result, "z");

        // Reverse order produces a different document, proving order matters
        let reversed = [block("b", "z"), block("ab", "b")];
        assert!(apply_patches("ab", &reversed).is_err());
    }

    #[test]
    fn test_first_occurrence_only() {
        let result = apply_patches("x x x", &[block("x", "y")]).unwrap();
        assert_eq!(result, "y x x");
    }

    #[test]
    fn test_exact_match_no_whitespace_normalization() {
        // Two spaces in the document, one in the patch: no match
        let result = apply_patches("let  r = 1;", &[block("let r = 1;", "let r = 2;")]);
        assert!(matches!(result, Err(PatchError::SearchNotFound { .. })));
    }

    #[test]
    fn test_unmatched_block_fails_whole_operation() {
        let doc = "A\nB\nC";
        let patches = [block("A", "A2"), block("missing", "x")];
        let result = apply_patches(doc, &patches);
        match result {
            Err(PatchError::SearchNotFound { index, anchor }) => {
                assert_eq!(index, 1);
                assert_eq!(anchor, "missing");
            }
            other => panic!("Expected SearchNotFound, got {:?}", other),
        }
        // Input untouched — caller keeps the original document
        assert_eq!(doc, "A\nB\nC");
    }

    #[test]
    fn test_empty_replace_deletes_text() {
        let result = apply_patches("keep remove keep", &[block(" remove", "")]).unwrap();
        assert_eq!(result, "keep keep");
    }

    #[test]
    fn test_empty_patch_list_rejected() {
        assert!(matches!(
            apply_patches("doc", &[]),
            Err(PatchError::EmptyPatchList)
        ));
    }

    #[test]
    fn test_long_anchor_truncated_in_error() {
        let long_search = "z".repeat(500);
        let result = apply_patches("doc", &[block(&long_search, "y")]);
        match result {
            Err(PatchError::SearchNotFound { anchor, .. }) => {
                assert!(anchor.chars().count() <= 121);
                assert!(anchor.ends_with('…'));
            }
            other => panic!("Expected SearchNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_multiline_block() {
        let doc = "function draw() {\n  circle(10, 10, 5);\n}";
        let patches = [block(
            "  circle(10, 10, 5);",
            "  background(0);\n  circle(10, 10, 5);",
        )];
        let result = apply_patches(doc, &patches).unwrap();
        assert_eq!(
            result,
            "function draw() {\n  background(0);\n  circle(10, 10, 5);\n}"
        );
    }
}
