//! Reply parsing — patch blocks and full-code fences
//!
//! A reply may carry repeated SEARCH/REPLACE blocks, a fenced code block,
//! both, or neither. Patch blocks always take precedence: assistants often
//! quote a fenced snippet while proposing patches, and applying the fence
//! as a whole-document replacement would destroy the sketch.

/// Opening marker of a patch block
const SEARCH_MARKER: &str = "<<<<<<< SEARCH";
/// Separator between search and replace sections
const DIVIDER_MARKER: &str = "=======";
/// Closing marker of a patch block
const REPLACE_MARKER: &str = ">>>>>>> REPLACE";

/// Fence tags accepted as "source code" for the full-code grammar
const CODE_FENCE_TAGS: &[&str] = &["javascript", "js", "jsx", "typescript", "ts"];

/// One localized search/replace edit
///
/// Ordering matters: blocks are applied in the order they appear in the
/// reply, each against the already-partially-patched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePatchBlock {
    /// Exact text to locate in the current document
    pub search: String,
    /// Replacement text
    pub replace: String,
}

/// What a reply asks the client to do with the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyAction {
    /// Ordered localized patches
    Patches(Vec<CodePatchBlock>),
    /// Whole-document replacement
    FullCode(String),
    /// No actionable code in this reply
    None,
}

/// Parse an assistant reply into its code action
///
/// Patch grammar and full-code grammar are checked independently; patch
/// blocks win when both are present. Returns `ReplyAction::None` when
/// neither grammar matches, in which case no code action is offered.
pub fn extract(reply: &str) -> ReplyAction {
    let patches = extract_patch_blocks(reply);
    if !patches.is_empty() {
        return ReplyAction::Patches(patches);
    }

    if let Some(code) = extract_fenced_code(reply) {
        return ReplyAction::FullCode(code);
    }

    ReplyAction::None
}

/// Scan for SEARCH/REPLACE blocks, left to right, non-overlapping
///
/// A block is only accepted when all three markers are found in order;
/// a dangling opener (stream still in progress, or model trailing off)
/// is ignored rather than treated as a malformed block. A fresh opener
/// before the divider resyncs the scan so a malformed block never
/// swallows a well-formed one after it.
pub fn extract_patch_blocks(reply: &str) -> Vec<CodePatchBlock> {
    let mut blocks = Vec::new();
    let lines: Vec<&str> = reply.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].trim() != SEARCH_MARKER {
            i += 1;
            continue;
        }

        // Collect search section up to the divider
        let mut search_lines = Vec::new();
        let mut j = i + 1;
        while j < lines.len()
            && lines[j].trim() != DIVIDER_MARKER
            && lines[j].trim() != SEARCH_MARKER
        {
            search_lines.push(lines[j]);
            j += 1;
        }
        if j >= lines.len() {
            break;
        }
        if lines[j].trim() == SEARCH_MARKER {
            // Opener with no divider; restart the scan at the new opener
            i = j;
            continue;
        }

        // Collect replace section up to the closing marker
        let mut replace_lines = Vec::new();
        let mut k = j + 1;
        while k < lines.len() && lines[k].trim() != REPLACE_MARKER {
            replace_lines.push(lines[k]);
            k += 1;
        }
        if k >= lines.len() {
            break;
        }

        blocks.push(CodePatchBlock {
            search: search_lines.join("\n"),
            replace: replace_lines.join("\n"),
        });
        i = k + 1;
    }

    blocks
}

/// First fenced block tagged as a source-code language
///
/// Used only when no patch blocks are present. Untagged fences and fences
/// tagged with non-code languages (json, text, ...) are skipped.
pub fn extract_fenced_code(reply: &str) -> Option<String> {
    let lines: Vec<&str> = reply.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim();
        if let Some(tag) = trimmed.strip_prefix("```") {
            let tag = tag.trim().to_lowercase();
            if CODE_FENCE_TAGS.contains(&tag.as_str()) {
                let mut body = Vec::new();
                let mut j = i + 1;
                while j < lines.len() && lines[j].trim() != "```" {
                    body.push(lines[j]);
                    j += 1;
                }
                if j >= lines.len() {
                    // Unterminated fence — reply still streaming
                    return None;
                }
                return Some(body.join("\n"));
            }
            // Skip over a non-code fence so its body is never scanned
            let mut j = i + 1;
            while j < lines.len() && lines[j].trim() != "```" {
                j += 1;
            }
            i = j + 1;
            continue;
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_single_patch_block() {
        let reply = "Here is the fix:\n\
                     <<<<<<< SEARCH\n\
                     let r = 10;\n\
                     =======\n\
                     let r = 40;\n\
                     >>>>>>> REPLACE\n\
                     That makes the circle bigger.";

        let action = extract(reply);
        assert_eq!(
            action,
            ReplyAction::Patches(vec![CodePatchBlock {
                search: "let r = 10;".to_string(),
                replace: "let r = 40;".to_string(),
            }])
        );
    }

    #[test]
    fn test_extract_multiple_blocks_in_order() {
        let reply = "<<<<<<< SEARCH\nfirst\n=======\nFIRST\n>>>>>>> REPLACE\n\
                     text between\n\
                     <<<<<<< SEARCH\nsecond\n=======\nSECOND\n>>>>>>> REPLACE";

        let blocks = extract_patch_blocks(reply);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].search, "first");
        assert_eq!(blocks[1].search, "second");
    }

    #[test]
    fn test_multiline_sections() {
        let reply = "<<<<<<< SEARCH\nline1\nline2\n=======\nnew1\nnew2\nnew3\n>>>>>>> REPLACE";
        let blocks = extract_patch_blocks(reply);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].search, "line1\nline2");
        assert_eq!(blocks[0].replace, "new1\nnew2\nnew3");
    }

    #[test]
    fn test_empty_replace_section_deletes() {
        let reply = "<<<<<<< SEARCH\nobsolete();\n=======\n>>>>>>> REPLACE";
        let blocks = extract_patch_blocks(reply);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].search, "obsolete();");
        assert_eq!(blocks[0].replace, "");
    }

    #[test]
    fn test_dangling_open_marker_ignored() {
        let reply = "<<<<<<< SEARCH\nsome text that never closes";
        assert!(extract_patch_blocks(reply).is_empty());
        assert_eq!(extract(reply), ReplyAction::None);
    }

    #[test]
    fn test_dangling_opener_does_not_swallow_later_block() {
        let reply = "<<<<<<< SEARCH\nabandoned text, no divider\n\
                     <<<<<<< SEARCH\nold\n=======\nnew\n>>>>>>> REPLACE";
        let blocks = extract_patch_blocks(reply);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].search, "old");
        assert_eq!(blocks[0].replace, "new");
    }

    #[test]
    fn test_full_code_fence() {
        let reply = "Replacing the whole sketch:\n```javascript\nfunction setup() {}\nfunction draw() {}\n```\nDone.";
        let action = extract(reply);
        assert_eq!(
            action,
            ReplyAction::FullCode("function setup() {}\nfunction draw() {}".to_string())
        );
    }

    #[test]
    fn test_js_tag_accepted() {
        let reply = "```js\nlet a = 1;\n```";
        assert_eq!(extract(reply), ReplyAction::FullCode("let a = 1;".to_string()));
    }

    #[test]
    fn test_non_code_fence_skipped() {
        let reply = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract(reply), ReplyAction::None);
    }

    #[test]
    fn test_first_code_fence_wins() {
        let reply = "```text\nnot code\n```\n```js\nfirst\n```\n```js\nsecond\n```";
        assert_eq!(extract(reply), ReplyAction::FullCode("first".to_string()));
    }

    #[test]
    fn test_patch_blocks_take_precedence_over_fence() {
        let reply = "```javascript\nlet whole = 'sketch';\n```\n\
                     <<<<<<< SEARCH\nold\n=======\nnew\n>>>>>>> REPLACE";

        match extract(reply) {
            ReplyAction::Patches(blocks) => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].search, "old");
            }
            other => panic!("Expected Patches, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_prose_yields_none() {
        let reply = "Your sketch already does that. No changes needed.";
        assert_eq!(extract(reply), ReplyAction::None);
    }

    #[test]
    fn test_unterminated_fence_yields_none() {
        // Mid-stream display: fence opened but not yet closed
        let reply = "```javascript\nfunction setup() {";
        assert_eq!(extract(reply), ReplyAction::None);
    }
}
