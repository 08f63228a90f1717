//! Creation and removal of transformed units (`<bionic-word>` wrappers).

use crate::app::domain::{Document, NodeId, WORD_TAG};
use crate::app::infrastructure::error::Result;

use super::markup::parse_fragment;

/// Replace text node `node` with a wrapper element holding `markup`.
///
/// On a parse failure the document is left as it was.
pub fn wrap_text_node(doc: &mut Document, node: NodeId, markup: &str) -> Result<NodeId> {
    let wrapper = doc.create_element(WORD_TAG);
    parse_fragment(doc, wrapper, markup)?;
    doc.replace_node(node, wrapper);
    Ok(wrapper)
}

/// Replace every wrapper with a plain text node of its flattened text.
/// Returns how many wrappers were removed; safe to call with none present.
pub fn sanitize(doc: &mut Document) -> usize {
    let wrappers = doc.elements_by_tag(WORD_TAG);
    let mut removed = 0;
    for wrapper in wrappers {
        // a wrapper nested in an already flattened one is detached by now
        if !doc.is_attached(wrapper) {
            continue;
        }
        let text = doc.text_content(wrapper);
        let replacement = doc.create_text(text);
        if doc.replace_node(wrapper, replacement) {
            removed += 1;
        }
    }
    tracing::info!(removed, "all bionic tags have been removed");
    removed
}
