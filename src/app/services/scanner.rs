use crate::app::domain::{Document, NodeId, RootStrategy};

use super::eligibility::EligibilityFilter;

/// Subtree a render pass walks.
pub fn resolve_root(doc: &Document, strategy: RootStrategy) -> NodeId {
    match strategy {
        RootStrategy::Body => doc.body(),
        RootStrategy::MainContent => doc
            .find_element(doc.root(), |d, id| {
                matches!(d.tag_name(id), Some("article") | Some("main"))
                    || d.attr(id, "role") == Some("main")
            })
            .unwrap_or_else(|| doc.body()),
    }
}

/// Collect every accepted text node below `root`, in document order.
///
/// The list is complete before the caller mutates anything; replacing nodes
/// while the walker is live would skip or revisit siblings.
pub fn scan(doc: &Document, root: NodeId, filter: &EligibilityFilter) -> Vec<NodeId> {
    doc.text_walker(root, |d, id| filter.decide(d, id).is_accept())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::BionicConfig;
    use crate::app::services::markup::parse_document;

    const SENTENCE: &str = "Readers skim long paragraphs faster with anchors";

    #[test]
    fn test_resolve_root_prefers_main_content() {
        let doc = parse_document(&format!(
            "<html><body><nav>menu</nav><div role=\"main\"><p>{SENTENCE}</p></div></body></html>"
        ))
        .unwrap();
        let root = resolve_root(&doc, RootStrategy::MainContent);
        assert_eq!(doc.attr(root, "role"), Some("main"));
        assert_eq!(doc.tag_name(resolve_root(&doc, RootStrategy::Body)), Some("body"));
    }

    #[test]
    fn test_resolve_root_falls_back_to_body() {
        let doc = parse_document("<html><body><p>plain</p></body></html>").unwrap();
        let root = resolve_root(&doc, RootStrategy::MainContent);
        assert_eq!(doc.tag_name(root), Some("body"));
    }

    #[test]
    fn test_scan_collects_in_document_order() {
        let doc = parse_document(&format!(
            "<body><p>{SENTENCE} one</p><pre>{SENTENCE}</pre><p>ok</p><div>{SENTENCE} two</div></body>"
        ))
        .unwrap();
        let filter = EligibilityFilter::new(&BionicConfig::default());
        let found: Vec<String> = scan(&doc, doc.body(), &filter)
            .into_iter()
            .map(|id| doc.text_content(id))
            .collect();
        assert_eq!(found, vec![format!("{SENTENCE} one"), format!("{SENTENCE} two")]);
    }

    #[test]
    fn test_scan_limited_to_root() {
        let doc = parse_document(&format!(
            "<body><aside><p>{SENTENCE}</p></aside><article><p>{SENTENCE}</p></article><p>{SENTENCE}</p></body>"
        ))
        .unwrap();
        let filter = EligibilityFilter::new(&BionicConfig::default());
        let root = resolve_root(&doc, RootStrategy::MainContent);
        assert_eq!(scan(&doc, root, &filter).len(), 1);
        // only the immediate parent is checked against the ignore list
        assert_eq!(scan(&doc, doc.body(), &filter).len(), 3);
    }
}
