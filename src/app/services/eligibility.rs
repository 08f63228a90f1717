use std::sync::LazyLock;

use regex_lite::Regex;

use crate::app::domain::{BionicConfig, Document, NodeId, FONT_TAG, WORD_TAG};

/// A run of letters ending in whitespace or at the end of the text.
static WORD_MATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z]+(\s+|$)").expect("word pattern is valid"));

/// Which rule rejected a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoParent,
    /// Parent is one of our own wrapper tags.
    ReservedTag,
    IgnoredTag,
    TooShort,
    TooFewWords,
    /// Inside a link or emphasis whose own text is too sparse.
    SparseDecoratorContext,
    OffScreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Decides, per text node, whether transforming it is safe and worthwhile.
pub struct EligibilityFilter {
    config: BionicConfig,
}

impl EligibilityFilter {
    pub fn new(config: &BionicConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Rules run in order and stop at the first rejection.
    pub fn decide(&self, doc: &Document, node: NodeId) -> Decision {
        let Some(parent) = doc.parent_element(node) else {
            return Decision::Reject(RejectReason::NoParent);
        };

        let tag = doc.tag_name(parent).unwrap_or_default();
        if tag == WORD_TAG || tag == FONT_TAG {
            return Decision::Reject(RejectReason::ReservedTag);
        }
        if self.config.is_ignored_tag(tag) {
            return Decision::Reject(RejectReason::IgnoredTag);
        }

        let text = doc.text(node).unwrap_or_default().trim();
        if text.chars().count() < self.config.min_characters {
            return Decision::Reject(RejectReason::TooShort);
        }

        if !self.check_words(text) {
            return Decision::Reject(RejectReason::TooFewWords);
        }

        if self.config.is_inline_decorator(tag) && !self.check_words(&doc.text_content(parent)) {
            return Decision::Reject(RejectReason::SparseDecoratorContext);
        }

        let rect = doc.bounding_rect(parent);
        let offset = self.config.vertical_offset;
        if rect.bottom < -offset || rect.top > doc.client_height() + offset {
            return Decision::Reject(RejectReason::OffScreen);
        }

        Decision::Accept
    }

    /// False when the text has both too few words and too few letters in them.
    pub fn check_words(&self, text: &str) -> bool {
        let mut count = 0usize;
        let mut letters = 0usize;
        for m in WORD_MATCH.find_iter(text) {
            count += 1;
            letters += m.as_str().chars().filter(|c| !c.is_whitespace()).count();
        }
        !(count < self.config.min_words && letters < self.config.min_node_text_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::markup::parse_document;

    fn filter() -> EligibilityFilter {
        EligibilityFilter::new(&BionicConfig::default())
    }

    fn first_text_in(doc: &Document, tag: &str) -> NodeId {
        let el = doc.elements_by_tag(tag)[0];
        doc.children(el)
            .iter()
            .copied()
            .find(|id| doc.is_text(*id))
            .unwrap()
    }

    const SENTENCE: &str = "The quick brown fox jumps over the lazy dog";

    #[test]
    fn test_accepts_plain_paragraph() {
        let doc = parse_document(&format!("<body><p>{SENTENCE}</p></body>")).unwrap();
        let text = first_text_in(&doc, "p");
        assert_eq!(filter().decide(&doc, text), Decision::Accept);
    }

    #[test]
    fn test_rejects_detached_and_root_level_text() {
        let mut doc = Document::new();
        let loose = doc.create_text(SENTENCE);
        assert_eq!(filter().decide(&doc, loose), Decision::Reject(RejectReason::NoParent));
        let root = doc.root();
        doc.append_child(root, loose);
        assert_eq!(filter().decide(&doc, loose), Decision::Reject(RejectReason::NoParent));
    }

    #[test]
    fn test_rejects_reserved_and_ignored_parents() {
        let doc = parse_document(&format!(
            "<body><bionic-font>{SENTENCE}</bionic-font><code>{SENTENCE}</code><h2>{SENTENCE}</h2></body>"
        ))
        .unwrap();
        let f = filter();
        assert_eq!(
            f.decide(&doc, first_text_in(&doc, "bionic-font")),
            Decision::Reject(RejectReason::ReservedTag)
        );
        assert_eq!(
            f.decide(&doc, first_text_in(&doc, "code")),
            Decision::Reject(RejectReason::IgnoredTag)
        );
        assert_eq!(
            f.decide(&doc, first_text_in(&doc, "h2")),
            Decision::Reject(RejectReason::IgnoredTag)
        );
    }

    #[test]
    fn test_rejects_short_text() {
        let doc = parse_document("<body><p>  ok  </p></body>").unwrap();
        assert_eq!(
            filter().decide(&doc, first_text_in(&doc, "p")),
            Decision::Reject(RejectReason::TooShort)
        );
    }

    #[test]
    fn test_rejects_labels() {
        let doc = parse_document("<body><p>Submit form</p></body>").unwrap();
        assert_eq!(
            filter().decide(&doc, first_text_in(&doc, "p")),
            Decision::Reject(RejectReason::TooFewWords)
        );
    }

    #[test]
    fn test_check_words_thresholds() {
        let f = filter();
        // four words pass regardless of length
        assert!(f.check_words("a b c d"));
        // few words but enough letters pass
        assert!(f.check_words("internationalization considerations"));
        // few words and few letters fail
        assert!(!f.check_words("Sign in now"));
        // punctuation-glued tokens are not counted as words
        assert!(!f.check_words("one, two, three, four,"));
        assert!(!f.check_words("123 !@#"));
    }

    #[test]
    fn test_decorator_uses_its_own_text() {
        let doc = parse_document(&format!(
            "<body><p>Read <a>{SENTENCE}</a> today.</p><p>See <em>this one here now</em></p></body>"
        ))
        .unwrap();
        let f = filter();
        assert_eq!(f.decide(&doc, first_text_in(&doc, "a")), Decision::Accept);
        assert_eq!(f.decide(&doc, first_text_in(&doc, "em")), Decision::Accept);
    }

    #[test]
    fn test_rejects_sparse_decorator_context() {
        // the link's own text runs "delta" into "x," and keeps only three words
        let doc = parse_document("<body><p><a>alpha beta gamma delta<b>x,</b></a></p></body>").unwrap();
        let f = filter();
        let text = first_text_in(&doc, "a");
        assert!(f.check_words(doc.text(text).unwrap()));
        assert_eq!(
            f.decide(&doc, text),
            Decision::Reject(RejectReason::SparseDecoratorContext)
        );
    }

    #[test]
    fn test_rejects_far_offscreen_parent() {
        let mut body = String::from("<body>");
        for _ in 0..100 {
            body.push_str(&format!("<p>{SENTENCE}</p>"));
        }
        body.push_str("</body>");
        let mut doc = parse_document(&body).unwrap();
        doc.resize(400.0);
        let paragraphs = doc.elements_by_tag("p");
        let f = filter();

        let text_of = |doc: &Document, p: NodeId| doc.children(p)[0];
        // each paragraph is one 20px line; p[24] starts at 480, inside 400 + 100
        assert!(f.decide(&doc, text_of(&doc, paragraphs[24])).is_accept());
        assert_eq!(
            f.decide(&doc, text_of(&doc, paragraphs[26])),
            Decision::Reject(RejectReason::OffScreen)
        );

        doc.scroll_to(1000.0);
        assert_eq!(
            f.decide(&doc, text_of(&doc, paragraphs[0])),
            Decision::Reject(RejectReason::OffScreen)
        );
        assert!(f.decide(&doc, text_of(&doc, paragraphs[60])).is_accept());
    }
}
