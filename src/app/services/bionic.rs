use std::sync::LazyLock;

use quick_xml::escape::partial_escape;
use regex_lite::Regex;

use crate::app::domain::{BionicConfig, FONT_TAG};

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z][a-z0-9]+").expect("word pattern is valid"));

/// Turns raw text into markup whose words carry a bold prefix.
pub struct BionicTransformer {
    max_bold_letters: usize,
}

impl BionicTransformer {
    pub fn new(config: &BionicConfig) -> Self {
        Self {
            max_bold_letters: config.max_bold_letters,
        }
    }

    /// Length of the bold prefix for a word of `len` letters.
    pub fn bold_prefix_len(&self, len: usize) -> usize {
        self.max_bold_letters.min(len.div_ceil(2))
    }

    /// Markup for the inside of a wrapper element, or `None` if `text` has no words.
    ///
    /// Everything between words is copied through with `<`, `>` and `&` escaped.
    pub fn transform(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len() * 2);
        let mut last = 0;
        let mut words = 0usize;
        for m in WORD.find_iter(text) {
            out.push_str(&partial_escape(&text[last..m.start()]));
            // the pattern only matches ASCII, so byte offsets are char offsets
            let word = m.as_str();
            let (bold, rest) = word.split_at(self.bold_prefix_len(word.len()));
            out.push('<');
            out.push_str(FONT_TAG);
            out.push('>');
            out.push_str(bold);
            out.push_str("</");
            out.push_str(FONT_TAG);
            out.push('>');
            out.push_str(rest);
            last = m.end();
            words += 1;
        }
        if words == 0 {
            return None;
        }
        out.push_str(&partial_escape(&text[last..]));
        Some(out)
    }
}
