use crate::app::domain::{Document, EXT_NAME, FONT_TAG, WORD_TAG};

/// What `ensure_style` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleWrite {
    Created,
    Updated,
    Unchanged,
}

pub fn style_rule(font_color: &str) -> String {
    format!("{WORD_TAG}>{FONT_TAG}{{font-weight:bold;color:{font_color}}}")
}

/// Make sure the single injected style element exists and carries the rule for `font_color`.
///
/// The rule text is only written when it differs from what is already there.
pub fn ensure_style(doc: &mut Document, font_color: &str) -> StyleWrite {
    let rule = style_rule(font_color);
    let (style_el, created) = match doc.element_by_id(EXT_NAME) {
        Some(el) => (el, false),
        None => {
            let head = doc.ensure_head();
            let el = doc.create_element("style");
            doc.set_attr(el, "id", EXT_NAME);
            doc.append_child(head, el);
            (el, true)
        }
    };

    if doc.text_content(style_el) == rule {
        return if created {
            StyleWrite::Created
        } else {
            StyleWrite::Unchanged
        };
    }
    doc.set_text_content(style_el, &rule);
    if created {
        StyleWrite::Created
    } else {
        StyleWrite::Updated
    }
}

/// Drop the injected style element. Returns whether one was present.
pub fn remove_style(doc: &mut Document) -> bool {
    match doc.element_by_id(EXT_NAME) {
        Some(el) => {
            doc.remove_node(el);
            true
        }
        None => false,
    }
}
