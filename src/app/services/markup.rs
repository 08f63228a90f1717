//! HTML loading and serialization for the arena document.
//!
//! Parsing is lenient in the ways real pages need: void elements without a closing
//! slash, stray or mismatched end tags, omitted `</p>` and `</li>`, HTML named entities,
//! valueless attributes, and script or style bodies that are not well-formed XML.

use std::borrow::Cow;

use pulldown_cmark::{Options, Parser, html};
use quick_xml::escape::{escape, partial_escape, resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::app::domain::{Document, NodeId, NodeKind};
use crate::app::infrastructure::error::{BionicError, Result};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Start tags that end an open `<p>`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements an implied end tag never reaches past.
const SCOPE_BOUNDARIES: &[&str] = &[
    "html", "table", "td", "th", "caption", "template", "button", "object", "marquee", "applet",
];

/// Parse a whole page.
pub fn parse_document(markup: &str) -> Result<Document> {
    let mut doc = Document::new();
    let root = doc.root();
    parse_into(&mut doc, root, markup)?;
    Ok(doc)
}

/// Parse `markup` and append the resulting nodes to `parent` (`innerHTML +=`).
pub fn parse_fragment(doc: &mut Document, parent: NodeId, markup: &str) -> Result<()> {
    parse_into(doc, parent, markup)
}

fn parse_into(doc: &mut Document, parent: NodeId, markup: &str) -> Result<()> {
    let mut builder = TreeBuilder {
        doc,
        host: parent,
        stack: vec![parent],
    };
    let mut rest = markup;
    let mut offset = 0u64;
    // script and style bodies never reach the XML reader
    while let Some(raw) = find_raw_text(rest) {
        builder.feed(&rest[..raw.content_start], offset)?;
        builder.push_text(&rest[raw.content_start..raw.content_end]);
        builder.close_raw_text(raw.tag);
        offset += raw.resume as u64;
        rest = &rest[raw.resume..];
    }
    builder.feed(rest, offset)
}

/// Open-element stack over the arena; `stack[0]` is the host and is never popped.
struct TreeBuilder<'d> {
    doc: &'d mut Document,
    host: NodeId,
    stack: Vec<NodeId>,
}

impl TreeBuilder<'_> {
    fn top(&self) -> NodeId {
        *self.stack.last().unwrap_or(&self.host)
    }

    fn feed(&mut self, markup: &str, offset: u64) -> Result<()> {
        let markup = escape_stray_lt(markup);
        let mut reader = Reader::from_str(&markup);
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = false;
        reader.config_mut().allow_unmatched_ends = true;
        reader.config_mut().allow_dangling_amp = true;

        loop {
            let position = offset + reader.buffer_position();
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let (el, tag) = element_from_start(self.doc, &reader, &e, position)?;
                    self.open(el, &tag, !VOID_TAGS.contains(&tag.as_str()));
                }
                Ok(Event::Empty(e)) => {
                    // a self-closing slash does not end a script or style
                    let (el, tag) = element_from_start(self.doc, &reader, &e, position)?;
                    self.open(el, &tag, RAW_TEXT_TAGS.contains(&tag.as_str()));
                }
                Ok(Event::End(e)) => {
                    let tag = decode_tag_name(&reader, e.name().as_ref(), position)?;
                    let open = self
                        .stack
                        .iter()
                        .enumerate()
                        .skip(1)
                        .rev()
                        .find(|(_, id)| self.doc.tag_name(**id) == Some(tag.as_str()))
                        .map(|(depth, _)| depth);
                    if let Some(depth) = open {
                        self.stack.truncate(depth);
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .decode()
                        .map_err(|err| BionicError::markup(position, format!("text decode: {err}")))?;
                    self.push_text(&text);
                }
                Ok(Event::CData(e)) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|err| BionicError::markup(position, format!("cdata decode: {err}")))?;
                    self.push_text(&text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = e
                        .decode()
                        .map_err(|err| BionicError::markup(position, format!("entity decode: {err}")))?;
                    let raw = format!("&{name};");
                    // unknown entities stay literal, as browsers render them
                    let resolved = unescape_with(&raw, resolve_html5_entity)
                        .map(|s| s.into_owned())
                        .unwrap_or(raw);
                    self.push_text(&resolved);
                }
                Ok(Event::Comment(e)) => {
                    let text = e
                        .decode()
                        .map_err(|err| BionicError::markup(position, format!("comment decode: {err}")))?;
                    let comment = self.doc.create_comment(text.into_owned());
                    let top = self.top();
                    self.doc.append_child(top, comment);
                }
                Ok(Event::DocType(e)) => {
                    if self.host == self.doc.root() {
                        let text = e.decode().map_err(|err| {
                            BionicError::markup(position, format!("doctype decode: {err}"))
                        })?;
                        self.doc.set_doctype(Some(text.trim().to_string()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => return Err(BionicError::markup(position, err.to_string())),
            }
        }
        Ok(())
    }

    fn open(&mut self, el: NodeId, tag: &str, push: bool) {
        self.close_implied(tag);
        let top = self.top();
        self.doc.append_child(top, el);
        if push {
            self.stack.push(el);
        }
    }

    /// End tags HTML lets authors omit: `<li>` ends the previous item, a block ends a `<p>`.
    fn close_implied(&mut self, tag: &str) {
        match tag {
            "li" => self.close_nearest(&["li"], &["ul", "ol", "menu"]),
            "dt" | "dd" => self.close_nearest(&["dt", "dd"], &["dl"]),
            "option" => self.close_nearest(&["option"], &["select", "datalist", "optgroup"]),
            _ => {}
        }
        if CLOSES_P.contains(&tag) {
            self.close_nearest(&["p"], &[]);
        }
    }

    fn close_nearest(&mut self, targets: &[&str], boundaries: &[&str]) {
        for depth in (1..self.stack.len()).rev() {
            let open = self.doc.tag_name(self.stack[depth]).unwrap_or_default();
            if targets.contains(&open) {
                self.stack.truncate(depth);
                return;
            }
            if boundaries.contains(&open) || SCOPE_BOUNDARIES.contains(&open) {
                return;
            }
        }
    }

    fn close_raw_text(&mut self, tag: &str) {
        if self.stack.len() > 1 && self.doc.tag_name(self.top()) == Some(tag) {
            self.stack.pop();
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.top();
        // entity references arrive as separate events; keep one text node per run
        if let Some(&last) = self.doc.children(parent).last() {
            if let Some(existing) = self.doc.text(last) {
                let merged = format!("{existing}{text}");
                self.doc.set_text_content(last, &merged);
                return;
            }
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }
}

/// Byte offsets of one script or style element inside a chunk of markup.
struct RawText {
    tag: &'static str,
    content_start: usize,
    content_end: usize,
    /// First byte after the closing tag.
    resume: usize,
}

fn find_raw_text(markup: &str) -> Option<RawText> {
    let mut from = 0;
    while let Some(found) = markup[from..].find('<') {
        let at = from + found;
        let rest = &markup[at..];
        if rest.starts_with("<!--") {
            from = rest.find("-->").map_or(markup.len(), |end| at + end + 3);
            continue;
        }
        if let Some(tag) = RAW_TEXT_TAGS.iter().copied().find(|t| starts_with_tag(&rest[1..], t)) {
            let name_end = at + 1 + tag.len();
            let content_start = name_end + start_tag_len(&markup[name_end..])?;
            let (content_end, resume) = find_close_tag(markup, content_start, tag);
            return Some(RawText {
                tag,
                content_start,
                content_end,
                resume,
            });
        }
        from = at + 1;
    }
    None
}

/// Whether `s` opens with tag name `name`, compared ASCII case-insensitively.
fn starts_with_tag(s: &str, name: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= name.len()
        && bytes[..name.len()].eq_ignore_ascii_case(name.as_bytes())
        && bytes
            .get(name.len())
            .is_none_or(|&b| b.is_ascii_whitespace() || matches!(b, b'/' | b'>'))
}

/// Length up to and including the `>` that ends a start tag, skipping quoted values.
fn start_tag_len(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in s.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i + 1),
            None => {}
        }
    }
    None
}

/// `(content_end, resume)` for the first `</tag` at or after `from`; an unclosed
/// element runs to the end of the input.
fn find_close_tag(markup: &str, from: usize, tag: &str) -> (usize, usize) {
    let mut search = from;
    while let Some(found) = markup[search..].find("</") {
        let at = search + found;
        if starts_with_tag(&markup[at + 2..], tag) {
            let resume = markup[at..].find('>').map_or(markup.len(), |end| at + end + 1);
            return (at, resume);
        }
        search = at + 2;
    }
    (markup.len(), markup.len())
}

/// Turn every `<` that cannot start a tag into `&lt;`, as an HTML tokenizer reads it.
fn escape_stray_lt(markup: &str) -> Cow<'_, str> {
    let bytes = markup.as_bytes();
    let mut out = String::new();
    let mut copied = 0;
    let mut from = 0;
    while let Some(found) = markup[from..].find('<') {
        let at = from + found;
        if markup[at..].starts_with("<!--") {
            from = markup[at..].find("-->").map_or(markup.len(), |end| at + end + 3);
            continue;
        }
        let opens_tag = bytes
            .get(at + 1)
            .is_some_and(|&b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'));
        if !opens_tag {
            out.push_str(&markup[copied..at]);
            out.push_str("&lt;");
            copied = at + 1;
        }
        from = at + 1;
    }
    if copied == 0 {
        return Cow::Borrowed(markup);
    }
    out.push_str(&markup[copied..]);
    Cow::Owned(out)
}

fn decode_tag_name(reader: &Reader<&[u8]>, raw: &[u8], position: u64) -> Result<String> {
    let decoded = reader
        .decoder()
        .decode(raw)
        .map_err(|err| BionicError::markup(position, format!("tag name decode: {err}")))?;
    Ok(decoded.to_ascii_lowercase())
}

fn element_from_start(
    doc: &mut Document,
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    position: u64,
) -> Result<(NodeId, String)> {
    let tag = decode_tag_name(reader, e.name().as_ref(), position)?;
    let el = doc.create_element(&tag);
    for attr in e.html_attributes().flatten() {
        let key = match reader.decoder().decode(attr.key.as_ref()) {
            Ok(v) => v.to_ascii_lowercase(),
            Err(_) => continue,
        };
        let raw = match reader.decoder().decode(&attr.value) {
            Ok(v) => v.into_owned(),
            Err(_) => continue,
        };
        let value = unescape_with(&raw, resolve_html5_entity)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        doc.set_attr(el, &key, value);
    }
    Ok((el, tag))
}

/// Serialize the whole document, doctype included.
pub fn serialize_document(doc: &Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = doc.doctype() {
        out.push_str("<!DOCTYPE ");
        out.push_str(doctype);
        out.push('>');
    }
    write_node(doc, doc.root(), &mut out);
    out
}

enum WriteStep {
    Open { id: NodeId, raw_text: bool },
    Close(NodeId),
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    let mut work = vec![WriteStep::Open { id, raw_text: false }];
    while let Some(step) = work.pop() {
        let (id, raw_text) = match step {
            WriteStep::Close(id) => {
                out.push_str("</");
                out.push_str(doc.tag_name(id).unwrap_or_default());
                out.push('>');
                continue;
            }
            WriteStep::Open { id, raw_text } => (id, raw_text),
        };
        match doc.kind(id) {
            NodeKind::Document => {
                work.extend(
                    doc.children(id)
                        .iter()
                        .rev()
                        .map(|&child| WriteStep::Open { id: child, raw_text: false }),
                );
            }
            NodeKind::Text(data) => {
                if raw_text {
                    out.push_str(data);
                } else {
                    out.push_str(&partial_escape(data.as_str()));
                }
            }
            NodeKind::Comment(data) => {
                out.push_str("<!--");
                out.push_str(data);
                out.push_str("-->");
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (key, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape(value.as_str()));
                    out.push('"');
                }
                let children = doc.children(id);
                if children.is_empty() && VOID_TAGS.contains(&el.tag.as_str()) {
                    out.push_str(" />");
                    continue;
                }
                out.push('>');
                let raw = RAW_TEXT_TAGS.contains(&el.tag.as_str());
                work.push(WriteStep::Close(id));
                work.extend(
                    children
                        .iter()
                        .rev()
                        .map(|&child| WriteStep::Open { id: child, raw_text: raw }),
                );
            }
        }
    }
}

/// Render markdown to a standalone page whose body holds a single `<article>`.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    format!("<html><head></head><body><article>{html_output}</article></body></html>")
}

/// Check if a file path points to a markdown file.
pub fn is_markdown_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown") || lower.ends_with(".mdown")
}
