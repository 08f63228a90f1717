use std::cell::RefCell;

use super::settings::LayoutMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Vertical extent of a node's box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    fn union(self, other: Rect) -> Rect {
        Rect {
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_top: 0.0,
            height: 800.0,
        }
    }
}

const BLOCK_TAGS: &[&str] = &[
    "html", "body", "address", "article", "aside", "blockquote", "dd", "details", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "template", "title", "meta", "link", "noscript",
];

/// In-memory document tree.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Removed nodes stay in the
/// arena detached from the tree, so ids collected before a mutation never dangle.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    doctype: Option<String>,
    viewport: Viewport,
    metrics: LayoutMetrics,
    layout: RefCell<Option<Vec<Rect>>>,
    mutations: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            doctype: None,
            viewport: Viewport::default(),
            metrics: LayoutMetrics::default(),
            layout: RefCell::new(None),
            mutations: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn set_doctype(&mut self, doctype: Option<String>) {
        self.doctype = doctype;
    }

    /// Number of mutating calls applied to the tree so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    // --- Node construction ---

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(data.into()))
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Comment(data.into()))
    }

    // --- Queries ---

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The containing element, or `None` for detached nodes and children of the document node.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.tag_name(*p).is_some())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Text(_))
    }

    /// Character data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(data) => Some(data.as_str()),
            _ => None,
        }
    }

    /// Concatenated character data of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.nodes[id.0].kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => data.clone(),
            _ => {
                let mut out = String::new();
                for node in self.descendants(id) {
                    if let NodeKind::Text(data) = &self.nodes[node.0].kind {
                        out.push_str(data);
                    }
                }
                out
            }
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => el
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Whether the node is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root()
    }

    /// Pre-order traversal of `root` and everything below it.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![root],
        }
    }

    /// In-order walk over the text nodes below `root` that `filter` accepts.
    pub fn text_walker<F>(&self, root: NodeId, filter: F) -> TextWalker<'_, F>
    where
        F: FnMut(&Document, NodeId) -> bool,
    {
        TextWalker {
            inner: self.descendants(root),
            filter,
        }
    }

    /// First element in document order (starting at `root`) matching `pred`.
    pub fn find_element<P>(&self, root: NodeId, mut pred: P) -> Option<NodeId>
    where
        P: FnMut(&Document, NodeId) -> bool,
    {
        self.descendants(root)
            .find(|id| self.tag_name(*id).is_some() && pred(self, *id))
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|id| self.tag_name(*id) == Some(tag))
            .collect()
    }

    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.find_element(self.root(), |doc, id| doc.attr(id, "id") == Some(value))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.find_element(self.root(), |doc, id| doc.tag_name(id) == Some("head"))
    }

    /// The `body` element, else the `html` element, else the document node.
    pub fn body(&self) -> NodeId {
        self.find_element(self.root(), |doc, id| doc.tag_name(id) == Some("body"))
            .or_else(|| self.find_element(self.root(), |doc, id| doc.tag_name(id) == Some("html")))
            .unwrap_or_else(|| self.root())
    }

    // --- Mutation ---

    fn touch(&mut self) {
        self.mutations += 1;
        self.layout.replace(None);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.touch();
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
        self.touch();
    }

    /// Put `new` where `old` is and detach `old`. Returns false if `old` has no parent.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.nodes[old.0].parent else {
            return false;
        };
        self.detach(new);
        let Some(index) = self.nodes[parent.0].children.iter().position(|c| *c == old) else {
            return false;
        };
        self.nodes[parent.0].children[index] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        self.touch();
        true
    }

    pub fn remove_node(&mut self, id: NodeId) {
        if self.nodes[id.0].parent.is_some() {
            self.detach(id);
            self.touch();
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element(el) = &mut self.nodes[id.0].kind {
            let value = value.into();
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value,
                None => el.attrs.push((name.to_string(), value)),
            }
            self.touch();
        }
    }

    /// Replace an element's children with a single text node, or a text node's data.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => {
                *data = text.to_string();
            }
            _ => {
                let old_children = std::mem::take(&mut self.nodes[id.0].children);
                for child in old_children {
                    self.nodes[child.0].parent = None;
                }
                if !text.is_empty() {
                    let node = self.create_text(text);
                    self.nodes[node.0].parent = Some(id);
                    self.nodes[id.0].children.push(node);
                }
            }
        }
        self.touch();
    }

    /// The `head` element, created under `html` (or the document node) if missing.
    pub fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head() {
            return head;
        }
        let host = self
            .find_element(self.root(), |doc, id| doc.tag_name(id) == Some("html"))
            .unwrap_or_else(|| self.root());
        let head = self.create_element("head");
        self.prepend_child(host, head);
        head
    }

    // --- Viewport and layout ---

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn client_height(&self) -> f64 {
        self.viewport.height
    }

    pub fn scroll_to(&mut self, top: f64) {
        self.viewport.scroll_top = top.max(0.0);
    }

    pub fn resize(&mut self, height: f64) {
        self.viewport.height = height.max(0.0);
    }

    pub fn set_layout_metrics(&mut self, metrics: LayoutMetrics) {
        self.metrics = metrics;
        self.layout.replace(None);
    }

    /// Box of `id` relative to the top of the viewport.
    pub fn bounding_rect(&self, id: NodeId) -> Rect {
        let mut cache = self.layout.borrow_mut();
        let rects = cache.get_or_insert_with(|| self.compute_layout());
        let rect = rects.get(id.0).copied().unwrap_or_default();
        Rect {
            top: rect.top - self.viewport.scroll_top,
            bottom: rect.bottom - self.viewport.scroll_top,
        }
    }

    fn compute_layout(&self) -> Vec<Rect> {
        let mut flow = Flow {
            y: 0.0,
            run_chars: 0,
            run_members: Vec::new(),
            metrics: self.metrics,
        };
        let mut rects: Vec<Option<Rect>> = vec![None; self.nodes.len()];
        let mut work = vec![LayoutStep::Visit(self.root())];
        while let Some(step) = work.pop() {
            match step {
                LayoutStep::Visit(id) => self.layout_node(id, &mut flow, &mut rects, &mut work),
                LayoutStep::EndBlock { id, top } => {
                    flow.flush(&mut rects);
                    rects[id.0] = Some(Rect { top, bottom: flow.y });
                }
            }
        }
        flow.flush(&mut rects);
        rects.into_iter().map(Option::unwrap_or_default).collect()
    }

    fn layout_node(&self, id: NodeId, flow: &mut Flow, rects: &mut [Option<Rect>], work: &mut Vec<LayoutStep>) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(data) => {
                flow.run_chars += data.split_whitespace().map(|w| w.chars().count() + 1).sum::<usize>();
                flow.run_members.push(id);
            }
            NodeKind::Comment(_) => {
                rects[id.0] = Some(Rect { top: flow.y, bottom: flow.y });
            }
            NodeKind::Document => self.begin_block(id, flow, rects, work),
            NodeKind::Element(el) => {
                let tag = el.tag.as_str();
                if HIDDEN_TAGS.contains(&tag) {
                    let collapsed = Rect { top: flow.y, bottom: flow.y };
                    for node in self.descendants(id) {
                        rects[node.0] = Some(collapsed);
                    }
                } else if tag == "br" {
                    flow.run_members.push(id);
                    flow.flush(rects);
                } else if BLOCK_TAGS.contains(&tag) {
                    self.begin_block(id, flow, rects, work);
                } else {
                    flow.run_members.push(id);
                    self.visit_children(id, work);
                }
            }
        }
    }

    fn begin_block(&self, id: NodeId, flow: &mut Flow, rects: &mut [Option<Rect>], work: &mut Vec<LayoutStep>) {
        flow.flush(rects);
        work.push(LayoutStep::EndBlock { id, top: flow.y });
        self.visit_children(id, work);
    }

    fn visit_children(&self, id: NodeId, work: &mut Vec<LayoutStep>) {
        work.extend(self.nodes[id.0].children.iter().rev().map(|&child| LayoutStep::Visit(child)));
    }
}

/// Pending layout work; blocks close after all their children are laid out.
enum LayoutStep {
    Visit(NodeId),
    EndBlock { id: NodeId, top: f64 },
}

/// Inline formatting state: members of the current run share its line boxes.
struct Flow {
    y: f64,
    run_chars: usize,
    run_members: Vec<NodeId>,
    metrics: LayoutMetrics,
}

impl Flow {
    fn flush(&mut self, rects: &mut [Option<Rect>]) {
        if self.run_members.is_empty() {
            return;
        }
        let lines = self.run_chars.div_ceil(self.metrics.chars_per_line.max(1));
        let rect = Rect {
            top: self.y,
            bottom: self.y + lines as f64 * self.metrics.line_height,
        };
        for member in self.run_members.drain(..) {
            let slot = &mut rects[member.0];
            *slot = Some(match *slot {
                Some(existing) => existing.union(rect),
                None => rect,
            });
        }
        self.y = rect.bottom;
        self.run_chars = 0;
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.nodes[id.0].children.iter().rev().copied());
        Some(id)
    }
}

pub struct TextWalker<'a, F> {
    inner: Descendants<'a>,
    filter: F,
}

impl<F> Iterator for TextWalker<'_, F>
where
    F: FnMut(&Document, NodeId) -> bool,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let doc = self.inner.doc;
        self.inner
            .by_ref()
            .find(|id| doc.is_text(*id) && (self.filter)(doc, *id))
    }
}
