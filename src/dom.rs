//! Retained node tree standing in for the browser DOM.
//!
//! The overlay pipeline renders into this arena instead of a real document.
//! Nodes are addressed by [`NodeId`]; removal tombstones the slot so stale
//! ids can be detected instead of silently resolving to a reused node.
//!
//! The tree also carries the two pieces of layout state the resize protocol
//! needs: a deterministic height model (base row height plus explicit media
//! heights and line breaks) and the container's scroll offset.

use std::collections::HashMap;

use crate::error::RenderError;

/// Base contribution of one rendered message row, in pixels.
pub const ROW_BASE_HEIGHT: u32 = 28;

/// Height contribution of an explicit line break inside a row.
pub const LINE_BREAK_HEIGHT: u32 = 18;

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node payload: an element with a tag, or a run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element { tag: String },
    Text { content: String },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    attrs: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    /// Explicit pixel height, set by the media resolver for loaded media.
    height: Option<u32>,
}

/// Arena-backed document tree.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    scroll_offset: u32,
}

impl Document {
    /// Create a document with an empty `body` root element.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            scroll_offset: 0,
        };
        let root = doc.alloc(Node {
            kind: NodeKind::Element {
                tag: "body".to_string(),
            },
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
            height: None,
        });
        doc.root = root;
        doc
    }

    /// The root element. Always attached.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, RenderError> {
        self.nodes
            .get(id.0)
            .and_then(|slot| slot.as_ref())
            .ok_or(RenderError::StaleNode(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, RenderError> {
        self.nodes
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or(RenderError::StaleNode(id.0))
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node {
            kind: NodeKind::Element {
                tag: tag.to_string(),
            },
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
            height: None,
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node {
            kind: NodeKind::Text {
                content: content.to_string(),
            },
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
            height: None,
        })
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RenderError> {
        self.node(parent)?;
        self.detach(child)?;
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Remove `id` from its parent's child list without destroying it.
    pub fn detach(&mut self, id: NodeId) -> Result<(), RenderError> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            let siblings = &mut self.node_mut(parent)?.children;
            siblings.retain(|&c| c != id);
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Remove a node and its whole subtree from the document.
    pub fn remove(&mut self, id: NodeId) -> Result<(), RenderError> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(|slot| slot.take()) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Remove every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<(), RenderError> {
        let children = self.node(parent)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Child node ids, in document order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], RenderError> {
        Ok(&self.node(id)?.children)
    }

    pub fn child_count(&self, id: NodeId) -> Result<usize, RenderError> {
        Ok(self.node(id)?.children.len())
    }

    /// Whether the node still exists and is connected to the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current.0).and_then(|slot| slot.as_ref()) {
                Some(node) => match node.parent {
                    Some(parent) => current = parent,
                    None => return false,
                },
                None => return false,
            }
        }
    }

    /// Element tag, or `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Result<Option<&str>, RenderError> {
        Ok(match &self.node(id)?.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            NodeKind::Text { .. } => None,
        })
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), RenderError> {
        let node = self.node_mut(id)?;
        if let Some(entry) = node.attrs.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value.to_string();
        } else {
            node.attrs.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Result<Option<&str>, RenderError> {
        Ok(self
            .node(id)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str()))
    }

    /// Pixel height reported by loaded media elements.
    pub fn set_explicit_height(&mut self, id: NodeId, height: u32) -> Result<(), RenderError> {
        self.node_mut(id)?.height = Some(height);
        Ok(())
    }

    /// Concatenated text content of the subtree, depth-first.
    pub fn text_content(&self, id: NodeId) -> Result<String, RenderError> {
        let mut out = String::new();
        self.collect_text(id, &mut out)?;
        Ok(out)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) -> Result<(), RenderError> {
        let node = self.node(id)?;
        if let NodeKind::Text { content } = &node.kind {
            out.push_str(content);
        }
        if matches!(&node.kind, NodeKind::Element { tag } if tag == "br") {
            out.push('\n');
        }
        for &child in &node.children {
            self.collect_text(child, out)?;
        }
        Ok(())
    }

    /// Find the first element whose `id` attribute matches `selector`
    /// (with or without a leading `#`).
    pub fn find_by_id(&self, selector: &str) -> Option<NodeId> {
        let wanted = selector.strip_prefix('#').unwrap_or(selector);
        (0..self.nodes.len()).map(NodeId).find(|&id| {
            self.attr(id, "id")
                .ok()
                .flatten()
                .is_some_and(|v| v == wanted)
        })
    }

    /// Rendered height of a container: one row per direct child, each
    /// contributing the base row height plus explicit media heights and
    /// line breaks in its subtree.
    pub fn measure_height(&self, container: NodeId) -> Result<u32, RenderError> {
        let mut total = 0u32;
        for &row in &self.node(container)?.children {
            total += ROW_BASE_HEIGHT + self.subtree_extra_height(row)?;
        }
        Ok(total)
    }

    fn subtree_extra_height(&self, id: NodeId) -> Result<u32, RenderError> {
        let node = self.node(id)?;
        let mut extra = node.height.unwrap_or(0);
        if matches!(&node.kind, NodeKind::Element { tag } if tag == "br") {
            extra += LINE_BREAK_HEIGHT;
        }
        for &child in &node.children {
            extra += self.subtree_extra_height(child)?;
        }
        Ok(extra)
    }

    /// Pin the scroll position to the bottom of `container`.
    pub fn scroll_to_bottom(&mut self, container: NodeId) -> Result<(), RenderError> {
        self.scroll_offset = self.measure_height(container)?;
        Ok(())
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    /// Attribute map of an element, for assertions and debug dumps.
    pub fn attrs(&self, id: NodeId) -> Result<HashMap<String, String>, RenderError> {
        Ok(self.node(id)?.attrs.iter().cloned().collect())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
