/// Host document surface: temporary nodes attached while a capture runs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Kind of temporary node the pipeline attaches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Off-screen report container positioned at `left` css px
    ReportContainer { width: u32, left: i32 },
    /// Synthetic download link
    Anchor { download: String },
}

pub trait Document: Send + Sync {
    fn attach(&self, kind: NodeKind) -> NodeId;
    fn detach(&self, id: NodeId);
    /// Nodes currently attached, in attachment order
    fn attached(&self) -> Vec<NodeId>;
}

/// Records attachments in memory; the default host for tests and the CLI
pub struct MemoryDocument {
    next_id: AtomicU64,
    nodes: Mutex<Vec<(NodeId, NodeKind)>>,
    history: Mutex<Vec<NodeKind>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        MemoryDocument {
            next_id: AtomicU64::new(1),
            nodes: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn attached_count(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    /// Every node ever attached, including ones already removed
    pub fn history(&self) -> Vec<NodeKind> {
        self.history.lock().unwrap().clone()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn attach(&self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.history.lock().unwrap().push(kind.clone());
        self.nodes.lock().unwrap().push((id, kind));
        id
    }

    fn detach(&self, id: NodeId) {
        self.nodes.lock().unwrap().retain(|(n, _)| *n != id);
    }

    fn attached(&self) -> Vec<NodeId> {
        self.nodes.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

/// A node attached for the lifetime of this guard.
///
/// Dropping the guard detaches the node, so every exit path (including
/// `?` propagation out of later stages) leaves the document clean.
pub struct AttachedNode<'d> {
    document: &'d dyn Document,
    id: NodeId,
}

impl<'d> AttachedNode<'d> {
    pub fn attach(document: &'d dyn Document, kind: NodeKind) -> Self {
        let id = document.attach(kind);
        log::debug!("attached temporary node {:?}", id);
        AttachedNode { document, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Drop for AttachedNode<'_> {
    fn drop(&mut self) {
        self.document.detach(self.id);
        log::debug!("detached temporary node {:?}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_detaches_on_drop() {
        let doc = MemoryDocument::new();
        {
            let a = AttachedNode::attach(&doc, NodeKind::ReportContainer { width: 850, left: -9999 });
            let b = AttachedNode::attach(&doc, NodeKind::Anchor { download: "x.png".into() });
            assert_eq!(doc.attached(), vec![a.id(), b.id()]);
        }
        assert_eq!(doc.attached_count(), 0);
        assert_eq!(doc.history().len(), 2);
    }

    #[test]
    fn guard_detaches_when_unwinding_through_error() {
        fn failing(doc: &MemoryDocument) -> Result<u32, String> {
            let _node = AttachedNode::attach(doc, NodeKind::ReportContainer { width: 10, left: 0 });
            let parsed: u32 = "not a number".parse().map_err(|_| "boom".to_string())?;
            Ok(parsed)
        }
        let doc = MemoryDocument::new();
        assert!(failing(&doc).is_err());
        assert_eq!(doc.attached_count(), 0);
    }
}
