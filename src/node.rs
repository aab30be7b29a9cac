use arrayvec::ArrayVec;
use smallvec::{SmallVec, smallvec};

/// Longest inline byte string a compressed node can hold. Longer spans are
/// represented by chains of compressed nodes.
pub const NODE_MAX_SIZE: usize = 29;

/// Index of a node inside the tree's slab.
pub(crate) type NodeIdx = u32;

pub(crate) struct Node<V> {
    /// The path from the head down to this node spells a stored key.
    pub(crate) iskey: bool,
    /// `Some` iff `iskey` and the stored value is not the null value.
    pub(crate) value: Option<V>,
    pub(crate) repr: Repr,
}

/// The two node shapes. A branching node consumes one key byte per edge and
/// holds one child per edge byte; a compressed node consumes its whole
/// inline string and has exactly one child. Single-byte spans are stored as
/// one-edge branching nodes, the two layouts being equivalent at that
/// length.
pub(crate) enum Repr {
    Branch {
        /// Edge bytes, strictly ascending.
        edges: SmallVec<[u8; 4]>,
        /// One child per edge byte, parallel to `edges`.
        children: SmallVec<[NodeIdx; 4]>,
    },
    Compressed {
        bytes: ArrayVec<u8, NODE_MAX_SIZE>,
        child: NodeIdx,
    },
}

impl Repr {
    /// Node shape for a span of bytes followed by a single child: a
    /// compressed node, or the equivalent one-edge branching node when the
    /// span is a single byte.
    pub(crate) fn span(bytes: &[u8], child: NodeIdx) -> Self {
        debug_assert!(!bytes.is_empty() && bytes.len() <= NODE_MAX_SIZE);
        if bytes.len() == 1 {
            Repr::Branch {
                edges: smallvec![bytes[0]],
                children: smallvec![child],
            }
        } else {
            let mut inline = ArrayVec::new();
            inline
                .try_extend_from_slice(bytes)
                .expect("span fits NODE_MAX_SIZE");
            Repr::Compressed {
                bytes: inline,
                child,
            }
        }
    }

    fn empty() -> Self {
        Repr::Branch {
            edges: SmallVec::new(),
            children: SmallVec::new(),
        }
    }
}

impl<V> Node<V> {
    /// A childless branching node, not a key.
    pub(crate) fn empty() -> Self {
        Node {
            iskey: false,
            value: None,
            repr: Repr::empty(),
        }
    }

    pub(crate) fn is_compressed(&self) -> bool {
        matches!(self.repr, Repr::Compressed { .. })
    }

    pub(crate) fn num_children(&self) -> usize {
        match &self.repr {
            Repr::Branch { children, .. } => children.len(),
            Repr::Compressed { .. } => 1,
        }
    }

    /// Number of key bytes this node contributes to the path when walked
    /// through: the inline string length, or one byte per taken edge.
    pub(crate) fn span_len(&self) -> usize {
        match &self.repr {
            Repr::Compressed { bytes, .. } => bytes.len(),
            Repr::Branch { .. } => 1,
        }
    }

    /// Span bytes plus the single child, for nodes on a compressible chain
    /// (exactly one child).
    pub(crate) fn chain_part(&self) -> (&[u8], NodeIdx) {
        match &self.repr {
            Repr::Compressed { bytes, child } => (bytes.as_slice(), *child),
            Repr::Branch { edges, children } => {
                debug_assert_eq!(children.len(), 1);
                (edges.as_slice(), children[0])
            }
        }
    }

    /// Insert a new edge keeping the ascending order. The caller supplies
    /// the already-allocated child.
    pub(crate) fn add_edge(&mut self, byte: u8, child: NodeIdx) {
        let Repr::Branch { edges, children } = &mut self.repr else {
            unreachable!("edge insertion on a compressed node");
        };
        let pos = edges.iter().position(|&e| e > byte).unwrap_or(edges.len());
        edges.insert(pos, byte);
        children.insert(pos, child);
    }

    /// Detach the given child. A compressed parent degrades to an empty
    /// branching node; a branching parent closes the gap keeping the edge
    /// order.
    pub(crate) fn remove_child(&mut self, child: NodeIdx) {
        if self.is_compressed() {
            self.repr = Repr::empty();
            return;
        }
        let Repr::Branch { edges, children } = &mut self.repr else {
            unreachable!();
        };
        let pos = children
            .iter()
            .position(|&c| c == child)
            .expect("child is linked to its parent");
        edges.remove(pos);
        children.remove(pos);
    }
}
