//! # RadixMap
//!
//! A compressed (Patricia) radix tree keyed by arbitrary byte strings, with
//! ordered, seekable iteration.
//!
//! ## Features
//!
//! - **O(k) operations**: insert, find and remove run in O(k) time where k
//!   is the key length
//! - **Path compression**: chains of single-child nodes collapse into
//!   compressed nodes holding up to [`NODE_MAX_SIZE`] inline bytes
//! - **Ordered cursor**: bidirectional iteration in lexicographic byte
//!   order, with seek predicates (`==`, `>=`, `<=`, `>`, `<`, `^`, `$`)
//! - **Null values**: a key may be stored with the distinguished null
//!   value, kept apart from "key absent"
//!
//! ## Example
//!
//! ```rust
//! use radixmap::{RadixMap, SeekOp};
//!
//! let mut map = RadixMap::new();
//!
//! // Insert key-value pairs; the return value tells new from updated.
//! assert!(map.insert(b"romane", Some(1)));
//! assert!(map.insert(b"romulus", Some(2)));
//! assert!(map.insert(b"rubens", Some(3)));
//!
//! // Point lookup.
//! assert_eq!(map.find(b"romulus"), Some(Some(&2)));
//! assert_eq!(map.find(b"rom"), None);
//!
//! // Ordered iteration from a seek point.
//! let mut cursor = map.cursor();
//! cursor.seek(SeekOp::Ge, b"rom");
//! assert!(cursor.next());
//! assert_eq!(cursor.key(), b"romane");
//!
//! // Removal reports the old value.
//! assert_eq!(map.remove(b"romane"), Some(Some(1)));
//! assert_eq!(map.find(b"romane"), None);
//! ```
//!
//! Keys are raw `&[u8]` and every byte value is allowed, including the
//! empty key. Ordering treats bytes as unsigned and sorts a key before any
//! of its extensions.

mod iter;
mod node;
mod show;

pub use crate::iter::{Cursor, Entries, InvalidSeekOp, SeekOp};
pub use crate::node::NODE_MAX_SIZE;

use arrayvec::ArrayVec;
use slab::Slab;
use smallvec::SmallVec;

use crate::node::{Node, NodeIdx, Repr};

/// Stack of ancestor node indices kept while walking downward; inline up to
/// 32 entries before spilling to the heap.
pub(crate) type Trail = SmallVec<[NodeIdx; 32]>;

/// Where a downward walk stopped.
pub(crate) struct Walk {
    /// Number of key bytes consumed.
    pub(crate) matched: usize,
    /// The node the walk did not descend into.
    pub(crate) stop: NodeIdx,
    /// When the stop happened inside a compressed node's inline string, the
    /// index of the first unmatched byte; 0 when the walk stopped at a node
    /// boundary.
    pub(crate) split: usize,
}

/// A compressed radix tree mapping byte-string keys to values.
///
/// Nodes live in a slab arena addressed by `u32` indices; a node keeping
/// its index for its whole lifetime is what makes the in-place split and
/// merge rewrites below safe. The head node always exists, and is a key
/// exactly when the empty key is stored.
///
/// # Example
///
/// ```rust
/// use radixmap::RadixMap;
///
/// let mut map = RadixMap::new();
/// map.insert(b"key", Some("value"));
///
/// assert_eq!(map.find(b"key"), Some(Some(&"value")));
/// ```
pub struct RadixMap<V> {
    pub(crate) nodes: Slab<Node<V>>,
    pub(crate) head: NodeIdx,
    numele: usize,
}

impl<V> Default for RadixMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RadixMap<V> {
    /// Creates a new empty map.
    ///
    /// # Example
    ///
    /// ```rust
    /// use radixmap::RadixMap;
    ///
    /// let map: RadixMap<u64> = RadixMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        let mut nodes = Slab::with_capacity(64);
        let head = nodes.insert(Node::empty()) as NodeIdx;
        RadixMap {
            nodes,
            head,
            numele: 0,
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.numele
    }

    /// Whether no key is stored.
    pub fn is_empty(&self) -> bool {
        self.numele == 0
    }

    /// Number of allocated tree nodes, the head included. Useful to observe
    /// the effect of path compression.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every key and node, resetting the map to its freshly-created
    /// state.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = self.nodes.insert(Node::empty()) as NodeIdx;
        self.numele = 0;
    }

    fn alloc(&mut self, node: Node<V>) -> NodeIdx {
        self.nodes.insert(node) as NodeIdx
    }

    fn free(&mut self, idx: NodeIdx) -> Node<V> {
        self.nodes.remove(idx as usize)
    }

    /// Walk the tree following `key` as far as possible, without mutating
    /// anything. When `trail` is given, every node left while descending is
    /// pushed onto it, head first, so callers can later navigate upward.
    pub(crate) fn low_walk(&self, key: &[u8], mut trail: Option<&mut Trail>) -> Walk {
        let mut h = self.head;
        let mut i = 0;
        let mut split = 0;
        loop {
            match &self.nodes[h as usize].repr {
                Repr::Branch { edges, children } => {
                    if edges.is_empty() || i == key.len() {
                        break;
                    }
                    let Some(pos) = edges.iter().position(|&e| e == key[i]) else {
                        break;
                    };
                    if let Some(t) = trail.as_deref_mut() {
                        t.push(h);
                    }
                    i += 1;
                    h = children[pos];
                }
                Repr::Compressed { bytes, child } => {
                    let mut j = 0;
                    while j < bytes.len() && i < key.len() && bytes[j] == key[i] {
                        j += 1;
                        i += 1;
                    }
                    if j != bytes.len() {
                        split = j;
                        break;
                    }
                    if let Some(t) = trail.as_deref_mut() {
                        t.push(h);
                    }
                    h = *child;
                }
            }
        }
        Walk {
            matched: i,
            stop: h,
            split,
        }
    }

    /// Looks up `key`.
    ///
    /// The outer `Option` distinguishes presence: `None` means the key is
    /// absent, `Some(None)` means the key is stored with the null value,
    /// `Some(Some(v))` carries the value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use radixmap::RadixMap;
    ///
    /// let mut map = RadixMap::new();
    /// map.insert(b"hello", Some(7));
    /// map.insert(b"void", None);
    ///
    /// assert_eq!(map.find(b"hello"), Some(Some(&7)));
    /// assert_eq!(map.find(b"void"), Some(None));
    /// assert_eq!(map.find(b"missing"), None);
    /// ```
    pub fn find(&self, key: &[u8]) -> Option<Option<&V>> {
        let w = self.low_walk(key, None);
        let node = &self.nodes[w.stop as usize];
        if w.matched != key.len() || w.split != 0 || !node.iskey {
            return None;
        }
        Some(node.value.as_ref())
    }

    /// Whether `key` is stored, regardless of its value being null.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Inserts `key` with the given value (`None` stores the distinguished
    /// null value). Returns `true` when the key is new, `false` when an
    /// existing key was updated.
    ///
    /// # Example
    ///
    /// ```rust
    /// use radixmap::RadixMap;
    ///
    /// let mut map = RadixMap::new();
    /// assert!(map.insert(b"key", Some(1)));
    /// assert!(!map.insert(b"key", Some(2)));
    /// assert_eq!(map.find(b"key"), Some(Some(&2)));
    /// ```
    pub fn insert(&mut self, key: &[u8], value: Option<V>) -> bool {
        let Walk {
            matched,
            stop,
            split,
        } = self.low_walk(key, None);
        let mut h = stop;
        let mut i = matched;

        if matched == key.len() && split == 0 {
            // Landed exactly on a node: update the stored value, or turn
            // the node into a key.
            let node = &mut self.nodes[h as usize];
            let existed = node.iskey;
            node.iskey = true;
            node.value = value;
            if existed {
                return false;
            }
            self.numele += 1;
            return true;
        }

        if self.nodes[h as usize].is_compressed() {
            let (bytes, next) = match &self.nodes[h as usize].repr {
                Repr::Compressed { bytes, child } => (bytes.clone(), *child),
                Repr::Branch { .. } => unreachable!(),
            };
            if matched != key.len() {
                // The key diverges from the inline string at `split`. Break
                // the span around the diverging byte: a branch point takes
                // the span side now (the key side is appended below), and
                // the bytes after the diverging one move to a postfix span.
                let postfix = if split + 1 < bytes.len() {
                    self.alloc(Node {
                        iskey: false,
                        value: None,
                        repr: Repr::span(&bytes[split + 1..], next),
                    })
                } else {
                    next
                };
                if split == 0 {
                    // No shared prefix: this node itself becomes the branch
                    // point, keeping its key and value.
                    self.nodes[h as usize].repr = Repr::span(&bytes[..1], postfix);
                } else {
                    let branch = self.alloc(Node {
                        iskey: false,
                        value: None,
                        repr: Repr::span(&bytes[split..split + 1], postfix),
                    });
                    self.nodes[h as usize].repr = Repr::span(&bytes[..split], branch);
                    h = branch;
                }
                // Continue below with the unmatched key tail.
            } else {
                // The key ends inside the inline string: the new key lands
                // between the trimmed prefix and a postfix span carrying
                // the rest of the chain.
                let postfix = self.alloc(Node {
                    iskey: true,
                    value,
                    repr: Repr::span(&bytes[split..], next),
                });
                self.nodes[h as usize].repr = Repr::span(&bytes[..split], postfix);
                self.numele += 1;
                return true;
            }
        }

        // Append the unmatched key tail, compressing runs of fresh
        // single-child nodes into inline spans.
        while i < key.len() {
            let child = self.alloc(Node::empty());
            let node = &mut self.nodes[h as usize];
            let childless = matches!(&node.repr, Repr::Branch { edges, .. } if edges.is_empty());
            if childless && key.len() - i > 1 {
                let take = (key.len() - i).min(NODE_MAX_SIZE);
                node.repr = Repr::span(&key[i..i + take], child);
                i += take;
            } else {
                node.add_edge(key[i], child);
                i += 1;
            }
            h = child;
        }
        let node = &mut self.nodes[h as usize];
        debug_assert!(!node.iskey);
        node.iskey = true;
        node.value = value;
        self.numele += 1;
        true
    }

    /// Removes `key`. Returns the stored value when the key was present
    /// (`Some(None)` for the null value), `None` when it was absent.
    ///
    /// Chains of nodes that existed only to reach the removed key are
    /// pruned, and spans left with a lone child are merged back with their
    /// neighbors.
    ///
    /// # Example
    ///
    /// ```rust
    /// use radixmap::RadixMap;
    ///
    /// let mut map = RadixMap::new();
    /// map.insert(b"key", Some(1));
    ///
    /// assert_eq!(map.remove(b"key"), Some(Some(1)));
    /// assert_eq!(map.remove(b"key"), None);
    /// ```
    pub fn remove(&mut self, key: &[u8]) -> Option<Option<V>> {
        let mut trail = Trail::new();
        let w = self.low_walk(key, Some(&mut trail));
        let mut h = w.stop;
        if w.matched != key.len() || w.split != 0 || !self.nodes[h as usize].iskey {
            return None;
        }
        let node = &mut self.nodes[h as usize];
        node.iskey = false;
        let old = node.value.take();
        self.numele -= 1;

        let mut try_compress = false;
        if self.nodes[h as usize].num_children() == 0 {
            // The key sat on a leaf: free the chain of nodes that existed
            // only to reach it, up to the first ancestor still needed.
            let mut child = None;
            while h != self.head {
                child = Some(h);
                self.free(h);
                h = trail.pop().expect("trail reaches back to the head");
                let n = &self.nodes[h as usize];
                if n.iskey || (!n.is_compressed() && n.num_children() != 1) {
                    break;
                }
            }
            if let Some(child) = child {
                self.nodes[h as usize].remove_child(child);
                let n = &self.nodes[h as usize];
                if !n.iskey && !n.is_compressed() && n.num_children() == 1 {
                    try_compress = true;
                }
            }
        } else if self.nodes[h as usize].num_children() == 1 {
            // The key sat on a single-child node, which may now merge with
            // its neighbors.
            try_compress = true;
        }

        if try_compress {
            self.compress_chain(h, &mut trail);
        }
        Some(old)
    }

    /// Merge the maximal chain of single-child, non-key nodes around `h`
    /// into one compressed span, within the [`NODE_MAX_SIZE`] cap. `trail`
    /// must hold `h`'s ancestors.
    fn compress_chain(&mut self, mut h: NodeIdx, trail: &mut Trail) {
        // Climb to the topmost node that can join the merge.
        while let Some(p) = trail.pop() {
            let n = &self.nodes[p as usize];
            if n.iskey || (!n.is_compressed() && n.num_children() != 1) {
                break;
            }
            h = p;
        }

        // Collect the span downward, stopping at the first node that is a
        // key, branches out, or would overflow the cap.
        let mut bytes: ArrayVec<u8, NODE_MAX_SIZE> = ArrayVec::new();
        let (span, mut tail) = self.nodes[h as usize].chain_part();
        bytes
            .try_extend_from_slice(span)
            .expect("a single span fits NODE_MAX_SIZE");
        let mut merged: SmallVec<[NodeIdx; 8]> = SmallVec::new();
        loop {
            let n = &self.nodes[tail as usize];
            let joinable = !n.iskey
                && (n.is_compressed() || n.num_children() == 1)
                && bytes.len() + n.span_len() <= NODE_MAX_SIZE;
            if !joinable {
                break;
            }
            let (span, next) = n.chain_part();
            bytes
                .try_extend_from_slice(span)
                .expect("merged span stays within NODE_MAX_SIZE");
            merged.push(tail);
            tail = next;
        }
        if !merged.is_empty() {
            for idx in merged {
                self.free(idx);
            }
            self.nodes[h as usize].repr = Repr::span(&bytes, tail);
        }
    }

    /// Opens a cursor over this map. The cursor starts positioned nowhere;
    /// seek it first.
    ///
    /// # Example
    ///
    /// ```rust
    /// use radixmap::{RadixMap, SeekOp};
    ///
    /// let mut map = RadixMap::new();
    /// map.insert(b"a", Some(1));
    /// map.insert(b"b", Some(2));
    ///
    /// let mut cursor = map.cursor();
    /// cursor.seek(SeekOp::First, b"");
    /// assert!(cursor.next());
    /// assert_eq!(cursor.key(), b"a");
    /// assert!(cursor.next());
    /// assert_eq!(cursor.key(), b"b");
    /// assert!(!cursor.next());
    /// ```
    pub fn cursor(&self) -> Cursor<'_, V> {
        Cursor::new(self)
    }

    /// Iterates every `(key, value)` pair in ascending key order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use radixmap::RadixMap;
    ///
    /// let mut map = RadixMap::new();
    /// map.insert(b"b", Some(2));
    /// map.insert(b"a", Some(1));
    ///
    /// let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
    /// assert_eq!(keys, [b"a".to_vec(), b"b".to_vec()]);
    /// ```
    pub fn iter(&self) -> Entries<'_, V> {
        Entries::new(self)
    }
}
