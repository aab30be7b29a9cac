use std::fmt::{self, Write as _};

use crate::RadixMap;
use crate::node::{NodeIdx, Repr};

/// ASCII rendering of the whole tree:
///
/// ```text
/// "foobar"        compressed node
/// [abc]           branching node with three edges
/// [abc]=7         the node is a key holding 7 (=null for the null value)
/// []              a childless branching node
/// ```
///
/// Children of a multi-edge node go on indented `` `-(x) `` lines, `x`
/// being the edge byte; chains of single children stay on one line joined
/// by ` -> `:
///
/// ```text
/// [abc]
///  `-(a) "ladin" -> []=1
///  `-(b) [kj]
///  `-(c) []=2
/// ```
impl<V: fmt::Debug> fmt::Display for RadixMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.head, 0, 0)
    }
}

impl<V: fmt::Debug> RadixMap<V> {
    /// Print the [`Display`](fmt::Display) rendering of the tree to
    /// stdout, followed by a newline.
    pub fn show(&self) {
        println!("{self}");
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        idx: NodeIdx,
        level: usize,
        mut lpad: usize,
    ) -> fmt::Result {
        let node = &self.nodes[idx as usize];
        let mut label = String::new();
        match &node.repr {
            Repr::Compressed { bytes, .. } => {
                write!(label, "\"{}\"", bytes.escape_ascii())?;
            }
            Repr::Branch { edges, .. } => {
                write!(label, "[{}]", edges.escape_ascii())?;
            }
        }
        if node.iskey {
            match &node.value {
                Some(v) => write!(label, "={v:?}")?,
                None => label.push_str("=null"),
            }
        }
        f.write_str(&label)?;

        let numchildren = node.num_children();
        if level > 0 {
            lpad += if numchildren > 1 { 7 } else { 4 };
            if numchildren == 1 {
                lpad += label.len();
            }
        }
        match &node.repr {
            Repr::Compressed { child, .. } => {
                f.write_str(" -> ")?;
                self.fmt_node(f, *child, level + 1, lpad)?;
            }
            Repr::Branch { edges, children } => {
                if numchildren == 1 {
                    f.write_str(" -> ")?;
                    self.fmt_node(f, children[0], level + 1, lpad)?;
                } else {
                    for (edge, child) in edges.iter().zip(children) {
                        writeln!(f)?;
                        for _ in 0..lpad {
                            f.write_char(' ')?;
                        }
                        write!(f, " `-({}) ", edge.escape_ascii())?;
                        self.fmt_node(f, *child, level + 1, lpad)?;
                    }
                }
            }
        }
        Ok(())
    }
}
