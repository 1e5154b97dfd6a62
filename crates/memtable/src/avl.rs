//! AVL tree keyed by raw byte order.
//!
//! Each node exclusively owns its children (`Option<Box<Node>>`), so every
//! rotation is a move of boxes with no shared references. After every insert
//! and remove, `|height(left) - height(right)| <= 1` holds at every node, with
//! `height(None) = 0`.

use std::cmp::Ordering;

use crate::Record;

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    record: Record,
    height: usize,
    left: Link,
    right: Link,
}

impl Node {
    fn new(record: Record) -> Self {
        Self {
            record,
            height: 1,
            left: None,
            right: None,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height(link: &Link) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Restores the height and balance of `node`, whose subtrees are already
/// balanced and differ in height by at most 2.
fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let bf = node.balance_factor();

    if bf > 1 {
        // left-right case
        if node.left.as_ref().map_or(0, |l| l.balance_factor()) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if bf < -1 {
        // right-left case
        if node.right.as_ref().map_or(0, |r| r.balance_factor()) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

fn insert_node(link: Link, record: Record, replaced: &mut Option<Record>) -> Box<Node> {
    let mut node = match link {
        Some(node) => node,
        None => return Box::new(Node::new(record)),
    };

    match record.key.as_slice().cmp(node.record.key.as_slice()) {
        Ordering::Less => node.left = Some(insert_node(node.left.take(), record, replaced)),
        Ordering::Greater => node.right = Some(insert_node(node.right.take(), record, replaced)),
        Ordering::Equal => {
            // Overwrite in place; the shape does not change.
            *replaced = Some(std::mem::replace(&mut node.record, record));
            return node;
        }
    }

    rebalance(node)
}

/// Detaches the minimum node of the subtree, returning the rebalanced rest
/// and the detached record.
fn take_min(mut node: Box<Node>) -> (Link, Record) {
    match node.left.take() {
        None => {
            let Node { record, right, .. } = *node;
            (right, record)
        }
        Some(left) => {
            let (left, min) = take_min(left);
            node.left = left;
            (Some(rebalance(node)), min)
        }
    }
}

fn remove_node(link: Link, key: &[u8], removed: &mut Option<Record>) -> Link {
    let mut node = link?;

    match key.cmp(node.record.key.as_slice()) {
        Ordering::Less => node.left = remove_node(node.left.take(), key, removed),
        Ordering::Greater => node.right = remove_node(node.right.take(), key, removed),
        Ordering::Equal => {
            let Node {
                record,
                left,
                right,
                ..
            } = *node;
            match (left, right) {
                (None, None) => {
                    *removed = Some(record);
                    return None;
                }
                (Some(child), None) | (None, Some(child)) => {
                    *removed = Some(record);
                    return Some(child);
                }
                (Some(left), Some(right)) => {
                    // Two children: the in-order successor takes this slot.
                    let (right, successor) = take_min(right);
                    *removed = Some(record);
                    node = Box::new(Node {
                        record: successor,
                        height: 1,
                        left: Some(left),
                        right,
                    });
                }
            }
        }
    }

    Some(rebalance(node))
}

/// A self-balancing binary search tree of [`Record`]s, unique by key.
#[derive(Debug, Default)]
pub struct AvlTree {
    root: Link,
    len: usize,
}

impl AvlTree {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Inserts `record`, returning the record it replaced if the key was
    /// already present.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        let mut replaced = None;
        self.root = Some(insert_node(self.root.take(), record, &mut replaced));
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    /// Removes the node for `key`, returning its record.
    pub fn remove(&mut self, key: &[u8]) -> Option<Record> {
        let mut removed = None;
        self.root = remove_node(self.root.take(), key, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Exact-match lookup.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&Record> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            cur = match key.cmp(node.record.key.as_slice()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.record),
            };
        }
        None
    }

    /// In-order (ascending key) iterator.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree (0 when empty).
    #[must_use]
    pub fn height(&self) -> usize {
        height(&self.root)
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Checks ordering, cached heights, and the balance bound at every node.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> bool {
        fn walk(link: &Link, lo: Option<&[u8]>, hi: Option<&[u8]>) -> Option<usize> {
            let Some(node) = link else {
                return Some(0);
            };
            let key = node.record.key.as_slice();
            if lo.is_some_and(|lo| key <= lo) || hi.is_some_and(|hi| key >= hi) {
                return None;
            }
            let l = walk(&node.left, lo, Some(key))?;
            let r = walk(&node.right, Some(key), hi)?;
            if l.abs_diff(r) > 1 || node.height != 1 + l.max(r) {
                return None;
            }
            Some(node.height)
        }
        walk(&self.root, None, None).is_some()
    }
}

/// Ascending iterator over an [`AvlTree`].
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn push_left(&mut self, mut node: Option<&'a Node>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(&node.record)
    }
}
