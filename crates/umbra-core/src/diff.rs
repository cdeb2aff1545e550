//! Structural diff between a candidate and the committed tree.
//!
//! The output is an ordered mutation list that a mounting layer applies one
//! by one. Indices in each mutation refer to the parent's child list as it is
//! at that point of the sequence, not to the final layout.
//!
//! Every removal in the transaction comes first, so a node moving to another
//! parent is unmounted before it is mounted again. After that, per parent:
//!
//! 1. moves and inserts, left to right, each placing a child directly after
//!    its new predecessor;
//! 2. updates and the children of kept nodes, recursively.
//!
//! Removals of one parent are ordered highest index first.
//!
//! Kept children on the longest increasing subsequence of their old
//! positions never move.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::{ShadowNode, SharedNode, Tag};

/// Parent tag used for mutations on the surface root itself.
pub const NO_PARENT: Tag = 0;

#[derive(Clone, Debug)]
pub enum Mutation {
    /// Mount `node` (without its children) at `index` under `parent`.
    Insert {
        parent: Tag,
        index: usize,
        node: SharedNode,
    },
    Remove {
        parent: Tag,
        index: usize,
        tag: Tag,
    },
    /// Same tag, new props, state or layout.
    Update { old: SharedNode, new: SharedNode },
    /// Take the child at `from`, then re-insert it at `to` in the shortened
    /// list.
    Move {
        parent: Tag,
        from: usize,
        to: usize,
        tag: Tag,
    },
}

impl Mutation {
    pub fn tag(&self) -> Tag {
        match self {
            Mutation::Insert { node, .. } => node.tag(),
            Mutation::Remove { tag, .. } | Mutation::Move { tag, .. } => *tag,
            Mutation::Update { new, .. } => new.tag(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Insert { .. } => "insert",
            Mutation::Remove { .. } => "remove",
            Mutation::Update { .. } => "update",
            Mutation::Move { .. } => "move",
        }
    }
}

/// Mutations turning `committed` into `candidate`.
pub fn diff(candidate: &SharedNode, committed: &SharedNode) -> Vec<Mutation> {
    let mut out = Vec::new();
    if candidate.tag() != committed.tag() {
        out.push(Mutation::Remove {
            parent: NO_PARENT,
            index: 0,
            tag: committed.tag(),
        });
        insert_subtree(NO_PARENT, 0, candidate, &mut out);
    } else {
        diff_node(committed, candidate, &mut out);
    }
    // removals only come from parents mounted before and after, so hoisting
    // them keeps every index valid
    let (mut out, rest): (Vec<_>, Vec<_>) = out
        .into_iter()
        .partition(|m| matches!(m, Mutation::Remove { .. }));
    out.extend(rest);
    for m in &out {
        log::trace!("{} {}", m.kind(), m.tag());
    }
    out
}

/// Mutations mounting `root` and its whole subtree into an empty surface.
pub fn mount_all(root: &SharedNode) -> Vec<Mutation> {
    let mut out = Vec::new();
    insert_subtree(NO_PARENT, 0, root, &mut out);
    out
}

fn insert_subtree(parent: Tag, index: usize, node: &SharedNode, out: &mut Vec<Mutation>) {
    out.push(Mutation::Insert {
        parent,
        index,
        node: node.clone(),
    });
    if node.traits().is_leaf() {
        return;
    }
    for (i, child) in node.children().iter().enumerate() {
        insert_subtree(node.tag(), i, child, out);
    }
}

fn diff_node(old: &SharedNode, new: &SharedNode, out: &mut Vec<Mutation>) {
    if Arc::ptr_eq(old, new) {
        return;
    }
    if !old.same_content(new) {
        out.push(Mutation::Update {
            old: old.clone(),
            new: new.clone(),
        });
    }
    if new.traits().is_leaf() || Arc::ptr_eq(old.shared_children(), new.shared_children()) {
        return;
    }
    diff_children(new, old.children(), new.children(), out);
}

fn diff_children(
    parent: &ShadowNode,
    old: &[SharedNode],
    new: &[SharedNode],
    out: &mut Vec<Mutation>,
) {
    let parent_tag = parent.tag();
    let new_tags: HashSet<Tag> = new.iter().map(|c| c.tag()).collect();

    for (index, child) in old.iter().enumerate().rev() {
        if !new_tags.contains(&child.tag()) {
            out.push(Mutation::Remove {
                parent: parent_tag,
                index,
                tag: child.tag(),
            });
        }
    }

    let mut working: SmallVec<[Tag; 16]> = old
        .iter()
        .map(|c| c.tag())
        .filter(|t| new_tags.contains(t))
        .collect();
    let old_pos: HashMap<Tag, usize> = working.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    let old_by_tag: HashMap<Tag, &SharedNode> = old.iter().map(|c| (c.tag(), c)).collect();

    let kept: Vec<Tag> = new
        .iter()
        .map(|c| c.tag())
        .filter(|t| old_pos.contains_key(t))
        .collect();
    let positions: Vec<usize> = kept.iter().map(|t| old_pos[t]).collect();
    let stable: HashSet<Tag> = longest_increasing_subsequence(&positions)
        .into_iter()
        .map(|i| kept[i])
        .collect();

    let mut previous: Option<Tag> = None;
    for child in new {
        let tag = child.tag();
        let target = |working: &[Tag]| match previous {
            Some(p) => working.iter().position(|t| *t == p).map_or(0, |i| i + 1),
            None => 0,
        };
        if !old_pos.contains_key(&tag) {
            let index = target(&working[..]);
            working.insert(index, tag);
            insert_subtree(parent_tag, index, child, out);
        } else if !stable.contains(&tag) {
            if let Some(from) = working.iter().position(|t| *t == tag) {
                working.remove(from);
                let to = target(&working[..]);
                working.insert(to, tag);
                if from != to {
                    out.push(Mutation::Move {
                        parent: parent_tag,
                        from,
                        to,
                        tag,
                    });
                }
            }
        }
        previous = Some(tag);
    }
    debug_assert!(working.iter().copied().eq(new.iter().map(|c| c.tag())));

    for child in new {
        if let Some(old_child) = old_by_tag.get(&child.tag()) {
            diff_node(old_child, child, out);
        }
    }
}

/// Indices (into `seq`) of one longest strictly increasing subsequence.
fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    // tails[k] is the index of the smallest tail of an increasing run of
    // length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];
    for (i, &value) in seq.iter().enumerate() {
        let k = tails.partition_point(|&t| seq[t] < value);
        if k > 0 {
            prev[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }
    let mut out = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        out.push(i);
        cursor = prev[i];
    }
    out.reverse();
    out
}
