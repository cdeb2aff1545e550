//! Committed and candidate shadow trees.
//!
//! Trees own their nodes through `Arc`s only: there are no parent pointers.
//! "Find the parent" is a traversal on candidates and a side-index lookup on
//! committed trees.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    LayoutConstraints, NodeFragment, Props, Rect, Result, ShadowNode, SharedNode, StateUpdate, Tag, UmbraError,
    Vec2,
};

/// Monotonic version tag of a tree.
pub type Generation = u64;

#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexEntry {
    parent: Option<Tag>,
    absolute: Rect,
}

/// The committed snapshot. Immutable; replaced wholesale by a commit.
#[derive(Debug)]
pub struct ShadowTree {
    generation: Generation,
    root: SharedNode,
    index: HashMap<Tag, IndexEntry>,
    constraints: Option<LayoutConstraints>,
}

impl ShadowTree {
    pub fn new(root: SharedNode, generation: Generation) -> Self {
        let mut index = HashMap::new();
        fn walk(
            node: &SharedNode,
            parent: Option<Tag>,
            origin: Vec2,
            index: &mut HashMap<Tag, IndexEntry>,
        ) {
            let absolute = node.layout().frame.offset(origin);
            index.insert(node.tag(), IndexEntry { parent, absolute });
            if node.traits().is_leaf() {
                return;
            }
            for child in node.children() {
                walk(child, Some(node.tag()), absolute.origin(), index);
            }
        }
        walk(&root, None, Vec2::default(), &mut index);
        Self {
            generation,
            root,
            index,
            constraints: None,
        }
    }

    /// Records the constraints the root was laid out under.
    pub fn with_constraints(mut self, constraints: Option<LayoutConstraints>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn constraints(&self) -> Option<LayoutConstraints> {
        self.constraints
    }

    pub fn root(&self) -> &SharedNode {
        &self.root
    }

    /// Frame of `tag` in surface coordinates.
    pub fn absolute_frame(&self, tag: Tag) -> Option<Rect> {
        self.index.get(&tag).map(|e| e.absolute)
    }

    pub fn parent_of(&self, tag: Tag) -> Option<Tag> {
        self.index.get(&tag).and_then(|e| e.parent)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.index.contains_key(&tag)
    }

    /// Number of nodes reachable without entering leaf content.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn find(&self, tag: Tag) -> Option<SharedNode> {
        find_in(&self.root, tag)
    }
}

/// Mutable working tree for one render pass.
#[derive(Clone, Debug)]
pub struct CandidateTree {
    generation: Generation,
    base_generation: Generation,
    root: SharedNode,
    constraints: Option<LayoutConstraints>,
}

impl CandidateTree {
    pub fn new(root: SharedNode, generation: Generation, base_generation: Generation) -> Self {
        Self {
            generation,
            base_generation,
            root,
            constraints: None,
        }
    }

    /// Candidate whose root is a shallow clone of the committed root; all
    /// children are shared.
    pub fn from_committed(committed: &ShadowTree, generation: Generation) -> Self {
        let root = Arc::new(committed.root().clone_with(NodeFragment::default()));
        Self::new(root, generation, committed.generation())
            .laid_out_with(committed.constraints())
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Committed generation this candidate was derived from.
    pub fn base_generation(&self) -> Generation {
        self.base_generation
    }

    pub fn root(&self) -> &SharedNode {
        &self.root
    }

    /// Constraints of the last layout pass over this tree's nodes; `None`
    /// until one ran. Clean nodes are only valid under these.
    pub fn constraints(&self) -> Option<LayoutConstraints> {
        self.constraints
    }

    pub fn laid_out_with(mut self, constraints: Option<LayoutConstraints>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Swaps in a root produced outside the tree API (the layout engine).
    pub fn with_root(mut self, root: SharedNode) -> Self {
        self.root = root;
        self
    }

    pub fn find(&self, tag: Tag) -> Option<SharedNode> {
        find_in(&self.root, tag)
    }

    pub fn parent_of(&self, tag: Tag) -> Option<SharedNode> {
        let path = path_to(&self.root, tag)?;
        let (_, parent_path) = path.split_last()?;
        let mut node = &self.root;
        for &i in parent_path {
            node = &node.children()[i];
        }
        Some(node.clone())
    }

    /// Rebuilds the root-to-`tag` path with `f` applied to the target; every
    /// ancestor on the path is re-cloned and marked layout-dirty. Siblings off
    /// the path are shared.
    pub fn update_node(
        &mut self,
        tag: Tag,
        f: impl FnOnce(&ShadowNode) -> Result<ShadowNode>,
    ) -> Result<SharedNode> {
        let path = path_to(&self.root, tag).ok_or(UmbraError::NodeNotFound(tag))?;
        let mut updated = None;
        let root = rebuild(&self.root, &path, |n| {
            let new = Arc::new(f(n)?);
            updated = Some(new.clone());
            Ok(new)
        })?;
        self.root = root;
        updated.ok_or(UmbraError::NodeNotFound(tag))
    }

    pub fn clone_node_with_props(&mut self, tag: Tag, props: Props) -> Result<SharedNode> {
        self.update_node(tag, |n| Ok(n.clone_with_props(props)))
    }

    pub fn replace_child(
        &mut self,
        parent: Tag,
        old: &SharedNode,
        new: SharedNode,
    ) -> Result<SharedNode> {
        self.update_node(parent, |p| p.replace_child(old, new))
    }

    pub fn set_children(&mut self, parent: Tag, children: Vec<SharedNode>) -> Result<SharedNode> {
        self.update_node(parent, |p| Ok(p.clone_with_children(children)))
    }

    pub fn insert_child(
        &mut self,
        parent: Tag,
        child: SharedNode,
        index: Option<usize>,
    ) -> Result<SharedNode> {
        self.update_node(parent, |p| {
            let mut children = p.children().to_vec();
            let at = index.unwrap_or(children.len()).min(children.len());
            children.insert(at, child);
            Ok(p.clone_with_children(children))
        })
    }

    pub fn remove_child(&mut self, parent: Tag, child: Tag) -> Result<SharedNode> {
        self.update_node(parent, |p| {
            let index = p
                .child_index(child)
                .ok_or(UmbraError::ChildNotFound { parent, child })?;
            let mut children = p.children().to_vec();
            children.remove(index);
            Ok(p.clone_with_children(children))
        })
    }

    /// Applies a versioned state update; ancestors are dirtied so the layout
    /// engine revisits the path.
    pub fn update_state(&mut self, update: &StateUpdate) -> Result<SharedNode> {
        self.update_node(update.tag, |n| {
            let state = n.state().apply(update)?;
            Ok(n.clone_with(NodeFragment {
                state: Some(state),
                layout_dirty: Some(true),
                ..Default::default()
            }))
        })
    }
}

pub fn find_in(root: &SharedNode, tag: Tag) -> Option<SharedNode> {
    if root.tag() == tag {
        return Some(root.clone());
    }
    root.children().iter().find_map(|c| find_in(c, tag))
}

/// Child indices leading from `root` to `tag`.
pub fn path_to(root: &SharedNode, tag: Tag) -> Option<Vec<usize>> {
    fn go(node: &SharedNode, tag: Tag, path: &mut Vec<usize>) -> bool {
        if node.tag() == tag {
            return true;
        }
        for (i, child) in node.children().iter().enumerate() {
            path.push(i);
            if go(child, tag, path) {
                return true;
            }
            path.pop();
        }
        false
    }
    let mut path = Vec::new();
    go(root, tag, &mut path).then_some(path)
}

fn rebuild<F>(node: &SharedNode, path: &[usize], f: F) -> Result<SharedNode>
where
    F: FnOnce(&ShadowNode) -> Result<SharedNode>,
{
    match path.split_first() {
        None => f(node),
        Some((&i, rest)) => {
            let child = rebuild(&node.children()[i], rest, f)?;
            Ok(Arc::new(node.replace_child_at(i, child)))
        }
    }
}
