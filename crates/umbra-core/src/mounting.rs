//! Contract with the platform mounting layer, plus an in-memory reference
//! implementation used by tests and tooling.

use crate::{
    ComponentName, Generation, LayoutMetrics, Mutation, NO_PARENT, Props, Result, ShadowNode, Tag,
    UmbraError,
};

pub type SurfaceId = u64;

/// One commit's worth of mutations, in the order they must be applied.
#[derive(Clone, Debug)]
pub struct MountingTransaction {
    pub surface_id: SurfaceId,
    pub generation: Generation,
    pub mutations: Vec<Mutation>,
}

/// Applies committed diffs to real views.
///
/// `apply` runs with the commit lock held. Returning `Ok` acknowledges the
/// transaction; an `Err` makes the coordinator discard the commit, so an
/// implementation should leave its views unchanged when it fails.
pub trait MountingLayer: Send {
    fn apply(&mut self, transaction: &MountingTransaction) -> Result<()>;
}

/// Mounted view in a [`StubViewTree`].
#[derive(Clone, Debug, PartialEq)]
pub struct StubView {
    pub tag: Tag,
    pub component: ComponentName,
    pub props: Props,
    pub layout: LayoutMetrics,
    pub children: Vec<StubView>,
}

impl StubView {
    fn from_node(node: &ShadowNode) -> Self {
        Self {
            tag: node.tag(),
            component: node.component().clone(),
            props: node.props().clone(),
            layout: *node.layout(),
            children: Vec::new(),
        }
    }

    fn find_mut(&mut self, tag: Tag) -> Option<&mut StubView> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(tag))
    }

    fn find(&self, tag: Tag) -> Option<&StubView> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(StubView::count).sum::<usize>()
    }
}

/// View hierarchy that mirrors what a platform would mount. Transactions are
/// applied to a copy and swapped in only if every mutation succeeds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StubViewTree {
    root: Option<StubView>,
    generation: Option<Generation>,
}

impl StubViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The views a full mount of `root` would produce. Leaf content is not
    /// mounted.
    pub fn from_tree(root: &ShadowNode) -> Self {
        fn build(node: &ShadowNode) -> StubView {
            let mut view = StubView::from_node(node);
            if !node.traits().is_leaf() {
                view.children = node.children().iter().map(|c| build(c)).collect();
            }
            view
        }
        Self {
            root: Some(build(root)),
            generation: None,
        }
    }

    pub fn root(&self) -> Option<&StubView> {
        self.root.as_ref()
    }

    pub fn find(&self, tag: Tag) -> Option<&StubView> {
        self.root.as_ref().and_then(|r| r.find(tag))
    }

    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, StubView::count)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Generation of the last applied transaction.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    /// Same views, ignoring which transaction produced them.
    pub fn same_views(&self, other: &StubViewTree) -> bool {
        self.root == other.root
    }

    fn apply_one(&mut self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::Insert {
                parent: NO_PARENT,
                node,
                ..
            } => {
                if let Some(root) = &self.root {
                    return Err(UmbraError::Mount(format!(
                        "surface already has root {}",
                        root.tag
                    )));
                }
                self.root = Some(StubView::from_node(node));
            }
            Mutation::Remove {
                parent: NO_PARENT,
                tag,
                ..
            } => {
                if self.root.as_ref().map(|r| r.tag) != Some(*tag) {
                    return Err(UmbraError::Mount(format!("{tag} is not the root")));
                }
                self.root = None;
            }
            Mutation::Insert {
                parent,
                index,
                node,
            } => {
                let parent = self.parent_mut(*parent)?;
                if *index > parent.children.len() {
                    return Err(out_of_bounds(parent.tag, *index));
                }
                parent.children.insert(*index, StubView::from_node(node));
            }
            Mutation::Remove { parent, index, tag } => {
                let parent = self.parent_mut(*parent)?;
                match parent.children.get(*index) {
                    Some(child) if child.tag == *tag => {
                        parent.children.remove(*index);
                    }
                    _ => {
                        return Err(UmbraError::Mount(format!(
                            "expected {tag} at index {index} of {}",
                            parent.tag
                        )));
                    }
                }
            }
            Mutation::Move {
                parent,
                from,
                to,
                tag,
            } => {
                let parent = self.parent_mut(*parent)?;
                if parent.children.get(*from).map(|c| c.tag) != Some(*tag) {
                    return Err(UmbraError::Mount(format!(
                        "expected {tag} at index {from} of {}",
                        parent.tag
                    )));
                }
                let view = parent.children.remove(*from);
                if *to > parent.children.len() {
                    return Err(out_of_bounds(parent.tag, *to));
                }
                parent.children.insert(*to, view);
            }
            Mutation::Update { new, .. } => {
                let view = self
                    .root
                    .as_mut()
                    .and_then(|r| r.find_mut(new.tag()))
                    .ok_or_else(|| UmbraError::Mount(format!("{} is not mounted", new.tag())))?;
                view.props = new.props().clone();
                view.layout = *new.layout();
            }
        }
        Ok(())
    }

    fn parent_mut(&mut self, tag: Tag) -> Result<&mut StubView> {
        self.root
            .as_mut()
            .and_then(|r| r.find_mut(tag))
            .ok_or_else(|| UmbraError::Mount(format!("parent {tag} is not mounted")))
    }
}

fn out_of_bounds(parent: Tag, index: usize) -> UmbraError {
    UmbraError::Mount(format!("index {index} out of bounds for {parent}"))
}

impl MountingLayer for StubViewTree {
    fn apply(&mut self, transaction: &MountingTransaction) -> Result<()> {
        let mut next = self.clone();
        for mutation in &transaction.mutations {
            next.apply_one(mutation)?;
        }
        next.generation = Some(transaction.generation);
        *self = next;
        Ok(())
    }
}
