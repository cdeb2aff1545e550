use std::fmt;
use std::sync::Arc;

use crate::{
    EventEmitter, LayoutMetrics, NodeTraits, Props, Result, State, UmbraError,
};

/// Stable instance identifier, preserved by every clone of a node.
pub type Tag = u64;

pub type SharedNode = Arc<ShadowNode>;

/// Ordered children; clones that leave children untouched share this list.
pub type Children = Arc<[SharedNode]>;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentName(Arc<str>);

impl ComponentName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentName {
    fn from(s: &str) -> Self {
        ComponentName(Arc::from(s))
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// Fields to override when cloning a node; `None` keeps the source value.
#[derive(Clone, Debug, Default)]
pub struct NodeFragment {
    pub props: Option<Arc<Props>>,
    pub state: Option<State>,
    pub children: Option<Children>,
    pub layout: Option<LayoutMetrics>,
    pub layout_dirty: Option<bool>,
}

/// One element of a shadow tree.
///
/// Nodes are immutable once shared: every change goes through
/// [`clone_with`](ShadowNode::clone_with), which keeps the tag and bumps the
/// revision.
#[derive(Clone, Debug)]
pub struct ShadowNode {
    tag: Tag,
    component: ComponentName,
    revision: u64,
    traits: NodeTraits,
    props: Arc<Props>,
    state: State,
    children: Children,
    layout: LayoutMetrics,
    layout_dirty: bool,
    emitter: EventEmitter,
}

impl ShadowNode {
    pub fn new(
        tag: Tag,
        component: ComponentName,
        traits: NodeTraits,
        props: Props,
        state: State,
        emitter: EventEmitter,
    ) -> Self {
        Self {
            tag,
            component,
            revision: 1,
            traits,
            props: Arc::new(props),
            state,
            children: Arc::from(Vec::new()),
            layout: LayoutMetrics::default(),
            layout_dirty: true,
            emitter,
        }
    }

    /// Sets the initial children of a node that has not been shared yet.
    pub fn with_children(mut self, children: Vec<SharedNode>) -> Self {
        self.children = Arc::from(children);
        self
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn component(&self) -> &ComponentName {
        &self.component
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn traits(&self) -> NodeTraits {
        self.traits
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn shared_props(&self) -> &Arc<Props> {
        &self.props
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn children(&self) -> &[SharedNode] {
        &self.children
    }

    pub fn shared_children(&self) -> &Children {
        &self.children
    }

    pub fn layout(&self) -> &LayoutMetrics {
        &self.layout
    }

    pub fn is_layout_dirty(&self) -> bool {
        self.layout_dirty
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    pub fn clone_with(&self, fragment: NodeFragment) -> ShadowNode {
        ShadowNode {
            tag: self.tag,
            component: self.component.clone(),
            revision: self.revision + 1,
            traits: self.traits,
            props: fragment.props.unwrap_or_else(|| self.props.clone()),
            state: fragment.state.unwrap_or_else(|| self.state.clone()),
            children: fragment.children.unwrap_or_else(|| self.children.clone()),
            layout: fragment.layout.unwrap_or(self.layout),
            layout_dirty: fragment.layout_dirty.unwrap_or(self.layout_dirty),
            emitter: self.emitter.clone(),
        }
    }

    /// New instance with `props`, marked layout-dirty.
    pub fn clone_with_props(&self, props: Props) -> ShadowNode {
        self.clone_with(NodeFragment {
            props: Some(Arc::new(props)),
            layout_dirty: Some(true),
            ..Default::default()
        })
    }

    pub fn clone_with_children(&self, children: Vec<SharedNode>) -> ShadowNode {
        self.clone_with(NodeFragment {
            children: Some(Arc::from(children)),
            layout_dirty: Some(true),
            ..Default::default()
        })
    }

    pub fn child_index(&self, tag: Tag) -> Option<usize> {
        self.children.iter().position(|c| c.tag == tag)
    }

    /// Returns a new parent where `old` (by identity) is replaced by `new`.
    pub fn replace_child(&self, old: &SharedNode, new: SharedNode) -> Result<ShadowNode> {
        let index = self
            .children
            .iter()
            .position(|c| Arc::ptr_eq(c, old))
            .ok_or(UmbraError::ChildNotFound {
                parent: self.tag,
                child: old.tag,
            })?;
        Ok(self.replace_child_at(index, new))
    }

    pub(crate) fn replace_child_at(&self, index: usize, new: SharedNode) -> ShadowNode {
        let children: Vec<SharedNode> = self
            .children
            .iter()
            .enumerate()
            .map(|(i, c)| if i == index { new.clone() } else { c.clone() })
            .collect();
        self.clone_with_children(children)
    }

    /// Props, state and layout equal; state is compared by version.
    pub fn same_content(&self, other: &ShadowNode) -> bool {
        (Arc::ptr_eq(&self.props, &other.props) || self.props == other.props)
            && self.state.same_as(&other.state)
            && self.layout == other.layout
    }

    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }
}
