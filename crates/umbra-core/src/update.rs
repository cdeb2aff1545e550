//! Tree-update requests from the application description and the builder
//! that applies them to a candidate.
//!
//! Each request either applies completely or fails without touching the
//! candidate; a failed request does not affect the ones after it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    CandidateTree, ComponentRegistry, EventQueue, RawProps, Result, SharedNode, StateUpdate, Tag,
    UmbraError, find_in,
};

/// Declarative description of a subtree to create.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub component: String,
    pub tag: Tag,
    pub props: RawProps,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(component: impl Into<String>, tag: Tag) -> Self {
        Self {
            component: component.into(),
            tag,
            props: RawProps::new(),
            children: Vec::new(),
        }
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<crate::RawValue>) -> Self {
        self.props.insert(key, value);
        self
    }

    pub fn props(mut self, props: RawProps) -> Self {
        self.props = props;
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Raw-text leaf, the content node of paragraphs and spans.
    pub fn raw_text(tag: Tag, text: impl Into<String>) -> Self {
        Element::new("RawText", tag).prop("text", text.into())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TreeUpdate {
    /// Builds a detached subtree; attach it with `UpdateChildren` or
    /// `Replace` in the same pass.
    Create { element: Element },
    UpdateProps { tag: Tag, props: RawProps },
    /// New ordered child list of `tag`. Each child is either a current child
    /// or a detached node; children left out become detached.
    UpdateChildren { tag: Tag, children: Vec<Tag> },
    Delete { tag: Tag },
    /// Puts the detached node `with` where `tag` is.
    Replace { tag: Tag, with: Tag },
}

impl TreeUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            TreeUpdate::Create { .. } => "create",
            TreeUpdate::UpdateProps { .. } => "update-props",
            TreeUpdate::UpdateChildren { .. } => "update-children",
            TreeUpdate::Delete { .. } => "delete",
            TreeUpdate::Replace { .. } => "replace",
        }
    }
}

/// Applies [`TreeUpdate`]s to one candidate.
pub struct TreeBuilder<'a> {
    registry: &'a ComponentRegistry,
    events: &'a EventQueue,
    candidate: CandidateTree,
    detached: HashMap<Tag, SharedNode>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(registry: &'a ComponentRegistry, events: &'a EventQueue, candidate: CandidateTree) -> Self {
        Self {
            registry,
            events,
            candidate,
            detached: HashMap::new(),
        }
    }

    pub fn candidate(&self) -> &CandidateTree {
        &self.candidate
    }

    pub fn detached(&self, tag: Tag) -> Option<&SharedNode> {
        self.detached.get(&tag)
    }

    pub fn apply(&mut self, update: TreeUpdate) -> Result<()> {
        log::trace!("{} on candidate {}", update.name(), self.candidate.generation());
        match update {
            TreeUpdate::Create { element } => self.create(&element),
            TreeUpdate::UpdateProps { tag, props } => self.update_props(tag, &props),
            TreeUpdate::UpdateChildren { tag, children } => self.update_children(tag, &children),
            TreeUpdate::Delete { tag } => self.delete(tag),
            TreeUpdate::Replace { tag, with } => self.replace(tag, with),
        }
    }

    pub fn apply_state(&mut self, update: &StateUpdate) -> Result<()> {
        self.candidate.update_state(update).map(|_| ())
    }

    /// Returns the candidate; detached nodes never attached are released.
    pub fn finish(self) -> CandidateTree {
        if !self.detached.is_empty() {
            log::debug!(
                "candidate {}: releasing {} detached nodes",
                self.candidate.generation(),
                self.detached.len()
            );
        }
        self.candidate
    }

    fn is_known(&self, tag: Tag) -> bool {
        self.candidate.find(tag).is_some()
            || self.detached.values().any(|d| find_in(d, tag).is_some())
    }

    fn create(&mut self, element: &Element) -> Result<()> {
        let mut tags = Vec::new();
        collect_tags(element, &mut tags);
        let mut seen = HashSet::new();
        for tag in tags {
            if !seen.insert(tag) || self.is_known(tag) {
                return Err(UmbraError::InvalidOperation(format!(
                    "tag {tag} is already in use"
                )));
            }
        }
        let node = self.build(element)?;
        self.detached.insert(element.tag, node);
        Ok(())
    }

    fn build(&self, element: &Element) -> Result<SharedNode> {
        let node = self
            .registry
            .create(&element.component, &element.props, element.tag, self.events)?;
        let children = element
            .children
            .iter()
            .map(|c| self.build(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Arc::new(node.with_children(children)))
    }

    fn update_props(&mut self, tag: Tag, raw: &RawProps) -> Result<()> {
        if let Some(node) = self.detached.get(&tag) {
            let props = self
                .registry
                .clone_props(node.component().as_str(), node.props(), raw)?;
            let updated = Arc::new(node.clone_with_props(props));
            self.detached.insert(tag, updated);
            return Ok(());
        }
        let node = self.candidate.find(tag).ok_or(UmbraError::NodeNotFound(tag))?;
        let props = self
            .registry
            .clone_props(node.component().as_str(), node.props(), raw)?;
        self.candidate.clone_node_with_props(tag, props)?;
        Ok(())
    }

    fn update_children(&mut self, tag: Tag, children: &[Tag]) -> Result<()> {
        let parent = self.candidate.find(tag).ok_or(UmbraError::NodeNotFound(tag))?;
        let unique: HashSet<Tag> = children.iter().copied().collect();
        if unique.len() != children.len() {
            return Err(UmbraError::InvalidOperation(format!(
                "duplicate child in new children of {tag}"
            )));
        }
        let mut resolved = Vec::with_capacity(children.len());
        for &child in children {
            let node = parent
                .children()
                .iter()
                .find(|c| c.tag() == child)
                .or_else(|| self.detached.get(&child))
                .ok_or(UmbraError::ChildNotFound { parent: tag, child })?;
            resolved.push(node.clone());
        }

        self.candidate.set_children(tag, resolved)?;
        for &child in children {
            self.detached.remove(&child);
        }
        for old in parent.children() {
            if !children.contains(&old.tag()) {
                self.detached.insert(old.tag(), old.clone());
            }
        }
        Ok(())
    }

    fn delete(&mut self, tag: Tag) -> Result<()> {
        if self.detached.remove(&tag).is_some() {
            return Ok(());
        }
        if self.candidate.root().tag() == tag {
            return Err(UmbraError::InvalidOperation(format!(
                "cannot delete surface root {tag}"
            )));
        }
        let parent = self
            .candidate
            .parent_of(tag)
            .ok_or(UmbraError::NodeNotFound(tag))?;
        self.candidate.remove_child(parent.tag(), tag)?;
        Ok(())
    }

    fn replace(&mut self, tag: Tag, with: Tag) -> Result<()> {
        let new = self
            .detached
            .get(&with)
            .cloned()
            .ok_or(UmbraError::NodeNotFound(with))?;
        if self.candidate.root().tag() == tag {
            return Err(UmbraError::InvalidOperation(format!(
                "cannot replace surface root {tag}"
            )));
        }
        let parent = self
            .candidate
            .parent_of(tag)
            .ok_or(UmbraError::NodeNotFound(tag))?;
        let old = self
            .candidate
            .find(tag)
            .ok_or(UmbraError::NodeNotFound(tag))?;
        self.candidate.replace_child(parent.tag(), &old, new)?;
        self.detached.remove(&with);
        Ok(())
    }
}

fn collect_tags(element: &Element, out: &mut Vec<Tag>) {
    out.push(element.tag);
    for child in &element.children {
        collect_tags(child, out);
    }
}
