//! Component descriptors and the registry that maps component names to them.
//!
//! Generic tree code never matches on concrete components: it asks the
//! registry to build a node and from then on only looks at props accessors,
//! children and [`NodeTraits`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::text::{ParagraphProps, ParagraphState, RawTextProps, TextProps};
use crate::{
    ComponentName, CustomProps, EventQueue, NodeTraits, Props, RawProps, Result, ShadowNode,
    State, StateData, Tag, UmbraError, ViewProps,
};

/// Factory for one component type.
pub trait ComponentDescriptor: Send + Sync {
    fn name(&self) -> &str;

    fn base_traits(&self) -> NodeTraits;

    /// Components that behave as the root of their own layout context.
    fn root_kind(&self) -> bool {
        false
    }

    fn default_props(&self) -> Props;

    /// Applies a raw patch on top of `base`.
    fn clone_props(&self, base: &Props, raw: &RawProps) -> Props;

    fn initial_state(&self, _props: &Props) -> State {
        State::initial(StateData::Empty)
    }
}

macro_rules! builtin_descriptor {
    ($ty:ident, $name:literal, $traits:expr, $variant:ident, $props:ty) => {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $ty;

        impl $ty {
            pub const NAME: &'static str = $name;
        }

        impl ComponentDescriptor for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn base_traits(&self) -> NodeTraits {
                $traits
            }

            fn default_props(&self) -> Props {
                Props::$variant(<$props>::default())
            }

            fn clone_props(&self, base: &Props, raw: &RawProps) -> Props {
                let mut props = match base {
                    Props::$variant(p) => p.clone(),
                    other => {
                        log::warn!("{}: unexpected base props {other:?}", $name);
                        <$props>::default()
                    }
                };
                props.apply_raw(raw);
                Props::$variant(props)
            }

            builtin_descriptor!(@extra $variant);
        }
    };
    (@extra RootView) => {
        fn root_kind(&self) -> bool {
            true
        }
    };
    (@extra Paragraph) => {
        fn initial_state(&self, _props: &Props) -> State {
            State::initial(StateData::Paragraph(ParagraphState::default()))
        }
    };
    (@extra $other:ident) => {};
}

builtin_descriptor!(
    RootViewDescriptor,
    "RootView",
    NodeTraits::FORMS_VIEW,
    RootView,
    ViewProps
);
builtin_descriptor!(
    ViewDescriptor,
    "View",
    NodeTraits::FORMS_VIEW,
    View,
    ViewProps
);
builtin_descriptor!(
    ParagraphDescriptor,
    "Paragraph",
    NodeTraits::FORMS_VIEW
        .union(NodeTraits::LEAF)
        .union(NodeTraits::MEASURABLE)
        .union(NodeTraits::TEXT_KIND),
    Paragraph,
    ParagraphProps
);
builtin_descriptor!(TextDescriptor, "Text", NodeTraits::TEXT_KIND, Text, TextProps);
builtin_descriptor!(
    RawTextDescriptor,
    "RawText",
    NodeTraits::TEXT_KIND.union(NodeTraits::LEAF),
    RawText,
    RawTextProps
);

/// Extension point for components outside the built-in set. Props are
/// [`CustomProps`]: typed layout style plus raw values.
#[derive(Clone, Debug)]
pub struct CustomComponentDescriptor {
    name: String,
    traits: NodeTraits,
    root_kind: bool,
}

impl CustomComponentDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            traits: NodeTraits::FORMS_VIEW,
            root_kind: false,
        }
    }

    pub fn traits(mut self, traits: NodeTraits) -> Self {
        self.traits = traits;
        self
    }

    pub fn root_kind(mut self) -> Self {
        self.root_kind = true;
        self
    }
}

impl ComponentDescriptor for CustomComponentDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_traits(&self) -> NodeTraits {
        self.traits
    }

    fn root_kind(&self) -> bool {
        self.root_kind
    }

    fn default_props(&self) -> Props {
        Props::Custom(CustomProps::default())
    }

    fn clone_props(&self, base: &Props, raw: &RawProps) -> Props {
        let mut props = match base {
            Props::Custom(p) => p.clone(),
            _ => CustomProps::default(),
        };
        props.apply_raw(raw);
        Props::Custom(props)
    }
}

/// Name → descriptor table.
///
/// Registration takes `&mut self` and is meant for startup; after
/// [`freeze`](ComponentRegistry::freeze) the registry is shared behind an
/// `Arc` and only read.
#[derive(Default)]
pub struct ComponentRegistry {
    descriptors: HashMap<String, Arc<dyn ComponentDescriptor>>,
    frozen: bool,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .field("frozen", &self.frozen)
            .finish()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `RootView`, `View`, `Paragraph`, `Text` and `RawText`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [Arc<dyn ComponentDescriptor>; 5] = [
            Arc::new(RootViewDescriptor),
            Arc::new(ViewDescriptor),
            Arc::new(ParagraphDescriptor),
            Arc::new(TextDescriptor),
            Arc::new(RawTextDescriptor),
        ];
        for d in builtins {
            registry.descriptors.insert(d.name().to_string(), d);
        }
        registry
    }

    pub fn register(&mut self, descriptor: impl ComponentDescriptor + 'static) -> Result<()> {
        let name = descriptor.name().to_string();
        if self.frozen {
            return Err(UmbraError::RegistryFrozen(name));
        }
        if self.descriptors.contains_key(&name) {
            return Err(UmbraError::DuplicateComponent(name));
        }
        log::debug!("registered component `{name}`");
        self.descriptors.insert(name, Arc::new(descriptor));
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn descriptor(&self, name: &str) -> Result<&Arc<dyn ComponentDescriptor>> {
        self.descriptors
            .get(name)
            .ok_or_else(|| UmbraError::UnknownComponent(name.to_string()))
    }

    /// Builds a node with default props patched by `raw`. Its traits are the
    /// descriptor's base traits, plus `ROOT_NODE_KIND` for root-kind
    /// components.
    pub fn create(
        &self,
        name: &str,
        raw: &RawProps,
        tag: Tag,
        events: &EventQueue,
    ) -> Result<ShadowNode> {
        let descriptor = self.descriptor(name)?;
        let props = descriptor.clone_props(&descriptor.default_props(), raw);
        let mut traits = descriptor.base_traits();
        if descriptor.root_kind() {
            traits |= NodeTraits::ROOT_NODE_KIND;
        }
        let state = descriptor.initial_state(&props);
        Ok(ShadowNode::new(
            tag,
            ComponentName::from(descriptor.name()),
            traits,
            props,
            state,
            events.emitter(tag),
        ))
    }

    pub fn clone_props(&self, name: &str, base: &Props, raw: &RawProps) -> Result<Props> {
        Ok(self.descriptor(name)?.clone_props(base, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_builtin_traits() {
        let registry = ComponentRegistry::with_builtins();
        let events = EventQueue::new();
        let root = registry
            .create("RootView", &RawProps::new(), 1, &events)
            .unwrap();
        assert!(root.traits().contains(NodeTraits::ROOT_NODE_KIND));
        assert!(root.traits().contains(NodeTraits::FORMS_VIEW));

        let p = registry
            .create("Paragraph", &RawProps::new().set("numberOfLines", 3), 2, &events)
            .unwrap();
        assert!(p.traits().is_leaf() && p.traits().is_measurable());
        assert!(!p.traits().contains(NodeTraits::ROOT_NODE_KIND));
        assert_eq!(p.props().as_paragraph().unwrap().maximum_number_of_lines, 3);
        assert!(p.state().paragraph().is_some());
    }

    #[test]
    fn test_unknown_and_duplicate() {
        let mut registry = ComponentRegistry::with_builtins();
        let err = registry
            .create("Slider", &RawProps::new(), 1, &EventQueue::new())
            .unwrap_err();
        assert_eq!(err, UmbraError::UnknownComponent("Slider".into()));

        let err = registry
            .register(CustomComponentDescriptor::new("View"))
            .unwrap_err();
        assert_eq!(err, UmbraError::DuplicateComponent("View".into()));
    }

    #[test]
    fn test_custom_root_kind_merges_traits() {
        let mut registry = ComponentRegistry::new();
        registry
            .register(
                CustomComponentDescriptor::new("InputAccessory")
                    .traits(NodeTraits::FORMS_VIEW)
                    .root_kind(),
            )
            .unwrap();
        let node = registry
            .create("InputAccessory", &RawProps::new().set("tint", "red"), 9, &EventQueue::new())
            .unwrap();
        assert_eq!(
            node.traits(),
            NodeTraits::FORMS_VIEW | NodeTraits::ROOT_NODE_KIND
        );
        match node.props() {
            Props::Custom(p) => assert_eq!(p.values.get("tint").and_then(|v| v.as_str()), Some("red")),
            other => panic!("unexpected props {other:?}"),
        }
    }
}
