use bitflags::bitflags;

bitflags! {
    /// Structural flags consulted by generic tree code instead of matching on
    /// concrete component variants.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeTraits: u32 {
        /// Root of a surface, or a component that behaves like one (its
        /// descendants are laid out against its own frame).
        const ROOT_NODE_KIND = 1 << 0;
        /// Mounted as a platform view.
        const FORMS_VIEW = 1 << 1;
        /// Children are content of this node, not layout children; they are
        /// neither laid out by the flex algorithm nor mounted.
        const LEAF = 1 << 2;
        /// Intrinsic size comes from a custom measure function.
        const MEASURABLE = 1 << 3;
        /// Participates in text flattening (paragraph, span, raw text).
        const TEXT_KIND = 1 << 4;
        /// Laid out with `display: none`.
        const HIDDEN = 1 << 5;
    }
}

impl NodeTraits {
    pub fn is_leaf(self) -> bool {
        self.contains(NodeTraits::LEAF)
    }

    pub fn is_measurable(self) -> bool {
        self.contains(NodeTraits::MEASURABLE)
    }
}
