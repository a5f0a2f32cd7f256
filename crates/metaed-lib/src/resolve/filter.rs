use metaed_core::{Entity, EntityKind, Property};

/// Which properties may satisfy a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyFilter {
    /// Every property matches.
    #[default]
    All,
    /// Identity properties of identity-bearing kinds, plus members of
    /// inlined containers.
    IdentityReferences,
    /// The first segment matches unconditionally, later segments use
    /// [`PropertyFilter::IdentityReferences`].
    AllButFirstAsIdentity,
}

/// Filter plus the position of the segment being resolved.
///
/// Created fresh for every resolution so repeated calls never share state.
#[derive(Debug, Clone)]
pub struct FilterState {
    filter: PropertyFilter,
    segment: usize,
}

impl FilterState {
    pub fn new(filter: PropertyFilter) -> Self {
        Self { filter, segment: 0 }
    }

    pub fn filter(&self) -> PropertyFilter {
        self.filter
    }

    /// Index of the segment currently being matched.
    pub fn segment(&self) -> usize {
        self.segment
    }

    /// Moves on to the next path segment.
    pub fn advance(&mut self) {
        self.segment += 1;
    }

    /// Whether `property`, declared on `owner`, may match the current segment.
    ///
    /// `identity_only` is set on base-entity fallbacks and narrows any filter
    /// to identity references.
    pub fn accepts(&self, property: &Property, owner: &Entity, identity_only: bool) -> bool {
        if identity_only {
            return is_identity_reference(property, owner);
        }
        match self.filter {
            PropertyFilter::All => true,
            PropertyFilter::IdentityReferences => is_identity_reference(property, owner),
            PropertyFilter::AllButFirstAsIdentity => {
                self.segment == 0 || is_identity_reference(property, owner)
            }
        }
    }
}

/// Identity properties of identity-bearing kinds, or any member of a choice
/// or inline common (those are inlined into their parent's identity).
pub fn is_identity_reference(property: &Property, owner: &Entity) -> bool {
    if matches!(owner.kind, EntityKind::Choice | EntityKind::InlineCommon) {
        return true;
    }
    property.is_identity() && property.kind.is_identity_bearing()
}
