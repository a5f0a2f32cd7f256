//! Property path resolution across entity graphs.
//!
//! A path is a list of role-name-qualified property names. Resolution starts
//! at an entity and follows references, base entities, and inlined containers
//! until the last segment names a property.

mod filter;
mod path;


pub use filter::{FilterState, PropertyFilter, is_identity_reference};
pub use path::{
    ResolvedProperty, find_referenced_property, is_same_or_subclass, property_chain,
    referenced_entity,
};
