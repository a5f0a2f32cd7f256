use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::source::SourceSpan;

/// Every declarable property variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    Boolean,
    Currency,
    Date,
    Datetime,
    Decimal,
    Duration,
    Integer,
    Percent,
    Short,
    String,
    Time,
    Year,
    Association,
    Choice,
    Common,
    Descriptor,
    DomainEntity,
    Enumeration,
    InlineCommon,
    SchoolYearEnumeration,
    SharedDecimal,
    SharedInteger,
    SharedShort,
    SharedString,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Currency => "currency",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Decimal => "decimal",
            Self::Duration => "duration",
            Self::Integer => "integer",
            Self::Percent => "percent",
            Self::Short => "short",
            Self::String => "string",
            Self::Time => "time",
            Self::Year => "year",
            Self::Association => "association",
            Self::Choice => "choice",
            Self::Common => "common",
            Self::Descriptor => "descriptor",
            Self::DomainEntity => "domainEntity",
            Self::Enumeration => "enumeration",
            Self::InlineCommon => "inlineCommon",
            Self::SchoolYearEnumeration => "schoolYearEnumeration",
            Self::SharedDecimal => "sharedDecimal",
            Self::SharedInteger => "sharedInteger",
            Self::SharedShort => "sharedShort",
            Self::SharedString => "sharedString",
        }
    }

    /// Entity kinds a property of this kind may reference, in lookup order.
    ///
    /// Empty for plain scalar properties.
    pub fn referenced_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::Association => &[EntityKind::Association, EntityKind::AssociationSubclass],
            Self::DomainEntity => &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass],
            Self::Choice => &[EntityKind::Choice],
            Self::Common => &[EntityKind::Common],
            Self::InlineCommon => &[EntityKind::InlineCommon],
            Self::Descriptor => &[EntityKind::Descriptor],
            Self::Enumeration => &[EntityKind::Enumeration],
            Self::SchoolYearEnumeration => &[EntityKind::SchoolYearEnumeration],
            Self::SharedDecimal => &[EntityKind::SharedDecimal],
            Self::SharedInteger => &[EntityKind::SharedInteger],
            Self::SharedShort => &[EntityKind::SharedShort],
            Self::SharedString => &[EntityKind::SharedString],
            _ => &[],
        }
    }

    pub fn is_reference(&self) -> bool {
        !self.referenced_kinds().is_empty()
    }

    /// References whose target declares properties a path may continue into.
    pub fn is_navigable(&self) -> bool {
        matches!(
            self,
            Self::Association | Self::DomainEntity | Self::Choice | Self::Common | Self::InlineCommon
        )
    }

    /// Containers group other properties and are never a terminal path target.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Choice | Self::Common | Self::InlineCommon)
    }

    /// Containers whose members are inlined into the owning entity.
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Choice | Self::InlineCommon)
    }

    /// Kinds that may carry an entity's natural key.
    pub fn is_identity_bearing(&self) -> bool {
        !matches!(self, Self::Choice | Self::Common | Self::InlineCommon)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asserts that two dotted property paths resolve to the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDirective {
    pub source_property_path: String,
    pub target_property_path: String,
    pub source: SourceSpan,
}

impl MergeDirective {
    pub fn new(source_property_path: impl Into<String>, target_property_path: impl Into<String>) -> Self {
        Self {
            source_property_path: source_property_path.into(),
            target_property_path: target_property_path.into(),
            source: SourceSpan::default(),
        }
    }

    pub fn source_path(&self) -> Vec<&str> {
        self.source_property_path.split('.').collect()
    }

    pub fn target_path(&self) -> Vec<&str> {
        self.target_property_path.split('.').collect()
    }
}

/// A property owned by exactly one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub kind: PropertyKind,
    pub name: String,
    pub role_name: Option<String>,
    pub documentation: String,
    pub is_required: bool,
    pub is_optional: bool,
    pub is_required_collection: bool,
    pub is_optional_collection: bool,
    pub is_part_of_identity: bool,
    pub is_identity_rename: bool,
    /// Name of the base identity an identity rename replaces.
    pub base_key_name: Option<String>,
    pub referenced_entity: Option<String>,
    pub referenced_namespace: Option<String>,
    pub merge_directives: Vec<MergeDirective>,
    pub source: SourceSpan,
}

impl Property {
    /// Creates an optional property.
    ///
    /// Reference kinds take their target from `name`, which may be qualified
    /// (`EdFi.Student`); the property itself is named by the unqualified part.
    pub fn new(kind: PropertyKind, name: &str) -> Self {
        let (namespace, local_name) = crate::split_qualified_name(name);
        let is_reference = kind.is_reference();
        Self {
            kind,
            name: local_name.to_owned(),
            role_name: None,
            documentation: String::new(),
            is_required: false,
            is_optional: true,
            is_required_collection: false,
            is_optional_collection: false,
            is_part_of_identity: false,
            is_identity_rename: false,
            base_key_name: None,
            referenced_entity: is_reference.then(|| local_name.to_owned()),
            referenced_namespace: if is_reference {
                namespace.map(str::to_owned)
            } else {
                None
            },
            merge_directives: Vec::new(),
            source: SourceSpan::default(),
        }
    }

    pub fn identity(kind: PropertyKind, name: &str) -> Self {
        let mut property = Self::new(kind, name);
        property.is_part_of_identity = true;
        property.is_optional = false;
        property
    }

    pub fn required(kind: PropertyKind, name: &str) -> Self {
        let mut property = Self::new(kind, name);
        property.is_required = true;
        property.is_optional = false;
        property
    }

    pub fn required_collection(kind: PropertyKind, name: &str) -> Self {
        let mut property = Self::new(kind, name);
        property.is_required_collection = true;
        property.is_optional = false;
        property
    }

    pub fn optional_collection(kind: PropertyKind, name: &str) -> Self {
        let mut property = Self::new(kind, name);
        property.is_optional_collection = true;
        property.is_optional = false;
        property
    }

    /// An identity rename of `base_key_name` inherited from the base entity.
    pub fn identity_rename(kind: PropertyKind, name: &str, base_key_name: &str) -> Self {
        let mut property = Self::new(kind, name);
        property.is_identity_rename = true;
        property.is_optional = false;
        property.base_key_name = Some(base_key_name.to_owned());
        property
    }

    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        let role_name = role_name.into();
        self.role_name = (!role_name.is_empty()).then_some(role_name);
        self
    }

    /// Points a shared-type property at a shared entity of a different name.
    pub fn with_referenced_entity(mut self, qualified_name: &str) -> Self {
        let (namespace, name) = crate::split_qualified_name(qualified_name);
        self.referenced_entity = Some(name.to_owned());
        self.referenced_namespace = namespace.map(str::to_owned);
        self
    }

    pub fn with_merge_directive(mut self, directive: MergeDirective) -> Self {
        self.merge_directives.push(directive);
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn at(mut self, source: SourceSpan) -> Self {
        self.source = source;
        self
    }

    /// Role-name-qualified name; the bare name when no role name is set or
    /// the role name repeats the name.
    pub fn full_name(&self) -> String {
        match &self.role_name {
            Some(role_name) if *role_name != self.name => format!("{role_name}{}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.is_part_of_identity || self.is_identity_rename
    }

    pub fn is_collection(&self) -> bool {
        self.is_required_collection || self.is_optional_collection
    }
}
