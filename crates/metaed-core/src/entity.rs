use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::plugin_data::PluginData;
use crate::property::Property;
use crate::source::SourceSpan;

/// Every declarable top-level entity variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Association,
    AssociationExtension,
    AssociationSubclass,
    Choice,
    Common,
    CommonExtension,
    Descriptor,
    Domain,
    DomainEntity,
    DomainEntityExtension,
    DomainEntitySubclass,
    Enumeration,
    InlineCommon,
    Interchange,
    InterchangeExtension,
    SchoolYearEnumeration,
    SharedDecimal,
    SharedInteger,
    SharedShort,
    SharedString,
    Subdomain,
}

impl EntityKind {
    pub const ALL: [EntityKind; 21] = [
        Self::Association,
        Self::AssociationExtension,
        Self::AssociationSubclass,
        Self::Choice,
        Self::Common,
        Self::CommonExtension,
        Self::Descriptor,
        Self::Domain,
        Self::DomainEntity,
        Self::DomainEntityExtension,
        Self::DomainEntitySubclass,
        Self::Enumeration,
        Self::InlineCommon,
        Self::Interchange,
        Self::InterchangeExtension,
        Self::SchoolYearEnumeration,
        Self::SharedDecimal,
        Self::SharedInteger,
        Self::SharedShort,
        Self::SharedString,
        Self::Subdomain,
    ];

    /// Name used in configuration files (`domainEntity`, `association`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Association => "association",
            Self::AssociationExtension => "associationExtension",
            Self::AssociationSubclass => "associationSubclass",
            Self::Choice => "choice",
            Self::Common => "common",
            Self::CommonExtension => "commonExtension",
            Self::Descriptor => "descriptor",
            Self::Domain => "domain",
            Self::DomainEntity => "domainEntity",
            Self::DomainEntityExtension => "domainEntityExtension",
            Self::DomainEntitySubclass => "domainEntitySubclass",
            Self::Enumeration => "enumeration",
            Self::InlineCommon => "inlineCommon",
            Self::Interchange => "interchange",
            Self::InterchangeExtension => "interchangeExtension",
            Self::SchoolYearEnumeration => "schoolYearEnumeration",
            Self::SharedDecimal => "sharedDecimal",
            Self::SharedInteger => "sharedInteger",
            Self::SharedShort => "sharedShort",
            Self::SharedString => "sharedString",
            Self::Subdomain => "subdomain",
        }
    }

    /// Human-readable name used in failure messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Association => "Association",
            Self::AssociationExtension => "Association Extension",
            Self::AssociationSubclass => "Association Subclass",
            Self::Choice => "Choice",
            Self::Common => "Common",
            Self::CommonExtension => "Common Extension",
            Self::Descriptor => "Descriptor",
            Self::Domain => "Domain",
            Self::DomainEntity => "Domain Entity",
            Self::DomainEntityExtension => "Domain Entity Extension",
            Self::DomainEntitySubclass => "Domain Entity Subclass",
            Self::Enumeration => "Enumeration",
            Self::InlineCommon => "Inline Common",
            Self::Interchange => "Interchange",
            Self::InterchangeExtension => "Interchange Extension",
            Self::SchoolYearEnumeration => "School Year Enumeration",
            Self::SharedDecimal => "Shared Decimal",
            Self::SharedInteger => "Shared Integer",
            Self::SharedShort => "Shared Short",
            Self::SharedString => "Shared String",
            Self::Subdomain => "Subdomain",
        }
    }

    pub fn is_subclass(&self) -> bool {
        matches!(self, Self::AssociationSubclass | Self::DomainEntitySubclass)
    }

    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            Self::AssociationExtension
                | Self::CommonExtension
                | Self::DomainEntityExtension
                | Self::InterchangeExtension
        )
    }

    /// Kinds the base entity of a subclass or extension may have.
    ///
    /// Empty for kinds that never declare a base.
    pub fn base_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::AssociationSubclass => &[Self::Association],
            Self::AssociationExtension => &[Self::Association, Self::AssociationSubclass],
            Self::DomainEntitySubclass => &[Self::DomainEntity],
            Self::DomainEntityExtension => &[Self::DomainEntity, Self::DomainEntitySubclass],
            Self::CommonExtension => &[Self::Common],
            Self::InterchangeExtension => &[Self::Interchange],
            // A subdomain's parent is its domain
            Self::Subdomain => &[Self::Domain],
            _ => &[],
        }
    }

    /// Entities that receive a global dependency position.
    pub fn is_top_level_ordered(&self) -> bool {
        matches!(
            self,
            Self::Association
                | Self::AssociationSubclass
                | Self::Descriptor
                | Self::DomainEntity
                | Self::DomainEntitySubclass
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown entity kind `{s}`"))
    }
}

/// A reference from an interchange, domain, or subdomain to another entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityItem {
    pub name: String,
    /// Explicit namespace qualifier, if the item was written `Namespace.Name`.
    pub namespace: Option<String>,
    pub source: SourceSpan,
}

impl EntityItem {
    /// Builds an item from a possibly qualified name.
    pub fn new(qualified_name: &str) -> Self {
        let (namespace, name) = crate::split_qualified_name(qualified_name);
        Self {
            name: name.to_owned(),
            namespace: namespace.map(str::to_owned),
            source: SourceSpan::default(),
        }
    }

    pub fn at(mut self, source: SourceSpan) -> Self {
        self.source = source;
        self
    }
}

/// Stable identity of an entity inside a repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub namespace: String,
    pub kind: EntityKind,
    pub name: String,
}

impl EntityKey {
    pub fn new(namespace: impl Into<String>, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// A declared top-level entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub namespace: String,
    pub documentation: String,
    pub properties: Vec<Property>,
    /// Interchange elements, or domain and subdomain items.
    pub items: Vec<EntityItem>,
    pub base_entity_name: Option<String>,
    pub base_entity_namespace: Option<String>,
    pub is_abstract: bool,
    pub source: SourceSpan,
    /// Enhancer-written annotations, one section per plugin.
    pub data: PluginData,
    /// Configuration-file annotations, one section per plugin.
    pub config: PluginData,
}

impl Entity {
    pub fn new(kind: EntityKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            documentation: String::new(),
            properties: Vec::new(),
            items: Vec::new(),
            base_entity_name: None,
            base_entity_namespace: None,
            is_abstract: false,
            source: SourceSpan::default(),
            data: PluginData::default(),
            config: PluginData::default(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.namespace, self.kind, &self.name)
    }

    /// Declares the base entity from a possibly qualified name.
    pub fn with_base(mut self, qualified_name: &str) -> Self {
        let (namespace, name) = crate::split_qualified_name(qualified_name);
        self.base_entity_name = Some(name.to_owned());
        self.base_entity_namespace = namespace.map(str::to_owned);
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_item(mut self, item: EntityItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn abstract_entity(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn at(mut self, source: SourceSpan) -> Self {
        self.source = source;
        self
    }

    pub fn identity_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties
            .iter()
            .filter(|p| p.is_part_of_identity || p.is_identity_rename)
    }

    /// Finds a property by its role-name-qualified name.
    pub fn property(&self, full_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.full_name() == full_name)
    }
}
