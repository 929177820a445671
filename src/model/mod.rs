use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

pub mod attachment;

pub use attachment::{attachments, Attachment, AttachmentIcon, ATTACHMENT_ATTRIBUTE_PREFIX};

/// Parent identifier used by vault libraries for the invisible root group.
pub const ROOT_GROUP_ID: &str = "0";
/// Group attribute carrying the special role of a group.
pub const GROUP_ROLE_ATTRIBUTE: &str = "bc_group_role";
pub const GROUP_ROLE_TRASH: &str = "trash";
pub const TITLE_PROPERTY: &str = "title";
pub const UNTITLED_PLACEHOLDER: &str = "(Untitled)";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_GROUP_ID
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    #[serde(default)]
    pub parent: Option<GroupId>,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl Group {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(id),
            title: title.into(),
            parent: None,
            attributes: IndexMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(GroupId::new(parent));
        self
    }

    pub fn as_trash(mut self) -> Self {
        self.attributes
            .insert(GROUP_ROLE_ATTRIBUTE.to_string(), GROUP_ROLE_TRASH.to_string());
        self
    }

    pub fn is_trash(&self) -> bool {
        self.attributes
            .get(GROUP_ROLE_ATTRIBUTE)
            .is_some_and(|role| role == GROUP_ROLE_TRASH)
    }

    /// Parent reference with the root sentinel folded into `None`.
    pub fn parent_id(&self) -> Option<&GroupId> {
        self.parent.as_ref().filter(|parent| !parent.is_root())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyType {
    Property,
    Attribute,
}

impl Default for PropertyType {
    fn default() -> Self {
        PropertyType::Property
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldValueType {
    Text,
    Note,
    Password,
    Otp,
}

impl Default for FieldValueType {
    fn default() -> Self {
        FieldValueType::Text
    }
}

impl FieldValueType {
    /// Label shown in the "change type" menu.
    pub fn title(self) -> &'static str {
        match self {
            FieldValueType::Text => "Text (default)",
            FieldValueType::Note => "Note",
            FieldValueType::Password => "Password",
            FieldValueType::Otp => "OTP",
        }
    }

    /// Every type with its menu label, in menu order.
    pub fn menu() -> Vec<(FieldValueType, &'static str)> {
        Self::iter().map(|value_type| (value_type, value_type.title())).collect()
    }
}

/// Select options attached to a field: either bare values or value -> label pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatOptions {
    Values(Vec<String>),
    Labeled(IndexMap<String, String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldFormatting {
    pub format: Option<String>,
    pub options: Option<FormatOptions>,
    pub default_option: Option<String>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub property: String,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub value_type: FieldValueType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub formatting: Option<FieldFormatting>,
    #[serde(default)]
    pub removeable: bool,
}

impl Field {
    pub fn property(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            property_type: PropertyType::Property,
            value: value.into(),
            value_type: FieldValueType::Text,
            title: None,
            formatting: None,
            removeable: false,
        }
    }

    pub fn attribute(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property_type: PropertyType::Attribute,
            ..Self::property(property, value)
        }
    }

    pub fn with_value_type(mut self, value_type: FieldValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn removeable(mut self) -> Self {
        self.removeable = true;
        self
    }

    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.property)
    }

    pub fn is_title(&self) -> bool {
        self.property_type == PropertyType::Property && self.property == TITLE_PROPERTY
    }

    pub fn same_key(&self, property: &str, property_type: PropertyType) -> bool {
        self.property == property && self.property_type == property_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub property: String,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub original_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
}

impl HistoryItem {
    pub fn change(
        property: impl Into<String>,
        property_type: PropertyType,
        original_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            property: property.into(),
            property_type,
            original_value,
            new_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub parent: GroupId,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

impl Entry {
    pub fn new(id: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(id),
            parent: GroupId::new(parent),
            fields: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with_field(Field::property(TITLE_PROPERTY, title))
    }

    pub fn field(&self, property: &str, property_type: PropertyType) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.same_key(property, property_type))
    }

    pub fn field_mut(&mut self, property: &str, property_type: PropertyType) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .find(|field| field.same_key(property, property_type))
    }

    /// First `title` property, if the entry carries one.
    pub fn title(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.is_title())
            .map(|field| field.value.as_str())
    }

    pub fn display_title(&self) -> &str {
        self.title().unwrap_or(UNTITLED_PLACEHOLDER)
    }
}
