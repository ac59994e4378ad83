//! Wire types exchanged with the vault CLI.
//!
//! These mirror the JSON the CLI prints for `get item` / `get vault` and
//! accepts (base64-wrapped) for `create item`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::{template_to_category, Category};

/// Value of [`Item::trashed`] for archived items.
pub const TRASHED: &str = "Y";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub uuid: String,
    #[serde(rename = "templateUuid", alias = "templateUUID", default)]
    pub template: String,
    #[serde(rename = "vaultUuid", alias = "vaultUUID", default)]
    pub vault: String,
    #[serde(default)]
    pub overview: Overview,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub trashed: String,
}

impl Item {
    pub fn category(&self) -> Category {
        template_to_category(&self.template)
    }

    pub fn is_archived(&self) -> bool {
        self.trashed == TRASHED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Details {
    #[serde(rename = "notesPlain", default)]
    pub notes: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<Field>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
    #[serde(
        rename = "documentAttributes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_attributes: Option<DocumentAttributes>,
}

/// Legacy top-level field (`details.fields`), used by login and password items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAttributes {
    #[serde(rename = "fileName", default)]
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<SectionField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionField {
    #[serde(rename = "k")]
    pub kind: FieldKind,
    #[serde(rename = "t", default)]
    pub text: String,
    #[serde(rename = "v", default)]
    pub value: serde_json::Value,
    #[serde(rename = "n", default)]
    pub name: String,
    #[serde(rename = "a", default)]
    pub annotation: Annotation,
    #[serde(
        rename = "inputTraits",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub input_traits: BTreeMap<String, String>,
}

/// Rendering hints the vault attaches to a section field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guarded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<String>,
    #[serde(
        rename = "clipboardFilter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub clipboard_filter: Option<String>,
}

impl Annotation {
    pub fn guarded() -> Self {
        Self {
            guarded: Some("yes".to_string()),
            ..Self::default()
        }
    }
}

/// The `k` tag of a section field.
///
/// Kinds the CLI may add later are kept verbatim in [`FieldKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    String,
    Menu,
    Date,
    Address,
    Phone,
    Concealed,
    Url,
    Email,
    MonthYear,
    CardType,
    Reference,
    Other(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::String => "string",
            FieldKind::Menu => "menu",
            FieldKind::Date => "date",
            FieldKind::Address => "address",
            FieldKind::Phone => "phone",
            FieldKind::Concealed => "concealed",
            FieldKind::Url => "URL",
            FieldKind::Email => "email",
            FieldKind::MonthYear => "monthYear",
            FieldKind::CardType => "cctype",
            FieldKind::Reference => "reference",
            FieldKind::Other(kind) => kind,
        }
    }
}

impl From<String> for FieldKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "string" => FieldKind::String,
            "menu" => FieldKind::Menu,
            "date" => FieldKind::Date,
            "address" => FieldKind::Address,
            "phone" => FieldKind::Phone,
            "concealed" => FieldKind::Concealed,
            "URL" => FieldKind::Url,
            "email" => FieldKind::Email,
            "monthYear" => FieldKind::MonthYear,
            "cctype" => FieldKind::CardType,
            "reference" => FieldKind::Reference,
            _ => FieldKind::Other(kind),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured value of an `address` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    #[serde(alias = "UUID", default)]
    pub uuid: String,
    #[serde(alias = "Name", default)]
    pub name: String,
}

/// Payload printed by `create item` and `create document`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreateResult {
    #[serde(alias = "UUID")]
    pub uuid: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
