//! Mapping between configuration groups and vault sections.
//!
//! A vault item stores its structured data as a list of [`Section`]s, each
//! holding typed [`SectionField`]s. Configuration records instead expose
//! named groups (`identification { firstname = ... }`), freeform field lists
//! and a catch-all `section` list. This module converts between the two.
//!
//! # Groups
//!
//! A [`SectionGroup`] ties one vault section (by its `name`, the selector)
//! to one configuration group, and lists the group's well-known fields in
//! the order they are written to the vault. Each [`FieldSpec`] carries the
//! field's vault metadata (kind, display text, annotation, input traits), so
//! encode and decode read from the same table.
//!
//! # Generic fields
//!
//! Fields that no group claims are rendered as `{name = <display text>,
//! <key> = <value>}` where the key is derived from the field kind:
//!
//! | kind | key |
//! |------|-----|
//! | `menu` | `sex` |
//! | `URL` | `url` |
//! | `monthYear` | `month_year` |
//! | `cctype` | `card_type` |
//! | `concealed` (`n` starts with `TOTP_`) | `totp` |
//! | `concealed` | `concealed` |
//! | anything else | lowercase kind |
//!
//! The last row loses case: an unknown kind is written back lowercased.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::{OpError, Result};
use crate::models::{Address, Annotation, FieldKind, Section, SectionField};

/// Field-name prefix marking a concealed field as a one-time-password seed.
pub const TOTP_PREFIX: &str = "TOTP_";

/// Attributes of one configuration group, keyed by attribute name.
pub type GroupAttrs = Map<String, Value>;

// ═══════════════════════════════════════════════════════════════════════
// Group tables
// ═══════════════════════════════════════════════════════════════════════

/// Input hints attached to a well-known field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTraits {
    None,
    Words,
    Sentences,
    EmailKeyboard,
}

impl InputTraits {
    pub fn to_map(self) -> BTreeMap<String, String> {
        let pair = match self {
            InputTraits::None => return BTreeMap::new(),
            InputTraits::Words => ("autocapitalization", "Words"),
            InputTraits::Sentences => ("autocapitalization", "Sentences"),
            InputTraits::EmailKeyboard => ("keyboard", "EmailAddress"),
        };
        BTreeMap::from([(pair.0.to_string(), pair.1.to_string())])
    }
}

/// A well-known field of a [`SectionGroup`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Configuration attribute name, e.g. `job_title`.
    pub attr: &'static str,
    /// Vault field-name key, e.g. `jobtitle`.
    pub key: &'static str,
    pub kind: FieldKind,
    /// Display text written to the vault.
    pub text: &'static str,
    pub traits: InputTraits,
}

impl FieldSpec {
    pub fn encode(&self, value: Value) -> SectionField {
        SectionField {
            kind: self.kind.clone(),
            text: self.text.to_string(),
            value,
            name: self.key.to_string(),
            annotation: Annotation::guarded(),
            input_traits: self.traits.to_map(),
        }
    }
}

/// Correspondence between one vault section and one configuration group.
#[derive(Debug, Clone)]
pub struct SectionGroup {
    /// Destination group key in the configuration record.
    pub name: &'static str,
    /// Vault section name this group claims.
    pub selector: &'static str,
    /// Title used when the configuration leaves it empty.
    pub default_title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SectionGroup {
    pub fn spec_for(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.key == key)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Generic fields and sections
// ═══════════════════════════════════════════════════════════════════════

/// A freeform field: a display name plus one `<key> = <value>` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GroupAttrs", into = "GroupAttrs")]
pub struct FieldConfig {
    pub name: String,
    pub key: String,
    pub value: Value,
}

impl FieldConfig {
    /// Build a field, checking that `value` has the shape `key` requires.
    pub fn new(name: impl Into<String>, key: impl Into<String>, value: Value) -> Result<Self> {
        let field = Self {
            name: name.into(),
            key: key.into(),
            value,
        };
        check_shape(&field.name, &field.key, &field.value)?;
        Ok(field)
    }
}

impl TryFrom<GroupAttrs> for FieldConfig {
    type Error = OpError;

    fn try_from(mut map: GroupAttrs) -> Result<Self> {
        let name = match map.remove("name") {
            Some(Value::String(name)) => name,
            None | Some(Value::Null) => String::new(),
            Some(other) => {
                return Err(OpError::ShapeMismatch {
                    field: "name".to_string(),
                    expected: "a string",
                    found: describe(&other),
                })
            }
        };
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((key, value)), None) => FieldConfig::new(name, key, value),
            (None, _) => Err(OpError::ShapeMismatch {
                field: name,
                expected: "exactly one value key",
                found: "none".to_string(),
            }),
            (Some((first, _)), Some((second, _))) => Err(OpError::ShapeMismatch {
                field: name,
                expected: "exactly one value key",
                found: format!("`{}` and `{}`", first, second),
            }),
        }
    }
}

impl From<FieldConfig> for GroupAttrs {
    fn from(field: FieldConfig) -> Self {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(field.name));
        map.insert(field.key, field.value);
        map
    }
}

/// A catch-all section: `{name = <title>, field = [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field: Vec<FieldConfig>,
}

/// Configuration key for a vault field that no group claims.
pub fn generic_key(field: &SectionField) -> String {
    match &field.kind {
        FieldKind::Menu => "sex".to_string(),
        FieldKind::Url => "url".to_string(),
        FieldKind::MonthYear => "month_year".to_string(),
        FieldKind::CardType => "card_type".to_string(),
        FieldKind::Concealed if field.name.starts_with(TOTP_PREFIX) => "totp".to_string(),
        FieldKind::Concealed => "concealed".to_string(),
        other => other.as_str().to_lowercase(),
    }
}

/// Vault field kind for a generic configuration key.
///
/// Kinds outside [`FieldKind`]'s named variants are keyed by their lowercase
/// name, so their original case is not recovered here: a `Gizmo` field reads
/// back under key `gizmo` and is written again as kind `gizmo`.
pub fn kind_for_key(key: &str) -> FieldKind {
    match key {
        "sex" => FieldKind::Menu,
        "url" => FieldKind::Url,
        "month_year" => FieldKind::MonthYear,
        "card_type" => FieldKind::CardType,
        "totp" | "concealed" => FieldKind::Concealed,
        other => FieldKind::from(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Text,
    Integer,
    Address,
}

fn shape_of(key: &str) -> Shape {
    match key {
        "date" | "month_year" => Shape::Integer,
        "address" => Shape::Address,
        _ => Shape::Text,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

/// Null is accepted for every key and means "no value".
fn check_shape(field: &str, key: &str, value: &Value) -> Result<()> {
    let (ok, expected) = match shape_of(key) {
        Shape::Text => (value.is_string(), "a string"),
        Shape::Integer => (value.is_i64() || value.is_u64(), "an integer"),
        Shape::Address => (
            value.is_object() && Address::deserialize(value).is_ok(),
            "an address object",
        ),
    };
    if ok || value.is_null() {
        Ok(())
    } else {
        Err(OpError::ShapeMismatch {
            field: if field.is_empty() { key } else { field }.to_string(),
            expected,
            found: describe(value),
        })
    }
}

/// Render a vault field through the generic kind mapping.
pub fn decode_field(field: &SectionField) -> Result<FieldConfig> {
    FieldConfig::new(field.text.clone(), generic_key(field), field.value.clone())
}

pub fn decode_fields(fields: &[SectionField]) -> Result<Vec<FieldConfig>> {
    fields.iter().map(decode_field).collect()
}

/// Encode a freeform field with a freshly generated field-name key.
pub fn encode_field(field: &FieldConfig) -> SectionField {
    let name = if field.key == "totp" {
        format!("{}{}", TOTP_PREFIX, new_key())
    } else {
        new_key()
    };
    SectionField {
        kind: kind_for_key(&field.key),
        text: field.name.clone(),
        value: field.value.clone(),
        name,
        annotation: Annotation::default(),
        input_traits: BTreeMap::new(),
    }
}

/// Encode a catch-all section under a generated section name.
pub fn encode_section(section: &SectionConfig) -> Section {
    Section {
        name: format!("Section_{}", new_key()),
        title: section.name.clone(),
        fields: section.field.iter().map(encode_field).collect(),
    }
}

fn new_key() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

// ═══════════════════════════════════════════════════════════════════════
// Encode
// ═══════════════════════════════════════════════════════════════════════

/// Flatten a typed group into its attribute map.
pub fn to_attrs<T: Serialize>(group: &T) -> Result<GroupAttrs> {
    match serde_json::to_value(group).map_err(OpError::json("section group"))? {
        Value::Object(map) => Ok(map),
        other => Err(OpError::ShapeMismatch {
            field: "section group".to_string(),
            expected: "an object",
            found: describe(&other),
        }),
    }
}

/// Build the vault section for one group.
///
/// Well-known fields come first, in table order, followed by the group's
/// `field` list. Absent well-known attributes are written as `null`.
pub fn encode_group(group: &SectionGroup, attrs: &GroupAttrs) -> Result<Section> {
    let title = attrs
        .get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty())
        .unwrap_or(group.default_title);

    let extra: Vec<FieldConfig> = match attrs.get("field") {
        Some(value) if !value.is_null() => {
            serde_json::from_value(value.clone()).map_err(OpError::json(group.name))?
        }
        _ => Vec::new(),
    };

    let fields = group
        .fields
        .iter()
        .map(|spec| spec.encode(attrs.get(spec.attr).cloned().unwrap_or(Value::Null)))
        .chain(extra.iter().map(encode_field))
        .collect();

    Ok(Section {
        name: group.selector.to_string(),
        title: title.to_string(),
        fields,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Decode
// ═══════════════════════════════════════════════════════════════════════

/// Result of [`decode_sections`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSections {
    /// Attributes per matched group, keyed by [`SectionGroup::name`].
    pub groups: BTreeMap<&'static str, GroupAttrs>,
    /// Sections no group claimed, in vault order.
    pub sections: Vec<SectionConfig>,
}

impl DecodedSections {
    /// Remove a group's attributes and deserialize them into `T`.
    ///
    /// A group with no matching vault section yields `T::default()`.
    pub fn take_group<T: DeserializeOwned + Default>(&mut self, group: &SectionGroup) -> Result<T> {
        match self.groups.remove(group.name) {
            Some(attrs) => {
                serde_json::from_value(Value::Object(attrs)).map_err(OpError::json(group.name))
            }
            None => Ok(T::default()),
        }
    }
}

/// Partition vault sections into configuration groups and leftovers.
///
/// Each section goes to the first group whose selector equals its name.
/// Within a matched section, fields whose key is in the group's table fill
/// the group's attributes (null values are skipped so defaults apply); the
/// rest become the group's `field` list. If two sections match the same
/// group the later one wins.
pub fn decode_sections(sections: &[Section], groups: &[SectionGroup]) -> Result<DecodedSections> {
    let mut decoded = DecodedSections::default();

    for section in sections {
        match groups.iter().find(|group| group.selector == section.name) {
            Some(group) => {
                let attrs = decode_group(group, section)?;
                if decoded.groups.insert(group.name, attrs).is_some() {
                    warn!(
                        group = group.name,
                        section = %section.name,
                        "duplicate section for group, keeping the last one"
                    );
                }
            }
            None => decoded.sections.push(SectionConfig {
                name: section.title.clone(),
                field: decode_fields(&section.fields)?,
            }),
        }
    }

    Ok(decoded)
}

fn decode_group(group: &SectionGroup, section: &Section) -> Result<GroupAttrs> {
    let mut attrs = Map::new();
    attrs.insert("title".to_string(), Value::String(section.title.clone()));

    let mut leftovers = Vec::new();
    for field in &section.fields {
        match group.spec_for(&field.name) {
            Some(spec) => {
                if !field.value.is_null() {
                    attrs.insert(spec.attr.to_string(), field.value.clone());
                }
            }
            None => leftovers.push(decode_field(field)?),
        }
    }

    attrs.insert(
        "field".to_string(),
        serde_json::to_value(&leftovers).map_err(OpError::json(group.name))?,
    );
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static NO_FIELDS: [FieldSpec; 0] = [];

    static NOTE_FIELDS: [FieldSpec; 2] = [
        FieldSpec {
            attr: "author",
            key: "writer",
            kind: FieldKind::String,
            text: "author",
            traits: InputTraits::Words,
        },
        FieldSpec {
            attr: "written_on",
            key: "written",
            kind: FieldKind::Date,
            text: "written on",
            traits: InputTraits::None,
        },
    ];

    fn groups() -> Vec<SectionGroup> {
        vec![
            SectionGroup {
                name: "note",
                selector: "note",
                default_title: "Note",
                fields: &NOTE_FIELDS,
            },
            SectionGroup {
                name: "shadow",
                selector: "note",
                default_title: "Shadow",
                fields: &NO_FIELDS,
            },
        ]
    }

    fn field(kind: &str, text: &str, n: &str, value: Value) -> SectionField {
        SectionField {
            kind: FieldKind::from(kind.to_string()),
            text: text.to_string(),
            value,
            name: n.to_string(),
            annotation: Annotation::default(),
            input_traits: BTreeMap::new(),
        }
    }

    #[test]
    fn test_generic_key_mapping() {
        let cases = [
            ("menu", "x", "sex"),
            ("URL", "x", "url"),
            ("monthYear", "x", "month_year"),
            ("cctype", "x", "card_type"),
            ("concealed", "TOTP_1", "totp"),
            ("concealed", "note", "concealed"),
            ("string", "x", "string"),
            ("phone", "x", "phone"),
            ("Gizmo", "x", "gizmo"),
        ];
        for (kind, n, key) in cases {
            assert_eq!(generic_key(&field(kind, "t", n, Value::Null)), key, "kind {}", kind);
        }
    }

    #[test]
    fn test_kind_for_key_inverts_mapping() {
        for key in ["sex", "url", "month_year", "card_type", "concealed", "string", "email", "date"] {
            let kind = kind_for_key(key);
            assert_eq!(generic_key(&field(kind.as_str(), "t", "n", Value::Null)), key);
        }
        assert_eq!(kind_for_key("totp"), FieldKind::Concealed);
    }

    #[test]
    fn test_unknown_kind_comes_back_lowercase() {
        let read = decode_field(&field("Gizmo", "widget", "W1", json!("x"))).unwrap();
        assert_eq!(read.key, "gizmo");
        let written = encode_field(&read);
        assert_eq!(written.kind, FieldKind::Other("gizmo".to_string()));
        assert_eq!(written.kind.as_str(), "gizmo");
        assert_eq!(written.value, json!("x"));
    }

    #[test]
    fn test_unmatched_section_rendered_generically() {
        let sections = vec![Section {
            name: "Section_ABC".to_string(),
            title: "Secrets".to_string(),
            fields: vec![
                field("concealed", "one-time", "TOTP_1", json!("otpauth://x")),
                field("concealed", "pin", "note", json!("1234")),
            ],
        }];
        let decoded = decode_sections(&sections, &groups()).unwrap();
        assert!(decoded.groups.is_empty());
        assert_eq!(decoded.sections.len(), 1);
        let rendered = serde_json::to_value(&decoded.sections[0]).unwrap();
        assert_eq!(
            rendered,
            json!({
                "name": "Secrets",
                "field": [
                    {"name": "one-time", "totp": "otpauth://x"},
                    {"name": "pin", "concealed": "1234"}
                ]
            })
        );
    }

    #[test]
    fn test_matched_section_partitions_fields() {
        let sections = vec![Section {
            name: "note".to_string(),
            title: "My Note".to_string(),
            fields: vec![
                field("string", "author", "writer", json!("Ada")),
                field("date", "written on", "written", Value::Null),
                field("URL", "homepage", "A1B2", json!("https://example.com")),
            ],
        }];
        let mut decoded = decode_sections(&sections, &groups()).unwrap();
        assert!(decoded.sections.is_empty());
        assert!(!decoded.groups.contains_key("shadow"), "only the first group matches");

        let attrs = decoded.groups.remove("note").unwrap();
        assert_eq!(attrs["title"], json!("My Note"));
        assert_eq!(attrs["author"], json!("Ada"));
        assert!(attrs.get("written_on").is_none(), "null values are skipped");
        assert_eq!(
            attrs["field"],
            json!([{"name": "homepage", "url": "https://example.com"}])
        );
    }

    #[test]
    fn test_later_duplicate_section_wins() {
        let sections = vec![
            Section {
                name: "note".to_string(),
                title: "First".to_string(),
                fields: vec![],
            },
            Section {
                name: "note".to_string(),
                title: "Second".to_string(),
                fields: vec![],
            },
        ];
        let decoded = decode_sections(&sections, &groups()).unwrap();
        assert_eq!(decoded.groups["note"]["title"], json!("Second"));
    }

    #[test]
    fn test_shape_mismatch_is_hard_error() {
        let sections = vec![Section {
            name: "misc".to_string(),
            title: "Misc".to_string(),
            fields: vec![field("date", "born", "x", json!("yesterday"))],
        }];
        let err = decode_sections(&sections, &groups()).unwrap_err();
        match err {
            OpError::ShapeMismatch { field, expected, .. } => {
                assert_eq!(field, "born");
                assert_eq!(expected, "an integer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_address_shape() {
        assert!(FieldConfig::new("home", "address", json!({"city": "London"})).is_ok());
        assert!(FieldConfig::new("home", "address", json!("London")).is_err());
        assert!(FieldConfig::new("home", "address", json!({"city": 7})).is_err());
    }

    #[test]
    fn test_field_config_serde() {
        let field: FieldConfig =
            serde_json::from_value(json!({"name": "nickname", "string": "Ace"})).unwrap();
        assert_eq!(field.key, "string");
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"name": "nickname", "string": "Ace"})
        );

        let err = serde_json::from_value::<FieldConfig>(json!({"name": "x"})).unwrap_err();
        assert!(err.to_string().contains("exactly one value key"));
        let err =
            serde_json::from_value::<FieldConfig>(json!({"name": "x", "url": "a", "email": "b"}))
                .unwrap_err();
        assert!(err.to_string().contains("exactly one value key"));
        assert!(serde_json::from_value::<FieldConfig>(json!({"name": "x", "date": "soon"})).is_err());
    }

    #[test]
    fn test_encode_group_layout() {
        let mut attrs = Map::new();
        attrs.insert("title".to_string(), json!(""));
        attrs.insert("author".to_string(), json!("Ada"));
        attrs.insert(
            "field".to_string(),
            json!([{"name": "seed", "totp": "otpauth://y"}]),
        );
        let section = encode_group(&groups()[0], &attrs).unwrap();
        assert_eq!(section.name, "note");
        assert_eq!(section.title, "Note");
        assert_eq!(section.fields.len(), 3);

        let author = &section.fields[0];
        assert_eq!(author.name, "writer");
        assert_eq!(author.value, json!("Ada"));
        assert_eq!(author.annotation, Annotation::guarded());
        assert_eq!(author.input_traits["autocapitalization"], "Words");

        assert_eq!(section.fields[1].value, Value::Null);

        let seed = &section.fields[2];
        assert_eq!(seed.kind, FieldKind::Concealed);
        assert!(seed.name.starts_with(TOTP_PREFIX));
        assert_eq!(generic_key(seed), "totp");
    }

    #[test]
    fn test_encoded_section_gets_unique_name() {
        let config = SectionConfig {
            name: "Extra".to_string(),
            field: vec![FieldConfig::new("color", "string", json!("blue")).unwrap()],
        };
        let a = encode_section(&config);
        let b = encode_section(&config);
        assert_eq!(a.title, "Extra");
        assert!(a.name.starts_with("Section_"));
        assert_ne!(a.name, b.name);
        assert_eq!(a.fields[0].kind, FieldKind::String);
    }

    #[test]
    fn test_freeform_fields_survive_encode_decode() {
        let mut attrs = Map::new();
        attrs.insert(
            "field".to_string(),
            json!([
                {"name": "nickname", "string": "Ace"},
                {"name": "expiry", "month_year": 202512},
                {"name": "seed", "totp": "otpauth://z"}
            ]),
        );
        let section = encode_group(&groups()[0], &attrs).unwrap();
        let decoded = decode_sections(&[section], &groups()).unwrap();
        let fields: Vec<FieldConfig> =
            serde_json::from_value(decoded.groups["note"]["field"].clone()).unwrap();
        let by_name: BTreeMap<_, _> = fields.iter().map(|f| (f.name.as_str(), f)).collect();
        assert_eq!(by_name["nickname"].key, "string");
        assert_eq!(by_name["expiry"].value, json!(202512));
        assert_eq!(by_name["seed"].key, "totp");
    }
}
