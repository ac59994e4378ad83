//! Identity items (template `004`).
//!
//! An identity is stored as three fixed sections (`name`, `address`,
//! `internet`) plus any number of freeform sections. [`IdentityConfig`] is
//! the record a user writes; [`Identity`] is what a read returns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::category::Category;
use crate::client::OpClient;
use crate::codec::{
    decode_sections, encode_group, encode_section, to_attrs, FieldConfig, FieldSpec, InputTraits,
    SectionConfig, SectionGroup,
};
use crate::error::{OpError, Result};
use crate::models::{Address, FieldKind, Item};
use crate::runner::CommandRunner;

static IDENTIFICATION_FIELDS: [FieldSpec; 9] = [
    FieldSpec {
        attr: "firstname",
        key: "firstname",
        kind: FieldKind::String,
        text: "firstname",
        traits: InputTraits::Words,
    },
    FieldSpec {
        attr: "initial",
        key: "initial",
        kind: FieldKind::String,
        text: "initial",
        traits: InputTraits::Words,
    },
    FieldSpec {
        attr: "lastname",
        key: "lastname",
        kind: FieldKind::String,
        text: "lastname",
        traits: InputTraits::Words,
    },
    FieldSpec {
        attr: "sex",
        key: "sex",
        kind: FieldKind::Menu,
        text: "sex",
        traits: InputTraits::None,
    },
    FieldSpec {
        attr: "birth_date",
        key: "birthdate",
        kind: FieldKind::Date,
        text: "birth date",
        traits: InputTraits::None,
    },
    FieldSpec {
        attr: "occupation",
        key: "occupation",
        kind: FieldKind::String,
        text: "occupation",
        traits: InputTraits::Words,
    },
    FieldSpec {
        attr: "company",
        key: "company",
        kind: FieldKind::String,
        text: "company",
        traits: InputTraits::Words,
    },
    FieldSpec {
        attr: "department",
        key: "department",
        kind: FieldKind::String,
        text: "department",
        traits: InputTraits::Words,
    },
    FieldSpec {
        attr: "job_title",
        key: "jobtitle",
        kind: FieldKind::String,
        text: "job title",
        traits: InputTraits::Words,
    },
];

static ADDRESS_FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        attr: "address",
        key: "address",
        kind: FieldKind::Address,
        text: "address",
        traits: InputTraits::Sentences,
    },
    FieldSpec {
        attr: "default_phone",
        key: "defphone",
        kind: FieldKind::Phone,
        text: "default phone",
        traits: InputTraits::None,
    },
    FieldSpec {
        attr: "home_phone",
        key: "homephone",
        kind: FieldKind::Phone,
        text: "home",
        traits: InputTraits::None,
    },
    FieldSpec {
        attr: "cell_phone",
        key: "cellphone",
        kind: FieldKind::Phone,
        text: "cell",
        traits: InputTraits::None,
    },
    FieldSpec {
        attr: "business_phone",
        key: "busphone",
        kind: FieldKind::Phone,
        text: "business",
        traits: InputTraits::None,
    },
];

static INTERNET_FIELDS: [FieldSpec; 2] = [
    FieldSpec {
        attr: "username",
        key: "username",
        kind: FieldKind::String,
        text: "username",
        traits: InputTraits::Sentences,
    },
    FieldSpec {
        attr: "email",
        key: "email",
        kind: FieldKind::String,
        text: "email",
        traits: InputTraits::EmailKeyboard,
    },
];

/// Section groups of an identity item, in the order they are written.
pub static IDENTITY_GROUPS: [SectionGroup; 3] = [
    SectionGroup {
        name: "identification",
        selector: "name",
        default_title: "Identification",
        fields: &IDENTIFICATION_FIELDS,
    },
    SectionGroup {
        name: "address",
        selector: "address",
        default_title: "Address",
        fields: &ADDRESS_FIELDS,
    },
    SectionGroup {
        name: "internet",
        selector: "internet",
        default_title: "Internet Details",
        fields: &INTERNET_FIELDS,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(format!("expected 'male' or 'female', got '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identification {
    pub title: String,
    pub firstname: String,
    pub initial: String,
    pub lastname: String,
    /// `male` or `female` in any case; empty means unset. Checked only when
    /// a record is written, so any value the vault holds reads back as is.
    pub sex: String,
    /// Unix timestamp in seconds.
    pub birth_date: Option<i64>,
    pub occupation: String,
    pub company: String,
    pub department: String,
    pub job_title: String,
    pub field: Vec<FieldConfig>,
}

impl Identification {
    pub fn parsed_sex(&self) -> Result<Option<Sex>> {
        let raw = self.sex.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|_| OpError::InvalidSex(self.sex.clone()))
    }
}

impl Default for Identification {
    fn default() -> Self {
        Self {
            title: IDENTITY_GROUPS[0].default_title.to_string(),
            firstname: String::new(),
            initial: String::new(),
            lastname: String::new(),
            sex: String::new(),
            birth_date: None,
            occupation: String::new(),
            company: String::new(),
            department: String::new(),
            job_title: String::new(),
            field: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressGroup {
    pub title: String,
    pub address: Address,
    pub default_phone: String,
    pub home_phone: String,
    pub cell_phone: String,
    pub business_phone: String,
    pub field: Vec<FieldConfig>,
}

impl Default for AddressGroup {
    fn default() -> Self {
        Self {
            title: IDENTITY_GROUPS[1].default_title.to_string(),
            address: Address::default(),
            default_phone: String::new(),
            home_phone: String::new(),
            cell_phone: String::new(),
            business_phone: String::new(),
            field: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Internet {
    pub title: String,
    pub username: String,
    pub email: String,
    pub field: Vec<FieldConfig>,
}

impl Default for Internet {
    fn default() -> Self {
        Self {
            title: IDENTITY_GROUPS[2].default_title.to_string(),
            username: String::new(),
            email: String::new(),
            field: Vec::new(),
        }
    }
}

/// An identity as written in a record file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub name: String,
    pub tags: Vec<String>,
    pub vault: String,
    pub notes: String,
    pub identification: Identification,
    pub address: AddressGroup,
    pub internet: Internet,
    pub section: Vec<SectionConfig>,
    /// Only meaningful on read; creating an archived item is not supported.
    pub archived: bool,
}

impl IdentityConfig {
    pub fn validate(&self) -> Result<()> {
        self.identification.parsed_sex()?;
        let email = self.internet.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            return Err(OpError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    /// Build the vault item for this record. All three groups are always
    /// emitted, followed by the freeform sections.
    pub fn to_item(&self) -> Result<Item> {
        self.validate()?;

        let mut identification = to_attrs(&self.identification)?;
        if let Some(sex) = self.identification.parsed_sex()? {
            identification.insert("sex".to_string(), Value::String(sex.as_str().to_string()));
        }

        let mut sections = vec![
            encode_group(&IDENTITY_GROUPS[0], &identification)?,
            encode_group(&IDENTITY_GROUPS[1], &to_attrs(&self.address)?)?,
            encode_group(&IDENTITY_GROUPS[2], &to_attrs(&self.internet)?)?,
        ];
        sections.extend(self.section.iter().map(encode_section));

        let mut item = Item {
            template: Category::Identity.template().to_string(),
            vault: self.vault.clone(),
            ..Item::default()
        };
        item.overview.title = self.name.clone();
        item.overview.tags = self.tags.clone();
        item.details.notes = self.notes.clone();
        item.details.sections = sections;
        Ok(item)
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// An identity as read back from the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(flatten)]
    pub record: IdentityConfig,
}

impl Identity {
    pub fn from_item(item: &Item) -> Result<Self> {
        let mut decoded = decode_sections(&item.details.sections, &IDENTITY_GROUPS)?;
        let record = IdentityConfig {
            name: item.overview.title.clone(),
            tags: item.overview.tags.clone(),
            vault: item.vault.clone(),
            notes: item.details.notes.clone(),
            identification: decoded.take_group(&IDENTITY_GROUPS[0])?,
            address: decoded.take_group(&IDENTITY_GROUPS[1])?,
            internet: decoded.take_group(&IDENTITY_GROUPS[2])?,
            section: decoded.sections,
            archived: item.is_archived(),
        };
        Ok(Self {
            id: item.uuid.clone(),
            record,
        })
    }
}

/// Create an identity item and return it as the vault now reports it.
pub fn create_identity<R: CommandRunner>(
    client: &OpClient<R>,
    config: &IdentityConfig,
) -> Result<Identity> {
    let mut item = config.to_item()?;
    client.create_item(&mut item)?;
    let vault = (!config.vault.is_empty()).then_some(config.vault.as_str());
    read_identity(client, &item.uuid, vault)?.ok_or(OpError::Vanished(item.uuid))
}

/// Read an identity. `Ok(None)` when the vault has no such item.
pub fn read_identity<R: CommandRunner>(
    client: &OpClient<R>,
    id: &str,
    vault: Option<&str>,
) -> Result<Option<Identity>> {
    match client.read_item_as(id, vault, Category::Identity)? {
        Some(item) => Identity::from_item(&item).map(Some),
        None => {
            info!(id, vault = vault.unwrap_or_default(), "identity not found");
            Ok(None)
        }
    }
}
