//! Item categories and the vault's numeric template identifiers.
//!
//! Both lookup directions are built from the single [`CATEGORY_TEMPLATES`]
//! list, so `template_to_category(category_to_template(c)) == c` holds for
//! every known category.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Template identifier sent for [`Category::Unknown`].
pub const UNKNOWN_TEMPLATE: &str = "000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Login,
    Identity,
    Database,
    Membership,
    #[serde(rename = "Wireless Router")]
    WirelessRouter,
    #[serde(rename = "Secure Note")]
    SecureNote,
    #[serde(rename = "Software License")]
    SoftwareLicense,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Driver License")]
    DriverLicense,
    #[serde(rename = "Outdoor License")]
    OutdoorLicense,
    Passport,
    #[serde(rename = "Email Account")]
    EmailAccount,
    Password,
    #[serde(rename = "Reward Program")]
    RewardProgram,
    #[serde(rename = "Social Security Number")]
    SocialSecurityNumber,
    #[serde(rename = "Bank Account")]
    BankAccount,
    Document,
    Server,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

pub const CATEGORY_TEMPLATES: [(Category, &str); 18] = [
    (Category::Login, "001"),
    (Category::CreditCard, "002"),
    (Category::SecureNote, "003"),
    (Category::Identity, "004"),
    (Category::Password, "005"),
    (Category::Document, "006"),
    (Category::Server, "010"),
    (Category::SoftwareLicense, "100"),
    (Category::BankAccount, "101"),
    (Category::Database, "102"),
    (Category::DriverLicense, "103"),
    (Category::OutdoorLicense, "104"),
    (Category::Membership, "105"),
    (Category::Passport, "106"),
    (Category::RewardProgram, "107"),
    (Category::SocialSecurityNumber, "108"),
    (Category::WirelessRouter, "109"),
    (Category::EmailAccount, "111"),
];

static BY_CATEGORY: Lazy<HashMap<Category, &'static str>> =
    Lazy::new(|| CATEGORY_TEMPLATES.iter().copied().collect());

static BY_TEMPLATE: Lazy<HashMap<&'static str, Category>> = Lazy::new(|| {
    CATEGORY_TEMPLATES
        .iter()
        .map(|&(category, template)| (template, category))
        .collect()
});

/// Template identifier for a category; `"000"` for [`Category::Unknown`].
///
/// Only meaningful when building requests. Responses are interpreted with
/// [`template_to_category`].
pub fn category_to_template(category: Category) -> &'static str {
    BY_CATEGORY
        .get(&category)
        .copied()
        .unwrap_or(UNKNOWN_TEMPLATE)
}

/// Category for a template identifier; [`Category::Unknown`] when unrecognised.
pub fn template_to_category(template: &str) -> Category {
    BY_TEMPLATE
        .get(template)
        .copied()
        .unwrap_or(Category::Unknown)
}

impl Category {
    /// Every known category, in template order.
    pub fn all() -> impl Iterator<Item = Category> {
        CATEGORY_TEMPLATES.iter().map(|&(category, _)| category)
    }

    /// Human-readable name, as the CLI expects it in `create item <category>`.
    pub fn name(self) -> &'static str {
        match self {
            Category::Login => "Login",
            Category::Identity => "Identity",
            Category::Database => "Database",
            Category::Membership => "Membership",
            Category::WirelessRouter => "Wireless Router",
            Category::SecureNote => "Secure Note",
            Category::SoftwareLicense => "Software License",
            Category::CreditCard => "Credit Card",
            Category::DriverLicense => "Driver License",
            Category::OutdoorLicense => "Outdoor License",
            Category::Passport => "Passport",
            Category::EmailAccount => "Email Account",
            Category::Password => "Password",
            Category::RewardProgram => "Reward Program",
            Category::SocialSecurityNumber => "Social Security Number",
            Category::BankAccount => "Bank Account",
            Category::Document => "Document",
            Category::Server => "Server",
            Category::Unknown => "UNKNOWN",
        }
    }

    pub fn template(self) -> &'static str {
        category_to_template(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive lookup by name or template identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::all()
            .find(|c| c.name().eq_ignore_ascii_case(wanted) || c.template() == wanted)
            .ok_or_else(|| format!("unknown category: '{}'", s))
    }
}
