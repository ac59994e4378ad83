//! Document items (template `006`): a file stored in the vault.
//!
//! A [`DocumentConfig`] names its content in one of three ways:
//!
//! - `file_path`: read from disk, the file's basename becomes `filename`;
//! - `filename` + `content`: UTF-8 text;
//! - `filename` + `content_base64`: standard (padded) base64.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::category::Category;
use crate::client::OpClient;
use crate::error::{OpError, Result};
use crate::models::{DocumentAttributes, Item};
use crate::runner::CommandRunner;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub name: String,
    pub tags: Vec<String>,
    pub vault: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_base64: Option<String>,
    pub archived: bool,
}

impl DocumentConfig {
    /// Check that exactly one content source is configured.
    pub fn validate(&self) -> Result<()> {
        if self.file_path.is_some() {
            if !self.filename.is_empty() || self.content.is_some() || self.content_base64.is_some()
            {
                return Err(OpError::InvalidDocumentSource(
                    "file_path conflicts with filename, content and content_base64",
                ));
            }
            return Ok(());
        }
        match (&self.content, &self.content_base64) {
            (Some(_), Some(_)) => Err(OpError::InvalidDocumentSource(
                "content and content_base64 are mutually exclusive",
            )),
            (None, None) => Err(OpError::InvalidDocumentSource(
                "one of file_path, content or content_base64 is required",
            )),
            _ if self.filename.is_empty() => Err(OpError::InvalidDocumentSource(
                "filename is required with content or content_base64",
            )),
            _ => Ok(()),
        }
    }

    /// Resolve the file name and bytes to upload.
    pub fn resolve(&self) -> Result<(String, Vec<u8>)> {
        self.validate()?;

        if let Some(path) = &self.file_path {
            let bytes = std::fs::read(path).map_err(|source| OpError::ReadFile {
                path: path.clone(),
                source,
            })?;
            return Ok((basename(path), bytes));
        }

        let bytes = match (&self.content, &self.content_base64) {
            (_, Some(encoded)) => STANDARD.decode(encoded.trim())?,
            (Some(text), None) => text.clone().into_bytes(),
            (None, None) => Vec::new(),
        };
        Ok((self.filename.clone(), bytes))
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A document as read back from the vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub vault: String,
    pub filename: String,
    /// File content as text; invalid UTF-8 sequences are replaced.
    pub content: String,
    pub content_base64: String,
    pub archived: bool,
}

impl DocumentState {
    pub fn from_item(item: &Item, bytes: &[u8]) -> Self {
        Self {
            id: item.uuid.clone(),
            name: item.overview.title.clone(),
            tags: item.overview.tags.clone(),
            vault: item.vault.clone(),
            filename: item
                .details
                .document_attributes
                .as_ref()
                .map(|attrs| attrs.file_name.clone())
                .unwrap_or_default(),
            content: String::from_utf8_lossy(bytes).into_owned(),
            content_base64: STANDARD.encode(bytes),
            archived: item.is_archived(),
        }
    }
}

/// Upload a document and return it as the vault now reports it.
pub fn create_document<R: CommandRunner>(
    client: &OpClient<R>,
    config: &DocumentConfig,
) -> Result<DocumentState> {
    let (file_name, bytes) = config.resolve()?;
    debug!(file_name = %file_name, bytes = bytes.len(), "resolved document content");

    let mut item = Item {
        template: Category::Document.template().to_string(),
        vault: config.vault.clone(),
        ..Item::default()
    };
    item.overview.title = config.name.clone();
    item.overview.tags = config.tags.clone();
    item.details.document_attributes = Some(DocumentAttributes { file_name });

    client.create_document(&mut item, &bytes)?;
    let vault = (!config.vault.is_empty()).then_some(config.vault.as_str());
    read_document(client, &item.uuid, vault)?.ok_or(OpError::Vanished(item.uuid))
}

/// Read a document item and its content. `Ok(None)` when the vault has no
/// such item.
pub fn read_document<R: CommandRunner>(
    client: &OpClient<R>,
    id: &str,
    vault: Option<&str>,
) -> Result<Option<DocumentState>> {
    let Some(item) = client.read_item_as(id, vault, Category::Document)? else {
        info!(id, vault = vault.unwrap_or_default(), "document not found");
        return Ok(None);
    };
    let bytes = client.read_document(&item.uuid)?;
    Ok(Some(DocumentState::from_item(&item, &bytes)))
}
