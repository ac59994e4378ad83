//! Item, document and vault operations against the vault CLI.
//!
//! Each method builds one [`OpCommand`], runs it through the configured
//! [`CommandRunner`] and decodes the answer. Nothing is cached and nothing
//! is retried.
//!
//! | Method | Command |
//! |--------|---------|
//! | [`read_item`](OpClient::read_item) | `get item <id> [--vault=]` |
//! | [`create_item`](OpClient::create_item) | `create item <category> <details> [--vault= --title= --url= --tags=]` |
//! | [`delete_item`](OpClient::delete_item) | `delete item <id>` |
//! | [`read_document`](OpClient::read_document) | `get document <id>` |
//! | [`create_document`](OpClient::create_document) | `create document - --title= --filename= [--tags= --vault=]` |
//! | [`read_vault`](OpClient::read_vault) | `get vault <id>` |
//! | [`create_vault`](OpClient::create_vault) | `create vault <name>` |
//! | [`delete_vault`](OpClient::delete_vault) | `delete vault <id>` |

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tracing::info;

use crate::category::{Category, UNKNOWN_TEMPLATE};
use crate::error::{OpError, Result};
use crate::models::{CreateResult, Item, Vault};
use crate::runner::{CommandRunner, OpCli, OpCommand, Resource, Verb, STDIN};

pub struct OpClient<R = OpCli> {
    runner: R,
}

impl<R: CommandRunner> OpClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run a command, mapping a "not found" answer to `None`.
    fn run_lookup(&self, command: &OpCommand) -> Result<Option<Vec<u8>>> {
        match self.runner.run(command, None) {
            Ok(out) => Ok(Some(out)),
            Err(OpError::Command(failure)) if failure.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch an item. `Ok(None)` when the vault does not have it.
    pub fn read_item(&self, id: &str, vault: Option<&str>) -> Result<Option<Item>> {
        let command = OpCommand::new(Verb::Get, Resource::Item)
            .arg(id)
            .flag_if_set("vault", vault.unwrap_or_default());

        match self.run_lookup(&command)? {
            Some(out) if !out.is_empty() => serde_json::from_slice(&out)
                .map(Some)
                .map_err(OpError::json("item")),
            _ => {
                info!(id, vault = vault.unwrap_or_default(), "item not found");
                Ok(None)
            }
        }
    }

    /// Fetch an item and require it to belong to `expected`.
    ///
    /// Guards against importing an item of one kind under a resource of
    /// another.
    pub fn read_item_as(
        &self,
        id: &str,
        vault: Option<&str>,
        expected: Category,
    ) -> Result<Option<Item>> {
        let Some(item) = self.read_item(id, vault)? else {
            return Ok(None);
        };
        if item.template != expected.template() {
            return Err(OpError::WrongCategory {
                expected,
                actual: item.category(),
            });
        }
        Ok(Some(item))
    }

    /// Create an item and store the vault-assigned id in `item.uuid`.
    ///
    /// The details are sent as URL-safe, unpadded base64 JSON.
    pub fn create_item(&self, item: &mut Item) -> Result<()> {
        let category = item.category();
        if category == Category::Unknown {
            let template = if item.template.is_empty() {
                UNKNOWN_TEMPLATE
            } else {
                item.template.as_str()
            };
            return Err(OpError::UnknownTemplate(template.to_string()));
        }

        let details = serde_json::to_vec(&item.details).map_err(OpError::json("item details"))?;

        let command = OpCommand::new(Verb::Create, Resource::Item)
            .arg(category.name())
            .secret(URL_SAFE_NO_PAD.encode(details))
            .flag_if_set("vault", &item.vault)
            .flag_if_set("title", &item.overview.title)
            .flag_if_set("url", &item.overview.url)
            .flag_if_set("tags", &item.overview.tags.join(","));

        let out = self.runner.run(&command, None)?;
        item.uuid = result_id(&out)?;
        info!(id = %item.uuid, category = %category, "item created");
        Ok(())
    }

    /// Delete an item. Deleting an item that is already gone succeeds.
    pub fn delete_item(&self, id: &str) -> Result<()> {
        self.delete(Resource::Item, id)
    }

    /// Raw file content of a document item.
    pub fn read_document(&self, id: &str) -> Result<Vec<u8>> {
        let command = OpCommand::new(Verb::Get, Resource::Document).arg(id);
        self.runner.run(&command, None)
    }

    /// Upload `content` as a new document item; the bytes go over stdin.
    pub fn create_document(&self, item: &mut Item, content: &[u8]) -> Result<()> {
        let file_name = item
            .details
            .document_attributes
            .as_ref()
            .map(|attrs| attrs.file_name.clone())
            .ok_or_else(|| OpError::MissingDocumentAttributes(item.overview.title.clone()))?;

        let command = OpCommand::new(Verb::Create, Resource::Document)
            .arg(STDIN)
            .flag("title", &item.overview.title)
            .flag("filename", &file_name)
            .flag_if_set("tags", &item.overview.tags.join(","))
            .flag_if_set("vault", &item.vault);

        let out = self.runner.run(&command, Some(content))?;
        item.uuid = result_id(&out)?;
        info!(id = %item.uuid, file_name = %file_name, bytes = content.len(), "document created");
        Ok(())
    }

    /// Fetch a vault. `Ok(None)` when it does not exist.
    pub fn read_vault(&self, id: &str) -> Result<Option<Vault>> {
        let command = OpCommand::new(Verb::Get, Resource::Vault).arg(id);
        match self.run_lookup(&command)? {
            Some(out) if !out.is_empty() => serde_json::from_slice(&out)
                .map(Some)
                .map_err(OpError::json("vault")),
            _ => {
                info!(id, "vault not found");
                Ok(None)
            }
        }
    }

    pub fn create_vault(&self, name: &str) -> Result<Vault> {
        let command = OpCommand::new(Verb::Create, Resource::Vault).arg(name);
        let out = self.runner.run(&command, None)?;
        let mut vault: Vault = serde_json::from_slice(&out).map_err(OpError::json("vault"))?;
        if vault.name.is_empty() {
            vault.name = name.to_string();
        }
        info!(id = %vault.uuid, name = %vault.name, "vault created");
        Ok(vault)
    }

    /// Delete a vault. Deleting a vault that is already gone succeeds.
    pub fn delete_vault(&self, id: &str) -> Result<()> {
        self.delete(Resource::Vault, id)
    }

    fn delete(&self, resource: Resource, id: &str) -> Result<()> {
        let command = OpCommand::new(Verb::Delete, resource).arg(id);
        if self.run_lookup(&command)?.is_none() {
            info!(id, resource = resource.as_str(), "already deleted");
        }
        Ok(())
    }
}

fn result_id(out: &[u8]) -> Result<String> {
    let result: CreateResult = serde_json::from_slice(out).map_err(OpError::json("create result"))?;
    Ok(result.uuid)
}
