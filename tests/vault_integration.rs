//! Integration tests for record operations against an in-memory vault.
//!
//! `MemoryVault` implements `CommandRunner` by interpreting the argument
//! vectors the client builds, so these tests cover the full path from a
//! record through the codec and command builder and back.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use op_bridge::category::Category;
use op_bridge::codec::FieldConfig;
use op_bridge::document::{self, DocumentConfig};
use op_bridge::error::CommandFailure;
use op_bridge::identity::{self, IdentityConfig};
use op_bridge::models::{Details, DocumentAttributes, Item, Vault};
use op_bridge::{CommandRunner, OpClient, OpCommand, OpError, Result};
use serde_json::json;

// ─── In-memory vault ────────────────────────────────────────────────

#[derive(Default)]
struct MemoryVault {
    items: RefCell<BTreeMap<String, Item>>,
    documents: RefCell<BTreeMap<String, Vec<u8>>>,
    vaults: RefCell<BTreeMap<String, Vault>>,
    next_id: Cell<u32>,
    calls: Cell<usize>,
}

fn flag(operands: &[&str], name: &str) -> Option<String> {
    let prefix = format!("--{}=", name);
    operands
        .iter()
        .find_map(|arg| arg.strip_prefix(prefix.as_str()))
        .map(str::to_string)
}

fn tags(operands: &[&str]) -> Vec<String> {
    flag(operands, "tags")
        .map(|t| t.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

fn not_found(id: &str) -> OpError {
    CommandFailure {
        exit_code: Some(1),
        output: format!("[ERROR] \"{}\" isn't an item in any vault.", id),
        command: format!("get item {}", id),
    }
    .into()
}

fn resource_not_found() -> OpError {
    CommandFailure {
        exit_code: Some(4),
        output: "The requested resource was not found".to_string(),
        command: "get".to_string(),
    }
    .into()
}

impl MemoryVault {
    fn new_id(&self, prefix: &str) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("{}-{}", prefix, id)
    }

    fn insert(&self, item: Item) {
        self.items.borrow_mut().insert(item.uuid.clone(), item);
    }
}

impl CommandRunner for MemoryVault {
    fn run(&self, command: &OpCommand, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        let args = command.to_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let operands = &args[2..];

        match (args[0], args[1]) {
            ("get", "item") => {
                let items = self.items.borrow();
                let item = items
                    .get(operands[0])
                    .filter(|item| flag(operands, "vault").map_or(true, |v| v == item.vault))
                    .ok_or_else(|| not_found(operands[0]))?;
                Ok(serde_json::to_vec(item).unwrap())
            }
            ("create", "item") => {
                let category: Category = operands[0].parse().unwrap();
                let details: Details =
                    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(operands[1]).unwrap()).unwrap();
                let mut item = Item {
                    uuid: self.new_id("item"),
                    template: category.template().to_string(),
                    vault: flag(operands, "vault").unwrap_or_default(),
                    details,
                    ..Item::default()
                };
                item.overview.title = flag(operands, "title").unwrap_or_default();
                item.overview.url = flag(operands, "url").unwrap_or_default();
                item.overview.tags = tags(operands);
                let id = item.uuid.clone();
                self.insert(item);
                Ok(serde_json::to_vec(&json!({"uuid": id})).unwrap())
            }
            ("create", "document") => {
                assert_eq!(operands[0], "-");
                let mut item = Item {
                    uuid: self.new_id("doc"),
                    template: Category::Document.template().to_string(),
                    vault: flag(operands, "vault").unwrap_or_default(),
                    ..Item::default()
                };
                item.overview.title = flag(operands, "title").unwrap_or_default();
                item.overview.tags = tags(operands);
                item.details.document_attributes = Some(DocumentAttributes {
                    file_name: flag(operands, "filename").unwrap_or_default(),
                });
                let id = item.uuid.clone();
                self.documents
                    .borrow_mut()
                    .insert(id.clone(), stdin.unwrap_or_default().to_vec());
                self.insert(item);
                Ok(serde_json::to_vec(&json!({"uuid": id})).unwrap())
            }
            ("get", "document") => self
                .documents
                .borrow()
                .get(operands[0])
                .cloned()
                .ok_or_else(resource_not_found),
            ("delete", "item") => {
                self.documents.borrow_mut().remove(operands[0]);
                self.items
                    .borrow_mut()
                    .remove(operands[0])
                    .map(|_| Vec::new())
                    .ok_or_else(|| not_found(operands[0]))
            }
            ("get", "vault") => self
                .vaults
                .borrow()
                .get(operands[0])
                .map(|vault| serde_json::to_vec(vault).unwrap())
                .ok_or_else(resource_not_found),
            ("create", "vault") => {
                let vault = Vault {
                    uuid: self.new_id("vault"),
                    name: operands[0].to_string(),
                };
                self.vaults
                    .borrow_mut()
                    .insert(vault.uuid.clone(), vault.clone());
                Ok(serde_json::to_vec(&vault).unwrap())
            }
            ("delete", "vault") => self
                .vaults
                .borrow_mut()
                .remove(operands[0])
                .map(|_| Vec::new())
                .ok_or_else(resource_not_found),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

fn ada() -> IdentityConfig {
    let mut config = IdentityConfig {
        name: "Ada Lovelace".to_string(),
        tags: vec!["people".to_string(), "math".to_string()],
        vault: "Private".to_string(),
        notes: "Wrote the first published algorithm.".to_string(),
        ..IdentityConfig::default()
    };
    config.identification.firstname = "Ada".to_string();
    config.identification.lastname = "Lovelace".to_string();
    config.identification.sex = "female".to_string();
    config.identification.field =
        vec![FieldConfig::new("nickname", "string", json!("Enchantress of Numbers")).unwrap()];
    config.address.address.city = "London".to_string();
    config.address.cell_phone = "+44 20 0000 0000".to_string();
    config.internet.email = "ada@example.org".to_string();
    config
}

// ─── Identity ───────────────────────────────────────────────────────

#[test]
fn test_identity_round_trip() {
    let client = OpClient::new(MemoryVault::default());
    let config = ada();

    let created = identity::create_identity(&client, &config).unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.record, config);

    let read = identity::read_identity(&client, &created.id, Some("Private"))
        .unwrap()
        .unwrap();
    assert_eq!(read, created);
}

#[test]
fn test_identity_in_other_vault_is_absent() {
    let client = OpClient::new(MemoryVault::default());
    let created = identity::create_identity(&client, &ada()).unwrap();
    assert!(identity::read_identity(&client, &created.id, Some("Shared"))
        .unwrap()
        .is_none());
}

#[test]
fn test_invalid_email_never_reaches_the_vault() {
    let client = OpClient::new(MemoryVault::default());
    let mut config = ada();
    config.internet.email = "ada at example.org".to_string();

    let err = identity::create_identity(&client, &config).unwrap_err();
    assert!(matches!(err, OpError::InvalidEmail(_)));
    assert_eq!(client.runner().calls.get(), 0);
}

#[test]
fn test_unknown_template_never_reaches_the_vault() {
    let client = OpClient::new(MemoryVault::default());
    let mut item = Item {
        template: "999".to_string(),
        ..Item::default()
    };
    let err = client.create_item(&mut item).unwrap_err();
    assert_eq!(err.to_string(), "unknown template id 999");
    assert_eq!(client.runner().calls.get(), 0);
}

// ─── Document ───────────────────────────────────────────────────────

#[test]
fn test_document_round_trip_binary() {
    let client = OpClient::new(MemoryVault::default());
    let bytes = [0x89u8, b'P', b'N', b'G', 0x00, 0xff];
    let config = DocumentConfig {
        name: "Logo".to_string(),
        tags: vec!["brand".to_string()],
        filename: "logo.png".to_string(),
        content_base64: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
        ..DocumentConfig::default()
    };

    let state = document::create_document(&client, &config).unwrap();
    assert_eq!(state.name, "Logo");
    assert_eq!(state.filename, "logo.png");
    assert_eq!(state.tags, vec!["brand"]);
    assert_eq!(state.content_base64, config.content_base64.clone().unwrap());
    assert_eq!(state.content, String::from_utf8_lossy(&bytes));
    assert!(!state.archived);
}

#[test]
fn test_document_round_trip_text() {
    let client = OpClient::new(MemoryVault::default());
    let config = DocumentConfig {
        name: "Runbook".to_string(),
        filename: "runbook.md".to_string(),
        content: Some("# Restart\n\nsystemctl restart app\n".to_string()),
        ..DocumentConfig::default()
    };

    let created = document::create_document(&client, &config).unwrap();
    let read = document::read_document(&client, &created.id, None)
        .unwrap()
        .unwrap();
    assert_eq!(read, created);
    assert_eq!(read.content, "# Restart\n\nsystemctl restart app\n");
}

#[test]
fn test_wrong_category_is_hard_error() {
    let client = OpClient::new(MemoryVault::default());
    let doc = document::create_document(
        &client,
        &DocumentConfig {
            name: "Note".to_string(),
            filename: "note.txt".to_string(),
            content: Some("hi".to_string()),
            ..DocumentConfig::default()
        },
    )
    .unwrap();

    let err = identity::read_identity(&client, &doc.id, None).unwrap_err();
    assert_eq!(err.to_string(), "item is not from Identity (found Document)");
}

// ─── Delete and vaults ──────────────────────────────────────────────

#[test]
fn test_delete_is_idempotent() {
    let client = OpClient::new(MemoryVault::default());
    let created = identity::create_identity(&client, &ada()).unwrap();

    client.delete_item(&created.id).unwrap();
    assert!(client.read_item(&created.id, None).unwrap().is_none());
    client.delete_item(&created.id).unwrap();
}

#[test]
fn test_vault_lifecycle() {
    let client = OpClient::new(MemoryVault::default());
    let vault = client.create_vault("Ops").unwrap();
    assert_eq!(vault.name, "Ops");
    assert_eq!(client.read_vault(&vault.uuid).unwrap(), Some(vault.clone()));

    client.delete_vault(&vault.uuid).unwrap();
    assert_eq!(client.read_vault(&vault.uuid).unwrap(), None);
    client.delete_vault(&vault.uuid).unwrap();
}
