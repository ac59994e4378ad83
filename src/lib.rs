//! # op-bridge
//!
//! Manage password-manager items (identities, documents) and vaults through
//! the `op` command-line tool.
//!
//! Every operation spawns the CLI once, passes structured data as
//! command-line arguments or stdin, and decodes the JSON it prints. The
//! library owns the translation between user-facing records (named groups
//! of attributes, freeform fields) and the vault's section/field layout.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────┐   ┌──────────┐
//! │   Records    │──▶│    Codec     │──▶│  OpClient   │──▶│  Runner  │──▶ op
//! │ identity/doc │◀──│ groups ⇄ sec │◀──│ item/vault  │◀──│ OpCli    │◀──
//! └──────────────┘   └──────────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`category`] | Item categories and their template identifiers |
//! | [`client`] | Item, document and vault operations |
//! | [`codec`] | Section/field encoding and decoding |
//! | [`config`] | TOML configuration parsing |
//! | [`document`] | Document records |
//! | [`error`] | Error type and "not found" classification |
//! | [`identity`] | Identity records |
//! | [`models`] | Wire types exchanged with the CLI |
//! | [`runner`] | Subprocess invocation |

pub mod category;
pub mod client;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod models;
pub mod runner;

pub use client::OpClient;
pub use error::{OpError, Result};
pub use runner::{CommandRunner, OpCli, OpCommand};
