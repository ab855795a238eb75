//! pkgsync core library: domain types, manifest parsing, settings, errors.
//!
//! - [`types`]: [`ManifestEntry`] and [`SyncTarget`]
//! - [`manifest`]: the `packages` grammar and lazy parser
//! - [`settings`]: optional `pkgsync.yaml`
//! - [`error`]: [`ConfigError`], [`ParseWarning`], [`TargetError`]

pub mod error;
pub mod manifest;
pub mod settings;
pub mod types;

pub use error::{ConfigError, MalformedReason, ParseWarning, TargetError};
pub use manifest::{Manifest, DEFAULT_MANIFEST};
pub use settings::{PublishSettings, Settings};
pub use types::{ManifestEntry, SyncTarget, VCS_METADATA_DIR};
