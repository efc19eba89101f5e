//! One-time profile setup.
//!
//! Creates (or imports) an Ed25519 key pair, binds it to an ORCID iD and a
//! display name, and stores the result with a [`DirectoryStore`]. Imported
//! keys use the store's own file format (hex, one key per file), so an
//! existing `id_ed25519` / `id_ed25519.pub` pair can be copied in. Optionally
//! publishes an introduction document declaring the key, and records its
//! identifier in the stored profile.

use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::{SigningKey, VerifyingKey};
use nanopub::{finalize, introduction, sign, DirectoryStore, Nanopub, OrcidId, Profile, ProfileError};
use rand::rngs::OsRng;
use tracing::info;

use crate::client::{PublishError, Publisher};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("a profile already exists at {0}; pass --force to replace it")]
    AlreadyConfigured(String),

    #[error("cannot import key from {path}: {reason}")]
    KeyImport { path: String, reason: String },

    #[error("public key in {0} does not belong to the imported private key")]
    KeyMismatch(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Nanopub(#[from] nanopub::Error),

    #[error("publishing the introduction failed: {0}")]
    Publish(#[from] PublishError),
}

#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub orcid_id: String,
    pub name: String,
    /// File holding a hex-encoded 32-byte seed. A fresh key is generated
    /// when absent.
    pub key_file: Option<PathBuf>,
    /// Matching hex-encoded public key, checked against `key_file`.
    pub public_key_file: Option<PathBuf>,
    pub force: bool,
}

/// Build the profile described by `options` without storing it.
pub fn build_profile(options: &SetupOptions) -> Result<Profile, SetupError> {
    let orcid_id: OrcidId = options.orcid_id.parse()?;
    let signing_key = match &options.key_file {
        Some(path) => import_key(path)?,
        None => SigningKey::generate(&mut OsRng),
    };
    if let Some(path) = &options.public_key_file {
        let public = VerifyingKey::from_bytes(&read_key_bytes(path)?).map_err(|e| SetupError::KeyImport {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if options.key_file.is_none() || public != signing_key.verifying_key() {
            return Err(SetupError::KeyMismatch(path.display().to_string()));
        }
    }
    Ok(Profile::new(signing_key, orcid_id, options.name.clone()))
}

/// Create and store a profile, publishing its introduction when a
/// `publisher` is given.
pub fn run(
    store: &DirectoryStore,
    options: &SetupOptions,
    publisher: Option<&Publisher>,
) -> Result<Profile, SetupError> {
    if store.exists() && !options.force {
        return Err(SetupError::AlreadyConfigured(store.dir().display().to_string()));
    }

    let mut profile = build_profile(options)?;
    store.save(&profile)?;
    info!(dir = %store.dir().display(), fingerprint = %profile.fingerprint(), "profile created");

    if let Some(publisher) = publisher {
        let draft = introduction(&profile).map_err(nanopub::Error::from)?;
        let signed = sign(finalize(draft), Some(&profile)).map_err(nanopub::Error::from)?;
        let published = publisher.publish(&signed)?;
        let uri = signed.uri().as_iri().unwrap_or_default().to_string();
        info!(%uri, server = %published.server, "introduction published");

        profile = profile.with_introduction(uri);
        store.save(&profile)?;
    }

    Ok(profile)
}

fn import_key(path: &Path) -> Result<SigningKey, SetupError> {
    Ok(SigningKey::from_bytes(&read_key_bytes(path)?))
}

fn read_key_bytes(path: &Path) -> Result<[u8; 32], SetupError> {
    let fail = |reason: String| SetupError::KeyImport {
        path: path.display().to_string(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    hex::decode(text.trim())
        .map_err(|e| fail(e.to_string()))?
        .try_into()
        .map_err(|_| fail("expected 32 bytes".into()))
}
