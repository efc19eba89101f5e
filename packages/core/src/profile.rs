//! The publishing identity: an Ed25519 key pair, an ORCID iD and a display
//! name.
//!
//! A [`Profile`] is loaded once through a [`ProfileStore`] and then only read.
//! Operations that attribute or sign take it as an explicit argument.
//!
//! # On-disk layout ([`DirectoryStore`])
//!
//! ```text
//! $NANOPUB_HOME/               (default: $HOME/.nanopub)
//!   profile.json               { "orcid_id", "name", "public_key", "private_key", … }
//!   id_ed25519                 hex-encoded 32-byte seed
//!   id_ed25519.pub             hex-encoded 32-byte public key
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{SigningKey, VerifyingKey};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::error::ErrorKind;

/// Errors returned while loading or saving a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no profile configured at {0}; run `np setup` first")]
    NotConfigured(String),

    #[error("profile material is corrupt: {0}")]
    Corrupt(String),

    #[error(
        "invalid ORCID iD {0:?}; expected https://orcid.org/NNNN-NNNN-NNNN-NNNN \
         (the last character may be X)"
    )]
    InvalidOrcid(String),

    #[error("profile i/o failed: {0}")]
    Io(#[from] io::Error),
}

impl ProfileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProfileError::NotConfigured(_) | ProfileError::Io(_) => ErrorKind::Configuration,
            ProfileError::Corrupt(_) => ErrorKind::Integrity,
            ProfileError::InvalidOrcid(_) => ErrorKind::InvalidArgument,
        }
    }
}

/// `^https://orcid.org/NNNN-NNNN-NNNN-NNN[N|X]$`
static ORCID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://orcid\.org/\d{4}-\d{4}-\d{4}-\d{3}[0-9X]$").expect("invalid ORCID regex")
});

/// A validated ORCID iD in its canonical URI form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrcidId(String);

impl OrcidId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrcidId {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if ORCID_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ProfileError::InvalidOrcid(s.to_string()))
        }
    }
}

impl TryFrom<String> for OrcidId {
    type Error = ProfileError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OrcidId> for String {
    fn from(id: OrcidId) -> Self {
        id.0
    }
}

impl fmt::Display for OrcidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw identity material as handed over by a [`ProfileStore`].
#[derive(Clone)]
pub struct StoredProfile {
    pub private_key: Option<[u8; 32]>,
    pub public_key: [u8; 32],
    pub orcid_id: String,
    pub name: String,
    pub introduction_nanopub_uri: Option<String>,
}

/// Where profiles come from.
pub trait ProfileStore {
    fn load(&self) -> Result<StoredProfile, ProfileError>;
}

/// A loaded publishing identity. Immutable once built.
pub struct Profile {
    signing_key: Option<SigningKey>,
    public_key: VerifyingKey,
    orcid_id: OrcidId,
    name: String,
    introduction_nanopub_uri: Option<String>,
}

impl Profile {
    /// A profile that can sign.
    pub fn new(signing_key: SigningKey, orcid_id: OrcidId, name: impl Into<String>) -> Self {
        Self {
            public_key: signing_key.verifying_key(),
            signing_key: Some(signing_key),
            orcid_id,
            name: name.into(),
            introduction_nanopub_uri: None,
        }
    }

    /// A profile without private key material. It can attribute documents
    /// but signing with it fails.
    pub fn public_only(public_key: VerifyingKey, orcid_id: OrcidId, name: impl Into<String>) -> Self {
        Self {
            signing_key: None,
            public_key,
            orcid_id,
            name: name.into(),
            introduction_nanopub_uri: None,
        }
    }

    /// Record the nanopublication that introduced this profile's key.
    pub fn with_introduction(mut self, uri: impl Into<String>) -> Self {
        self.introduction_nanopub_uri = Some(uri.into());
        self
    }

    /// Load and validate the profile held by `store`.
    pub fn load(store: &impl ProfileStore) -> Result<Self, ProfileError> {
        let stored = store.load()?;

        let public_key = VerifyingKey::from_bytes(&stored.public_key)
            .map_err(|e| ProfileError::Corrupt(format!("invalid public key: {e}")))?;
        let signing_key = stored.private_key.as_ref().map(SigningKey::from_bytes);
        if let Some(key) = &signing_key {
            if key.verifying_key() != public_key {
                return Err(ProfileError::Corrupt(
                    "private key does not match public key".into(),
                ));
            }
        }
        let orcid_id: OrcidId = stored.orcid_id.parse()?;

        let profile = Self {
            signing_key,
            public_key,
            orcid_id,
            name: stored.name,
            introduction_nanopub_uri: stored.introduction_nanopub_uri,
        };
        debug!(
            orcid = %profile.orcid_id,
            fingerprint = %profile.fingerprint(),
            can_sign = profile.can_sign(),
            "loaded profile"
        );
        Ok(profile)
    }

    pub fn orcid_id(&self) -> &OrcidId {
        &self.orcid_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    pub fn signing_key(&self) -> Option<&SigningKey> {
        self.signing_key.as_ref()
    }

    pub fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }

    pub fn introduction_nanopub_uri(&self) -> Option<&str> {
        self.introduction_nanopub_uri.as_deref()
    }

    /// The public key in standard base64, as written into documents.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key.as_bytes())
    }

    /// Multibase (`z` + base58btc) SHA-256 fingerprint of the public key.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public_key)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("orcid_id", &self.orcid_id)
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint())
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

/// Multibase (`z` + base58btc) SHA-256 fingerprint of an Ed25519 public key.
pub fn fingerprint(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("z{}", bs58::encode(digest).into_string())
}

// ---------------------------------------------------------------------------
// DirectoryStore
// ---------------------------------------------------------------------------

const PROFILE_FILE: &str = "profile.json";
const PRIVATE_KEY_FILE: &str = "id_ed25519";
const PUBLIC_KEY_FILE: &str = "id_ed25519.pub";

/// `profile.json` as stored on disk.
#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    orcid_id: String,
    name: String,
    public_key: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    introduction_nanopub_uri: Option<String>,
}

/// A profile kept in a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$NANOPUB_HOME`, or `$HOME/.nanopub` when unset.
    pub fn from_env() -> Result<Self, ProfileError> {
        if let Ok(dir) = std::env::var("NANOPUB_HOME") {
            return Ok(Self::new(dir));
        }
        std::env::var("HOME")
            .map(|home| Self::new(Path::new(&home).join(".nanopub")))
            .map_err(|_| ProfileError::NotConfigured("neither NANOPUB_HOME nor HOME is set".into()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a profile has been written here.
    pub fn exists(&self) -> bool {
        self.dir.join(PROFILE_FILE).is_file()
    }

    /// Write `profile` and its key files, replacing any existing profile.
    pub fn save(&self, profile: &Profile) -> Result<(), ProfileError> {
        fs::create_dir_all(&self.dir)?;

        fs::write(
            self.dir.join(PUBLIC_KEY_FILE),
            hex::encode(profile.public_key().as_bytes()),
        )?;
        let private_key = match profile.signing_key() {
            Some(key) => {
                let path = self.dir.join(PRIVATE_KEY_FILE);
                write_secret(&path, &hex::encode(key.to_bytes()))?;
                Some(PathBuf::from(PRIVATE_KEY_FILE))
            }
            None => None,
        };

        let file = ProfileFile {
            orcid_id: profile.orcid_id().to_string(),
            name: profile.name().to_string(),
            public_key: PathBuf::from(PUBLIC_KEY_FILE),
            private_key,
            introduction_nanopub_uri: profile.introduction_nanopub_uri().map(str::to_string),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ProfileError::Corrupt(format!("cannot serialize profile: {e}")))?;
        fs::write(self.dir.join(PROFILE_FILE), json)?;
        debug!(dir = %self.dir.display(), "saved profile");
        Ok(())
    }

    fn read_key(&self, path: &Path) -> Result<[u8; 32], ProfileError> {
        let path = self.dir.join(path);
        let text = fs::read_to_string(&path)
            .map_err(|e| ProfileError::Corrupt(format!("cannot read {}: {e}", path.display())))?;
        let bytes = hex::decode(text.trim())
            .map_err(|e| ProfileError::Corrupt(format!("{} is not hex: {e}", path.display())))?;
        bytes
            .try_into()
            .map_err(|_| ProfileError::Corrupt(format!("{} must hold 32 bytes", path.display())))
    }
}

impl ProfileStore for DirectoryStore {
    fn load(&self) -> Result<StoredProfile, ProfileError> {
        let path = self.dir.join(PROFILE_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProfileError::NotConfigured(path.display().to_string()))
            }
            Err(e) => {
                return Err(ProfileError::Corrupt(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        let file: ProfileFile = serde_json::from_str(&json)
            .map_err(|e| ProfileError::Corrupt(format!("{}: {e}", path.display())))?;

        Ok(StoredProfile {
            public_key: self.read_key(&file.public_key)?,
            private_key: file
                .private_key
                .as_deref()
                .map(|p| self.read_key(p))
                .transpose()?,
            orcid_id: file.orcid_id,
            name: file.name,
            introduction_nanopub_uri: file.introduction_nanopub_uri,
        })
    }
}

#[cfg(unix)]
fn write_secret(path: &Path, contents: &str) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut f = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    f.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_secret(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
