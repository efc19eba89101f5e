//! Ed25519 signing and verification of finalized nanopublications.
//!
//! The signature record lives in pubinfo on the node `<identifier>#sig`.
//! The signed payload is the canonical N-Quads serialization of the whole
//! signed document except the one `npx:hasSignature` triple, so every other
//! statement, record fields included, is covered by the signature.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};
use thiserror::Error;
use tracing::debug;

use crate::document::{FinalDocument, GraphRole, Nanopub, NanopubGraphs, SignedDocument};
use crate::error::ErrorKind;
use crate::nquads::{self, SerializeError};
use crate::profile::{fingerprint, Profile};
use crate::rdf::{Quad, Term, Triple};
use crate::trusty;
use crate::vocab::npx;

/// Identifier of the only signature scheme in use.
pub const ALGORITHM: &str = "Ed25519";

/// Errors returned by [`sign`].
#[derive(Debug, Error, PartialEq)]
pub enum SigningError {
    #[error("no profile loaded; run `np setup` or pass a profile before signing")]
    NoProfile,

    #[error("profile for {0} has no private key")]
    NoPrivateKey(String),

    #[error("pubinfo already has statements about {0}")]
    SignatureNodeInUse(String),

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

impl SigningError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Signing
    }
}

/// Errors returned by [`verify`] and when reading a signature record.
#[derive(Debug, Error, PartialEq)]
pub enum VerifyError {
    #[error("pubinfo holds no signature targeting {0}")]
    SignatureMissing(String),

    #[error("signature record is missing {0}")]
    IncompleteRecord(&'static str),

    #[error("signature record has more than one {0}")]
    AmbiguousRecord(&'static str),

    #[error("signature record field {0} could not be decoded: {1}")]
    DecodingFailed(&'static str, String),

    #[error("unsupported signature algorithm {0:?}")]
    UnsupportedAlgorithm(String),

    #[error("key fingerprint does not match the public key")]
    FingerprintMismatch,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("identifier does not match the document content")]
    IdentifierMismatch,

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Verification
    }
}

/// The signature attached to a document's pubinfo.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureRecord {
    /// The node carrying the record, `<identifier>#sig`.
    pub node: Term,
    pub signature: Vec<u8>,
    pub public_key: VerifyingKey,
    pub fingerprint: String,
    pub algorithm: String,
    /// The ORCID iD of the signer.
    pub signed_by: Term,
}

impl SignatureRecord {
    /// Read the record targeting the document from its pubinfo graph.
    pub fn read_from(graphs: &NanopubGraphs) -> Result<Self, VerifyError> {
        let pubinfo = &graphs.get(GraphRole::PubInfo).graph;
        let target = Term::iri(npx::HAS_SIGNATURE_TARGET);
        let mut nodes = pubinfo
            .matching(None, Some(&target), Some(graphs.uri()))
            .map(|t| t.subject.clone());
        let node = nodes
            .next()
            .ok_or_else(|| VerifyError::SignatureMissing(graphs.uri().to_string()))?;
        if nodes.next().is_some() {
            return Err(VerifyError::AmbiguousRecord("signature node"));
        }

        let field = |predicate: &str, name: &'static str| -> Result<Term, VerifyError> {
            let predicate = Term::iri(predicate);
            let mut values = pubinfo.objects(&node, &predicate);
            let value = values.next().cloned().ok_or(VerifyError::IncompleteRecord(name))?;
            if values.next().is_some() {
                return Err(VerifyError::AmbiguousRecord(name));
            }
            Ok(value)
        };
        let literal = |predicate: &str, name: &'static str| -> Result<String, VerifyError> {
            field(predicate, name)?
                .as_literal_value()
                .map(str::to_string)
                .ok_or(VerifyError::IncompleteRecord(name))
        };

        let algorithm = literal(npx::HAS_ALGORITHM, "algorithm")?;
        let fingerprint = literal(npx::HAS_KEY_FINGERPRINT, "fingerprint")?;
        let signature = STANDARD
            .decode(literal(npx::HAS_SIGNATURE, "signature")?)
            .map_err(|e| VerifyError::DecodingFailed("signature", e.to_string()))?;
        let key_bytes: [u8; 32] = STANDARD
            .decode(literal(npx::HAS_PUBLIC_KEY, "public key")?)
            .map_err(|e| VerifyError::DecodingFailed("public key", e.to_string()))?
            .try_into()
            .map_err(|_| VerifyError::DecodingFailed("public key", "expected 32 bytes".into()))?;
        let public_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| VerifyError::DecodingFailed("public key", e.to_string()))?;
        let signed_by = field(npx::SIGNED_BY, "signer")?;

        Ok(Self {
            node,
            signature,
            public_key,
            fingerprint,
            algorithm,
            signed_by,
        })
    }

    /// The record's statements about its node, signature excluded.
    fn field_triples(&self, target: &Term) -> Vec<Triple> {
        let node = &self.node;
        let field = |predicate: &str, object: Term| {
            Triple::new(node.clone(), Term::iri(predicate), object)
        };
        vec![
            field(npx::HAS_SIGNATURE_TARGET, target.clone()),
            field(npx::HAS_ALGORITHM, Term::literal(&self.algorithm)),
            field(
                npx::HAS_PUBLIC_KEY,
                Term::literal(STANDARD.encode(self.public_key.as_bytes())),
            ),
            field(npx::HAS_KEY_FINGERPRINT, Term::literal(&self.fingerprint)),
            field(npx::SIGNED_BY, self.signed_by.clone()),
        ]
    }

    fn signature_triple(&self) -> Triple {
        Triple::new(
            self.node.clone(),
            Term::iri(npx::HAS_SIGNATURE),
            Term::literal(STANDARD.encode(&self.signature)),
        )
    }

    /// Every statement the record adds to pubinfo.
    pub fn triples(&self, target: &Term) -> Vec<Triple> {
        let mut triples = self.field_triples(target);
        triples.push(self.signature_triple());
        triples
    }

    fn write_to(&self, graphs: &mut NanopubGraphs) {
        let triples = self.triples(graphs.uri());
        graphs.get_mut(GraphRole::PubInfo).graph.extend(triples);
    }
}

/// Sign a finalized document with the profile's private key.
///
/// Consumes the document: a [`FinalDocument`] is signed once and the
/// resulting [`SignedDocument`] offers no way to sign again.
///
/// # Errors
///
/// [`SigningError::NoProfile`] without a profile,
/// [`SigningError::NoPrivateKey`] when the profile cannot sign, and
/// [`SigningError::SignatureNodeInUse`] when pubinfo already describes
/// `<identifier>#sig`.
pub fn sign(document: FinalDocument, profile: Option<&Profile>) -> Result<SignedDocument, SigningError> {
    let profile = profile.ok_or(SigningError::NoProfile)?;
    let key = profile
        .signing_key()
        .ok_or_else(|| SigningError::NoPrivateKey(profile.orcid_id().to_string()))?;

    let node = signature_node(document.uri());
    if document.pubinfo().has(Some(&node), None, None) {
        return Err(SigningError::SignatureNodeInUse(node.to_string()));
    }

    let mut record = SignatureRecord {
        node,
        signature: Vec::new(),
        public_key: *profile.public_key(),
        fingerprint: profile.fingerprint(),
        algorithm: ALGORITHM.to_string(),
        signed_by: Term::iri(profile.orcid_id().as_str()),
    };
    let payload = signed_payload(document.graphs(), &record)?;
    record.signature = key.sign(&payload).to_bytes().to_vec();

    let mut graphs = document.into_graphs();
    record.write_to(&mut graphs);
    debug!(
        uri = %graphs.uri(),
        fingerprint = %record.fingerprint,
        "signed nanopublication"
    );

    Ok(SignedDocument {
        graphs,
        signature: record,
    })
}

/// Check a signed document: the signature against its content, the
/// fingerprint against its key, and the identifier against its content.
pub fn verify(document: &SignedDocument) -> Result<&SignatureRecord, VerifyError> {
    let record = document.signature();
    if record.algorithm != ALGORITHM {
        return Err(VerifyError::UnsupportedAlgorithm(record.algorithm.clone()));
    }
    if fingerprint(&record.public_key) != record.fingerprint {
        return Err(VerifyError::FingerprintMismatch);
    }

    let sig_bytes: [u8; 64] = record
        .signature
        .as_slice()
        .try_into()
        .map_err(|_| VerifyError::DecodingFailed("signature", "expected 64 bytes".into()))?;
    let payload = signed_payload(document.graphs(), record)?;
    record
        .public_key
        .verify(&payload, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| VerifyError::VerificationFailed)?;

    if !trusty::verify_identifier(document.graphs(), &record.triples(document.uri())) {
        return Err(VerifyError::IdentifierMismatch);
    }
    Ok(record)
}

fn signature_node(uri: &Term) -> Term {
    match uri {
        Term::Iri(iri) => Term::iri(format!("{iri}#sig")),
        other => Term::iri(format!("{}#sig", other.to_string().trim_matches(['<', '>']))),
    }
}

/// Canonical N-Quads of `graphs` together with the record's fields, minus
/// the record's signature statement.
fn signed_payload(graphs: &NanopubGraphs, record: &SignatureRecord) -> Result<Vec<u8>, SerializeError> {
    let pubinfo = graphs.get(GraphRole::PubInfo).name.clone();
    let signature = record.signature_triple();
    let quads: Vec<Quad> = graphs
        .quads()
        .into_iter()
        .filter(|q| q.graph != pubinfo || q.triple != signature)
        .chain(
            record
                .field_triples(graphs.uri())
                .into_iter()
                .map(|t| Quad::new(t, pubinfo.clone())),
        )
        .collect();
    Ok(nquads::to_nquads(&quads)?.into_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
