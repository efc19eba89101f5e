//! Assembly, content-derived identifiers and signing for nanopublications.
//!
//! A nanopublication is an RDF dataset of four named graphs: a head linking
//! the other three, an assertion, its provenance, and publication info. This
//! crate builds one from an assertion graph, replaces its placeholder IRI with
//! an identifier derived from the content, and signs it with an Ed25519 key
//! bound to an ORCID iD. It is the foundation of the `np` CLI.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`rdf`] | Owned RDF values: [`Term`], [`Triple`], [`Quad`], [`Graph`], with `sophia_api` conversions |
//! | [`vocab`] | IRIs of the vocabularies in use |
//! | [`substitute`] | Term substitution over graphs |
//! | [`document`] | The four-graph structure and the [`DraftDocument`] → [`FinalDocument`] → [`SignedDocument`] lifecycle |
//! | [`profile`] | Signing identity: [`Profile`], [`OrcidId`], [`DirectoryStore`] |
//! | [`publication`] | [`assemble`], plus retraction and key-introduction documents |
//! | [`trusty`] | [`finalize`] and identifier verification |
//! | [`signing`] | [`sign`] and [`verify`] |
//! | [`nquads`] | N-Triples / N-Quads serialization and parsing via `sophia_turtle` |
//! | [`render`] | Human-readable text rendering |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use nanopub::{assemble, finalize, sign, verify, AssembleOptions, Graph, Nanopub, Profile, Term};
//!
//! let mut assertion = Graph::new();
//! assertion.add(
//!     Term::blank("DrBob"),
//!     Term::iri("http://purl.org/petapico/o/hycl#claims"),
//!     Term::literal("Cats are the best pets"),
//! );
//!
//! let profile = Profile::load(&nanopub::DirectoryStore::from_env()?)?;
//! let options = AssembleOptions::default().introducing(Term::blank("DrBob"));
//! let draft = assemble(assertion, options, Some(&profile))?;
//! let signed = sign(finalize(draft), Some(&profile))?;
//! verify(&signed)?;
//!
//! println!("{}", signed.to_nquads()?);
//! ```

pub mod document;
pub mod error;
pub mod nquads;
pub mod profile;
pub mod publication;
pub mod rdf;
pub mod render;
pub mod signing;
pub mod substitute;
pub mod trusty;
pub mod vocab;

pub use document::{
    DocumentError, DraftDocument, FinalDocument, GraphRole, NamedGraph, Nanopub, NanopubGraphs,
    PendingConcept, SignedDocument, PLACEHOLDER_BASE,
};
pub use error::{Error, ErrorKind, Result};
pub use nquads::{parse_nquads, parse_ntriples, to_nquads, to_ntriples, ParseError, SerializeError};
pub use profile::{DirectoryStore, OrcidId, Profile, ProfileError, ProfileStore, StoredProfile};
pub use publication::{assemble, introduction, retraction, AssembleOptions, PublicationError};
pub use rdf::{Graph, Literal, Quad, Term, TermError, Triple};
pub use render::render_document;
pub use signing::{sign, verify, SignatureRecord, SigningError, VerifyError};
pub use substitute::{substitute, substitute_all};
pub use trusty::{artifact_code, finalize, verify_identifier};
