//! Assembling draft nanopublications from an assertion graph.
//!
//! [`assemble`] lays the caller's assertion out in the four-graph structure
//! under [`PLACEHOLDER_BASE`], wires provenance and publication info, and
//! records a pending rewrite when the introduced concept is a blank node.
//! Nothing here performs I/O; the result goes to
//! [`finalize`](crate::trusty::finalize) next.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::debug;

use crate::document::{DraftDocument, GraphRole, NanopubGraphs, PendingConcept, PLACEHOLDER_BASE};
use crate::error::ErrorKind;
use crate::profile::Profile;
use crate::rdf::{Graph, Literal, Term};
use crate::signing::ALGORITHM;
use crate::vocab::{dct, foaf, npx, prov, xsd};

/// Errors returned for malformed assembly input.
#[derive(Debug, Error, PartialEq)]
pub enum PublicationError {
    #[error("introduced concept must be a blank node or an IRI, got {0}")]
    InvalidIntroducedConcept(String),

    #[error("derived_from must contain at least one source when present")]
    EmptyDerivedFrom,

    #[error("derivation source at index {0} must be an IRI, got {1}")]
    InvalidDerivationSource(usize, String),

    #[error("assertion attribution must be an IRI, got {0}")]
    InvalidAttribution(String),

    #[error("retraction target must be an IRI, got {0}")]
    InvalidRetractionTarget(String),
}

impl PublicationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

/// Optional inputs to [`assemble`].
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// A concept the assertion defines. A blank node is anchored under the
    /// final identifier; an IRI is used as is.
    pub introduces_concept: Option<Term>,

    /// Sources the assertion was derived from. Must be non-empty when set.
    pub derived_from: Option<Vec<Term>>,

    /// Attribute the assertion itself to the profile's ORCID iD.
    pub attribute_assertion_to_profile: bool,

    /// Attribute the assertion to someone else.
    pub assertion_attributed_to: Option<Term>,

    /// Creation time recorded in provenance and pubinfo. Left unset, the
    /// same input always yields the same identifier.
    pub created: Option<DateTime<Utc>>,
}

impl AssembleOptions {
    pub fn introducing(mut self, concept: Term) -> Self {
        self.introduces_concept = Some(concept);
        self
    }

    /// Record a single derivation source.
    pub fn derived_from_one(mut self, source: Term) -> Self {
        self.derived_from = Some(vec![source]);
        self
    }

    pub fn derived_from(mut self, sources: Vec<Term>) -> Self {
        self.derived_from = Some(sources);
        self
    }

    pub fn created_at(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

/// Build a draft nanopublication around `assertion`.
///
/// With a `profile`, pubinfo attributes the document to its ORCID iD;
/// without one the draft is unattributed.
///
/// # Errors
///
/// Every error is a [`PublicationError`] describing the offending option.
pub fn assemble(
    assertion: Graph,
    options: AssembleOptions,
    profile: Option<&Profile>,
) -> Result<DraftDocument, PublicationError> {
    let pending = match &options.introduces_concept {
        None | Some(Term::Iri(_)) => None,
        Some(blank @ Term::BlankNode(label)) => Some(PendingConcept {
            blank: blank.clone(),
            local_name: label.clone(),
        }),
        Some(other @ Term::Literal(_)) => {
            return Err(PublicationError::InvalidIntroducedConcept(other.to_string()))
        }
    };

    let sources = match options.derived_from {
        None => Vec::new(),
        Some(sources) if sources.is_empty() => return Err(PublicationError::EmptyDerivedFrom),
        Some(sources) => {
            if let Some((i, bad)) = sources.iter().enumerate().find(|(_, s)| !s.is_iri()) {
                return Err(PublicationError::InvalidDerivationSource(i, bad.to_string()));
            }
            sources
        }
    };

    if let Some(other) = options.assertion_attributed_to.as_ref().filter(|t| !t.is_iri()) {
        return Err(PublicationError::InvalidAttribution(other.to_string()));
    }

    let mut graphs = NanopubGraphs::new(PLACEHOLDER_BASE);
    let this = graphs.uri().clone();
    let assertion_name = graphs.get(GraphRole::Assertion).name.clone();

    graphs.get_mut(GraphRole::Assertion).graph.extend(assertion);

    // pubinfo: introduced concept
    let concept = match (&pending, options.introduces_concept) {
        (Some(p), _) => Some(Term::iri(format!("{PLACEHOLDER_BASE}#{}", p.local_name))),
        (None, concept) => concept,
    };
    if let Some(concept) = concept {
        graphs
            .get_mut(GraphRole::PubInfo)
            .graph
            .add(this.clone(), Term::iri(npx::INTRODUCES), concept);
    }

    // provenance
    let provenance = &mut graphs.get_mut(GraphRole::Provenance).graph;
    for source in sources {
        provenance.add(assertion_name.clone(), Term::iri(prov::WAS_DERIVED_FROM), source);
    }
    if let Some(who) = options.assertion_attributed_to {
        provenance.add(assertion_name.clone(), Term::iri(prov::WAS_ATTRIBUTED_TO), who);
    }
    if options.attribute_assertion_to_profile {
        if let Some(profile) = profile {
            provenance.add(
                assertion_name.clone(),
                Term::iri(prov::WAS_ATTRIBUTED_TO),
                Term::iri(profile.orcid_id().as_str()),
            );
        }
    }
    if let Some(created) = options.created {
        provenance.add(
            assertion_name.clone(),
            Term::iri(prov::GENERATED_AT_TIME),
            date_time(created),
        );
    }

    // pubinfo: attribution and creation time
    let pubinfo = &mut graphs.get_mut(GraphRole::PubInfo).graph;
    if let Some(profile) = profile {
        pubinfo.add(
            this.clone(),
            Term::iri(prov::WAS_ATTRIBUTED_TO),
            Term::iri(profile.orcid_id().as_str()),
        );
    }
    if let Some(created) = options.created {
        pubinfo.add(this, Term::iri(dct::CREATED), date_time(created));
    }

    debug!(
        assertion = graphs.get(GraphRole::Assertion).graph.len(),
        provenance = graphs.get(GraphRole::Provenance).graph.len(),
        pubinfo = graphs.get(GraphRole::PubInfo).graph.len(),
        pending_concept = pending.is_some(),
        "assembled draft nanopublication"
    );

    Ok(DraftDocument { graphs, pending })
}

/// A draft retracting the nanopublication `target` on behalf of `profile`.
pub fn retraction(target: &Term, profile: &Profile) -> Result<DraftDocument, PublicationError> {
    if !target.is_iri() {
        return Err(PublicationError::InvalidRetractionTarget(target.to_string()));
    }
    let mut assertion = Graph::new();
    assertion.add(
        Term::iri(profile.orcid_id().as_str()),
        Term::iri(npx::RETRACTS),
        target.clone(),
    );
    let options = AssembleOptions {
        attribute_assertion_to_profile: true,
        ..AssembleOptions::default()
    };
    assemble(assertion, options, Some(profile))
}

/// A draft declaring `profile`'s public key and linking it to its ORCID iD.
///
/// The key declaration is introduced as `<identifier>#keyDeclaration`.
pub fn introduction(profile: &Profile) -> Result<DraftDocument, PublicationError> {
    let declaration = Term::blank("keyDeclaration");
    let orcid = Term::iri(profile.orcid_id().as_str());

    let mut assertion = Graph::new();
    assertion.add(declaration.clone(), Term::iri(npx::DECLARED_BY), orcid.clone());
    assertion.add(
        declaration.clone(),
        Term::iri(npx::HAS_ALGORITHM),
        Term::literal(ALGORITHM),
    );
    assertion.add(
        declaration.clone(),
        Term::iri(npx::HAS_PUBLIC_KEY),
        Term::literal(profile.public_key_base64()),
    );
    assertion.add(orcid, Term::iri(foaf::NAME), Term::literal(profile.name()));

    assemble(
        assertion,
        AssembleOptions::default().introducing(declaration),
        Some(profile),
    )
}

fn date_time(at: DateTime<Utc>) -> Term {
    Term::Literal(Literal::typed(
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        xsd::DATE_TIME,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Nanopub;
    use crate::rdf::Triple;
    use crate::vocab::{hycl, np, rdf};
    use chrono::TimeZone;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    const TEST_ORCID_ID: &str = "https://orcid.org/0000-0000-0000-0000";

    fn test_assertion() -> Graph {
        let mut g = Graph::new();
        g.add(
            Term::iri("http://purl.org/person#DrBob"),
            Term::iri(hycl::CLAIMS),
            Term::literal("This is a test"),
        );
        g
    }

    fn test_profile() -> Profile {
        Profile::new(
            SigningKey::generate(&mut OsRng),
            TEST_ORCID_ID.parse().unwrap(),
            "pietje",
        )
    }

    #[test]
    fn literal_introduced_concept_is_rejected() {
        let options = AssembleOptions::default().introducing(Term::literal("not a blank node"));
        let err = assemble(test_assertion(), options, None).unwrap_err();
        assert!(matches!(err, PublicationError::InvalidIntroducedConcept(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn blank_introduced_concept_is_anchored_under_placeholder() {
        let options = AssembleOptions::default().introducing(Term::blank("DrBob"));
        let draft = assemble(test_assertion(), options, None).unwrap();
        let concept = Term::iri(format!("{PLACEHOLDER_BASE}#DrBob"));

        assert_eq!(draft.introduces_concept(), Some(&concept));
        assert!(draft.pubinfo().has(None, Some(&Term::iri(npx::INTRODUCES)), Some(&concept)));
        assert_eq!(draft.pending_concept().unwrap().blank, Term::blank("DrBob"));
    }

    #[test]
    fn iri_introduced_concept_passes_through() {
        let concept = Term::iri("http://example.org/concept");
        let options = AssembleOptions::default().introducing(concept.clone());
        let draft = assemble(test_assertion(), options, None).unwrap();
        assert_eq!(draft.introduces_concept(), Some(&concept));
        assert!(draft.pending_concept().is_none());
    }

    #[test]
    fn derived_from_list_adds_one_link_per_source() {
        let sources = [
            "http://www.example.com/another-nanopub",
            "http://www.example.com/and-another-nanopub",
            "http://www.example.com/and-one-more",
        ];
        let options =
            AssembleOptions::default().derived_from(sources.iter().map(|s| Term::iri(*s)).collect());
        let draft = assemble(test_assertion(), options, None).unwrap();

        let derived = Term::iri(prov::WAS_DERIVED_FROM);
        assert_eq!(draft.provenance().matching(None, Some(&derived), None).count(), 3);
        for s in sources {
            assert!(draft.provenance().has(None, Some(&derived), Some(&Term::iri(s))));
        }
    }

    #[test]
    fn single_derivation_source() {
        let options = AssembleOptions::default()
            .derived_from_one(Term::iri("http://www.example.com/another-nanopub"));
        let draft = assemble(test_assertion(), options, None).unwrap();
        assert_eq!(draft.provenance().len(), 1);
    }

    #[test]
    fn empty_or_non_iri_derivation_is_rejected() {
        let err = assemble(test_assertion(), AssembleOptions::default().derived_from(vec![]), None);
        assert_eq!(err.unwrap_err(), PublicationError::EmptyDerivedFrom);

        let options = AssembleOptions::default()
            .derived_from(vec![Term::iri("http://example.org/ok"), Term::blank("b")]);
        assert!(matches!(
            assemble(test_assertion(), options, None),
            Err(PublicationError::InvalidDerivationSource(1, _))
        ));
    }

    #[test]
    fn head_declares_the_three_graphs() {
        let draft = assemble(test_assertion(), AssembleOptions::default(), None).unwrap();
        let this = Term::iri(PLACEHOLDER_BASE);
        let head = draft.head();
        assert!(head.contains(&Triple::new(
            this.clone(),
            Term::iri(rdf::TYPE),
            Term::iri(np::NANOPUBLICATION)
        )));
        for link in [np::HAS_ASSERTION, np::HAS_PROVENANCE, np::HAS_PUBLICATION_INFO] {
            assert!(head.has(Some(&this), Some(&Term::iri(link)), None));
        }
        assert_eq!(draft.assertion(), &test_assertion());
    }

    #[test]
    fn profile_attribution_goes_to_pubinfo() {
        let profile = test_profile();
        let draft = assemble(test_assertion(), AssembleOptions::default(), Some(&profile)).unwrap();
        assert!(draft.pubinfo().contains(&Triple::new(
            Term::iri(PLACEHOLDER_BASE),
            Term::iri(prov::WAS_ATTRIBUTED_TO),
            Term::iri(TEST_ORCID_ID),
        )));

        let unattributed = assemble(test_assertion(), AssembleOptions::default(), None).unwrap();
        assert!(!unattributed.pubinfo().has(None, Some(&Term::iri(prov::WAS_ATTRIBUTED_TO)), None));
    }

    #[test]
    fn assertion_attribution_goes_to_provenance() {
        let profile = test_profile();
        let options = AssembleOptions {
            attribute_assertion_to_profile: true,
            ..AssembleOptions::default()
        };
        let draft = assemble(test_assertion(), options, Some(&profile)).unwrap();
        let assertion_name = draft.graph_name(GraphRole::Assertion).clone();
        assert!(draft.provenance().contains(&Triple::new(
            assertion_name,
            Term::iri(prov::WAS_ATTRIBUTED_TO),
            Term::iri(TEST_ORCID_ID),
        )));

        let options = AssembleOptions {
            assertion_attributed_to: Some(Term::literal("someone")),
            ..AssembleOptions::default()
        };
        assert!(matches!(
            assemble(test_assertion(), options, None),
            Err(PublicationError::InvalidAttribution(_))
        ));
    }

    #[test]
    fn created_time_is_recorded() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let draft =
            assemble(test_assertion(), AssembleOptions::default().created_at(at), None).unwrap();
        let expected = Term::Literal(Literal::typed("2026-10-19T12:00:00Z", xsd::DATE_TIME));
        assert!(draft.pubinfo().has(None, Some(&Term::iri(dct::CREATED)), Some(&expected)));
        assert!(draft
            .provenance()
            .has(None, Some(&Term::iri(prov::GENERATED_AT_TIME)), Some(&expected)));
    }

    #[test]
    fn retraction_targets_an_iri() {
        let profile = test_profile();
        let target = Term::iri("http://purl.org/np/RAsomething");
        let draft = retraction(&target, &profile).unwrap();
        assert!(draft.assertion().contains(&Triple::new(
            Term::iri(TEST_ORCID_ID),
            Term::iri(npx::RETRACTS),
            target,
        )));
        assert!(matches!(
            retraction(&Term::literal("x"), &profile),
            Err(PublicationError::InvalidRetractionTarget(_))
        ));
    }

    #[test]
    fn introduction_declares_the_public_key() {
        let profile = test_profile();
        let draft = introduction(&profile).unwrap();
        let key = Term::literal(profile.public_key_base64());
        assert!(draft.assertion().has(None, Some(&Term::iri(npx::HAS_PUBLIC_KEY)), Some(&key)));
        assert!(draft
            .assertion()
            .has(None, None, Some(&Term::iri(TEST_ORCID_ID))));
        assert_eq!(
            draft.introduces_concept(),
            Some(&Term::iri(format!("{PLACEHOLDER_BASE}#keyDeclaration")))
        );
    }
}
