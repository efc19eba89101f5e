//! Content-derived identifiers.
//!
//! A draft is identified by hashing its content with every reference to its
//! own base written relative to that base. The digest therefore depends only
//! on what the document says, not on which placeholder it was drafted under,
//! and the same computation can be repeated on the finalized document (with
//! the final identifier as the base) to check it.
//!
//! Identifiers have the form `http://purl.org/np/RA<code>`, where `<code>` is
//! the unpadded URL-safe base64 of a SHA-256 digest.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::document::{
    is_anchored, DraftDocument, FinalDocument, GraphRole, NanopubGraphs, PendingConcept,
    PLACEHOLDER_BASE,
};
use crate::rdf::{Term, Triple};

/// Namespace under which final identifiers are minted.
pub const IDENTIFIER_NAMESPACE: &str = "http://purl.org/np/";

/// Module prefix of the artifact code: SHA-256 over RDF graphs.
pub const MODULE_ID: &str = "RA";

/// Resolve a draft into its content-derived identifier.
///
/// Every IRI anchored under the placeholder (graph names included) is
/// rewritten under the new identifier, and a pending blank-node concept
/// becomes `<identifier>#<label>`. No triple of the result refers to the
/// placeholder.
pub fn finalize(draft: DraftDocument) -> FinalDocument {
    let DraftDocument { mut graphs, pending } = draft;

    let code = artifact_code(&graphs, PLACEHOLDER_BASE, pending.as_ref(), &[]);
    let identifier = format!("{IDENTIFIER_NAMESPACE}{MODULE_ID}{code}");

    let mut mapping: Vec<(Term, Term)> = graphs
        .anchored_iris(PLACEHOLDER_BASE)
        .into_iter()
        .map(|iri| {
            let rebased = format!("{identifier}{}", &iri[PLACEHOLDER_BASE.len()..]);
            (Term::Iri(iri), Term::Iri(rebased))
        })
        .collect();
    if let Some(concept) = pending {
        mapping.push((
            concept.blank,
            Term::iri(format!("{identifier}#{}", concept.local_name)),
        ));
    }
    graphs.substitute_all(&mapping);

    debug!(
        identifier = %identifier,
        rewritten = mapping.len(),
        triples = graphs.len(),
        "finalized nanopublication"
    );
    debug_assert!(graphs.anchored_iris(PLACEHOLDER_BASE).is_empty());

    FinalDocument { graphs }
}

/// The artifact code of `graphs` when `base` is taken as the document's own
/// IRI.
///
/// The pubinfo triples in `exclude` are left out; verification passes the
/// signature record added after finalization.
pub fn artifact_code(
    graphs: &NanopubGraphs,
    base: &str,
    pending: Option<&PendingConcept>,
    exclude: &[Triple],
) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(graphs.len());
    for role in GraphRole::ALL {
        for t in graphs.triples_except(role, exclude) {
            lines.push(format!(
                "{role} {} {} {}",
                normalize(&t.subject, base, pending),
                normalize(&t.predicate, base, pending),
                normalize(&t.object, base, pending),
            ));
        }
    }
    lines.sort();

    let mut hasher = Sha256::new();
    hasher.update(lines.join("\n").as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Extract the artifact code from an identifier minted by [`finalize`].
pub fn code_of(identifier: &str) -> Option<&str> {
    identifier
        .strip_prefix(IDENTIFIER_NAMESPACE)?
        .strip_prefix(MODULE_ID)
        .filter(|code| !code.is_empty() && !code.contains(['#', '/']))
}

/// Check that a finalized document's identifier matches its content.
///
/// Returns `false` for identifiers that were not minted by [`finalize`].
pub fn verify_identifier(graphs: &NanopubGraphs, exclude: &[Triple]) -> bool {
    let Some(identifier) = graphs.uri().as_iri() else {
        return false;
    };
    let Some(expected) = code_of(identifier) else {
        return false;
    };
    artifact_code(graphs, identifier, None, exclude) == expected
}

fn normalize(term: &Term, base: &str, pending: Option<&PendingConcept>) -> String {
    match term {
        Term::Iri(iri) if is_anchored(iri, base) => format!("<~{}>", &iri[base.len()..]),
        Term::BlankNode(_) if pending.is_some_and(|p| &p.blank == term) => {
            let local = pending.map(|p| p.local_name.as_str()).unwrap_or_default();
            format!("<~#{local}>")
        }
        other => other.to_string(),
    }
}
