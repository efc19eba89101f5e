//! The four-graph nanopublication structure and its lifecycle types.
//!
//! A document moves through three states, each its own type:
//!
//! ```text
//! DraftDocument --finalize--> FinalDocument --sign--> SignedDocument
//! ```
//!
//! Only [`DraftDocument`] hands out mutable access to its graphs. The
//! transitions consume their input, so a finalized document cannot be
//! edited and a given [`FinalDocument`] can be signed at most once.

use thiserror::Error;

use crate::rdf::{Graph, Quad, Term, Triple};
use crate::signing::SignatureRecord;
use crate::substitute::{replace_term, substitute_all};
use crate::vocab::{np, npx, rdf};

/// Base IRI of every draft. It is never content-derived, so it cannot collide
/// with a published identifier.
pub const PLACEHOLDER_BASE: &str = "http://purl.org/nanopub/temp/mynanopub";

/// Errors raised when reading a nanopublication out of a set of quads.
#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("no graph declares a np:Nanopublication")]
    MissingHead,

    #[error("more than one graph declares a np:Nanopublication")]
    AmbiguousHead,

    #[error("head graph does not link a {0} graph")]
    MissingGraph(GraphRole),

    #[error("quad outside the four nanopublication graphs: {0}")]
    StrayQuad(String),
}

/// The role a named graph plays in a nanopublication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphRole {
    Head,
    Assertion,
    Provenance,
    PubInfo,
}

impl GraphRole {
    pub const ALL: [GraphRole; 4] = [
        GraphRole::Head,
        GraphRole::Assertion,
        GraphRole::Provenance,
        GraphRole::PubInfo,
    ];

    /// Fragment appended to the base IRI to name this graph.
    pub fn fragment(self) -> &'static str {
        match self {
            GraphRole::Head => "Head",
            GraphRole::Assertion => "assertion",
            GraphRole::Provenance => "provenance",
            GraphRole::PubInfo => "pubInfo",
        }
    }

    /// The head predicate linking the nanopublication to this graph.
    fn head_link(self) -> Option<&'static str> {
        match self {
            GraphRole::Head => None,
            GraphRole::Assertion => Some(np::HAS_ASSERTION),
            GraphRole::Provenance => Some(np::HAS_PROVENANCE),
            GraphRole::PubInfo => Some(np::HAS_PUBLICATION_INFO),
        }
    }
}

impl std::fmt::Display for GraphRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphRole::Head => write!(f, "head"),
            GraphRole::Assertion => write!(f, "assertion"),
            GraphRole::Provenance => write!(f, "provenance"),
            GraphRole::PubInfo => write!(f, "pubinfo"),
        }
    }
}

/// A graph together with the term that names it.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedGraph {
    pub name: Term,
    pub graph: Graph,
}

/// The four graphs of a nanopublication and the IRI they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct NanopubGraphs {
    uri: Term,
    head: NamedGraph,
    assertion: NamedGraph,
    provenance: NamedGraph,
    pubinfo: NamedGraph,
}

impl NanopubGraphs {
    /// Empty graphs named `<base>#Head`, `<base>#assertion`, … with the
    /// standard head triples already in place.
    pub fn new(base: &str) -> Self {
        let named = |role: GraphRole| NamedGraph {
            name: Term::iri(format!("{base}#{}", role.fragment())),
            graph: Graph::new(),
        };
        let mut graphs = Self {
            uri: Term::iri(base),
            head: named(GraphRole::Head),
            assertion: named(GraphRole::Assertion),
            provenance: named(GraphRole::Provenance),
            pubinfo: named(GraphRole::PubInfo),
        };

        let uri = graphs.uri.clone();
        graphs.head.graph.add(
            uri.clone(),
            Term::iri(rdf::TYPE),
            Term::iri(np::NANOPUBLICATION),
        );
        for role in [GraphRole::Assertion, GraphRole::Provenance, GraphRole::PubInfo] {
            let (link, name) = match role.head_link() {
                Some(link) => (link, graphs.get(role).name.clone()),
                None => continue,
            };
            graphs.head.graph.add(uri.clone(), Term::iri(link), name);
        }
        graphs
    }

    /// Rebuild the four graphs from quads, locating the head graph by its
    /// `rdf:type np:Nanopublication` triple.
    pub fn from_quads(quads: impl IntoIterator<Item = Quad>) -> Result<Self, DocumentError> {
        let quads: Vec<Quad> = quads.into_iter().collect();
        let type_p = Term::iri(rdf::TYPE);
        let np_class = Term::iri(np::NANOPUBLICATION);

        let mut heads = quads
            .iter()
            .filter(|q| q.triple.predicate == type_p && q.triple.object == np_class);
        let head_quad = heads.next().ok_or(DocumentError::MissingHead)?;
        if heads.any(|q| q.graph != head_quad.graph || q.triple.subject != head_quad.triple.subject) {
            return Err(DocumentError::AmbiguousHead);
        }
        let uri = head_quad.triple.subject.clone();
        let head_name = head_quad.graph.clone();

        let linked = |role: GraphRole| -> Result<Term, DocumentError> {
            let link = Term::iri(role.head_link().unwrap_or_default());
            quads
                .iter()
                .find(|q| q.graph == head_name && q.triple.subject == uri && q.triple.predicate == link)
                .map(|q| q.triple.object.clone())
                .ok_or(DocumentError::MissingGraph(role))
        };

        let mut graphs = Self {
            uri: uri.clone(),
            head: NamedGraph { name: head_name.clone(), graph: Graph::new() },
            assertion: NamedGraph { name: linked(GraphRole::Assertion)?, graph: Graph::new() },
            provenance: NamedGraph { name: linked(GraphRole::Provenance)?, graph: Graph::new() },
            pubinfo: NamedGraph { name: linked(GraphRole::PubInfo)?, graph: Graph::new() },
        };

        for quad in quads {
            let role = GraphRole::ALL
                .into_iter()
                .find(|role| graphs.get(*role).name == quad.graph)
                .ok_or_else(|| DocumentError::StrayQuad(quad.to_string()))?;
            graphs.get_mut(role).graph.insert(quad.triple);
        }
        Ok(graphs)
    }

    pub fn uri(&self) -> &Term {
        &self.uri
    }

    pub fn get(&self, role: GraphRole) -> &NamedGraph {
        match role {
            GraphRole::Head => &self.head,
            GraphRole::Assertion => &self.assertion,
            GraphRole::Provenance => &self.provenance,
            GraphRole::PubInfo => &self.pubinfo,
        }
    }

    pub(crate) fn get_mut(&mut self, role: GraphRole) -> &mut NamedGraph {
        match role {
            GraphRole::Head => &mut self.head,
            GraphRole::Assertion => &mut self.assertion,
            GraphRole::Provenance => &mut self.provenance,
            GraphRole::PubInfo => &mut self.pubinfo,
        }
    }

    /// Iterate the graphs in head, assertion, provenance, pubinfo order.
    pub fn iter(&self) -> impl Iterator<Item = (GraphRole, &NamedGraph)> {
        GraphRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    /// Every triple as a quad in its named graph.
    pub fn quads(&self) -> Vec<Quad> {
        self.iter()
            .flat_map(|(_, ng)| {
                ng.graph
                    .iter()
                    .map(move |t| Quad::new(t.clone(), ng.name.clone()))
            })
            .collect()
    }

    /// Total number of triples across all four graphs.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, ng)| ng.graph.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `term` occurs in any triple or names any graph.
    pub fn mentions(&self, term: &Term) -> bool {
        &self.uri == term
            || self
                .iter()
                .any(|(_, ng)| &ng.name == term || ng.graph.mentions(term))
    }

    /// Every distinct IRI anchored under `base` (the IRI itself or `base#…`),
    /// graph names and the document IRI included.
    pub fn anchored_iris(&self, base: &str) -> Vec<String> {
        let mut found = std::collections::BTreeSet::new();
        let mut visit = |term: &Term| {
            if let Term::Iri(iri) = term {
                if is_anchored(iri, base) {
                    found.insert(iri.clone());
                }
            }
        };
        visit(&self.uri);
        for (_, ng) in self.iter() {
            visit(&ng.name);
            for t in ng.graph.iter() {
                t.terms().for_each(&mut visit);
            }
        }
        found.into_iter().collect()
    }

    /// Apply `mapping` to every graph, every graph name and the document IRI.
    pub(crate) fn substitute_all(&mut self, mapping: &[(Term, Term)]) {
        self.uri = replace_term(mapping, &self.uri);
        for role in GraphRole::ALL {
            let ng = self.get_mut(role);
            ng.name = replace_term(mapping, &ng.name);
            substitute_all(&mut ng.graph, mapping);
        }
    }

    /// Triples of `role`, leaving out the pubinfo triples in `exclude`.
    pub(crate) fn triples_except<'a>(
        &'a self,
        role: GraphRole,
        exclude: &'a [Triple],
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        let exclude = if role == GraphRole::PubInfo { exclude } else { &[] };
        self.get(role)
            .graph
            .iter()
            .filter(move |t| !exclude.contains(t))
    }
}

/// Whether `iri` is `base` itself or a fragment IRI under it.
pub fn is_anchored(iri: &str, base: &str) -> bool {
    iri.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('#'))
}

/// Read access shared by every document state.
pub trait Nanopub {
    fn graphs(&self) -> &NanopubGraphs;

    /// The document IRI: the placeholder for drafts, the content-derived
    /// identifier afterwards.
    fn uri(&self) -> &Term {
        self.graphs().uri()
    }

    fn head(&self) -> &Graph {
        &self.graphs().get(GraphRole::Head).graph
    }

    fn assertion(&self) -> &Graph {
        &self.graphs().get(GraphRole::Assertion).graph
    }

    fn provenance(&self) -> &Graph {
        &self.graphs().get(GraphRole::Provenance).graph
    }

    fn pubinfo(&self) -> &Graph {
        &self.graphs().get(GraphRole::PubInfo).graph
    }

    fn graph_name(&self, role: GraphRole) -> &Term {
        &self.graphs().get(role).name
    }

    /// The concept this document introduces, as stated in pubinfo.
    fn introduces_concept(&self) -> Option<&Term> {
        let introduces = Term::iri(npx::INTRODUCES);
        self.pubinfo()
            .matching(Some(self.uri()), None, None)
            .find(|t| t.predicate == introduces)
            .map(|t| &t.object)
    }

    fn quads(&self) -> Vec<Quad> {
        self.graphs().quads()
    }

    /// Canonical N-Quads serialization. Fails on terms that N-Quads cannot
    /// carry, such as IRIs with spaces.
    fn to_nquads(&self) -> Result<String, crate::nquads::SerializeError> {
        crate::nquads::to_nquads(&self.quads())
    }
}

impl Nanopub for NanopubGraphs {
    fn graphs(&self) -> &NanopubGraphs {
        self
    }
}

/// A blank-node concept waiting to be anchored under the final identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConcept {
    pub blank: Term,
    pub local_name: String,
}

/// A freshly assembled document, still based on [`PLACEHOLDER_BASE`].
#[derive(Debug, Clone, PartialEq)]
pub struct DraftDocument {
    pub(crate) graphs: NanopubGraphs,
    pub(crate) pending: Option<PendingConcept>,
}

impl DraftDocument {
    /// Mutable access to one of the draft's graphs.
    pub fn graph_mut(&mut self, role: GraphRole) -> &mut Graph {
        &mut self.graphs.get_mut(role).graph
    }

    /// The blank-node concept that finalization will anchor, if any.
    pub fn pending_concept(&self) -> Option<&PendingConcept> {
        self.pending.as_ref()
    }
}

impl Nanopub for DraftDocument {
    fn graphs(&self) -> &NanopubGraphs {
        &self.graphs
    }
}

/// A document carrying its content-derived identifier. Not `Clone`: it is
/// meant to be signed exactly once.
#[derive(Debug, PartialEq)]
pub struct FinalDocument {
    pub(crate) graphs: NanopubGraphs,
}

impl FinalDocument {
    pub(crate) fn into_graphs(self) -> NanopubGraphs {
        self.graphs
    }
}

impl Nanopub for FinalDocument {
    fn graphs(&self) -> &NanopubGraphs {
        &self.graphs
    }
}

/// A finalized document with its signature record in pubinfo.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedDocument {
    pub(crate) graphs: NanopubGraphs,
    pub(crate) signature: SignatureRecord,
}

impl SignedDocument {
    pub fn signature(&self) -> &SignatureRecord {
        &self.signature
    }

    /// Read a signed document back from quads, e.g. after parsing N-Quads
    /// received from a server.
    pub fn from_quads(quads: impl IntoIterator<Item = Quad>) -> crate::Result<Self> {
        let graphs = NanopubGraphs::from_quads(quads)?;
        let signature = SignatureRecord::read_from(&graphs)?;
        Ok(Self { graphs, signature })
    }
}

impl Nanopub for SignedDocument {
    fn graphs(&self) -> &NanopubGraphs {
        &self.graphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graphs_are_named_under_base() {
        let g = NanopubGraphs::new(PLACEHOLDER_BASE);
        assert_eq!(g.uri(), &Term::iri(PLACEHOLDER_BASE));
        assert_eq!(
            g.get(GraphRole::Assertion).name,
            Term::iri(format!("{PLACEHOLDER_BASE}#assertion"))
        );
        assert_eq!(
            g.get(GraphRole::PubInfo).name,
            Term::iri(format!("{PLACEHOLDER_BASE}#pubInfo"))
        );
        assert_eq!(g.head().len(), 4);
    }

    #[test]
    fn anchoring_requires_exact_base_or_fragment() {
        assert!(is_anchored("http://x.org/np", "http://x.org/np"));
        assert!(is_anchored("http://x.org/np#a", "http://x.org/np"));
        assert!(!is_anchored("http://x.org/np2", "http://x.org/np"));
        assert!(!is_anchored("http://x.org/n", "http://x.org/np"));
    }

    #[test]
    fn quads_round_trip_through_from_quads() {
        let mut g = NanopubGraphs::new("http://example.org/np1");
        g.get_mut(GraphRole::Assertion).graph.add(
            Term::iri("http://example.org/a"),
            Term::iri("http://example.org/p"),
            Term::literal("o"),
        );
        let back = NanopubGraphs::from_quads(g.quads()).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn from_quads_without_head_fails() {
        let quad = Quad::new(
            Triple::new(
                Term::iri("http://example.org/a"),
                Term::iri("http://example.org/p"),
                Term::literal("o"),
            ),
            Term::iri("http://example.org/g"),
        );
        assert_eq!(
            NanopubGraphs::from_quads(vec![quad]),
            Err(DocumentError::MissingHead)
        );
    }

    #[test]
    fn from_quads_rejects_stray_graphs() {
        let mut quads = NanopubGraphs::new("http://example.org/np1").quads();
        quads.push(Quad::new(
            Triple::new(
                Term::iri("http://example.org/a"),
                Term::iri("http://example.org/p"),
                Term::literal("o"),
            ),
            Term::iri("http://example.org/elsewhere"),
        ));
        assert!(matches!(
            NanopubGraphs::from_quads(quads),
            Err(DocumentError::StrayQuad(_))
        ));
    }
}
