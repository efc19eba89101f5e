//! Owned RDF values: [`Term`], [`Triple`], [`Quad`] and [`Graph`].
//!
//! Terms form a closed set of three kinds (IRI, blank node, literal). Every
//! type here is totally ordered so that a [`Graph`] iterates in a stable
//! order, which is what makes serialization and digests reproducible.
//!
//! Syntax checks and conversions go through `sophia_api`: [`Term::to_sophia`]
//! validates IRIs, blank node labels and language tags, and
//! [`Term::from_sophia`] accepts any term produced by a sophia parser.

use std::collections::BTreeSet;
use std::fmt;

use sophia_api::term::{BnodeId, IriRef, LanguageTag, SimpleTerm, Term as RdfTerm, TermKind};
use sophia_api::MownStr;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::vocab::xsd;

/// A term that cannot be written as N-Triples.
#[derive(Debug, Error, PartialEq)]
pub enum TermError {
    #[error("invalid IRI <{0}>")]
    Iri(String),

    #[error("invalid blank node label _:{0}")]
    BlankNode(String),

    #[error("invalid language tag @{0}")]
    Language(String),

    #[error("unsupported term kind {0:?}")]
    Unsupported(TermKind),
}

impl TermError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

/// An RDF literal: a lexical value with an optional datatype IRI or language
/// tag. A plain literal has neither.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    /// A plain string literal.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// A literal with an explicit datatype IRI, e.g. `xsd:dateTime`.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// A language-tagged literal, e.g. `"chat"@fr`.
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

/// An RDF term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// An absolute IRI reference.
    Iri(String),
    /// An anonymous node, scoped to the document it appears in. The string is
    /// the label without the `_:` prefix.
    BlankNode(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// An IRI term, rejecting strings that are not IRI references.
    pub fn try_iri(iri: impl Into<String>) -> Result<Self, TermError> {
        let term = Term::Iri(iri.into());
        term.to_sophia()?;
        Ok(term)
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal::new(value))
    }

    /// The IRI string, if this term is an IRI.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The literal's lexical value, if this term is a literal.
    pub fn as_literal_value(&self) -> Option<&str> {
        match self {
            Term::Literal(lit) => Some(&lit.value),
            _ => None,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Convert to a sophia term, checking the syntax of every part.
    pub fn to_sophia(&self) -> Result<SimpleTerm<'static>, TermError> {
        let term = match self {
            Term::Iri(iri) => SimpleTerm::Iri(checked_iri(iri)?),
            Term::BlankNode(label) => SimpleTerm::BlankNode(
                BnodeId::new(MownStr::from(label.clone()))
                    .map_err(|_| TermError::BlankNode(label.clone()))?,
            ),
            Term::Literal(lit) => {
                let value = MownStr::from(lit.value.clone());
                match &lit.language {
                    Some(tag) => SimpleTerm::LiteralLanguage(
                        value,
                        LanguageTag::new(MownStr::from(tag.clone()))
                            .map_err(|_| TermError::Language(tag.clone()))?,
                    ),
                    None => SimpleTerm::LiteralDatatype(
                        value,
                        checked_iri(lit.datatype.as_deref().unwrap_or(xsd::STRING))?,
                    ),
                }
            }
        };
        Ok(term)
    }

    /// Convert any sophia term. RDF-star triples and variables are rejected.
    pub fn from_sophia<T: RdfTerm>(term: T) -> Result<Self, TermError> {
        let kind = term.kind();
        let converted = match kind {
            TermKind::Iri => term.iri().map(|iri| Term::Iri(iri.as_str().to_string())),
            TermKind::BlankNode => term
                .bnode_id()
                .map(|id| Term::BlankNode(id.as_str().to_string())),
            TermKind::Literal => term.lexical_form().map(|value| {
                let value = value.to_string();
                let literal = match (term.language_tag(), term.datatype()) {
                    (Some(tag), _) => Literal::lang(value, tag.as_str()),
                    (None, Some(dt)) if dt.as_str() != xsd::STRING => {
                        Literal::typed(value, dt.as_str())
                    }
                    _ => Literal::new(value),
                };
                Term::Literal(literal)
            }),
            _ => None,
        };
        converted.ok_or(TermError::Unsupported(kind))
    }
}

fn checked_iri(iri: &str) -> Result<IriRef<MownStr<'static>>, TermError> {
    IriRef::new(MownStr::from(iri.to_string())).map_err(|_| TermError::Iri(iri.to_string()))
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

/// N-Triples-like form used in messages and digests. Characters that may
/// not appear inside `<…>` are written as `\u` escapes.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", escape_iri(iri)),
            Term::BlankNode(label) => write!(f, "_:{label}"),
            Term::Literal(lit) => {
                write!(f, "\"{}\"", escape_literal(&lit.value))?;
                if let Some(lang) = &lit.language {
                    write!(f, "@{lang}")
                } else if let Some(dt) = &lit.datatype {
                    write!(f, "^^<{}>", escape_iri(dt))
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '\u{0}'..='\u{20}' => {
                out.push_str(&format!("\\u{:04X}", c as u32))
            }
            c => out.push(c),
        }
    }
    out
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// A `(subject, predicate, object)` statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Whether `term` occurs in any position of this triple.
    pub fn mentions(&self, term: &Term) -> bool {
        &self.subject == term || &self.predicate == term || &self.object == term
    }

    /// Whether the triple matches a pattern; `None` is a wildcard.
    pub fn matches(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> bool {
        s.map_or(true, |s| &self.subject == s)
            && p.map_or(true, |p| &self.predicate == p)
            && o.map_or(true, |o| &self.object == o)
    }

    /// Iterate the three positions in subject, predicate, object order.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        [&self.subject, &self.predicate, &self.object].into_iter()
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// A triple placed in a named graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quad {
    pub triple: Triple,
    pub graph: Term,
}

impl Quad {
    pub fn new(triple: Triple, graph: Term) -> Self {
        Self { triple, graph }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.triple, self.graph)
    }
}

/// A set of triples. Inserting a triple that is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    /// Insert the triple `(s, p, o)`.
    pub fn add(&mut self, s: Term, p: Term, o: Term) -> bool {
        self.insert(Triple::new(s, p, o))
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate over all triples in term order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples matching a pattern; `None` matches any term.
    pub fn matching<'a>(
        &'a self,
        s: Option<&'a Term>,
        p: Option<&'a Term>,
        o: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| t.matches(s, p, o))
    }

    /// Whether any triple matches the pattern.
    pub fn has(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> bool {
        self.triples.iter().any(|t| t.matches(s, p, o))
    }

    /// Objects of all triples with the given subject and predicate.
    pub fn objects<'a>(&'a self, s: &'a Term, p: &'a Term) -> impl Iterator<Item = &'a Term> + 'a {
        self.matching(Some(s), Some(p), None).map(|t| &t.object)
    }

    /// Whether `term` occurs anywhere in the graph.
    pub fn mentions(&self, term: &Term) -> bool {
        self.triples.iter().any(|t| t.mentions(term))
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl IntoIterator for Graph {
    type Item = Triple;
    type IntoIter = std::collections::btree_set::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://example.org/{local}"))
    }

    #[test]
    fn duplicates_collapse() {
        let mut g = Graph::new();
        assert!(g.add(ex("a"), ex("p"), ex("b")));
        assert!(!g.add(ex("a"), ex("p"), ex("b")));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn pattern_matching_uses_wildcards() {
        let mut g = Graph::new();
        g.add(ex("a"), ex("p"), ex("b"));
        g.add(ex("a"), ex("q"), Term::literal("x"));
        g.add(ex("c"), ex("p"), ex("b"));
        assert_eq!(g.matching(Some(&ex("a")), None, None).count(), 2);
        assert_eq!(g.matching(None, Some(&ex("p")), Some(&ex("b"))).count(), 2);
        assert!(!g.has(Some(&ex("c")), Some(&ex("q")), None));
    }

    #[test]
    fn display_uses_ntriples_syntax() {
        let t = Triple::new(
            Term::blank("b0"),
            ex("says"),
            Term::Literal(Literal::lang("say \"hi\"\n", "en")),
        );
        assert_eq!(
            t.to_string(),
            r#"_:b0 <http://example.org/says> "say \"hi\"\n"@en"#
        );
        let dt = Term::Literal(Literal::typed("1", "http://www.w3.org/2001/XMLSchema#integer"));
        assert_eq!(dt.to_string(), "\"1\"^^<http://www.w3.org/2001/XMLSchema#integer>");
    }

    #[test]
    fn display_escapes_iri_delimiters() {
        assert_eq!(ex("a>b c").to_string(), "<http://example.org/a\\u003Eb\\u0020c>");
    }

    #[test]
    fn sophia_conversion_keeps_every_kind() {
        for term in [
            ex("a"),
            Term::blank("b0"),
            Term::literal("plain"),
            Term::Literal(Literal::lang("chat", "fr")),
            Term::Literal(Literal::typed("1", "http://www.w3.org/2001/XMLSchema#integer")),
        ] {
            let simple = term.to_sophia().unwrap();
            assert_eq!(Term::from_sophia(simple).unwrap(), term);
        }
    }

    #[test]
    fn malformed_terms_are_rejected() {
        assert_eq!(
            Term::try_iri("http://example.org/a b"),
            Err(TermError::Iri("http://example.org/a b".into()))
        );
        assert!(matches!(
            Term::blank("has space").to_sophia(),
            Err(TermError::BlankNode(_))
        ));
        assert!(matches!(
            Term::Literal(Literal::lang("x", "not a tag")).to_sophia(),
            Err(TermError::Language(_))
        ));
    }

    #[test]
    fn iteration_order_is_stable() {
        let a: Graph = [
            Triple::new(ex("b"), ex("p"), ex("o")),
            Triple::new(ex("a"), ex("p"), ex("o")),
        ]
        .into_iter()
        .collect();
        let b: Graph = [
            Triple::new(ex("a"), ex("p"), ex("o")),
            Triple::new(ex("b"), ex("p"), ex("o")),
        ]
        .into_iter()
        .collect();
        let la: Vec<_> = a.iter().map(|t| t.to_string()).collect();
        let lb: Vec<_> = b.iter().map(|t| t.to_string()).collect();
        assert_eq!(la, lb);
        assert_eq!(a, b);
    }
}
