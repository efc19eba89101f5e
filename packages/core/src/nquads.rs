//! N-Triples and N-Quads serialization and parsing.
//!
//! Both directions go through `sophia_turtle`. Output is canonical in the
//! narrow sense this crate needs: statements are written in term order,
//! without duplicates. Every term is checked on the way out, so a document
//! holding a malformed IRI fails to serialize instead of producing output
//! that no parser accepts.

use sophia_api::quad::Quad as RdfQuad;
use sophia_api::serializer::{QuadSerializer, Stringifier, TripleSerializer};
use sophia_api::source::{QuadSource, StreamError, TripleSource};
use sophia_api::term::SimpleTerm;
use sophia_api::triple::Triple as RdfTriple;
use sophia_turtle::parser::{nq, nt};
use sophia_turtle::serializer::nq::NqSerializer;
use sophia_turtle::serializer::nt::NtSerializer;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::rdf::{Graph, Quad, Term, TermError, Triple};

/// Errors returned by the parsers.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("statement {0} has no graph label")]
    DefaultGraph(String),

    #[error(transparent)]
    Term(#[from] TermError),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Parse
    }
}

/// Errors returned by the serializers.
#[derive(Debug, Error, PartialEq)]
pub enum SerializeError {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error("serializer failed: {0}")]
    Write(String),
}

impl SerializeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

type SimpleQuad = ([SimpleTerm<'static>; 3], Option<SimpleTerm<'static>>);

fn spo(triple: &Triple) -> Result<[SimpleTerm<'static>; 3], TermError> {
    Ok([
        triple.subject.to_sophia()?,
        triple.predicate.to_sophia()?,
        triple.object.to_sophia()?,
    ])
}

/// Serialize quads as N-Quads, sorted and deduplicated.
pub fn to_nquads(quads: &[Quad]) -> Result<String, SerializeError> {
    let mut sorted: Vec<&Quad> = quads.iter().collect();
    sorted.sort();
    sorted.dedup();

    let dataset = sorted
        .into_iter()
        .map(|q| Ok((spo(&q.triple)?, Some(q.graph.to_sophia()?))))
        .collect::<Result<Vec<SimpleQuad>, TermError>>()?;

    let mut out = NqSerializer::new_stringifier();
    out.serialize_dataset(&dataset)
        .map_err(|e| SerializeError::Write(e.to_string()))?;
    Ok(out.as_str().to_string())
}

/// Serialize a graph as N-Triples, in the graph's term order.
pub fn to_ntriples(graph: &Graph) -> Result<String, SerializeError> {
    let triples = graph.iter().map(spo).collect::<Result<Vec<_>, _>>()?;

    let mut out = NtSerializer::new_stringifier();
    out.serialize_graph(&triples)
        .map_err(|e| SerializeError::Write(e.to_string()))?;
    Ok(out.as_str().to_string())
}

fn flatten<E: std::error::Error>(e: StreamError<E, ParseError>) -> ParseError {
    match e {
        StreamError::SourceError(e) => ParseError::Syntax(e.to_string()),
        StreamError::SinkError(e) => e,
    }
}

/// Parse N-Quads. Statements without a graph label are rejected, since a
/// nanopublication has no default-graph content.
pub fn parse_nquads(input: &str) -> Result<Vec<Quad>, ParseError> {
    let mut quads = Vec::new();
    nq::parse_str(input)
        .try_for_each_quad(|q| {
            let ([s, p, o], g) = q.to_spog();
            let triple = Triple::new(Term::from_sophia(s)?, Term::from_sophia(p)?, Term::from_sophia(o)?);
            match g {
                Some(g) => {
                    quads.push(Quad::new(triple, Term::from_sophia(g)?));
                    Ok(())
                }
                None => Err(ParseError::DefaultGraph(triple.to_string())),
            }
        })
        .map_err(flatten)?;
    Ok(quads)
}

/// Parse N-Triples into a graph.
pub fn parse_ntriples(input: &str) -> Result<Graph, ParseError> {
    let mut graph = Graph::new();
    nt::parse_str(input)
        .try_for_each_triple(|t| {
            let [s, p, o] = t.to_spo();
            graph.add(Term::from_sophia(s)?, Term::from_sophia(p)?, Term::from_sophia(o)?);
            Ok::<_, ParseError>(())
        })
        .map_err(flatten)?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Literal;

    #[test]
    fn parses_ntriples_with_every_term_kind() {
        let input = r#"
# a comment
<http://example.org/a> <http://example.org/p> "plain" .
_:b1 <http://example.org/p> "tagged"@en-GB .
<http://example.org/a> <http://example.org/n> "42"^^<http://www.w3.org/2001/XMLSchema#integer> .
<http://example.org/a> <http://example.org/q> _:b1.
"#;
        let g = parse_ntriples(input).unwrap();
        assert_eq!(g.len(), 4);
        assert!(g.contains(&Triple::new(
            Term::blank("b1"),
            Term::iri("http://example.org/p"),
            Term::Literal(Literal::lang("tagged", "en-GB")),
        )));
        assert!(g.contains(&Triple::new(
            Term::iri("http://example.org/a"),
            Term::iri("http://example.org/p"),
            Term::literal("plain"),
        )));
    }

    #[test]
    fn escapes_survive_serialization() {
        let value = "quote \" backslash \\ newline \n tab \t é";
        let mut g = Graph::new();
        g.add(
            Term::iri("http://example.org/a"),
            Term::iri("http://example.org/p"),
            Term::literal(value),
        );
        let back = parse_ntriples(&to_ntriples(&g).unwrap()).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn unicode_escapes_are_decoded() {
        let g = parse_ntriples(
            r#"<http://example.org/a> <http://example.org/p> "café \U0001F600" ."#,
        )
        .unwrap();
        let t = g.iter().next().unwrap();
        assert_eq!(t.object.as_literal_value(), Some("café 😀"));
    }

    #[test]
    fn nquads_carry_graph_labels() {
        let input = "<http://example.org/a> <http://example.org/p> <http://example.org/b> <http://example.org/g> .\n";
        let quads = parse_nquads(input).unwrap();
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].graph, Term::iri("http://example.org/g"));
        assert_eq!(parse_nquads(&to_nquads(&quads).unwrap()).unwrap(), quads);
    }

    #[test]
    fn nquads_without_graph_are_rejected() {
        let err = parse_nquads("<http://example.org/a> <http://example.org/p> <http://example.org/b> .\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::DefaultGraph(_)));
    }

    #[test]
    fn ntriples_reject_graph_labels() {
        let err = parse_ntriples(
            "<http://example.org/a> <http://example.org/p> <http://example.org/b> <http://example.org/g> .",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn syntax_errors_are_reported() {
        for input in [
            "<http://example.org/a> <http://example.org/p> \"open .\n",
            "\"lit\" <http://example.org/p> <http://example.org/b> .",
            "<http://example.org/a> <http://example.org/p> <http://example.org/b>",
        ] {
            assert!(matches!(parse_ntriples(input), Err(ParseError::Syntax(_))), "{input}");
        }
    }

    #[test]
    fn malformed_terms_fail_to_serialize() {
        let mut g = Graph::new();
        g.add(
            Term::iri("http://example.org/a> <http://example.org/p> \"x\" .\n<http://example.org/b"),
            Term::iri("http://example.org/p"),
            Term::literal("o"),
        );
        assert!(matches!(to_ntriples(&g), Err(SerializeError::Term(TermError::Iri(_)))));

        let quad = Quad::new(
            Triple::new(Term::blank("a b"), Term::iri("http://example.org/p"), Term::literal("o")),
            Term::iri("http://example.org/g"),
        );
        assert!(matches!(
            to_nquads(&[quad]),
            Err(SerializeError::Term(TermError::BlankNode(_)))
        ));
    }

    #[test]
    fn nquads_output_is_ordered() {
        let g = Term::iri("http://example.org/g");
        let q = |s: &str| {
            Quad::new(
                Triple::new(Term::iri(s), Term::iri("http://example.org/p"), Term::literal("o")),
                g.clone(),
            )
        };
        let a = to_nquads(&[q("http://example.org/b"), q("http://example.org/a")]).unwrap();
        let b = to_nquads(&[q("http://example.org/a"), q("http://example.org/b"), q("http://example.org/a")]).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("<http://example.org/a>"));
        assert_eq!(a.lines().count(), 2);
    }
}
