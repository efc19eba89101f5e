//! Human-readable text rendering of nanopublications.
//!
//! The output is stable plain text suitable for terminals and logs. It is not
//! a canonical format; only N-Quads ([`crate::nquads`]) is normative.

use crate::document::{is_anchored, GraphRole, Nanopub};
use crate::rdf::{Term, Triple};
use crate::signing::SignatureRecord;
use crate::vocab::{xsd, PREFIXES};

/// Render any document state as a summary followed by its four graphs.
///
/// ```text
/// Nanopublication  http://purl.org/np/RAj9...
/// ──────────────────────────────────────────
/// introduces:  this:DrBob
/// signed by:   https://orcid.org/0000-0000-0000-0000  key z8Kq...
///
/// HEAD (4)
///   this:  rdf:type  np:Nanopublication
///   ...
///
/// ASSERTION (1)
///   this:DrBob  hycl:claims  "it is raining"
/// ```
///
/// IRIs under the document IRI are shown as `this:…`, known vocabularies by
/// prefix, everything else in angle brackets.
pub fn render_document(doc: &impl Nanopub) -> String {
    let base = doc.uri().as_iri().unwrap_or_default();

    let header = format!("Nanopublication  {}", doc.uri().as_iri().unwrap_or("(unnamed)"));
    let rule = "─".repeat(header.chars().count());
    let mut out = format!("{header}\n{rule}\n");

    if let Some(concept) = doc.introduces_concept() {
        out.push_str(&format!("introduces:  {}\n", compact(concept, base)));
    }
    match SignatureRecord::read_from(doc.graphs()) {
        Ok(record) => out.push_str(&format!(
            "signed by:   {}  key {}\n",
            compact(&record.signed_by, base),
            short_fingerprint(&record.fingerprint),
        )),
        Err(_) => out.push_str("signed by:   (unsigned)\n"),
    }

    for role in GraphRole::ALL {
        let graph = &doc.graphs().get(role).graph;
        out.push('\n');
        out.push_str(&format!("{} ({})\n", label(role), graph.len()));
        for triple in graph.iter() {
            out.push_str(&format!("  {}\n", render_triple(triple, base)));
        }
    }

    out
}

/// One triple as `subject  predicate  object`, compacted against `base`.
pub fn render_triple(triple: &Triple, base: &str) -> String {
    format!(
        "{}  {}  {}",
        compact(&triple.subject, base),
        compact(&triple.predicate, base),
        compact(&triple.object, base),
    )
}

// --- helpers -----------------------------------------------------------------

fn label(role: GraphRole) -> &'static str {
    match role {
        GraphRole::Head => "HEAD",
        GraphRole::Assertion => "ASSERTION",
        GraphRole::Provenance => "PROVENANCE",
        GraphRole::PubInfo => "PUBINFO",
    }
}

fn compact(term: &Term, base: &str) -> String {
    match term {
        Term::Iri(iri) => compact_iri(iri, base),
        Term::BlankNode(label) => format!("_:{label}"),
        Term::Literal(lit) => {
            let mut s = format!("\"{}\"", truncate(&lit.value, 72));
            if let Some(lang) = &lit.language {
                s.push('@');
                s.push_str(lang);
            } else if let Some(dt) = &lit.datatype {
                // plain strings and dateTimes read fine without a suffix
                if dt != xsd::DATE_TIME && !dt.ends_with("#string") {
                    s.push_str("^^");
                    s.push_str(&compact_iri(dt, base));
                }
            }
            s
        }
    }
}

fn compact_iri(iri: &str, base: &str) -> String {
    if !base.is_empty() && is_anchored(iri, base) {
        let rest = &iri[base.len()..];
        return format!("this:{}", rest.trim_start_matches('#'));
    }
    PREFIXES
        .iter()
        .find_map(|(prefix, ns)| {
            iri.strip_prefix(ns)
                .filter(|local| !local.is_empty())
                .map(|local| format!("{prefix}:{local}"))
        })
        .unwrap_or_else(|| format!("<{iri}>"))
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}…")
    }
}

fn short_fingerprint(fp: &str) -> &str {
    fp.get(..12).unwrap_or(fp)
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publication::{assemble, AssembleOptions};
    use crate::rdf::Graph;
    use crate::trusty::finalize;

    fn claim() -> Graph {
        let mut g = Graph::new();
        g.add(
            Term::blank("DrBob"),
            Term::iri("http://purl.org/petapico/o/hycl#claims"),
            Term::literal("Cats are the best pets"),
        );
        g
    }

    #[test]
    fn draft_render_lists_every_graph() {
        let opts = AssembleOptions::default().introducing(Term::blank("DrBob"));
        let draft = assemble(claim(), opts, None).unwrap();
        let rendered = render_document(&draft);
        assert!(rendered.starts_with("Nanopublication  http://purl.org/nanopub/temp/mynanopub\n"));
        assert!(rendered.contains("HEAD (4)"));
        assert!(rendered.contains("ASSERTION (1)"));
        assert!(rendered.contains("PROVENANCE ("));
        assert!(rendered.contains("PUBINFO ("));
        assert!(rendered.contains("introduces:  this:DrBob"));
        assert!(rendered.contains("this:  rdf:type  np:Nanopublication"));
        assert!(rendered.contains("(unsigned)"));
    }

    #[test]
    fn final_render_compacts_under_the_identifier() {
        let opts = AssembleOptions::default().introducing(Term::blank("DrBob"));
        let doc = finalize(assemble(claim(), opts, None).unwrap());
        let rendered = render_document(&doc);
        assert!(rendered.contains("http://purl.org/np/RA"));
        assert!(rendered.contains("this:DrBob  hycl:claims  \"Cats are the best pets\""));
        assert!(!rendered.contains("mynanopub"));
    }

    #[test]
    fn unknown_iris_stay_bracketed() {
        assert_eq!(
            compact_iri("http://example.org/x", "http://purl.org/np/RAabc"),
            "<http://example.org/x>"
        );
        assert_eq!(compact_iri("http://purl.org/np/RAabc#sig", "http://purl.org/np/RAabc"), "this:sig");
    }

    #[test]
    fn long_literals_are_truncated() {
        let long = "x".repeat(100);
        let shown = compact(&Term::literal(long), "");
        assert_eq!(shown.chars().count(), 74);
        assert!(shown.ends_with("…\""));
    }
}
