//! Term substitution over a [`Graph`].
//!
//! Rewriting happens in two phases: the affected triples are collected
//! first, then removed and re-inserted with every matching position replaced
//! at once. A self-referential triple such as `(a, p, a)` therefore becomes
//! `(b, p, b)` in a single step.

use crate::rdf::{Graph, Term, Triple};

/// Replace `old` with `new` in every position of every triple of `graph`.
///
/// Triples that do not mention `old` are left alone. A no-op when `old` does
/// not occur or when `old == new`.
pub fn substitute(graph: &mut Graph, old: &Term, new: &Term) {
    if old == new {
        return;
    }
    substitute_all(graph, &[(old.clone(), new.clone())]);
}

/// Apply several substitutions in one pass.
///
/// Each position of a triple is looked up in `mapping` independently and
/// replaced by the first pair whose left side equals it. Replacements are not
/// chained: a term produced by one pair is never rewritten by another.
pub fn substitute_all(graph: &mut Graph, mapping: &[(Term, Term)]) {
    if mapping.is_empty() {
        return;
    }

    let affected: Vec<Triple> = graph
        .iter()
        .filter(|t| t.terms().any(|term| lookup(mapping, term).is_some()))
        .cloned()
        .collect();

    let rewritten: Vec<Triple> = affected
        .iter()
        .map(|t| {
            Triple::new(
                replace_term(mapping, &t.subject),
                replace_term(mapping, &t.predicate),
                replace_term(mapping, &t.object),
            )
        })
        .collect();

    for t in &affected {
        graph.remove(t);
    }
    graph.extend(rewritten);
}

/// Apply `mapping` to a single term.
pub fn replace_term(mapping: &[(Term, Term)], term: &Term) -> Term {
    lookup(mapping, term).cloned().unwrap_or_else(|| term.clone())
}

fn lookup<'a>(mapping: &'a [(Term, Term)], term: &Term) -> Option<&'a Term> {
    mapping
        .iter()
        .find(|(old, _)| old == term)
        .map(|(_, new)| new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Literal;
    use proptest::prelude::*;

    const FOAF_KNOWS: &str = "http://xmlns.com/foaf/0.1/knows";
    const RDF_TYPE: &str = crate::vocab::rdf::TYPE;

    fn lit(s: &str) -> Term {
        Term::Literal(Literal::new(s))
    }

    #[test]
    fn replaces_subject_and_object_positions() {
        let mut g = Graph::new();
        g.add(lit("DrBob"), Term::iri(RDF_TYPE), lit("Doctor"));
        g.add(lit("Alice"), Term::iri(FOAF_KNOWS), lit("DrBob"));

        substitute(&mut g, &lit("DrBob"), &lit("Alfonso"));

        assert!(g.contains(&Triple::new(lit("Alfonso"), Term::iri(RDF_TYPE), lit("Doctor"))));
        assert!(g.contains(&Triple::new(lit("Alice"), Term::iri(FOAF_KNOWS), lit("Alfonso"))));
        assert!(!g.contains(&Triple::new(lit("DrBob"), Term::iri(RDF_TYPE), lit("Doctor"))));
        assert!(!g.contains(&Triple::new(lit("Alice"), Term::iri(FOAF_KNOWS), lit("DrBob"))));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn self_referential_triple_is_rewritten_atomically() {
        let a = Term::iri("http://example.org/a");
        let b = Term::iri("http://example.org/b");
        let mut g = Graph::new();
        g.add(a.clone(), a.clone(), a.clone());

        substitute(&mut g, &a, &b);

        assert_eq!(g.len(), 1);
        assert!(g.contains(&Triple::new(b.clone(), b.clone(), b)));
        assert!(!g.mentions(&a));
    }

    #[test]
    fn absent_term_is_a_no_op() {
        let mut g = Graph::new();
        g.add(lit("x"), Term::iri(RDF_TYPE), lit("y"));
        let before = g.clone();
        substitute(&mut g, &lit("missing"), &lit("z"));
        assert_eq!(g, before);
    }

    #[test]
    fn mapping_does_not_chain() {
        let a = Term::iri("http://example.org/a");
        let b = Term::iri("http://example.org/b");
        let c = Term::iri("http://example.org/c");
        let mut g = Graph::new();
        g.add(a.clone(), Term::iri(RDF_TYPE), b.clone());

        substitute_all(&mut g, &[(a.clone(), b.clone()), (b.clone(), c.clone())]);

        assert!(g.contains(&Triple::new(b, Term::iri(RDF_TYPE), c)));
        assert_eq!(g.len(), 1);
    }

    fn small_term() -> impl Strategy<Value = Term> {
        prop_oneof![
            (0u8..4).prop_map(|i| Term::iri(format!("http://example.org/{i}"))),
            (0u8..3).prop_map(|i| Term::blank(format!("b{i}"))),
            (0u8..3).prop_map(|i| lit(&format!("v{i}"))),
        ]
    }

    fn small_graph() -> impl Strategy<Value = Graph> {
        prop::collection::vec((small_term(), small_term(), small_term()), 0..12)
            .prop_map(|ts| ts.into_iter().map(|(s, p, o)| Triple::new(s, p, o)).collect())
    }

    proptest! {
        #[test]
        fn old_term_disappears(mut g in small_graph(), a in small_term(), b in small_term()) {
            prop_assume!(a != b);
            let before = g.clone();
            let b_present = before.mentions(&b);
            substitute(&mut g, &a, &b);

            prop_assert!(!g.mentions(&a));
            for t in before.iter() {
                let expected = Triple::new(
                    if t.subject == a { b.clone() } else { t.subject.clone() },
                    if t.predicate == a { b.clone() } else { t.predicate.clone() },
                    if t.object == a { b.clone() } else { t.object.clone() },
                );
                prop_assert!(g.contains(&expected));
            }
            if !b_present {
                prop_assert_eq!(g.len(), before.len());
            }
        }
    }
}
