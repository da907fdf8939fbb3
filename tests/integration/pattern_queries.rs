//! Pattern query coverage across every store variant.
//!
//! The baseline, bitmap-indexed and adaptive-threshold stores must be
//! behaviorally indistinguishable: for a fixed dataset, each of the eight
//! subject/predicate/object binding patterns returns exactly the matching
//! subset, whichever representation sits underneath.

#![allow(missing_docs)]

use trellis::graph::{Graph, GraphOptions, MemGraph};
use trellis::model::{Datatype, Literal, Node, NodeComparison, Triple, TriplePattern};
use trellis::store::TripleStore;

fn t(s: &str, p: &str, o: &str) -> Triple {
    Triple::new(Node::iri(s), Node::iri(p), Node::iri(o))
}

fn dataset() -> Vec<Triple> {
    vec![
        t("s1", "p1", "o1"),
        t("s1", "p1", "o2"),
        t("s1", "p2", "o1"),
        t("s2", "p1", "o1"),
        t("s2", "p2", "o2"),
        t("s3", "p3", "o3"),
    ]
}

fn populate<S: TripleStore>(graph: &mut MemGraph<S>) {
    for triple in dataset() {
        assert!(graph.add(triple));
    }
}

// Every one of the eight binding patterns returns exactly the subset the
// pattern matches, and `contains` agrees with `find`.
fn check_all_eight_patterns<S: TripleStore>(graph: &MemGraph<S>) {
    let s1 = || Some(Node::iri("s1"));
    let p1 = || Some(Node::iri("p1"));
    let o1 = || Some(Node::iri("o1"));
    let cases = [
        TriplePattern::new(s1(), p1(), o1()),
        TriplePattern::new(s1(), p1(), None),
        TriplePattern::new(s1(), None, o1()),
        TriplePattern::new(s1(), None, None),
        TriplePattern::new(None, p1(), o1()),
        TriplePattern::new(None, p1(), None),
        TriplePattern::new(None, None, o1()),
        TriplePattern::any(),
    ];
    for pattern in cases {
        let expected: Vec<Triple> = dataset()
            .into_iter()
            .filter(|triple| pattern.matches(triple, NodeComparison::Term))
            .collect();
        let mut found: Vec<Triple> = graph.find(pattern.clone()).collect();
        let mut want = expected.clone();
        found.sort_by_key(|t| t.to_string());
        want.sort_by_key(|t| t.to_string());
        assert_eq!(found, want, "pattern {pattern:?}");
        assert_eq!(
            graph.contains(&pattern),
            !want.is_empty(),
            "contains disagrees with find for {pattern:?}"
        );
    }
}

fn check_misses<S: TripleStore>(graph: &MemGraph<S>) {
    let misses = [
        TriplePattern::from(&t("s1", "p1", "o3")),
        TriplePattern::new(Some(Node::iri("nope")), None, None),
        TriplePattern::new(None, Some(Node::iri("nope")), None),
        TriplePattern::new(None, None, Some(Node::iri("nope"))),
        TriplePattern::new(Some(Node::iri("s3")), None, Some(Node::iri("o1"))),
    ];
    for pattern in misses {
        assert!(!graph.contains(&pattern), "unexpected match for {pattern:?}");
        assert_eq!(graph.find(pattern.clone()).count(), 0);
    }
}

fn check_round_trip<S: TripleStore>(graph: &mut MemGraph<S>) {
    assert!(graph.is_empty());
    let triple = t("s", "p", "o");
    assert!(graph.add(triple.clone()));
    assert_eq!(graph.len(), 1);
    assert!(graph.delete(&triple));
    assert!(!graph.delete(&triple));
    assert_eq!(graph.len(), 0);
    assert_eq!(graph.find(TriplePattern::any()).count(), 0);
}

// Fifteen triples under one subject drive the subject bunch through its
// promotion; membership must be identical before and after the switch.
fn check_promotion_transparency<S: TripleStore>(graph: &mut MemGraph<S>) {
    let triples: Vec<Triple> = (0..15)
        .map(|n| t("hub", &format!("p{}", n % 2), &format!("o{n}")))
        .collect();
    for (inserted, triple) in triples.iter().enumerate() {
        assert!(graph.add(triple.clone()));
        for seen in &triples[..=inserted] {
            assert!(
                graph.contains(&seen.into()),
                "lost {seen} after {} inserts",
                inserted + 1
            );
        }
    }
    let by_subject = TriplePattern::new(Some(Node::iri("hub")), None, None);
    assert_eq!(graph.find(by_subject).count(), 15);
    for triple in &triples {
        assert!(graph.delete(triple));
    }
    assert!(graph.is_empty());
}

fn check_value_mode<S: TripleStore>(graph: &mut MemGraph<S>) {
    let spelled = Triple::new(
        Node::iri("s"),
        Node::iri("p"),
        Node::literal(Literal::typed("02", Datatype::Integer)),
    );
    let canonical = Triple::new(
        Node::iri("s"),
        Node::iri("p"),
        Node::literal(Literal::integer(2)),
    );
    assert!(graph.add(spelled.clone()));
    assert!(!graph.add(canonical.clone()), "value-equal duplicate accepted");
    assert!(graph.contains(&(&canonical).into()));
    let found: Vec<Triple> = graph
        .find(TriplePattern::new(
            None,
            None,
            Some(Node::literal(Literal::typed("2.0e0", Datatype::Double))),
        ))
        .collect();
    assert_eq!(found, vec![spelled]);
    assert!(graph.delete(&canonical));
    assert!(graph.is_empty());
}

fn check_cursor_removal<S: TripleStore>(graph: &mut MemGraph<S>) {
    populate(graph);
    let pattern = TriplePattern::new(None, Some(Node::iri("p1")), None);
    let before = graph.find(pattern.clone()).count();
    let mut cursor = graph.find_mut(pattern.clone());
    let mut visited = 0;
    while cursor.next().is_some() {
        visited += 1;
        cursor.remove_current().unwrap();
    }
    assert_eq!(visited, before);
    assert!(!graph.contains(&pattern));
    assert_eq!(graph.len(), 6 - before);
}

#[test]
fn baseline_patterns_complete() {
    let mut graph = MemGraph::new(GraphOptions::new());
    populate(&mut graph);
    check_all_eight_patterns(&graph);
    check_misses(&graph);
}

#[test]
fn bitmap_patterns_complete() {
    let mut graph = MemGraph::bitmap_indexed(GraphOptions::new());
    populate(&mut graph);
    check_all_eight_patterns(&graph);
    check_misses(&graph);
}

#[test]
fn adaptive_patterns_complete() {
    let mut graph = MemGraph::adaptive_indexed(GraphOptions::new());
    populate(&mut graph);
    check_all_eight_patterns(&graph);
    check_misses(&graph);
}

#[test]
fn round_trip_all_variants() {
    check_round_trip(&mut MemGraph::new(GraphOptions::new()));
    check_round_trip(&mut MemGraph::bitmap_indexed(GraphOptions::new()));
    check_round_trip(&mut MemGraph::adaptive_indexed(GraphOptions::new()));
}

#[test]
fn promotion_transparency_all_variants() {
    check_promotion_transparency(&mut MemGraph::new(GraphOptions::new()));
    check_promotion_transparency(&mut MemGraph::bitmap_indexed(GraphOptions::new()));
    check_promotion_transparency(&mut MemGraph::adaptive_indexed(GraphOptions::new()));
}

#[test]
fn value_comparison_all_variants() {
    let options = GraphOptions::new().comparison(NodeComparison::Value);
    check_value_mode(&mut MemGraph::new(options));
    check_value_mode(&mut MemGraph::bitmap_indexed(options));
    check_value_mode(&mut MemGraph::adaptive_indexed(options));
}

#[test]
fn cursor_removal_all_variants() {
    check_cursor_removal(&mut MemGraph::new(GraphOptions::new()));
    check_cursor_removal(&mut MemGraph::bitmap_indexed(GraphOptions::new()));
    check_cursor_removal(&mut MemGraph::adaptive_indexed(GraphOptions::new()));
}

#[test]
fn stream_is_equivalent_to_find() {
    let mut graph = MemGraph::new(GraphOptions::new());
    populate(&mut graph);
    let streamed: Vec<Triple> = graph
        .stream(None, Some(Node::iri("p1")), None)
        .collect();
    let found: Vec<Triple> = graph
        .find(TriplePattern::new(None, Some(Node::iri("p1")), None))
        .collect();
    assert_eq!(streamed, found);
    // Composes with standard adapters.
    let objects: Vec<String> = graph
        .stream(Some(Node::iri("s1")), None, None)
        .map(|triple| triple.object().to_string())
        .collect();
    assert_eq!(objects.len(), 3);
}
