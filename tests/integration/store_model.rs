//! Randomized model tests: every store variant must agree with a plain
//! set-of-triples model under arbitrary add/remove sequences, and the
//! variants must agree with each other on every binding pattern.

#![allow(missing_docs)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use trellis::graph::{Graph, GraphOptions, MemGraph};
use trellis::model::{Node, NodeComparison, Triple, TriplePattern};
use trellis::store::TripleStore;

fn t(s: u8, p: u8, o: u8) -> Triple {
    Triple::new(
        Node::iri(format!("s{s}")),
        Node::iri(format!("p{p}")),
        Node::iri(format!("o{o}")),
    )
}

fn sorted_strings(triples: impl Iterator<Item = Triple>) -> Vec<String> {
    let mut out: Vec<String> = triples.map(|t| t.to_string()).collect();
    out.sort();
    out
}

fn check_against_model<S: TripleStore>(
    graph: &MemGraph<S>,
    model: &BTreeSet<(u8, u8, u8)>,
) -> std::result::Result<(), TestCaseError> {
    prop_assert_eq!(graph.len(), model.len());
    let expected: Vec<String> =
        sorted_strings(model.iter().map(|&(s, p, o)| t(s, p, o)));
    let actual = sorted_strings(graph.find(TriplePattern::any()));
    prop_assert_eq!(actual, expected);
    Ok(())
}

proptest! {
    // Arbitrary interleavings of insertions and removals over a small
    // node universe, heavy on collisions and bunch churn.
    #[test]
    fn variants_agree_with_a_set_model(
        ops in proptest::collection::vec(
            (any::<bool>(), 0u8..6, 0u8..4, 0u8..8),
            1..250,
        )
    ) {
        let mut baseline = MemGraph::new(GraphOptions::new());
        let mut bitmap = MemGraph::bitmap_indexed(GraphOptions::new());
        let mut adaptive = MemGraph::adaptive_indexed(GraphOptions::new());
        let mut model = BTreeSet::new();

        for (add, s, p, o) in ops {
            let triple = t(s, p, o);
            if add {
                let expected = model.insert((s, p, o));
                prop_assert_eq!(baseline.add(triple.clone()), expected);
                prop_assert_eq!(bitmap.add(triple.clone()), expected);
                prop_assert_eq!(adaptive.add(triple.clone()), expected);
            } else {
                let expected = model.remove(&(s, p, o));
                prop_assert_eq!(baseline.delete(&triple), expected);
                prop_assert_eq!(bitmap.delete(&triple), expected);
                prop_assert_eq!(adaptive.delete(&triple), expected);
            }
        }

        check_against_model(&baseline, &model)?;
        check_against_model(&bitmap, &model)?;
        check_against_model(&adaptive, &model)?;
    }

    // For any population and any binding pattern, the three variants
    // return identical match sets.
    #[test]
    fn variants_agree_on_every_pattern(
        triples in proptest::collection::vec((0u8..5, 0u8..3, 0u8..5), 0..60),
        s in 0u8..5,
        p in 0u8..3,
        o in 0u8..5,
    ) {
        let mut baseline = MemGraph::new(GraphOptions::new());
        let mut bitmap = MemGraph::bitmap_indexed(GraphOptions::new());
        let mut adaptive = MemGraph::adaptive_indexed(GraphOptions::new());
        for &(s, p, o) in &triples {
            let triple = t(s, p, o);
            baseline.add(triple.clone());
            bitmap.add(triple.clone());
            adaptive.add(triple);
        }

        let subject = Node::iri(format!("s{s}"));
        let predicate = Node::iri(format!("p{p}"));
        let object = Node::iri(format!("o{o}"));
        for bits in 0u8..8 {
            let pattern = TriplePattern::new(
                (bits & 1 != 0).then(|| subject.clone()),
                (bits & 2 != 0).then(|| predicate.clone()),
                (bits & 4 != 0).then(|| object.clone()),
            );
            let expected = sorted_strings(baseline.find(pattern.clone()));
            prop_assert_eq!(
                sorted_strings(bitmap.find(pattern.clone())),
                expected.clone(),
                "bitmap diverged on {:?}", pattern
            );
            prop_assert_eq!(
                sorted_strings(adaptive.find(pattern.clone())),
                expected.clone(),
                "adaptive diverged on {:?}", pattern
            );
            // Every reported match really matches.
            for triple in baseline.find(pattern.clone()) {
                prop_assert!(pattern.matches(&triple, NodeComparison::Term));
            }
            prop_assert_eq!(baseline.contains(&pattern), !expected.is_empty());
        }
    }
}

// A long seeded churn run: interleaved mutation and querying, with the
// variants checked against each other at every step boundary.
#[test]
fn seeded_churn_keeps_variants_in_lockstep() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x7E11_15D0);
    let mut baseline = MemGraph::new(GraphOptions::new());
    let mut bitmap = MemGraph::bitmap_indexed(GraphOptions::new());
    let mut adaptive = MemGraph::adaptive_indexed(GraphOptions::new());
    let mut live: Vec<(u8, u8, u8)> = Vec::new();

    for round in 0..2_000 {
        let delete = !live.is_empty() && rng.gen_bool(0.4);
        if delete {
            let at = rng.gen_range(0..live.len());
            let (s, p, o) = live.swap_remove(at);
            let triple = t(s, p, o);
            assert!(baseline.delete(&triple));
            assert!(bitmap.delete(&triple));
            assert!(adaptive.delete(&triple));
        } else {
            let key = (rng.gen_range(0..8), rng.gen_range(0..4), rng.gen_range(0..10));
            let triple = t(key.0, key.1, key.2);
            let fresh = !live.contains(&key);
            if fresh {
                live.push(key);
            }
            assert_eq!(baseline.add(triple.clone()), fresh, "round {round}");
            assert_eq!(bitmap.add(triple.clone()), fresh);
            assert_eq!(adaptive.add(triple), fresh);
        }
        assert_eq!(baseline.len(), live.len());
        assert_eq!(bitmap.len(), live.len());
        assert_eq!(adaptive.len(), live.len());
    }

    // Spot-check membership of a shuffled sample at the end.
    live.shuffle(&mut rng);
    for &(s, p, o) in live.iter().take(100) {
        let pattern = TriplePattern::from(&t(s, p, o));
        assert!(baseline.contains(&pattern));
        assert!(bitmap.contains(&pattern));
        assert!(adaptive.contains(&pattern));
    }
}
