//! Property-based tests for topic-grid
//!
//! - Codec invariants: bijection and disjointness of artifact paths
//! - Aggregation invariants: every in-range record lands in exactly one cell
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use std::path::PathBuf;
use topic_grid::experiment::{ArtifactPathCodec, CoherenceRecord, HyperparameterCombination, PriorMode};
use topic_grid::report::CoherenceMatrix;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn arb_prior() -> impl Strategy<Value = PriorMode> {
    prop_oneof![
        Just(PriorMode::Auto),
        Just(PriorMode::Symmetric),
        Just(PriorMode::Asymmetric),
    ]
}

/// Generate a valid combination (positive counts, any seed)
fn arb_combination() -> impl Strategy<Value = HyperparameterCombination> {
    (1u32..=500, arb_prior(), any::<u64>(), 1u32..=100, 1u32..=u32::MAX).prop_map(
        |(k, prior, seed, passes, iterations)| {
            HyperparameterCombination::new(k, prior, seed, passes, iterations).unwrap()
        },
    )
}

fn arb_root() -> impl Strategy<Value = PathBuf> {
    prop_oneof![
        Just(PathBuf::from("models")),
        Just(PathBuf::from("/var/lib/topic-grid/models")),
        Just(PathBuf::from("runs/2018-06/models")),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: decode(encode(c)) == c
    #[test]
    fn prop_codec_is_bijective(root in arb_root(), c in arb_combination()) {
        let codec = ArtifactPathCodec::new(root);
        let path = codec.encode(&c);
        prop_assert_eq!(codec.decode(&path).unwrap(), c);
    }

    /// Property: distinct combinations never share a path
    #[test]
    fn prop_codec_is_disjoint(c1 in arb_combination(), c2 in arb_combination()) {
        let codec = ArtifactPathCodec::new("models");
        prop_assert_eq!(c1 == c2, codec.encode(&c1) == codec.encode(&c2));
    }

    /// Property: encoded path sits exactly six segments below the root
    #[test]
    fn prop_codec_path_depth(root in arb_root(), c in arb_combination()) {
        let codec = ArtifactPathCodec::new(root.clone());
        let path = codec.encode(&c);
        let relative = path.strip_prefix(&root).unwrap();
        prop_assert_eq!(relative.components().count(), 6);
        prop_assert!(path.ends_with("model"));
    }

    /// Property: a path from a different root never decodes
    #[test]
    fn prop_codec_rejects_foreign_root(c in arb_combination()) {
        let writer = ArtifactPathCodec::new("models");
        let reader = ArtifactPathCodec::new("other");
        prop_assert!(reader.decode(&writer.encode(&c)).is_err());
    }

    /// Property: a zero-padded numeric segment never decodes
    #[test]
    fn prop_codec_rejects_padded_segments(c in arb_combination()) {
        let codec = ArtifactPathCodec::new("models");
        let padded = PathBuf::from("models")
            .join(format!("0{}", c.topic_count()))
            .join(c.prior().as_str())
            .join(c.random_seed().to_string())
            .join(c.passes().to_string())
            .join(c.iterations().to_string())
            .join("model");
        prop_assert!(codec.decode(&padded).is_err());
    }

    /// Property: the matrix holds one cell per distinct in-range combination
    #[test]
    fn prop_matrix_cell_count(
        cells in proptest::collection::btree_set(arb_combination(), 0..40),
        score in 0.0f64..1.0,
    ) {
        let records: Vec<CoherenceRecord> =
            cells.iter().map(|c| CoherenceRecord::new(c, score)).collect();

        let matrix = CoherenceMatrix::from_records(&records, Some(2..=20));
        let expected = cells.iter().filter(|c| (2..=20).contains(&c.topic_count())).count();
        prop_assert_eq!(matrix.len(), expected);

        let unbounded = CoherenceMatrix::from_records(&records, None);
        prop_assert_eq!(unbounded.len(), cells.len());
        for c in &cells {
            prop_assert_eq!(unbounded.get(c.topic_count(), &c.configuration_key()), Some(score));
        }
    }

    /// Property: best() is a maximum over all cells
    #[test]
    fn prop_matrix_best_is_max(
        scored in proptest::collection::vec((arb_combination(), 0.0f64..1.0), 1..30),
    ) {
        let records: Vec<CoherenceRecord> =
            scored.iter().map(|(c, s)| CoherenceRecord::new(c, *s)).collect();
        let matrix = CoherenceMatrix::from_records(&records, None);
        let best = matrix.best().unwrap();
        for row in matrix.topic_counts().iter().filter_map(|&k| matrix.row(k)) {
            for score in row.values() {
                prop_assert!(*score <= best.score);
            }
        }
    }
}
