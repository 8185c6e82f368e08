//! End-to-end exercises of the numbered scenarios in spec §8, driven only
//! through the public API: build a `Table`, embed both sides with the same
//! `Embedder`, compare, and match.

use std::collections::BTreeMap;

use pprl_core::{
    ColumnSpec, Embedder, EmbedderConfig, FeatureFactory, LinkageError, RowTable,
    TokenSimilarityMatrix,
};

fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn person_colspec() -> ColumnSpec {
    ColumnSpec::new()
        .with_column("first_name", "name", None)
        .with_column("last_name", "name", None)
        .with_column("sex", "sex", None)
        .with_column("instrument", "shingle", Some("instrument".to_string()))
}

fn embedder(m: u32, k: u32) -> Embedder {
    let config = EmbedderConfig::new(m, k, vec![], TokenSimilarityMatrix::Identity).unwrap();
    Embedder::new(config, FeatureFactory::with_defaults())
}

/// S1: clean trio; names, sexes, and instruments vary in spelling and
/// phrasing but the feature overlap should still make each true pair the
/// best-scoring candidate for both its row and its column.
#[test]
fn s1_trio_clean_matches_on_identity() {
    let d1 = RowTable::new(vec![
        row(&[("first_name", "Laura"), ("last_name", "Ochoa"), ("sex", "f"), ("instrument", "bass")]),
        row(&[("first_name", "Mark"), ("last_name", "Speer"), ("sex", "m"), ("instrument", "guitar")]),
        row(&[("first_name", "DJ"), ("last_name", "Johnson"), ("sex", "m"), ("instrument", "drums")]),
    ]);
    let d2 = RowTable::new(vec![
        row(&[("first_name", "Laura 'Leezy' Lee"), ("last_name", "Ochoa"), ("sex", "female"), ("instrument", "bass guitar")]),
        row(&[("first_name", "Donald J"), ("last_name", "Johnson"), ("sex", "male"), ("instrument", "percussion")]),
        row(&[("first_name", "Marc"), ("last_name", "Spear"), ("sex", "male"), ("instrument", "electric guitar")]),
    ]);

    let embedder = embedder(1024, 2);
    let spec = person_colspec();
    let e1 = embedder.embed(&d1, &spec, true).unwrap();
    let e2 = embedder.embed(&d2, &spec, true).unwrap();
    let sim = embedder.compare(&e1, &e2).unwrap();
    let matching = sim.find_matching(None, Some(false)).unwrap();

    let pairs: Vec<(usize, usize)> = matching.pairs().collect();
    assert_eq!(pairs.len(), 3, "every row should find a candidate: {pairs:?}");
    assert!(pairs.contains(&(0, 0)));
    assert!(pairs.contains(&(1, 2)));
    assert!(pairs.contains(&(2, 1)));

    for &(i, j) in &pairs {
        let score = sim.get(i, j);
        assert!(score > 0.0, "matched pair ({i},{j}) should score above zero");
        for other in 0..e2.len() {
            assert!(score + 1e-9 >= sim.get(i, other), "row {i} prefers a non-match over its assigned pair");
        }
    }
}

/// S2: same shape, but every name carries a typo or phonetic variant.
#[test]
fn s2_trio_misspelled_still_matches() {
    let d1 = RowTable::new(vec![
        row(&[("first_name", "Laura"), ("last_name", "Daten"), ("sex", "f"), ("instrument", "bass")]),
        row(&[("first_name", "Kaspar"), ("last_name", "Gorman"), ("sex", "m"), ("instrument", "guitar")]),
        row(&[("first_name", "Grete"), ("last_name", "Knopf"), ("sex", "f"), ("instrument", "drums")]),
    ]);
    let d2 = RowTable::new(vec![
        row(&[("first_name", "Laura"), ("last_name", "Datten"), ("sex", "f"), ("instrument", "bass")]),
        row(&[("first_name", "Greta"), ("last_name", "Knopf"), ("sex", "f"), ("instrument", "drums")]),
        row(&[("first_name", "Casper"), ("last_name", "Goreman"), ("sex", "m"), ("instrument", "guitar")]),
    ]);

    let embedder = embedder(1024, 2);
    let spec = person_colspec();
    let e1 = embedder.embed(&d1, &spec, true).unwrap();
    let e2 = embedder.embed(&d2, &spec, true).unwrap();
    let sim = embedder.compare(&e1, &e2).unwrap();
    let matching = sim.find_matching(None, Some(false)).unwrap();

    let pairs: Vec<(usize, usize)> = matching.pairs().collect();
    assert_eq!(pairs.len(), 3);
    assert!(pairs.contains(&(0, 0)));
    assert!(pairs.contains(&(1, 2)));
    assert!(pairs.contains(&(2, 1)));
    for &(i, j) in &pairs {
        assert!(sim.get(i, j) > 0.0);
    }
}

/// S3: a record with a missing date-of-birth still matches on its
/// remaining features, scoring strictly higher against its true
/// counterpart than against any non-match.
#[test]
fn s3_missing_dob_is_tolerated() {
    let colspec = ColumnSpec::new()
        .with_column("first_name", "name", None)
        .with_column("last_name", "name", None)
        .with_column("dob", "dob", None);

    let d1 = RowTable::new(vec![
        row(&[("first_name", "Laura"), ("last_name", "Ochoa"), ("dob", "")]),
        row(&[("first_name", "Mark"), ("last_name", "Speer"), ("dob", "04/03/1990")]),
    ]);
    let d2 = RowTable::new(vec![
        row(&[("first_name", "Laura"), ("last_name", "Ochoa"), ("dob", "04/03/1988")]),
        row(&[("first_name", "Mark"), ("last_name", "Speer"), ("dob", "04/03/1990")]),
    ]);

    let embedder = embedder(1024, 2);
    let e1 = embedder.embed(&d1, &colspec, false).unwrap();
    let e2 = embedder.embed(&d2, &colspec, false).unwrap();
    let sim = embedder.compare(&e1, &e2).unwrap();

    assert!(sim.get(0, 0) > 0.0, "missing dob should not zero out the whole row");
    assert!(sim.get(0, 0) > sim.get(0, 1), "row 0 should prefer its true counterpart");
}

/// S4: comparing datasets embedded under different filter widths must
/// fail with `ConfigMismatch` and never produce a matrix.
#[test]
fn s4_config_mismatch_is_rejected() {
    let table = RowTable::new(vec![row(&[("first_name", "Laura"), ("last_name", "Ochoa")])]);
    let colspec = ColumnSpec::new()
        .with_column("first_name", "name", None)
        .with_column("last_name", "name", None);

    let e1 = embedder(1024, 2).embed(&table, &colspec, false).unwrap();
    let e2 = embedder(2048, 2).embed(&table, &colspec, false).unwrap();

    let err = embedder(1024, 2).compare(&e1, &e2).unwrap_err();
    assert!(matches!(err, LinkageError::ConfigMismatch));
}

/// S5: a row whose self-dataset contains a near-duplicate should get a
/// threshold that rejects its best (but imperfect) cross-dataset match
/// when `require_thresholds` is enabled, and accept it when disabled.
#[test]
fn s5_threshold_rejects_near_duplicate_owner() {
    let colspec = ColumnSpec::new().with_column("first_name", "name", None);

    // D1 contains two near-identical names, so row 0's self-distribution
    // threshold climbs close to 1.0.
    let d1 = RowTable::new(vec![
        row(&[("first_name", "Jonathan")]),
        row(&[("first_name", "Jonathan")]),
    ]);
    // D1's true counterpart in D2 is a looser variant that won't clear
    // that self-derived threshold.
    let d2 = RowTable::new(vec![row(&[("first_name", "Jon")])]);

    let embedder = embedder(1024, 3);
    let e1 = embedder.embed(&d1, &colspec, true).unwrap();
    let e2 = embedder.embed(&d2, &colspec, false).unwrap();
    let sim = embedder.compare(&e1, &e2).unwrap();

    assert!(sim.left_threshold(0) > sim.get(0, 0), "threshold should exceed the cross-dataset score in this setup");

    let with_thresholds = sim.find_matching(None, Some(true)).unwrap();
    let without_thresholds = sim.find_matching(None, Some(false)).unwrap();
    assert!(with_thresholds.pairs().all(|(i, _)| i != 0));
    assert!(without_thresholds.pairs().any(|(i, j)| i == 0 && j == 0));
}

/// S6: FEBRL-scale sanity, scaled down to run in milliseconds; two
/// datasets built from the same ground truth, one side lightly corrupted,
/// should yield high precision and recall under default parameters.
#[test]
fn s6_synthetic_scale_precision_and_recall() {
    const N: usize = 40;
    let first_names = ["Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Jamie", "Drew"];
    let last_names = ["Nguyen", "Garcia", "Patel", "Kowalski", "Johansson", "Adeyemi", "Rossi", "Haddad"];

    let mut d1_rows = Vec::with_capacity(N);
    let mut d2_rows = Vec::with_capacity(N);

    for i in 0..N {
        let first = first_names[i % first_names.len()];
        let last = format!("{}-{i:03}", last_names[i % last_names.len()]);
        let dob = format!("{:02}/{:02}/19{:02}", 1 + i % 28, 1 + i % 12, 50 + i % 40);
        let sex = if i % 2 == 0 { "f" } else { "m" };

        d1_rows.push(row(&[
            ("first_name", first),
            ("last_name", &last),
            ("dob", &dob),
            ("sex", sex),
        ]));

        // Every third record gets a one-character transposition in the
        // first name; every fifth gets a day/month swap in the dob. Both
        // are mild enough that the untouched fields still carry the match.
        let corrupted_first = if i % 3 == 0 && first.len() > 2 {
            let mut chars: Vec<char> = first.chars().collect();
            chars.swap(1, 2);
            chars.into_iter().collect::<String>()
        } else {
            first.to_string()
        };
        let corrupted_dob = if i % 5 == 0 {
            format!("{:02}/{:02}/19{:02}", 1 + i % 12, 1 + i % 28, 50 + i % 40)
        } else {
            dob.clone()
        };

        d2_rows.push(row(&[
            ("first_name", &corrupted_first),
            ("last_name", &last),
            ("dob", &corrupted_dob),
            ("sex", sex),
        ]));
    }

    let d1 = RowTable::new(d1_rows);
    let d2 = RowTable::new(d2_rows);
    let colspec = ColumnSpec::new()
        .with_column("first_name", "name", None)
        .with_column("last_name", "name", None)
        .with_column("dob", "dob", None)
        .with_column("sex", "sex", None);

    let embedder = embedder(4096, 3);
    let e1 = embedder.embed(&d1, &colspec, true).unwrap();
    let e2 = embedder.embed(&d2, &colspec, true).unwrap();
    let sim = embedder.compare(&e1, &e2).unwrap();
    let matching = sim.find_matching(None, None).unwrap();

    let correct = matching.pairs().filter(|&(i, j)| i == j).count();
    let total = matching.len();
    let precision = correct as f64 / total.max(1) as f64;
    let recall = correct as f64 / N as f64;

    assert!(precision >= 0.9, "precision {precision} below 0.9 ({correct}/{total})");
    assert!(recall >= 0.8, "recall {recall} below 0.8 ({correct}/{N})");
}
