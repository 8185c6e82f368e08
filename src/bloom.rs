//! Double-hashing Bloom embedder (§4.2): maps a shingle multiset to a sparse
//! set of bit indices in a filter of width `m`.

use itertools::Itertools;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::embedder_config::EmbedderConfig;
use crate::shingle::FeatureBag;

/// Two independent 64-bit digests derived from the same key by reseeding the
/// hasher, giving `k` effectively independent hash positions at the cost of
/// two digest computations per shingle (the double-hashing trick, §4.2).
const H1_SEED: u64 = 0x9E37_79B9_7F4A_7C15;
const H2_SEED: u64 = 0xC2B2_AE3D_27D4_EB4F;

fn digest_pair(salt: &[u8], key: &[u8]) -> (u64, u64) {
    let mut buf = Vec::with_capacity(salt.len() + key.len());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(key);
    let h1 = xxh3_64_with_seed(&buf, H1_SEED);
    let h2 = xxh3_64_with_seed(&buf, H2_SEED);
    (h1, h2)
}

/// Hashes every shingle in `bag` to `k` positions in `[0, config.m())` and
/// returns the sorted, deduplicated union of all set bits.
#[must_use]
pub fn embed_positions(bag: &FeatureBag, config: &EmbedderConfig) -> Vec<u32> {
    let m = u64::from(config.m());
    let k = config.k();
    let salt = config.salt();

    bag.iter()
        .flat_map(|shingle| {
            let key = shingle.hash_key();
            let (h1, h2) = digest_pair(salt, &key);
            (0..k).map(move |i| (h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % m) as u32)
        })
        .unique()
        .sorted()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder_config::TokenSimilarityMatrix;
    use crate::shingle::Shingle;

    fn config(m: u32, k: u32, salt: Vec<u8>) -> EmbedderConfig {
        EmbedderConfig::new(m, k, salt, TokenSimilarityMatrix::Identity).unwrap()
    }

    #[test]
    fn positions_are_within_range_and_sorted() {
        let cfg = config(256, 3, vec![]);
        let bag: FeatureBag = (0..20)
            .map(|i| Shingle::from_str("name", &format!("tok{i}")))
            .collect();
        let positions = embed_positions(&bag, &cfg);
        assert!(positions.iter().all(|&p| p < 256));
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        let mut deduped = positions.clone();
        deduped.dedup();
        assert_eq!(positions, deduped);
    }

    #[test]
    fn empty_bag_yields_no_positions() {
        let cfg = config(256, 3, vec![]);
        let positions = embed_positions(&FeatureBag::new(), &cfg);
        assert!(positions.is_empty());
    }

    #[test]
    fn different_salt_yields_different_positions() {
        let bag: FeatureBag = vec![Shingle::from_str("name", "laura")];
        let a = embed_positions(&bag, &config(1024, 4, vec![1, 2, 3]));
        let b = embed_positions(&bag, &config(1024, 4, vec![4, 5, 6]));
        assert_ne!(a, b);
    }

    #[test]
    fn deterministic_across_calls() {
        let bag: FeatureBag = vec![
            Shingle::from_str("name", "laura"),
            Shingle::from_str("name", "ochoa"),
        ];
        let cfg = config(2048, 5, vec![9, 9]);
        assert_eq!(embed_positions(&bag, &cfg), embed_positions(&bag, &cfg));
    }

    #[test]
    fn distinct_labels_rarely_collide_same_as_distinct_tokens() {
        // ("bass","instrument") and ("bass","voice") should hash to
        // different position sets (almost certainly, given m this large).
        let cfg = config(1 << 20, 4, vec![]);
        let a: FeatureBag = vec![Shingle::from_str("instrument", "bass")];
        let b: FeatureBag = vec![Shingle::from_str("voice", "bass")];
        assert_ne!(embed_positions(&a, &cfg), embed_positions(&b, &cfg));
    }
}
