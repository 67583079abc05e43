// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Reproducible corpus and path generation for stress tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use semantic_space::{DependencyPath, DependencyTreeNode, WordPosition, EMPTY_TOKEN};

/// `(head POS, relation, dependent POS)` steps the template tiers accept.
const ACCEPTED_STEPS: &[(&str, &str, &str)] = &[
    ("N", "subj", "V"),
    ("V", "obj", "N"),
    ("A", "mod", "N"),
    ("N", "nn", "N"),
    ("N", "gen", "N"),
];

/// Steps no template tier accepts.
const REJECTED_STEPS: &[(&str, &str, &str)] = &[("N", "det", "Det"), ("V", "aux", "Aux")];

/// `w0`, `w1`, ... `w{size-1}`.
pub fn vocabulary(size: usize) -> Vec<String> {
    (0..size).map(|i| format!("w{i}")).collect()
}

/// Skewed pick: low indices are far more frequent, like a natural corpus.
fn skewed_index(rng: &mut ChaCha8Rng, len: usize) -> usize {
    let u: f64 = rng.random();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let idx = (u * u * u * len as f64) as usize;
    idx.min(len - 1)
}

/// Generate tokenized documents over `vocab`.
///
/// Roughly `filtered_ratio` of tokens are replaced by [`EMPTY_TOKEN`].
pub fn generate_documents(
    count: usize,
    length: usize,
    vocab: &[String],
    filtered_ratio: f64,
    seed: u64,
) -> Vec<Vec<String>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (0..length)
                .map(|_| {
                    if rng.random_bool(filtered_ratio) {
                        EMPTY_TOKEN.to_string()
                    } else {
                        vocab[skewed_index(&mut rng, vocab.len())].clone()
                    }
                })
                .collect()
        })
        .collect()
}

/// Generate `count` word-position keys drawn from `distinct` context words
/// and offsets in `-window..=window`, with heavy repetition.
pub fn generate_feature_keys(
    count: usize,
    distinct: usize,
    window: i32,
    seed: u64,
) -> Vec<WordPosition> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let word = skewed_index(&mut rng, distinct);
            let mut offset = rng.random_range(-window..=window);
            if offset == 0 {
                offset = 1;
            }
            WordPosition::new(format!("w{word}"), offset)
        })
        .collect()
}

/// Generate `(focus, paths)` pairs. About `rejected_ratio` of the paths use
/// relations no template tier accepts.
pub fn generate_dependency_batch(
    focus_count: usize,
    paths_per_focus: usize,
    vocab: &[String],
    rejected_ratio: f64,
    seed: u64,
) -> Vec<(String, Vec<DependencyPath>)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..focus_count)
        .map(|f| {
            let focus = vocab[f % vocab.len()].clone();
            let paths = (0..paths_per_focus)
                .map(|_| {
                    let steps = if rng.random_bool(rejected_ratio) {
                        REJECTED_STEPS
                    } else {
                        ACCEPTED_STEPS
                    };
                    let (head, rel, dep) = steps[rng.random_range(0..steps.len())];
                    let target = &vocab[skewed_index(&mut rng, vocab.len())];
                    DependencyPath::new(DependencyTreeNode::new(focus.clone(), head))
                        .then(rel, DependencyTreeNode::new(target.clone(), dep))
                })
                .collect();
            (focus, paths)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_documents_reproducible() {
        let vocab = vocabulary(100);
        let d1 = generate_documents(10, 20, &vocab, 0.1, 42);
        let d2 = generate_documents(10, 20, &vocab, 0.1, 42);
        assert_eq!(d1, d2);
        assert!(d1.iter().all(|doc| doc.len() == 20));
    }

    #[test]
    fn test_generate_documents_filtered() {
        let vocab = vocabulary(10);
        let none = generate_documents(5, 50, &vocab, 0.0, 7);
        assert!(none.iter().flatten().all(|t| !t.is_empty()));
        let all = generate_documents(5, 50, &vocab, 1.0, 7);
        assert!(all.iter().flatten().all(String::is_empty));
    }

    #[test]
    fn test_generate_feature_keys() {
        let keys = generate_feature_keys(1000, 50, 3, 42);
        assert_eq!(keys.len(), 1000);
        assert!(keys
            .iter()
            .all(|k| k.position != 0 && (-3..=3).contains(&k.position)));
    }

    #[test]
    fn test_generate_dependency_batch() {
        let vocab = vocabulary(20);
        let batch = generate_dependency_batch(8, 5, &vocab, 0.0, 42);
        assert_eq!(batch.len(), 8);
        for (focus, paths) in &batch {
            assert_eq!(paths.len(), 5);
            for path in paths {
                assert_eq!(path.length(), 1);
                assert_eq!(&path.first().word, focus);
            }
        }
    }
}
