use crate::aggregate::{rank, RankedList};
use crate::error::{CategoryError, Result};

use std::collections::HashMap;


/// Saturating transform `c * v / (c - 1 + v)`.
///
/// Passes through the origin, grows monotonically and levels off towards
/// `c`, so raw sums of very different scales become comparable.
pub fn squash(v: f64, squash_const: f64) -> f64 {
    squash_const * v / (squash_const - 1.0 + v)
}

/// Merges two ranked lists by summing their squashed scores.
///
/// Only keys of `a_scores` can appear in the result: a key of `b_scores`
/// adds to a total that `a_scores` opened and is dropped otherwise.
pub fn merge(a_scores: &[(String, f64)], b_scores: &[(String, f64)], squash_const: f64) -> Result<RankedList> {

    if !(squash_const > 1.0) || !squash_const.is_finite() {
        return Err(CategoryError::InvalidArgument(format!("squash constant must be a finite number above 1, got {}", squash_const)));
    }

    let mut total_score: HashMap<String, f64> = HashMap::new();
    for (k, v) in a_scores {
        *total_score.entry(k.to_owned()).or_insert(0.0) += squash(*v, squash_const);
    }
    for (k, v) in b_scores {
        if let Some(total) = total_score.get_mut(k) {
            *total += squash(*v, squash_const);
        }
    }

    Ok(rank(total_score))
}


#[cfg(test)]
mod tests {

    use super::{merge, squash};
    use proptest::prelude::*;

    fn list(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn squash_test() {
        assert_eq!(squash(0.0, 100.0), 0.0);
        // the midpoint of the curve sits near c/2
        let mid = squash(100.0, 100.0);
        assert!((mid - 50.0).abs() < 0.5, "{}", mid);
        // bounded by c
        assert!(squash(1.0e9, 100.0) < 100.0);
        // one stays one
        assert_eq!(squash(1.0, 100.0), 1.0);
    }

    proptest! {
        #[test]
        fn squash_is_increasing(v in 0.0f64..10000.0, delta in 0.01f64..100.0, c in 2.0f64..1000.0) {
            prop_assert!(squash(v + delta, c) > squash(v, c));
        }
    }

    #[test]
    fn disjoint_lists_keep_first_list() {

        let a = list(&[("rome", 3.0), ("madrid", 2.0)]);
        let b = list(&[("pizza", 5.0)]);
        let merged = merge(&a, &b, 100.0).unwrap();

        // nothing to add, the first list comes back squashed
        assert_eq!(merged, vec![
            ("rome".to_string(), squash(3.0, 100.0)),
            ("madrid".to_string(), squash(2.0, 100.0)),
        ]);
        assert!(merged.iter().all(|(k, _)| k != "pizza"));

        // and an empty first list leaves nothing to boost
        assert!(merge(&[], &b, 100.0).unwrap().is_empty());
    }

    #[test]
    fn overlapping_lists_test() {

        let a = list(&[("rome", 1.0), ("madrid", 4.0), ("berlin", 2.0)]);
        let b = list(&[("rome", 9.0), ("madrid", 1.0), ("berlin", 2.0)]);
        let merged = merge(&a, &b, 100.0).unwrap();

        let mut expected: Vec<(String, f64)> = a.iter().zip(b.iter())
            .map(|((k, va), (_, vb))| (k.clone(), squash(*va, 100.0) + squash(*vb, 100.0)))
            .collect();
        expected.sort_by(|x, y| y.1.total_cmp(&x.1));
        assert_eq!(merged, expected);
        assert_eq!(merged[0].0, "rome");
    }

    #[test]
    fn second_list_only_keys_are_dropped() {

        let a = list(&[("rome", 2.0), ("lyon", 1.0)]);
        let b = list(&[("rome", 1.0), ("italy", 50.0)]);
        let merged = merge(&a, &b, 100.0).unwrap();

        let keys: Vec<&str> = merged.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["rome", "lyon"]);
        assert_eq!(merged[0].1, squash(2.0, 100.0) + squash(1.0, 100.0));
        assert_eq!(merged[1].1, squash(1.0, 100.0));
    }

    #[test]
    fn squash_constant_is_validated() {
        let a = list(&[("rome", 2.0)]);
        assert!(merge(&a, &a, 1.0).is_err());
        assert!(merge(&a, &a, f64::INFINITY).is_err());
    }
}
