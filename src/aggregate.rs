use crate::error::{CategoryError, Result};
use crate::feature::FeatureFilter;
use crate::store::{RowStore, Table};

use std::collections::HashMap;


/// Keys with scores, highest first.
pub type RankedList = Vec<(String, f64)>;


/// Sorts by descending score; equal scores fall back to ascending key so rankings are reproducible.
pub fn rank(scores: HashMap<String, f64>) -> RankedList {
    let mut ranked: RankedList = scores.into_iter().collect();
    ranked.sort_by(|(key_a, a), (key_b, b)| b.total_cmp(a).then_with(|| key_a.cmp(key_b)));
    ranked
}


/// Combines the rows of a weighted seed set into one ranked list of contexts.
///
/// This is a sparse vector-matrix product: every context `c` reached from a
/// seed `s` of weight `w_s` collects `w_s * row_s(c)`. With a coverage
/// exponent `rho > 0` the sum is then multiplied by `f^rho`, `f` being the
/// fraction of seeds whose row holds `c`, which pushes down contexts that
/// only some of the seeds share.
pub struct WeightedAggregator<S> {
    store: S,
}

impl<S: RowStore> WeightedAggregator<S> {

    pub fn new(store: S) -> WeightedAggregator<S> {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn multiply(&self,
        table: Table,
        wtd_seeds: &[(String, f64)],
        rho: f64,
        filter: Option<FeatureFilter>) -> Result<RankedList> {

        if wtd_seeds.is_empty() {
            return Err(CategoryError::EmptySeeds);
        }
        if !(rho >= 0.0) {
            return Err(CategoryError::InvalidArgument(format!("rho must be non-negative, got {}", rho)));
        }

        let num_seeds = wtd_seeds.len() as f64;
        let mut hits: HashMap<String, usize> = HashMap::new();
        let mut weighted_sum: HashMap<String, f64> = HashMap::new();

        for (seed, seed_wt) in wtd_seeds {

            if !(*seed_wt >= 0.0) || !seed_wt.is_finite() {
                return Err(CategoryError::InvalidArgument(format!("weight of seed '{}' must be finite and non-negative, got {}", seed, seed_wt)));
            }

            let mut row = self.store.get_row(table, seed)?;
            if let Some(filter) = filter {
                row = filter.apply(row);
            }

            for (context, wt) in row {
                *hits.entry(context.clone()).or_insert(0) += 1;
                *weighted_sum.entry(context).or_insert(0.0) += seed_wt * wt;
            }
        }

        // penalize contexts not seen with all seeds
        if rho > 0.0 {
            for (context, score) in weighted_sum.iter_mut() {
                let coverage = hits[context] as f64 / num_seeds;
                *score *= coverage.powf(rho);
            }
        }

        log::debug!("{} seeds over the {} table reached {} contexts", wtd_seeds.len(), table, weighted_sum.len());
        Ok(rank(weighted_sum))
    }
}


#[cfg(test)]
mod tests {

    use super::{rank, WeightedAggregator};
    use crate::error::CategoryError;
    use crate::feature::FeatureFilter;
    use crate::store::Table;
    use crate::store::test_support::store;
    use std::collections::HashMap;

    fn seeds(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect()
    }

    fn score_of(ranked: &[(String, f64)], key: &str) -> f64 {
        ranked.iter().find(|(k, _)| k == key).map(|(_, s)| *s).unwrap()
    }

    #[test]
    fn linear_combination_at_rho_zero() {

        // rows are stored x100: dog = {a: 1.0, b: 2.0}, cat = {b: 0.5, c: 4.0}
        let store = store(&[
            (Table::ItemToFeature, "dog", &[("Sa", 100), ("Sb", 200)]),
            (Table::ItemToFeature, "cat", &[("Sb", 50), ("Sc", 400)]),
        ]);
        let aggregator = WeightedAggregator::new(&store);

        let ranked = aggregator.multiply(Table::ItemToFeature, &seeds(&[("dog", 2.0), ("cat", 3.0)]), 0.0, None).unwrap();

        // hand computed: a = 2*1, b = 2*2 + 3*0.5, c = 3*4
        assert_eq!(ranked, vec![
            ("Sc".to_string(), 12.0),
            ("Sb".to_string(), 5.5),
            ("Sa".to_string(), 2.0),
        ]);
    }

    #[test]
    fn coverage_penalty_grows_with_rho() {

        let store = store(&[
            (Table::ItemToFeature, "dog", &[("Sshared", 100), ("Sonly_dog", 300)]),
            (Table::ItemToFeature, "cat", &[("Sshared", 100)]),
        ]);
        let aggregator = WeightedAggregator::new(&store);
        let wtd = seeds(&[("dog", 1.0), ("cat", 1.0)]);

        let mut previous_ratio = f64::INFINITY;
        for rho in [0.0, 0.5, 1.0, 2.0] {
            let ranked = aggregator.multiply(Table::ItemToFeature, &wtd, rho, None).unwrap();
            let shared = score_of(&ranked, "Sshared");
            let only_dog = score_of(&ranked, "Sonly_dog");

            // shared by every seed, never penalized
            assert_eq!(shared, 2.0);
            assert_eq!(only_dog, 3.0 * 0.5f64.powf(rho));
            assert!(only_dog > 0.0);

            let ratio = only_dog / shared;
            assert!(ratio < previous_ratio);
            previous_ratio = ratio;
        }

        // at rho = 2 the partial context falls below the shared one
        let ranked = aggregator.multiply(Table::ItemToFeature, &wtd, 2.0, None).unwrap();
        assert_eq!(ranked[0].0, "Sshared");
    }

    #[test]
    fn empty_seed_set_is_rejected() {
        let store = store(&[]);
        let aggregator = WeightedAggregator::new(&store);
        match aggregator.multiply(Table::ItemToFeature, &[], 0.0, None) {
            Err(CategoryError::EmptySeeds) => (),
            other => panic!("expected EmptySeeds, got {:?}", other)
        }
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let store = store(&[]);
        let aggregator = WeightedAggregator::new(&store);
        let wtd = seeds(&[("dog", 1.0)]);
        assert!(matches!(aggregator.multiply(Table::ItemToFeature, &wtd, -1.0, None), Err(CategoryError::InvalidArgument(_))));
        assert!(matches!(aggregator.multiply(Table::ItemToFeature, &wtd, f64::NAN, None), Err(CategoryError::InvalidArgument(_))));
        let negative = seeds(&[("dog", -1.0)]);
        assert!(matches!(aggregator.multiply(Table::ItemToFeature, &negative, 0.0, None), Err(CategoryError::InvalidArgument(_))));
        let infinite = seeds(&[("dog", f64::INFINITY)]);
        assert!(matches!(aggregator.multiply(Table::FeatureToItem, &infinite, 0.0, None), Err(CategoryError::InvalidArgument(_))));
    }

    #[test]
    fn filter_and_zero_weights() {

        let store = store(&[
            (Table::ItemToFeature, "dog", &[("S_bark", 0), ("Cpark", 500)]),
        ]);
        let aggregator = WeightedAggregator::new(&store);
        let wtd = seeds(&[("dog", 1.0), ("unicorn", 1.0)]);

        // a zero weight context is still reported once a seed row touched it
        let ranked = aggregator.multiply(Table::ItemToFeature, &wtd, 1.0, Some(FeatureFilter::Syntactic)).unwrap();
        assert_eq!(ranked, vec![("S_bark".to_string(), 0.0)]);

        let ranked = aggregator.multiply(Table::ItemToFeature, &wtd, 0.0, Some(FeatureFilter::Contextual)).unwrap();
        assert_eq!(ranked, vec![("Cpark".to_string(), 5.0)]);

        // unknown seeds only: nothing, not an error
        let ranked = aggregator.multiply(Table::ItemToFeature, &seeds(&[("unicorn", 1.0)]), 1.0, None).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn ties_break_by_key() {
        let mut scores = HashMap::new();
        scores.insert("zebra".to_string(), 1.0);
        scores.insert("apple".to_string(), 1.0);
        scores.insert("mango".to_string(), 2.0);
        let ranked: Vec<String> = rank(scores).into_iter().map(|(k, _)| k).collect();
        assert_eq!(ranked, vec!["mango", "apple", "zebra"]);
    }
}
