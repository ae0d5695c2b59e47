use crate::aggregate::{RankedList, WeightedAggregator};
use crate::error::{CategoryError, Result};
use crate::feature::FeatureFilter;
use crate::store::{RowStore, Table};

use log::{debug, info};


/// Expands seed items into a ranked list of items used the same way.
///
/// The first hop collects the syntactic features characteristic of the
/// whole seed set, the second hop collects the items that share those
/// features, each feature weighted by how characteristic it was.
pub struct CategoryExpander<S> {
    aggregator: WeightedAggregator<S>,
}

impl<S: RowStore> CategoryExpander<S> {

    pub fn new(store: S) -> CategoryExpander<S> {
        Self { aggregator: WeightedAggregator::new(store) }
    }

    /// `rho` penalizes features missing from some seeds, `n` caps how many
    /// features carry over into the second hop.
    pub fn expand<T: AsRef<str>>(&self, seeds: &[T], rho: f64, n: usize) -> Result<RankedList> {

        if n == 0 {
            return Err(CategoryError::InvalidArgument("number of features to use must be positive".to_string()));
        }

        let wtd_seeds: Vec<(String, f64)> = seeds.iter().map(|seed| (seed.as_ref().to_string(), 1.0)).collect();
        let sorted_contexts = self.aggregator.multiply(Table::ItemToFeature, &wtd_seeds, rho, Some(FeatureFilter::Syntactic))?;

        if sorted_contexts.is_empty() {
            info!("did not find any contexts for {:?}", wtd_seeds.iter().map(|(s, _)| s.as_str()).collect::<Vec<&str>>());
            return Ok(RankedList::new());
        }

        let top = &sorted_contexts[..n.min(sorted_contexts.len())];
        debug!("expanding {} seeds through {} of {} features", wtd_seeds.len(), top.len(), sorted_contexts.len());
        self.items_for_contexts(top)
    }

    /// Items reached from already weighted contexts, without coverage penalty.
    pub fn items_for_contexts(&self, wtd_contexts: &[(String, f64)]) -> Result<RankedList> {
        self.aggregator.multiply(Table::FeatureToItem, wtd_contexts, 0.0, None)
    }
}


#[cfg(test)]
mod tests {

    use super::CategoryExpander;
    use crate::error::CategoryError;
    use crate::store::Table;
    use crate::store::test_support::store;

    #[test]
    fn two_hop_pivot_test() {

        let store = store(&[
            (Table::ItemToFeature, "dog", &[("S_bark", 100), ("Cleash", 100)]),
            (Table::ItemToFeature, "cat", &[("S_bark", 100)]),
            (Table::FeatureToItem, "S_bark", &[("dog", 100), ("cat", 100)]),
            (Table::FeatureToItem, "Cleash", &[("rope", 900)]),
        ]);
        let expander = CategoryExpander::new(&store);

        let items = expander.expand(&["dog"], 1.0, 10).unwrap();
        let keys: Vec<&str> = items.iter().map(|(k, _)| k.as_str()).collect();

        // cat comes back through the shared syntactic feature, the contextual one is never followed
        assert!(keys.contains(&"cat"));
        assert!(!keys.contains(&"rope"));
        assert_eq!(items, vec![("cat".to_string(), 1.0), ("dog".to_string(), 1.0)]);
    }

    #[test]
    fn top_n_features_test() {

        let store = store(&[
            (Table::ItemToFeature, "paris", &[("Sstrong", 500), ("Sweak", 100)]),
            (Table::FeatureToItem, "Sstrong", &[("rome", 100)]),
            (Table::FeatureToItem, "Sweak", &[("tuesday", 300)]),
        ]);
        let expander = CategoryExpander::new(&store);

        // only the strongest feature survives with n = 1
        let items = expander.expand(&["paris"], 3.0, 1).unwrap();
        assert_eq!(items, vec![("rome".to_string(), 5.0)]);

        // with both, feature scores weight the second hop: rome = 5 * 1, tuesday = 1 * 3
        let items = expander.expand(&["paris"], 3.0, 2).unwrap();
        assert_eq!(items, vec![("rome".to_string(), 5.0), ("tuesday".to_string(), 3.0)]);
    }

    #[test]
    fn unknown_seeds_expand_to_nothing() {
        let store = store(&[(Table::ItemToFeature, "dog", &[("S_bark", 100)])]);
        let expander = CategoryExpander::new(&store);
        assert!(expander.expand(&["unicorn", "griffin"], 3.0, 100).unwrap().is_empty());
    }

    #[test]
    fn bad_arguments_test() {
        let store = store(&[]);
        let expander = CategoryExpander::new(&store);
        let no_seeds: [&str; 0] = [];
        assert!(matches!(expander.expand(&no_seeds, 1.0, 10), Err(CategoryError::EmptySeeds)));
        assert!(matches!(expander.expand(&["dog"], 1.0, 0), Err(CategoryError::InvalidArgument(_))));
        let infinite = [("S_bark".to_string(), f64::INFINITY)];
        assert!(matches!(expander.items_for_contexts(&infinite), Err(CategoryError::InvalidArgument(_))));
    }
}
