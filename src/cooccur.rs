use crate::aggregate::{RankedList, WeightedAggregator};
use crate::error::Result;
use crate::feature::FeatureFilter;
use crate::store::{RowStore, Table};

use log::info;


/// Finds the items that literally co-occur with a seed in the corpus.
pub struct CooccurrenceLookup<S> {
    aggregator: WeightedAggregator<S>,
}

impl<S: RowStore> CooccurrenceLookup<S> {

    pub fn new(store: S) -> CooccurrenceLookup<S> {
        Self { aggregator: WeightedAggregator::new(store) }
    }

    pub fn cooccurring(&self, seed: &str) -> Result<RankedList> {

        let wtd_seed = [(seed.to_string(), 1.0)];

        // the item-to-feature table keeps only part of the contextual rows
        let mut sorted_contexts = self.aggregator.multiply(Table::ItemToFeatureContextual, &wtd_seed, 0.0, Some(FeatureFilter::Contextual))?;
        if sorted_contexts.is_empty() {
            sorted_contexts = self.aggregator.multiply(Table::ItemToFeature, &wtd_seed, 0.0, Some(FeatureFilter::Contextual))?;
        }

        if sorted_contexts.is_empty() {
            info!("did not find any contexts for {}", seed);
            return Ok(RankedList::new());
        }

        self.aggregator.multiply(Table::FeatureToItem, &sorted_contexts, 0.0, None)
    }
}
