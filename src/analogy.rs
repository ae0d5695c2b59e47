use crate::aggregate::RankedList;
use crate::cooccur::CooccurrenceLookup;
use crate::error::Result;
use crate::expand::CategoryExpander;
use crate::merge::merge;
use crate::store::RowStore;

use log::debug;


/// Answers "? is to C as B is to ...": things like B that co-occur with C.
pub struct AnalogyEngine<S> {
    expander: CategoryExpander<S>,
    cooccurrence: CooccurrenceLookup<S>,
}

impl<S: RowStore + Clone> AnalogyEngine<S> {

    pub fn new(store: S) -> AnalogyEngine<S> {
        Self {
            expander: CategoryExpander::new(store.clone()),
            cooccurrence: CooccurrenceLookup::new(store),
        }
    }
}

impl<S: RowStore> AnalogyEngine<S> {

    pub fn expander(&self) -> &CategoryExpander<S> {
        &self.expander
    }

    pub fn cooccurrence(&self) -> &CooccurrenceLookup<S> {
        &self.cooccurrence
    }

    pub fn analogy(&self, b: &str, c: &str, squash: f64, semantic_n: usize) -> Result<RankedList> {

        debug!("looking for the {} of the {}", b, c);

        // a single seed has coverage 0 or 1, any positive rho ranks the same
        let things_like_b = self.expander.expand(&[b], 1.0, semantic_n)?;
        let things_cooccurring_with_c = self.cooccurrence.cooccurring(c)?;
        merge(&things_like_b, &things_cooccurring_with_c, squash)
    }
}


#[cfg(test)]
mod tests {

    use super::AnalogyEngine;
    use crate::store::Table;
    use crate::store::test_support::store;

    #[test]
    fn capital_of_country_test() {

        let store = store(&[
            // paris is used like rome and berlin
            (Table::ItemToFeature, "paris", &[("Scapital_of", 500), ("Sdobj_of:visit", 200)]),
            (Table::FeatureToItem, "Scapital_of", &[("paris", 500), ("rome", 400), ("berlin", 400)]),
            (Table::FeatureToItem, "Sdobj_of:visit", &[("paris", 200), ("rome", 200), ("museum", 300)]),
            // italy co-occurs with rome and pasta
            (Table::ItemToFeature, "italy", &[("Sin", 100)]),
            (Table::ItemToFeatureContextual, "italy", &[("Citaly", 300)]),
            (Table::FeatureToItem, "Citaly", &[("rome", 500), ("pasta", 600), ("italy", 100)]),
        ]);
        let engine = AnalogyEngine::new(&store);

        let answers = engine.analogy("paris", "italy", 100.0, 50).unwrap();
        assert_eq!(answers[0].0, "rome");

        // pasta only co-occurs with italy, the merge keeps expansion keys only
        assert!(answers.iter().all(|(k, _)| k != "pasta"));
        let like_paris = engine.expander().expand(&["paris"], 1.0, 50).unwrap();
        assert_eq!(answers.len(), like_paris.len());
    }

    #[test]
    fn unknown_terms_give_no_answers() {
        let store = store(&[(Table::ItemToFeature, "paris", &[("Scapital_of", 500)])]);
        let engine = AnalogyEngine::new(&store);
        assert!(engine.analogy("atlantis", "italy", 100.0, 50).unwrap().is_empty());
    }
}
