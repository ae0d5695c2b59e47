use crate::error::Result;
use crate::feature::FeatureFilter;
use crate::store::{Row, RowStore, Table};


/// Raw row access for diagnostics.
pub struct RowInspector<S> {
    store: S,
}

impl<S: RowStore> RowInspector<S> {

    pub fn new(store: S) -> RowInspector<S> {
        Self { store }
    }

    pub fn item_features(&self, item: &str, filter: Option<FeatureFilter>) -> Result<Row> {
        let row = self.store.get_row(Table::ItemToFeature, item)?;
        Ok(match filter {
            Some(filter) => filter.apply(row),
            None => row
        })
    }

    pub fn feature_items(&self, feature: &str) -> Result<Row> {
        self.store.get_row(Table::FeatureToItem, feature)
    }

    pub fn item_contextual_features(&self, item: &str) -> Result<Row> {
        self.store.get_row(Table::ItemToFeatureContextual, item)
    }
}


#[cfg(test)]
mod tests {

    use super::RowInspector;
    use crate::feature::FeatureFilter;
    use crate::store::Table;
    use crate::store::test_support::store;

    #[test]
    fn inspector_test() {

        let store = store(&[
            (Table::ItemToFeature, "dog", &[("S_bark", 100), ("Cpark", 200)]),
            (Table::FeatureToItem, "S_bark", &[("dog", 100)]),
        ]);
        let inspector = RowInspector::new(&store);

        assert_eq!(inspector.item_features("dog", None).unwrap().len(), 2);
        let syntactic = inspector.item_features("dog", Some(FeatureFilter::Syntactic)).unwrap();
        assert_eq!(syntactic.keys().collect::<Vec<_>>(), vec!["S_bark"]);
        assert_eq!(inspector.feature_items("S_bark").unwrap()["dog"], 1.0);

        assert!(inspector.item_features("unicorn", Some(FeatureFilter::Contextual)).unwrap().is_empty());
        assert!(inspector.feature_items("Snothing").unwrap().is_empty());
        assert!(inspector.item_contextual_features("dog").unwrap().is_empty());
    }
}
