use crate::store::Row;

const SYNTACTIC_TAG: char = 'S';
const CONTEXTUAL_TAG: char = 'C';

/// A feature key split into its tag and name.
///
/// The tag is the first character of the stored key. It is the only thing
/// that separates syntactic features (usage contexts) from contextual ones
/// (literal co-occurrence), so `key()` always rebuilds the stored form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    Syntactic(String),
    Contextual(String),
}

impl Feature {

    /// Returns `None` for keys that carry no known tag, e.g. item keys.
    pub fn parse(key: &str) -> Option<Feature> {
        let mut chars = key.chars();
        match chars.next() {
            Some(SYNTACTIC_TAG) => Some(Feature::Syntactic(chars.as_str().to_string())),
            Some(CONTEXTUAL_TAG) => Some(Feature::Contextual(chars.as_str().to_string())),
            _ => None
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Feature::Syntactic(name) | Feature::Contextual(name) => name
        }
    }

    pub fn key(&self) -> String {
        match self {
            Feature::Syntactic(name) => format!("{}{}", SYNTACTIC_TAG, name),
            Feature::Contextual(name) => format!("{}{}", CONTEXTUAL_TAG, name)
        }
    }
}


/// Restricts a fetched row to one partition of the feature space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureFilter {
    Syntactic,
    Contextual,
}

impl FeatureFilter {

    pub fn keeps(&self, key: &str) -> bool {
        match (self, Feature::parse(key)) {
            (FeatureFilter::Syntactic, Some(Feature::Syntactic(_))) => true,
            (FeatureFilter::Contextual, Some(Feature::Contextual(_))) => true,
            _ => false
        }
    }

    pub fn apply(&self, row: Row) -> Row {
        row.into_iter().filter(|(key, _)| self.keeps(key)).collect()
    }
}
