use serde::{Deserialize, Serialize};
use log::debug;

use super::error::ClassifierError;

/// Ordered mapping between class indices and the original label strings.
///
/// The vocabulary is produced once while training and stored inside the
/// model artifact; every score vector the model emits is aligned to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelVocabulary {
    names: Vec<String>,
}

impl LabelVocabulary {
    /// Builds a vocabulary from an explicit, ordered list of names.
    ///
    /// # Errors
    /// - `Build` if the list is empty, contains an empty name, or repeats a name
    pub fn from_names(names: Vec<String>) -> Result<Self, ClassifierError> {
        if names.is_empty() {
            return Err(ClassifierError::Build("Class name list cannot be empty".into()));
        }
        if names.iter().any(|n| n.is_empty()) {
            return Err(ClassifierError::Build("Class names cannot be empty".into()));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ClassifierError::Build(format!("Duplicate class name '{}'", name)));
            }
        }
        Ok(Self { names })
    }

    /// Dictionarizes training labels.
    ///
    /// Without `preset`, labels are indexed in order of first occurrence. With
    /// `preset`, that order is used and any label outside it is rejected.
    pub fn fit<'a, I>(labels: I, preset: Option<&[String]>) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match preset {
            Some(names) => {
                let vocabulary = Self::from_names(names.to_vec())?;
                for label in labels {
                    vocabulary.encode(label)?;
                }
                Ok(vocabulary)
            }
            None => {
                let mut names: Vec<String> = Vec::new();
                for label in labels {
                    if !names.iter().any(|n| n == label) {
                        debug!("New label '{}' assigned index {}", label, names.len());
                        names.push(label.to_string());
                    }
                }
                if names.is_empty() {
                    return Err(ClassifierError::DataSchema("No labels found in training data".into()));
                }
                Ok(Self { names })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.names.iter().position(|n| n == label)
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Maps a label to its index, failing on labels outside the vocabulary.
    pub fn encode(&self, label: &str) -> Result<usize, ClassifierError> {
        self.index_of(label).ok_or_else(|| {
            ClassifierError::DataSchema(format!(
                "Label '{}' is not one of the known classes {:?}",
                label, self.names
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrence_order() {
        let vocab = LabelVocabulary::fit(["fr", "de", "fr", "en", "de"], None).unwrap();
        assert_eq!(vocab.names(), ["fr", "de", "en"]);
        assert_eq!(vocab.index_of("en"), Some(2));
        assert_eq!(vocab.name_of(1), Some("de"));
        assert_eq!(vocab.name_of(3), None);
    }

    #[test]
    fn test_preset_order_wins() {
        let preset = vec!["de".to_string(), "en".to_string(), "fr".to_string()];
        let vocab = LabelVocabulary::fit(["fr", "en"], Some(&preset)).unwrap();
        assert_eq!(vocab.names(), preset.as_slice());
    }

    #[test]
    fn test_preset_rejects_unknown_label() {
        let preset = vec!["de".to_string(), "en".to_string()];
        let result = LabelVocabulary::fit(["de", "it"], Some(&preset));
        assert!(matches!(result, Err(ClassifierError::DataSchema(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = LabelVocabulary::from_names(vec!["de".into(), "de".into()]);
        assert!(matches!(result, Err(ClassifierError::Build(_))));
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let vocab = LabelVocabulary::fit(["a", "b"], None).unwrap();
        assert_eq!(serde_json::to_string(&vocab).unwrap(), r#"["a","b"]"#);
    }
}
