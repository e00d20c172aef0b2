use std::collections::HashMap;
use lazy_static::lazy_static;
use log::{debug, info};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tokenizers::normalizers::{Lowercase, Sequence, StripAccents, NFC, NFD, NFKC};
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer,
};

use super::error::ClassifierError;
use super::utils::normalize_vector;

lazy_static! {
    static ref KEEP_ACCENTS: Sequence = Sequence::new(vec![NFKC.into(), Lowercase.into()]);
    static ref STRIP_ACCENTS: Sequence =
        Sequence::new(vec![NFD.into(), StripAccents.into(), NFC.into(), Lowercase.into()]);
}

const WORD_PREFIX: &str = "w:";
const CHAR_PREFIX: &str = "c:";

/// Settings for turning text into a bag-of-words feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizerConfig {
    /// Longest word n-gram to extract (0 disables word features)
    pub word_ngrams: usize,
    /// Character n-gram length, computed per word with boundary markers (0 disables)
    pub char_ngrams: usize,
    /// Upper bound on the dictionary size
    pub max_features: usize,
    /// Terms seen fewer times than this across the training set are dropped
    pub min_count: usize,
    /// Keep diacritics instead of folding them to their base letters
    pub keep_diacritics: bool,
    /// Keep tokens made only of punctuation
    pub keep_punctuation: bool,
}

impl Default for FeaturizerConfig {
    fn default() -> Self {
        Self {
            word_ngrams: 1,
            char_ngrams: 3,
            max_features: 2000,
            min_count: 1,
            keep_diacritics: true,
            keep_punctuation: false,
        }
    }
}

impl FeaturizerConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.word_ngrams == 0 && self.char_ngrams == 0 {
            return Err(ClassifierError::Build(
                "At least one of word_ngrams or char_ngrams must be non-zero".into(),
            ));
        }
        if self.max_features == 0 {
            return Err(ClassifierError::Build("max_features must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Dictionary-based text featurizer.
///
/// Text goes through these steps:
/// 1. Unicode normalization and lowercasing (optionally folding diacritics)
/// 2. Word splitting with the `Whitespace` pre-tokenizer
/// 3. Extraction of word n-grams and per-word character n-grams
/// 4. Counting the terms found in the fitted dictionary, then L2 normalization
///
/// The dictionary is ordered by descending training frequency with ties broken
/// lexicographically, so fitting the same documents always yields the same
/// feature layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FeaturizerParts", into = "FeaturizerParts")]
pub struct TextFeaturizer {
    config: FeaturizerConfig,
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct FeaturizerParts {
    config: FeaturizerConfig,
    terms: Vec<String>,
}

impl From<FeaturizerParts> for TextFeaturizer {
    fn from(parts: FeaturizerParts) -> Self {
        Self::with_terms(parts.config, parts.terms)
    }
}

impl From<TextFeaturizer> for FeaturizerParts {
    fn from(featurizer: TextFeaturizer) -> Self {
        Self {
            config: featurizer.config,
            terms: featurizer.terms,
        }
    }
}

impl TextFeaturizer {
    fn with_terms(config: FeaturizerConfig, terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Self { config, terms, index }
    }

    /// Builds the term dictionary from training documents.
    ///
    /// # Errors
    /// - `Build` if the configuration is invalid
    /// - `Featurization` if a document cannot be normalized
    /// - `Training` if no term survives the `min_count` filter
    pub fn fit<S: AsRef<str>>(config: &FeaturizerConfig, documents: &[S]) -> Result<Self, ClassifierError> {
        config.validate()?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            for term in extract_terms(config, doc.as_ref())? {
                *counts.entry(term).or_insert(0) += 1;
            }
        }
        let distinct = counts.len();

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, count)| *count >= config.min_count)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(config.max_features);

        if ranked.is_empty() {
            return Err(ClassifierError::Training(
                "Featurizer dictionary is empty; the training texts produced no usable terms".into(),
            ));
        }

        info!(
            "Featurizer fitted on {} documents: kept {} of {} distinct terms",
            documents.len(),
            ranked.len(),
            distinct
        );
        debug!("Most frequent terms: {:?}", ranked.iter().take(10).collect::<Vec<_>>());

        let terms = ranked.into_iter().map(|(term, _)| term).collect();
        Ok(Self::with_terms(config.clone(), terms))
    }

    /// Number of features each vector has.
    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    pub fn config(&self) -> &FeaturizerConfig {
        &self.config
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Converts one text into a normalized feature vector. Text with no known
    /// terms maps to the zero vector.
    pub fn transform(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let mut counts = Array1::<f32>::zeros(self.dimension());
        for term in extract_terms(&self.config, text)? {
            if let Some(&idx) = self.index.get(&term) {
                counts[idx] += 1.0;
            }
        }
        Ok(normalize_vector(&counts))
    }

    /// Converts a batch of texts into a `[texts, features]` matrix.
    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Array2<f32>, ClassifierError> {
        let mut matrix = Array2::<f32>::zeros((texts.len(), self.dimension()));
        for (i, text) in texts.iter().enumerate() {
            let features = self.transform(text.as_ref())?;
            matrix.row_mut(i).assign(&features);
        }
        Ok(matrix)
    }
}

/// Normalizes `text` and splits it into words.
pub(crate) fn split_words(config: &FeaturizerConfig, text: &str) -> Result<Vec<String>, ClassifierError> {
    let mut normalized = NormalizedString::from(text);
    if config.keep_diacritics {
        KEEP_ACCENTS.normalize(&mut normalized)?;
    } else {
        STRIP_ACCENTS.normalize(&mut normalized)?;
    }

    let mut pretokenized = PreTokenizedString::from(normalized);
    Whitespace::default().pre_tokenize(&mut pretokenized)?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Normalized, OffsetType::Char)
        .into_iter()
        .map(|(word, _, _)| word)
        .filter(|word| config.keep_punctuation || word.chars().any(char::is_alphanumeric))
        .map(str::to_owned)
        .collect())
}

fn extract_terms(config: &FeaturizerConfig, text: &str) -> Result<Vec<String>, ClassifierError> {
    let words = split_words(config, text)?;
    let mut terms = Vec::new();

    for n in 1..=config.word_ngrams {
        for window in words.windows(n) {
            terms.push(format!("{}{}", WORD_PREFIX, window.join(" ")));
        }
    }

    if config.char_ngrams > 0 {
        for word in &words {
            let padded: Vec<char> = std::iter::once('<')
                .chain(word.chars())
                .chain(std::iter::once('>'))
                .collect();
            if padded.len() <= config.char_ngrams {
                terms.push(format!("{}{}", CHAR_PREFIX, padded.iter().collect::<String>()));
                continue;
            }
            for window in padded.windows(config.char_ngrams) {
                terms.push(format!("{}{}", CHAR_PREFIX, window.iter().collect::<String>()));
            }
        }
    }

    Ok(terms)
}
