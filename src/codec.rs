//! Result codec: raw classification scores to domain labels.
//!
//! The classification service answers with a confidence score per category
//! index. The codec picks the winning category and names it from a label
//! table. Selection rules:
//!
//! - no score mapping (absent or empty) yields [`Label::Undefined`]
//! - the highest score wins; on an exact tie the lowest category index wins
//! - NaN scores never win; a mapping of only NaN scores is `Undefined`
//! - an index beyond the label table is named `category_<index>`

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Label;

/// Raw response body from the classification service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Confidence per category index. `None` when the service had no answer.
    #[serde(default)]
    pub scores: Option<BTreeMap<u32, f64>>,
}

impl RawResult {
    pub fn from_scores(scores: impl IntoIterator<Item = (u32, f64)>) -> Self {
        Self {
            scores: Some(scores.into_iter().collect()),
        }
    }

    pub fn empty() -> Self {
        Self { scores: None }
    }
}

/// TOML form of the label table: `labels = ["cat", "dog"]`.
#[derive(Debug, Deserialize)]
struct LabelFile {
    labels: Vec<String>,
}

/// Translates raw scores to labels using an ordered label table.
#[derive(Debug, Clone, Default)]
pub struct ResultCodec {
    labels: Vec<String>,
}

impl ResultCodec {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: LabelFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("bad label table: {e}")))?;
        Ok(Self::new(file.labels))
    }

    /// Load a label table from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read label table {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Name for a category index.
    pub fn label_name(&self, index: u32) -> String {
        self.labels
            .get(index as usize)
            .cloned()
            .unwrap_or_else(|| format!("category_{index}"))
    }

    pub fn decode(&self, raw: &RawResult) -> Label {
        let Some(scores) = raw.scores.as_ref() else {
            return Label::Undefined;
        };

        // BTreeMap iterates ascending by index; strict `>` keeps the first
        // (lowest) index among equal maxima.
        let mut best: Option<(u32, f64)> = None;
        for (&index, &score) in scores {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((index, score)),
            }
        }

        match best {
            Some((index, confidence)) => Label::Category {
                index,
                name: self.label_name(index),
                confidence,
            },
            None => Label::Undefined,
        }
    }
}
