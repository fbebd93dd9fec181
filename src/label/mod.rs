//! Label identifiers, vocabularies, and filename-safe label names.

pub mod conflict;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::util::{GarmatchError, GarmatchResult};

pub use conflict::ConflictTable;

/// Numeric label identifier emitted by the detector.
pub type LabelId = u32;

/// Fashionpedia category names, indexed by label id.
const FASHIONPEDIA_NAMES: [&str; 46] = [
    "shirt, blouse",
    "top, t-shirt, sweatshirt",
    "sweater",
    "cardigan",
    "jacket",
    "vest",
    "pants",
    "shorts",
    "skirt",
    "coat",
    "dress",
    "jumpsuit",
    "cape",
    "glasses",
    "hat",
    "headband, head covering, hair accessory",
    "tie",
    "glove",
    "watch",
    "belt",
    "leg warmer",
    "tights, stockings",
    "sock",
    "shoe",
    "bag, wallet",
    "scarf",
    "umbrella",
    "hood",
    "collar",
    "lapel",
    "epaulette",
    "sleeve",
    "pocket",
    "neckline",
    "buckle",
    "zipper",
    "applique",
    "bead",
    "bow",
    "flower",
    "fringe",
    "ribbon",
    "rivet",
    "ruffle",
    "sequin",
    "tassel",
];

/// Maps label ids to canonical names.
///
/// Ids without an entry resolve to `id_{n}` so unknown detector classes stay
/// traceable instead of failing the run.
#[derive(Debug, Clone)]
pub struct LabelVocabulary {
    names: HashMap<LabelId, String>,
}

impl LabelVocabulary {
    /// Builds the built-in Fashionpedia vocabulary (46 apparel categories).
    pub fn fashionpedia() -> Self {
        let names = FASHIONPEDIA_NAMES
            .iter()
            .enumerate()
            .map(|(id, name)| (id as LabelId, (*name).to_string()))
            .collect();
        Self { names }
    }

    /// Builds a vocabulary from explicit (id, name) pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (LabelId, String)>,
    {
        Self {
            names: pairs.into_iter().collect(),
        }
    }

    /// Loads a vocabulary from a JSON object of the form `{"<id>": "<name>"}`.
    pub fn load<P: AsRef<Path>>(path: P) -> GarmatchResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|err| GarmatchError::Io {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let raw: HashMap<String, String> =
            serde_json::from_str(&text).map_err(|err| GarmatchError::MalformedJson {
                path: display.clone(),
                reason: err.to_string(),
            })?;
        let mut names = HashMap::with_capacity(raw.len());
        for (key, name) in raw {
            let id: LabelId = key.parse().map_err(|_| GarmatchError::MalformedJson {
                path: display.clone(),
                reason: format!("non-numeric label id '{key}'"),
            })?;
            names.insert(id, name);
        }
        Ok(Self { names })
    }

    /// Resolves a label id to its canonical name, or `id_{n}` when unknown.
    pub fn name(&self, id: LabelId) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => format!("id_{id}"),
        }
    }

    /// Number of named labels.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no labels are named (every id falls back to `id_{n}`).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self::fashionpedia()
    }
}

/// Replaces path separators in a label name so it is safe inside a filename.
pub fn sanitize_label(label: &str) -> String {
    label.replace(['/', '\\'], "-")
}
