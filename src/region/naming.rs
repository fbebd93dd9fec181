//! Collision-free names for persisted region files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::label::sanitize_label;

/// How region files are named within one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionNaming {
    /// `{image_stem}_{label}_{n}.png`, `n` counting occurrences of that
    /// (stem, label) pair across the run.
    #[default]
    PerImageLabel,
    /// `{idx}_{label}_0.png`, `idx` a run-global counter that advances only
    /// after a confirmed write, keeping indices dense. Used for catalog
    /// ingestion, where region files from many images share one directory.
    GlobalIndex,
}

/// Issues region filenames for one extraction run.
///
/// Both modes guarantee that no two confirmed writes share a name. The
/// per-label counters advance as soon as a name is issued, so a region that
/// later fails to write leaves a gap; the global index instead waits for
/// [`RegionNamer::confirm_written`] and reissues the same index after a
/// failure.
#[derive(Debug, Clone, Default)]
pub struct RegionNamer {
    mode: RegionNaming,
    counts: HashMap<(String, String), u32>,
    global_idx: u32,
}

impl RegionNamer {
    /// Creates a namer for one run.
    pub fn new(mode: RegionNaming) -> Self {
        Self {
            mode,
            counts: HashMap::new(),
            global_idx: 0,
        }
    }

    /// Issues the next filename for a region of `label` cut from the image
    /// with stem `stem`. The label is sanitized before use.
    pub fn next_name(&mut self, stem: &str, label: &str) -> String {
        let label = sanitize_label(label);
        match self.mode {
            RegionNaming::PerImageLabel => {
                let count = self
                    .counts
                    .entry((stem.to_string(), label.clone()))
                    .or_insert(0);
                let name = format!("{stem}_{label}_{count}.png");
                *count += 1;
                name
            }
            RegionNaming::GlobalIndex => format!("{}_{label}_0.png", self.global_idx),
        }
    }

    /// Marks the most recently issued name as written.
    pub fn confirm_written(&mut self) {
        if self.mode == RegionNaming::GlobalIndex {
            self.global_idx += 1;
        }
    }
}
