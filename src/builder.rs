//! Folder-based dataset builder.
//!
//! [`AudioFolder`] turns a validated [`FolderConfig`] into one
//! [`GenerationPlan`] per split. Classification, metadata loading and label
//! inference all run eagerly here, so structural errors surface before any
//! example is produced.

use std::{panic, thread};

use tracing::debug;

use crate::config::FolderConfig;
use crate::error::AudioFolderError;
use crate::files::classify::classify_split;
use crate::files::{AccessMode, Split};
use crate::generate::{DropFlags, GenerationPlan, PreparedSplit, SplitData};
use crate::labels::infer_labels;
use crate::metadata::load_metadata;

/// Builder for folder-of-media datasets.
#[derive(Clone, Debug)]
pub struct AudioFolder {
    config: FolderConfig,
}

impl AudioFolder {
    pub fn new(config: FolderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FolderConfig {
        &self.config
    }

    fn drop_flags(&self) -> DropFlags {
        DropFlags {
            drop_metadata: self.config.drop_metadata(),
            drop_labels: self.config.drop_labels(),
        }
    }

    /// Resolves one split into a generation plan.
    pub fn plan_split(&self, split: &Split, mode: AccessMode) -> Result<GenerationPlan, AudioFolderError> {
        let media_kind = self.config.media_kind();
        let classified = classify_split(split, media_kind, mode)?;
        let metadata = load_metadata(split.name(), &classified.metadata, mode)?;
        let labels = infer_labels(&classified.media);
        debug!(
            split = split.name(),
            labels = labels.as_ref().map_or(0, |l| l.vocabulary().len()),
            "inferred labels"
        );

        GenerationPlan::new(
            split.name(),
            media_kind,
            mode,
            SplitData {
                media: classified.media,
                metadata,
                labels,
            },
            self.drop_flags(),
        )
    }

    /// Plans every split, in configuration order.
    pub fn split_generators(&self, mode: AccessMode) -> Result<Vec<GenerationPlan>, AudioFolderError> {
        self.config
            .data_files()
            .iter()
            .map(|split| self.plan_split(split, mode))
            .collect()
    }

    /// Plans and fully generates every split.
    ///
    /// Splits share no state, so each one runs on its own scoped thread.
    /// Results come back in configuration order; the first failing split's
    /// error is returned.
    pub fn prepare(&self, mode: AccessMode) -> Result<Vec<PreparedSplit>, AudioFolderError> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .config
                .data_files()
                .iter()
                .map(|split| scope.spawn(move || self.plan_split(split, mode)?.materialize()))
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}
