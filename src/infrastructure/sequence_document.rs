//! JSON sequence documents
//!
//! A document lists stages with their content, exit trigger, hooks and an
//! optional reveal block. Reveal pacing left out of the document is filled
//! from [`RevealDefaults`].

use crate::content::ContentCatalog;
use crate::domain::entities::{CueConfig, RevealConfig, Sequence, Stage, StageContent, StageHooks};
use crate::domain::value_objects::{ExitTrigger, ResourceId};
use crate::sequencer::debug::DebugCategory;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Pacing applied to reveal blocks that omit it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealDefaults {
    pub cadence_ms: u64,
    pub cue_floor_ms: u64,
    pub cue_factor: f64,
}

impl Default for RevealDefaults {
    fn default() -> Self {
        Self {
            cadence_ms: 30,
            cue_floor_ms: CueConfig::DEFAULT_FLOOR_MS,
            cue_factor: CueConfig::DEFAULT_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDocument {
    pub name: String,
    pub stages: Vec<StageDocument>,
    /// Numbered captions shown on request, with a fallback for unknown numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepsakes: Option<ContentCatalog<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDocument {
    pub content: StageContent,
    pub trigger: ExitTrigger,
    #[serde(default)]
    pub hooks: StageHooks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal: Option<RevealDocument>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealDocument {
    pub cadence_ms: Option<u64>,
    pub cue: Option<CueDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueDocument {
    pub resource: ResourceId,
    #[serde(default)]
    pub floor_ms: Option<u64>,
    #[serde(default)]
    pub factor: Option<f64>,
}

/// A validated sequence together with its keepsake catalog
#[derive(Debug, Clone)]
pub struct LoadedSequence {
    pub sequence: Sequence,
    pub keepsakes: Option<ContentCatalog<u32>>,
}

impl SequenceDocument {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let document = serde_json::from_str(json).context("invalid sequence document")?;
        Ok(document)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build and validate the sequence
    pub fn into_sequence(self, defaults: &RevealDefaults) -> anyhow::Result<LoadedSequence> {
        let stages = self
            .stages
            .into_iter()
            .map(|stage| stage.into_stage(defaults))
            .collect();
        let sequence = Sequence::new(self.name, stages)
            .context("sequence document failed validation")?;

        Ok(LoadedSequence {
            sequence,
            keepsakes: self.keepsakes,
        })
    }
}

impl StageDocument {
    fn into_stage(self, defaults: &RevealDefaults) -> Stage {
        let stage = Stage::new(self.content, self.trigger).with_hooks(self.hooks);
        match self.reveal {
            Some(reveal) => stage.with_reveal(reveal.into_config(defaults)),
            None => stage,
        }
    }
}

impl RevealDocument {
    fn into_config(self, defaults: &RevealDefaults) -> RevealConfig {
        let cadence = Duration::from_millis(self.cadence_ms.unwrap_or(defaults.cadence_ms));
        let config = RevealConfig::new(cadence);
        match self.cue {
            Some(cue) => config.with_cue(CueConfig {
                resource: cue.resource,
                floor_ms: cue.floor_ms.unwrap_or(defaults.cue_floor_ms),
                factor: cue.factor.unwrap_or(defaults.cue_factor),
            }),
            None => config,
        }
    }
}

/// Read and validate a sequence document from disk
pub async fn load_sequence<P: AsRef<Path>>(
    path: P,
    defaults: &RevealDefaults,
) -> anyhow::Result<LoadedSequence> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read sequence file {}", path.display()))?;
    let loaded = SequenceDocument::from_json(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?
        .into_sequence(defaults)?;

    log::debug!(
        target: DebugCategory::ENGINE,
        "[Load] '{}' with {} stages from {}",
        loaded.sequence.name(),
        loaded.sequence.stage_count(),
        path.display()
    );
    Ok(loaded)
}
