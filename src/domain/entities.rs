//! Domain entities - Stages and the sequences they form

use crate::domain::errors::DomainError;
use crate::domain::value_objects::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a stage shows. Opaque to the sequencer apart from the body length,
/// which bounds text reveal progress.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub body: String,
    pub media: Option<ResourceId>,
}

impl StageContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_media(mut self, media: impl Into<ResourceId>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// Audio cue played while text is being revealed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueConfig {
    pub resource: ResourceId,
    /// Lower bound of the interval between two cues
    #[serde(default = "CueConfig::default_floor_ms")]
    pub floor_ms: u64,
    /// Cue interval as a fraction of the reveal cadence
    #[serde(default = "CueConfig::default_factor")]
    pub factor: f64,
}

impl CueConfig {
    pub const DEFAULT_FLOOR_MS: u64 = 50;
    pub const DEFAULT_FACTOR: f64 = 0.8;

    pub fn new(resource: impl Into<ResourceId>) -> Self {
        Self {
            resource: resource.into(),
            floor_ms: Self::DEFAULT_FLOOR_MS,
            factor: Self::DEFAULT_FACTOR,
        }
    }

    fn default_floor_ms() -> u64 {
        Self::DEFAULT_FLOOR_MS
    }

    fn default_factor() -> f64 {
        Self::DEFAULT_FACTOR
    }

    /// Milliseconds between two cues at `cadence_ms`, before any clamping
    pub fn interval_ms(&self, cadence_ms: u64) -> u64 {
        let scaled = (cadence_ms as f64 * self.factor).round() as u64;
        scaled.max(self.floor_ms)
    }
}

/// Pacing of a typewriter-style reveal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Time between two revealed units
    pub cadence_ms: u64,
    #[serde(default)]
    pub cue: Option<CueConfig>,
}

impl RevealConfig {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence_ms: cadence.as_millis() as u64,
            cue: None,
        }
    }

    pub fn with_cue(mut self, cue: CueConfig) -> Self {
        self.cue = Some(cue);
        self
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}

/// Side effects attached to a stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageHooks {
    pub on_enter: Vec<SideEffect>,
    pub on_exit: Vec<SideEffect>,
    /// Cascade run once the body text is fully revealed
    pub on_reveal_complete: Vec<SideEffect>,
}

/// One step of a sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    index: usize,
    content: StageContent,
    exit_trigger: ExitTrigger,
    hooks: StageHooks,
    reveal: Option<RevealConfig>,
}

impl Stage {
    /// Create a stage. The index is assigned when the stage joins a sequence.
    pub fn new(content: StageContent, exit_trigger: ExitTrigger) -> Self {
        Self {
            index: 0,
            content,
            exit_trigger,
            hooks: StageHooks::default(),
            reveal: None,
        }
    }

    pub fn on_enter(mut self, effect: SideEffect) -> Self {
        self.hooks.on_enter.push(effect);
        self
    }

    pub fn on_exit(mut self, effect: SideEffect) -> Self {
        self.hooks.on_exit.push(effect);
        self
    }

    pub fn on_reveal_complete(mut self, effect: SideEffect) -> Self {
        self.hooks.on_reveal_complete.push(effect);
        self
    }

    pub fn with_hooks(mut self, hooks: StageHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_reveal(mut self, reveal: RevealConfig) -> Self {
        self.reveal = Some(reveal);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn content(&self) -> &StageContent {
        &self.content
    }

    pub fn exit_trigger(&self) -> &ExitTrigger {
        &self.exit_trigger
    }

    pub fn hooks(&self) -> &StageHooks {
        &self.hooks
    }

    pub fn reveal(&self) -> Option<&RevealConfig> {
        self.reveal.as_ref()
    }
}

/// An ordered, validated, non-empty list of stages
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    name: String,
    stages: Vec<Stage>,
}

impl Sequence {
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Result<Self, DomainError> {
        if stages.is_empty() {
            return Err(DomainError::EmptySequence);
        }

        let stages = stages
            .into_iter()
            .enumerate()
            .map(|(index, mut stage)| {
                stage.index = index;
                stage
            })
            .collect::<Vec<_>>();

        for stage in &stages {
            Self::validate_stage(stage)?;
        }

        Ok(Self {
            name: name.into(),
            stages,
        })
    }

    fn validate_stage(stage: &Stage) -> Result<(), DomainError> {
        if let ExitTrigger::CredentialMatch { secret } = &stage.exit_trigger
            && secret.is_empty()
        {
            return Err(DomainError::EmptySecret { index: stage.index });
        }

        if let Some(reveal) = &stage.reveal {
            if stage.exit_trigger != ExitTrigger::TextRevealComplete {
                return Err(DomainError::RevealWithoutRevealTrigger {
                    index: stage.index,
                    trigger: stage.exit_trigger.kind(),
                });
            }
            if reveal.cadence_ms == 0 {
                return Err(DomainError::invalid_reveal(stage.index, "cadence must be positive"));
            }
            if let Some(cue) = &reveal.cue
                && !(cue.factor.is_finite() && cue.factor > 0.0)
            {
                return Err(DomainError::invalid_reveal(
                    stage.index,
                    format!("cue factor {} must be a positive number", cue.factor),
                ));
            }
            if let Some(cue) = &reveal.cue
                && cue.interval_ms(reveal.cadence_ms) == 0
            {
                return Err(DomainError::invalid_reveal(
                    stage.index,
                    format!(
                        "cue interval rounds to zero (cadence {}ms, factor {}, floor {}ms)",
                        reveal.cadence_ms, cue.factor, cue.floor_ms
                    ),
                ));
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.stages.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(trigger: ExitTrigger) -> Stage {
        Stage::new(StageContent::new("t", "body"), trigger)
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert_eq!(Sequence::new("empty", vec![]), Err(DomainError::EmptySequence));
    }

    #[test]
    fn indices_follow_list_order() {
        let sequence = Sequence::new(
            "journey",
            vec![
                plain(ExitTrigger::Always),
                plain(ExitTrigger::UserGesture),
                plain(ExitTrigger::Always),
            ],
        )
        .unwrap();

        let indices: Vec<usize> = sequence.stages().iter().map(Stage::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(sequence.last_index(), 2);
    }

    #[test]
    fn empty_secret_is_rejected() {
        let result = Sequence::new(
            "secrets",
            vec![plain(ExitTrigger::Always), plain(ExitTrigger::credential(""))],
        );
        assert_eq!(result, Err(DomainError::EmptySecret { index: 1 }));
    }

    #[test]
    fn reveal_config_needs_reveal_trigger() {
        let stage = plain(ExitTrigger::UserGesture).with_reveal(RevealConfig::new(Duration::from_millis(30)));
        let result = Sequence::new("letter", vec![stage]);
        assert_eq!(
            result,
            Err(DomainError::RevealWithoutRevealTrigger {
                index: 0,
                trigger: "user_gesture"
            })
        );
    }

    #[test]
    fn zero_cue_interval_is_rejected() {
        let cue = CueConfig {
            floor_ms: 0,
            factor: 0.4,
            ..CueConfig::new("typewriter")
        };
        let stage = plain(ExitTrigger::TextRevealComplete)
            .with_reveal(RevealConfig::new(Duration::from_millis(1)).with_cue(cue.clone()));
        assert!(matches!(
            Sequence::new("letter", vec![stage]),
            Err(DomainError::InvalidReveal { index: 0, .. })
        ));

        let stage = plain(ExitTrigger::TextRevealComplete)
            .with_reveal(RevealConfig::new(Duration::from_millis(3)).with_cue(cue));
        assert!(Sequence::new("letter", vec![stage]).is_ok());
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let stage = plain(ExitTrigger::TextRevealComplete).with_reveal(RevealConfig::new(Duration::ZERO));
        assert!(matches!(
            Sequence::new("letter", vec![stage]),
            Err(DomainError::InvalidReveal { index: 0, .. })
        ));
    }
}
