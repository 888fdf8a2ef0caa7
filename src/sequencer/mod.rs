//! Stage sequencer
//!
//! Drives a visitor through an ordered list of stages. Each stage declares
//! one exit trigger; advancing is only possible once that trigger has been
//! satisfied, and every transition runs the exit effects of the old stage and
//! the entry effects of the new one exactly once.
//!
//! All operations are synchronous and meant to be called from a single event
//! loop (gesture callbacks, timer callbacks, reveal ticks). Rejected calls
//! return a [`SequencerError`] and leave the sequencer untouched.

use crate::domain::entities::{Sequence, Stage};
use crate::domain::errors::SequencerError;
use crate::domain::repositories::{FlagStore, MediaPlayer};
use crate::domain::value_objects::{Direction, Epoch, ExitTrigger, PlaybackOptions, ResourceId, SideEffect};
use debug::DebugCategory;
use gate::StageVisit;
use reveal::TextReveal;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use timeline::{TimerToken, Timeline};

pub mod debug;
pub mod gate;
pub mod reveal;
pub mod timeline;

#[cfg(test)]
mod tests;

/// Notifications for the host, drained with [`Sequencer::take_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    /// A stage became current; the host re-renders it
    StageChanged { index: usize, direction: Direction },
    /// The last stage was left; the host navigates elsewhere
    Completed,
    /// The body text of a stage finished revealing
    RevealCompleted { index: usize },
    /// One-shot decorative effect requested by a stage
    Burst { effect: String, duration: Duration },
    /// The media player refused a track. The sequence keeps going; the host
    /// may offer a manual play button.
    PlaybackRejected { resource: ResourceId, reason: String },
}

/// Successful result of [`Sequencer::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved { from: usize, to: usize },
    /// Terminal signal: the last stage was left
    Completed,
}

/// Reveal state after a progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealProgress {
    pub revealed: usize,
    pub total: usize,
    /// True only for the report that finished the reveal
    pub completed_now: bool,
}

/// Timed and gated presentation controller
pub struct Sequencer<M: MediaPlayer, F: FlagStore> {
    sequence: Sequence,
    media: M,
    flags: F,
    started: bool,
    completed: bool,
    torn_down: bool,
    current: usize,
    direction: Direction,
    unlocked: BTreeSet<usize>,
    epoch: Epoch,
    visit: Option<StageVisit>,
    timeline: Timeline,
    reveal: Option<TextReveal>,
    interacted: bool,
    playing: BTreeMap<ResourceId, PlaybackOptions>,
    deferred: BTreeMap<ResourceId, PlaybackOptions>,
    events: Vec<SequencerEvent>,
}

impl<M: MediaPlayer, F: FlagStore> Sequencer<M, F> {
    pub fn new(sequence: Sequence, media: M, flags: F) -> Self {
        Self {
            sequence,
            media,
            flags,
            started: false,
            completed: false,
            torn_down: false,
            current: 0,
            direction: Direction::Forward,
            unlocked: BTreeSet::new(),
            epoch: Epoch::default(),
            visit: None,
            timeline: Timeline::new(),
            reveal: None,
            interacted: false,
            playing: BTreeMap::new(),
            deferred: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Enter the first stage
    pub fn start(&mut self) -> Result<(), SequencerError> {
        if self.torn_down {
            return Err(SequencerError::TornDown);
        }
        if self.started {
            return Err(SequencerError::AlreadyStarted);
        }
        log::debug!(
            target: DebugCategory::ENGINE,
            "[Start] sequence '{}' with {} stages",
            self.sequence.name(),
            self.sequence.stage_count()
        );
        self.started = true;
        self.enter_stage(0, Direction::Forward);
        Ok(())
    }

    /// Move to the next stage, or signal completion from the last one
    pub fn advance(&mut self) -> Result<Advance, SequencerError> {
        self.ensure_running()?;
        if self.completed {
            return Ok(Advance::Completed);
        }

        let from = self.current;
        if !self.is_exit_satisfied(from) {
            let trigger = self.current_stage().exit_trigger().kind();
            log::trace!(
                target: DebugCategory::GATES,
                "[Advance] stage {from} blocked by {trigger}"
            );
            return Err(SequencerError::ExitNotSatisfied {
                index: from,
                trigger,
            });
        }

        self.exit_stage(from);

        if from == self.sequence.last_index() {
            self.completed = true;
            log::debug!(
                target: DebugCategory::FLOW,
                "[Complete] sequence '{}' finished at stage {from}",
                self.sequence.name()
            );
            self.events.push(SequencerEvent::Completed);
            return Ok(Advance::Completed);
        }

        let to = from + 1;
        log::debug!(target: DebugCategory::FLOW, "[Advance] stage {from} -> {to}");
        self.enter_stage(to, Direction::Forward);
        Ok(Advance::Moved { from, to })
    }

    /// Move to the previous stage. Backward movement is never gated.
    pub fn retreat(&mut self) -> Result<usize, SequencerError> {
        self.ensure_running()?;
        if self.completed {
            return Err(SequencerError::Completed);
        }
        if self.current == 0 {
            return Err(SequencerError::AtFirstStage);
        }

        let from = self.current;
        let to = from - 1;
        self.exit_stage(from);
        log::debug!(target: DebugCategory::FLOW, "[Retreat] stage {from} -> {to}");
        self.enter_stage(to, Direction::Backward);
        Ok(to)
    }

    /// A click, tap or keypress happened. Safe at any time.
    ///
    /// The first gesture also retries playback the host refused earlier.
    /// Returns true when this gesture satisfied the current stage's gate.
    pub fn report_gesture_trigger(&mut self) -> bool {
        if !self.interacted {
            self.interacted = true;
            if !self.torn_down {
                self.retry_deferred_playback();
            }
        }

        let Some(visit) = self.visit.as_mut() else {
            return false;
        };
        let index = visit.index();
        let stage = &self.sequence.stages()[index];
        if *stage.exit_trigger() != ExitTrigger::UserGesture || self.unlocked.contains(&index) {
            return false;
        }

        visit.mark_gesture();
        log::trace!(target: DebugCategory::GATES, "[Gesture] stage {index} unlocked");
        self.unlocked.insert(index);
        true
    }

    /// A timer armed by this sequencer elapsed.
    ///
    /// Tokens from a visit that already ended are rejected with
    /// [`SequencerError::StaleTimerIgnored`] and change nothing.
    pub fn report_timer_elapsed(&mut self, token: TimerToken) -> Result<(), SequencerError> {
        let Some(visit) = self.visit.as_mut() else {
            log::trace!(target: DebugCategory::GATES, "[Timer] {} ignored, no active stage", token.epoch);
            return Err(SequencerError::StaleTimerIgnored);
        };
        if visit.epoch() != token.epoch || visit.index() != token.stage {
            log::trace!(
                target: DebugCategory::GATES,
                "[Timer] stale token for stage {} {} ignored (current stage {} {})",
                token.stage,
                token.epoch,
                visit.index(),
                visit.epoch()
            );
            return Err(SequencerError::StaleTimerIgnored);
        }

        self.timeline.cancel_epoch(token.epoch);
        let index = visit.index();
        if matches!(self.sequence.stages()[index].exit_trigger(), ExitTrigger::Timer { .. }) {
            visit.mark_timer_elapsed();
            self.unlocked.insert(index);
            log::trace!(target: DebugCategory::GATES, "[Timer] stage {index} unlocked");
        }
        Ok(())
    }

    /// Report how many units of the current stage's body are visible.
    ///
    /// Progress only moves forward; the report reaching the full length fires
    /// the reveal completion exactly once.
    pub fn report_text_reveal_progress(&mut self, count: usize) -> Result<RevealProgress, SequencerError> {
        self.ensure_running()?;
        let Some(visit) = self.visit.as_mut() else {
            return Err(SequencerError::Completed);
        };

        let index = visit.index();
        if *self.sequence.stages()[index].exit_trigger() != ExitTrigger::TextRevealComplete {
            return Ok(RevealProgress {
                revealed: 0,
                total: 0,
                completed_now: false,
            });
        }

        let completed_now = visit.record_progress(count);
        let progress = RevealProgress {
            revealed: visit.typed_progress(),
            total: visit.reveal_total(),
            completed_now,
        };
        if completed_now {
            self.finish_reveal(index);
        }
        Ok(progress)
    }

    /// Try `candidate` against the current stage's secret.
    ///
    /// Wrong values are rejected without any attempt limit.
    pub fn submit_credential(&mut self, candidate: &str) -> Result<(), SequencerError> {
        self.ensure_running()?;
        let Some(visit) = self.visit.as_mut() else {
            return Err(SequencerError::Completed);
        };

        let index = visit.index();
        let ExitTrigger::CredentialMatch { secret } = self.sequence.stages()[index].exit_trigger() else {
            return Err(SequencerError::NoCredentialGate { index });
        };

        if !secret.matches(candidate) {
            log::debug!(target: DebugCategory::GATES, "[Credential] rejected on stage {index}");
            return Err(SequencerError::CredentialRejected);
        }

        if self.unlocked.insert(index) {
            visit.mark_credential_matched();
            log::debug!(target: DebugCategory::GATES, "[Credential] accepted on stage {index}");
        }
        Ok(())
    }

    /// Move the sequencer clock forward: fires due timers and drives an
    /// active text reveal (including its audio cues).
    pub fn advance_clock(&mut self, elapsed: Duration) {
        if !self.started || self.torn_down {
            return;
        }

        for token in self.timeline.advance(elapsed) {
            // stale tokens were already logged
            let _ = self.report_timer_elapsed(token);
        }

        let Some(reveal) = self.reveal.as_mut() else {
            return;
        };
        let tick = reveal.advance(elapsed);
        if tick.cues > 0 {
            self.play_cue();
        }
        if tick.revealed > 0 {
            // reveal is only armed while its stage is current
            let _ = self.report_text_reveal_progress(tick.revealed);
        }
    }

    /// Pause `resource` if it is playing, otherwise (re)start it.
    /// Returns whether the track is playing afterwards.
    pub fn toggle_media(&mut self, resource: &ResourceId) -> Result<bool, SequencerError> {
        if self.torn_down {
            return Err(SequencerError::TornDown);
        }
        if self.media.is_playing(resource) {
            self.media.pause(resource);
            log::debug!(target: DebugCategory::MEDIA, "[Media] '{resource}' paused by visitor");
            return Ok(false);
        }

        let options = self
            .playing
            .get(resource)
            .or_else(|| self.deferred.get(resource))
            .copied()
            .unwrap_or_else(PlaybackOptions::looped);
        match self.media.play(resource, options) {
            Ok(()) => {
                self.deferred.remove(resource);
                self.playing.insert(resource.clone(), options);
                log::debug!(target: DebugCategory::MEDIA, "[Media] '{resource}' resumed by visitor");
                Ok(true)
            }
            Err(e) => {
                let reason = e.to_string();
                log::warn!(target: DebugCategory::MEDIA, "[Media] '{resource}' rejected: {reason}");
                self.events.push(SequencerEvent::PlaybackRejected {
                    resource: resource.clone(),
                    reason: reason.clone(),
                });
                Err(SequencerError::MediaPlaybackRejected {
                    resource: resource.clone(),
                    reason,
                })
            }
        }
    }

    /// Retry every track the player refused earlier. Returns how many started.
    pub fn retry_deferred_playback(&mut self) -> usize {
        let deferred = std::mem::take(&mut self.deferred);
        let mut started = 0;
        for (resource, options) in deferred {
            match self.media.play(&resource, options) {
                Ok(()) => {
                    log::debug!(target: DebugCategory::MEDIA, "[Media] deferred '{resource}' started");
                    self.playing.insert(resource, options);
                    started += 1;
                }
                Err(e) => {
                    log::warn!(target: DebugCategory::MEDIA, "[Media] deferred '{resource}' still rejected: {e}");
                    self.deferred.insert(resource, options);
                }
            }
        }
        started
    }

    /// Release everything this run holds: pending timers, the reveal driver
    /// and every track it started. Idempotent; also run on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let cancelled = self.timeline.cancel_all();
        self.reveal = None;
        self.visit = None;
        self.deferred.clear();

        let mut tracks: Vec<ResourceId> = std::mem::take(&mut self.playing).into_keys().collect();
        if let Some(cue) = self.cue_resource() {
            tracks.push(cue);
        }
        for resource in tracks {
            if self.media.is_playing(&resource) {
                self.media.pause(&resource);
            }
        }

        log::debug!(
            target: DebugCategory::ENGINE,
            "[Teardown] sequence '{}' released ({cancelled} timers cancelled)",
            self.sequence.name()
        );
    }

    /// Drain queued notifications
    pub fn take_events(&mut self) -> Vec<SequencerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether stage `index` may be left: unlocked by an earlier visit, or
    /// its gate satisfied by the current one
    pub fn is_exit_satisfied(&self, index: usize) -> bool {
        if self.unlocked.contains(&index) {
            return true;
        }
        match (&self.visit, self.sequence.stage(index)) {
            (Some(visit), Some(stage)) if visit.index() == index => visit.satisfies(stage.exit_trigger()),
            _ => false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_stage(&self) -> &Stage {
        &self.sequence.stages()[self.current]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn unlocked(&self) -> &BTreeSet<usize> {
        &self.unlocked
    }

    /// Units of the current body already revealed
    pub fn typed_progress(&self) -> usize {
        self.visit.as_ref().map(StageVisit::typed_progress).unwrap_or(0)
    }

    /// Reveal driver of the current stage, while it is still typing
    pub fn text_reveal(&self) -> Option<&TextReveal> {
        self.reveal.as_ref()
    }

    /// Timer armed for the current visit, for hosts scheduling it themselves
    pub fn pending_timer(&self) -> Option<TimerToken> {
        self.timeline.pending().next().copied()
    }

    /// Time until the next internal timer or reveal step is due
    pub fn next_wakeup_in(&self) -> Option<Duration> {
        let timer = self.timeline.next_due_in();
        let reveal = self.reveal.as_ref().and_then(TextReveal::next_unit_in);
        match (timer, reveal) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn flags(&self) -> &F {
        &self.flags
    }

    fn ensure_running(&self) -> Result<(), SequencerError> {
        if self.torn_down {
            return Err(SequencerError::TornDown);
        }
        if !self.started {
            return Err(SequencerError::NotStarted);
        }
        Ok(())
    }

    fn enter_stage(&mut self, index: usize, direction: Direction) {
        self.epoch = self.epoch.next();
        self.current = index;
        self.direction = direction;

        let stage = &self.sequence.stages()[index];
        let trigger = stage.exit_trigger().clone();
        let reveal_total = match trigger {
            ExitTrigger::TextRevealComplete => reveal::unit_count(&stage.content().body),
            _ => 0,
        };
        let mut visit = StageVisit::new(index, self.epoch, reveal_total);
        let already_unlocked = self.unlocked.contains(&index);
        if already_unlocked {
            visit.fill_progress();
        }
        self.visit = Some(visit);

        log::debug!(
            target: DebugCategory::FLOW,
            "[Enter] stage {index} '{}' {} trigger={} unlocked={already_unlocked}",
            stage.content().title,
            self.epoch,
            trigger.kind()
        );

        let on_enter = stage.hooks().on_enter.clone();
        self.run_effects(&on_enter);
        self.events.push(SequencerEvent::StageChanged { index, direction });

        if already_unlocked {
            return;
        }
        match trigger {
            ExitTrigger::Always => {
                self.unlocked.insert(index);
            }
            ExitTrigger::Timer { millis } => {
                self.timeline.schedule(TimerToken {
                    stage: index,
                    epoch: self.epoch,
                    duration: Duration::from_millis(millis),
                });
            }
            ExitTrigger::TextRevealComplete => {
                let stage = &self.sequence.stages()[index];
                if reveal_total == 0 {
                    self.finish_reveal(index);
                } else if let Some(config) = stage.reveal() {
                    self.reveal = Some(TextReveal::new(&stage.content().body, config));
                }
            }
            ExitTrigger::UserGesture | ExitTrigger::CredentialMatch { .. } => {}
        }
    }

    fn exit_stage(&mut self, index: usize) {
        if let Some(visit) = self.visit.take() {
            let cancelled = self.timeline.cancel_epoch(visit.epoch());
            if cancelled > 0 {
                log::trace!(
                    target: DebugCategory::GATES,
                    "[Exit] stage {index} cancelled {cancelled} pending timers"
                );
            }
        }
        if self.reveal.take().is_some() {
            self.stop_cue();
        }

        let on_exit = self.sequence.stages()[index].hooks().on_exit.clone();
        self.run_effects(&on_exit);
    }

    fn finish_reveal(&mut self, index: usize) {
        if !self.unlocked.insert(index) {
            return;
        }
        if self.reveal.take().is_some() {
            self.stop_cue();
        }
        log::debug!(target: DebugCategory::GATES, "[Reveal] stage {index} fully revealed");
        self.events.push(SequencerEvent::RevealCompleted { index });

        let cascade = self.sequence.stages()[index].hooks().on_reveal_complete.clone();
        self.run_effects(&cascade);
    }

    fn run_effects(&mut self, effects: &[SideEffect]) {
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: &SideEffect) {
        match effect {
            SideEffect::PlayMedia { resource, options } => match self.media.play(resource, *options) {
                Ok(()) => {
                    log::debug!(target: DebugCategory::MEDIA, "[Media] '{resource}' playing");
                    self.deferred.remove(resource);
                    self.playing.insert(resource.clone(), *options);
                }
                Err(e) => {
                    log::warn!(target: DebugCategory::MEDIA, "[Media] '{resource}' rejected: {e}");
                    self.deferred.insert(resource.clone(), *options);
                    self.events.push(SequencerEvent::PlaybackRejected {
                        resource: resource.clone(),
                        reason: e.to_string(),
                    });
                }
            },
            SideEffect::StopMedia { resource } => {
                self.deferred.remove(resource);
                self.playing.remove(resource);
                if self.media.is_playing(resource) {
                    self.media.pause(resource);
                }
                log::debug!(target: DebugCategory::MEDIA, "[Media] '{resource}' stopped");
            }
            SideEffect::SetFlag { key, value } => {
                log::debug!(target: DebugCategory::STORAGE, "[Flag] {key}={value}");
                self.flags.set(key.clone(), value.clone());
            }
            SideEffect::Burst { effect, duration_ms } => {
                self.events.push(SequencerEvent::Burst {
                    effect: effect.clone(),
                    duration: Duration::from_millis(*duration_ms),
                });
            }
        }
    }

    fn cue_resource(&self) -> Option<ResourceId> {
        self.sequence
            .stage(self.current)
            .and_then(Stage::reveal)
            .and_then(|reveal| reveal.cue.as_ref())
            .map(|cue| cue.resource.clone())
    }

    fn play_cue(&mut self) {
        let Some(cue) = self.cue_resource() else {
            return;
        };
        // restart from the top, like a fresh key strike
        if self.media.is_playing(&cue) {
            self.media.pause(&cue);
        }
        if let Err(e) = self.media.play(&cue, PlaybackOptions::once()) {
            log::trace!(target: DebugCategory::MEDIA, "[Cue] '{cue}' skipped: {e}");
        }
    }

    fn stop_cue(&mut self) {
        if let Some(cue) = self.cue_resource()
            && self.media.is_playing(&cue)
        {
            self.media.pause(&cue);
        }
    }
}

impl<M: MediaPlayer, F: FlagStore> Drop for Sequencer<M, F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
