//! Tests for the sequencer

use super::*;
use crate::domain::entities::{CueConfig, RevealConfig, StageContent};
use crate::domain::repositories::FlagMap;
use crate::domain::value_objects::FlagKey;
use crate::infrastructure::media::{MediaCall, RecordingMediaPlayer};

fn stage(title: &str, trigger: ExitTrigger) -> Stage {
    Stage::new(StageContent::new(title, format!("{title} body")), trigger)
}

fn sequencer(stages: Vec<Stage>) -> Sequencer<RecordingMediaPlayer, FlagMap> {
    let sequence = Sequence::new("test", stages).unwrap();
    Sequencer::new(sequence, RecordingMediaPlayer::new(), FlagMap::new())
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[test]
fn start_enters_first_stage() {
    let mut seq = sequencer(vec![
        stage("intro", ExitTrigger::UserGesture).on_enter(SideEffect::play_looped("music")),
        stage("end", ExitTrigger::Always),
    ]);

    seq.start().unwrap();

    assert_eq!(seq.current_index(), 0);
    assert!(seq.media().is_playing(&ResourceId::from("music")));
    assert_eq!(
        seq.take_events(),
        vec![SequencerEvent::StageChanged {
            index: 0,
            direction: Direction::Forward
        }]
    );
}

#[test]
fn start_twice_is_rejected() {
    let mut seq = sequencer(vec![stage("only", ExitTrigger::Always)]);
    seq.start().unwrap();
    seq.take_events();

    assert_eq!(seq.start(), Err(SequencerError::AlreadyStarted));
    assert!(seq.take_events().is_empty());
}

#[test]
fn navigation_before_start_is_rejected() {
    let mut seq = sequencer(vec![stage("a", ExitTrigger::Always), stage("b", ExitTrigger::Always)]);

    assert_eq!(seq.advance(), Err(SequencerError::NotStarted));
    assert_eq!(seq.retreat(), Err(SequencerError::NotStarted));
    assert_eq!(seq.submit_credential("x"), Err(SequencerError::NotStarted));
    assert!(!seq.report_gesture_trigger());
    assert!(seq.has_interacted());
}

#[test]
fn sequence_of_n_stages_completes_after_n_minus_one_moves() {
    for n in 1..=5 {
        let stages = (0..n).map(|i| stage(&format!("s{i}"), ExitTrigger::UserGesture)).collect();
        let mut seq = sequencer(stages);
        seq.start().unwrap();

        let mut moves = 0;
        loop {
            assert!(seq.report_gesture_trigger());
            match seq.advance().unwrap() {
                Advance::Moved { from, to } => {
                    assert_eq!(to, from + 1);
                    moves += 1;
                }
                Advance::Completed => break,
            }
        }

        assert_eq!(moves, n - 1);
        assert!(seq.is_completed());
        let completions = seq
            .take_events()
            .into_iter()
            .filter(|e| *e == SequencerEvent::Completed)
            .count();
        assert_eq!(completions, 1);
    }
}

#[test]
fn blocked_advance_has_no_side_effects() {
    let mut seq = sequencer(vec![
        stage("a", ExitTrigger::UserGesture).on_exit(SideEffect::stop("music")),
        stage("b", ExitTrigger::Always).on_enter(SideEffect::play_looped("other")),
    ]);
    seq.start().unwrap();
    seq.take_events();
    let calls_before = seq.media().calls().to_vec();

    assert_eq!(
        seq.advance(),
        Err(SequencerError::ExitNotSatisfied {
            index: 0,
            trigger: "user_gesture"
        })
    );
    assert_eq!(seq.current_index(), 0);
    assert_eq!(seq.media().calls(), calls_before.as_slice());
    assert!(seq.take_events().is_empty());
}

#[test]
fn retreat_at_first_stage_fails_without_change() {
    let mut seq = sequencer(vec![stage("a", ExitTrigger::Always), stage("b", ExitTrigger::Always)]);
    seq.start().unwrap();
    seq.take_events();

    assert_eq!(seq.retreat(), Err(SequencerError::AtFirstStage));
    assert_eq!(seq.current_index(), 0);
    assert_eq!(seq.direction(), Direction::Forward);
    assert!(seq.take_events().is_empty());
}

#[test]
fn retreat_is_ungated_and_reruns_entry_effects() {
    let mut seq = sequencer(vec![
        stage("a", ExitTrigger::Always).on_enter(SideEffect::play_looped("music")),
        stage("b", ExitTrigger::credential("1234")),
    ]);
    seq.start().unwrap();
    seq.advance().unwrap();
    seq.take_events();

    assert_eq!(seq.retreat(), Ok(0));
    assert_eq!(seq.direction(), Direction::Backward);
    assert_eq!(
        seq.take_events(),
        vec![SequencerEvent::StageChanged {
            index: 0,
            direction: Direction::Backward
        }]
    );
    // already playing, so the player ignored the second start
    assert_eq!(seq.media().play_count("music"), 1);
}

#[test]
fn revisited_stage_stays_unlocked() {
    let mut seq = sequencer(vec![
        stage("a", ExitTrigger::UserGesture),
        stage("b", ExitTrigger::UserGesture),
    ]);
    seq.start().unwrap();
    seq.report_gesture_trigger();
    seq.advance().unwrap();
    seq.retreat().unwrap();

    assert!(seq.is_exit_satisfied(0));
    assert_eq!(seq.advance(), Ok(Advance::Moved { from: 0, to: 1 }));
    assert_eq!(seq.unlocked().iter().copied().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn gesture_only_satisfies_gesture_gates() {
    let mut seq = sequencer(vec![
        stage("timed", ExitTrigger::timer(ms(5))),
        stage("end", ExitTrigger::Always),
    ]);
    seq.start().unwrap();

    assert!(!seq.report_gesture_trigger());
    assert!(matches!(seq.advance(), Err(SequencerError::ExitNotSatisfied { .. })));
}

#[test]
fn timer_unlocks_only_once_due() {
    let mut seq = sequencer(vec![
        stage("timed", ExitTrigger::timer(ms(2000))),
        stage("end", ExitTrigger::Always),
    ]);
    seq.start().unwrap();

    seq.advance_clock(ms(1999));
    assert!(!seq.is_exit_satisfied(0));
    assert_eq!(seq.next_wakeup_in(), Some(ms(1)));

    seq.advance_clock(ms(1));
    assert!(seq.is_exit_satisfied(0));
    assert_eq!(seq.advance(), Ok(Advance::Moved { from: 0, to: 1 }));
}

#[test]
fn timer_token_is_stale_after_its_stage_is_left() {
    let mut seq = sequencer(vec![
        stage("timed", ExitTrigger::timer(ms(5))),
        stage("gesture", ExitTrigger::UserGesture),
    ]);
    seq.start().unwrap();
    let token = seq.pending_timer().unwrap();

    assert_eq!(seq.report_timer_elapsed(token), Ok(()));
    seq.advance().unwrap();

    assert_eq!(seq.report_timer_elapsed(token), Err(SequencerError::StaleTimerIgnored));
    assert_eq!(seq.current_index(), 1);
    assert!(!seq.is_exit_satisfied(1));
}

#[test]
fn timer_from_previous_visit_does_not_unlock_new_visit() {
    let mut seq = sequencer(vec![
        stage("landing", ExitTrigger::Always),
        stage("timed", ExitTrigger::timer(ms(5))),
    ]);
    seq.start().unwrap();
    seq.advance().unwrap();
    let old_token = seq.pending_timer().unwrap();

    seq.retreat().unwrap();
    assert!(seq.pending_timer().is_none());
    seq.advance().unwrap();
    let new_token = seq.pending_timer().unwrap();
    assert_ne!(old_token.epoch, new_token.epoch);

    assert_eq!(seq.report_timer_elapsed(old_token), Err(SequencerError::StaleTimerIgnored));
    assert!(!seq.is_exit_satisfied(1));

    seq.advance_clock(ms(5));
    assert!(seq.is_exit_satisfied(1));
}

#[test]
fn text_reveal_completes_exactly_once() {
    let body = "Happy birthday";
    let total = body.chars().count();
    let mut seq = sequencer(vec![
        Stage::new(StageContent::new("letter", body), ExitTrigger::TextRevealComplete)
            .on_reveal_complete(SideEffect::burst("signature", ms(100))),
        stage("end", ExitTrigger::Always),
    ]);
    seq.start().unwrap();
    seq.take_events();

    for count in 0..total {
        let progress = seq.report_text_reveal_progress(count).unwrap();
        assert!(!progress.completed_now);
        assert!(matches!(seq.advance(), Err(SequencerError::ExitNotSatisfied { .. })));
    }

    let progress = seq.report_text_reveal_progress(total).unwrap();
    assert!(progress.completed_now);
    assert_eq!(progress.revealed, total);

    // replay and overshoot change nothing
    assert!(!seq.report_text_reveal_progress(total).unwrap().completed_now);
    assert!(!seq.report_text_reveal_progress(total + 10).unwrap().completed_now);
    assert!(!seq.report_text_reveal_progress(3).unwrap().completed_now);
    assert_eq!(seq.typed_progress(), total);

    assert_eq!(
        seq.take_events(),
        vec![
            SequencerEvent::RevealCompleted { index: 0 },
            SequencerEvent::Burst {
                effect: "signature".to_string(),
                duration: ms(100)
            }
        ]
    );
    assert!(seq.advance().is_ok());
}

#[test]
fn clock_drives_reveal_and_cues() {
    let reveal = RevealConfig::new(ms(100)).with_cue(CueConfig::new("typewriter"));
    let mut seq = sequencer(vec![
        Stage::new(StageContent::new("letter", "abc"), ExitTrigger::TextRevealComplete).with_reveal(reveal),
    ]);
    seq.start().unwrap();

    seq.advance_clock(ms(100));
    assert_eq!(seq.typed_progress(), 1);
    assert!(seq.media().is_playing(&ResourceId::from("typewriter")));
    assert_eq!(seq.text_reveal().map(TextReveal::visible_text), Some("a".to_string()));

    seq.advance_clock(ms(200));
    assert_eq!(seq.typed_progress(), 3);
    assert!(seq.text_reveal().is_none());
    assert!(!seq.media().is_playing(&ResourceId::from("typewriter")));
    assert!(seq.is_exit_satisfied(0));
    assert!(seq.take_events().contains(&SequencerEvent::RevealCompleted { index: 0 }));
}

#[test]
fn empty_body_is_revealed_on_entry() {
    let mut seq = sequencer(vec![Stage::new(
        StageContent::new("blank", ""),
        ExitTrigger::TextRevealComplete,
    )]);
    seq.start().unwrap();

    assert!(seq.is_exit_satisfied(0));
    assert!(seq.take_events().contains(&SequencerEvent::RevealCompleted { index: 0 }));
}

#[test]
fn credential_rejections_are_unlimited() {
    let mut seq = sequencer(vec![
        stage("gate", ExitTrigger::credential("31072003")),
        stage("letter", ExitTrigger::Always),
    ]);
    seq.start().unwrap();

    for _ in 0..20 {
        assert_eq!(seq.submit_credential("0000"), Err(SequencerError::CredentialRejected));
    }
    assert!(!seq.is_exit_satisfied(0));

    assert_eq!(seq.submit_credential("31072003"), Ok(()));
    assert!(seq.is_exit_satisfied(0));
    assert_eq!(seq.submit_credential("31072003"), Ok(()));
    assert_eq!(seq.advance(), Ok(Advance::Moved { from: 0, to: 1 }));
}

#[test]
fn credential_on_ungated_stage_is_rejected() {
    let mut seq = sequencer(vec![stage("a", ExitTrigger::UserGesture)]);
    seq.start().unwrap();

    assert_eq!(seq.submit_credential("1234"), Err(SequencerError::NoCredentialGate { index: 0 }));
    assert!(!seq.is_exit_satisfied(0));
}

#[test]
fn rejected_playback_is_retried_on_first_gesture() {
    let sequence = Sequence::new(
        "finale",
        vec![stage("finale", ExitTrigger::UserGesture).on_enter(SideEffect::play_looped("music"))],
    )
    .unwrap();
    let mut seq = Sequencer::new(sequence, RecordingMediaPlayer::with_autoplay_blocked(), FlagMap::new());

    seq.start().unwrap();
    let events = seq.take_events();
    assert!(events.contains(&SequencerEvent::PlaybackRejected {
        resource: ResourceId::from("music"),
        reason: "playback not allowed before user interaction".to_string()
    }));
    assert_eq!(seq.current_index(), 0);

    seq.media_mut().allow_playback();
    assert!(seq.report_gesture_trigger());
    assert!(seq.media().is_playing(&ResourceId::from("music")));
}

#[test]
fn stop_cancels_deferred_playback() {
    let sequence = Sequence::new(
        "pages",
        vec![
            stage("a", ExitTrigger::Always)
                .on_enter(SideEffect::play_looped("music"))
                .on_exit(SideEffect::stop("music")),
            stage("b", ExitTrigger::Always),
        ],
    )
    .unwrap();
    let mut seq = Sequencer::new(sequence, RecordingMediaPlayer::with_autoplay_blocked(), FlagMap::new());
    seq.start().unwrap();
    seq.advance().unwrap();

    seq.media_mut().allow_playback();
    seq.report_gesture_trigger();
    assert!(!seq.media().is_playing(&ResourceId::from("music")));
}

#[test]
fn toggle_media_pauses_and_resumes() {
    let music = ResourceId::from("music");
    let mut seq = sequencer(vec![stage("finale", ExitTrigger::UserGesture).on_enter(SideEffect::play_looped("music"))]);
    seq.start().unwrap();

    assert_eq!(seq.toggle_media(&music), Ok(false));
    assert!(!seq.media().is_playing(&music));
    assert_eq!(seq.toggle_media(&music), Ok(true));
    assert_eq!(
        seq.media().calls().last(),
        Some(&MediaCall::Play(music.clone(), PlaybackOptions::looped()))
    );
}

#[test]
fn completion_runs_last_exit_effects() {
    let mut seq = sequencer(vec![
        stage("note", ExitTrigger::UserGesture).on_exit(SideEffect::set_flag(FlagKey::HAS_SEEN_INTRO, "true")),
    ]);
    seq.start().unwrap();
    seq.report_gesture_trigger();

    assert_eq!(seq.advance(), Ok(Advance::Completed));
    assert_eq!(seq.flags().get(&FlagKey::has_seen_intro()), Some(&"true".to_string()));

    // further advances repeat the signal without re-running effects
    assert_eq!(seq.advance(), Ok(Advance::Completed));
    assert_eq!(seq.retreat(), Err(SequencerError::Completed));
    assert_eq!(
        seq.take_events()
            .iter()
            .filter(|e| **e == SequencerEvent::Completed)
            .count(),
        1
    );
}

#[test]
fn teardown_releases_media_and_timers() {
    let mut seq = sequencer(vec![
        stage("timed", ExitTrigger::timer(ms(5))).on_enter(SideEffect::play_looped("music")),
        stage("end", ExitTrigger::Always),
    ]);
    seq.start().unwrap();
    let token = seq.pending_timer().unwrap();

    seq.teardown();

    assert!(!seq.media().is_playing(&ResourceId::from("music")));
    assert!(seq.pending_timer().is_none());
    assert_eq!(seq.report_timer_elapsed(token), Err(SequencerError::StaleTimerIgnored));
    assert_eq!(seq.advance(), Err(SequencerError::TornDown));

    seq.teardown();
    let pauses = seq
        .media()
        .calls()
        .iter()
        .filter(|c| matches!(c, MediaCall::Pause(_)))
        .count();
    assert_eq!(pauses, 1);
}

#[test]
fn start_after_teardown_is_rejected() {
    let mut player = RecordingMediaPlayer::new();
    {
        let sequence = Sequence::new(
            "test",
            vec![
                stage("timed", ExitTrigger::timer(ms(5))).on_enter(SideEffect::play_looped("music")),
                stage("end", ExitTrigger::Always),
            ],
        )
        .unwrap();
        let mut seq = Sequencer::new(sequence, &mut player, FlagMap::new());
        seq.teardown();

        assert_eq!(seq.start(), Err(SequencerError::TornDown));
        assert!(!seq.is_started());
        assert!(seq.pending_timer().is_none());
        assert!(seq.take_events().is_empty());
    }
    assert!(!player.is_playing(&ResourceId::from("music")));
    assert!(player.calls().is_empty());
}

#[test]
fn dropping_the_sequencer_stops_borrowed_player() {
    let mut player = RecordingMediaPlayer::new();
    {
        let sequence = Sequence::new(
            "finale",
            vec![stage("finale", ExitTrigger::UserGesture).on_enter(SideEffect::play_looped("music"))],
        )
        .unwrap();
        let mut seq = Sequencer::new(sequence, &mut player, FlagMap::new());
        seq.start().unwrap();
    }
    assert!(!player.is_playing(&ResourceId::from("music")));
}
