//! End-to-end sequencer scenarios through the public API

use keepsake::domain::entities::{CueConfig, RevealConfig, Sequence, Stage, StageContent};
use keepsake::domain::MediaPlayer;
use keepsake::domain::repositories::FlagMap;
use keepsake::domain::value_objects::{ExitTrigger, FlagKey, ResourceId, SideEffect};
use keepsake::infrastructure::{FileFlagRepository, MediaCall, RecordingMediaPlayer};
use keepsake::{Advance, Route, Sequencer, SequencerError, SequencerEvent, VisitSession};
use std::time::Duration;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[test]
fn timer_gesture_credential_scenario() {
    let sequence = Sequence::new(
        "scenario",
        vec![
            Stage::new(StageContent::new("A", ""), ExitTrigger::timer(ms(2000))),
            Stage::new(StageContent::new("B", ""), ExitTrigger::UserGesture),
            Stage::new(StageContent::new("C", ""), ExitTrigger::credential("1234")),
        ],
    )
    .unwrap();
    let mut sequencer = Sequencer::new(sequence, RecordingMediaPlayer::new(), FlagMap::new());

    sequencer.start().unwrap();
    assert_eq!(sequencer.current_index(), 0);

    // timer not yet due
    sequencer.advance_clock(ms(1999));
    assert!(matches!(
        sequencer.advance(),
        Err(SequencerError::ExitNotSatisfied { index: 0, .. })
    ));

    sequencer.advance_clock(ms(1));
    assert_eq!(sequencer.advance().unwrap(), Advance::Moved { from: 0, to: 1 });

    assert!(sequencer.report_gesture_trigger());
    assert_eq!(sequencer.advance().unwrap(), Advance::Moved { from: 1, to: 2 });

    assert_eq!(sequencer.submit_credential("0000"), Err(SequencerError::CredentialRejected));
    assert_eq!(sequencer.current_index(), 2);
    assert_eq!(sequencer.submit_credential("1234"), Ok(()));
    assert_eq!(sequencer.advance().unwrap(), Advance::Completed);

    let events = sequencer.take_events();
    assert_eq!(events.last(), Some(&SequencerEvent::Completed));
    let changes = events
        .iter()
        .filter(|event| matches!(event, SequencerEvent::StageChanged { .. }))
        .count();
    assert_eq!(changes, 3);
}

#[test]
fn stale_timer_does_not_unlock_new_visit() {
    let sequence = Sequence::new(
        "stale",
        vec![
            Stage::new(StageContent::new("Start", ""), ExitTrigger::Always),
            Stage::new(StageContent::new("Wait", ""), ExitTrigger::timer(ms(5000))),
            Stage::new(StageContent::new("End", ""), ExitTrigger::Always),
        ],
    )
    .unwrap();
    let mut sequencer = Sequencer::new(sequence, RecordingMediaPlayer::new(), FlagMap::new());

    sequencer.start().unwrap();
    sequencer.advance().unwrap();
    let old_token = sequencer.pending_timer().unwrap();

    sequencer.retreat().unwrap();
    sequencer.advance().unwrap();
    let new_token = sequencer.pending_timer().unwrap();
    assert_ne!(old_token, new_token);

    assert_eq!(sequencer.report_timer_elapsed(old_token), Err(SequencerError::StaleTimerIgnored));
    assert!(!sequencer.is_exit_satisfied(1));

    assert_eq!(sequencer.report_timer_elapsed(new_token), Ok(()));
    assert!(sequencer.is_exit_satisfied(1));
}

#[test]
fn finale_with_blocked_autoplay_and_typewriter() {
    let sequence = Sequence::new(
        "finale",
        vec![
            Stage::new(StageContent::new("Party", ""), ExitTrigger::UserGesture)
                .on_enter(SideEffect::play_looped("song")),
            Stage::new(StageContent::new("Letter", "Thanks!"), ExitTrigger::TextRevealComplete)
                .with_reveal(RevealConfig::new(ms(40)).with_cue(CueConfig::new("typing")))
                .on_reveal_complete(SideEffect::burst("signature", Duration::ZERO)),
        ],
    )
    .unwrap();
    let mut sequencer = Sequencer::new(
        sequence,
        RecordingMediaPlayer::with_autoplay_blocked(),
        FlagMap::new(),
    );

    sequencer.start().unwrap();
    assert!(matches!(
        sequencer.take_events().as_slice(),
        [SequencerEvent::PlaybackRejected { .. }, SequencerEvent::StageChanged { index: 0, .. }]
    ));

    // the visitor's click lets the browser-like player start audio
    sequencer.media_mut().allow_playback();
    assert!(sequencer.report_gesture_trigger());
    assert!(sequencer.media().is_playing(&ResourceId::from("song")));

    sequencer.advance().unwrap();
    sequencer.advance_clock(ms(40 * 6));
    assert_eq!(sequencer.typed_progress(), 6);
    assert!(!sequencer.is_exit_satisfied(1));

    sequencer.advance_clock(ms(40));
    assert!(sequencer.is_exit_satisfied(1));
    let events = sequencer.take_events();
    assert!(events.contains(&SequencerEvent::RevealCompleted { index: 1 }));
    assert!(events.contains(&SequencerEvent::Burst {
        effect: "signature".to_string(),
        duration: Duration::ZERO
    }));
    assert!(sequencer.media().play_count("typing") > 0);
    assert!(!sequencer.media().is_playing(&ResourceId::from("typing")));

    assert_eq!(sequencer.advance().unwrap(), Advance::Completed);
    sequencer.teardown();
    assert!(matches!(
        sequencer.media().calls().last(),
        Some(MediaCall::Pause(resource)) if resource.as_str() == "song"
    ));
}

#[tokio::test]
async fn intro_completion_routes_next_visit_to_main() {
    let dir = tempfile::tempdir().unwrap();
    let intro = Sequence::new(
        "intro",
        vec![
            Stage::new(StageContent::new("Hello", ""), ExitTrigger::timer(ms(1500))),
            Stage::new(StageContent::new("Open", ""), ExitTrigger::UserGesture)
                .on_exit(SideEffect::set_flag(FlagKey::has_seen_intro(), "true")),
        ],
    )
    .unwrap();

    let mut session = VisitSession::open(FileFlagRepository::in_dir(dir.path())).await.unwrap();
    assert_eq!(session.route(), Route::Intro);
    {
        let mut sequencer = Sequencer::new(intro, RecordingMediaPlayer::new(), session.flags_mut());
        sequencer.start().unwrap();
        sequencer.advance_clock(ms(1500));
        sequencer.advance().unwrap();
        sequencer.report_gesture_trigger();
        assert_eq!(sequencer.advance().unwrap(), Advance::Completed);
    }
    assert!(session.persist().await.unwrap());

    let next_visit = VisitSession::open(FileFlagRepository::in_dir(dir.path())).await.unwrap();
    assert_eq!(next_visit.route(), Route::Main);
}
