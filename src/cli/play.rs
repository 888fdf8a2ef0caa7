//! CUI player mode for running sequences
//!
//! This module drives a sequencer with real elapsed time so a sequence can
//! be experienced in the terminal.

use crate::{
    application::{Route, VisitSession},
    config::PlayerConfig,
    content::{ContentCatalog, ContentProvider},
    domain::{
        entities::{Sequence, Stage},
        errors::SequencerError,
        repositories::{FlagStore, MediaPlayer},
        value_objects::{Direction, ExitTrigger, ResourceId, SideEffect},
    },
    infrastructure::{FileFlagRepository, LoadedSequence, TerminalMediaPlayer, load_sequence},
    sequencer::{Advance, Sequencer, SequencerEvent},
};
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use unicode_segmentation::UnicodeSegmentation;

/// Longest single sleep while waiting on timers or the typewriter
const MAX_SLEEP: Duration = Duration::from_millis(250);

/// How a run of the player ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Quit,
}

/// Play a single sequence document
pub async fn run_play(path: &Path, config: &PlayerConfig, debug: bool) -> anyhow::Result<Outcome> {
    let loaded = load_sequence(path, &config.reveal).await?;
    let mut session = VisitSession::open(FileFlagRepository::in_dir(&config.state_dir)).await?;

    let outcome = play_loaded(loaded, session.flags_mut(), debug)?;
    session.persist().await?;
    Ok(outcome)
}

/// Play the intro on a first visit and the main sequence afterwards
pub async fn run_visit(
    intro: &Path,
    main: &Path,
    config: &PlayerConfig,
    debug: bool,
) -> anyhow::Result<Outcome> {
    let mut session = VisitSession::open(FileFlagRepository::in_dir(&config.state_dir)).await?;

    if session.route() == Route::Intro {
        let loaded = load_sequence(intro, &config.reveal).await?;
        let outcome = play_loaded(loaded, session.flags_mut(), debug)?;
        session.persist().await?;
        if outcome == Outcome::Quit || session.route() == Route::Intro {
            return Ok(outcome);
        }
    } else {
        println!("Welcome back.");
    }

    let loaded = load_sequence(main, &config.reveal).await?;
    let outcome = play_loaded(loaded, session.flags_mut(), debug)?;
    session.persist().await?;
    Ok(outcome)
}

/// Run the interactive loop until the sequence completes or the visitor quits
pub fn play_loaded<F: FlagStore>(loaded: LoadedSequence, flags: F, debug: bool) -> anyhow::Result<Outcome> {
    let LoadedSequence { sequence, keepsakes } = loaded;
    let music = music_track(&sequence);
    let media = quiet_cues(&sequence);

    println!("=== {} ===", sequence.name());
    println!();
    println!("Controls:");
    println!("  Enter:  next");
    println!("  b:      back");
    if music.is_some() {
        println!("  m:      music on/off");
    }
    if keepsakes.is_some() {
        println!("  k <n>:  show keepsake n");
    }
    println!("  q:      quit");

    let mut sequencer = Sequencer::new(sequence, media, flags);
    let mut view = View::default();
    sequencer.start()?;

    loop {
        render_events(&mut sequencer, &mut view)?;
        let opened = run_clock(&mut sequencer, &mut view)?;

        if opened && matches!(sequencer.current_stage().exit_trigger(), ExitTrigger::Timer { .. }) {
            sequencer.advance()?;
            continue;
        }
        if sequencer.is_completed() {
            return Ok(Outcome::Completed);
        }

        if debug {
            display_debug_info(&sequencer);
        }

        let prompt = match sequencer.current_stage().exit_trigger() {
            ExitTrigger::CredentialMatch { .. } => "code>",
            _ => ">",
        };
        let Some(input) = get_input(prompt)? else {
            println!("Goodbye!");
            return Ok(Outcome::Quit);
        };
        sequencer.report_gesture_trigger();

        match input.as_str() {
            "q" => {
                println!("Goodbye!");
                return Ok(Outcome::Quit);
            }
            "b" => match sequencer.retreat() {
                Ok(_) => {}
                Err(SequencerError::AtFirstStage) => println!("[Cannot go back]"),
                Err(e) => return Err(e.into()),
            },
            "m" => match &music {
                Some(track) => {
                    if let Err(e) = sequencer.toggle_media(track) {
                        println!("[{e}]");
                    }
                }
                None => println!("[No music in this sequence]"),
            },
            "" => try_advance(&mut sequencer)?,
            other => {
                if let Some(number) = other.strip_prefix('k') {
                    show_keepsake(keepsakes.as_ref(), number.trim());
                } else if matches!(
                    sequencer.current_stage().exit_trigger(),
                    ExitTrigger::CredentialMatch { .. }
                ) {
                    match sequencer.submit_credential(other) {
                        Ok(()) => try_advance(&mut sequencer)?,
                        Err(SequencerError::CredentialRejected) => println!("Incorrect code. Try again."),
                        Err(e) => return Err(e.into()),
                    }
                } else {
                    println!("Press Enter to continue, 'b' to go back, or 'q' to quit.");
                }
            }
        }
    }
}

/// Per-run rendering state
#[derive(Debug, Default)]
struct View {
    /// Units of the current body already printed
    typed: usize,
}

fn try_advance<M: MediaPlayer, F: FlagStore>(sequencer: &mut Sequencer<M, F>) -> anyhow::Result<()> {
    match sequencer.advance() {
        Ok(Advance::Moved { .. }) | Ok(Advance::Completed) => Ok(()),
        Err(SequencerError::ExitNotSatisfied { trigger, .. }) => {
            match trigger {
                "credential_match" => println!("[Enter the code to continue]"),
                "timer" => println!("[Please wait...]"),
                _ => println!("[Not yet]"),
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Sleep through pending timers and the typewriter. Returns true when the
/// current stage's gate opened meanwhile.
fn run_clock<M: MediaPlayer, F: FlagStore>(
    sequencer: &mut Sequencer<M, F>,
    view: &mut View,
) -> anyhow::Result<bool> {
    let index = sequencer.current_index();
    let was_open = sequencer.is_exit_satisfied(index);
    let mut last = Instant::now();

    while let Some(wait) = sequencer.next_wakeup_in() {
        std::thread::sleep(wait.min(MAX_SLEEP));
        let now = Instant::now();
        sequencer.advance_clock(now.duration_since(last));
        last = now;
        print_typed(sequencer, view)?;
        render_events(sequencer, view)?;
    }

    Ok(!sequencer.is_completed() && !was_open && sequencer.is_exit_satisfied(index))
}

fn render_events<M: MediaPlayer, F: FlagStore>(
    sequencer: &mut Sequencer<M, F>,
    view: &mut View,
) -> anyhow::Result<()> {
    loop {
        let events = sequencer.take_events();
        if events.is_empty() {
            return Ok(());
        }

        for event in events {
            match event {
                SequencerEvent::StageChanged { index, direction } => {
                    view.typed = 0;
                    let Some(stage) = sequencer.sequence().stage(index) else {
                        continue;
                    };
                    show_stage(stage, direction);
                    let needs_manual_reveal = index == sequencer.current_index()
                        && *stage.exit_trigger() == ExitTrigger::TextRevealComplete
                        && stage.reveal().is_none();
                    if needs_manual_reveal {
                        sequencer.report_text_reveal_progress(usize::MAX)?;
                    }
                    print_typed(sequencer, view)?;
                }
                SequencerEvent::Completed => {
                    println!();
                    println!("== THE END ==");
                }
                SequencerEvent::RevealCompleted { .. } => {}
                SequencerEvent::Burst { effect, .. } => {
                    println!("✨ {effect} ✨");
                }
                SequencerEvent::PlaybackRejected { resource, reason } => {
                    println!("[{resource} could not start: {reason}]");
                }
            }
        }
    }
}

fn show_stage(stage: &Stage, direction: Direction) {
    let content = stage.content();
    println!();
    if direction == Direction::Backward {
        println!("(back)");
    }
    if !content.title.is_empty() {
        println!("--- {} ---", content.title);
    }
    if let Some(subtitle) = &content.subtitle {
        println!("{subtitle}");
    }
    if let Some(media) = &content.media {
        println!("[{media}]");
    }
    if *stage.exit_trigger() != ExitTrigger::TextRevealComplete && !content.body.is_empty() {
        println!("{}", content.body);
    }
    if let ExitTrigger::Timer { millis } = stage.exit_trigger() {
        println!("(continues in {:.1}s)", *millis as f64 / 1000.0);
    }
}

/// Print the newly revealed part of the current body
fn print_typed<M: MediaPlayer, F: FlagStore>(sequencer: &Sequencer<M, F>, view: &mut View) -> io::Result<()> {
    if sequencer.is_completed() {
        return Ok(());
    }
    let stage = sequencer.current_stage();
    if *stage.exit_trigger() != ExitTrigger::TextRevealComplete {
        return Ok(());
    }

    let body = &stage.content().body;
    let progress = sequencer.typed_progress();
    if progress <= view.typed {
        return Ok(());
    }

    let fresh: String = body.graphemes(true).skip(view.typed).take(progress - view.typed).collect();
    print!("{fresh}");
    view.typed = progress;
    if progress >= body.graphemes(true).count() {
        println!();
    }
    io::stdout().flush()
}

fn show_keepsake(keepsakes: Option<&ContentCatalog<u32>>, number: &str) {
    let Some(keepsakes) = keepsakes else {
        println!("[No keepsakes in this sequence]");
        return;
    };
    let Ok(number) = number.parse::<u32>() else {
        println!("Usage: k <number>");
        return;
    };

    let content = keepsakes.lookup(&number).content();
    println!("#{number} {}", content.title);
    if !content.body.is_empty() {
        println!("{}", content.body);
    }
}

/// First looped track started by any stage
fn music_track(sequence: &Sequence) -> Option<ResourceId> {
    sequence.stages().iter().find_map(|stage| {
        let hooks = stage.hooks();
        hooks
            .on_enter
            .iter()
            .chain(&hooks.on_exit)
            .chain(&hooks.on_reveal_complete)
            .find_map(|effect| match effect {
                SideEffect::PlayMedia { resource, options } if options.looped => Some(resource.clone()),
                _ => None,
            })
    })
}

/// Terminal player that does not announce typewriter cues
fn quiet_cues(sequence: &Sequence) -> TerminalMediaPlayer {
    sequence
        .stages()
        .iter()
        .filter_map(|stage| stage.reveal().and_then(|reveal| reveal.cue.as_ref()))
        .fold(TerminalMediaPlayer::new(), |player, cue| player.quiet(cue.resource.clone()))
}

/// Display debug information (only when --debug is set)
fn display_debug_info<M: MediaPlayer, F: FlagStore>(sequencer: &Sequencer<M, F>) {
    let stage = sequencer.current_stage();
    println!("[debug]");
    println!(
        "stage={} trigger={} unlocked={:?}",
        stage.index(),
        stage.exit_trigger().kind(),
        sequencer.unlocked()
    );
    if *stage.exit_trigger() == ExitTrigger::TextRevealComplete {
        println!("typed={}", sequencer.typed_progress());
    }
}

/// Read one trimmed line, `None` at end of input
fn get_input(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt} ");
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
