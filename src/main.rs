//! zeropamine - terminal Pomodoro timer with synthesized completion cues.
//!
//! Alternates focus and break sessions:
//! - 25 minutes of focused work (configurable 1-120)
//! - 5 minutes of break (configurable 1-60)
//! - a synthesized alarm or bell at every session boundary

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use tokio::io::AsyncBufReadExt;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

use zeropamine::cli::{Cli, Commands, Display, PreviewArgs, RunArgs, SettingsAction};
use zeropamine::notify::LogNotificationSink;
use zeropamine::runtime::PomodoroRuntime;
use zeropamine::settings::{load_settings, FileSettingsStore, SettingsStore, STORAGE_KEY};
use zeropamine::sound::{render_cue, try_create_backend, SoundEngine};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Run(args)) => execute_run(args).await,
        Some(Commands::Settings { action }) => execute_settings(action),
        Some(Commands::Preview(args)) => execute_preview(args).await,
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "zeropamine",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        // No subcommand runs the timer with persisted settings.
        None => execute_run(RunArgs::default()).await,
    }
}

/// Opens the settings store, honoring an explicit directory override.
fn settings_store() -> Result<FileSettingsStore> {
    if let Ok(dir) = std::env::var("ZEROPAMINE_CONFIG_DIR") {
        return Ok(FileSettingsStore::with_base_dir(dir));
    }
    Ok(FileSettingsStore::new()?)
}

// ============================================================================
// run
// ============================================================================

/// Runs the timer interactively in the foreground.
///
/// Enter toggles pause/resume; Ctrl+C exits. At a session boundary without
/// auto-start the timer idles until Enter starts the next session.
async fn execute_run(args: RunArgs) -> Result<()> {
    let store = settings_store()?;

    let mut runtime = if args.mute {
        PomodoroRuntime::with_sound_engine(
            Box::new(store),
            Box::new(LogNotificationSink),
            SoundEngine::without_audio(),
        )
    } else {
        PomodoroRuntime::new(Box::new(store), Box::new(LogNotificationSink))
    };

    let patch = args.to_patch();
    if !patch.is_empty() {
        runtime.update_settings(&patch);
    }

    runtime.start();
    if let Some(seconds) = args.focus_seconds {
        runtime.override_remaining(seconds);
    }
    Display::show_run_banner(runtime.state());

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first interval tick fires immediately; consume it so the full
    // duration stays on screen for one second.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let before_mode = runtime.state().mode;
                if runtime.state().status.is_running() {
                    runtime.tick();
                    let state = runtime.state();
                    if state.mode != before_mode {
                        Display::show_boundary(before_mode, state.mode, state.status.is_running());
                    }
                }
                Display::show_tick(runtime.state());
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => {
                        if runtime.state().status.is_running() {
                            runtime.pause();
                        } else {
                            runtime.start();
                        }
                        Display::show_tick(runtime.state());
                    }
                    Ok(None) | Err(_) => {
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("タイマーを終了します");
                return Ok(());
            }
        }
    }
}

// ============================================================================
// settings
// ============================================================================

/// Shows or updates the persisted settings.
fn execute_settings(action: SettingsAction) -> Result<()> {
    let store = settings_store()?;

    match action {
        SettingsAction::Show => {
            let settings = load_settings(&store);
            Display::show_settings(&settings);
        }
        SettingsAction::Set(args) => {
            if args.is_empty() {
                bail!(
                    "変更する設定を指定してください \
                     (--focus, --break, --auto-start, --theme, --sound, --volume)"
                );
            }
            let mut settings = load_settings(&store);
            settings.apply(&args.to_patch());
            store.save(STORAGE_KEY, &serde_json::to_string(&settings)?)?;
            Display::show_settings_saved(&settings);
        }
    }
    Ok(())
}

// ============================================================================
// preview
// ============================================================================

/// Plays one completion cue and exits when it finishes.
async fn execute_preview(args: PreviewArgs) -> Result<()> {
    let store = settings_store()?;
    let volume = args
        .volume
        .unwrap_or_else(|| load_settings(&store).volume);

    let Some(backend) = try_create_backend() else {
        // Degrade silently, same as the timer itself.
        println!("オーディオデバイスがないため、サウンドなしで終了します");
        return Ok(());
    };

    let clip_secs = render_cue(args.sound, volume).duration_secs();
    let mut engine = SoundEngine::new(Some(backend));
    engine.start_preview(args.sound, volume);
    Display::show_preview(args.sound, volume);

    tokio::select! {
        _ = sleep(Duration::from_secs_f32(clip_secs + 0.2)) => {}
        _ = tokio::signal::ctrl_c() => {
            engine.stop_preview();
            println!();
        }
    }
    Ok(())
}
