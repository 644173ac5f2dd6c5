//! Breathe - a guided breathing timer for the terminal
//!
//! Walks through a repeating breath cycle:
//! - inhale, hold, exhale, hold, with zero-length phases skipped
//! - an optional session length in minutes
//! - a bell at each phase change

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::{mpsc, watch};

use breathe::cli::{
    run_session, AddPresetArgs, Cli, Commands, Display, PresetCommands, PrefsArgs, RunArgs,
};
use breathe::storage::default_store_path;
use breathe::{
    BreathingController, CueDispatcher, FileStore, Preferences, TerminalCuePlayer, TimerEvent,
    TimerSettings,
};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let store_path = cli.store;

    match cli.command {
        Some(Commands::Run(args)) => run(store_path, args).await?,
        Some(Commands::Presets { command }) => presets(store_path, command).await?,
        Some(Commands::Prefs(args)) => prefs(store_path, args).await?,
        Some(Commands::ResetData) => {
            let mut controller = open(store_path, TimerSettings::default()).await?;
            controller.clear_saved_data().await;
            Display::show_reset_data();
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Opens the store and loads saved configuration.
///
/// The event receiver is returned for commands that run the timer.
async fn open_with_events(
    store_path: Option<PathBuf>,
    settings: TimerSettings,
) -> Result<(
    BreathingController<FileStore>,
    mpsc::UnboundedReceiver<TimerEvent>,
)> {
    let path = match store_path {
        Some(path) => path,
        None => default_store_path().context("cannot locate the settings store")?,
    };
    tracing::debug!("Using store {}", path.display());

    let (mut controller, events) = BreathingController::new(FileStore::new(path), settings);
    controller.load().await;
    Ok((controller, events))
}

async fn open(
    store_path: Option<PathBuf>,
    settings: TimerSettings,
) -> Result<BreathingController<FileStore>> {
    let (controller, _events) = open_with_events(store_path, settings).await?;
    Ok(controller)
}

async fn run(store_path: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let settings = TimerSettings {
        prepare_seconds: args.prepare,
        ..TimerSettings::default()
    };
    let (mut controller, events) = open_with_events(store_path, settings).await?;

    if let Some(name) = &args.preset {
        controller
            .apply_preset(name)
            .await
            .ok_or_else(|| anyhow!("unknown preset: {}", name))?;
    }
    for (phase, seconds) in args.durations.overrides() {
        controller.set_draft_field(phase, f64::from(seconds)).await;
    }
    if let Some(minutes) = args.durations.minutes {
        controller.set_repeat_minutes(f64::from(minutes)).await;
    }

    // --no-sound mutes this session only; the saved preference is untouched.
    let (_session_prefs, preferences) = if args.no_sound {
        let (tx, rx) = watch::channel(Preferences {
            sound_enabled: false,
            ..controller.preferences()
        });
        (Some(tx), rx)
    } else {
        (None, controller.subscribe_preferences())
    };
    let dispatcher = CueDispatcher::new(TerminalCuePlayer::stderr(), preferences);
    let cues = tokio::spawn(dispatcher.run(events));

    controller.start().await.context("cannot start session")?;
    Display::show_session_start(&controller.snapshot().await, controller.last_preset());

    let end = run_session(&mut controller).await;
    cues.abort();
    Display::show_session_end(end);
    Ok(())
}

async fn presets(store_path: Option<PathBuf>, command: PresetCommands) -> Result<()> {
    let mut controller = open(store_path, TimerSettings::default()).await?;

    match command {
        PresetCommands::List { favorites } => {
            let entries = if favorites {
                controller.favorites()
            } else {
                controller.presets()
            };
            let selected = controller.matching_preset().await.map(|e| e.preset.name);
            Display::show_presets(&entries, selected.as_deref());
        }
        PresetCommands::Add(AddPresetArgs {
            label,
            durations,
            favorite,
        }) => {
            let snapshot = controller.snapshot().await;
            let set = durations.apply_to(snapshot.draft);
            let repeat_minutes = durations.minutes.unwrap_or(snapshot.repeat_minutes);
            let added = controller
                .add_preset(&label, set, repeat_minutes, favorite)
                .await;
            Display::show_preset_added(&added);
        }
        PresetCommands::Remove { name } => {
            let removal = controller.remove_preset(&name).await;
            Display::show_preset_removed(&name, removal);
        }
        PresetCommands::Favorite { name: Some(name), .. } => {
            let favorite = controller.toggle_favorite(&name).await;
            Display::show_favorite(&name, favorite);
        }
        PresetCommands::Favorite { name: None, label } => {
            let favorite = controller.toggle_draft_favorite(&label).await;
            Display::show_draft_favorite(favorite);
        }
        PresetCommands::Apply { name } => {
            let preset = controller
                .apply_preset(&name)
                .await
                .ok_or_else(|| anyhow!("unknown preset: {}", name))?;
            Display::show_preset_applied(&preset);
        }
    }

    Ok(())
}

async fn prefs(store_path: Option<PathBuf>, args: PrefsArgs) -> Result<()> {
    let mut controller = open(store_path, TimerSettings::default()).await?;

    if args.has_changes() {
        let current = controller.preferences();
        let updated = Preferences {
            sound_enabled: args.sound.map_or(current.sound_enabled, |s| s.is_on()),
            vibration_enabled: args
                .vibration
                .map_or(current.vibration_enabled, |s| s.is_on()),
        };
        controller.set_preferences(updated).await;
    }
    Display::show_preferences(&controller.preferences());
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
