//! Command definitions for the zeropamine CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::ops::RangeInclusive;

use clap::{Args, Parser, Subcommand};

use crate::types::{
    SettingsPatch, SoundKind, Theme, MAX_BREAK_MINUTES, MAX_FOCUS_MINUTES, MIN_BREAK_MINUTES,
    MIN_FOCUS_MINUTES,
};

/// Legal `--focus` values, as clap's ranged parser wants them.
const FOCUS_RANGE: RangeInclusive<i64> = (MIN_FOCUS_MINUTES as i64)..=(MAX_FOCUS_MINUTES as i64);
/// Legal `--break` values.
const BREAK_RANGE: RangeInclusive<i64> = (MIN_BREAK_MINUTES as i64)..=(MAX_BREAK_MINUTES as i64);

// ============================================================================
// CLI Structure
// ============================================================================

/// zeropamine - terminal Pomodoro timer with synthesized completion cues
#[derive(Parser, Debug)]
#[command(
    name = "zeropamine",
    version,
    about = "ターミナルで動くポモドーロタイマー",
    long_about = "集中と休憩を交互に刻むポモドーロタイマー。\n\
                  セッション完了時には合成されたアラーム音またはベル音で知らせます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer in the foreground (default)
    Run(RunArgs),

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Play a completion cue once and exit
    Preview(PreviewArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command.
///
/// Every flag is optional; unset flags keep the persisted (or default)
/// value, matching the field-by-field settings merge.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Focus session length in minutes (1-120)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(FOCUS_RANGE))]
    pub focus: Option<u32>,

    /// Break length in minutes (1-60)
    #[arg(short, long = "break", value_parser = clap::value_parser!(u32).range(BREAK_RANGE))]
    pub break_time: Option<u32>,

    /// Automatically start the next session at each boundary
    #[arg(short, long)]
    pub auto_start: bool,

    /// Visual theme (hourglass, coffee)
    #[arg(long, value_parser = parse_theme)]
    pub theme: Option<Theme>,

    /// Completion cue (alarm, bell)
    #[arg(short, long, value_parser = parse_sound)]
    pub sound: Option<SoundKind>,

    /// Playback volume (0.0-1.0)
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,

    /// Disable audio output entirely
    #[arg(long)]
    pub mute: bool,

    /// Focus session length in seconds, overrides --focus (for testing)
    #[arg(long, hide = true)]
    pub focus_seconds: Option<u32>,
}

impl RunArgs {
    /// Converts the session flags into a settings patch.
    ///
    /// `--auto-start` only sets the field when given, so a persisted
    /// `autoStart: true` survives a run without the flag.
    pub fn to_patch(&self) -> SettingsPatch {
        SettingsPatch {
            focus_minutes: self.focus,
            break_minutes: self.break_time,
            auto_start: self.auto_start.then_some(true),
            theme: self.theme,
            sound: self.sound,
            volume: self.volume,
        }
    }
}

// ============================================================================
// Settings Subcommands
// ============================================================================

/// Actions on the persisted settings document.
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsAction {
    /// Print the current settings
    Show,

    /// Change one or more settings and persist them
    Set(SettingsSetArgs),
}

/// Arguments for `settings set`.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsSetArgs {
    /// Focus session length in minutes (1-120)
    #[arg(long, value_parser = clap::value_parser!(u32).range(FOCUS_RANGE))]
    pub focus: Option<u32>,

    /// Break length in minutes (1-60)
    #[arg(long = "break", value_parser = clap::value_parser!(u32).range(BREAK_RANGE))]
    pub break_time: Option<u32>,

    /// Automatically start the next session (true/false)
    #[arg(long)]
    pub auto_start: Option<bool>,

    /// Visual theme (hourglass, coffee)
    #[arg(long, value_parser = parse_theme)]
    pub theme: Option<Theme>,

    /// Completion cue (alarm, bell)
    #[arg(long, value_parser = parse_sound)]
    pub sound: Option<SoundKind>,

    /// Playback volume (0.0-1.0)
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,
}

impl SettingsSetArgs {
    /// Converts the flags into a settings patch.
    pub fn to_patch(&self) -> SettingsPatch {
        SettingsPatch {
            focus_minutes: self.focus,
            break_minutes: self.break_time,
            auto_start: self.auto_start,
            theme: self.theme,
            sound: self.sound,
            volume: self.volume,
        }
    }

    /// Returns true if no flag was given.
    pub fn is_empty(&self) -> bool {
        self.to_patch().is_empty()
    }
}

// ============================================================================
// Preview Command Arguments
// ============================================================================

/// Arguments for the preview command.
#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Completion cue to play (alarm, bell)
    #[arg(value_parser = parse_sound)]
    pub sound: SoundKind,

    /// Playback volume (0.0-1.0)
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,
}

// ============================================================================
// Value Parsers
// ============================================================================

fn parse_theme(value: &str) -> Result<Theme, String> {
    Theme::parse(value).ok_or_else(|| format!("不明なテーマです: {value} (hourglass, coffee)"))
}

fn parse_sound(value: &str) -> Result<SoundKind, String> {
    SoundKind::parse(value).ok_or_else(|| format!("不明なサウンドです: {value} (alarm, bell)"))
}

fn parse_volume(value: &str) -> Result<f32, String> {
    let volume: f32 = value
        .parse()
        .map_err(|_| format!("音量は数値で指定してください: {value}"))?;
    if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
        return Err(format!("音量は0.0から1.0の範囲で指定してください: {value}"));
    }
    Ok(volume)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_become_patch() {
        let cli = Cli::parse_from([
            "zeropamine",
            "run",
            "--focus",
            "50",
            "--break",
            "10",
            "--auto-start",
            "--sound",
            "bell",
            "--volume",
            "0.8",
        ]);

        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run command");
        };
        let patch = args.to_patch();
        assert_eq!(patch.focus_minutes, Some(50));
        assert_eq!(patch.break_minutes, Some(10));
        assert_eq!(patch.auto_start, Some(true));
        assert_eq!(patch.sound, Some(SoundKind::Bell));
        assert!((patch.volume.unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_run_without_flags_yields_empty_patch() {
        let cli = Cli::parse_from(["zeropamine", "run"]);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.to_patch().is_empty());
        assert!(!args.mute);
    }

    #[test]
    fn test_out_of_range_focus_is_rejected() {
        assert!(Cli::try_parse_from(["zeropamine", "run", "--focus", "0"]).is_err());
        assert!(Cli::try_parse_from(["zeropamine", "run", "--focus", "121"]).is_err());
    }

    #[test]
    fn test_out_of_range_volume_is_rejected() {
        assert!(Cli::try_parse_from(["zeropamine", "run", "--volume", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["zeropamine", "run", "--volume", "-0.1"]).is_err());
        assert!(Cli::try_parse_from(["zeropamine", "run", "--volume", "nan"]).is_err());
    }

    #[test]
    fn test_unknown_sound_is_rejected() {
        assert!(Cli::try_parse_from(["zeropamine", "preview", "gong"]).is_err());
    }

    #[test]
    fn test_preview_parses() {
        let cli = Cli::parse_from(["zeropamine", "preview", "bell", "--volume", "0.3"]);
        let Some(Commands::Preview(args)) = cli.command else {
            panic!("expected preview command");
        };
        assert_eq!(args.sound, SoundKind::Bell);
        assert!((args.volume.unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_settings_set_parses() {
        let cli = Cli::parse_from([
            "zeropamine",
            "settings",
            "set",
            "--auto-start",
            "false",
            "--theme",
            "coffee",
        ]);
        let Some(Commands::Settings {
            action: SettingsAction::Set(args),
        }) = cli.command
        else {
            panic!("expected settings set command");
        };
        assert_eq!(args.auto_start, Some(false));
        assert_eq!(args.theme, Some(Theme::Coffee));
        assert!(!args.is_empty());
    }

    #[test]
    fn test_hidden_focus_seconds_flag() {
        let cli = Cli::parse_from(["zeropamine", "run", "--focus-seconds", "3"]);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.focus_seconds, Some(3));
    }
}
