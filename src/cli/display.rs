//! Display utilities for the zeropamine CLI.
//!
//! This module provides formatted output for:
//! - The live countdown line
//! - Session boundary messages
//! - Settings listings
//! - Error messages

use crate::types::{PomodoroSettings, PomodoroState, Theme, TimerMode, TimerStatus};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the banner printed when the timer starts running.
    pub fn show_run_banner(state: &PomodoroState) {
        let (minutes, seconds) = Self::format_time(state.remaining_seconds);
        println!("* タイマーを開始しました");
        println!(
            "  集中: {}分 / 休憩: {}分",
            state.settings.focus_minutes, state.settings.break_minutes
        );
        println!("  残り時間: {}:{:02}", minutes, seconds);
        if state.settings.auto_start {
            println!("  自動開始: 有効");
        }
    }

    /// Redraws the single-line countdown for the current tick.
    pub fn show_tick(state: &PomodoroState) {
        let (minutes, seconds) = Self::format_time(state.remaining_seconds);
        let mode = Self::mode_label(state.mode);
        let status = match state.status {
            TimerStatus::Running => "",
            TimerStatus::Paused => " (一時停止中)",
            TimerStatus::Idle => " (待機中)",
        };
        let bar = Self::progress_bar(state.progress(), state.settings.theme);
        print!("\r{} {} {}:{:02}{}   ", mode, bar, minutes, seconds, status);
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }

    /// Announces a session boundary on its own line.
    pub fn show_boundary(finished: TimerMode, next: TimerMode, auto_started: bool) {
        println!();
        match finished {
            TimerMode::Focus => println!("* 集中セッション完了！"),
            TimerMode::Break => println!("* 休憩終了！"),
        }
        if auto_started {
            println!("  {}を自動開始しました", Self::mode_label(next));
        } else {
            println!("  Enterキーで{}を開始します", Self::mode_label(next));
        }
    }

    /// Prints the current settings, one line per field.
    pub fn show_settings(settings: &PomodoroSettings) {
        println!("zeropamine 設定");
        println!("─────────────────────────────");
        println!("集中時間:   {}分", settings.focus_minutes);
        println!("休憩時間:   {}分", settings.break_minutes);
        println!(
            "自動開始:   {}",
            if settings.auto_start { "有効" } else { "無効" }
        );
        println!("テーマ:     {}", settings.theme.as_str());
        println!("サウンド:   {}", settings.sound.as_str());
        println!("音量:       {:.0}%", settings.volume * 100.0);
    }

    /// Confirms that settings were saved.
    pub fn show_settings_saved(settings: &PomodoroSettings) {
        println!("* 設定を保存しました");
        Self::show_settings(settings);
    }

    /// Announces a preview playback.
    pub fn show_preview(kind: crate::types::SoundKind, volume: f32) {
        println!("♪ {} を再生中 (音量 {:.0}%)", kind.as_str(), volume * 100.0);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Converts seconds into (minutes, seconds) for mm:ss rendering.
    pub fn format_time(total_seconds: u32) -> (u32, u32) {
        (total_seconds / 60, total_seconds % 60)
    }

    fn mode_label(mode: TimerMode) -> &'static str {
        match mode {
            TimerMode::Focus => "集中",
            TimerMode::Break => "休憩",
        }
    }

    /// Renders the remaining fraction as a 20-cell bar.
    ///
    /// The hourglass theme drains from the left, coffee from the right, a
    /// nod to the two web visualizations.
    fn progress_bar(progress: f32, theme: Theme) -> String {
        const CELLS: usize = 20;
        let filled = (progress.clamp(0.0, 1.0) * CELLS as f32).round() as usize;
        let mut bar = String::with_capacity(CELLS + 2);
        bar.push('[');
        match theme {
            Theme::Hourglass => {
                for i in 0..CELLS {
                    bar.push(if i < filled { '#' } else { '.' });
                }
            }
            Theme::Coffee => {
                for i in 0..CELLS {
                    bar.push(if i >= CELLS - filled { '#' } else { '.' });
                }
            }
        }
        bar.push(']');
        bar
    }
}

// ============================================================================
// Tests
// ============================================================================
