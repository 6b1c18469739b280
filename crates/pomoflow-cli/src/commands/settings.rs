use clap::{Args, Subcommand};
use pomoflow_core::{history, Config, SettingsPatch, TimerSettings};

use super::{load_engine, open_database};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current settings as JSON
    Show,
    /// Change one or more settings
    Set(SetArgs),
    /// Restore default settings
    Reset,
}

#[derive(Args)]
pub struct SetArgs {
    /// Focus length in seconds
    #[arg(long)]
    work: Option<u64>,
    /// Short break length in seconds
    #[arg(long)]
    short_break: Option<u64>,
    /// Long break length in seconds
    #[arg(long)]
    long_break: Option<u64>,
    /// Focus sessions before a long break
    #[arg(long)]
    sessions: Option<u32>,
    #[arg(long)]
    notifications: Option<bool>,
    #[arg(long)]
    sound: Option<bool>,
    #[arg(long)]
    haptic: Option<bool>,
    /// Start the next phase automatically
    #[arg(long)]
    auto_advance: Option<bool>,
}

impl SetArgs {
    pub fn into_patch(self) -> SettingsPatch {
        SettingsPatch {
            work_duration: self.work,
            short_break_duration: self.short_break,
            long_break_duration: self.long_break,
            sessions_until_long_break: self.sessions,
            notifications_enabled: self.notifications,
            sound_enabled: self.sound,
            haptic_enabled: self.haptic,
            auto_advance: self.auto_advance,
        }
    }
}

fn defaults_patch() -> SettingsPatch {
    let d = TimerSettings::default();
    SettingsPatch {
        work_duration: Some(d.work_duration),
        short_break_duration: Some(d.short_break_duration),
        long_break_duration: Some(d.long_break_duration),
        sessions_until_long_break: Some(d.sessions_until_long_break),
        notifications_enabled: Some(d.notifications_enabled),
        sound_enabled: Some(d.sound_enabled),
        haptic_enabled: Some(d.haptic_enabled),
        auto_advance: Some(d.auto_advance),
    }
}

pub fn run(action: SettingsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(config)?;
    let (mut engine, loaded) = load_engine(&db, config);
    history::record_events(&db, &loaded);

    let patch = match action {
        SettingsAction::Show => None,
        SettingsAction::Set(args) => {
            let patch = args.into_patch();
            if patch.is_empty() {
                return Err("nothing to change; pass at least one flag".into());
            }
            Some(patch)
        }
        SettingsAction::Reset => Some(defaults_patch()),
    };

    if let Some(patch) = patch {
        history::record_events(&db, &engine.update_settings(&patch)?);
    }
    println!("{}", serde_json::to_string_pretty(engine.settings())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{config_in, recorded_sessions, seed_finished_focus};

    fn empty_args() -> SetArgs {
        SetArgs {
            work: None,
            short_break: None,
            long_break: None,
            sessions: None,
            notifications: None,
            sound: None,
            haptic: None,
            auto_advance: None,
        }
    }

    #[test]
    fn catch_up_is_recorded_when_set_has_nothing_to_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_finished_focus(&config);

        assert!(run(SettingsAction::Set(empty_args()), &config).is_err());
        assert_eq!(recorded_sessions(&config), 1);
    }

    #[test]
    fn catch_up_is_recorded_when_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_finished_focus(&config);

        let args = SetArgs {
            work: Some(0),
            ..empty_args()
        };
        assert!(run(SettingsAction::Set(args), &config).is_err());
        assert_eq!(recorded_sessions(&config), 1);

        // Nothing left to catch up on the next run.
        run(SettingsAction::Show, &config).unwrap();
        assert_eq!(recorded_sessions(&config), 1);
    }
}
