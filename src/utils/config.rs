// Centralized configuration for the Rematch HQ bot

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::models::guild::{parse_id, ServerConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_ICONS_DIR: &str = "tournament_icons";

/// Used when no results channel id is configured or it can't be resolved
pub const DEFAULT_RESULTS_CHANNEL_NAME: &str = "🏆・results";

/// Discord embed colors
pub mod colors {
    pub const BRAND: u32 = 0xbe629b;
    pub const TOURNAMENT: u32 = 0x36e3ba;
}

/// Notion credentials, both are needed for the tournament lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
}

/// Process-wide settings, read-only after startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    /// Register commands in this guild only (fast sync while developing)
    pub guild_id: Option<serenity::GuildId>,
    pub sync_commands_on_startup: bool,
    pub notion: Option<NotionSettings>,
    pub config_path: PathBuf,
    pub icons_dir: PathBuf,
    /// Paris-time hour for the scheduled "today's tournaments" post
    pub daily_post_hour: Option<u32>,
    pub servers: HashMap<serenity::GuildId, ServerConfig>,
}

/// Channel overrides read from the environment
#[derive(Debug, Default)]
struct EnvOverrides {
    setup_channel_id: Option<u64>,
    results_tournaments_channel_id: Option<u64>,
    upcoming_tournaments_channel_id: Option<u64>,
    tournaments_ping_id: Option<u64>,
}

impl EnvOverrides {
    fn is_empty(&self) -> bool {
        self.setup_channel_id.is_none()
            && self.results_tournaments_channel_id.is_none()
            && self.upcoming_tournaments_channel_id.is_none()
            && self.tournaments_ping_id.is_none()
    }

    fn apply(&self, server: &mut ServerConfig) {
        if let Some(id) = self.setup_channel_id {
            server.setup_channel_id = Some(serenity::ChannelId::new(id));
        }
        if let Some(id) = self.results_tournaments_channel_id {
            server.results_tournaments_channel_id = Some(serenity::ChannelId::new(id));
        }
        if let Some(id) = self.upcoming_tournaments_channel_id {
            server.upcoming_tournaments_channel_id = Some(serenity::ChannelId::new(id));
        }
        if let Some(id) = self.tournaments_ping_id {
            server.tournaments_ping_id = Some(id);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Optional id: unset is fine, garbage is fatal
fn optional_id(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match non_empty(lookup(key)) {
        None => Ok(None),
        Some(raw) => parse_id(&raw)
            .map(Some)
            .ok_or_else(|| anyhow!("Invalid {} env var (expected an integer id)", key)),
    }
}

impl Settings {
    /// Load settings from the environment and the per-server config file
    pub fn load() -> Result<Self> {
        let mut settings = Self::from_lookup(|key| std::env::var(key).ok())?;

        let servers = match std::fs::read_to_string(&settings.config_path) {
            Ok(content) => ServerConfig::parse_file(&content)
                .with_context(|| format!("failed to load {}", settings.config_path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Config file {} not found, every server uses defaults",
                    settings.config_path.display()
                );
                Vec::new()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", settings.config_path.display()))
            }
        };

        let overrides = settings.servers.drain().map(|(_, s)| s).collect::<Vec<_>>();
        for server in servers {
            settings.servers.insert(server.server_id, server);
        }
        // Env overrides win over the file
        for server in overrides {
            let merged = settings
                .servers
                .entry(server.server_id)
                .or_insert_with(|| ServerConfig::for_guild(server.server_id));
            merge_overrides(merged, &server);
        }

        info!("Loaded configuration for {} server(s)", settings.servers.len());
        Ok(settings)
    }

    /// Parse the environment through `lookup`. The only servers present in the
    /// result are the ones created by env channel overrides.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = non_empty(lookup("DISCORD_TOKEN"))
            .ok_or_else(|| anyhow!("Missing DISCORD_TOKEN env var"))?;

        let guild_id = optional_id(&lookup, "DISCORD_GUILD_ID")?.map(serenity::GuildId::new);

        let sync_commands_on_startup = non_empty(lookup("SYNC_COMMANDS_ON_STARTUP"))
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let notion = match (
            non_empty(lookup("NOTION_TOKEN")),
            non_empty(lookup("NOTION_DATABASE_ID")),
        ) {
            (Some(token), Some(database_id)) => Some(NotionSettings { token, database_id }),
            _ => None,
        };

        let config_path: PathBuf = non_empty(lookup("CONFIG_PATH"))
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
            .into();
        let icons_dir: PathBuf = non_empty(lookup("TOURNAMENT_ICONS_DIR"))
            .unwrap_or_else(|| DEFAULT_ICONS_DIR.to_string())
            .into();

        let daily_post_hour = match non_empty(lookup("TOURNAMENTS_DAILY_HOUR")) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(hour) if hour < 24 => Some(hour),
                _ => bail!("Invalid TOURNAMENTS_DAILY_HOUR env var (expected 0-23)"),
            },
        };

        let overrides = EnvOverrides {
            setup_channel_id: optional_id(&lookup, "SETUP_CHANNEL_ID")?,
            results_tournaments_channel_id: optional_id(&lookup, "RESULTS_TOURNAMENTS_CHANNEL_ID")?,
            upcoming_tournaments_channel_id: optional_id(
                &lookup,
                "UPCOMING_TOURNAMENTS_CHANNEL_ID",
            )?,
            tournaments_ping_id: optional_id(&lookup, "TOURNAMENTS_PING_ID")?,
        };

        let mut servers = HashMap::new();
        if !overrides.is_empty() {
            match guild_id {
                Some(guild_id) => {
                    let mut server = ServerConfig::for_guild(guild_id);
                    overrides.apply(&mut server);
                    servers.insert(guild_id, server);
                }
                None => warn!("Channel overrides in env are ignored without DISCORD_GUILD_ID"),
            }
        }

        Ok(Self {
            discord_token,
            guild_id,
            sync_commands_on_startup,
            notion,
            config_path,
            icons_dir,
            daily_post_hour,
            servers,
        })
    }

    pub fn server(&self, guild_id: serenity::GuildId) -> Option<&ServerConfig> {
        self.servers.get(&guild_id)
    }

    /// Icon directory for a guild, falling back to the global one
    pub fn icon_dir(&self, guild_id: serenity::GuildId) -> &Path {
        self.server(guild_id)
            .and_then(|s| s.icon_dir.as_deref())
            .unwrap_or(&self.icons_dir)
    }
}

fn merge_overrides(target: &mut ServerConfig, from_env: &ServerConfig) {
    if from_env.setup_channel_id.is_some() {
        target.setup_channel_id = from_env.setup_channel_id;
    }
    if from_env.results_tournaments_channel_id.is_some() {
        target.results_tournaments_channel_id = from_env.results_tournaments_channel_id;
    }
    if from_env.upcoming_tournaments_channel_id.is_some() {
        target.upcoming_tournaments_channel_id = from_env.upcoming_tournaments_channel_id;
    }
    if from_env.tournaments_ping_id.is_some() {
        target.tournaments_ping_id = from_env.tournaments_ping_id;
    }
}

// --- Europe/Paris time ---
// CET (UTC+1), CEST (UTC+2) from the last Sunday of March 01:00 UTC
// to the last Sunday of October 01:00 UTC.

fn last_sunday(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .unwrap_or_default();
    let last = first_of_next - Duration::days(1);
    last - Duration::days(last.weekday().num_days_from_sunday() as i64)
}

fn is_paris_summer_time(utc: DateTime<Utc>) -> bool {
    let year = utc.year();
    let start = last_sunday(year, 3).and_hms_opt(1, 0, 0).unwrap_or_default().and_utc();
    let end = last_sunday(year, 10).and_hms_opt(1, 0, 0).unwrap_or_default().and_utc();
    utc >= start && utc < end
}

/// UTC offset of Europe/Paris at the given instant
pub fn paris_offset(utc: DateTime<Utc>) -> FixedOffset {
    let hours = if is_paris_summer_time(utc) { 2 } else { 1 };
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Convert a Paris wall-clock time to UTC
pub fn paris_local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    // Guess with the winter offset, then correct with the offset in effect
    let guess = (local - Duration::hours(1)).and_utc();
    let offset = paris_offset(guess);
    (local - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
}

/// Calendar day of an instant in Paris
pub fn paris_date_of(utc: DateTime<Utc>) -> NaiveDate {
    utc.with_timezone(&paris_offset(utc)).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_fatal() {
        assert!(Settings::from_lookup(lookup(&[])).is_err());
        assert!(Settings::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_defaults() {
        let s = Settings::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(s.discord_token, "abc");
        assert_eq!(s.guild_id, None);
        assert!(s.sync_commands_on_startup);
        assert_eq!(s.notion, None);
        assert_eq!(s.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(s.icons_dir, PathBuf::from(DEFAULT_ICONS_DIR));
        assert_eq!(s.daily_post_hour, None);
        assert!(s.servers.is_empty());
    }

    #[test]
    fn test_notion_needs_both_values() {
        let s = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("NOTION_TOKEN", "secret"),
        ]))
        .unwrap();
        assert_eq!(s.notion, None);

        let s = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("NOTION_TOKEN", "secret"),
            ("NOTION_DATABASE_ID", "db"),
        ]))
        .unwrap();
        assert_eq!(
            s.notion,
            Some(NotionSettings {
                token: "secret".into(),
                database_id: "db".into()
            })
        );
    }

    #[test]
    fn test_sync_flag_and_hour() {
        let s = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("SYNC_COMMANDS_ON_STARTUP", "No"),
            ("TOURNAMENTS_DAILY_HOUR", "9"),
        ]))
        .unwrap();
        assert!(!s.sync_commands_on_startup);
        assert_eq!(s.daily_post_hour, Some(9));

        assert!(Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("TOURNAMENTS_DAILY_HOUR", "24"),
        ]))
        .is_err());
    }

    #[test]
    fn test_env_overrides_target_dev_guild() {
        let s = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_GUILD_ID", "42"),
            ("RESULTS_TOURNAMENTS_CHANNEL_ID", "7"),
        ]))
        .unwrap();
        let guild = serenity::GuildId::new(42);
        let server = s.server(guild).unwrap();
        assert_eq!(
            server.results_tournaments_channel_id,
            Some(serenity::ChannelId::new(7))
        );
        assert_eq!(server.setup_channel_id, None);
        assert_eq!(s.icon_dir(guild), Path::new(DEFAULT_ICONS_DIR));

        assert!(Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("SETUP_CHANNEL_ID", "general"),
        ]))
        .is_err());
    }

    #[test]
    fn test_merge_overrides_keeps_file_values() {
        let mut file = ServerConfig::for_guild(serenity::GuildId::new(1));
        file.setup_channel_id = Some(serenity::ChannelId::new(10));
        file.icon_dir = Some(PathBuf::from("icons"));

        let mut env = ServerConfig::for_guild(serenity::GuildId::new(1));
        env.upcoming_tournaments_channel_id = Some(serenity::ChannelId::new(20));

        merge_overrides(&mut file, &env);
        assert_eq!(file.setup_channel_id, Some(serenity::ChannelId::new(10)));
        assert_eq!(
            file.upcoming_tournaments_channel_id,
            Some(serenity::ChannelId::new(20))
        );
        assert_eq!(file.icon_dir, Some(PathBuf::from("icons")));
    }

    #[test]
    fn test_paris_offset() {
        let winter = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(paris_offset(winter).local_minus_utc(), 3600);
        assert_eq!(paris_offset(summer).local_minus_utc(), 7200);

        // 2026: DST starts Mar 29th, ends Oct 25th at 01:00 UTC
        assert_eq!(last_sunday(2026, 3), NaiveDate::from_ymd_opt(2026, 3, 29).unwrap());
        assert_eq!(last_sunday(2026, 10), NaiveDate::from_ymd_opt(2026, 10, 25).unwrap());
        let before = Utc.with_ymd_and_hms(2026, 3, 29, 0, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 29, 1, 0, 0).unwrap();
        assert_eq!(paris_offset(before).local_minus_utc(), 3600);
        assert_eq!(paris_offset(after).local_minus_utc(), 7200);
    }

    #[test]
    fn test_paris_local_to_utc() {
        let local = NaiveDate::from_ymd_opt(2026, 2, 11)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();
        assert_eq!(
            paris_local_to_utc(local),
            Utc.with_ymd_and_hms(2026, 2, 11, 18, 0, 0).unwrap()
        );

        let local = NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();
        assert_eq!(
            paris_local_to_utc(local),
            Utc.with_ymd_and_hms(2026, 7, 1, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_paris_date_of() {
        let late = Utc.with_ymd_and_hms(2026, 7, 1, 22, 30, 0).unwrap();
        assert_eq!(paris_date_of(late), NaiveDate::from_ymd_opt(2026, 7, 2).unwrap());
    }
}
