// Per-server configuration from config.toml

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Guild (Server) specific configuration, loaded once from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Table name in the config file, only used for logging
    pub name: String,
    pub server_id: serenity::GuildId,
    /// Channel where the setup panel is posted
    pub setup_channel_id: Option<serenity::ChannelId>,
    /// Channel for tournament results
    pub results_tournaments_channel_id: Option<serenity::ChannelId>,
    /// Channel for today's tournaments
    pub upcoming_tournaments_channel_id: Option<serenity::ChannelId>,
    /// Role (preferred) or user pinged alongside results and tournaments
    pub tournaments_ping_id: Option<u64>,
    /// Overrides the global tournament icon directory
    pub icon_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    servers: BTreeMap<String, RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    #[serde(default, deserialize_with = "deserialize_id")]
    server_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_id")]
    setup_channel_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_id")]
    results_tournaments_channel_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_id")]
    upcoming_tournaments_channel_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_id")]
    tournaments_ping_id: Option<u64>,
    #[serde(default)]
    icon_dir: Option<PathBuf>,
}

/// Discord ids may be written as integers or strings (decimal or `0x` hex)
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(u64),
    Str(String),
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    let id = match raw {
        Some(RawId::Int(n)) => Some(n),
        Some(RawId::Str(s)) => parse_id(&s),
        None => None,
    };
    Ok(id.filter(|n| *n != 0))
}

/// Parse a snowflake from text. Zero and garbage count as unset.
pub fn parse_id(raw: &str) -> Option<u64> {
    let s = raw.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse::<u64>().ok(),
    };
    parsed.filter(|n| *n != 0)
}

impl ServerConfig {
    /// Empty config for a guild that has no entry in the file
    pub fn for_guild(server_id: serenity::GuildId) -> Self {
        Self {
            name: server_id.to_string(),
            server_id,
            setup_channel_id: None,
            results_tournaments_channel_id: None,
            upcoming_tournaments_channel_id: None,
            tournaments_ping_id: None,
            icon_dir: None,
        }
    }

    /// Parse the `[servers.<name>]` tables of the config file.
    /// Blocks without a `server_id` are skipped.
    pub fn parse_file(content: &str) -> anyhow::Result<Vec<ServerConfig>> {
        let file: ConfigFile = toml::from_str(content).context("invalid config file")?;

        let mut servers = Vec::with_capacity(file.servers.len());
        for (name, raw) in file.servers {
            let Some(server_id) = raw.server_id else {
                warn!("Skipping server block `{}`: missing server_id", name);
                continue;
            };

            servers.push(ServerConfig {
                name,
                server_id: serenity::GuildId::new(server_id),
                setup_channel_id: raw.setup_channel_id.map(serenity::ChannelId::new),
                results_tournaments_channel_id: raw
                    .results_tournaments_channel_id
                    .map(serenity::ChannelId::new),
                upcoming_tournaments_channel_id: raw
                    .upcoming_tournaments_channel_id
                    .map(serenity::ChannelId::new),
                tournaments_ping_id: raw.tournaments_ping_id,
                icon_dir: raw.icon_dir,
            });
        }

        Ok(servers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file() {
        let servers = ServerConfig::parse_file(
            r#"
            [servers.rematch_hq]
            server_id = 111
            setup_channel_id = "222"
            results_tournaments_channel_id = 333
            tournaments_ping_id = "0x10"
            icon_dir = "icons/hq"

            [servers.broken]
            setup_channel_id = 5
            "#,
        )
        .unwrap();

        assert_eq!(servers.len(), 1);
        let hq = &servers[0];
        assert_eq!(hq.name, "rematch_hq");
        assert_eq!(hq.server_id, serenity::GuildId::new(111));
        assert_eq!(hq.setup_channel_id, Some(serenity::ChannelId::new(222)));
        assert_eq!(
            hq.results_tournaments_channel_id,
            Some(serenity::ChannelId::new(333))
        );
        assert_eq!(hq.upcoming_tournaments_channel_id, None);
        assert_eq!(hq.tournaments_ping_id, Some(16));
        assert_eq!(hq.icon_dir, Some(PathBuf::from("icons/hq")));
    }

    #[test]
    fn test_zero_and_blank_ids_are_unset() {
        let servers = ServerConfig::parse_file(
            r#"
            [servers.a]
            server_id = 1
            setup_channel_id = 0
            results_tournaments_channel_id = ""
            upcoming_tournaments_channel_id = "not a number"
            "#,
        )
        .unwrap();

        assert_eq!(servers[0].setup_channel_id, None);
        assert_eq!(servers[0].results_tournaments_channel_id, None);
        assert_eq!(servers[0].upcoming_tournaments_channel_id, None);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(ServerConfig::parse_file("servers = [").is_err());
        assert!(ServerConfig::parse_file("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(" 1234 "), Some(1234));
        assert_eq!(parse_id("0xff"), Some(255));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("abc"), None);
    }
}
