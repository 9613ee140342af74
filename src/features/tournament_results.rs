// Tournament Results - modal form posted as a results embed

use std::collections::HashMap;

use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

use crate::features::TOURNAMENT_RESULTS_MODAL;
use crate::models::guild::ServerConfig;
use crate::utils::config::{colors, DEFAULT_RESULTS_CHANNEL_NAME};
use crate::utils::discord::{
    ephemeral_defer, ephemeral_followup, ephemeral_message, find_guild_channel_by_name, is_admin,
    ping_allowed_mentions, ping_mention, resolve_guild_channel,
};
use crate::utils::emojis::{emoji_prefix, guild_emojis, org_emoji, team_emoji};
use crate::utils::formatters::{
    link_or_dash, parse_roster, split_entry_prize_and_time, to_discord_timestamp, truncate,
};
use crate::utils::icons::{find_icon, split_host_label};
use crate::{Data, Error};

const FIELD_TOURNAMENT: &str = "tournament";
const FIELD_URL: &str = "url";
const FIELD_ENTRY: &str = "entry_prize_time";
const FIELD_STANDINGS: &str = "standings";
const FIELD_ROSTER: &str = "roster";

/// Placements shown in the standings field
const MAX_PLACEMENTS: usize = 4;

/// Raw modal values, trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TournamentSubmission {
    pub tournament: String,
    pub url: String,
    pub entry_line: String,
    pub standings: String,
    pub roster: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetails {
    pub entry_fee: String,
    pub prize_pool: String,
    pub when: String,
}

/// A validated submission, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentResults {
    pub host: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub entry: Option<EntryDetails>,
    pub teams: Vec<String>,
    pub roster: Option<Vec<String>>,
}

impl TournamentResults {
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.host)
    }
}

impl TournamentSubmission {
    pub fn from_values(values: &HashMap<String, String>) -> Self {
        let get = |key: &str| values.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            tournament: get(FIELD_TOURNAMENT),
            url: get(FIELD_URL),
            entry_line: get(FIELD_ENTRY),
            standings: get(FIELD_STANDINGS),
            roster: get(FIELD_ROSTER),
        }
    }

    pub fn from_modal(data: &serenity::ModalInteractionData) -> Self {
        let mut values = HashMap::new();
        for row in &data.components {
            for component in &row.components {
                if let serenity::ActionRowComponent::InputText(input) = component {
                    values.insert(
                        input.custom_id.clone(),
                        input.value.clone().unwrap_or_default(),
                    );
                }
            }
        }
        Self::from_values(&values)
    }

    /// Check the submission. The error is shown to the user as is.
    pub fn validate(&self) -> Result<TournamentResults, String> {
        let (host, name) = split_host_label(&self.tournament);
        if host.is_empty() && name.is_none() {
            return Err("Tournament is required, e.g. `MRC | Rematch Weekly #12`.".to_string());
        }

        let teams: Vec<String> = self
            .standings
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(MAX_PLACEMENTS)
            .map(str::to_string)
            .collect();
        if teams.is_empty() {
            return Err("Standings need at least one team (one per line).".to_string());
        }

        let entry = if self.entry_line.is_empty() {
            None
        } else {
            let (entry_fee, prize_pool, when) = split_entry_prize_and_time(&self.entry_line)
                .ok_or_else(|| {
                    "Entry/Prize/Date format: `€10 | €200 | 2026-02-11 19:00`.".to_string()
                })?;
            let when = to_discord_timestamp(&when).unwrap_or(when);
            Some(EntryDetails {
                entry_fee,
                prize_pool,
                when,
            })
        };

        let roster = if self.roster.is_empty() {
            None
        } else {
            Some(parse_roster(&self.roster)?)
        };

        Ok(TournamentResults {
            host,
            name,
            url: (!self.url.is_empty()).then(|| self.url.clone()),
            entry,
            teams,
            roster,
        })
    }
}

pub fn results_modal() -> serenity::CreateModal {
    let input = |style, label: &str, id: &str, placeholder: &str, required: bool, max: u16| {
        serenity::CreateActionRow::InputText(
            serenity::CreateInputText::new(style, label, id)
                .placeholder(placeholder)
                .required(required)
                .max_length(max),
        )
    };

    serenity::CreateModal::new(TOURNAMENT_RESULTS_MODAL, "Tournament Results").components(vec![
        input(
            serenity::InputTextStyle::Short,
            "Tournament (HOST | Name)",
            FIELD_TOURNAMENT,
            "MRC | Rematch Weekly #12",
            true,
            80,
        ),
        input(
            serenity::InputTextStyle::Short,
            "Tournament URL",
            FIELD_URL,
            "https://...",
            false,
            200,
        ),
        input(
            serenity::InputTextStyle::Short,
            "Entry | Prize | Date & time",
            FIELD_ENTRY,
            "€10 | €200 | 2026-02-11 19:00",
            false,
            120,
        ),
        input(
            serenity::InputTextStyle::Paragraph,
            "Standings (top 4, one team per line)",
            FIELD_STANDINGS,
            "Team One\nTeam Two\nTeam Three\nTeam Four",
            true,
            400,
        ),
        input(
            serenity::InputTextStyle::Paragraph,
            "Winning roster (@player country)",
            FIELD_ROSTER,
            "<@123456789012345678> FR",
            false,
            400,
        ),
    ])
}

/// `1. <emoji> Team`, or `1. Team` when `prefix_for` has nothing
pub fn standings_lines(teams: &[String], prefix_for: impl Fn(&str) -> String) -> Vec<String> {
    teams
        .iter()
        .enumerate()
        .map(|(i, team)| format!("{}. {}{}", i + 1, prefix_for(team), team))
        .collect()
}

pub fn build_results_embed(
    results: &TournamentResults,
    standings: &[String],
    thumbnail: Option<&str>,
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(truncate(results.title(), 256))
        .color(colors::TOURNAMENT);

    if let Some(url) = &results.url {
        embed = embed.field("Tournament", link_or_dash(url), false);
    }
    if let Some(entry) = &results.entry {
        embed = embed
            .field("Entry fee", &entry.entry_fee, true)
            .field("Prize pool", &entry.prize_pool, true)
            .field("Date & time", &entry.when, false);
    }

    embed = embed.field("Standings", truncate(&standings.join("\n"), 1024), false);

    if let Some(roster) = &results.roster {
        embed = embed.field("Winning roster", truncate(&roster.join("\n"), 1024), false);
    }
    if let Some(name) = thumbnail {
        embed = embed.thumbnail(format!("attachment://{}", name));
    }
    embed
}

/// Results button: admins get the form
pub async fn open_modal(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    if !is_admin(interaction.member.as_ref()) {
        interaction
            .create_response(ctx, ephemeral_message("Admins only."))
            .await?;
        return Ok(());
    }

    interaction
        .create_response(ctx, serenity::CreateInteractionResponse::Modal(results_modal()))
        .await?;
    Ok(())
}

async fn results_channel(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    server: Option<&ServerConfig>,
) -> Option<serenity::ChannelId> {
    let configured = server.and_then(|s| s.results_tournaments_channel_id);
    if let Some(channel_id) = resolve_guild_channel(http, guild_id, configured).await {
        return Some(channel_id);
    }
    find_guild_channel_by_name(http, guild_id, DEFAULT_RESULTS_CHANNEL_NAME).await
}

/// Results modal submitted: validate, post the embed, react
pub async fn handle_submit(
    ctx: &serenity::Context,
    interaction: &serenity::ModalInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = interaction.guild_id else {
        interaction
            .create_response(ctx, ephemeral_message("Run this in the server."))
            .await?;
        return Ok(());
    };
    if !is_admin(interaction.member.as_ref()) {
        interaction
            .create_response(ctx, ephemeral_message("Admins only."))
            .await?;
        return Ok(());
    }

    let results = match TournamentSubmission::from_modal(&interaction.data).validate() {
        Ok(results) => results,
        Err(message) => {
            interaction
                .create_response(ctx, ephemeral_message(message))
                .await?;
            return Ok(());
        }
    };

    interaction.create_response(ctx, ephemeral_defer()).await?;

    let http: &serenity::Http = &ctx.http;
    let server = data.settings.server(guild_id);

    let Some(channel_id) = results_channel(http, guild_id, server).await else {
        interaction
            .create_followup(
                ctx,
                ephemeral_followup(format!(
                    "Couldn't find the results channel. Set `results_tournaments_channel_id` \
                    or create a channel named `{}`.",
                    DEFAULT_RESULTS_CHANNEL_NAME
                )),
            )
            .await?;
        return Ok(());
    };

    let emojis = guild_emojis(http, guild_id).await;
    let standings = standings_lines(&results.teams, |team| {
        emoji_prefix(team_emoji(&emojis, team))
    });

    let mut attachment = None;
    if let Some(path) = find_icon(data.settings.icon_dir(guild_id), &results.host).await {
        match serenity::CreateAttachment::path(&path).await {
            Ok(file) => attachment = Some(file),
            Err(e) => warn!("Failed to read icon {}: {:?}", path.display(), e),
        }
    }
    let thumbnail = attachment.as_ref().map(|a| a.filename.clone());

    let mut message = serenity::CreateMessage::new()
        .embed(build_results_embed(&results, &standings, thumbnail.as_deref()))
        .allowed_mentions(ping_allowed_mentions());
    if let Some(ping) = ping_mention(http, guild_id, server.and_then(|s| s.tournaments_ping_id)).await {
        message = message.content(ping);
    }
    if let Some(file) = attachment {
        message = message.add_file(file);
    }

    let posted = match channel_id.send_message(http, message).await {
        Ok(posted) => posted,
        Err(e) => {
            warn!("Failed to post results in {}: {:?}", channel_id, e);
            interaction
                .create_followup(
                    ctx,
                    ephemeral_followup(format!("Couldn't post in <#{}>: {}", channel_id, e)),
                )
                .await?;
            return Ok(());
        }
    };
    info!(
        "Posted results for '{}' in channel {} of guild {}",
        results.title(),
        channel_id,
        guild_id
    );

    let winner = results.teams.first().and_then(|team| team_emoji(&emojis, team));
    let org = org_emoji(&emojis, &results.host);
    let mut reacted = Vec::new();
    for emoji in [winner, org].into_iter().flatten() {
        if reacted.contains(&emoji.id) {
            continue;
        }
        reacted.push(emoji.id);
        if let Err(e) = posted.react(http, emoji.clone()).await {
            debug!("Failed to react with {}: {:?}", emoji.name, e);
        }
    }

    interaction
        .create_followup(ctx, ephemeral_followup(format!("Posted in <#{}>.", channel_id)))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(tournament: &str, entry: &str, standings: &str, roster: &str) -> TournamentSubmission {
        TournamentSubmission {
            tournament: tournament.to_string(),
            url: String::new(),
            entry_line: entry.to_string(),
            standings: standings.to_string(),
            roster: roster.to_string(),
        }
    }

    #[test]
    fn test_from_values_trims_and_defaults() {
        let values = HashMap::from([
            (FIELD_TOURNAMENT.to_string(), "  MRC | Weekly ".to_string()),
            (FIELD_STANDINGS.to_string(), "A\nB\n".to_string()),
        ]);
        let sub = TournamentSubmission::from_values(&values);
        assert_eq!(sub.tournament, "MRC | Weekly");
        assert_eq!(sub.standings, "A\nB");
        assert!(sub.url.is_empty());
        assert!(sub.roster.is_empty());
    }

    #[test]
    fn test_validate_minimal_submission() {
        let results = submission("MRC | Weekly #12", "", "Alpha\n\n  Beta  ", "")
            .validate()
            .unwrap();
        assert_eq!(results.host, "MRC");
        assert_eq!(results.title(), "Weekly #12");
        assert_eq!(results.teams, vec!["Alpha", "Beta"]);
        assert!(results.entry.is_none());
        assert!(results.roster.is_none());
        assert!(results.url.is_none());
    }

    #[test]
    fn test_only_top_four_placements_are_kept() {
        let results = submission("MRC", "", "A\nB\nC\nD\nE", "").validate().unwrap();
        assert_eq!(results.teams, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_name_without_host_is_accepted() {
        let results = submission("| Open Cup", "", "Alpha", "").validate().unwrap();
        assert_eq!(results.host, "");
        assert_eq!(results.title(), "Open Cup");
    }

    #[test]
    fn test_title_falls_back_to_host() {
        let results = submission("Rematch Open", "", "Alpha", "").validate().unwrap();
        assert_eq!(results.title(), "Rematch Open");
    }

    #[test]
    fn test_validate_rejects_missing_parts() {
        assert!(submission("", "", "Alpha", "").validate().is_err());
        assert!(submission("|", "", "Alpha", "").validate().is_err());
        assert!(submission(" | ", "", "Alpha", "").validate().is_err());
        assert!(submission("MRC | Cup", "", "  \n ", "").validate().is_err());
        assert!(submission("MRC | Cup", "just text", "Alpha", "").validate().is_err());
        assert!(submission("MRC | Cup", "", "Alpha", "not a player").validate().is_err());
    }

    #[test]
    fn test_validate_entry_and_roster() {
        let results = submission(
            "MRC | Cup",
            "10€ | 200€ | 1739300400",
            "Alpha",
            "<@222222222222222222> FR",
        )
        .validate()
        .unwrap();

        let entry = results.entry.unwrap();
        assert_eq!(entry.entry_fee, "10€");
        assert_eq!(entry.prize_pool, "200€");
        assert_eq!(entry.when, "<t:1739300400:F>");
        assert_eq!(
            results.roster,
            Some(vec!["🇫🇷 <@222222222222222222>".to_string()])
        );
    }

    #[test]
    fn test_standings_lines() {
        let teams = vec!["Team One".to_string(), "Other".to_string()];
        let lines = standings_lines(&teams, |team| {
            if team == "Team One" {
                "<:Team_One:1> ".to_string()
            } else {
                String::new()
            }
        });
        assert_eq!(lines, vec!["1. <:Team_One:1> Team One", "2. Other"]);
    }

    #[test]
    fn test_results_embed() {
        let mut results = submission("MRC | Weekly", "10€ | 200€ | 1739300400", "Alpha", "")
            .validate()
            .unwrap();
        results.url = Some("https://example.com".to_string());

        let standings = vec!["1. Alpha".to_string()];
        let json = serde_json::to_value(build_results_embed(&results, &standings, Some("MRC.png")))
            .unwrap();

        assert_eq!(json["title"], "Weekly");
        assert_eq!(json["color"], colors::TOURNAMENT);
        assert_eq!(json["thumbnail"]["url"], "attachment://MRC.png");

        let fields = json["fields"].as_array().unwrap();
        let names: Vec<&str> = fields.iter().filter_map(|f| f["name"].as_str()).collect();
        assert_eq!(names, vec!["Tournament", "Entry fee", "Prize pool", "Date & time", "Standings"]);
        assert_eq!(fields[0]["value"], "[URL](https://example.com)");
        assert_eq!(fields[4]["value"], "1. Alpha");
    }

    #[test]
    fn test_results_embed_without_optional_parts() {
        let results = submission("MRC", "", "Alpha", "").validate().unwrap();
        let json = serde_json::to_value(build_results_embed(&results, &["1. Alpha".to_string()], None))
            .unwrap();
        assert_eq!(json["title"], "MRC");
        assert_eq!(json["fields"].as_array().unwrap().len(), 1);
        assert!(json["thumbnail"].is_null());
    }
}
