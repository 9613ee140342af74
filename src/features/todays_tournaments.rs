// Today's tournaments - Notion lookup posted as embeds, on demand or daily

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};

use crate::api::notion::{NotionClient, NotionError};
use crate::models::tournament::{detect_props, extract_tournament, today_query_payload, Tournament};
use crate::utils::config::{colors, paris_date_of, paris_local_to_utc, Settings};
use crate::utils::discord::{
    ephemeral_defer, ephemeral_followup, ephemeral_message, is_admin, ping_allowed_mentions,
    ping_mention, resolve_guild_channel,
};
use crate::utils::emojis::{guild_emojis, org_emoji};
use crate::utils::formatters::{discord_timestamp, format_eur, link_or_dash, truncate};
use crate::utils::icons::find_icon;
use crate::{Data, Error};

pub const MAX_TOURNAMENTS: usize = 25;
/// Discord allows 10 embeds per message
pub const EMBEDS_PER_MESSAGE: usize = 10;
const MAX_REACTIONS: usize = 5;

/// Notion client plus the database holding the tournaments
pub struct TournamentLookup {
    pub notion: NotionClient,
    pub database_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Posted {
        count: usize,
        channel_id: serenity::ChannelId,
    },
    NoneToday,
    NoChannel,
}

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error(transparent)]
    Notion(#[from] NotionError),
    #[error("Discord rejected the post: {0}")]
    Discord(#[from] serenity::Error),
}

impl TournamentLookup {
    /// 5v5 cups starting on the Paris day of `now`, earliest first
    pub async fn todays_tournaments(&self, now: DateTime<Utc>) -> Result<Vec<Tournament>, NotionError> {
        let schema = self.notion.retrieve_database(&self.database_id).await?;
        let props = detect_props(&schema);
        let pages = self
            .notion
            .query_database(&self.database_id, &today_query_payload(&props, now))
            .await?;

        debug!("Notion: {} page(s) matched the query", pages.len());
        let tournaments = pages.iter().filter_map(|page| extract_tournament(page, &props));
        Ok(select_for_day(tournaments, paris_date_of(now)))
    }
}

/// Keep tournaments starting on `day` (Paris), sorted by start, capped
pub fn select_for_day(tournaments: impl IntoIterator<Item = Tournament>, day: NaiveDate) -> Vec<Tournament> {
    let mut selected: Vec<Tournament> = tournaments
        .into_iter()
        .filter(|t| paris_date_of(t.starts_at) == day)
        .collect();
    selected.sort_by_key(|t| t.starts_at);
    selected.truncate(MAX_TOURNAMENTS);
    selected
}

pub fn tournament_embed(
    tournament: &Tournament,
    emoji: Option<&str>,
    thumbnail: Option<&str>,
) -> serenity::CreateEmbed {
    let title = match emoji {
        Some(emoji) => format!("{} {}", emoji, tournament.title),
        None => tournament.title.clone(),
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(truncate(&title, 256))
        .color(colors::TOURNAMENT)
        .field("Time", discord_timestamp(tournament.starts_at, 't'), true)
        .field("Entry fee", format_eur(tournament.entry_fee_eur), true)
        .field("Prize pool", format_eur(tournament.prize_pool_eur), true)
        .field("Website", link_or_dash(&tournament.website_url), true)
        .field("Discord", link_or_dash(&tournament.discord_url), true);

    if let Some(name) = thumbnail {
        embed = embed.thumbnail(format!("attachment://{}", name));
    }
    embed
}

/// Next `hour:00` Paris time strictly after `now`
pub fn next_daily_run(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let today = paris_date_of(now);
    let at = |day: NaiveDate| day.and_hms_opt(hour, 0, 0).map(paris_local_to_utc);

    match at(today) {
        Some(run) if run > now => run,
        _ => today
            .succ_opt()
            .and_then(at)
            .unwrap_or_else(|| now + chrono::Duration::days(1)),
    }
}

struct PreparedPost {
    embed: serenity::CreateEmbed,
    icon: Option<serenity::CreateAttachment>,
    emoji: Option<serenity::Emoji>,
}

/// Post today's tournaments in the server's upcoming-tournaments channel
pub async fn post_todays_tournaments(
    http: &serenity::Http,
    settings: &Settings,
    lookup: &TournamentLookup,
    guild_id: serenity::GuildId,
) -> Result<PostOutcome, PostError> {
    let server = settings.server(guild_id);
    let configured = server.and_then(|s| s.upcoming_tournaments_channel_id);
    let Some(channel_id) = resolve_guild_channel(http, guild_id, configured).await else {
        return Ok(PostOutcome::NoChannel);
    };

    let tournaments = lookup.todays_tournaments(Utc::now()).await?;
    if tournaments.is_empty() {
        return Ok(PostOutcome::NoneToday);
    }

    let emojis = guild_emojis(http, guild_id).await;
    let icon_dir = settings.icon_dir(guild_id);

    let mut posts = Vec::with_capacity(tournaments.len());
    for tournament in &tournaments {
        let emoji = org_emoji(&emojis, &tournament.organization).cloned();

        let mut icon = None;
        if let Some(path) = find_icon(icon_dir, &tournament.organization).await {
            match serenity::CreateAttachment::path(&path).await {
                Ok(file) => icon = Some(file),
                Err(e) => warn!("Failed to read icon {}: {:?}", path.display(), e),
            }
        }

        let embed = tournament_embed(
            tournament,
            emoji.as_ref().map(|e| e.to_string()).as_deref(),
            icon.as_ref().map(|f| f.filename.as_str()),
        );
        posts.push(PreparedPost { embed, icon, emoji });
    }

    let ping = ping_mention(http, guild_id, server.and_then(|s| s.tournaments_ping_id)).await;

    for (i, chunk) in posts.chunks(EMBEDS_PER_MESSAGE).enumerate() {
        let mut message = serenity::CreateMessage::new()
            .embeds(chunk.iter().map(|p| p.embed.clone()).collect())
            .allowed_mentions(ping_allowed_mentions());

        if i == 0 {
            if let Some(ping) = &ping {
                message = message.content(ping);
            }
        }

        let mut attached = HashSet::new();
        for file in chunk.iter().filter_map(|p| p.icon.as_ref()) {
            if attached.insert(file.filename.clone()) {
                message = message.add_file(file.clone());
            }
        }

        let posted = channel_id.send_message(http, message).await?;

        let mut reacted = HashSet::new();
        for emoji in chunk.iter().filter_map(|p| p.emoji.as_ref()) {
            if reacted.len() >= MAX_REACTIONS {
                break;
            }
            if !reacted.insert(emoji.id) {
                continue;
            }
            if let Err(e) = posted.react(http, emoji.clone()).await {
                debug!("Failed to react with {}: {:?}", emoji.name, e);
            }
        }
    }

    info!(
        "Posted {} tournament(s) in channel {} of guild {}",
        posts.len(),
        channel_id,
        guild_id
    );
    Ok(PostOutcome::Posted {
        count: posts.len(),
        channel_id,
    })
}

fn outcome_message(result: &Result<PostOutcome, PostError>) -> String {
    match result {
        Ok(PostOutcome::Posted { count, channel_id }) => {
            format!("Posted {} tournament(s) in <#{}>.", count, channel_id)
        }
        Ok(PostOutcome::NoneToday) => "No tournaments found for today.".to_string(),
        Ok(PostOutcome::NoChannel) => {
            "Couldn't find the upcoming tournaments channel. Set `upcoming_tournaments_channel_id` in the config."
                .to_string()
        }
        Err(PostError::Notion(NotionError::Timeout)) => {
            "Notion timed out while fetching tournaments. Try again in a bit.".to_string()
        }
        Err(PostError::Notion(NotionError::Status { status, .. })) => format!(
            "Notion API error ({}). Check `NOTION_TOKEN` and `NOTION_DATABASE_ID`.",
            status.as_u16()
        ),
        Err(PostError::Notion(_)) => "Notion request failed. Check the bot logs.".to_string(),
        Err(PostError::Discord(e)) => format!("Couldn't post the tournaments: {}", e),
    }
}

/// Tournament Today button
pub async fn handle_button(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    if !is_admin(interaction.member.as_ref()) {
        interaction
            .create_response(ctx, ephemeral_message("Admins only."))
            .await?;
        return Ok(());
    }

    let Some(lookup) = data.tournaments.as_deref() else {
        interaction
            .create_response(
                ctx,
                ephemeral_message("Notion is not configured (`NOTION_TOKEN` / `NOTION_DATABASE_ID`)."),
            )
            .await?;
        return Ok(());
    };

    interaction.create_response(ctx, ephemeral_defer()).await?;

    info!("Looking up today's tournaments for guild {}", guild_id);
    let result = post_todays_tournaments(&ctx.http, &data.settings, lookup, guild_id).await;
    if let Err(e) = &result {
        error!("Today's tournaments failed for guild {}: {}", guild_id, e);
    }

    interaction
        .create_followup(ctx, ephemeral_followup(outcome_message(&result)))
        .await?;
    Ok(())
}

/// Post today's tournaments every day at `hour:00` Paris time
pub fn spawn_daily_post(
    http: Arc<serenity::Http>,
    settings: Arc<Settings>,
    lookup: Arc<TournamentLookup>,
    hour: u32,
) {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_daily_run(now, hour);
            info!("Next daily tournaments post at {}", next);

            let wait = (next - now)
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(60));
            tokio::time::sleep(wait).await;

            for server in settings.servers.values() {
                if server.upcoming_tournaments_channel_id.is_none() {
                    continue;
                }
                match post_todays_tournaments(&http, &settings, &lookup, server.server_id).await {
                    Ok(outcome) => info!("Daily post for '{}': {:?}", server.name, outcome),
                    Err(e) => error!("Daily post for '{}' failed: {}", server.name, e),
                }
            }
        }
    });
}
