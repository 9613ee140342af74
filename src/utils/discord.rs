// Small helpers around serenity: permissions, channel lookup, replies

use poise::serenity_prelude as serenity;
use tracing::debug;

/// Whether the interacting member holds the Administrator permission
pub fn is_admin(member: Option<&serenity::Member>) -> bool {
    member
        .and_then(|m| m.permissions)
        .map(|p| p.administrator())
        .unwrap_or(false)
}

/// Channels the bot posts panels and embeds into
pub fn is_postable(
    guild_id: serenity::GuildId,
    channel_guild_id: serenity::GuildId,
    kind: serenity::ChannelType,
) -> bool {
    channel_guild_id == guild_id
        && matches!(kind, serenity::ChannelType::Text | serenity::ChannelType::News)
}

/// Resolve a configured channel id to a text channel of `guild_id`
pub async fn resolve_guild_channel(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    channel_id: Option<serenity::ChannelId>,
) -> Option<serenity::ChannelId> {
    let channel_id = channel_id?;
    match channel_id.to_channel(http).await {
        Ok(channel) => channel
            .guild()
            .filter(|c| is_postable(guild_id, c.guild_id, c.kind))
            .map(|c| c.id),
        Err(e) => {
            debug!("Channel {} not resolvable: {:?}", channel_id, e);
            None
        }
    }
}

/// Text channel named exactly `name` with the lowest position.
/// Candidates are `(id, name, kind, position)`.
pub fn pick_named_channel<'a>(
    candidates: impl IntoIterator<Item = (serenity::ChannelId, &'a str, serenity::ChannelType, u16)>,
    name: &str,
) -> Option<serenity::ChannelId> {
    if name.is_empty() {
        return None;
    }
    candidates
        .into_iter()
        .filter(|(_, channel_name, kind, _)| {
            *channel_name == name
                && matches!(kind, serenity::ChannelType::Text | serenity::ChannelType::News)
        })
        .min_by_key(|(id, _, _, position)| (*position, *id))
        .map(|(id, _, _, _)| id)
}

/// Find a guild text channel by its exact name
pub async fn find_guild_channel_by_name(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    name: &str,
) -> Option<serenity::ChannelId> {
    let channels = match guild_id.channels(http).await {
        Ok(channels) => channels,
        Err(e) => {
            debug!("Failed to list channels of guild {}: {:?}", guild_id, e);
            return None;
        }
    };
    pick_named_channel(
        channels
            .values()
            .map(|c| (c.id, c.name.as_str(), c.kind, c.position)),
        name,
    )
}

/// Mention for the configured ping id: a role if the guild has one with that id, else a user
pub async fn ping_mention(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    ping_id: Option<u64>,
) -> Option<String> {
    let ping_id = ping_id?;
    let is_role = guild_id
        .roles(http)
        .await
        .map(|roles| roles.contains_key(&serenity::RoleId::new(ping_id)))
        .unwrap_or(false);
    Some(format_ping(ping_id, is_role))
}

pub fn format_ping(id: u64, is_role: bool) -> String {
    if is_role {
        format!("<@&{}>", id)
    } else {
        format!("<@{}>", id)
    }
}

/// Mentions allowed on posts: roles and users, never @everyone
pub fn ping_allowed_mentions() -> serenity::CreateAllowedMentions {
    serenity::CreateAllowedMentions::new()
        .everyone(false)
        .all_roles(true)
        .all_users(true)
}

/// Ephemeral text reply as the first response to an interaction
pub fn ephemeral_message(content: impl Into<String>) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

/// Ephemeral text follow-up after a deferred response
pub fn ephemeral_followup(content: impl Into<String>) -> serenity::CreateInteractionResponseFollowup {
    serenity::CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true)
}

/// Deferred ephemeral response ("Bot is thinking...")
pub fn ephemeral_defer() -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Defer(
        serenity::CreateInteractionResponseMessage::new().ephemeral(true),
    )
}
