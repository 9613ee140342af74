// Setup command - post the Rematch HQ panel with its buttons

use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::features::{TOURNAMENT_RESULTS_BUTTON, TOURNAMENT_TODAY_BUTTON};
use crate::utils::config::colors;
use crate::utils::discord::{is_admin, resolve_guild_channel};
use crate::{Context, Error};

/// Where the panel goes, if anywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupTarget {
    Denied,
    Post(serenity::ChannelId),
}

/// Admins only. The resolved setup channel wins over the invocation channel.
pub fn setup_target(
    is_admin: bool,
    setup_channel: Option<serenity::ChannelId>,
    invocation_channel: serenity::ChannelId,
) -> SetupTarget {
    if !is_admin {
        return SetupTarget::Denied;
    }
    SetupTarget::Post(setup_channel.unwrap_or(invocation_channel))
}

pub fn panel_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Rematch HQ Setup")
        .description(
            "🏆 **Tournament Results:** Post the results of a tournament.\n\
            📅 **Tournament Today:** Post today's tournaments.",
        )
        .color(colors::BRAND)
}

pub fn panel_components() -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(TOURNAMENT_RESULTS_BUTTON)
            .label("🏆 Tournament Results")
            .style(serenity::ButtonStyle::Primary),
        serenity::CreateButton::new(TOURNAMENT_TODAY_BUTTON)
            .label("📅 Tournament Today")
            .style(serenity::ButtonStyle::Primary),
    ])]
}

/// Post the Rematch HQ setup panel
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let member = ctx.author_member().await;
    let admin = is_admin(member.as_deref());

    let resolved = match ctx.guild_id() {
        Some(guild_id) if admin => {
            let configured = ctx
                .data()
                .settings
                .server(guild_id)
                .and_then(|server| server.setup_channel_id);
            resolve_guild_channel(ctx.http(), guild_id, configured).await
        }
        _ => None,
    };

    let channel_id = match setup_target(admin, resolved, ctx.channel_id()) {
        SetupTarget::Denied => {
            ctx.send(
                poise::CreateReply::default()
                    .content("Admins only.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
        SetupTarget::Post(channel_id) => channel_id,
    };

    ctx.defer_ephemeral().await?;

    let message = serenity::CreateMessage::new()
        .embed(panel_embed())
        .components(panel_components());

    let reply = match channel_id.send_message(ctx.http(), message).await {
        Ok(_) => {
            info!("Posted setup panel in channel {}", channel_id);
            format!("Posted in <#{}>.", channel_id)
        }
        Err(e) => {
            warn!("Failed to post setup panel in {}: {:?}", channel_id, e);
            format!("Couldn't post the panel in <#{}>: {}", channel_id, e)
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}
