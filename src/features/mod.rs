// Interaction features behind the setup panel buttons
pub mod todays_tournaments;
pub mod tournament_results;

use poise::serenity_prelude as serenity;

use crate::utils::discord::ephemeral_message;
use crate::{Data, Error};

/// Custom ids are stable so panels posted before a restart keep working
pub const TOURNAMENT_RESULTS_BUTTON: &str = "rematchhq:tournament_results";
pub const TOURNAMENT_TODAY_BUTTON: &str = "rematchhq:tournament_today";
pub const TOURNAMENT_RESULTS_MODAL: &str = "rematchhq:tournament_results_modal";

/// Setup channel to point at when a panel button is clicked elsewhere
pub fn misplaced_panel(
    setup_channel: Option<serenity::ChannelId>,
    clicked_in: serenity::ChannelId,
) -> Option<serenity::ChannelId> {
    setup_channel.filter(|setup| *setup != clicked_in)
}

/// Route panel buttons and the results modal. Unknown custom ids are ignored.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    match interaction {
        serenity::Interaction::Component(component) => {
            let custom_id = component.data.custom_id.as_str();
            if custom_id != TOURNAMENT_RESULTS_BUTTON && custom_id != TOURNAMENT_TODAY_BUTTON {
                return Ok(());
            }
            let Some(guild_id) = component.guild_id else {
                component
                    .create_response(ctx, ephemeral_message("Run this in the server."))
                    .await?;
                return Ok(());
            };

            let setup_channel = data
                .settings
                .server(guild_id)
                .and_then(|server| server.setup_channel_id);
            if let Some(setup_channel) = misplaced_panel(setup_channel, component.channel_id) {
                component
                    .create_response(
                        ctx,
                        ephemeral_message(format!("Use this in <#{}>.", setup_channel)),
                    )
                    .await?;
                return Ok(());
            }

            if custom_id == TOURNAMENT_RESULTS_BUTTON {
                tournament_results::open_modal(ctx, component).await
            } else {
                todays_tournaments::handle_button(ctx, component, data).await
            }
        }
        serenity::Interaction::Modal(modal) if modal.data.custom_id == TOURNAMENT_RESULTS_MODAL => {
            tournament_results::handle_submit(ctx, modal, data).await
        }
        _ => Ok(()),
    }
}
