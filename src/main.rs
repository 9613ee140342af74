// Rematch HQ Bot
// Tournament results and today's tournaments for Rematch community servers

mod api;
mod commands;
mod features;
mod models;
mod utils;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::notion::NotionClient;
use crate::features::todays_tournaments::{spawn_daily_post, TournamentLookup};
use crate::utils::config::Settings;

/// User data shared across all commands and handlers
pub struct Data {
    pub settings: Arc<Settings>,
    pub tournaments: Option<Arc<TournamentLookup>>,
}

// Manual Debug impl since the Notion client holds a token
impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("servers", &self.settings.servers.len())
            .field("tournaments", &self.tournaments.is_some())
            .finish()
    }
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all slash commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![commands::setup::setup()]
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Startup failed: {:?}", error);
            std::process::exit(1);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .content(format!("Something went wrong: {}", error))
                        .ephemeral(true),
                )
                .await;
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error while handling {}: {:?}", event.snake_case_name(), error);
        }
        err => {
            if let Err(e) = poise::builtins::on_error(err).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::InteractionCreate { interaction } = event {
        features::handle_interaction(ctx, interaction, data).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables first so RUST_LOG can live in .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "rematch_hq_bot=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!("Fatal: {:#}", e);
        std::process::exit(1);
    }

    info!("Goodbye!");
}

async fn run() -> anyhow::Result<()> {
    let settings = Arc::new(Settings::load()?);
    info!(
        "Starting Rematch HQ Bot with {} configured server(s)...",
        settings.servers.len()
    );

    // Build HTTP client for API calls
    let http_client = reqwest::Client::builder()
        .user_agent("RematchHQ-Bot/1.0")
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")?;

    let tournaments = match &settings.notion {
        Some(notion) => {
            info!("Notion tournament lookup enabled");
            Some(Arc::new(TournamentLookup {
                notion: NotionClient::new(http_client, notion.token.clone()),
                database_id: notion.database_id.clone(),
            }))
        }
        None => {
            info!("Notion not configured, tournament lookup disabled");
            None
        }
    };

    let framework_settings = settings.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                let settings = framework_settings;
                info!("Logged in as {}", ready.user.name);

                if !settings.sync_commands_on_startup {
                    info!("Skipping slash command sync (SYNC_COMMANDS_ON_STARTUP is off)");
                } else if let Some(guild_id) = settings.guild_id {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Commands registered in guild {}", guild_id);
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Commands registered globally (may take a while to show up)");
                }

                match (settings.daily_post_hour, &tournaments) {
                    (Some(hour), Some(lookup)) => {
                        spawn_daily_post(ctx.http.clone(), settings.clone(), lookup.clone(), hour);
                        info!("Daily tournaments post scheduled at {:02}:00 Paris time", hour);
                    }
                    (Some(_), None) => info!("Daily tournaments post needs Notion, not scheduled"),
                    _ => {}
                }

                Ok(Data {
                    settings,
                    tournaments,
                })
            })
        })
        .build();

    // Slash commands and component interactions only need the GUILDS intent
    let intents = serenity::GatewayIntents::GUILDS;

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .context("Failed to create client")?;

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    client.start().await.context("Client error")?;
    Ok(())
}
