// Slash commands
pub mod setup;
