// Utility functions module
pub mod config;
pub mod discord;
pub mod emojis;
pub mod formatters;
pub mod icons;
