// External API clients
pub mod notion;
