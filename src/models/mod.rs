// Data models
pub mod guild;
pub mod tournament;
