pub mod time_entry;
pub mod user;
