pub mod revocation;
pub mod time_entries;
pub mod users;
