pub mod time_entry;
