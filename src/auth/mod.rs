pub mod middleware;
pub mod password;
pub mod service;
pub mod token;
