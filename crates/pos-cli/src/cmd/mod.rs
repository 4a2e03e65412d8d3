pub mod config;
pub mod init;
pub mod kitchen;
pub mod serve;
pub mod user;
pub mod workflows;
