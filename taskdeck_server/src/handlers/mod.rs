pub mod tasks;
pub mod user;
