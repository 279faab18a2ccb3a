//! SeaORM entities. Every task row belongs to exactly one user row.

pub mod task;
pub mod user;
