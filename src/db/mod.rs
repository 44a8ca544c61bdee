mod article;
mod core;
mod schema;

pub use core::Database;
