#[macro_use]
mod macros;

pub mod cabinet;
pub mod cabset;
pub mod claimed;
pub mod directory;
pub mod error;
pub mod extract;
pub mod file;
pub mod flatten;
pub mod mode;
pub mod olestorage;
pub mod progress;
pub mod query;
pub mod streamname;
pub mod tablerow;
