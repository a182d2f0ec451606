//! Route groups mounted under `/api`.

pub mod images;
pub mod notes;
pub mod user;
