//! Review domain actions - business logic functions called from the HTTP layer.

mod submit_review;

pub use submit_review::submit_review;
