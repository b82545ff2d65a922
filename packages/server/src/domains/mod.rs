// Domain modules

pub mod reviews;
