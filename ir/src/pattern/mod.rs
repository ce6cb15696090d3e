mod matcher;

pub use matcher::{Match, find_matches};
