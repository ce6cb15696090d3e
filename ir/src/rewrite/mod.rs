mod engine;

pub use engine::{SubgraphRewriter, ValueMapping};
