use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Graph-level failure bubbling up from the IR crate.
    #[snafu(transparent)]
    Ir { source: splice_ir::Error },

    /// The target backend lacks an operation the pipeline rewrites into.
    /// Raised at pipeline entry, before any graph is touched.
    #[snafu(display("backend `{backend}` does not provide required op `{op}`"))]
    UnsupportedConfiguration { backend: String, op: String },

    /// Asked to evaluate a kind the registry never registered.
    #[snafu(display("no registered evaluator for `{kind}`"))]
    UnknownPrepackOp { kind: String },

    /// A prepack node's input count disagrees with its registry entry.
    #[snafu(display("`{kind}` expects {expected} inputs, found {actual}"))]
    PrepackArity { kind: String, expected: usize, actual: usize },

    /// A prepack evaluator received a literal of the wrong type.
    #[snafu(display("`{kind}` input {index}: expected {expected}"))]
    BadPrepackInput { kind: String, index: usize, expected: &'static str },
}
