use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Malformed pattern text.
    #[snafu(display("parse error at {line}:{column}: {message}"))]
    Parse { message: String, line: usize, column: usize },

    /// A statement references a value name that has not been defined yet.
    #[snafu(display("parse error at {line}:{column}: `%{name}` used before definition"))]
    UndefinedValue { name: String, line: usize, column: usize },

    /// A value name is defined twice in the same pattern.
    #[snafu(display("parse error at {line}:{column}: duplicate definition of `%{name}`"))]
    DuplicateValue { name: String, line: usize, column: usize },

    /// The return statement names a value the pattern never defined.
    #[snafu(display("parse error at {line}:{column}: `%{name}` returned but never defined"))]
    UndeclaredReturn { name: String, line: usize, column: usize },

    /// A replacement pattern input has no binding in the source pattern.
    #[snafu(display("replacement input `%{name}` is not bound by the source pattern"))]
    UnboundPatternName { name: String },

    /// Source and replacement patterns disagree on output count.
    #[snafu(display("output arity mismatch: source pattern returns {before}, replacement returns {after}"))]
    OutputArityMismatch { before: usize, after: usize },

    /// A use record points at a dead or absent node.
    #[snafu(display("dangling use: value {value} is used by dead node {node}"))]
    DanglingUse { value: u32, node: u32 },

    /// A value's recorded producer does not exist or does not list it.
    #[snafu(display("missing definition: value {value} has no live producer"))]
    MissingDefinition { value: u32 },

    /// A node consumes a value whose use list does not mention it.
    #[snafu(display("use not recorded: node {node} operand {operand} reads value {value} without a use entry"))]
    UseNotRecorded { node: u32, operand: usize, value: u32 },

    /// A node reads a value produced later in the topological order.
    #[snafu(display("use before definition: node {node} reads value {value} defined after it"))]
    UseBeforeDefinition { node: u32, value: u32 },

    /// `destroy_node` called while an output still has consumers.
    #[snafu(display("node {node} still used: output value {value} has {uses} remaining uses"))]
    NodeStillUsed { node: u32, value: u32, uses: usize },
}
