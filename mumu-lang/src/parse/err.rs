use thiserror::Error;

/// Names of syntax elements, used as error context.
pub mod what {
    pub const VARIABLE: &str = "variable";
    pub const VALUE: &str = "value";
    pub const MU: &str = "mu abstraction";
    pub const MU_TILDE: &str = "mu' abstraction";
    pub const CONSTRUCTOR: &str = "constructor";
    pub const COCASE: &str = "cocase expression";
    pub const COVARIABLE: &str = "covariable";
    pub const DESTRUCTOR: &str = "destructor";
    pub const CASE: &str = "case expression";
    pub const END: &str = "end of computation";
    pub const ARITHMETIC: &str = "arithmetic statement";
    pub const IFZ: &str = "if-zero statement";
    pub const CUT: &str = "cut statement";
    pub const CALL: &str = "call statement";
    pub const PRODUCER: &str = "producer";
    pub const CONSUMER: &str = "consumer";
    pub const STATEMENT: &str = "statement";
    pub const DEFINITION: &str = "definition";
    pub const DEF_OR_STMT: &str = "definition or statement";
    pub const CLAUSE: &str = "clause";
    pub const CASE_CLAUSE: &str = "case clause";
    pub const COCASE_CLAUSE: &str = "cocase clause";
    pub const PARAMETER: &str = "parameter";
    pub const COPARAMETER: &str = "coparameter";
    pub const ARGUMENT: &str = "argument";
    pub const COARGUMENT: &str = "coargument";
}

#[derive(Error, Clone, Debug)]
#[error("on line {cause_line}, while parsing a {context} (starting on line {context_line}): {kind}")]
pub struct ParseError {
    pub cause_line: usize,
    pub context_line: usize,
    pub context: String,
    pub kind: ParseErrorKind,
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected '{0}'")]
    UnexpectedToken(String),
    #[error("unknown {kind}: {name}")]
    UnknownName { kind: &'static str, name: String },
    #[error("{polarity} mismatch: {name} expects {expected}, got {actual}")]
    ArityMismatch { polarity: &'static str, name: String, expected: usize, actual: usize },
    #[error("repeated definition of {0}")]
    DuplicateDefinition(String),
    #[error("{0} is a reserved name")]
    ReservedName(String),
    #[error("empty clause list")]
    EmptyClauseList,
    #[error("duplicate or mismatched structor: {0}")]
    MismatchedClause(String),
    #[error("incomplete clause list")]
    IncompleteClauses,
    #[error("invalid integer literal: {0}")]
    InvalidIntLiteral(String),
}
