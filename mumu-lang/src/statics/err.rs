use std::fmt;
use thiserror::Error;

#[derive(Error, Clone, Debug)]
pub enum UnifyError {
    #[error("type {lhs} occurs in {rhs}")]
    Occurs { lhs: String, rhs: String },
    #[error("{lhs} and {rhs} have different type constructors")]
    Mismatch { lhs: String, rhs: String },
}

/// A unification failure wrapped with the syntax element being typed.
#[derive(Error, Clone, Debug)]
#[error("while typing {context}: {cause}")]
pub struct TyckError {
    pub context: String,
    pub cause: UnifyError,
}

/// Everything the typer found in one pass over the program.
#[derive(Clone, Debug)]
pub struct TyckErrors(pub Vec<TyckError>);

impl fmt::Display for TyckErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.0.as_slice() {
            return write!(f, "{}", single);
        }
        // With multiple errors, each one gets its own line.
        for err in &self.0 {
            write!(f, "\n{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for TyckErrors {}
