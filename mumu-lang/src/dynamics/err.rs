use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A second run is an error rather than a silent reset: the fresh-id
    /// counters advance during a run.
    #[error("interpreter has already run")]
    AlreadyRun,
    /// Should never be raised for a typechecked program.
    #[error("no reduction or focusing rule found for statement:\n{statement}")]
    StuckComputation { statement: String },
}
