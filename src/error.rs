use thiserror::Error;

/// Errors surfaced by the pipeline stages.
///
/// Unparseable individual values are not errors: they become null markers and
/// are dropped (and counted) by whichever stage needs them. Only conditions
/// that leave a stage unable to produce a table at all end up here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {0}")]
    MissingFile(String),

    #[error("failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("processed table has no column named `{0}`")]
    SchemaMismatch(String),

    #[error("no usable rows: {0}")]
    EmptyTable(String),

    #[error("model training failed: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
