use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaperSiftError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal: no paper survived across every batch of the run.
    #[error("Nothing extracted: 0 papers survived from {messages} messages ({failed_batches} of {batches} batches failed)")]
    NothingExtracted {
        messages: usize,
        batches: usize,
        failed_batches: usize,
    },
}

pub type Result<T> = std::result::Result<T, PaperSiftError>;
