//! Error taxonomy for a play session
//!
//! Generator failures are fatal for the session. Operator interrupts are not
//! errors at all; they surface as `Ending::Interrupted`.

use thiserror::Error;

/// Failures talking to the narrative generator or reading its reply
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The request never completed (DNS, connect, timeout, reset)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("generator returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but carried no message content. `raw` is the
    /// response body, which may hold an embedded `error` object.
    #[error("generator returned no content")]
    EmptyReply { raw: String },

    /// The reply is not a structurally valid scene
    #[error("malformed generator reply: {reason}")]
    Malformed { raw: String, reason: String },
}

impl GeneratorError {
    /// Text worth keeping in an error artifact
    pub fn artifact_body(&self) -> String {
        match self {
            GeneratorError::Malformed { raw, reason } => {
                format!("{}\n\n--- parse error ---\n{}\n", raw, reason)
            }
            GeneratorError::EmptyReply { raw } => {
                format!("{}\n\n--- response body ---\n{}\n", self, raw)
            }
            other => format!("{}\n", other),
        }
    }
}

/// Anything that ends a session with a non-zero exit
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
