use serde::{Deserialize, Serialize};

/// Request payload for /ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question about one or more members.
    pub question: String,
}

/// Response payload for /ask.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}
