//! Submission input contract.
//!
//! A submission names a target (`url`) and the kind of document wanted
//! (`type`), optionally refined by free-text `instructions`. The content is
//! opaque here: only presence is checked.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Raw submission payload as received from a client.
///
/// Every field is optional so that an incomplete payload still deserializes
/// and can be reported with the full list of missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionInput {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl SubmissionInput {
    pub fn new(url: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            kind: Some(kind.into()),
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Check required fields and produce a request for the external operation.
    ///
    /// Blank strings count as missing. All missing fields are reported at once.
    pub fn validate(self) -> DomainResult<ExtractionRequest> {
        let url = present(self.url);
        let kind = present(self.kind);

        match (url, kind) {
            (Some(url), Some(kind)) => Ok(ExtractionRequest {
                url,
                kind,
                instructions: present(self.instructions),
            }),
            (url, kind) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("url");
                }
                if kind.is_none() {
                    missing.push("type");
                }
                Err(DomainError::missing_fields(missing))
            }
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A validated request handed to the external operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}
