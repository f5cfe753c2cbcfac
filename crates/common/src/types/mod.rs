use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Health {
    pub status: String,
    pub version: String,
}

impl Health {
    pub fn ok(version: &str) -> Self {
        Self { status: "ok".into(), version: version.into() }
    }
}

/// Error envelope returned by every failing HTTP endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
