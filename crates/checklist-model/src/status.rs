use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome recorded for one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ALERT")]
    Alert,
    #[serde(rename = "FAIL")]
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status must be OK, ALERT or FAIL (got `{0}`)")]
pub struct ParseStatusError(pub String);

impl Status {
    pub const ALL: [Status; 3] = [Status::Ok, Status::Alert, Status::Fail];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Alert => "ALERT",
            Status::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    /// Case-insensitive. Older workbooks carry the Portuguese `ALERTA`/`FALHA`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "ALERT" | "ALERTA" => Ok(Status::Alert),
            "FAIL" | "FALHA" => Ok(Status::Fail),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}
