use serde::{Deserialize, Serialize};
use sysgate_interpreter::{StructuredResult, SummaryData};

use crate::error::{ErrorKind, GatewayError};
use crate::gateway::MetricReport;

/// JSON body returned by the HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Output {
        success: bool,
        output: String,
        command: String,
    },
    Summary {
        success: bool,
        data: SummaryData,
        raw: String,
    },
    Failure {
        success: bool,
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stderr: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        blocked: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matched_pattern: Option<String>,
        kind: ErrorKind,
    },
}

impl ApiResponse {
    pub fn from_metric(report: &MetricReport) -> Self {
        match &report.summary {
            Some(data) => ApiResponse::Summary {
                success: true,
                data: data.clone(),
                raw: report.output.clone(),
            },
            None => ApiResponse::Output {
                success: true,
                output: report.output.clone(),
                command: report.command.clone(),
            },
        }
    }

    /// A delivered free-form result; blocked results become a denial.
    pub fn from_result(result: &StructuredResult) -> Self {
        if result.is_blocked() {
            return Self::denied(&result.blocked_reason, result.matched_pattern.as_deref());
        }
        ApiResponse::Output {
            success: true,
            output: result.raw_text.clone(),
            command: result.command.clone(),
        }
    }

    pub fn denied(reason: &str, matched_pattern: Option<&str>) -> Self {
        ApiResponse::Failure {
            success: false,
            error: reason.to_string(),
            stderr: None,
            blocked: Some(true),
            matched_pattern: matched_pattern.map(str::to_string),
            kind: ErrorKind::ValidationDenied,
        }
    }

    pub fn from_error(error: &GatewayError) -> Self {
        let stderr = match error {
            GatewayError::ExecutionFailed { stderr, .. } => Some(stderr.clone()),
            GatewayError::ExecutionTimedOut { .. } => Some(String::new()),
            _ => None,
        };
        ApiResponse::Failure {
            success: false,
            error: error.to_string(),
            stderr,
            blocked: None,
            matched_pattern: None,
            kind: error.kind(),
        }
    }

    /// Failure for a request that could not even be decoded.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiResponse::Failure {
            success: false,
            error: message.into(),
            stderr: None,
            blocked: None,
            matched_pattern: None,
            kind: ErrorKind::MalformedRequest,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, ApiResponse::Failure { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiResponse::Output { .. } | ApiResponse::Summary { .. } => 200,
            ApiResponse::Failure { kind, .. } if kind.is_client_error() => 400,
            ApiResponse::Failure {
                kind: ErrorKind::ValidationDenied,
                ..
            } => 403,
            ApiResponse::Failure { .. } => 500,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use sysgate_executor::ExitInfo;

    #[test]
    fn test_unknown_name_is_400_with_listing() {
        let error = GatewayError::UnknownCatalogName {
            name: "reboot".to_string(),
            available: "health, cpu".to_string(),
        };
        let response = ApiResponse::from_error(&error);
        assert_eq!(response.status_code(), 400);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Unknown command: reboot. Available: health, cpu");
        assert_eq!(json["kind"], "unknown_catalog_name");
        assert!(json.get("stderr").is_none());
    }

    #[test]
    fn test_empty_command_is_400() {
        let response = ApiResponse::from_error(&GatewayError::EmptyCommand);
        assert_eq!(response.status_code(), 400);
        assert_eq!(
            serde_json::to_value(&response).unwrap()["error"],
            "No command provided"
        );
    }

    #[test]
    fn test_denial_is_403() {
        let blocked =
            StructuredResult::blocked("q", "rm -rf /", "Blocked: rm").with_matched_pattern("rm ");
        let response = ApiResponse::from_result(&blocked);
        assert_eq!(response.status_code(), 403);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["blocked"], true);
        assert_eq!(json["matched_pattern"], "rm ");
        assert_eq!(json["kind"], "validation_denied");
    }

    #[test]
    fn test_malformed_request_is_400_with_own_kind() {
        let response = ApiResponse::bad_request("Invalid JSON body");
        assert_eq!(response.status_code(), 400);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "malformed_request");
        assert_eq!(json["error"], "Invalid JSON body");
    }

    #[test]
    fn test_agent_refusal_has_no_pattern() {
        let refused = StructuredResult::blocked("q", "rm -rf /", "destructive");
        let json = serde_json::to_value(ApiResponse::from_result(&refused)).unwrap();
        assert_eq!(json["blocked"], true);
        assert!(json.get("matched_pattern").is_none());
    }

    #[test]
    fn test_failure_carries_stderr() {
        let error = GatewayError::ExecutionFailed {
            command: "cat /proc/nope".to_string(),
            stderr: "No such file or directory".to_string(),
            exit_info: ExitInfo::Code(1),
        };
        let response = ApiResponse::from_error(&error);
        assert_eq!(response.status_code(), 500);
        assert_eq!(
            serde_json::to_value(&response).unwrap()["stderr"],
            "No such file or directory"
        );
    }

    #[test]
    fn test_timeout_is_500() {
        let error = GatewayError::ExecutionTimedOut {
            command: "sleep 60".to_string(),
            timeout_ms: 100,
        };
        assert_eq!(ApiResponse::from_error(&error).status_code(), 500);
    }

    #[test]
    fn test_untagged_round_trip_picks_variant() {
        let body = r#"{"success":true,"output":"up 3 days","command":"uptime"}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(parsed, ApiResponse::Output { .. }));

        let body = r#"{"success":true,"data":{"cpu":"1.0 %","memory":"2.0 %","disk":"3 %","uptime":"1d"},"raw":""}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(parsed, ApiResponse::Summary { .. }));
    }
}
