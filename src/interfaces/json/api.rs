use serde::{Deserialize, Serialize};

use crate::application::engine::SettlementEngine;
use crate::domain::escrow::ReleaseType;
use crate::error::SettlementError;
use crate::interfaces::json::command_reader::SettlementCommand;

/// Body of a release call, as the external transport delivers it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEscrowRequest {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub release_type: Option<ReleaseType>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub performed_by_user_id: Option<String>,
}

/// Body of a refund call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundEscrowRequest {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub performed_by_user_id: Option<String>,
}

/// The `{ success, message | error }` response envelope, plus the
/// HTTP-equivalent status for whatever transport mounts the engine.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub status: u16,
}

impl SettlementResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            status: 200,
        }
    }

    pub fn from_error(err: &SettlementError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(err.to_string()),
            status: err.status_code(),
        }
    }
}

/// Boundary between the JSON contract and the engine: validates and
/// defaults request fields, and folds engine results into the envelope.
pub struct SettlementApi {
    engine: SettlementEngine,
}

impl SettlementApi {
    pub fn new(engine: SettlementEngine) -> Self {
        Self { engine }
    }

    pub async fn release_escrow(&self, request: ReleaseEscrowRequest) -> SettlementResponse {
        let release_type = request.release_type.unwrap_or(ReleaseType::ManualBuyer);
        let result = self
            .engine
            .release(
                &request.order_id,
                release_type,
                request.notes.as_deref(),
                request.performed_by_user_id.as_deref(),
            )
            .await;

        match result {
            Ok(outcome) => SettlementResponse::ok(format!(
                "Escrow released. Vendor {} credited {}.",
                outcome.vendor_id, outcome.amount
            )),
            Err(err) => SettlementResponse::from_error(&err),
        }
    }

    pub async fn refund_escrow(&self, request: RefundEscrowRequest) -> SettlementResponse {
        let result = self
            .engine
            .refund(
                &request.order_id,
                request.reason.as_deref(),
                request.performed_by_user_id.as_deref(),
            )
            .await;

        match result {
            Ok(outcome) => SettlementResponse::ok(format!(
                "Escrow refunded. Order {} cancelled.",
                outcome.order_id
            )),
            Err(err) => SettlementResponse::from_error(&err),
        }
    }

    pub async fn handle(&self, command: SettlementCommand) -> SettlementResponse {
        match command {
            SettlementCommand::Release(request) => self.release_escrow(request).await,
            SettlementCommand::Refund(request) => self.refund_escrow(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_request_decodes_camel_case() {
        let request: ReleaseEscrowRequest = serde_json::from_str(
            r#"{"orderId":"O1","releaseType":"manual_buyer","notes":"Confirmed","performedByUserId":"U9"}"#,
        )
        .unwrap();

        assert_eq!(request.order_id, "O1");
        assert_eq!(request.release_type, Some(ReleaseType::ManualBuyer));
        assert_eq!(request.notes.as_deref(), Some("Confirmed"));
        assert_eq!(request.performed_by_user_id.as_deref(), Some("U9"));
    }

    #[test]
    fn test_request_tolerates_missing_fields() {
        // A body with no orderId still decodes; the engine rejects it with
        // InvalidArgument so the caller gets the envelope, not a parse error.
        let request: ReleaseEscrowRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.order_id, "");
        assert_eq!(request.release_type, None);
    }

    #[test]
    fn test_envelope_shapes() {
        let ok = SettlementResponse::ok("done");
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"success":true,"message":"done"}"#
        );

        let err = SettlementResponse::from_error(&SettlementError::NotFound("Vendor"));
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"success":false,"error":"Vendor not found"}"#
        );
        assert_eq!(err.status, 404);
    }
}
