// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /v1/conversation, GET /v1/leads, GET /health.

use std::str::FromStr;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use leadflow_core::types::{LeadFilter, TurnRequest};
use leadflow_core::{Lead, LeadflowError, Qualification};

use crate::server::GatewayState;

/// Response body for POST /v1/conversation.
///
/// The reply itself streams over the subscriber channel; this only
/// acknowledges that the turn was accepted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccepted {
    pub lead_id: String,
    pub status: String,
}

/// Query parameters for GET /v1/leads.
#[derive(Debug, Default, Deserialize)]
pub struct LeadsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Largest admin page size.
const MAX_PAGE_SIZE: i64 = 100;

/// One lead in the admin listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    pub id: String,
    pub email: String,
    pub qualification: Qualification,
    pub status: String,
    pub messages: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Lead> for LeadSummary {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id.to_string(),
            email: lead.email,
            qualification: lead.qualification,
            status: lead.status,
            messages: lead.chat_history.len(),
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

/// Response body for GET /v1/leads.
#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<LeadSummary>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /v1/conversation
///
/// Runs the synchronous phase of a turn (lead resolution, user-message
/// persistence, pipeline launch) and returns the lead id immediately.
pub async fn post_conversation(
    State(state): State<GatewayState>,
    Json(request): Json<TurnRequest>,
) -> Response {
    match state.orchestrator.handle_turn(request).await {
        Ok(receipt) => (
            StatusCode::ACCEPTED,
            Json(ConversationAccepted {
                lead_id: receipt.lead_id,
                status: "processing".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/leads
///
/// Admin listing with status/qualification filters and limit/offset
/// pagination.
pub async fn get_leads(
    State(state): State<GatewayState>,
    Query(query): Query<LeadsQuery>,
) -> Response {
    let qualification = match query.qualification.as_deref() {
        Some(raw) => match Qualification::from_str(raw) {
            Ok(q) => Some(q),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("unknown qualification `{raw}`"),
                    }),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let filter = LeadFilter {
        status: query.status,
        qualification,
        limit: query.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
        offset: query.offset.unwrap_or(0).max(0),
    };

    match state.storage.list_leads(&filter).await {
        Ok(leads) => Json(LeadListResponse {
            leads: leads.into_iter().map(LeadSummary::from).collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health (unauthenticated liveness)
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Maps the synchronous-phase error taxonomy to HTTP statuses.
fn status_for(error: &LeadflowError) -> StatusCode {
    match error {
        LeadflowError::InvalidLeadId(_) | LeadflowError::MissingEmail => {
            StatusCode::BAD_REQUEST
        }
        LeadflowError::LeadNotFound(_) => StatusCode::NOT_FOUND,
        LeadflowError::TurnInProgress(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: LeadflowError) -> Response {
    let status = status_for(&error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
