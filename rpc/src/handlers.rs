//! HTTP handlers.
//!
//! Request field names (`ehrId`, `patient`, `targetD`, `counterParty`,
//! `attachmentId`) follow the web client the API was first written for.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use ehr_flows::FlowOutcome;
use ehr_node::{Notice, NodeStatus};
use ehr_store::AgreementRecord;
use ehr_types::{AgreementId, AttachmentRef, Party, StateAndRef};
use serde::{Deserialize, Serialize};

use crate::error::{ApiResult, RpcError};
use crate::pagination::{paginate, PaginationMeta, PaginationParams};
use crate::state::AppState;

fn parse_id(raw: &str) -> ApiResult<AgreementId> {
    raw.parse()
        .map_err(|_| RpcError::BadRequest(format!("invalid agreement id: {raw}")))
}

fn parse_attachment(raw: &str) -> ApiResult<AttachmentRef> {
    raw.parse()
        .map_err(|_| RpcError::BadRequest(format!("invalid attachment hash: {raw}")))
}

// ── Views ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartyView {
    pub name: String,
    pub key: String,
}

impl From<&Party> for PartyView {
    fn from(party: &Party) -> Self {
        Self {
            name: party.name.to_string(),
            key: party.key.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgreementView {
    pub id: String,
    pub version: u64,
    pub status: String,
    pub origin: PartyView,
    pub target: PartyView,
    pub patient: PartyView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "attachmentId", skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl From<&StateAndRef> for AgreementView {
    fn from(v: &StateAndRef) -> Self {
        let s = &v.state;
        Self {
            id: s.id.to_string(),
            version: v.reference.version,
            status: s.status.to_string(),
            origin: (&s.origin).into(),
            target: (&s.target).into(),
            patient: (&s.subject).into(),
            note: s.note.clone(),
            attachment: s.attachment.map(|a| a.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionView {
    #[serde(flatten)]
    pub agreement: AgreementView,
    pub produced_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_by: Option<String>,
    pub recorded_at: u64,
}

impl From<&AgreementRecord> for VersionView {
    fn from(r: &AgreementRecord) -> Self {
        Self {
            agreement: (&r.version).into(),
            produced_by: r.produced_by.to_string(),
            consumed_by: r.consumed_by.map(|t| t.to_string()),
            recorded_at: r.recorded_at.as_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlowResponse {
    pub transaction: String,
    #[serde(rename = "ehrId")]
    pub ehr_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub message: String,
}

impl FlowResponse {
    fn committed(outcome: FlowOutcome, what: &str) -> Self {
        Self {
            transaction: outcome.transition.to_string(),
            ehr_id: outcome.agreement.to_string(),
            status: outcome.produced.map(|v| v.state.status.to_string()),
            message: format!(
                "Transaction id {} committed to ledger. EHR {} {what}",
                outcome.transition, outcome.agreement
            ),
        }
    }
}

// ── Node ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub me: PartyView,
}

pub async fn me(State(state): State<AppState>) -> Json<MeResponse> {
    Json(MeResponse {
        me: state.node.me().into(),
    })
}

pub async fn status(State(state): State<AppState>) -> ApiResult<Json<NodeStatus>> {
    Ok(Json(state.node.status()?))
}

pub async fn inbox(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.node.inbox())
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if !state.node.config().enable_metrics {
        return Err(RpcError::NotFound("metrics are disabled".into()));
    }
    let text = state
        .node
        .metrics()
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}

// ── Queries ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AgreementPage {
    pub ehrs: Vec<AgreementView>,
    #[serde(skip_deserializing)]
    pub pagination: Option<PaginationMeta>,
}

pub async fn list_ehrs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<AgreementPage>> {
    let (page, meta) = paginate(state.node.list()?, &params)?;
    Ok(Json(AgreementPage {
        ehrs: page.iter().map(AgreementView::from).collect(),
        pagination: Some(meta),
    }))
}

pub async fn get_ehr(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgreementView>> {
    let current = state.node.get(parse_id(&id)?)?;
    Ok(Json((&current).into()))
}

pub async fn ehr_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<VersionView>>> {
    let history = state.node.history(parse_id(&id)?)?;
    Ok(Json(history.iter().map(VersionView::from).collect()))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PartyView>> {
    Ok(Json((&state.node.subject(parse_id(&id)?)?).into()))
}

pub async fn get_origin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PartyView>> {
    Ok(Json((&state.node.origin(parse_id(&id)?)?).into()))
}

pub async fn get_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PartyView>> {
    Ok(Json((&state.node.target(parse_id(&id)?)?).into()))
}

// ── Flows ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestBody {
    pub patient: String,
    #[serde(rename = "targetD")]
    pub target: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "attachmentId", default)]
    pub attachment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    #[serde(rename = "ehrId")]
    pub ehr_id: String,
    #[serde(rename = "targetD")]
    pub target: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CounterpartyBody {
    #[serde(rename = "ehrId")]
    pub ehr_id: String,
    #[serde(rename = "counterParty")]
    pub counterparty: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareBody {
    #[serde(rename = "ehrId")]
    pub ehr_id: String,
    pub patient: String,
    #[serde(rename = "targetD")]
    pub target: String,
}

fn attachment_of(body: &RequestBody) -> ApiResult<Option<AttachmentRef>> {
    body.attachment
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(parse_attachment)
        .transpose()
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<RequestBody>,
) -> ApiResult<Json<FlowResponse>> {
    let attachment = attachment_of(&body)?;
    let outcome = state
        .node
        .create(&body.patient, &body.target, body.note, attachment)
        .await?;
    Ok(Json(FlowResponse::committed(outcome, "created")))
}

pub async fn request(
    State(state): State<AppState>,
    Json(body): Json<RequestBody>,
) -> ApiResult<Json<FlowResponse>> {
    let attachment = attachment_of(&body)?;
    let outcome = state
        .node
        .request(&body.patient, &body.target, body.note, attachment)
        .await?;
    Ok(Json(FlowResponse::committed(outcome, "requested")))
}

pub async fn approve(
    State(state): State<AppState>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<FlowResponse>> {
    let outcome = state.node.approve(parse_id(&body.ehr_id)?, &body.target).await?;
    Ok(Json(FlowResponse::committed(outcome, "approved")))
}

pub async fn activate(
    State(state): State<AppState>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<FlowResponse>> {
    let outcome = state.node.activate(parse_id(&body.ehr_id)?, &body.target).await?;
    Ok(Json(FlowResponse::committed(outcome, "activated")))
}

pub async fn suspend(
    State(state): State<AppState>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<FlowResponse>> {
    let outcome = state.node.suspend(parse_id(&body.ehr_id)?, &body.target).await?;
    Ok(Json(FlowResponse::committed(outcome, "suspended")))
}

pub async fn reject(
    State(state): State<AppState>,
    Json(body): Json<CounterpartyBody>,
) -> ApiResult<Json<FlowResponse>> {
    let outcome = state
        .node
        .reject(parse_id(&body.ehr_id)?, &body.counterparty)
        .await?;
    Ok(Json(FlowResponse::committed(outcome, "rejected")))
}

pub async fn delete(
    State(state): State<AppState>,
    Json(body): Json<CounterpartyBody>,
) -> ApiResult<Json<FlowResponse>> {
    let outcome = state
        .node
        .delete(parse_id(&body.ehr_id)?, &body.counterparty)
        .await?;
    Ok(Json(FlowResponse::committed(outcome, "deleted")))
}

pub async fn share(
    State(state): State<AppState>,
    Json(body): Json<ShareBody>,
) -> ApiResult<Json<FlowResponse>> {
    let outcome = state
        .node
        .share(parse_id(&body.ehr_id)?, &body.patient, &body.target)
        .await?;
    Ok(Json(FlowResponse::committed(outcome, "shared")))
}

// ── Attachments ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentResponse {
    pub hash: String,
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<AttachmentResponse>)> {
    if body.is_empty() {
        return Err(RpcError::BadRequest("attachment body is empty".into()));
    }
    let reference = state.node.upload(body.to_vec()).await?;
    Ok((
        StatusCode::CREATED,
        Json(AttachmentResponse {
            hash: reference.to_string(),
        }),
    ))
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let content = state.node.download(&parse_attachment(&hash)?).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{hash}\""),
        ),
    ];
    Ok((headers, content))
}
