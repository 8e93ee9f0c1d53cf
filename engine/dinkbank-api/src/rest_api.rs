//! REST API endpoints
//!
//! Read endpoints expose the player table, player profiles and tiered payout
//! ladders. The two submission endpoints screen, validate and log form
//! posts; nothing is persisted.

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;
use crate::submissions::{ContactSubmission, CorrectionSubmission};
use earnings_engine::{
    ContractTier, EventType, FilterCriteria, Gender, PageSpec, PayoutModel, QueryResult,
    SortSpec, TieredLadder, Timeframe, Tour,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Reply};

/// Body returned by the submission endpoints
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct SubmissionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl SubmissionResponse {
    pub fn accepted() -> Self {
        Self { ok: true, ..Default::default() }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self { ok: false, error: Some(message.into()), errors: None }
    }

    pub fn fields(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self { ok: false, error: None, errors: Some(errors) }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Query parameters of `GET /api/players`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersParams {
    pub timeframe: Option<String>,
    pub gender: Option<String>,
    pub tour: Option<String>,
    pub tier: Option<String>,
    pub search: Option<String>,
    pub year: Option<i32>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Treat empty and `all` selections as "no filter"
fn parse_filter<T: FromStr>(raw: &Option<String>) -> Result<Option<T>, T::Err> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

impl PlayersParams {
    pub fn timeframe(&self) -> ApiResult<Timeframe> {
        match self.timeframe.as_deref().map(str::trim) {
            None | Some("") => Ok(Timeframe::default()),
            Some(raw) => raw.parse::<Timeframe>().map_err(ApiError::from),
        }
    }

    pub fn criteria(&self) -> ApiResult<FilterCriteria> {
        Ok(FilterCriteria {
            gender: parse_filter::<Gender>(&self.gender)?,
            tour: parse_filter::<Tour>(&self.tour)?,
            contract_tier: parse_filter::<ContractTier>(&self.tier)?,
            search: self.search.clone(),
            year: self.year,
        })
    }

    pub fn sort(&self) -> SortSpec {
        SortSpec::parse(
            self.sort.as_deref().unwrap_or("total"),
            self.dir.as_deref().unwrap_or("desc"),
        )
    }

    pub fn page(&self) -> PageSpec {
        PageSpec::new(self.page.unwrap_or(1), self.page_size.unwrap_or(0))
    }
}

/// Query parameters of `GET /api/payouts`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutParams {
    pub tour: String,
    pub tier: Option<String>,
    pub event_type: Option<String>,
}

/// Tour payout ladders evaluated at a tier
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutsResponse {
    pub tour: Tour,
    pub tier: ContractTier,
    pub model: PayoutModel,
    pub ladders: Vec<TieredLadder>,
}

/// Resolve the address a request is rate limited under
pub fn resolve_client(
    remote: Option<SocketAddr>,
    forwarded_for: Option<&str>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let first = forwarded_for.and_then(|header| header.split(',').next()).map(str::trim);
        if let Some(client) = first.filter(|client| !client.is_empty()) {
            return client.to_string();
        }
    }

    remote.map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string())
}

fn client_address(
    trust_forwarded_for: bool,
) -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::addr::remote().and(warp::header::optional::<String>("x-forwarded-for")).map(
        move |remote: Option<SocketAddr>, forwarded: Option<String>| {
            resolve_client(remote, forwarded.as_deref(), trust_forwarded_for)
        },
    )
}

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

/// Rate limit, screen and validate a contact form post
pub async fn process_contact(
    state: &ApiState,
    client: &str,
    body: &[u8],
    now_ms: i64,
) -> ApiResult<ContactSubmission> {
    state.rate_limiter.check(client).await?;

    let submission: ContactSubmission = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?;

    submission.screen(now_ms, &state.config.submissions)?;
    submission.validate().map_err(ApiError::Validation)?;

    Ok(submission)
}

fn contact_error_reply(err: &ApiError) -> Response {
    match err {
        ApiError::RateLimited { retry_after_secs } => {
            let body = SubmissionResponse::message("Too many requests. Please try again later.");
            warp::reply::with_header(
                warp::reply::with_status(warp::reply::json(&body), StatusCode::TOO_MANY_REQUESTS),
                "retry-after",
                retry_after_secs.to_string(),
            )
            .into_response()
        }
        ApiError::SpamDetected(_) => json_reply(
            &SubmissionResponse::message("Submission rejected. Please try again."),
            StatusCode::BAD_REQUEST,
        ),
        ApiError::Validation(errors) => {
            let message = errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Invalid submission".to_string());
            json_reply(&SubmissionResponse::message(message), StatusCode::BAD_REQUEST)
        }
        ApiError::BadRequest(_) => {
            let body = SubmissionResponse::message("Invalid request body");
            json_reply(&body, StatusCode::BAD_REQUEST)
        }
        other => json_reply(
            &SubmissionResponse::message("Internal server error"),
            other.status_code(),
        ),
    }
}

/// `POST /api/contact`
pub async fn submit_contact(
    client: String,
    body: Bytes,
    state: Arc<ApiState>,
) -> Result<Response, Infallible> {
    let now_ms = chrono::Utc::now().timestamp_millis();

    match process_contact(&state, &client, &body, now_ms).await {
        Ok(submission) => {
            info!(
                client = %client,
                name = %submission.name,
                email = %submission.email,
                category = %submission.category,
                subject = %submission.subject,
                message = %submission.message,
                "Contact submission received"
            );
            Ok(json_reply(&SubmissionResponse::accepted(), StatusCode::OK))
        }
        Err(err) => {
            warn!(client = %client, reason = %err, "Contact submission rejected");
            Ok(contact_error_reply(&err))
        }
    }
}

/// Validate a correction report
pub fn process_correction(state: &ApiState, body: &[u8]) -> ApiResult<CorrectionSubmission> {
    let submission: CorrectionSubmission = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?;

    submission.validate(&state.config.submissions).map_err(ApiError::Validation)?;

    Ok(submission)
}

/// `POST /api/corrections`
pub async fn submit_correction(
    client: String,
    body: Bytes,
    state: Arc<ApiState>,
) -> Result<Response, Infallible> {
    match process_correction(&state, &body) {
        Ok(submission) => {
            info!(
                client = %client,
                player = ?submission.player_slug,
                event = ?submission.event_slug,
                field = %submission.field,
                current = ?submission.current_value,
                proposed = %submission.proposed_value,
                sources = ?submission.source_urls,
                reporter = ?submission.reporter_email,
                notes = ?submission.notes,
                "Correction report received"
            );
            Ok(json_reply(&SubmissionResponse::accepted(), StatusCode::OK))
        }
        Err(ApiError::Validation(errors)) => {
            warn!(client = %client, errors = errors.len(), "Correction report failed validation");
            Ok(json_reply(&SubmissionResponse::fields(errors.flatten()), StatusCode::BAD_REQUEST))
        }
        Err(err) => {
            warn!(client = %client, reason = %err, "Correction report rejected");
            Ok(json_reply(&SubmissionResponse::message("Invalid request body"), err.status_code()))
        }
    }
}

/// Rank, filter, sort and page the player table
pub fn players_page(state: &ApiState, params: &PlayersParams) -> ApiResult<QueryResult> {
    let timeframe = params.timeframe()?;
    let criteria = params.criteria()?;
    let rows = state.dataset.rows(timeframe);
    Ok(state.planner.query(&rows, &criteria, &params.sort(), &params.page()))
}

/// `GET /api/players`
pub async fn get_players(
    params: PlayersParams,
    state: Arc<ApiState>,
) -> Result<Response, warp::Rejection> {
    let result = players_page(&state, &params).map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&result).into_response())
}

/// `GET /api/players/{slug}`
pub async fn get_player_profile(
    slug: String,
    state: Arc<ApiState>,
) -> Result<Response, warp::Rejection> {
    let profile =
        state.dataset.profile(&slug).map_err(|e| warp::reject::custom(ApiError::from(e)))?;
    Ok(warp::reply::json(&profile).into_response())
}

/// Evaluate a tour's payout ladders at a tier
pub fn payout_ladders(state: &ApiState, params: &PayoutParams) -> ApiResult<PayoutsResponse> {
    let tour: Tour = params.tour.parse()?;
    let tier = parse_filter::<ContractTier>(&params.tier)?.unwrap_or(ContractTier::Gold);
    let event_type = parse_filter::<EventType>(&params.event_type)?;

    let ladders = state
        .dataset
        .payout_tables(Some(tour))
        .into_iter()
        .map(|table| state.calculator.ladder(table, tier, event_type))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PayoutsResponse { tour, tier, model: PayoutModel::for_tour(tour), ladders })
}

/// `GET /api/payouts`
pub async fn get_payouts(
    params: PayoutParams,
    state: Arc<ApiState>,
) -> Result<Response, warp::Rejection> {
    let response = payout_ladders(&state, &params).map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&response).into_response())
}

/// Map rejections to JSON error responses
pub async fn handle_rejection(err: warp::Rejection) -> Result<impl Reply, Infallible> {
    let (status, code, message) = if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status_code(), api_error.code(), api_error.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, "INVALID_QUERY", e.to_string())
    } else if let Some(e) = err.find::<warp::reject::PayloadTooLarge>() {
        (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", e.to_string())
    } else if let Some(e) = err.find::<warp::reject::LengthRequired>() {
        (StatusCode::LENGTH_REQUIRED, "LENGTH_REQUIRED", e.to_string())
    } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, "CORS_FORBIDDEN", e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED", "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error".to_string())
    };

    let body = ErrorResponse {
        error: ErrorDetail { code: code.to_string(), message, details: None },
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// Create all routes
pub fn create_routes(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let max_body_bytes = state.config.server.max_body_bytes;
    let client = client_address(state.config.server.trust_forwarded_for);
    let state_filter = warp::any().map(move || state.clone());
    let body = warp::body::content_length_limit(max_body_bytes).and(warp::body::bytes());

    // Contact form
    let contact = warp::path!("api" / "contact")
        .and(warp::post())
        .and(client.clone())
        .and(body.clone())
        .and(state_filter.clone())
        .and_then(submit_contact);

    // Correction reports
    let corrections = warp::path!("api" / "corrections")
        .and(warp::post())
        .and(client)
        .and(body)
        .and(state_filter.clone())
        .and_then(submit_correction);

    // Player table
    let players = warp::path!("api" / "players")
        .and(warp::get())
        .and(warp::query::<PlayersParams>())
        .and(state_filter.clone())
        .and_then(get_players);

    // Player profile
    let profile = warp::path!("api" / "players" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_player_profile);

    // Tiered payout ladders
    let payouts = warp::path!("api" / "payouts")
        .and(warp::get())
        .and(warp::query::<PayoutParams>())
        .and(state_filter)
        .and_then(get_payouts);

    // Health check endpoint
    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    });

    contact
        .or(corrections)
        .or(players)
        .or(profile)
        .or(payouts)
        .or(health)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_headers(vec!["content-type"])
                .allow_methods(vec!["GET", "POST", "OPTIONS"]),
        )
        .recover(handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::{json, Value};

    fn test_state() -> Arc<ApiState> {
        let mut config = ApiConfig::default();
        config.engine.current_season = 2025;
        Arc::new(ApiState::new(config).unwrap())
    }

    fn contact_body() -> Value {
        json!({
            "name": "Dana Reyes",
            "email": "dana@example.com",
            "category": "data",
            "subject": "Missing payout",
            "message": "The Atlanta slam doubles payout is missing.",
            "consent": true,
            "company": "",
            "renderedAt": chrono::Utc::now().timestamp_millis() - 10_000
        })
    }

    fn correction_body() -> Value {
        json!({
            "playerSlug": "mara-lindqvist",
            "field": "prize",
            "proposedValue": "$27,500",
            "sourceUrls": ["https://example.com/results"],
            "humanCheck": "7"
        })
    }

    fn body_json(response: &warp::http::Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    async fn post(state: &Arc<ApiState>, path: &str, body: &Value) -> warp::http::Response<Bytes> {
        warp::test::request()
            .method("POST")
            .path(path)
            .remote_addr("203.0.113.9:5000".parse().unwrap())
            .json(body)
            .reply(&create_routes(state.clone()))
            .await
    }

    async fn get(state: &Arc<ApiState>, path: &str) -> warp::http::Response<Bytes> {
        warp::test::request().method("GET").path(path).reply(&create_routes(state.clone())).await
    }

    #[tokio::test]
    async fn test_contact_accepted() {
        let state = test_state();
        let response = post(&state, "/api/contact", &contact_body()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response), json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_contact_honeypot_rejected() {
        let state = test_state();
        let mut body = contact_body();
        body["company"] = json!("Acme Bots");

        let response = post(&state, "/api/contact", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["ok"], json!(false));
    }

    #[tokio::test]
    async fn test_contact_too_fast_rejected() {
        let state = test_state();
        let mut body = contact_body();
        body["renderedAt"] = json!(chrono::Utc::now().timestamp_millis() - 500);

        let response = post(&state, "/api/contact", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contact_out_of_range_render_time_rejected() {
        let state = test_state();
        let mut body = contact_body();
        body["renderedAt"] = json!(i64::MIN);

        let response = post(&state, "/api/contact", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["ok"], json!(false));
    }

    #[tokio::test]
    async fn test_contact_validation_returns_first_message() {
        let state = test_state();
        let mut body = contact_body();
        body["email"] = json!("nope");
        body["message"] = json!("short");

        let response = post(&state, "/api/contact", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["error"], json!("Please enter a valid email address"));
    }

    #[tokio::test]
    async fn test_contact_rate_limited_after_five() {
        let state = test_state();
        for _ in 0..5 {
            let response = post(&state, "/api/contact", &contact_body()).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = post(&state, "/api/contact", &contact_body()).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
    }

    #[tokio::test]
    async fn test_correction_accepted_and_rejected() {
        let state = test_state();
        let response = post(&state, "/api/corrections", &correction_body()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = correction_body();
        body["humanCheck"] = json!("8");
        body["sourceUrls"] = json!([]);
        let response = post(&state, "/api/corrections", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(&response);
        assert_eq!(json["ok"], json!(false));
        assert_eq!(json["errors"]["humanCheck"], json!(["Incorrect answer"]));
        assert!(json["errors"]["sourceUrls"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let state = test_state();
        let response = warp::test::request()
            .method("POST")
            .path("/api/corrections")
            .body("{not json")
            .reply(&create_routes(state.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_players_tour_filter_overrides_sort() {
        let state = test_state();
        let response = get(&state, "/api/players?tour=MLP&sort=total&dir=asc&pageSize=100").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(&response);
        assert_eq!(json["sortColumn"], json!("mlp"));
        assert_eq!(json["sortDirection"], json!("desc"));

        let mlp: Vec<u64> =
            json["rows"].as_array().unwrap().iter().map(|r| r["mlp"].as_u64().unwrap()).collect();
        assert!(!mlp.is_empty());
        assert!(mlp.iter().all(|earnings| *earnings > 0));
        assert!(mlp.windows(2).all(|pair| pair[0] >= pair[1]));
        assert_eq!(json["rows"][0]["rank"], json!(1));
    }

    #[tokio::test]
    async fn test_players_pagination_and_year() {
        let state = test_state();
        let response = get(&state, "/api/players?page=2&pageSize=5&year=2022").await;
        let json = body_json(&response);
        assert_eq!(json["totalCount"], json!(16));
        assert_eq!(json["totalPages"], json!(4));
        assert_eq!(json["rows"].as_array().unwrap().len(), 5);
        assert_eq!(json["rows"][0]["rank"], json!(6));

        let top = get(&state, "/api/players?pageSize=1&year=2022").await;
        // 412_500 * 40%
        assert_eq!(body_json(&top)["rows"][0]["total"], json!(165_000));
    }

    #[tokio::test]
    async fn test_players_bad_filter_values() {
        let state = test_state();
        let response = get(&state, "/api/players?tier=diamond").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["error"]["code"], json!("BAD_REQUEST"));

        let response = get(&state, "/api/players?page=abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&state, "/api/players?gender=all&tier=").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(&state, "/api/players?timeframe=weekly").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&response)["error"]["message"],
            json!("Invalid request: Unknown timeframe: weekly")
        );
    }

    #[tokio::test]
    async fn test_players_extreme_year_is_floored() {
        let state = test_state();
        let response = get(&state, "/api/players?pageSize=1&year=-2147483648").await;
        assert_eq!(response.status(), StatusCode::OK);
        // 412_500 * 20%
        assert_eq!(body_json(&response)["rows"][0]["total"], json!(82_500));
    }

    #[tokio::test]
    async fn test_player_profile() {
        let state = test_state();
        let response = get(&state, "/api/players/jonah-okafor").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["ytdRank"], json!(2));

        let response = get(&state, "/api/players/nobody").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payout_ladders() {
        let state = test_state();
        let response = get(&state, "/api/payouts?tour=PPA&tier=standard").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(&response);
        assert_eq!(json["ladders"][0]["eventClass"], json!("Slam"));
        assert_eq!(json["ladders"][0]["rows"][0]["amount"], json!(20_000));

        let response = get(&state, "/api/payouts?tour=PPA&tier=diamond").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&state, "/api/payouts?tour=XYZ").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_method_not_allowed() {
        let state = test_state();
        assert_eq!(get(&state, "/health").await.status(), StatusCode::OK);
        assert_eq!(get(&state, "/api/contact").await.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(get(&state, "/nowhere").await.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_resolve_client() {
        let remote: Option<SocketAddr> = Some("198.51.100.4:443".parse().unwrap());
        assert_eq!(resolve_client(remote, Some("10.0.0.1, 10.0.0.2"), false), "198.51.100.4");
        assert_eq!(resolve_client(remote, Some("10.0.0.1, 10.0.0.2"), true), "10.0.0.1");
        assert_eq!(resolve_client(remote, Some(" "), true), "198.51.100.4");
        assert_eq!(resolve_client(None, None, true), "unknown");
    }
}
