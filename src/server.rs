//! axum surface over the grant flow and the interaction dispatcher.
//!
//! Handlers translate HTTP into core calls and core errors into `{ "error": ... }` bodies; no
//! protocol logic lives here.

// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header},
	response::{Html, IntoResponse, Response},
	routing::{get, post},
};
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	callback::CallbackAccessBridge,
	config::MockConfig,
	device::DeviceRegistry,
	grant::{AuthorizationCodeFlow, LoginSubmission, TokenRequest},
	http::ReqwestHttpClient,
	interaction::InteractionDispatcher,
	store::{MemoryStore, TokenStore},
};

/// Shared handles injected into every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Local authorization-code grant.
	pub flow: Arc<AuthorizationCodeFlow>,
	/// Partner interaction dispatcher.
	pub dispatcher: Arc<InteractionDispatcher<ReqwestHttpClient>>,
}
impl AppState {
	/// Wires an in-memory store, the default car registry, and the reqwest bridge from
	/// `config`.
	pub fn from_config(config: &MockConfig) -> Result<Self> {
		let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
		let flow =
			AuthorizationCodeFlow::new(store, config.signer()).with_settings(config.grant_settings());
		let registry = DeviceRegistry::with_default_car(config.state_source()?)?
			.with_refresh_timeout(config.state_timeout());
		let mut bridge = CallbackAccessBridge::new(config.upstream_timeout())?;

		if let Some(secret) = &config.partner_client_secret {
			bridge = bridge.with_client_secret_fallback(secret);
		}

		let dispatcher = InteractionDispatcher::new(Arc::new(registry), bridge)
			.with_command_settings(config.command_settings());

		Ok(Self { flow: Arc::new(flow), dispatcher: Arc::new(dispatcher) })
	}
}

#[derive(Debug, Default, Deserialize)]
struct AuthorizeQuery {
	#[serde(default)]
	client_id: String,
	#[serde(default)]
	redirect_uri: String,
	#[serde(default)]
	state: Option<String>,
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/authorize", get(authorize_page).post(authorize_submit))
		.route("/token", post(token))
		.route("/userinfo", get(userinfo))
		.route("/interaction", post(interaction))
		.route("/callback", get(callback_echo))
		.route("/health", get(health))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Serves `state` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
	axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

/// Installs the global `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for the shutdown signal");

		std::future::pending::<()>().await;
	}

	tracing::info!("shutting down");
}

async fn authorize_page(
	State(state): State<AppState>,
	Query(query): Query<AuthorizeQuery>,
) -> Response {
	match state.flow.begin_authorization(
		&query.client_id,
		&query.redirect_uri,
		query.state.as_deref(),
	) {
		Ok(challenge) => Html(challenge.render_html()).into_response(),
		Err(e) => error_response(&e),
	}
}

async fn authorize_submit(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let submission = match parse_body::<LoginSubmission>(&headers, &body) {
		Ok(submission) => submission,
		Err(e) => return error_response(&e),
	};

	match state.flow.submit_credentials(submission).await {
		Ok(redirect) => (StatusCode::FOUND, [(header::LOCATION, redirect.to_string())]).into_response(),
		Err(e) => error_response(&e),
	}
}

async fn token(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
	let request = match parse_body::<TokenRequest>(&headers, &body) {
		Ok(request) => request,
		Err(e) => return error_response(&e),
	};

	match state.flow.exchange_code(request).await {
		Ok(pair) => Json(pair).into_response(),
		Err(e) => error_response(&e),
	}
}

async fn userinfo(State(state): State<AppState>, headers: HeaderMap) -> Response {
	let authorization =
		headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok());

	match state.flow.introspect(authorization) {
		Ok(identity) => Json(identity).into_response(),
		Err(e) => error_response(&e),
	}
}

async fn interaction(State(state): State<AppState>, body: Bytes) -> Response {
	let reply = state.dispatcher.dispatch(&body).await;

	(status_code(reply.status), Json(reply.body)).into_response()
}

async fn callback_echo(Query(params): Query<BTreeMap<String, String>>) -> Json<BTreeMap<String, String>> {
	Json(params)
}

async fn health() -> Json<JsonValue> {
	Json(serde_json::json!({ "status": "ok" }))
}

fn parse_body<T>(headers: &HeaderMap, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned + Default,
{
	if body.is_empty() {
		return Ok(T::default());
	}

	let is_json = headers
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.starts_with("application/json"));
	let parsed = if is_json {
		serde_json::from_slice(body)
	} else {
		let fields = form_urlencoded::parse(body)
			.map(|(key, value)| (key.into_owned(), JsonValue::String(value.into_owned())))
			.collect::<JsonMap<_, _>>();

		serde_json::from_value(JsonValue::Object(fields))
	};

	parsed.map_err(|e| Error::InvalidRequest { reason: e.to_string() })
}

fn error_response(err: &Error) -> Response {
	let status = status_code(err.http_status());

	if status.is_server_error() {
		tracing::error!(error = %err, "request failed");
	}

	(status, Json(serde_json::json!({ "error": err.oauth_code() }))).into_response()
}

fn status_code(status: u16) -> StatusCode {
	StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
