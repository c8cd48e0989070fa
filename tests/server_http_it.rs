#![cfg(feature = "server")]

// crates.io
use reqwest::{StatusCode, header, redirect::Policy};
use tokio::net::TcpListener;
// self
use partner_schema_mock::{
	_preludet::*,
	config::MockConfig,
	server::{self, AppState},
};

const REDIRECT_URI: &str = "https://partner.example.com/oauth/callback";

struct TestServer {
	base: String,
	client: ReqwestClient,
}
impl TestServer {
	async fn start() -> Self {
		let config = MockConfig { signing_secret: TEST_SIGNING_SECRET.into(), ..Default::default() };
		let state = AppState::from_config(&config).expect("App state should build from defaults.");
		let listener =
			TcpListener::bind("127.0.0.1:0").await.expect("Test listener should bind.");
		let addr = listener.local_addr().expect("Listener should expose its address.");

		tokio::spawn(server::serve(listener, state));

		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.timeout(StdDuration::from_secs(5))
			.build()
			.expect("Test client should build.");

		Self { base: format!("http://{addr}"), client }
	}

	fn url(&self, path: &str) -> String {
		format!("{}{path}", self.base)
	}
}

async fn json_body(response: reqwest::Response) -> JsonValue {
	let bytes = response.bytes().await.expect("Response body should be readable.");

	serde_json::from_slice(&bytes).expect("Response body should be JSON.")
}

#[tokio::test]
async fn health_reports_ok() {
	let server = TestServer::start().await;
	let response =
		server.client.get(server.url("/health")).send().await.expect("Health request should send.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn full_authorization_code_round_trip() {
	let server = TestServer::start().await;
	let page = server
		.client
		.get(server.url("/authorize"))
		.query(&[("client_id", "partner-client"), ("redirect_uri", REDIRECT_URI), ("state", "s-1")])
		.send()
		.await
		.expect("Login page request should send.");

	assert_eq!(page.status(), StatusCode::OK);

	let html = page.text().await.expect("Login page should be readable.");

	assert!(html.contains("name=\"username\""));
	assert!(html.contains("value=\"s-1\""));

	let login = server
		.client
		.post(server.url("/authorize"))
		.form(&[
			("username", "alice"),
			("password", "pw"),
			("client_id", "partner-client"),
			("redirect_uri", REDIRECT_URI),
			("state", "s-1"),
		])
		.send()
		.await
		.expect("Login submission should send.");

	assert_eq!(login.status(), StatusCode::FOUND);

	let location = login
		.headers()
		.get(header::LOCATION)
		.and_then(|value| value.to_str().ok())
		.map(|value| Url::parse(value).expect("Location should be absolute."))
		.expect("Redirect should carry a Location header.");
	let code = location
		.query_pairs()
		.find(|(key, _)| key == "code")
		.map(|(_, value)| value.into_owned())
		.expect("Location should carry a code.");

	assert!(location.as_str().starts_with(REDIRECT_URI));
	assert!(location.query_pairs().any(|(key, value)| key == "state" && value == "s-1"));

	let exchange = || {
		server
			.client
			.post(server.url("/token"))
			.form(&[("grant_type", "authorization_code"), ("code", code.as_str())])
			.send()
	};
	let tokens = exchange().await.expect("Token request should send.");

	assert_eq!(tokens.status(), StatusCode::OK);

	let tokens = json_body(tokens).await;

	assert_eq!(tokens["token_type"], "Bearer");
	assert_eq!(tokens["expires_in"], 3600);

	let replay = exchange().await.expect("Replay request should send.");

	assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(replay).await, serde_json::json!({ "error": "invalid_grant" }));

	let access_token = tokens["access_token"].as_str().expect("Access token should be a string.");
	let identity = server
		.client
		.get(server.url("/userinfo"))
		.bearer_auth(access_token)
		.send()
		.await
		.expect("Userinfo request should send.");

	assert_eq!(identity.status(), StatusCode::OK);
	assert_eq!(
		json_body(identity).await,
		serde_json::json!({ "sub": "alice", "name": "alice", "email": "alice@example.com" })
	);
}

#[tokio::test]
async fn token_endpoint_reports_oauth_errors() {
	let server = TestServer::start().await;
	let unknown = server
		.client
		.post(server.url("/token"))
		.form(&[("grant_type", "authorization_code"), ("code", "never-issued")])
		.send()
		.await
		.expect("Token request should send.");
	let missing = server
		.client
		.post(server.url("/token"))
		.header(header::CONTENT_TYPE, "application/json")
		.body("{\"code\":\"never-issued\"}")
		.send()
		.await
		.expect("Token request should send.");

	assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(unknown).await, serde_json::json!({ "error": "invalid_grant" }));
	assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(missing).await, serde_json::json!({ "error": "missing_grant_type" }));
}

#[tokio::test]
async fn userinfo_requires_a_valid_bearer_token() {
	let server = TestServer::start().await;
	let anonymous =
		server.client.get(server.url("/userinfo")).send().await.expect("Request should send.");
	let forged = server
		.client
		.get(server.url("/userinfo"))
		.bearer_auth("not-a-jwt")
		.send()
		.await
		.expect("Request should send.");

	assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(json_body(anonymous).await, serde_json::json!({ "error": "missing_token" }));
	assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(json_body(forged).await, serde_json::json!({ "error": "invalid_token" }));
}

#[tokio::test]
async fn interaction_endpoint_dispatches_partner_requests() {
	let server = TestServer::start().await;
	let post = |body: &'static str| {
		server
			.client
			.post(server.url("/interaction"))
			.header(header::CONTENT_TYPE, "application/json")
			.body(body)
			.send()
	};
	let discovery = post(r#"{"headers":{"interactionType":"discoveryRequest","requestId":"r1"}}"#)
		.await
		.expect("Discovery should send.");

	assert_eq!(discovery.status(), StatusCode::OK);

	let discovery = json_body(discovery).await;

	assert_eq!(discovery["headers"]["interactionType"], "discoveryResponse");
	assert_eq!(discovery["devices"][0]["externalDeviceId"], "partner-device-id-1");

	let bogus = post(r#"{"headers":{"interactionType":"bogus","requestId":"r2"}}"#)
		.await
		.expect("Bogus request should send.");

	assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);
	assert_eq!(
		json_body(bogus).await,
		serde_json::json!({ "error": "unsupported interactionType: bogus" })
	);
}

#[tokio::test]
async fn callback_echoes_query_parameters() {
	let server = TestServer::start().await;
	let response = server
		.client
		.get(server.url("/callback"))
		.query(&[("code", "abc"), ("state", "xyz")])
		.send()
		.await
		.expect("Callback request should send.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, serde_json::json!({ "code": "abc", "state": "xyz" }));
}
