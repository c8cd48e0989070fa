#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use partner_schema_mock::{
	_preludet::*,
	callback::{CallbackAccessBridge, CallbackAuthentication, CallbackUrls, DEFAULT_CALLBACK_EXPIRES_IN},
	error::UpstreamError,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
};

const CLIENT_ID: &str = "partner-client";

fn authentication(token_url: Option<String>, secret: Option<&str>) -> CallbackAuthentication {
	CallbackAuthentication {
		grant_type: Some("authorization_code".into()),
		scope: Some("callback_access".into()),
		code: "partner-code".into(),
		client_id: CLIENT_ID.into(),
		client_secret: secret.map(Into::into),
		callback_urls: Some(CallbackUrls { oauth_token: token_url, state_callback: None }),
	}
}

#[tokio::test]
async fn exchange_uses_the_fallback_secret_and_default_lifetime() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "partner-code")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", "fallback-secret");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"partner-access\",\"token_type\":\"bearer\"}");
		})
		.await;
	let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client())
		.with_client_secret_fallback("fallback-secret");
	let envelope = bridge
		.grant_callback_access(authentication(Some(server.url("/oauth/token")), None), "req-42")
		.await
		.expect("Partner exchange should succeed.");

	mock.assert_async().await;

	let body = serde_json::to_value(&envelope).expect("Envelope should serialize.");

	assert_eq!(
		body,
		serde_json::json!({
			"headers": {
				"schema": "st-schema",
				"version": "1.0",
				"interactionType": "accessTokenResponse",
				"requestId": "req-42",
			},
			"callbackAuthentication": {
				"tokenType": "Bearer",
				"accessToken": "partner-access",
				"expiresIn": DEFAULT_CALLBACK_EXPIRES_IN,
			},
		})
	);
}

#[tokio::test]
async fn payload_secret_wins_and_refresh_tokens_pass_through() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").form_urlencoded_tuple("client_secret", "own-secret");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"a-1\",\"refresh_token\":\"r-1\",\"token_type\":\"bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client())
		.with_client_secret_fallback("fallback-secret");
	let envelope = bridge
		.grant_callback_access(
			authentication(Some(server.url("/oauth/token")), Some("own-secret")),
			"req-43",
		)
		.await
		.expect("Partner exchange should succeed.");

	mock.assert_calls_async(1).await;

	let tokens = &envelope.payload.callback_authentication;

	assert_eq!(tokens.access_token, "a-1");
	assert_eq!(tokens.refresh_token.as_deref(), Some("r-1"));
	assert_eq!(tokens.expires_in, 1800);
}

#[tokio::test]
async fn replies_without_token_type_are_accepted() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"a\",\"refresh_token\":\"r\",\"expires_in\":100}");
		})
		.await;
	let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client());
	let envelope = bridge
		.grant_callback_access(authentication(Some(server.url("/oauth/token")), Some("s")), "req-49")
		.await
		.expect("Any 2xx reply with an access token should succeed.");

	mock.assert_async().await;

	let tokens = &envelope.payload.callback_authentication;

	assert_eq!(tokens.token_type, "Bearer");
	assert_eq!(tokens.access_token, "a");
	assert_eq!(tokens.refresh_token.as_deref(), Some("r"));
	assert_eq!(tokens.expires_in, 100);
}

#[tokio::test]
async fn zero_lifetimes_fall_back_to_the_default() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"a\",\"expires_in\":0}");
		})
		.await;
	let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client());
	let envelope = bridge
		.grant_callback_access(authentication(Some(server.url("/oauth/token")), Some("s")), "req-50")
		.await
		.expect("Partner exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(envelope.payload.callback_authentication.expires_in, DEFAULT_CALLBACK_EXPIRES_IN);
}

#[tokio::test]
async fn partner_rejections_surface_as_upstream_failures() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"error_description\":\"bad secret\"}");
		})
		.await;
	let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client());
	let err = bridge
		.grant_callback_access(authentication(Some(server.url("/oauth/token")), Some("x")), "req-44")
		.await
		.expect_err("Partner rejection must fail the exchange.");

	mock.assert_async().await;

	match &err {
		Error::UpstreamTokenExchangeFailed { source: UpstreamError::ErrorResponse { error, status, .. } } => {
			assert_eq!(error, "invalid_client");
			assert_eq!(*status, Some(401));
		},
		other => panic!("Expected an upstream error response, got {other:?}."),
	}

	assert_eq!(err.http_status(), 500);
}

#[tokio::test]
async fn non_json_success_bodies_are_malformed() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body("{\"token_type\":\"bearer\"}");
		})
		.await;
	let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client());
	let err = bridge
		.grant_callback_access(authentication(Some(server.url("/oauth/token")), None), "req-45")
		.await
		.expect_err("Token responses without access_token must fail.");

	mock.assert_async().await;

	assert!(matches!(
		err,
		Error::UpstreamTokenExchangeFailed { source: UpstreamError::MalformedResponse { .. } }
	));
}

#[tokio::test]
async fn missing_or_blank_token_urls_are_rejected_before_any_request() {
	let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client());

	for token_url in [None, Some(String::new()), Some("  ".into())] {
		let err = bridge
			.grant_callback_access(authentication(token_url, None), "req-46")
			.await
			.expect_err("Exchange without a token URL must fail.");

		assert!(matches!(err, Error::MissingCallbackUrl));
	}
}

#[derive(Debug)]
enum FakeTransportError {
	Unreachable,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unreachable => write!(f, "Partner unreachable."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
struct FakeHttpClient {
	status: u16,
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, status: self.status }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	status: u16,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let status = self.status;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			slot.store(ResponseMetadata { status: Some(status) });

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Unreachable)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	metadata: Arc<Mutex<Vec<Option<ResponseMetadata>>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded_metadata(&self) -> Vec<Option<ResponseMetadata>> {
		self.metadata.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> UpstreamError {
		self.metadata.lock().push(meta.cloned());

		let message = match err {
			HttpClientError::Reqwest(inner) => format!("Fake transport error: {inner}"),
			other => format!("Fake transport error: {other}"),
		};

		UpstreamError::Unexpected { message, status: meta.and_then(|value| value.status) }
	}
}

#[tokio::test]
async fn custom_transports_surface_recorded_metadata() {
	let mapper = RecordingTransportErrorMapper::default();
	let bridge = CallbackAccessBridge::<FakeHttpClient>::with_transport(
		FakeHttpClient { status: 503 },
		Arc::new(mapper.clone()),
	);
	let err = bridge
		.grant_callback_access(
			authentication(Some("https://partner.example.com/oauth/token".into()), None),
			"req-47",
		)
		.await
		.expect_err("Fake transport always fails.");

	match err {
		Error::UpstreamTokenExchangeFailed { source } => {
			assert_eq!(source.status(), Some(503));
			assert!(source.to_string().contains("Partner unreachable"));
		},
		other => panic!("Expected an upstream failure, got {other:?}."),
	}

	let recorded = mapper.recorded_metadata();

	assert_eq!(recorded.len(), 1);
	assert_eq!(recorded[0].as_ref().and_then(|meta| meta.status), Some(503));
}

#[tokio::test]
async fn basic_mapper_reports_network_failures() {
	let bridge =
		CallbackAccessBridge::<FakeHttpClient>::with_basic_transport(FakeHttpClient { status: 502 });
	let err = bridge
		.grant_callback_access(
			authentication(Some("https://partner.example.com/oauth/token".into()), None),
			"req-48",
		)
		.await
		.expect_err("Fake transport always fails.");

	assert!(matches!(err, Error::UpstreamTokenExchangeFailed { source: UpstreamError::Transport(_) }));
}
