#![cfg(feature = "reqwest")]

// self
use partner_schema_mock::{
	_preludet::*,
	grant::{AUTHORIZATION_CODE_GRANT, GrantSettings, LoginSubmission, TokenRequest},
	store::{TokenKind, TokenStore},
};

const CLIENT_ID: &str = "partner-client";
const REDIRECT_URI: &str = "https://partner.example.com/oauth/callback?tenant=t1";

fn submission(state: Option<&str>) -> LoginSubmission {
	LoginSubmission {
		username: "alice".into(),
		password: "hunter2".into(),
		client_id: CLIENT_ID.into(),
		redirect_uri: REDIRECT_URI.into(),
		state: state.map(Into::into),
	}
}

fn code_from(redirect: &Url) -> String {
	redirect
		.query_pairs()
		.find(|(key, _)| key == "code")
		.map(|(_, value)| value.into_owned())
		.expect("Redirect should carry an authorization code.")
}

fn exchange(code: &str) -> TokenRequest {
	TokenRequest { grant_type: Some(AUTHORIZATION_CODE_GRANT.into()), code: Some(code.into()) }
}

#[tokio::test]
async fn login_redirect_keeps_query_and_echoes_state() {
	let (flow, store) = build_test_flow();
	let redirect = flow
		.submit_credentials(submission(Some("xyz")))
		.await
		.expect("Valid credentials should mint a code.");
	let pairs: Vec<(String, String)> = redirect.query_pairs().into_owned().collect();

	assert_eq!(redirect.host_str(), Some("partner.example.com"));
	assert_eq!(pairs[0], ("tenant".into(), "t1".into()));
	assert_eq!(pairs[1].0, "code");
	assert_eq!(pairs[2], ("state".into(), "xyz".into()));
	assert_eq!(store.pending_codes(), 1);
}

#[tokio::test]
async fn empty_state_is_not_echoed() {
	let (flow, _) = build_test_flow();
	let redirect =
		flow.submit_credentials(submission(Some(""))).await.expect("Login should succeed.");

	assert!(redirect.query_pairs().all(|(key, _)| key != "state"));
}

#[tokio::test]
async fn missing_credentials_mint_nothing() {
	let (flow, store) = build_test_flow();
	let mut blank_password = submission(None);

	blank_password.password.clear();

	let err = flow
		.submit_credentials(blank_password)
		.await
		.expect_err("Missing password must be rejected.");

	assert!(matches!(err, Error::MissingCredentials));
	assert_eq!(err.http_status(), 400);
	assert_eq!(store.pending_codes(), 0);
}

#[tokio::test]
async fn any_non_empty_pair_mints_a_code() {
	let (flow, store) = build_test_flow();
	let mut anonymous_client = submission(None);

	anonymous_client.client_id.clear();

	let mut spaced_client = submission(None);

	spaced_client.client_id = "partner client".into();

	let mut blank_username = submission(None);

	blank_username.username = "   ".into();

	for login in [anonymous_client, spaced_client] {
		let redirect = flow.submit_credentials(login).await.expect("Client id is never required.");
		let code = code_from(&redirect);
		let pair = flow.exchange_code(exchange(&code)).await.expect("Code should exchange.");
		let binding = store
			.lookup_token(pair.access_token.expose())
			.await
			.expect("Lookup should succeed.")
			.expect("Access token should be recorded.");

		assert!(binding.client_id.is_none());
	}

	let redirect = flow
		.submit_credentials(blank_username)
		.await
		.expect("Whitespace usernames are still non-empty.");
	let pair =
		flow.exchange_code(exchange(&code_from(&redirect))).await.expect("Code should exchange.");
	let identity = flow
		.introspect(Some(&format!("Bearer {}", pair.access_token.expose())))
		.expect("Token should introspect.");

	assert_eq!(identity.sub, "   ");
}

#[tokio::test]
async fn codes_exchange_exactly_once() {
	let (flow, store) = build_test_flow();
	let redirect = flow.submit_credentials(submission(None)).await.expect("Login should succeed.");
	let code = code_from(&redirect);
	let pair = flow.exchange_code(exchange(&code)).await.expect("First exchange should succeed.");

	assert_eq!(pair.token_type, "Bearer");
	assert_eq!(pair.expires_in, GrantSettings::DEFAULT_ACCESS_TOKEN_TTL.whole_seconds());
	assert_eq!(store.pending_codes(), 0);

	let binding = store
		.lookup_token(pair.refresh_token.expose())
		.await
		.expect("Lookup should succeed.")
		.expect("Refresh token should be recorded.");

	assert_eq!(binding.kind, TokenKind::Refresh);
	assert_eq!(binding.subject.as_ref(), "alice");
	assert_eq!(binding.client_id.as_deref(), Some(CLIENT_ID));

	let err = flow.exchange_code(exchange(&code)).await.expect_err("Replay must be rejected.");

	assert!(matches!(err, Error::InvalidGrant { .. }));
	assert_eq!(err.oauth_code(), "invalid_grant");
}

#[tokio::test]
async fn concurrent_exchanges_have_one_winner() {
	let (flow, _) = build_test_flow();
	let flow = Arc::new(flow);
	let redirect = flow.submit_credentials(submission(None)).await.expect("Login should succeed.");
	let code = code_from(&redirect);
	let tasks: Vec<_> = (0..8)
		.map(|_| {
			let flow = flow.clone();
			let request = exchange(&code);

			tokio::spawn(async move { flow.exchange_code(request).await })
		})
		.collect();
	let mut winners = 0;

	for task in tasks {
		match task.await.expect("Exchange task should not panic.") {
			Ok(_) => winners += 1,
			Err(e) => assert!(matches!(e, Error::InvalidGrant { .. })),
		}
	}

	assert_eq!(winners, 1);
}

#[tokio::test]
async fn bad_grant_types_leave_the_code_redeemable() {
	let (flow, store) = build_test_flow();
	let redirect = flow.submit_credentials(submission(None)).await.expect("Login should succeed.");
	let code = code_from(&redirect);
	let missing = flow
		.exchange_code(TokenRequest { grant_type: None, code: Some(code.clone()) })
		.await
		.expect_err("Missing grant type must be rejected.");
	let unsupported = flow
		.exchange_code(TokenRequest {
			grant_type: Some("client_credentials".into()),
			code: Some(code.clone()),
		})
		.await
		.expect_err("Unsupported grant type must be rejected.");

	assert!(matches!(missing, Error::MissingGrantType));
	assert!(
		matches!(unsupported, Error::UnsupportedGrantType { ref grant_type } if grant_type == "client_credentials")
	);
	assert_eq!(unsupported.oauth_code(), "unsupported_grant_type");
	assert_eq!(store.pending_codes(), 1);
	assert!(flow.exchange_code(exchange(&code)).await.is_ok());
}

#[tokio::test]
async fn expired_codes_are_invalid_grants() {
	let (flow, store) = build_test_flow();
	let flow = flow.with_settings(GrantSettings { code_ttl: Duration::ZERO, ..Default::default() });
	let redirect = flow.submit_credentials(submission(None)).await.expect("Login should succeed.");
	let err = flow
		.exchange_code(exchange(&code_from(&redirect)))
		.await
		.expect_err("Expired code must be rejected.");

	assert!(matches!(err, Error::InvalidGrant { .. }));
	assert_eq!(store.pending_codes(), 0);
}

#[tokio::test]
async fn unknown_codes_are_invalid_grants() {
	let (flow, _) = build_test_flow();
	let err = flow
		.exchange_code(exchange("never-issued"))
		.await
		.expect_err("Unknown code must be rejected.");

	assert_eq!(err.http_status(), 400);
	assert_eq!(err.oauth_code(), "invalid_grant");
}

#[tokio::test]
async fn issued_access_tokens_introspect_to_the_subject() {
	let (flow, _) = build_test_flow();
	let redirect = flow.submit_credentials(submission(None)).await.expect("Login should succeed.");
	let pair =
		flow.exchange_code(exchange(&code_from(&redirect))).await.expect("Exchange should succeed.");
	let identity = flow
		.introspect(Some(&format!("Bearer {}", pair.access_token.expose())))
		.expect("Fresh token should introspect.");

	assert_eq!(identity.sub, "alice");
	assert_eq!(identity.name, "alice");
	assert_eq!(identity.email, "alice@example.com");

	let err = flow
		.introspect(Some(&format!("Bearer {}", pair.refresh_token.expose())))
		.expect_err("Refresh tokens are not bearer tokens.");

	assert_eq!(err.http_status(), 401);
}
