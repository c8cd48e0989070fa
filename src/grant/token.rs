//! `/token` operation: single-use authorization code redemption.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	grant::AuthorizationCodeFlow,
	obs::{self, OpKind},
	store::{CodeRedemption, GrantRecord},
};

/// The only grant type the mock accepts.
pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Token endpoint request body.
#[derive(Clone, Default, Deserialize)]
pub struct TokenRequest {
	/// Requested grant type.
	#[serde(default)]
	pub grant_type: Option<String>,
	/// Authorization code being redeemed.
	#[serde(default)]
	pub code: Option<String>,
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequest")
			.field("grant_type", &self.grant_type)
			.field("code_set", &self.code.is_some())
			.finish()
	}
}

/// Access/refresh pair returned by a successful exchange.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
	/// Signed bearer token.
	#[serde(serialize_with = "expose_secret")]
	pub access_token: TokenSecret,
	/// Always `Bearer`.
	pub token_type: &'static str,
	/// Access token lifetime in seconds.
	pub expires_in: i64,
	/// Opaque refresh token.
	#[serde(serialize_with = "expose_secret")]
	pub refresh_token: TokenSecret,
}

impl AuthorizationCodeFlow {
	/// Redeems `code` for a token pair; the code is consumed exactly once.
	///
	/// Grant-type validation runs before the store is touched, so malformed requests never
	/// consume a code or mint a token.
	pub async fn exchange_code(&self, request: TokenRequest) -> Result<TokenPair> {
		obs::observe(OpKind::TokenExchange, "exchange_code", async move {
			match request.grant_type.as_deref() {
				None | Some("") => return Err(Error::MissingGrantType),
				Some(AUTHORIZATION_CODE_GRANT) => {},
				Some(other) =>
					return Err(Error::UnsupportedGrantType { grant_type: other.to_owned() }),
			}

			let Some(code) = request.code.as_deref().filter(|code| !code.is_empty()) else {
				return Err(Error::InvalidGrant { reason: "code is missing".into() });
			};
			let now = OffsetDateTime::now_utc();
			let record = match self.store.take_code(code, now).await? {
				CodeRedemption::Redeemed(record) => record,
				CodeRedemption::Expired =>
					return Err(Error::InvalidGrant { reason: "code expired".into() }),
				CodeRedemption::Missing =>
					return Err(Error::InvalidGrant { reason: "code is unknown or redeemed".into() }),
			};
			let ttl = self.settings.access_token_ttl;
			let access_token = self.signer().sign(&record.subject, now, ttl)?;
			let refresh_token = TokenSecret::generate();

			self.store
				.save_grant(GrantRecord {
					subject: record.subject,
					client_id: record.client_id,
					access_token: access_token.clone(),
					refresh_token: refresh_token.clone(),
					issued_at: now,
					expires_at: now + ttl,
				})
				.await?;

			Ok(TokenPair {
				access_token,
				token_type: "Bearer",
				expires_in: ttl.whole_seconds(),
				refresh_token,
			})
		})
		.await
	}
}

fn expose_secret<S>(secret: &TokenSecret, serializer: S) -> Result<S::Ok, S::Error>
where
	S: serde::Serializer,
{
	serializer.serialize_str(secret.expose())
}
