//! Callback access bridge: redeems a partner-issued authorization code at the partner's own
//! token endpoint and answers with an `accessTokenResponse` envelope.
//!
//! The bridge never talks to this crate's authorization server. Every failure past input
//! validation is reported as [`Error::UpstreamTokenExchangeFailed`]; the real cause is logged
//! through [`obs::warn_upstream_failure`] and kept as the error's source.

// self
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};
use crate::{
	_prelude::*,
	http::TokenHttpClient,
	interaction::{AccessTokenPayload, Envelope, InteractionType},
	oauth::{BasicTransportErrorMapper, PartnerTokenEndpoint, TransportErrorMapper},
	obs::{self, OpKind},
};

/// Lifetime reported when the partner omits `expires_in` or reports zero.
pub const DEFAULT_CALLBACK_EXPIRES_IN: u64 = 86_400;

/// Partner callback endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackUrls {
	/// Partner token endpoint the code is redeemed at.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub oauth_token: Option<String>,
	/// Partner endpoint for asynchronous state callbacks.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state_callback: Option<String>,
}
impl CallbackUrls {
	/// Field-wise merge where `self` wins over `fallback`.
	pub fn merge(self, fallback: Self) -> Self {
		Self {
			oauth_token: self.oauth_token.or(fallback.oauth_token),
			state_callback: self.state_callback.or(fallback.state_callback),
		}
	}
}

/// `callbackAuthentication` block of a `grantCallbackAccess` request; never persisted.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackAuthentication {
	/// Grant type requested by the partner; the bridge always uses `authorization_code`.
	#[serde(default)]
	pub grant_type: Option<String>,
	/// Requested scope, informational only.
	#[serde(default)]
	pub scope: Option<String>,
	/// Partner-issued authorization code.
	#[serde(default)]
	pub code: String,
	/// Client identifier registered with the partner.
	#[serde(default)]
	pub client_id: String,
	/// Client secret registered with the partner.
	#[serde(default)]
	pub client_secret: Option<String>,
	/// Partner callback endpoints.
	#[serde(default)]
	pub callback_urls: Option<CallbackUrls>,
}
impl CallbackAuthentication {
	fn token_url(&self) -> Option<&str> {
		self.callback_urls
			.as_ref()
			.and_then(|urls| urls.oauth_token.as_deref())
			.filter(|url| !url.trim().is_empty())
	}
}
impl Debug for CallbackAuthentication {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackAuthentication")
			.field("grant_type", &self.grant_type)
			.field("scope", &self.scope)
			.field("code_set", &!self.code.is_empty())
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_urls", &self.callback_urls)
			.finish()
	}
}

/// Tokens returned to the partner inside an `accessTokenResponse`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackTokens {
	/// Always `Bearer`.
	pub token_type: &'static str,
	/// Access token issued by the partner.
	pub access_token: String,
	/// Refresh token issued by the partner, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// Access token lifetime in seconds.
	pub expires_in: u64,
}
impl Debug for CallbackTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackTokens")
			.field("token_type", &self.token_type)
			.field("access_token", &"<redacted>")
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Performs the outbound `authorization_code` exchange for `grantCallbackAccess`.
pub struct CallbackAccessBridge<C>
where
	C: ?Sized + TokenHttpClient,
{
	http_client: Arc<C>,
	error_mapper: Arc<dyn TransportErrorMapper<C::TransportError>>,
	client_secret_fallback: Option<String>,
}
#[cfg(feature = "reqwest")]
impl CallbackAccessBridge<ReqwestHttpClient> {
	/// Builds a bridge whose token requests give up after `timeout`.
	pub fn new(timeout: StdDuration) -> Result<Self> {
		Ok(Self::with_http_client(ReqwestHttpClient::with_timeout(timeout)?))
	}

	/// Uses an existing reqwest transport.
	pub fn with_http_client(http_client: impl Into<Arc<ReqwestHttpClient>>) -> Self {
		Self::with_transport(http_client, Arc::new(ReqwestTransportErrorMapper))
	}
}
impl<C> CallbackAccessBridge<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Uses a custom transport and error mapper.
	pub fn with_transport(
		http_client: impl Into<Arc<C>>,
		error_mapper: Arc<dyn TransportErrorMapper<C::TransportError>>,
	) -> Self {
		Self { http_client: http_client.into(), error_mapper, client_secret_fallback: None }
	}

	/// Uses a custom transport with the transport-agnostic error mapper.
	pub fn with_basic_transport(http_client: impl Into<Arc<C>>) -> Self {
		Self::with_transport(http_client, Arc::new(BasicTransportErrorMapper))
	}

	/// Secret sent when the partner payload omits `clientSecret`.
	pub fn with_client_secret_fallback(mut self, secret: impl Into<String>) -> Self {
		self.client_secret_fallback = Some(secret.into());

		self
	}

	/// Redeems the partner's code and wraps the result as an `accessTokenResponse`.
	pub async fn grant_callback_access(
		&self,
		authentication: CallbackAuthentication,
		request_id: &str,
	) -> Result<Envelope<AccessTokenPayload>> {
		obs::observe(OpKind::CallbackAccess, "grant_callback_access", async move {
			let token_url = authentication.token_url().ok_or(Error::MissingCallbackUrl)?;
			let client_secret = authentication
				.client_secret
				.as_deref()
				.or(self.client_secret_fallback.as_deref());
			let tokens = async {
				PartnerTokenEndpoint::for_token_url(
					token_url,
					&authentication.client_id,
					client_secret,
					self.http_client.clone(),
					self.error_mapper.clone(),
				)?
				.exchange_authorization_code(&authentication.code)
				.await
			}
			.await
			.map_err(|source| {
				obs::warn_upstream_failure(token_url, &source);

				Error::UpstreamTokenExchangeFailed { source }
			})?;

			Ok(Envelope::reply(InteractionType::GrantCallbackAccess, request_id, AccessTokenPayload {
				callback_authentication: CallbackTokens {
					token_type: "Bearer",
					access_token: tokens.access_token.expose().to_owned(),
					refresh_token: tokens.refresh_token.map(|token| token.expose().to_owned()),
					expires_in: tokens
						.expires_in
						.filter(|secs| *secs > 0)
						.unwrap_or(DEFAULT_CALLBACK_EXPIRES_IN),
				},
			}))
		})
		.await
	}
}
impl<C> Debug for CallbackAccessBridge<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackAccessBridge")
			.field("client_secret_fallback_set", &self.client_secret_fallback.is_some())
			.finish_non_exhaustive()
	}
}
