//! Outbound `authorization_code` exchange against a partner token endpoint.
//!
//! Requests are built by hand and sent through a [`TokenHttpClient`] handle. Any 2xx reply
//! carrying an `access_token` is accepted; partners are not required to send `token_type`.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, TokenUrl,
	http::{
		Method, StatusCode,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError, UpstreamError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

/// Maps HTTP transport failures into [`UpstreamError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an upstream error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> UpstreamError;
}

/// Mapper for any transport; every request failure is reported as a network error.
#[derive(Clone, Debug, Default)]
pub struct BasicTransportErrorMapper;
impl<E> TransportErrorMapper<E> for BasicTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<E>,
	) -> UpstreamError {
		match err {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			HttpClientError::Http(inner) => TransportError::Http(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				UpstreamError::Unexpected { message, status: meta_status(meta) },
			_ => UpstreamError::Unexpected {
				message: "HTTP client failed while calling the token endpoint".into(),
				status: meta_status(meta),
			},
		}
	}
}

/// Default mapper for reqwest-backed transports; separates timeouts and builder failures.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> UpstreamError {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
			other => BasicTransportErrorMapper.map_transport_error(meta, other),
		}
	}
}

/// Tokens returned by a partner token endpoint.
#[derive(Clone, Debug)]
pub struct ExchangedTokens {
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token, when the partner issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Access token lifetime in seconds, when reported.
	pub expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenReply {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorReply {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

pub(crate) struct PartnerTokenEndpoint<C>
where
	C: ?Sized + TokenHttpClient,
{
	token_url: TokenUrl,
	client_id: String,
	client_secret: Option<String>,
	http_client: Arc<C>,
	error_mapper: Arc<dyn TransportErrorMapper<C::TransportError>>,
}
impl<C> PartnerTokenEndpoint<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Targets `token_url`; credentials travel in the form body.
	pub(crate) fn for_token_url(
		token_url: &str,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: Arc<C>,
		error_mapper: Arc<dyn TransportErrorMapper<C::TransportError>>,
	) -> Result<Self, UpstreamError> {
		let token_url = TokenUrl::new(token_url.to_owned())
			.map_err(|source| ConfigError::InvalidTokenUrl { source })?;

		Ok(Self {
			token_url,
			client_id: client_id.to_owned(),
			client_secret: client_secret.map(ToOwned::to_owned),
			http_client,
			error_mapper,
		})
	}

	/// Redeems `code` with an `authorization_code` grant.
	pub(crate) async fn exchange_authorization_code(
		&self,
		code: &str,
	) -> Result<ExchangedTokens, UpstreamError> {
		let request = self.build_request(code)?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = handle
			.call(request)
			.await
			.map_err(|err| self.error_mapper.map_transport_error(meta.take().as_ref(), err))?;
		let status = response.status();

		if !status.is_success() {
			return Err(map_error_reply(status, response.body()));
		}

		let reply = parse_json::<TokenReply>(response.body()).map_err(|source| {
			UpstreamError::MalformedResponse { source, status: Some(status.as_u16()) }
		})?;

		Ok(ExchangedTokens {
			access_token: TokenSecret::new(reply.access_token),
			refresh_token: reply.refresh_token.map(TokenSecret::new),
			expires_in: reply.expires_in,
		})
	}

	fn build_request(&self, code: &str) -> Result<HttpRequest, UpstreamError> {
		let mut form = FormSerializer::new(String::new());

		form.append_pair("grant_type", "authorization_code")
			.append_pair("code", code)
			.append_pair("client_id", &self.client_id);

		if let Some(secret) = &self.client_secret {
			form.append_pair("client_secret", secret);
		}

		oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(self.token_url.url().as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(form.finish().into_bytes())
			.map_err(|e| TransportError::from(e).into())
	}
}

fn parse_json<T>(body: &[u8]) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(body))
}

fn map_error_reply(status: StatusCode, body: &[u8]) -> UpstreamError {
	let status_code = Some(status.as_u16());

	match parse_json::<ErrorReply>(body) {
		Ok(reply) => UpstreamError::ErrorResponse {
			error: reply.error,
			description: reply.error_description,
			status: status_code,
		},
		Err(_) => UpstreamError::Unexpected {
			message: format!("token endpoint answered HTTP {}", status.as_u16()),
			status: status_code,
		},
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
