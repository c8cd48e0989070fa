//! Crate-level error types shared by the grant flow, device layer, and dispatcher.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Device state source failed for a single device.
	#[error(transparent)]
	StateSource(#[from] crate::device::StateSourceError),

	/// Redirect URI is missing or not an absolute URL.
	#[error("Redirect URI is invalid: {reason}.")]
	InvalidRedirect {
		/// Why the redirect URI was rejected.
		reason: String,
	},
	/// Login submission omitted the username or password.
	#[error("Missing username or password.")]
	MissingCredentials,
	/// Request omitted or malformed a required field; `reason` carries its own punctuation.
	#[error("Request is invalid: {reason}")]
	InvalidRequest {
		/// Human-readable reason.
		reason: String,
	},
	/// Token request omitted `grant_type`.
	#[error("Token request is missing grant_type.")]
	MissingGrantType,
	/// Token request asked for a grant this server does not implement.
	#[error("Grant type `{grant_type}` is not supported.")]
	UnsupportedGrantType {
		/// Grant type supplied by the caller.
		grant_type: String,
	},
	/// Authorization code is unknown, already redeemed, or expired.
	#[error("Authorization grant is invalid: {reason}.")]
	InvalidGrant {
		/// Human-readable reason.
		reason: String,
	},
	/// Authorization header is absent or does not carry a bearer token.
	#[error("Bearer token is missing.")]
	MissingToken,
	/// Bearer token failed signature or expiry checks.
	#[error("Bearer token is invalid: {reason}.")]
	InvalidToken {
		/// Human-readable reason.
		reason: String,
	},
	/// Access token could not be signed.
	#[error("Access token could not be signed.")]
	Signing {
		/// Underlying signer failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},

	/// Registry has no handler variant for the requested device type.
	#[error("Unsupported device type: {device_type}.")]
	UnsupportedDeviceType {
		/// Device type supplied by the caller.
		device_type: String,
	},
	/// No handler is registered under the device identifier.
	#[error("Device handler not found for device: {device_id}.")]
	DeviceNotFound {
		/// Requested external device identifier.
		device_id: String,
	},
	/// A state snapshot repeated a `(component, capability, attribute)` triple.
	#[error("Duplicate state entry {component}/{capability}/{attribute}.")]
	DuplicateStateEntry {
		/// Component name.
		component: String,
		/// Capability identifier.
		capability: String,
		/// Attribute name.
		attribute: String,
	},
	/// Device state refresh exceeded its time budget.
	#[error("Device {device_id} did not answer within {timeout:?}.")]
	DeviceTimeout {
		/// External device identifier.
		device_id: String,
		/// Budget that elapsed.
		timeout: StdDuration,
	},

	/// Callback authentication did not provide `callbackUrls.oauthToken`.
	#[error("Missing oauthToken URL in callbackUrls.")]
	MissingCallbackUrl,
	/// Partner token endpoint could not issue tokens.
	#[error("Failed to obtain access token from callbackUrls.oauthToken.")]
	UpstreamTokenExchangeFailed {
		/// Upstream cause; logged, never returned to protocol callers.
		#[source]
		source: UpstreamError,
	},
	/// Interaction payload did not match the shape its type requires.
	#[error("Invalid {interaction} payload at `{}`.", .source.path())]
	InvalidPayload {
		/// Interaction type whose payload failed to parse.
		interaction: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Unexpected failure inside a handler.
	#[error("Internal error: {message}.")]
	Internal {
		/// Human-readable reason; logged, never returned to protocol callers.
		message: String,
	},
}
impl Error {
	/// Classifies the error into the taxonomy used for status mapping.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::InvalidIdentifier(_)
			| Self::InvalidRedirect { .. }
			| Self::MissingCredentials
			| Self::InvalidRequest { .. }
			| Self::MissingGrantType
			| Self::UnsupportedGrantType { .. }
			| Self::UnsupportedDeviceType { .. }
			| Self::MissingCallbackUrl
			| Self::InvalidPayload { .. } => ErrorCategory::Validation,
			Self::MissingToken | Self::InvalidToken { .. } => ErrorCategory::Auth,
			Self::InvalidGrant { .. } | Self::DeviceNotFound { .. } => ErrorCategory::NotFound,
			Self::UpstreamTokenExchangeFailed { .. } => ErrorCategory::Upstream,
			Self::Storage(_)
			| Self::Config(_)
			| Self::StateSource(_)
			| Self::Signing { .. }
			| Self::DuplicateStateEntry { .. }
			| Self::DeviceTimeout { .. }
			| Self::Internal { .. } => ErrorCategory::Internal,
		}
	}

	/// HTTP status code an endpoint should answer with for this error.
	pub fn http_status(&self) -> u16 {
		match self.category() {
			ErrorCategory::Validation => 400,
			ErrorCategory::Auth => 401,
			// OAuth endpoints report unknown codes as 400 invalid_grant.
			ErrorCategory::NotFound => match self {
				Self::InvalidGrant { .. } => 400,
				_ => 404,
			},
			ErrorCategory::Upstream | ErrorCategory::Internal => 500,
		}
	}

	/// OAuth 2.0 error code reported in `{ "error": ... }` bodies.
	pub fn oauth_code(&self) -> &'static str {
		match self {
			Self::MissingGrantType => "missing_grant_type",
			Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
			Self::InvalidGrant { .. } => "invalid_grant",
			Self::MissingToken => "missing_token",
			Self::InvalidToken { .. } => "invalid_token",
			_ => match self.category() {
				ErrorCategory::Validation => "invalid_request",
				ErrorCategory::Auth => "invalid_token",
				ErrorCategory::NotFound => "not_found",
				ErrorCategory::Upstream | ErrorCategory::Internal => "server_error",
			},
		}
	}
}

/// Error taxonomy shared by every endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
	/// Missing or malformed request fields.
	Validation,
	/// Missing, invalid, or expired bearer token.
	Auth,
	/// Unknown device or authorization code.
	NotFound,
	/// Partner token exchange failure.
	Upstream,
	/// Unexpected handler failure.
	Internal,
}

/// Configuration and validation failures raised while wiring the mock.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Token URL supplied by the partner cannot be parsed.
	#[error("Token URL is invalid.")]
	InvalidTokenUrl {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Configuration sources could not be merged or deserialized.
	#[error("Configuration could not be loaded.")]
	Load(#[from] ::config::ConfigError),
	/// `.env` exists but could not be read or parsed.
	#[error("The .env file could not be loaded.")]
	Dotenv {
		/// Underlying loader failure.
		#[source]
		source: BoxError,
	},
	/// The placeholder signing secret was used outside mock deployments.
	#[error("The placeholder signing secret is not allowed in `{deployment}` deployments.")]
	PlaceholderSecret {
		/// Deployment label.
		deployment: &'static str,
	},
	/// A duration setting was zero.
	#[error("Setting `{setting}` must be greater than zero.")]
	ZeroDuration {
		/// Offending setting name.
		setting: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Reasons a partner token exchange failed.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Token endpoint answered with an OAuth error document.
	#[error("Token endpoint returned an OAuth error: {error}.")]
	ErrorResponse {
		/// OAuth `error` code.
		error: String,
		/// Optional `error_description`.
		description: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with a body that is not a token response.
	#[error("Token endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned something unexpected (content type, status).
	#[error("Token endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Description of the anomaly.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport failed (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Request could not be prepared.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl UpstreamError {
	/// HTTP status reported by the partner, if one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::ErrorResponse { status, .. }
			| Self::MalformedResponse { status, .. }
			| Self::Unexpected { status, .. } => *status,
			Self::Transport(_) | Self::Config(_) => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout,
	/// HTTP request construction failed.
	#[error(transparent)]
	Http(#[from] oauth2::http::Error),
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn oauth_errors_map_to_token_endpoint_codes() {
		assert_eq!(Error::MissingGrantType.oauth_code(), "missing_grant_type");
		assert_eq!(Error::MissingGrantType.http_status(), 400);

		let unsupported = Error::UnsupportedGrantType { grant_type: "password".into() };

		assert_eq!(unsupported.oauth_code(), "unsupported_grant_type");
		assert_eq!(unsupported.http_status(), 400);

		let invalid = Error::InvalidGrant { reason: "unknown code".into() };

		assert_eq!(invalid.oauth_code(), "invalid_grant");
		assert_eq!(invalid.http_status(), 400);
	}

	#[test]
	fn auth_errors_answer_401() {
		assert_eq!(Error::MissingToken.http_status(), 401);
		assert_eq!(Error::MissingToken.oauth_code(), "missing_token");

		let invalid = Error::InvalidToken { reason: "expired".into() };

		assert_eq!(invalid.http_status(), 401);
		assert_eq!(invalid.oauth_code(), "invalid_token");
	}

	#[test]
	fn upstream_failures_hide_their_cause_in_display() {
		let err = Error::UpstreamTokenExchangeFailed {
			source: UpstreamError::ErrorResponse {
				error: "invalid_client".into(),
				description: Some("secret mismatch".into()),
				status: Some(401),
			},
		};

		assert_eq!(err.category(), ErrorCategory::Upstream);
		assert_eq!(err.http_status(), 500);
		assert!(!err.to_string().contains("secret mismatch"));

		let source = StdError::source(&err).expect("Upstream errors should expose their cause.");

		assert!(source.to_string().contains("invalid_client"));
	}

	#[test]
	fn invalid_requests_render_their_reason_verbatim() {
		let err = Error::InvalidRequest { reason: "Failed to parse the request body.".into() };

		assert_eq!(err.to_string(), "Request is invalid: Failed to parse the request body.");
		assert_eq!(err.http_status(), 400);
	}

	#[test]
	fn device_not_found_is_a_lookup_failure() {
		let err = Error::DeviceNotFound { device_id: "ghost".into() };

		assert_eq!(err.category(), ErrorCategory::NotFound);
		assert_eq!(err.http_status(), 404);
	}
}
