//! Interaction envelope: `{ headers, ...payload }` with payload fields as siblings of `headers`.

// self
use crate::_prelude::*;

/// Protocol name carried in every header block.
pub const SCHEMA: &str = "st-schema";
/// Protocol version carried in every header block.
pub const SCHEMA_VERSION: &str = "1.0";

/// Interaction types understood by the dispatcher, plus the response types it emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionType {
	/// Partner asks for the device list.
	DiscoveryRequest,
	/// Reply to [`InteractionType::DiscoveryRequest`].
	DiscoveryResponse,
	/// Partner hands over an authorization code for its own token endpoint.
	GrantCallbackAccess,
	/// Reply to [`InteractionType::GrantCallbackAccess`].
	AccessTokenResponse,
	/// Partner asks for current device states.
	StateRefreshRequest,
	/// Reply to [`InteractionType::StateRefreshRequest`].
	StateRefreshResponse,
	/// Partner sends device commands.
	CommandRequest,
	/// Reply to [`InteractionType::CommandRequest`].
	CommandResponse,
}
impl InteractionType {
	/// Wire label of the type.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::DiscoveryRequest => "discoveryRequest",
			Self::DiscoveryResponse => "discoveryResponse",
			Self::GrantCallbackAccess => "grantCallbackAccess",
			Self::AccessTokenResponse => "accessTokenResponse",
			Self::StateRefreshRequest => "stateRefreshRequest",
			Self::StateRefreshResponse => "stateRefreshResponse",
			Self::CommandRequest => "commandRequest",
			Self::CommandResponse => "commandResponse",
		}
	}

	/// Parses a request tag; response types and unknown tags yield `None`.
	pub fn request(tag: &str) -> Option<Self> {
		match tag {
			"discoveryRequest" => Some(Self::DiscoveryRequest),
			"grantCallbackAccess" => Some(Self::GrantCallbackAccess),
			"stateRefreshRequest" => Some(Self::StateRefreshRequest),
			"commandRequest" => Some(Self::CommandRequest),
			_ => None,
		}
	}

	/// Response type for a request type: `Request` becomes `Response`, and
	/// `grantCallbackAccess` maps to `accessTokenResponse`. Response types map to themselves.
	pub const fn response(self) -> Self {
		match self {
			Self::DiscoveryRequest | Self::DiscoveryResponse => Self::DiscoveryResponse,
			Self::GrantCallbackAccess | Self::AccessTokenResponse => Self::AccessTokenResponse,
			Self::StateRefreshRequest | Self::StateRefreshResponse => Self::StateRefreshResponse,
			Self::CommandRequest | Self::CommandResponse => Self::CommandResponse,
		}
	}
}
impl Display for InteractionType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Header block of a response envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headers {
	/// Always [`SCHEMA`].
	pub schema: String,
	/// Always [`SCHEMA_VERSION`].
	pub version: String,
	/// Response type.
	pub interaction_type: InteractionType,
	/// Echo of the request's `requestId`.
	pub request_id: String,
}
impl Headers {
	/// Headers for a response of `interaction_type` echoing `request_id`.
	pub fn new(interaction_type: InteractionType, request_id: impl Into<String>) -> Self {
		Self {
			schema: SCHEMA.into(),
			version: SCHEMA_VERSION.into(),
			interaction_type,
			request_id: request_id.into(),
		}
	}
}

/// Header block as sent by the partner; only the fields the dispatcher needs are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestHeaders {
	/// Raw interaction tag.
	pub interaction_type: Option<String>,
	/// Request correlation id.
	pub request_id: Option<String>,
}
impl RequestHeaders {
	/// Reads `request.headers` field by field, so one ill-typed field never hides the others.
	///
	/// Scalar `requestId` values are echoed as text; anything else counts as absent.
	pub fn from_request(request: &JsonValue) -> Self {
		let field = |name: &str| request.get("headers").and_then(|headers| headers.get(name));

		Self {
			interaction_type: field("interactionType")
				.and_then(JsonValue::as_str)
				.map(ToOwned::to_owned),
			request_id: field("requestId").and_then(scalar_text),
		}
	}
}

fn scalar_text(value: &JsonValue) -> Option<String> {
	match value {
		JsonValue::String(text) => Some(text.clone()),
		JsonValue::Number(number) => Some(number.to_string()),
		JsonValue::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

/// Envelope of a response with a typed payload flattened next to `headers`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
	/// Header block.
	pub headers: Headers,
	/// Payload fields.
	#[serde(flatten)]
	pub payload: P,
}
impl<P> Envelope<P> {
	/// Wraps `payload` as the reply to a `request` interaction.
	pub fn reply(request: InteractionType, request_id: impl Into<String>, payload: P) -> Self {
		Self { headers: Headers::new(request.response(), request_id), payload }
	}
}
