//! Routes a tagged interaction envelope to its handler and normalizes every failure.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	callback::CallbackAccessBridge,
	device::{CommandResult, DeviceRegistry},
	http::TokenHttpClient,
	interaction::{
		CommandDeviceState, CommandPayload, CommandRequest, DeviceCommands, DiscoveryPayload,
		Envelope, GrantCallbackAccessRequest, InteractionType, RequestHeaders,
		StateRefreshPayload, StateRefreshRequest,
	},
	obs::{self, OpKind},
};

/// Detail reported by [`CommandMode::ReportUnavailable`].
pub const UNAVAILABLE_DETAIL: &str = "Device is unavailable.";

const INTERNAL_ERROR: &str = "Internal server error";

/// How `commandRequest` interactions are answered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMode {
	/// Every device answers `DEVICE-UNAVAILABLE` without touching its handler.
	#[default]
	ReportUnavailable,
	/// Commands are delivered to the handlers and successful devices report fresh state.
	Delegate,
}

/// Command behavior of a dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandSettings {
	/// Answering strategy.
	pub mode: CommandMode,
	/// Artificial latency added before the command response; zero disables it.
	pub delay: StdDuration,
}

/// Status code plus JSON body produced by [`InteractionDispatcher`].
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionReply {
	/// HTTP status code.
	pub status: u16,
	/// Envelope or `{ "error": ... }` document.
	pub body: JsonValue,
}
impl InteractionReply {
	fn ok(body: JsonValue) -> Self {
		Self { status: 200, body }
	}

	fn error(status: u16, message: impl Into<String>) -> Self {
		Self { status, body: serde_json::json!({ "error": message.into() }) }
	}

	/// Returns true for 2xx replies.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Flat dispatch table over the partner interaction types.
pub struct InteractionDispatcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	registry: Arc<DeviceRegistry>,
	bridge: CallbackAccessBridge<C>,
	commands: CommandSettings,
}
impl<C> InteractionDispatcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a dispatcher over `registry` that delegates callback grants to `bridge`.
	pub fn new(registry: Arc<DeviceRegistry>, bridge: CallbackAccessBridge<C>) -> Self {
		Self { registry, bridge, commands: CommandSettings::default() }
	}

	/// Overrides command behavior.
	pub fn with_command_settings(mut self, commands: CommandSettings) -> Self {
		self.commands = commands;

		self
	}

	/// Registry the dispatcher reads from.
	pub fn registry(&self) -> &Arc<DeviceRegistry> {
		&self.registry
	}

	/// Dispatches a raw request body.
	pub async fn dispatch(&self, body: &[u8]) -> InteractionReply {
		match serde_json::from_slice::<JsonValue>(body) {
			Ok(request) => self.dispatch_value(request).await,
			Err(_) => InteractionReply::error(400, "invalid JSON body"),
		}
	}

	/// Dispatches a parsed request envelope.
	pub async fn dispatch_value(&self, request: JsonValue) -> InteractionReply {
		let headers = RequestHeaders::from_request(&request);
		let Some(tag) = headers.interaction_type.filter(|tag| !tag.is_empty()) else {
			return InteractionReply::error(400, "missing interactionType");
		};
		let Some(kind) = InteractionType::request(&tag) else {
			return InteractionReply::error(400, format!("unsupported interactionType: {tag}"));
		};
		let request_id = headers.request_id.unwrap_or_default();
		let result = match kind {
			InteractionType::DiscoveryRequest => self.discovery(&request_id).await,
			InteractionType::GrantCallbackAccess =>
				self.grant_callback_access(request, &request_id).await,
			InteractionType::StateRefreshRequest => self.state_refresh(request, &request_id).await,
			InteractionType::CommandRequest => self.command(request, &request_id).await,
			_ => return InteractionReply::error(400, format!("unsupported interactionType: {tag}")),
		};

		match result {
			Ok(body) => InteractionReply::ok(body),
			Err(Error::InvalidPayload { interaction, source }) => InteractionReply::error(
				400,
				format!("invalid {interaction} payload: {}", source.path()),
			),
			Err(e) => {
				obs::warn_interaction_failed(kind.as_str(), &request_id, &e);

				InteractionReply::error(500, INTERNAL_ERROR)
			},
		}
	}

	async fn discovery(&self, request_id: &str) -> Result<JsonValue> {
		obs::observe(OpKind::Discovery, "discovery", async {
			let payload = DiscoveryPayload { devices: self.registry.list_descriptors() };

			to_body(Envelope::reply(InteractionType::DiscoveryRequest, request_id, payload))
		})
		.await
	}

	async fn grant_callback_access(&self, request: JsonValue, request_id: &str) -> Result<JsonValue> {
		let request: GrantCallbackAccessRequest =
			parse_payload(InteractionType::GrantCallbackAccess, request)?;
		let envelope =
			self.bridge.grant_callback_access(request.into_authentication(), request_id).await?;

		to_body(envelope)
	}

	async fn state_refresh(&self, request: JsonValue, request_id: &str) -> Result<JsonValue> {
		obs::observe(OpKind::StateRefresh, "state_refresh", async {
			let request: StateRefreshRequest =
				parse_payload(InteractionType::StateRefreshRequest, request)?;
			let ids: Vec<&str> =
				request.devices.iter().map(|device| device.external_device_id.as_str()).collect();
			let device_state = self.registry.refresh_many(&ids).await;

			to_body(Envelope::reply(
				InteractionType::StateRefreshRequest,
				request_id,
				StateRefreshPayload { device_state },
			))
		})
		.await
	}

	async fn command(&self, request: JsonValue, request_id: &str) -> Result<JsonValue> {
		obs::observe(OpKind::Command, "command", async {
			let request: CommandRequest = parse_payload(InteractionType::CommandRequest, request)?;

			if !self.commands.delay.is_zero() {
				tokio::time::sleep(self.commands.delay).await;
			}

			let mut device_state = Vec::with_capacity(request.devices.len());

			for device in &request.devices {
				device_state.push(match self.commands.mode {
					CommandMode::ReportUnavailable =>
						CommandDeviceState::unavailable(&device.external_device_id, UNAVAILABLE_DETAIL),
					CommandMode::Delegate => self.delegate_commands(device).await,
				});
			}

			to_body(Envelope::reply(
				InteractionType::CommandRequest,
				request_id,
				CommandPayload { device_state },
			))
		})
		.await
	}

	async fn delegate_commands(&self, device: &DeviceCommands) -> CommandDeviceState {
		let device_id = device.external_device_id.as_str();

		for command in &device.commands {
			match self.registry.handle_command(device_id, command) {
				Ok(CommandResult::Succeeded) => {},
				Ok(CommandResult::Failed { detail, .. }) =>
					return CommandDeviceState::unavailable(device_id, detail),
				Err(e) => return CommandDeviceState::unavailable(device_id, e.to_string()),
			}
		}

		match self.registry.refresh_state(device_id).await {
			Ok(snapshot) => CommandDeviceState::States(snapshot),
			Err(e) => {
				obs::warn_device_dropped(device_id, &e);

				CommandDeviceState::unavailable(device_id, UNAVAILABLE_DETAIL)
			},
		}
	}
}
impl<C> Debug for InteractionDispatcher<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("InteractionDispatcher")
			.field("registry", &self.registry)
			.field("bridge", &self.bridge)
			.field("commands", &self.commands)
			.finish()
	}
}

fn parse_payload<P>(kind: InteractionType, request: JsonValue) -> Result<P>
where
	P: DeserializeOwned,
{
	serde_path_to_error::deserialize(request)
		.map_err(|source| Error::InvalidPayload { interaction: kind.as_str(), source })
}

fn to_body<T>(envelope: T) -> Result<JsonValue>
where
	T: Serialize,
{
	serde_json::to_value(envelope).map_err(|e| Error::Internal { message: e.to_string() })
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{build_static_registry, build_test_dispatcher};

	fn dispatcher(mode: CommandMode) -> InteractionDispatcher<crate::http::ReqwestHttpClient> {
		build_test_dispatcher(build_static_registry(&["car-1"]), CommandSettings {
			mode,
			delay: StdDuration::ZERO,
		})
	}

	#[tokio::test]
	async fn missing_tag_short_circuits() {
		let reply = dispatcher(CommandMode::default())
			.dispatch_value(serde_json::json!({ "headers": { "requestId": "r0" } }))
			.await;

		assert_eq!(reply.status, 400);
		assert_eq!(reply.body, serde_json::json!({ "error": "missing interactionType" }));
	}

	#[tokio::test]
	async fn response_tags_are_not_requests() {
		let reply = dispatcher(CommandMode::default())
			.dispatch_value(serde_json::json!({
				"headers": { "interactionType": "discoveryResponse", "requestId": "r0" },
			}))
			.await;

		assert_eq!(reply.status, 400);
		assert_eq!(reply.body["error"], "unsupported interactionType: discoveryResponse");
	}

	#[tokio::test]
	async fn malformed_payload_reports_its_path() {
		let reply = dispatcher(CommandMode::default())
			.dispatch_value(serde_json::json!({
				"headers": { "interactionType": "stateRefreshRequest", "requestId": "r3" },
				"devices": [{ "externalDeviceId": 7 }],
			}))
			.await;

		assert_eq!(reply.status, 400);
		assert_eq!(
			reply.body["error"],
			"invalid stateRefreshRequest payload: devices[0].externalDeviceId"
		);
	}

	#[tokio::test]
	async fn missing_callback_url_is_an_internal_error() {
		let reply = dispatcher(CommandMode::default())
			.dispatch_value(serde_json::json!({
				"headers": { "interactionType": "grantCallbackAccess", "requestId": "r4" },
				"callbackAuthentication": { "code": "abc", "clientId": "partner" },
			}))
			.await;

		assert_eq!(reply.status, 500);
		assert_eq!(reply.body, serde_json::json!({ "error": "Internal server error" }));
	}

	#[tokio::test]
	async fn delegated_commands_report_fresh_state() {
		let reply = dispatcher(CommandMode::Delegate)
			.dispatch_value(serde_json::json!({
				"headers": { "interactionType": "commandRequest", "requestId": "r5" },
				"devices": [
					{
						"externalDeviceId": "car-1",
						"commands": [{ "component": "main", "capability": "st.lock", "command": "lock" }],
					},
					{ "externalDeviceId": "ghost", "commands": [] },
				],
			}))
			.await;

		assert_eq!(reply.status, 200);

		let states = reply.body["deviceState"].as_array().expect("Command reply should list devices.");

		assert_eq!(states.len(), 2);
		assert_eq!(states[0]["externalDeviceId"], "car-1");
		assert!(states[0]["states"].is_array());
		assert_eq!(states[1]["deviceError"][0]["errorEnum"], "DEVICE-UNAVAILABLE");
	}
}
