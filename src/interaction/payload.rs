//! Request and response payloads of each interaction type.

// self
use crate::{
	_prelude::*,
	callback::{CallbackAuthentication, CallbackTokens, CallbackUrls},
	device::{DeviceCommand, DeviceDescriptor, DeviceErrorKind, DeviceStateSnapshot},
};

/// `discoveryResponse` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryPayload {
	/// Every registered device in registration order.
	pub devices: Vec<DeviceDescriptor>,
}

/// Device reference inside a `stateRefreshRequest`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
	/// Device to refresh.
	pub external_device_id: String,
}

/// `stateRefreshRequest` payload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StateRefreshRequest {
	/// Devices to refresh, in reply order.
	#[serde(default)]
	pub devices: Vec<DeviceRef>,
}

/// `stateRefreshResponse` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRefreshPayload {
	/// Snapshots of the devices that answered.
	pub device_state: Vec<DeviceStateSnapshot>,
}

/// Commands for one device inside a `commandRequest`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommands {
	/// Target device.
	pub external_device_id: String,
	/// Commands in execution order.
	#[serde(default)]
	pub commands: Vec<DeviceCommand>,
}

/// `commandRequest` payload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CommandRequest {
	/// Per-device command batches.
	#[serde(default)]
	pub devices: Vec<DeviceCommands>,
}

/// One entry of `deviceError`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceErrorEntry {
	/// Partner-facing error code.
	pub error_enum: DeviceErrorKind,
	/// Human-readable detail.
	pub detail: String,
}

/// Per-device entry of a `commandResponse`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandDeviceState {
	/// Device applied the commands; carries its refreshed state.
	States(DeviceStateSnapshot),
	/// Device could not apply the commands.
	#[serde(rename_all = "camelCase")]
	Error {
		/// Device the error belongs to.
		external_device_id: String,
		/// Errors reported for the device.
		device_error: Vec<DeviceErrorEntry>,
	},
}
impl CommandDeviceState {
	/// Reports `device_id` as unable to act.
	pub fn unavailable(device_id: impl Into<String>, detail: impl Into<String>) -> Self {
		Self::Error {
			external_device_id: device_id.into(),
			device_error: vec![DeviceErrorEntry {
				error_enum: DeviceErrorKind::DeviceUnavailable,
				detail: detail.into(),
			}],
		}
	}
}

/// `commandResponse` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPayload {
	/// One entry per device in request order.
	pub device_state: Vec<CommandDeviceState>,
}

/// `grantCallbackAccess` payload.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantCallbackAccessRequest {
	/// Partner-issued code and client credentials.
	pub callback_authentication: CallbackAuthentication,
	/// Top-level callback URLs; take precedence over the nested ones.
	#[serde(default)]
	pub callback_urls: Option<CallbackUrls>,
}
impl GrantCallbackAccessRequest {
	/// Folds the top-level `callbackUrls` into the authentication block.
	pub fn into_authentication(self) -> CallbackAuthentication {
		let Self { mut callback_authentication, callback_urls } = self;

		if let Some(top) = callback_urls {
			let nested = callback_authentication.callback_urls.take().unwrap_or_default();

			callback_authentication.callback_urls = Some(top.merge(nested));
		}

		callback_authentication
	}
}

/// `accessTokenResponse` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenPayload {
	/// Tokens issued by the partner's token endpoint.
	pub callback_authentication: CallbackTokens,
}
