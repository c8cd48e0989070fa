//! Closed set of device handlers.

// self
use crate::{
	_prelude::*,
	auth::ExternalDeviceId,
	device::{
		DeviceConfig, DeviceContext, DeviceDescriptor, DeviceKind, DeviceState,
		DeviceStateSnapshot, ManufacturerInfo, StateSource,
	},
	obs,
};

/// Default display name of a car.
pub const CAR_FRIENDLY_NAME: &str = "Rend";
/// Default car manufacturer.
pub const CAR_MANUFACTURER_NAME: &str = "Virtual Hyundai";
/// Default car model.
pub const CAR_MODEL_NAME: &str = "Test Model";
/// Default car hardware version.
pub const CAR_HW_VERSION: &str = "3";
/// Default car software version.
pub const CAR_SW_VERSION: &str = "1.0";
/// Default car category.
pub const CAR_CATEGORY: &str = "Car";
/// Default car device handler type.
pub const CAR_DEVICE_HANDLER_TYPE: &str = "4e8bdf64-c46a-4c9c-8d01-3929d9c923ed";

/// One command addressed to a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommand {
	/// Component the command targets.
	#[serde(default = "default_component")]
	pub component: String,
	/// Capability identifier.
	pub capability: String,
	/// Command name within the capability.
	pub command: String,
	/// Positional command arguments.
	#[serde(default)]
	pub arguments: Vec<JsonValue>,
}

/// Device-level error codes reported to the partner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceErrorKind {
	/// Device cannot be reached or cannot act right now.
	#[serde(rename = "DEVICE-UNAVAILABLE")]
	DeviceUnavailable,
}
impl DeviceErrorKind {
	/// Wire label of the error.
	pub const fn as_str(self) -> &'static str {
		match self {
			DeviceErrorKind::DeviceUnavailable => "DEVICE-UNAVAILABLE",
		}
	}
}

/// Outcome of [`DeviceHandler::handle_command`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandResult {
	/// The device accepted the command.
	Succeeded,
	/// The device rejected the command.
	Failed {
		/// Partner-facing error code.
		error: DeviceErrorKind,
		/// Human-readable detail.
		detail: String,
	},
}
impl CommandResult {
	/// Shorthand for an unavailable device.
	pub fn unavailable(detail: impl Into<String>) -> Self {
		Self::Failed { error: DeviceErrorKind::DeviceUnavailable, detail: detail.into() }
	}

	/// Returns true for [`CommandResult::Succeeded`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Succeeded)
	}
}

/// A device exposed to the partner, one variant per [`DeviceKind`].
#[derive(Clone, Debug)]
pub enum DeviceHandler {
	/// Connected car.
	Car(CarHandler),
}
impl DeviceHandler {
	/// Builds a handler of `kind`.
	pub fn build(
		kind: DeviceKind,
		id: ExternalDeviceId,
		config: DeviceConfig,
		source: Arc<dyn StateSource>,
	) -> Self {
		match kind {
			DeviceKind::Car => Self::car(id, config, source),
		}
	}

	/// Builds a car handler.
	pub fn car(id: ExternalDeviceId, config: DeviceConfig, source: Arc<dyn StateSource>) -> Self {
		Self::Car(CarHandler::new(id, config, source))
	}

	/// Device identifier.
	pub fn id(&self) -> &ExternalDeviceId {
		match self {
			Self::Car(car) => &car.id,
		}
	}

	/// Kind of device.
	pub fn kind(&self) -> DeviceKind {
		match self {
			Self::Car(_) => DeviceKind::Car,
		}
	}

	/// Discovery descriptor; pure.
	pub fn describe(&self) -> DeviceDescriptor {
		match self {
			Self::Car(car) => car.describe(),
		}
	}

	/// Fetches fresh attribute values from the handler's state source.
	pub async fn refresh_state(&self) -> Result<DeviceStateSnapshot> {
		match self {
			Self::Car(car) => car.refresh_state().await,
		}
	}

	/// Applies `command` to the device.
	pub fn handle_command(&self, command: &DeviceCommand) -> CommandResult {
		match self {
			Self::Car(car) => car.handle_command(command),
		}
	}
}

/// Car handler; every refresh reads its state source again.
#[derive(Clone)]
pub struct CarHandler {
	id: ExternalDeviceId,
	config: DeviceConfig,
	source: Arc<dyn StateSource>,
}
impl CarHandler {
	/// Creates a car handler.
	pub fn new(id: ExternalDeviceId, config: DeviceConfig, source: Arc<dyn StateSource>) -> Self {
		Self { id, config, source }
	}

	fn describe(&self) -> DeviceDescriptor {
		let config = &self.config;
		let or = |value: &Option<String>, default: &str| {
			value.clone().unwrap_or_else(|| default.to_owned())
		};

		DeviceDescriptor {
			external_device_id: self.id.clone(),
			friendly_name: or(&config.friendly_name, CAR_FRIENDLY_NAME),
			manufacturer_info: ManufacturerInfo {
				manufacturer_name: or(&config.manufacturer_name, CAR_MANUFACTURER_NAME),
				model_name: or(&config.model_name, CAR_MODEL_NAME),
				hw_version: or(&config.hw_version, CAR_HW_VERSION),
				sw_version: or(&config.sw_version, CAR_SW_VERSION),
			},
			device_context: DeviceContext {
				categories: config
					.categories
					.clone()
					.unwrap_or_else(|| vec![CAR_CATEGORY.to_owned()]),
			},
			device_handler_type: or(&config.device_handler_type, CAR_DEVICE_HANDLER_TYPE),
		}
	}

	async fn refresh_state(&self) -> Result<DeviceStateSnapshot> {
		let entries = self.source.fetch().await?;

		Ok(DeviceStateSnapshot::new(self.id.clone(), DeviceState::new(entries)?))
	}

	fn handle_command(&self, command: &DeviceCommand) -> CommandResult {
		obs::info_command(
			&self.id,
			&command.command,
			&command.capability,
			&command.component,
		);

		CommandResult::Succeeded
	}
}
impl Debug for CarHandler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CarHandler")
			.field("id", &self.id)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

fn default_component() -> String {
	"main".into()
}
