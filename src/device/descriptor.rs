//! Discovery descriptors and the configuration handlers are built from.

// self
use crate::{_prelude::*, auth::ExternalDeviceId};

/// Closed set of device kinds the registry can construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
	/// Connected car.
	Car,
}
impl DeviceKind {
	/// Returns the registration label for the kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			DeviceKind::Car => "car",
		}
	}
}
impl Display for DeviceKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for DeviceKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"car" => Ok(DeviceKind::Car),
			other => Err(Error::UnsupportedDeviceType { device_type: other.to_owned() }),
		}
	}
}

/// Optional overrides applied on top of a device kind's defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
	/// Display name shown in the partner app.
	pub friendly_name: Option<String>,
	/// Manufacturer name.
	pub manufacturer_name: Option<String>,
	/// Model name.
	pub model_name: Option<String>,
	/// Hardware version.
	pub hw_version: Option<String>,
	/// Software version.
	pub sw_version: Option<String>,
	/// Category list; replaces the kind's default categories when set.
	pub categories: Option<Vec<String>>,
	/// Partner device handler type (profile) identifier.
	pub device_handler_type: Option<String>,
}

/// Manufacturer block of a [`DeviceDescriptor`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerInfo {
	/// Manufacturer name.
	pub manufacturer_name: String,
	/// Model name.
	pub model_name: String,
	/// Hardware version.
	pub hw_version: String,
	/// Software version.
	pub sw_version: String,
}

/// Device context block of a [`DeviceDescriptor`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceContext {
	/// Partner categories the device belongs to.
	pub categories: Vec<String>,
}

/// Immutable discovery identity of one device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
	/// Registry-unique, stable device identifier.
	pub external_device_id: ExternalDeviceId,
	/// Display name.
	pub friendly_name: String,
	/// Manufacturer metadata.
	pub manufacturer_info: ManufacturerInfo,
	/// Categories.
	pub device_context: DeviceContext,
	/// Partner device handler type (profile) identifier.
	pub device_handler_type: String,
}
