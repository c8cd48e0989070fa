//! Device state snapshots: sparse attribute tables with a uniqueness invariant.

// std
use std::collections::HashSet;
// self
use crate::{_prelude::*, auth::ExternalDeviceId};

/// One attribute value of a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
	/// Component the capability lives on (usually `main`).
	pub component: String,
	/// Capability identifier, e.g. `st.lock`.
	pub capability: String,
	/// Attribute name within the capability.
	pub attribute: String,
	/// Attribute value.
	pub value: JsonValue,
	/// Unit of `value`, when the attribute has one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub unit: Option<String>,
}
impl StateEntry {
	/// Creates a unitless entry.
	pub fn new(
		component: impl Into<String>,
		capability: impl Into<String>,
		attribute: impl Into<String>,
		value: impl Into<JsonValue>,
	) -> Self {
		Self {
			component: component.into(),
			capability: capability.into(),
			attribute: attribute.into(),
			value: value.into(),
			unit: None,
		}
	}

	/// Attaches a unit.
	pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
		self.unit = Some(unit.into());

		self
	}

	fn key(&self) -> (&str, &str, &str) {
		(&self.component, &self.capability, &self.attribute)
	}
}

/// Ordered attribute table for one device; `(component, capability, attribute)` is unique.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StateEntry>", into = "Vec<StateEntry>")]
pub struct DeviceState(Vec<StateEntry>);
impl DeviceState {
	/// Validates uniqueness and keeps the entries in their given order.
	pub fn new(entries: Vec<StateEntry>) -> Result<Self> {
		let mut seen = HashSet::with_capacity(entries.len());

		for entry in &entries {
			if !seen.insert(entry.key()) {
				return Err(Error::DuplicateStateEntry {
					component: entry.component.clone(),
					capability: entry.capability.clone(),
					attribute: entry.attribute.clone(),
				});
			}
		}

		Ok(Self(entries))
	}

	/// Entries in source order.
	pub fn entries(&self) -> &[StateEntry] {
		&self.0
	}

	/// Looks up a single attribute.
	pub fn get(&self, component: &str, capability: &str, attribute: &str) -> Option<&StateEntry> {
		self.0.iter().find(|entry| entry.key() == (component, capability, attribute))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when the device reported no attributes.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl TryFrom<Vec<StateEntry>> for DeviceState {
	type Error = Error;

	fn try_from(entries: Vec<StateEntry>) -> Result<Self> {
		Self::new(entries)
	}
}
impl From<DeviceState> for Vec<StateEntry> {
	fn from(state: DeviceState) -> Self {
		state.0
	}
}

/// State of one device as reported in `deviceState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStateSnapshot {
	/// Device the states belong to.
	pub external_device_id: ExternalDeviceId,
	/// Opaque cookie echoed to the partner; always empty here.
	pub device_cookie: JsonMap<String, JsonValue>,
	/// Attribute values.
	pub states: DeviceState,
}
impl DeviceStateSnapshot {
	/// Wraps `states` for `external_device_id` with an empty cookie.
	pub fn new(external_device_id: ExternalDeviceId, states: DeviceState) -> Self {
		Self { external_device_id, device_cookie: JsonMap::new(), states }
	}
}
