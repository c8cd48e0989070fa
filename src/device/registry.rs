//! Registry of device handlers keyed by external device id.
//!
//! Handlers keep their first registration position; re-registering an id replaces the handler
//! in place. Fleet-wide refreshes fan out concurrently, bound each device by a timeout, and
//! drop (after logging) the devices that fail.

// crates.io
use futures::future;
// self
use crate::{
	_prelude::*,
	auth::ExternalDeviceId,
	device::{
		CommandResult, DeviceCommand, DeviceConfig, DeviceDescriptor, DeviceHandler, DeviceKind,
		DeviceStateSnapshot, StateSource,
	},
	obs,
};

/// Identifier of the car seeded by [`DeviceRegistry::with_default_car`].
pub const DEFAULT_CAR_ID: &str = "partner-device-id-1";
/// Default per-device budget for a state refresh.
pub const DEFAULT_REFRESH_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Ordered set of device handlers.
pub struct DeviceRegistry {
	handlers: RwLock<Vec<Arc<DeviceHandler>>>,
	default_source: Arc<dyn StateSource>,
	refresh_timeout: StdDuration,
}
impl DeviceRegistry {
	/// Creates an empty registry whose [`register`](Self::register) calls read from
	/// `default_source`.
	pub fn new(default_source: Arc<dyn StateSource>) -> Self {
		Self {
			handlers: RwLock::new(Vec::new()),
			default_source,
			refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
		}
	}

	/// Creates a registry seeded with the default car.
	pub fn with_default_car(default_source: Arc<dyn StateSource>) -> Result<Self> {
		let registry = Self::new(default_source);

		registry.register(DEFAULT_CAR_ID, DeviceKind::Car.as_str(), DeviceConfig::default())?;

		Ok(registry)
	}

	/// Overrides the per-device refresh budget.
	pub fn with_refresh_timeout(mut self, timeout: StdDuration) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Registers a device of `device_type` backed by the registry's default state source.
	pub fn register(&self, device_id: &str, device_type: &str, config: DeviceConfig) -> Result<()> {
		self.register_with_source(device_id, device_type, config, self.default_source.clone())
	}

	/// Registers a device of `device_type` backed by `source`.
	pub fn register_with_source(
		&self,
		device_id: &str,
		device_type: &str,
		config: DeviceConfig,
		source: Arc<dyn StateSource>,
	) -> Result<()> {
		let kind = device_type.parse::<DeviceKind>()?;
		let id = ExternalDeviceId::new(device_id)?;

		self.insert(DeviceHandler::build(kind, id, config, source));

		Ok(())
	}

	/// Inserts a prebuilt handler; an existing handler with the same id is replaced in place.
	pub fn insert(&self, handler: DeviceHandler) {
		let mut handlers = self.handlers.write();
		let handler = Arc::new(handler);

		match handlers.iter_mut().find(|existing| existing.id() == handler.id()) {
			Some(slot) => *slot = handler,
			None => handlers.push(handler),
		}
	}

	/// Number of registered devices.
	pub fn len(&self) -> usize {
		self.handlers.read().len()
	}

	/// Returns true when no device is registered.
	pub fn is_empty(&self) -> bool {
		self.handlers.read().is_empty()
	}

	/// Discovery descriptors in registration order.
	pub fn list_descriptors(&self) -> Vec<DeviceDescriptor> {
		self.handlers.read().iter().map(|handler| handler.describe()).collect()
	}

	/// Refreshes one device.
	pub async fn refresh_state(&self, device_id: &str) -> Result<DeviceStateSnapshot> {
		let handler = self.lookup(device_id)?;

		self.refresh_bounded(&handler).await
	}

	/// Refreshes `device_ids` concurrently; failed, unknown, or slow devices are logged and
	/// omitted while the rest keep request order.
	pub async fn refresh_many<S>(&self, device_ids: &[S]) -> Vec<DeviceStateSnapshot>
	where
		S: AsRef<str>,
	{
		let refreshes = device_ids.iter().map(|device_id| async move {
			let device_id = device_id.as_ref();
			let result = match self.lookup(device_id) {
				Ok(handler) => self.refresh_bounded(&handler).await,
				Err(e) => Err(e),
			};

			result.inspect_err(|e| obs::warn_device_dropped(device_id, e)).ok()
		});

		future::join_all(refreshes).await.into_iter().flatten().collect()
	}

	/// Delivers `command` to a device.
	pub fn handle_command(&self, device_id: &str, command: &DeviceCommand) -> Result<CommandResult> {
		Ok(self.lookup(device_id)?.handle_command(command))
	}

	fn lookup(&self, device_id: &str) -> Result<Arc<DeviceHandler>> {
		self.handlers
			.read()
			.iter()
			.find(|handler| &**handler.id() == device_id)
			.cloned()
			.ok_or_else(|| Error::DeviceNotFound { device_id: device_id.to_owned() })
	}

	async fn refresh_bounded(&self, handler: &DeviceHandler) -> Result<DeviceStateSnapshot> {
		tokio::time::timeout(self.refresh_timeout, handler.refresh_state()).await.map_err(|_| {
			Error::DeviceTimeout {
				device_id: handler.id().to_string(),
				timeout: self.refresh_timeout,
			}
		})?
	}
}
impl Debug for DeviceRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DeviceRegistry")
			.field("devices", &self.handlers.read().iter().map(|h| h.id().clone()).collect::<Vec<_>>())
			.field("refresh_timeout", &self.refresh_timeout)
			.finish_non_exhaustive()
	}
}
