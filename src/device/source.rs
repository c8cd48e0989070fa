//! Pluggable sources of device attribute values.
//!
//! Handlers never cache: every refresh asks the source again. [`HttpStateSource`] fetches a
//! JSON array of [`StateEntry`] values with a bounded timeout, and [`StaticStateSource`]
//! serves a fixed table.

// self
use crate::{_prelude::*, device::StateEntry, error::BoxError};

/// Boxed future returned by [`StateSource::fetch`].
pub type StateFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Vec<StateEntry>, StateSourceError>> + 'a + Send>>;

/// Where a handler reads its current attribute values from.
pub trait StateSource
where
	Self: Send + Sync,
{
	/// Fetches the current attribute table.
	fn fetch(&self) -> StateFuture<'_>;
}

/// Failures raised by a [`StateSource`].
#[derive(Debug, ThisError)]
pub enum StateSourceError {
	/// Source answered with a non-success status.
	#[error("State source answered with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Source body is not a JSON array of state entries.
	#[error("State source returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Network failure or timeout.
	#[error("State source could not be reached.")]
	Transport {
		/// Transport-specific error.
		#[source]
		source: BoxError,
	},
	/// Source is deliberately offline.
	#[error("State source is unavailable: {message}.")]
	Unavailable {
		/// Human-readable reason.
		message: String,
	},
}

/// Serves a fixed attribute table.
#[derive(Clone, Debug, Default)]
pub struct StaticStateSource(Arc<[StateEntry]>);
impl StaticStateSource {
	/// Creates a source that always answers with `entries`.
	pub fn new(entries: impl Into<Arc<[StateEntry]>>) -> Self {
		Self(entries.into())
	}

	/// Parked, locked car used when no remote fixture is configured.
	pub fn car_fixture() -> Self {
		Self::new(vec![
			StateEntry::new("main", "st.healthCheck", "healthStatus", "online"),
			StateEntry::new("main", "st.lock", "lock", "locked"),
			StateEntry::new("main", "st.battery", "battery", 80).with_unit("%"),
			StateEntry::new("main", "st.fuelLevel", "fuelLevel", 62).with_unit("%"),
			StateEntry::new("main", "st.odometer", "odometerReading", 12_480).with_unit("km"),
		])
	}
}
impl StateSource for StaticStateSource {
	fn fetch(&self) -> StateFuture<'_> {
		let entries = self.0.to_vec();

		Box::pin(async move { Ok(entries) })
	}
}

/// Source that is always offline; useful for exercising partial-failure paths.
#[derive(Clone, Debug)]
pub struct UnavailableStateSource {
	message: String,
}
impl UnavailableStateSource {
	/// Creates a source failing with `message`.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}
impl StateSource for UnavailableStateSource {
	fn fetch(&self) -> StateFuture<'_> {
		let message = self.message.clone();

		Box::pin(async move { Err(StateSourceError::Unavailable { message }) })
	}
}

/// Fetches a JSON array of state entries from a remote fixture on every refresh.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct HttpStateSource {
	client: ReqwestClient,
	url: Url,
}
#[cfg(feature = "reqwest")]
impl HttpStateSource {
	/// Builds a source for `url` whose requests give up after `timeout`.
	pub fn new(url: Url, timeout: StdDuration) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self { client, url })
	}

	/// Reuses an existing client; the caller is responsible for its timeout.
	pub fn with_client(client: ReqwestClient, url: Url) -> Self {
		Self { client, url }
	}
}
#[cfg(feature = "reqwest")]
impl StateSource for HttpStateSource {
	fn fetch(&self) -> StateFuture<'_> {
		Box::pin(async move {
			let transport = |e: ReqwestError| StateSourceError::Transport { source: Box::new(e) };
			let response = self.client.get(self.url.clone()).send().await.map_err(transport)?;
			let status = response.status();

			if !status.is_success() {
				return Err(StateSourceError::Status { status: status.as_u16() });
			}

			let body = response.bytes().await.map_err(transport)?;
			let de = &mut serde_json::Deserializer::from_slice(&body);

			serde_path_to_error::deserialize(de).map_err(|source| StateSourceError::Parse { source })
		})
	}
}
