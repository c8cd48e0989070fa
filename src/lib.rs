//! Mock OAuth 2.0 authorization server and partner-schema interaction endpoint for smart-home
//! protocol conformance testing.
//!
//! The crate is split into a framework-agnostic core ([`grant`], [`device`], [`callback`],
//! [`interaction`]) and an optional `server` feature that exposes the core over axum.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod callback;
pub mod config;
pub mod device;
pub mod error;
pub mod grant;
pub mod http;
pub mod interaction;
pub mod oauth;
pub mod obs;
#[cfg(feature = "server")] pub mod server;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AccessTokenSigner, ExternalDeviceId},
		callback::CallbackAccessBridge,
		device::{DeviceConfig, DeviceHandler, DeviceRegistry, StateEntry, StaticStateSource},
		grant::AuthorizationCodeFlow,
		http::ReqwestHttpClient,
		interaction::{CommandSettings, InteractionDispatcher},
		store::{MemoryStore, TokenStore},
	};

	/// Signing secret shared by test fixtures.
	pub const TEST_SIGNING_SECRET: &str = "integration-test-secret";

	/// Builds a reqwest HTTP client with a short timeout so failing tests never hang.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::with_timeout(StdDuration::from_secs(5))
			.expect("Failed to build Reqwest client for tests.")
	}

	/// Constructs an [`AuthorizationCodeFlow`] backed by a fresh in-memory store.
	pub fn build_test_flow() -> (AuthorizationCodeFlow, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let flow = AuthorizationCodeFlow::new(store, AccessTokenSigner::new(TEST_SIGNING_SECRET));

		(flow, store_backend)
	}

	/// Canonical car state fixture used across registry and dispatcher tests.
	pub fn car_states() -> Vec<StateEntry> {
		vec![
			StateEntry::new("main", "st.healthCheck", "healthStatus", "online"),
			StateEntry::new("main", "st.battery", "battery", 87).with_unit("%"),
			StateEntry::new("main", "st.lock", "lock", "locked"),
		]
	}

	/// Builds a car handler answering from a static state source.
	pub fn static_car(id: &str) -> DeviceHandler {
		let id = ExternalDeviceId::new(id).expect("Device identifier fixture should be valid.");

		DeviceHandler::car(
			id,
			DeviceConfig::default(),
			Arc::new(StaticStateSource::new(car_states())),
		)
	}

	/// Registry seeded with one static car per identifier, in the given order.
	pub fn build_static_registry(ids: &[&str]) -> Arc<DeviceRegistry> {
		let registry = DeviceRegistry::new(Arc::new(StaticStateSource::new(car_states())));

		for id in ids {
			registry.insert(static_car(id));
		}

		Arc::new(registry)
	}

	/// Dispatcher over `registry` with the reqwest bridge used by integration tests.
	pub fn build_test_dispatcher(
		registry: Arc<DeviceRegistry>,
		commands: CommandSettings,
	) -> InteractionDispatcher<ReqwestHttpClient> {
		let bridge = CallbackAccessBridge::with_http_client(test_reqwest_http_client());

		InteractionDispatcher::new(registry, bridge).with_command_settings(commands)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "server")] use color_eyre as _;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
