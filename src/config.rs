//! Runtime configuration.
//!
//! Values come from built-in defaults, the legacy `PORT`/`JWT_SECRET` variables, and
//! `SMARTMOCK__*` variables, later sources winning (`SMARTMOCK__PORT=8080`,
//! `SMARTMOCK__COMMAND_MODE=delegate`).

// crates.io
use ::config::{Config, Environment, Map};
// self
use crate::{
	_prelude::*,
	auth::AccessTokenSigner,
	device::{StateSource, StaticStateSource},
	error::ConfigError,
	grant::GrantSettings,
	interaction::{CommandMode, CommandSettings},
};

/// Prefix of the environment variables read by [`MockConfig::load`].
pub const ENV_PREFIX: &str = "SMARTMOCK";
/// Signing secret used when none is configured; refused by shared deployments.
pub const PLACEHOLDER_SIGNING_SECRET: &str = "dev-secret";

/// Where the mock runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deployment {
	/// Local, throwaway instance.
	#[default]
	Mock,
	/// Instance reachable by other people; placeholder secrets are refused.
	Shared,
}
impl Deployment {
	/// Configuration label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Deployment::Mock => "mock",
			Deployment::Shared => "shared",
		}
	}
}

/// Mock server configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
	/// Listening port.
	pub port: u16,
	/// HS256 secret for access tokens.
	pub signing_secret: String,
	/// Deployment kind.
	pub deployment: Deployment,
	/// Access token lifetime in seconds.
	pub access_token_ttl_secs: u64,
	/// Authorization code lifetime in seconds.
	pub code_ttl_secs: u64,
	/// Domain of the derived identity email.
	pub identity_email_domain: String,
	/// Budget for outbound partner token requests in seconds.
	pub upstream_timeout_secs: u64,
	/// Per-device state refresh budget in seconds.
	pub state_timeout_secs: u64,
	/// How command interactions are answered.
	pub command_mode: CommandMode,
	/// Artificial command latency in milliseconds.
	pub command_delay_ms: u64,
	/// Remote JSON state fixture for the default car.
	pub car_states_url: Option<Url>,
	/// Secret sent to partner token endpoints when a grant payload omits it.
	pub partner_client_secret: Option<String>,
}
impl MockConfig {
	/// Loads configuration from the process environment and validates it.
	pub fn load() -> Result<Self, ConfigError> {
		Self::from_env(std::env::vars().collect())
	}

	/// Loads configuration from an explicit variable map and validates it.
	pub fn from_env(vars: Map<String, String>) -> Result<Self, ConfigError> {
		let mut builder = Config::builder();

		if let Some(port) = vars.get("PORT") {
			builder = builder.set_default("port", port.as_str())?;
		}
		if let Some(secret) = vars.get("JWT_SECRET") {
			builder = builder.set_default("signing_secret", secret.as_str())?;
		}

		let config: Self = builder
			.add_source(
				Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true).source(Some(vars)),
			)
			.build()?
			.try_deserialize()?;

		config.validate()?;

		Ok(config)
	}

	/// Rejects settings that cannot run.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.deployment == Deployment::Shared && self.signing_secret == PLACEHOLDER_SIGNING_SECRET
		{
			return Err(ConfigError::PlaceholderSecret { deployment: self.deployment.as_str() });
		}

		for (setting, value) in [
			("access_token_ttl_secs", self.access_token_ttl_secs),
			("code_ttl_secs", self.code_ttl_secs),
			("upstream_timeout_secs", self.upstream_timeout_secs),
			("state_timeout_secs", self.state_timeout_secs),
		] {
			if value == 0 {
				return Err(ConfigError::ZeroDuration { setting });
			}
		}

		Ok(())
	}

	/// Signer for local access tokens.
	pub fn signer(&self) -> AccessTokenSigner {
		AccessTokenSigner::new(&self.signing_secret)
	}

	/// Lifetimes and identity settings for the local grant.
	pub fn grant_settings(&self) -> GrantSettings {
		GrantSettings {
			access_token_ttl: Duration::seconds(saturating_i64(self.access_token_ttl_secs)),
			code_ttl: Duration::seconds(saturating_i64(self.code_ttl_secs)),
			identity_email_domain: self.identity_email_domain.clone(),
		}
	}

	/// Budget for outbound partner token requests.
	pub fn upstream_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.upstream_timeout_secs)
	}

	/// Per-device state refresh budget.
	pub fn state_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.state_timeout_secs)
	}

	/// Command behavior of the dispatcher.
	pub fn command_settings(&self) -> CommandSettings {
		CommandSettings {
			mode: self.command_mode,
			delay: StdDuration::from_millis(self.command_delay_ms),
		}
	}

	/// State source backing the default car: the remote fixture when configured, otherwise the
	/// built-in one.
	pub fn state_source(&self) -> Result<Arc<dyn StateSource>> {
		match &self.car_states_url {
			#[cfg(feature = "reqwest")]
			Some(url) => Ok(Arc::new(crate::device::HttpStateSource::new(
				url.clone(),
				self.state_timeout(),
			)?)),
			_ => Ok(Arc::new(StaticStateSource::car_fixture())),
		}
	}
}
impl Default for MockConfig {
	fn default() -> Self {
		let grant = GrantSettings::default();

		Self {
			port: 3000,
			signing_secret: PLACEHOLDER_SIGNING_SECRET.into(),
			deployment: Deployment::default(),
			access_token_ttl_secs: grant.access_token_ttl.whole_seconds().unsigned_abs(),
			code_ttl_secs: grant.code_ttl.whole_seconds().unsigned_abs(),
			identity_email_domain: grant.identity_email_domain,
			upstream_timeout_secs: crate::http::DEFAULT_UPSTREAM_TIMEOUT.as_secs(),
			state_timeout_secs: crate::device::DEFAULT_REFRESH_TIMEOUT.as_secs(),
			command_mode: CommandMode::default(),
			command_delay_ms: 0,
			car_states_url: None,
			partner_client_secret: None,
		}
	}
}
impl Debug for MockConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MockConfig")
			.field("port", &self.port)
			.field("signing_secret_is_placeholder", &(self.signing_secret == PLACEHOLDER_SIGNING_SECRET))
			.field("deployment", &self.deployment)
			.field("access_token_ttl_secs", &self.access_token_ttl_secs)
			.field("code_ttl_secs", &self.code_ttl_secs)
			.field("identity_email_domain", &self.identity_email_domain)
			.field("upstream_timeout_secs", &self.upstream_timeout_secs)
			.field("state_timeout_secs", &self.state_timeout_secs)
			.field("command_mode", &self.command_mode)
			.field("command_delay_ms", &self.command_delay_ms)
			.field("car_states_url", &self.car_states_url)
			.field("partner_client_secret_set", &self.partner_client_secret.is_some())
			.finish()
	}
}

/// Loads `.env` from the working directory when present; a missing file is not an error.
#[cfg(feature = "server")]
pub fn load_dotenv() -> Result<(), ConfigError> {
	match dotenvy::dotenv() {
		Ok(_) => Ok(()),
		Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(ConfigError::Dotenv { source: Box::new(e) }),
	}
}

fn saturating_i64(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}
