//! Local OAuth 2.0 authorization-code grant: login, code exchange, and token introspection.
//!
//! [`AuthorizationCodeFlow`] owns the token store and signer. Operations are split by
//! endpoint: [`login`] backs `/authorize`, [`token`] backs `/token`, and [`introspect`]
//! backs `/userinfo`.

pub mod introspect;
pub mod login;
pub mod token;

pub use introspect::*;
pub use login::*;
pub use token::*;

// self
use crate::{_prelude::*, auth::AccessTokenSigner, store::TokenStore};

/// Lifetimes and identity settings applied by [`AuthorizationCodeFlow`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantSettings {
	/// Lifetime of signed access tokens.
	pub access_token_ttl: Duration,
	/// Lifetime of unredeemed authorization codes.
	pub code_ttl: Duration,
	/// Domain used to derive the `email` identity claim.
	pub identity_email_domain: String,
}
impl GrantSettings {
	/// Default access token lifetime (one hour).
	pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::seconds(3600);
	/// Default authorization code lifetime (ten minutes).
	pub const DEFAULT_CODE_TTL: Duration = Duration::seconds(600);
}
impl Default for GrantSettings {
	fn default() -> Self {
		Self {
			access_token_ttl: Self::DEFAULT_ACCESS_TOKEN_TTL,
			code_ttl: Self::DEFAULT_CODE_TTL,
			identity_email_domain: "example.com".into(),
		}
	}
}

/// Issues authorization codes and bearer/refresh tokens for a single mock client.
#[derive(Clone)]
pub struct AuthorizationCodeFlow {
	/// Store holding pending codes and issued tokens.
	pub store: Arc<dyn TokenStore>,
	/// Lifetimes and identity settings.
	pub settings: GrantSettings,
	signer: AccessTokenSigner,
}
impl AuthorizationCodeFlow {
	/// Creates a flow with default [`GrantSettings`].
	pub fn new(store: Arc<dyn TokenStore>, signer: AccessTokenSigner) -> Self {
		Self { store, settings: GrantSettings::default(), signer }
	}

	/// Replaces the lifetimes and identity settings.
	pub fn with_settings(mut self, settings: GrantSettings) -> Self {
		self.settings = settings;

		self
	}

	pub(crate) fn signer(&self) -> &AccessTokenSigner {
		&self.signer
	}
}
impl Debug for AuthorizationCodeFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeFlow").field("settings", &self.settings).finish()
	}
}
