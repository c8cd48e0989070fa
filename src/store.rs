//! Storage contract and the in-memory store for authorization codes and issued tokens.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, Subject, TokenSecret},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the local authorization server.
///
/// Every key is the [`TokenSecret::fingerprint`] of a secret, never the secret itself.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists a freshly minted authorization code.
	fn save_code(&self, record: CodeRecord) -> StoreFuture<'_, ()>;

	/// Atomically looks up and removes the code so it can be redeemed at most once.
	fn take_code<'a>(&'a self, code: &'a str, now: OffsetDateTime)
	-> StoreFuture<'a, CodeRedemption>;

	/// Drops every code whose expiry is at or before `now`, returning how many were removed.
	fn purge_expired_codes(&self, now: OffsetDateTime) -> StoreFuture<'_, usize>;

	/// Records an issued grant, superseding the subject's previous refresh token.
	fn save_grant(&self, grant: GrantRecord) -> StoreFuture<'_, ()>;

	/// Resolves a presented access or refresh token to its binding, if recorded.
	fn lookup_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<TokenBinding>>;
}

/// Authorization code awaiting redemption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodeRecord {
	/// Code value handed to the redirect URI.
	pub code: TokenSecret,
	/// Client the code was issued to; absent when the login form carried no usable id.
	pub client_id: Option<ClientId>,
	/// Subject that submitted credentials.
	pub subject: Subject,
	/// Redirect URI the code was delivered to.
	pub redirect_uri: Url,
	/// Issuance instant.
	pub issued_at: OffsetDateTime,
	/// Instant after which the code can no longer be redeemed.
	pub expires_at: OffsetDateTime,
}
impl CodeRecord {
	/// Returns true when the code can no longer be redeemed at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

/// Outcome of an authorization code redemption attempt.
#[derive(Clone, Debug)]
pub enum CodeRedemption {
	/// The code existed, was live, and has now been removed.
	Redeemed(CodeRecord),
	/// The code existed but had expired; it has been removed.
	Expired,
	/// No such code (never issued or already redeemed).
	Missing,
}

/// Access/refresh pair recorded for bookkeeping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrantRecord {
	/// Subject the grant belongs to.
	pub subject: Subject,
	/// Client the originating code was issued to.
	pub client_id: Option<ClientId>,
	/// Signed access token.
	pub access_token: TokenSecret,
	/// Opaque refresh token.
	pub refresh_token: TokenSecret,
	/// Issuance instant.
	pub issued_at: OffsetDateTime,
	/// Access token expiry.
	pub expires_at: OffsetDateTime,
}

/// Which half of a grant a token belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
	/// Signed bearer access token.
	Access,
	/// Opaque refresh token.
	Refresh,
}

/// What the store knows about a presented token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
	/// Subject the token was issued to.
	pub subject: Subject,
	/// Client the token was issued to.
	pub client_id: Option<ClientId>,
	/// Token half.
	pub kind: TokenKind,
	/// Expiry for access tokens; refresh tokens live until superseded.
	pub expires_at: Option<OffsetDateTime>,
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
