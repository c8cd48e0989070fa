//! Opaque token secrets with redacted formatting and store fingerprints.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Random bytes behind every minted authorization code and refresh token.
pub const SECRET_ENTROPY_BYTES: usize = 32;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Mints a fresh URL-safe secret from the thread-local CSPRNG.
	pub fn generate() -> Self {
		let mut bytes = [0_u8; SECRET_ENTROPY_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		Self(URL_SAFE_NO_PAD.encode(bytes))
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Store key for this secret; the raw value never becomes a map key.
	pub fn fingerprint(&self) -> String {
		fingerprint(&self.0)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Base64 (no padding) SHA-256 digest of a presented secret.
pub fn fingerprint(raw: &str) -> String {
	let digest = Sha256::digest(raw.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}
