//! HS256 access-token signing and verification.
//!
//! Access tokens are self-describing: validity is decided by signature and `exp` alone, so
//! [`AccessTokenSigner::verify`] never consults the token store.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
// self
use crate::{
	_prelude::*,
	auth::{Subject, TokenSecret},
};

/// Claims carried by every access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
	/// Subject the token was issued to.
	pub sub: String,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
	/// Unique token id so two tokens minted in the same second differ.
	pub jti: String,
}

/// Signs and verifies access tokens with a process-wide shared secret.
#[derive(Clone)]
pub struct AccessTokenSigner {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
}
impl AccessTokenSigner {
	/// Creates a signer for the provided HMAC secret.
	pub fn new(secret: impl AsRef<[u8]>) -> Self {
		let secret = secret.as_ref();
		let mut validation = Validation::new(Algorithm::HS256);

		validation.leeway = 0;

		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation,
		}
	}

	/// Signs an access token for `subject` that expires `ttl` after `issued_at`.
	pub fn sign(
		&self,
		subject: &Subject,
		issued_at: OffsetDateTime,
		ttl: Duration,
	) -> Result<TokenSecret> {
		let claims = AccessClaims {
			sub: subject.to_string(),
			iat: issued_at.unix_timestamp(),
			exp: (issued_at + ttl).unix_timestamp(),
			jti: TokenSecret::generate().fingerprint(),
		};
		let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
			.map_err(|source| Error::Signing { source })?;

		Ok(TokenSecret::new(token))
	}

	/// Verifies the signature and expiry of `token`, returning its claims.
	pub fn verify(&self, token: &str) -> Result<AccessClaims> {
		decode::<AccessClaims>(token, &self.decoding, &self.validation)
			.map(|data| data.claims)
			.map_err(|err| {
				let reason = match err.kind() {
					ErrorKind::ExpiredSignature => "token expired",
					ErrorKind::InvalidSignature => "signature mismatch",
					_ => "token malformed",
				};

				Error::InvalidToken { reason: reason.into() }
			})
	}
}
impl Debug for AccessTokenSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AccessTokenSigner(..)")
	}
}
