//! `/userinfo` operation: stateless bearer token validation.

// self
use crate::{
	_prelude::*,
	grant::AuthorizationCodeFlow,
	obs::{self, OpKind, OpOutcome},
};

const BEARER_PREFIX: &str = "Bearer ";

/// Identity claims returned for a valid bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Subject the token was issued to.
	pub sub: String,
	/// Display name (the subject).
	pub name: String,
	/// Derived mailbox `<sub>@<identity_email_domain>`.
	pub email: String,
}

impl AuthorizationCodeFlow {
	/// Validates an `Authorization` header value and derives the caller's identity.
	pub fn introspect(&self, authorization: Option<&str>) -> Result<Identity> {
		obs::record_op_outcome(OpKind::Introspect, OpOutcome::Attempt);

		let result = authorization
			.and_then(|header| header.strip_prefix(BEARER_PREFIX))
			.ok_or(Error::MissingToken)
			.and_then(|token| self.signer().verify(token.trim()))
			.map(|claims| Identity {
				email: format!("{}@{}", email_local_part(&claims.sub), self.settings.identity_email_domain),
				name: claims.sub.clone(),
				sub: claims.sub,
			});

		match &result {
			Ok(_) => obs::record_op_outcome(OpKind::Introspect, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OpKind::Introspect, OpOutcome::Failure),
		}

		result
	}
}

fn email_local_part(subject: &str) -> String {
	subject.split_whitespace().collect::<Vec<_>>().join(".").to_lowercase()
}
