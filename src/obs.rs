//! Optional observability helpers for grant and interaction operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `partner_schema_mock.op` with the `op` and
//!   `stage` fields, plus warning events for failures that are recovered instead of returned.
//! - Enable `metrics` to increment the `partner_schema_mock_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the mock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Login form submission minting an authorization code.
	Authorize,
	/// Authorization code redemption at the token endpoint.
	TokenExchange,
	/// Bearer token validation for the userinfo endpoint.
	Introspect,
	/// Partner `discoveryRequest` interaction.
	Discovery,
	/// Partner `grantCallbackAccess` interaction.
	CallbackAccess,
	/// Partner `stateRefreshRequest` interaction.
	StateRefresh,
	/// Partner `commandRequest` interaction.
	Command,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Authorize => "authorize",
			OpKind::TokenExchange => "token_exchange",
			OpKind::Introspect => "introspect",
			OpKind::Discovery => "discovery",
			OpKind::CallbackAccess => "callback_access",
			OpKind::StateRefresh => "state_refresh",
			OpKind::Command => "command",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span, recording attempt and outcome.
pub(crate) async fn observe<T, Fut>(kind: OpKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OpSpan::new(kind, stage);

	record_op_outcome(kind, OpOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(_) => record_op_outcome(kind, OpOutcome::Failure),
	}

	result
}
