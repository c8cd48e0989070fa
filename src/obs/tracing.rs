// self
use crate::{_prelude::*, error::UpstreamError, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by grant and interaction operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("partner_schema_mock.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a device whose refresh failed and was dropped from a fleet-wide result.
pub fn warn_device_dropped(device_id: &str, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(device_id, error = %err, "device state refresh failed; omitting device");
	#[cfg(not(feature = "tracing"))]
	let _ = (device_id, err);
}

/// Logs the real cause of a failed partner token exchange.
pub fn warn_upstream_failure(token_url: &str, err: &UpstreamError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		token_url,
		status = ?err.status(),
		error = %err,
		source = ?StdError::source(err).map(ToString::to_string),
		"partner token exchange failed"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (token_url, err);
}

/// Logs an interaction failure before it is normalized into a generic 500 reply.
pub fn warn_interaction_failed(interaction: &str, request_id: &str, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(interaction, request_id, error = %err, "interaction handler failed");
	#[cfg(not(feature = "tracing"))]
	let _ = (interaction, request_id, err);
}

/// Logs a command accepted by a device handler.
pub fn info_command(device_id: &str, command: &str, capability: &str, component: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(device_id, command, capability, component, "handling device command");
	#[cfg(not(feature = "tracing"))]
	let _ = (device_id, command, capability, component);
}
