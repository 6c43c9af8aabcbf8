//! The handshake state machine: initiation, callback completion, and record sweeping.
//!
//! A handshake moves from initiated (correlation record persisted, state key issued) to either
//! resolved (credential persisted, record discarded) or failed (record discarded, no credential).
//! State keys are single-use: the correlation store's atomic claim guarantees at most one
//! callback ever completes a given handshake.

/// Outcome counters wired into the handshake state machine.
pub mod metrics;

pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessParameters, AuthorizationRequestParameters, StateKey, UserId},
	flows::{ShimBroker, common},
	obs::{FlowKind, FlowOutcome, FlowSpan, record_flow_outcome},
	shim::{AuthorizationResolution, CallbackPayload},
};

/// Result of a completed callback; the output modes are mutually exclusive.
///
/// When the handshake recorded a client redirect target, the boundary layer must perform an HTTP
/// redirect and emit no response body; otherwise it returns the resolution as the body.
#[derive(Clone, Debug)]
pub enum CompletionOutcome {
	/// No redirect target was recorded; return the resolution to the caller.
	Resolved(AuthorizationResolution),
	/// Redirect the user agent to the recorded client target.
	Redirect(Url),
}
impl CompletionOutcome {
	/// Returns the redirect target when the caller must perform a redirect.
	pub fn redirect_target(&self) -> Option<&Url> {
		match self {
			CompletionOutcome::Redirect(url) => Some(url),
			CompletionOutcome::Resolved(_) => None,
		}
	}

	/// Returns the resolution when the caller should respond with a body.
	pub fn resolution(&self) -> Option<&AuthorizationResolution> {
		match self {
			CompletionOutcome::Resolved(resolution) => Some(resolution),
			CompletionOutcome::Redirect(_) => None,
		}
	}
}

impl ShimBroker {
	/// Starts an authorization handshake for a user against a registered shim.
	///
	/// Resolves the shim, lets it draft the provider-specific request fields, issues a fresh
	/// state key, and persists the correlation record. The caller redirects the user to the
	/// provider using the returned fields; the state key must round-trip through the provider's
	/// callback. An empty `client_redirect_url` is treated as absent.
	pub async fn authorize(
		&self,
		username: &UserId,
		shim_key: &str,
		client_redirect_url: Option<&str>,
		options: &BTreeMap<String, String>,
	) -> Result<AuthorizationRequestParameters> {
		record_flow_outcome(FlowKind::Authorize, FlowOutcome::Attempt);

		let span = FlowSpan::new(FlowKind::Authorize, "start");
		let result = span
			.instrument(self.authorize_inner(username, shim_key, client_redirect_url, options))
			.await;

		record_flow_outcome(
			FlowKind::Authorize,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	async fn authorize_inner(
		&self,
		username: &UserId,
		shim_key: &str,
		client_redirect_url: Option<&str>,
		options: &BTreeMap<String, String>,
	) -> Result<AuthorizationRequestParameters> {
		self.correlations.sweep_expired(self.correlation_ttl(), OffsetDateTime::now_utc()).await?;

		let shim = self.registry.resolve(shim_key)?;
		let draft = shim.build_authorization_request(username, options)?;
		let params = AuthorizationRequestParameters::new(
			StateKey::generate(),
			username.clone(),
			shim.key().clone(),
			client_redirect_url.filter(|target| !target.is_empty()).map(str::to_owned),
			draft.request_fields,
		);

		self.correlations.save(params.clone()).await?;
		self.handshake_metrics.record_started();

		Ok(params)
	}

	/// Completes a handshake from an inbound provider callback.
	///
	/// The state key is claimed before any shim-specific processing; expired, replayed, forged,
	/// and already-claimed keys all fail with [`Error::UnknownCorrelation`] here. On successful
	/// resolution the credential is persisted strictly before the correlation record is
	/// discarded, so a crash between the two steps never loses a resolved credential. Denials
	/// and protocol failures discard the record and write no credential.
	pub async fn complete_callback(
		&self,
		shim_key: &str,
		callback: &CallbackPayload,
	) -> Result<CompletionOutcome> {
		record_flow_outcome(FlowKind::Callback, FlowOutcome::Attempt);

		let span = FlowSpan::new(FlowKind::Callback, "complete");
		let result = span.instrument(self.complete_inner(shim_key, callback)).await;

		record_flow_outcome(
			FlowKind::Callback,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	async fn complete_inner(
		&self,
		shim_key: &str,
		callback: &CallbackPayload,
	) -> Result<CompletionOutcome> {
		let state_key = callback.state().ok_or_else(|| Error::ShimProtocol {
			reason: "callback is missing the state parameter".into(),
		})?;
		let record = self
			.correlations
			.claim(state_key)
			.await?
			.ok_or_else(|| Error::UnknownCorrelation { state_key: state_key.to_owned() })?;

		common::ensure_shim_consistent(&record, shim_key)?;

		let shim = self.registry.resolve(shim_key)?;
		let resolution = match shim.resolve_callback(callback).await {
			Ok(resolution) => resolution,
			Err(e) => {
				self.correlations.discard(state_key).await?;
				self.record_failure(&e);

				return Err(e);
			},
		};
		let grant = AccessParameters::new(
			record.username.clone(),
			record.shim_key.clone(),
			resolution.payload.clone(),
		);

		self.credentials.save(grant).await?;
		// Credential persistence happens-before correlation-record disposal.
		self.correlations.discard(state_key).await?;
		self.handshake_metrics.record_resolved();

		match record.client_redirect_url.as_deref().filter(|target| !target.is_empty()) {
			Some(target) => {
				let url = Url::parse(target).map_err(|e| Error::RedirectTarget {
					target: target.to_owned(),
					source: e,
				})?;

				Ok(CompletionOutcome::Redirect(url))
			},
			None => Ok(CompletionOutcome::Resolved(resolution)),
		}
	}

	/// Removes handshake records that outlived the configured time-to-live.
	///
	/// Also runs opportunistically on every [`authorize`](Self::authorize) call; hosts with a
	/// scheduler can invoke it directly.
	pub async fn sweep_expired_correlations(&self) -> Result<usize> {
		Ok(self
			.correlations
			.sweep_expired(self.correlation_ttl(), OffsetDateTime::now_utc())
			.await?)
	}

	fn record_failure(&self, error: &Error) {
		match error {
			Error::AuthorizationDenied { .. } => self.handshake_metrics.record_denied(),
			_ => self.handshake_metrics.record_failed(),
		}
	}
}
