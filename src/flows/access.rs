//! Authorized data retrieval and revocation using persisted credential grants.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	flows::ShimBroker,
	obs::{FlowKind, FlowOutcome, FlowSpan, record_flow_outcome},
	shim::{DataPayload, DataRequest},
};

impl ShimBroker {
	/// Performs an authorized data request on behalf of a user.
	///
	/// Looks up the most recent grant for the user + shim pair and delegates to the shim's data
	/// API. Fails with [`Error::NotAuthorized`] when no grant exists and rewraps the shim's
	/// [`Error::CredentialExpired`] as [`Error::ReauthorizationRequired`] so the caller knows to
	/// start a fresh handshake rather than retry.
	pub async fn fetch_data(
		&self,
		username: &UserId,
		shim_key: &str,
		request: &DataRequest,
	) -> Result<DataPayload> {
		record_flow_outcome(FlowKind::FetchData, FlowOutcome::Attempt);

		let span = FlowSpan::new(FlowKind::FetchData, "fetch");
		let result = span.instrument(self.fetch_inner(username, shim_key, request)).await;

		record_flow_outcome(
			FlowKind::FetchData,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	async fn fetch_inner(
		&self,
		username: &UserId,
		shim_key: &str,
		request: &DataRequest,
	) -> Result<DataPayload> {
		let shim = self.registry.resolve(shim_key)?;
		let grant =
			self.credentials.latest(username, shim.key()).await?.ok_or_else(|| {
				Error::NotAuthorized {
					username: username.as_ref().to_owned(),
					shim_key: shim_key.to_owned(),
				}
			})?;

		shim.fetch_data(&grant, request).await.map_err(|e| match e {
			Error::CredentialExpired => Error::ReauthorizationRequired {
				username: username.as_ref().to_owned(),
				shim_key: shim_key.to_owned(),
			},
			other => other,
		})
	}

	/// Removes every credential grant for a user + shim pair.
	///
	/// Idempotent: repeated calls after the first remove zero grants.
	pub async fn deauthorize(&self, username: &UserId, shim_key: &str) -> Result<usize> {
		record_flow_outcome(FlowKind::Deauthorize, FlowOutcome::Attempt);

		let span = FlowSpan::new(FlowKind::Deauthorize, "revoke");
		let result = span.instrument(self.deauthorize_inner(username, shim_key)).await;

		record_flow_outcome(
			FlowKind::Deauthorize,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	async fn deauthorize_inner(&self, username: &UserId, shim_key: &str) -> Result<usize> {
		let shim = self.registry.resolve(shim_key)?;

		Ok(self.credentials.remove_all(username, shim.key()).await?)
	}
}
