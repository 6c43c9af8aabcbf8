//! Storage contracts and built-in store implementations for broker records.
//!
//! Two contracts back the handshake: [`CorrelationStore`] keeps in-flight authorization requests
//! keyed by state key, [`CredentialStore`] keeps resolved grants keyed by user + shim. Both
//! expose only atomic operations; implementations backed by a shared database must provide the
//! same per-key atomicity (conditional delete or row-level locking).

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessParameters, AuthorizationRequestParameters, ShimKey, UserId},
};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A correlation record already exists under the state key.
	#[error("A handshake record already exists for the state key `{state_key}`.")]
	DuplicateStateKey {
		/// Conflicting state key.
		state_key: String,
	},
}

/// Storage contract for in-flight handshake records.
pub trait CorrelationStore
where
	Self: Send + Sync,
{
	/// Atomically creates a record; fails with [`StoreError::DuplicateStateKey`] if the state
	/// key is already present (live or claimed).
	fn save(&self, params: AuthorizationRequestParameters) -> StoreFuture<'_, ()>;

	/// Atomically claims the live record for a state key.
	///
	/// At most one caller ever receives the record; concurrent and repeated claims observe
	/// `None`. The record stays in the store (marked claimed) until [`discard`](Self::discard),
	/// so a crash before the resolved credential lands leaves an audit trail for the sweeper.
	fn claim<'a>(
		&'a self,
		state_key: &'a str,
	) -> StoreFuture<'a, Option<AuthorizationRequestParameters>>;

	/// Removes a record once its handshake reached a terminal state.
	fn discard<'a>(&'a self, state_key: &'a str) -> StoreFuture<'a, ()>;

	/// Removes records older than the time-to-live; returns the removed count.
	fn sweep_expired(&self, ttl: Duration, now: OffsetDateTime) -> StoreFuture<'_, usize>;
}

/// Storage contract for resolved credential grants.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists a grant; existing grants for the same user + shim are retained.
	fn save(&self, grant: AccessParameters) -> StoreFuture<'_, ()>;

	/// Fetches the authoritative (most recently created) grant for a user + shim pair.
	///
	/// Creation-time ties are broken by insertion order with the later insert winning.
	fn latest<'a>(
		&'a self,
		username: &'a UserId,
		shim_key: &'a ShimKey,
	) -> StoreFuture<'a, Option<AccessParameters>>;

	/// Removes every grant for a user + shim pair; returns the removed count.
	fn remove_all<'a>(
		&'a self,
		username: &'a UserId,
		shim_key: &'a ShimKey,
	) -> StoreFuture<'a, usize>;
}

/// Unique key identifying the grants of one user + shim pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialKey {
	/// Owning user identity.
	pub username: UserId,
	/// Shim registry key.
	pub shim_key: ShimKey,
}
impl CredentialKey {
	/// Builds a key for the provided pair.
	pub fn new(username: &UserId, shim_key: &ShimKey) -> Self {
		Self { username: username.clone(), shim_key: shim_key.clone() }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_broker_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let broker_error: Error = store_error.clone().into();

		assert!(matches!(broker_error, Error::Storage(_)));
		assert!(broker_error.to_string().contains("database unreachable"));

		let source = StdError::source(&broker_error)
			.expect("Broker error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn credential_keys_compare_by_pair() {
		let alice = UserId::new("alice").expect("User fixture should be valid.");
		let fitbit = ShimKey::new("fitbit").expect("Shim key fixture should be valid.");
		let jawbone = ShimKey::new("jawbone").expect("Shim key fixture should be valid.");

		assert_eq!(CredentialKey::new(&alice, &fitbit), CredentialKey::new(&alice, &fitbit));
		assert_ne!(CredentialKey::new(&alice, &fitbit), CredentialKey::new(&alice, &jawbone));
	}
}
