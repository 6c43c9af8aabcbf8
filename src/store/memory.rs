//! Thread-safe in-memory store implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccessParameters, AuthorizationRequestParameters, ShimKey, UserId},
	store::{CorrelationStore, CredentialKey, CredentialStore, StoreError, StoreFuture},
};

#[derive(Clone, Debug)]
struct CorrelationEntry {
	params: AuthorizationRequestParameters,
	claimed: bool,
}

type CorrelationMap = Arc<RwLock<HashMap<String, CorrelationEntry>>>;
type CredentialMap = Arc<RwLock<HashMap<CredentialKey, Vec<AccessParameters>>>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
///
/// Implements both store contracts over `parking_lot` maps; every contract operation runs inside
/// a single lock critical section, which provides the per-key atomicity the handshake relies on.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	correlations: CorrelationMap,
	credentials: CredentialMap,
}
impl MemoryStore {
	fn save_correlation_now(
		map: CorrelationMap,
		params: AuthorizationRequestParameters,
	) -> Result<(), StoreError> {
		let key = params.state_key.as_str().to_owned();
		let mut guard = map.write();

		if guard.contains_key(&key) {
			return Err(StoreError::DuplicateStateKey { state_key: key });
		}

		guard.insert(key, CorrelationEntry { params, claimed: false });

		Ok(())
	}

	fn claim_now(map: CorrelationMap, state_key: String) -> Option<AuthorizationRequestParameters> {
		let mut guard = map.write();
		let entry = guard.get_mut(&state_key)?;

		if entry.claimed {
			return None;
		}

		entry.claimed = true;

		Some(entry.params.clone())
	}

	fn discard_now(map: CorrelationMap, state_key: String) {
		map.write().remove(&state_key);
	}

	fn sweep_now(map: CorrelationMap, ttl: Duration, now: OffsetDateTime) -> usize {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, entry| !entry.params.is_expired_at(ttl, now));

		before - guard.len()
	}

	fn save_credential_now(map: CredentialMap, grant: AccessParameters) {
		let key = CredentialKey::new(&grant.username, &grant.shim_key);

		map.write().entry(key).or_default().push(grant);
	}

	fn latest_now(
		map: CredentialMap,
		username: UserId,
		shim_key: ShimKey,
	) -> Option<AccessParameters> {
		let key = CredentialKey::new(&username, &shim_key);
		let guard = map.read();
		let grants = guard.get(&key)?;
		let mut authoritative: Option<&AccessParameters> = None;

		// Scanning in insertion order with `supersedes` makes the later insert win ties.
		for grant in grants {
			match authoritative {
				Some(best) if !grant.supersedes(best) => {},
				_ => authoritative = Some(grant),
			}
		}

		authoritative.cloned()
	}

	fn remove_all_now(map: CredentialMap, username: UserId, shim_key: ShimKey) -> usize {
		let key = CredentialKey::new(&username, &shim_key);

		map.write().remove(&key).map(|grants| grants.len()).unwrap_or(0)
	}

	/// Returns `true` while a correlation record (live or claimed) exists for the state key.
	pub fn contains_correlation(&self, state_key: &str) -> bool {
		self.correlations.read().contains_key(state_key)
	}

	/// Number of stored grants for a user + shim pair, including superseded ones.
	pub fn credential_count(&self, username: &UserId, shim_key: &ShimKey) -> usize {
		self.credentials
			.read()
			.get(&CredentialKey::new(username, shim_key))
			.map(Vec::len)
			.unwrap_or(0)
	}
}
impl CorrelationStore for MemoryStore {
	fn save(&self, params: AuthorizationRequestParameters) -> StoreFuture<'_, ()> {
		let map = self.correlations.clone();

		Box::pin(async move { Self::save_correlation_now(map, params) })
	}

	fn claim<'a>(
		&'a self,
		state_key: &'a str,
	) -> StoreFuture<'a, Option<AuthorizationRequestParameters>> {
		let map = self.correlations.clone();
		let state_key = state_key.to_owned();

		Box::pin(async move { Ok(Self::claim_now(map, state_key)) })
	}

	fn discard<'a>(&'a self, state_key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.correlations.clone();
		let state_key = state_key.to_owned();

		Box::pin(async move {
			Self::discard_now(map, state_key);

			Ok(())
		})
	}

	fn sweep_expired(&self, ttl: Duration, now: OffsetDateTime) -> StoreFuture<'_, usize> {
		let map = self.correlations.clone();

		Box::pin(async move { Ok(Self::sweep_now(map, ttl, now)) })
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, grant: AccessParameters) -> StoreFuture<'_, ()> {
		let map = self.credentials.clone();

		Box::pin(async move {
			Self::save_credential_now(map, grant);

			Ok(())
		})
	}

	fn latest<'a>(
		&'a self,
		username: &'a UserId,
		shim_key: &'a ShimKey,
	) -> StoreFuture<'a, Option<AccessParameters>> {
		let map = self.credentials.clone();
		let username = username.to_owned();
		let shim_key = shim_key.to_owned();

		Box::pin(async move { Ok(Self::latest_now(map, username, shim_key)) })
	}

	fn remove_all<'a>(
		&'a self,
		username: &'a UserId,
		shim_key: &'a ShimKey,
	) -> StoreFuture<'a, usize> {
		let map = self.credentials.clone();
		let username = username.to_owned();
		let shim_key = shim_key.to_owned();

		Box::pin(async move { Ok(Self::remove_all_now(map, username, shim_key)) })
	}
}
