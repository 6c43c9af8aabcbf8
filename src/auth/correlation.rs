//! In-flight handshake records and the state keys that correlate them.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{ShimKey, UserId},
};

const STATE_KEY_LEN: usize = 32;

/// Opaque value linking an outbound authorization redirect to its eventual inbound callback.
///
/// Keys are generated from a cryptographically secure RNG and are single-use: once a callback
/// claims a key, any later callback carrying the same key is rejected.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);
impl StateKey {
	/// Generates a fresh random state key.
	pub fn generate() -> Self {
		Self(rand::rng().sample_iter(Alphanumeric).take(STATE_KEY_LEN).map(char::from).collect())
	}

	/// Wraps a state key value received back from a provider callback.
	pub fn from_callback(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the key value for embedding into the outbound authorization request.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for StateKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for StateKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("StateKey").field(&self.0).finish()
	}
}
impl Display for StateKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// One in-flight handshake, persisted between initiation and the provider callback.
///
/// The record is created by [`ShimBroker::authorize`](crate::flows::ShimBroker::authorize),
/// claimed exactly once by the callback handler, and discarded after the resolved credential has
/// been persisted (or the handshake failed). The client redirect target is kept as the raw string
/// supplied at initiation; it is parsed only when the redirect is actually performed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizationRequestParameters {
	/// Unique correlation state key; never reused across handshakes.
	pub state_key: StateKey,
	/// Owning user identity.
	pub username: UserId,
	/// Shim the handshake was started against.
	pub shim_key: ShimKey,
	/// Optional client redirect target to complete after resolution.
	pub client_redirect_url: Option<String>,
	/// Shim-specific request fields (authorization URL, scope, nonce, ...).
	pub request_fields: BTreeMap<String, String>,
	/// Creation instant used for TTL sweeping.
	pub created_at: OffsetDateTime,
}
impl AuthorizationRequestParameters {
	/// Assembles a record stamped with the current instant.
	pub fn new(
		state_key: StateKey,
		username: UserId,
		shim_key: ShimKey,
		client_redirect_url: Option<String>,
		request_fields: BTreeMap<String, String>,
	) -> Self {
		Self {
			state_key,
			username,
			shim_key,
			client_redirect_url,
			request_fields,
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Returns `true` once the record has outlived the provided time-to-live.
	pub fn is_expired_at(&self, ttl: Duration, now: OffsetDateTime) -> bool {
		now - self.created_at >= ttl
	}
}
