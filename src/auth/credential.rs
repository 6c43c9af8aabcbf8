//! Resolved credential grants persisted for ongoing data retrieval.

// self
use crate::{
	_prelude::*,
	auth::{CredentialSecret, ShimKey, UserId},
};

/// Opaque, shim-defined credential material (tokens, secrets) keyed by field name.
///
/// The broker core never interprets the contents; shims read them back during data retrieval.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialPayload(BTreeMap<String, CredentialSecret>);
impl CredentialPayload {
	/// Creates an empty payload.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a named secret, builder-style.
	pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(name.into(), CredentialSecret::new(value));

		self
	}

	/// Looks up a named secret.
	pub fn secret(&self, name: &str) -> Option<&CredentialSecret> {
		self.0.get(name)
	}

	/// Returns `true` when no secrets are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of named secrets in the payload.
	pub fn len(&self) -> usize {
		self.0.len()
	}
}

/// One resolved credential grant for a user + shim pair.
///
/// Multiple grants may coexist per pair (re-authorization); the most recently created one is
/// authoritative for new data requests. Records are never mutated after creation; revocation
/// removes them wholesale.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessParameters {
	/// Owning user identity.
	pub username: UserId,
	/// Shim that issued the credential.
	pub shim_key: ShimKey,
	/// Shim-specific credential material.
	pub payload: CredentialPayload,
	/// Creation instant; recency selects the authoritative grant.
	pub created_at: OffsetDateTime,
}
impl AccessParameters {
	/// Assembles a grant stamped with the current instant.
	pub fn new(username: UserId, shim_key: ShimKey, payload: CredentialPayload) -> Self {
		Self { username, shim_key, payload, created_at: OffsetDateTime::now_utc() }
	}

	/// Returns `true` when this grant is at least as recent as `other`.
	///
	/// Equal timestamps favor `self`, so scanning in insertion order with this predicate makes
	/// the later insert win ties.
	pub fn supersedes(&self, other: &Self) -> bool {
		self.created_at >= other.created_at
	}
}
