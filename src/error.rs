//! Broker-level error types shared across flows, shims, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Identifier validation failure.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),

	/// No shim is registered under the requested key.
	#[error("No shim is registered under the key `{shim_key}`.")]
	UnknownShim {
		/// Shim registry key that failed to resolve.
		shim_key: String,
	},
	/// Shim is registered but not usable (e.g., missing client credentials).
	#[error("Shim `{shim_key}` is not correctly configured: {reason}.")]
	ShimConfiguration {
		/// Shim registry key.
		shim_key: String,
		/// Shim-supplied reason string.
		reason: String,
	},
	/// Callback carried a state key with no live in-flight handshake.
	///
	/// Covers expired, replayed, and forged state keys alike; callers must start a new handshake.
	#[error("No in-flight handshake matches the state key `{state_key}`.")]
	UnknownCorrelation {
		/// State key extracted from the callback payload.
		state_key: String,
	},
	/// The user declined the authorization request at the provider.
	#[error("Authorization was denied: {reason}.")]
	AuthorizationDenied {
		/// Provider- or shim-supplied reason string.
		reason: String,
	},
	/// Callback or provider response was malformed; not retryable.
	#[error("Shim protocol violation: {reason}.")]
	ShimProtocol {
		/// Shim-supplied reason string.
		reason: String,
	},
	/// Stored credential was rejected as expired by the provider.
	#[error("Stored credential has expired at the provider.")]
	CredentialExpired,
	/// Provider is temporarily unreachable; safe to retry.
	#[error("Shim provider is temporarily unavailable: {reason}.")]
	ShimUnavailable {
		/// Shim-supplied reason string.
		reason: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// No credential is on record for the user + shim pair.
	#[error("User `{username}` has not authorized shim `{shim_key}`.")]
	NotAuthorized {
		/// Owning user identity.
		username: String,
		/// Shim registry key.
		shim_key: String,
	},
	/// Credential expired during data retrieval; the caller must run a new handshake.
	#[error("User `{username}` must re-authorize shim `{shim_key}`.")]
	ReauthorizationRequired {
		/// Owning user identity.
		username: String,
		/// Shim registry key.
		shim_key: String,
	},
	/// Client redirect target recorded at initiation could not be parsed at completion time.
	///
	/// The resolved credential has already been persisted when this is surfaced.
	#[error("Client redirect target `{target}` is invalid.")]
	RedirectTarget {
		/// Raw redirect target recorded with the handshake.
		target: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl Error {
	/// Returns `true` when the caller may retry the same operation without any state change.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::ShimUnavailable { .. })
	}
}
