//! Shim capability contract and the registry that resolves shim keys to implementations.
//!
//! A shim adapts one third-party provider's authorization protocol variant and data API to the
//! broker's uniform handshake. Implementations stay wire-format agnostic at this boundary: the
//! broker hands them opaque callback parameters and opaque credential payloads and never
//! inspects either.

pub mod pkce;
pub mod registry;

pub use pkce::*;
pub use registry::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessParameters, CredentialPayload, ShimKey, UserId},
};

/// Query parameter carrying the correlation state key in provider callbacks.
pub const STATE_PARAM: &str = "state";

/// Boxed future returned by shim operations that may perform network calls.
pub type ShimFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capability contract implemented once per third-party shim.
pub trait Shim
where
	Self: Send + Sync,
{
	/// Registry key identifying this shim.
	fn key(&self) -> &ShimKey;

	/// Produces the shim-specific request fields for a new authorization handshake.
	///
	/// The broker assigns the correlation state key afterwards; drafts never carry one. Fails
	/// with [`Error::ShimConfiguration`] when the shim lacks working client credentials.
	fn build_authorization_request(
		&self,
		username: &UserId,
		options: &BTreeMap<String, String>,
	) -> Result<AuthorizationRequestDraft>;

	/// Validates an inbound provider callback and exchanges it for credential material.
	///
	/// Fails with [`Error::AuthorizationDenied`] when the user declined and
	/// [`Error::ShimProtocol`] when the callback is malformed or a verification step fails.
	fn resolve_callback<'a>(
		&'a self,
		callback: &'a CallbackPayload,
	) -> ShimFuture<'a, AuthorizationResolution>;

	/// Performs an authorized data request using a stored credential.
	///
	/// Fails with [`Error::CredentialExpired`] when the provider rejects the credential (the
	/// caller should trigger re-authorization), [`Error::ShimUnavailable`] for transient
	/// upstream failures, and [`Error::ShimProtocol`] for malformed responses.
	fn fetch_data<'a>(
		&'a self,
		credential: &'a AccessParameters,
		request: &'a DataRequest,
	) -> ShimFuture<'a, DataPayload>;
}
impl Debug for dyn Shim {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Shim").field("key", self.key()).finish()
	}
}

/// Shim-produced request fields for a handshake, prior to state key assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationRequestDraft {
	/// Provider-specific request fields (authorization URL, scope, nonce, ...).
	pub request_fields: BTreeMap<String, String>,
}
impl AuthorizationRequestDraft {
	/// Creates an empty draft.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a request field, builder-style.
	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.request_fields.insert(name.into(), value.into());

		self
	}
}

/// Raw parameters of an inbound provider callback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackPayload(BTreeMap<String, String>);
impl CallbackPayload {
	/// Builds a payload from raw query/form parameters.
	pub fn new(params: impl IntoIterator<Item = (String, String)>) -> Self {
		Self(params.into_iter().collect())
	}

	/// Looks up a single parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Returns the correlation state key, if the provider echoed one back.
	pub fn state(&self) -> Option<&str> {
		self.param(STATE_PARAM)
	}

	/// Deserializes the parameters into a shim-defined structure.
	///
	/// Parse failures carry the offending field path so shims can surface precise
	/// [`Error::ShimProtocol`] reasons.
	pub fn deserialize_into<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let value = serde_json::to_value(&self.0)
			.map_err(|e| Error::ShimProtocol { reason: e.to_string() })?;

		serde_path_to_error::deserialize(value)
			.map_err(|e| Error::ShimProtocol { reason: e.to_string() })
	}
}
impl<const N: usize> From<[(&str, &str); N]> for CallbackPayload {
	fn from(params: [(&str, &str); N]) -> Self {
		Self::new(params.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())))
	}
}

/// Credential material produced by a successfully resolved callback.
#[derive(Clone, Debug)]
pub struct AuthorizationResolution {
	/// Shim-specific credential payload to persist.
	pub payload: CredentialPayload,
}
impl AuthorizationResolution {
	/// Wraps resolved credential material.
	pub fn new(payload: CredentialPayload) -> Self {
		Self { payload }
	}
}

/// One authorized data request against a shim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRequest {
	/// Shim-defined key selecting the data type (e.g., `steps`, `sleep`).
	pub data_type_key: String,
	/// Shim-specific query options (date ranges, pagination, ...).
	pub query: BTreeMap<String, String>,
	/// Requests payload normalization where the shim supports it.
	pub normalize: bool,
}
impl DataRequest {
	/// Creates a request for the provided data type with no query options.
	pub fn new(data_type_key: impl Into<String>) -> Self {
		Self { data_type_key: data_type_key.into(), query: BTreeMap::new(), normalize: false }
	}

	/// Adds or replaces a query option, builder-style.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(name.into(), value.into());

		self
	}

	/// Toggles payload normalization.
	pub fn with_normalize(mut self, normalize: bool) -> Self {
		self.normalize = normalize;

		self
	}
}

/// Data returned by an authorized shim request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataPayload {
	/// Shim the data came from.
	pub shim_key: ShimKey,
	/// Data type key the request asked for.
	pub data_type_key: String,
	/// Shim-specific response body.
	pub body: serde_json::Value,
	/// Retrieval instant.
	pub retrieved_at: OffsetDateTime,
}
impl DataPayload {
	/// Wraps a response body stamped with the current instant.
	pub fn new(shim_key: ShimKey, data_type_key: impl Into<String>, body: serde_json::Value) -> Self {
		Self {
			shim_key,
			data_type_key: data_type_key.into(),
			body,
			retrieved_at: OffsetDateTime::now_utc(),
		}
	}
}
