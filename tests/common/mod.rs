#![allow(dead_code)]

// std
use std::{collections::BTreeMap, sync::Arc};
// crates.io
use serde_json::json;
// self
use shim_broker::{
	auth::{AccessParameters, CredentialPayload, ShimKey, UserId},
	error::{Error, Result},
	flows::ShimBroker,
	shim::{
		AuthorizationRequestDraft, AuthorizationResolution, CallbackPayload, DataPayload,
		DataRequest, Shim, ShimFuture, ShimRegistry,
	},
	store::{CorrelationStore, CredentialStore, MemoryStore},
};

/// Data-retrieval behavior a stub shim exhibits once a credential exists.
#[derive(Clone, Copy, Debug)]
pub enum DataBehavior {
	Serve,
	Expired,
	Unavailable,
}

/// Scriptable shim used across integration tests.
///
/// Callback resolution is driven by the callback contents: an `error` parameter denies, a
/// missing `code` parameter is a protocol violation, otherwise the grant succeeds with an access
/// token derived from the code.
pub struct StubShim {
	key: ShimKey,
	data: DataBehavior,
	misconfigured: bool,
}
impl StubShim {
	pub fn new(key: &str) -> Self {
		Self {
			key: ShimKey::new(key).expect("Stub shim key fixture should be valid."),
			data: DataBehavior::Serve,
			misconfigured: false,
		}
	}

	pub fn with_data(mut self, data: DataBehavior) -> Self {
		self.data = data;

		self
	}

	pub fn misconfigured(mut self) -> Self {
		self.misconfigured = true;

		self
	}

	pub fn into_arc(self) -> Arc<dyn Shim> {
		Arc::new(self)
	}
}
impl Shim for StubShim {
	fn key(&self) -> &ShimKey {
		&self.key
	}

	fn build_authorization_request(
		&self,
		username: &UserId,
		_options: &BTreeMap<String, String>,
	) -> Result<AuthorizationRequestDraft> {
		if self.misconfigured {
			return Err(Error::ShimConfiguration {
				shim_key: self.key.as_ref().to_owned(),
				reason: "client credentials are not configured".into(),
			});
		}

		Ok(AuthorizationRequestDraft::new()
			.with_field(
				"authorization_url",
				format!("https://provider.example/oauth/authorize?user={username}"),
			)
			.with_field("scope", "activity"))
	}

	fn resolve_callback<'a>(
		&'a self,
		callback: &'a CallbackPayload,
	) -> ShimFuture<'a, AuthorizationResolution> {
		Box::pin(async move {
			if let Some(error) = callback.param("error") {
				return Err(Error::AuthorizationDenied { reason: error.to_owned() });
			}

			let code = callback.param("code").ok_or_else(|| Error::ShimProtocol {
				reason: "callback is missing the code parameter".into(),
			})?;

			Ok(AuthorizationResolution::new(
				CredentialPayload::new().with_secret("access_token", format!("token-for-{code}")),
			))
		})
	}

	fn fetch_data<'a>(
		&'a self,
		credential: &'a AccessParameters,
		request: &'a DataRequest,
	) -> ShimFuture<'a, DataPayload> {
		Box::pin(async move {
			match self.data {
				DataBehavior::Expired => Err(Error::CredentialExpired),
				DataBehavior::Unavailable => Err(Error::ShimUnavailable {
					reason: "upstream 503".into(),
					retry_after: None,
				}),
				DataBehavior::Serve => Ok(DataPayload::new(
					self.key.clone(),
					request.data_type_key.clone(),
					json!({
						"data_type": request.data_type_key,
						"normalize": request.normalize,
						"token": credential
							.payload
							.secret("access_token")
							.map(|secret| secret.expose().to_owned()),
					}),
				)),
			}
		})
	}
}

pub fn user(name: &str) -> UserId {
	UserId::new(name).expect("User fixture should be valid.")
}

pub fn grant_callback(state_key: &str) -> CallbackPayload {
	CallbackPayload::new([
		("state".to_owned(), state_key.to_owned()),
		("code".to_owned(), "abc123".to_owned()),
	])
}

pub fn grant_callback_with_code(state_key: &str, code: &str) -> CallbackPayload {
	CallbackPayload::new([
		("state".to_owned(), state_key.to_owned()),
		("code".to_owned(), code.to_owned()),
	])
}

pub fn denial_callback(state_key: &str) -> CallbackPayload {
	CallbackPayload::new([
		("state".to_owned(), state_key.to_owned()),
		("error".to_owned(), "access_denied".to_owned()),
	])
}

/// Constructs a broker over a shared in-memory store and the provided shims.
pub fn build_broker(shims: Vec<Arc<dyn Shim>>) -> (ShimBroker, Arc<MemoryStore>) {
	let store_backend = Arc::new(MemoryStore::default());
	let correlations: Arc<dyn CorrelationStore> = store_backend.clone();
	let credentials: Arc<dyn CredentialStore> = store_backend.clone();
	let mut registry = ShimRegistry::builder();

	for shim in shims {
		registry = registry.register(shim).expect("Stub shim keys should be unique.");
	}

	let broker = ShimBroker::new(Arc::new(registry.build()), correlations, credentials);

	(broker, store_backend)
}
