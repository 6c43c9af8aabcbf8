//! Delegated-authorization broker for heterogeneous third-party data-provider shims—correlation-safe
//! handshakes, credential lifecycles, and authorized data retrieval in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod obs;
pub mod shim;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::ShimBroker,
		shim::{Shim, ShimRegistry},
		store::{CorrelationStore, CredentialStore, MemoryStore},
	};

	/// Constructs a [`ShimBroker`] backed by a shared in-memory store and the provided shims.
	pub fn build_memory_broker(
		shims: impl IntoIterator<Item = Arc<dyn Shim>>,
	) -> (ShimBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let correlations: Arc<dyn CorrelationStore> = store_backend.clone();
		let credentials: Arc<dyn CredentialStore> = store_backend.clone();
		let mut registry = ShimRegistry::builder();

		for shim in shims {
			registry = registry.register(shim).expect("Test shim keys should be unique.");
		}

		let broker = ShimBroker::new(Arc::new(registry.build()), correlations, credentials);

		(broker, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use tokio as _;
