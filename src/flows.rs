//! High-level handshake and data-access orchestration powered by the broker facade.

pub mod access;
pub mod common;
pub mod handshake;

pub use common::*;
pub use handshake::*;

// self
use crate::{
	_prelude::*,
	shim::ShimRegistry,
	store::{CorrelationStore, CredentialStore},
};

/// Coordinates authorization handshakes and authorized data access across registered shims.
///
/// The broker owns the shim registry and both store handles so the flow implementations can
/// focus on handshake semantics (state key issuance, atomic callback claims, credential
/// persistence ordering). All operations are independent per request; the only per-key
/// serialization point is the correlation store's atomic claim.
#[derive(Clone)]
pub struct ShimBroker {
	/// Registry resolving shim keys to implementations; read-only after startup.
	pub registry: Arc<ShimRegistry>,
	/// Store holding in-flight handshake records.
	pub correlations: Arc<dyn CorrelationStore>,
	/// Store holding resolved credential grants.
	pub credentials: Arc<dyn CredentialStore>,
	/// Shared counters for handshake outcomes.
	pub handshake_metrics: Arc<HandshakeMetrics>,
	correlation_ttl: Duration,
}
impl ShimBroker {
	/// Creates a broker over the provided registry and stores.
	pub fn new(
		registry: Arc<ShimRegistry>,
		correlations: Arc<dyn CorrelationStore>,
		credentials: Arc<dyn CredentialStore>,
	) -> Self {
		Self {
			registry,
			correlations,
			credentials,
			handshake_metrics: Default::default(),
			correlation_ttl: DEFAULT_CORRELATION_TTL,
		}
	}

	/// Overrides the time-to-live after which abandoned handshake records are swept.
	pub fn with_correlation_ttl(mut self, ttl: Duration) -> Self {
		self.correlation_ttl = if ttl.is_negative() { Duration::ZERO } else { ttl };

		self
	}

	/// Time-to-live applied to abandoned handshake records.
	pub fn correlation_ttl(&self) -> Duration {
		self.correlation_ttl
	}
}
impl Debug for ShimBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ShimBroker")
			.field("registry", &self.registry)
			.field("correlation_ttl", &self.correlation_ttl)
			.finish()
	}
}
