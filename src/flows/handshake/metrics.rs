// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for handshake outcomes.
#[derive(Debug, Default)]
pub struct HandshakeMetrics {
	started: AtomicU64,
	resolved: AtomicU64,
	denied: AtomicU64,
	failed: AtomicU64,
}
impl HandshakeMetrics {
	/// Returns the number of handshakes started.
	pub fn started(&self) -> u64 {
		self.started.load(Ordering::Relaxed)
	}

	/// Returns the number of handshakes resolved into a credential.
	pub fn resolved(&self) -> u64 {
		self.resolved.load(Ordering::Relaxed)
	}

	/// Returns the number of handshakes the user declined.
	pub fn denied(&self) -> u64 {
		self.denied.load(Ordering::Relaxed)
	}

	/// Returns the number of handshakes that failed for other reasons.
	pub fn failed(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	pub(crate) fn record_started(&self) {
		self.started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_resolved(&self) {
		self.resolved.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_denied(&self) {
		self.denied.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failed(&self) {
		self.failed.fetch_add(1, Ordering::Relaxed);
	}
}
