//! Shim lookup table built once at startup and shared read-only across requests.

// self
use crate::{_prelude::*, auth::ShimKey, shim::Shim};

/// Error raised while assembling a [`ShimRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RegistryError {
	/// Two shims were registered under the same key.
	#[error("A shim is already registered under the key `{shim_key}`.")]
	DuplicateShim {
		/// Conflicting registry key.
		shim_key: String,
	},
}

/// Resolves shim keys to concrete [`Shim`] implementations.
///
/// Immutable after [`build`](ShimRegistryBuilder::build), so concurrent lookups need no
/// synchronization.
pub struct ShimRegistry {
	shims: HashMap<ShimKey, Arc<dyn Shim>>,
}
impl ShimRegistry {
	/// Creates an empty registry builder.
	pub fn builder() -> ShimRegistryBuilder {
		ShimRegistryBuilder { shims: HashMap::new() }
	}

	/// Resolves a shim key to its implementation.
	pub fn resolve(&self, shim_key: &str) -> Result<Arc<dyn Shim>> {
		self.shims
			.get(shim_key)
			.cloned()
			.ok_or_else(|| Error::UnknownShim { shim_key: shim_key.to_owned() })
	}

	/// Iterates over the registered shim keys.
	pub fn keys(&self) -> impl Iterator<Item = &ShimKey> {
		self.shims.keys()
	}

	/// Number of registered shims.
	pub fn len(&self) -> usize {
		self.shims.len()
	}

	/// Returns `true` when no shims are registered.
	pub fn is_empty(&self) -> bool {
		self.shims.is_empty()
	}
}
impl Debug for ShimRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ShimRegistry").field("keys", &self.shims.keys().collect::<Vec<_>>()).finish()
	}
}

/// Builder collecting shims before the registry is frozen.
pub struct ShimRegistryBuilder {
	shims: HashMap<ShimKey, Arc<dyn Shim>>,
}
impl ShimRegistryBuilder {
	/// Registers a shim under its own key.
	pub fn register(mut self, shim: Arc<dyn Shim>) -> Result<Self, RegistryError> {
		let key = shim.key().clone();

		if self.shims.contains_key(&key) {
			return Err(RegistryError::DuplicateShim { shim_key: key.into() });
		}

		self.shims.insert(key, shim);

		Ok(self)
	}

	/// Freezes the registry.
	pub fn build(self) -> ShimRegistry {
		ShimRegistry { shims: self.shims }
	}
}
impl Debug for ShimRegistryBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ShimRegistryBuilder")
			.field("keys", &self.shims.keys().collect::<Vec<_>>())
			.finish()
	}
}
