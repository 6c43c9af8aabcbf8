//! Shared helpers and defaults for flow implementations.

// self
use crate::{_prelude::*, auth::AuthorizationRequestParameters};

/// Default time-to-live for abandoned handshake records.
///
/// Provider consent screens rarely stay open longer than a few minutes; ten gives slow users
/// headroom while keeping forged-replay windows short.
pub const DEFAULT_CORRELATION_TTL: Duration = Duration::minutes(10);

/// Rejects callbacks routed through a different shim than the handshake was started against.
///
/// A state key paired with the wrong shim route is indistinguishable from a forged callback, so
/// the mismatch surfaces as [`Error::UnknownCorrelation`] rather than leaking which shim the
/// record belongs to.
pub(crate) fn ensure_shim_consistent(
	record: &AuthorizationRequestParameters,
	shim_key: &str,
) -> Result<()> {
	if record.shim_key.as_ref() == shim_key {
		Ok(())
	} else {
		Err(Error::UnknownCorrelation { state_key: record.state_key.as_str().to_owned() })
	}
}
