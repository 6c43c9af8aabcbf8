//! Auth-domain identifiers, secret wrappers, and handshake/credential records.

pub mod correlation;
pub mod credential;
pub mod id;
pub mod secret;

pub use correlation::*;
pub use credential::*;
pub use id::*;
pub use secret::*;
