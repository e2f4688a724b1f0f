//! near-tx: Lockup operation model and signing seam
//!
//! Provides the [`Operation`] steps a plan is made of, the [`LockupSigner`]
//! trait each step is submitted through, and a [`RecordingSigner`] for tests.

pub mod mock;
pub mod operation;
pub mod signer;

pub use mock::{RecordedCall, RecordingSigner};
pub use operation::*;
pub use signer::{LockupSigner, SignerError, TxOutcome};
