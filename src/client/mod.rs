//! Client-side coordination layer: everything a front-end shell embeds to
//! drive the phone-OTP flows against the directory service.

pub mod api;
pub mod coordinator;
pub mod entry;
pub mod gate;
pub mod session;

pub use api::{ApiError, DirectoryApi, HttpDirectoryApi};
pub use coordinator::{Notifier, OtpCoordinator, RegistrationDraft, ResendCooldown};
pub use entry::OtpEntry;
pub use gate::{AuthGate, GatePolicy, GateState, SessionEvent, SessionEvents};
pub use session::{KeyValueStorage, MemoryStorage, SessionRecord, SessionStore};
