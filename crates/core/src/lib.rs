//! Site ERP core types: credential storage and the client session context

pub mod error;
pub mod session;
pub mod store;


pub use error::{SessionError, SessionResult};
pub use session::{ACCESS_KEY, Credentials, REFRESH_KEY, Session, SessionState};
#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStore;
pub use store::{CredentialStore, MemoryStore};
