//! Authentication core: credential verification, session/IP bindings, and
//! the per-request resolution cache.

pub mod authenticator;
pub mod cache;
pub mod error;
pub mod models;
pub mod password;
pub mod postgres;
pub mod request;
pub mod store;

pub use authenticator::{Authenticator, BindingStatus, LoginOutcome};
pub use cache::{AuthenticationCache, CacheKey, DEFAULT_CACHE_CAPACITY};
pub use error::{AuthError, HashError, StoreError};
pub use models::{AuthenticationBinding, User};
pub use password::PasswordHasher;
pub use postgres::PgStore;
pub use request::{RequestAuthenticator, normalize_ip};
pub use store::{AuthenticationStore, MemoryStore};
