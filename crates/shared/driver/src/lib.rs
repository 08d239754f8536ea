//! Database driver - connection lifecycle and authentication.
//!
//! This crate owns the connection side of the data layer:
//! - The [`Session`] protocol every database client must speak
//! - The [`Driver`], one authenticated session bound to a namespace/database
//! - The [`DriverProvider`], which pairs every connect with exactly one close
//! - An in-process [`MemoryEngine`] backend for `mem://` addresses
//! - A SurrealDB client session behind the `surrealdb` feature, and the
//!   [`Backend`] that picks between the two by address
//!
//! # Usage
//!
//! ```ignore
//! let engine = MemoryEngine::open();
//! let config = DriverConfig::new("mem://app", "n1", "d1").with_signin("root", "root");
//! let provider = DriverProvider::new(config, engine.connector());
//!
//! provider
//!     .scope(|driver| Box::pin(async move {
//!         assert!(driver.is_connected());
//!         Ok::<_, DriverError>(())
//!     }))
//!     .await?;
//! ```

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod memory;
pub mod provider;
#[cfg(feature = "surrealdb")]
pub mod remote;
pub mod session;

pub use backend::Backend;
pub use config::{Credentials, DriverConfig};
pub use driver::Driver;
pub use error::{DriverError, DriverResult, SessionError, SessionResult};
pub use memory::{JournalEntry, MemoryEngine, MemoryEngineBuilder, MemorySession};
pub use provider::{DriverProvider, ScopedDriver};
#[cfg(feature = "surrealdb")]
pub use remote::SurrealSession;
pub use session::{QueryResponse, Session, SessionHolder, Signin, StatementResult, Status};

#[cfg(any(test, feature = "test-utils"))]
pub use session::MockSession;
