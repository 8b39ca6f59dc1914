pub mod config;
pub mod error;
pub mod models;
pub mod router;
pub mod session;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::ClientConfig;
pub use error::AppError;
pub use router::{AuthGuard, GuardDecision, Navigation, NavigationGuard, Route, Router};
pub use session::{AuthStore, TOKEN_KEY};
pub use traits::{MemoryStorage, PageFactory, Storage};
