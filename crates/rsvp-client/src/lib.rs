pub mod api;
pub mod middleware;
pub mod storage;

pub use api::ApiClient;
pub use middleware::{BearerAuth, JsonContentType, RequestDescriptor, RequestMiddleware};
pub use storage::FileStorage;
