pub mod types;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod clients;

pub use types::*;
pub use errors::{AppError, ErrorCode, AppResult};
pub use extract::{ApiJson, ApiPath, ApiQuery};
