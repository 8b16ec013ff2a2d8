pub mod record;
pub mod request;
pub mod response;
pub mod task;

pub use record::{ResearchFailure, ResearchResult, Source, StoredRecord};
pub use request::{AuthRequest, ResearchRequest};
pub use response::{StatusResponse, TokenResponse};
pub use task::{TaskInfo, TaskStatus};
