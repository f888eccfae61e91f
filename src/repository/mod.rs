pub mod id;
pub mod types;

pub use id::RepositoryId;
pub use types::{AccountStatus, Mention, Message, Repository};
