pub mod error;
pub mod resource;
pub mod session;

pub use error::SessionError;
pub use resource::{Resource, SourceKind};
pub use session::Session;
