pub mod fetch;
pub mod format;
pub mod processing;
pub mod storage;

pub use fetch::{FetchedFile, RemoteFetcher, VideoDownloader};
pub use format::FileFormat;
pub use processing::FileProcessor;
pub use storage::{ResourceStore, RESOURCES_SUBFOLDER};
