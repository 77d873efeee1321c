pub mod image_source;
pub mod summary;
pub mod workflow;

pub use image_source::{FsImageSource, ImageLoadError, ImageSource};
pub use summary::ScanSummary;
pub use workflow::{ProcessingError, ScanWorkflow};
