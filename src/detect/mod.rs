mod backend;
mod backends;
mod detector;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
pub use detector::ObjectDetector;
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection};
