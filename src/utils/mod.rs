pub mod image_ops;
pub mod metrics;

// Re-export commonly used items
pub use image_ops::{encode_gray_png, encode_image};
pub use metrics::Metrics;
