pub mod decoder;
pub mod engine;
pub mod preprocess;

// Re-export commonly used services
pub use decoder::DecodedImage;
pub use engine::TesseractEngine;
