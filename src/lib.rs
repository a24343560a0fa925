// Pastpaper: predict recurring exam topics from scanned past papers
//
// This is the library root. Each module corresponds to a major subsystem
// of the analysis pipeline: OCR in, topics mined, scored, grouped, reported.

pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod status;
pub mod topics;
