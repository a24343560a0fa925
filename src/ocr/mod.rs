// OCR: image preprocessing, engine abstraction, best-attempt selection and
// PDF page rendering.

pub mod engine;
pub mod extractor;
pub mod pdf;
pub mod preprocess;

pub use engine::{OcrEngine, OcrOutput, OcrWord, TesseractEngine};
pub use extractor::{OcrExtractor, OcrResult};
pub use pdf::{PageDirectory, PdfRenderer, PdftoppmRenderer};
pub use preprocess::{ImagePreprocessor, Variant};
