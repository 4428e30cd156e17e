pub mod acquisition;
pub mod api_types;
pub mod completion;
pub mod config;
pub mod document;
pub mod error;
pub mod record;
pub mod result;

pub use acquisition::{OcrEngine, PageRasterizer, TextAcquisition};
pub use completion::TextCompletion;
pub use config::{AppConfig, Provider};
pub use document::{DocumentFormat, DocumentRef};
pub use error::{AcquisitionError, DocsheetError, ErrorKind, Result};
pub use record::{ExtractedRecord, Record, SOURCE_DOCUMENT_FIELD};
pub use result::{BatchResult, DocumentFailure, PipelineResult};
