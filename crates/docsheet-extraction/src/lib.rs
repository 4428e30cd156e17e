mod prompts;
mod sanitize;
mod spec_builder;
mod structured;

pub use prompts::{build_extraction_prompt, build_spec_prompt};
pub use sanitize::sanitize_response;
pub use spec_builder::SpecBuilder;
pub use structured::StructuredExtractor;
