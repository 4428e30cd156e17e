mod materializer;
mod reader;
mod retention;
mod table;

pub use materializer::{is_safe_file_name, unique_output_name, Materializer, TableFormat};
pub use reader::read_table;
pub use retention::sweep_expired;
pub use table::Table;
