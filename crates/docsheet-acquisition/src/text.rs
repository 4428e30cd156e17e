use std::path::Path;

use tracing::debug;

use docsheet_core::error::AcquisitionResult;
use docsheet_core::AcquisitionError;

pub(crate) async fn read_text(path: &Path) -> AcquisitionResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| AcquisitionError::Io {
            stage: "text",
            source,
        })?;
    Ok(decode_text(bytes))
}

/// UTF-8 first, Latin-1 otherwise. Latin-1 maps every byte to the code point
/// of the same value, so the fallback cannot fail.
pub(crate) fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(valid_up_to = e.utf8_error().valid_up_to(), "Not UTF-8, decoding as Latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    }
}
