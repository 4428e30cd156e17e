/// Trim a model response down to the span most likely to be JSON.
///
/// Slices from the first `{` to the last `}`. When that span is wrapped in a
/// top-level array (`[` and `]` separated from the braces only by whitespace)
/// the bracket span is kept instead. With no usable delimiters the trimmed
/// text is returned unchanged and will fail to parse downstream.
pub fn sanitize_response(raw: &str) -> &str {
    let content = raw.trim();

    let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) else {
        return content;
    };
    if end < start {
        return content;
    }

    let before = content[..start].trim_end();
    let after = content[end + 1..].trim_start();
    if before.ends_with('[') && after.starts_with(']') {
        let open = before.len() - 1;
        let close = content.len() - after.len();
        return &content[open..=close];
    }

    &content[start..=end]
}
