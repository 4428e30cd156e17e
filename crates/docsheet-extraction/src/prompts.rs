/// Prompt asking the model to turn a free-form request into an extraction directive.
pub fn build_spec_prompt(query: &str) -> String {
    format!(
        r#"Convert the user request below into a detailed, structured data extraction prompt.

User request:
{query}

Write a prompt that instructs an AI to extract structured JSON data from a document.
Include:
- the exact field names to extract, in snake_case
- the expected output format and the type of each field
- how to handle missing values (use null), repeated items (one object per item) and ambiguous values"#
    )
}

/// The single extraction request: document text, directive, and the output contract.
pub fn build_extraction_prompt(document_text: &str, directive: &str) -> String {
    format!(
        r#"You are responsible for extracting the data the user asked for from the document text below.

Extraction requirements:
{directive}

Document text:
{document_text}

The output must be structured JSON data.

IMPORTANT: Return ONLY valid JSON without any explanation or additional text. The response should start with {{ and end with }}."#
    )
}
