//! Text shaping for the transport: watermarks, chunking and error bodies.

/// Appends the model watermark to a final answer.
///
/// ```rust
/// use chatbridge::delivery::watermark;
///
/// assert_eq!(watermark("Hi", "gpt-4o"), "Hi\n\n🤖 *gpt-4o*");
/// ```
pub fn watermark(text: &str, model: &str) -> String {
    format!("{text}\n\n🤖 *{model}*")
}

/// Length in characters, the unit transport limits are expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits `text` into chunks of at most `max_len` characters.
///
/// Chunks concatenate back to the input. Empty input yields no chunks.
pub fn split_chunks(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for c in text.chars() {
        if count == max_len {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(c);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Byte offset of the `n`th character, or the string length past the end.
pub(crate) fn char_boundary(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

/// Makes an error readable in a chat bubble.
///
/// A message that is itself JSON is pretty-printed. Otherwise, if the
/// part after the first `:` is JSON, that part is pretty-printed under
/// the prefix. Anything else is returned unchanged.
pub fn format_error_message(message: &str) -> String {
    if let Some(pretty) = pretty_json(message) {
        return pretty;
    }
    if let Some((prefix, rest)) = message.split_once(':') {
        if let Some(pretty) = pretty_json(rest.trim()) {
            return format!("{prefix}:\n{pretty}");
        }
    }
    message.to_string()
}

fn pretty_json(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    serde_json::to_string_pretty(&value).ok()
}
