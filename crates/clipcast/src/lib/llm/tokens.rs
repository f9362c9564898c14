use std::sync::LazyLock;

use another_tiktoken_rs::{cl100k_base, CoreBPE};

static CL100K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| {
    cl100k_base()
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to load cl100k tokenizer"))
        .ok()
});

/// Rough characters-per-token ratio used when the tokenizer is unavailable
const CHARS_PER_TOKEN: usize = 4;

pub fn count_tokens(text: &str) -> usize {
    match CL100K.as_ref() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => text.chars().count().div_ceil(CHARS_PER_TOKEN),
    }
}

/// Cuts `text` down to at most `limit` cl100k tokens
pub fn truncate_to_tokens(text: &str, limit: usize) -> String {
    let Some(bpe) = CL100K.as_ref() else {
        return text.chars().take(limit * CHARS_PER_TOKEN).collect();
    };

    let tokens = bpe.encode_with_special_tokens(text);
    if tokens.len() <= limit {
        return text.to_string();
    }

    match bpe.decode(tokens[..limit].to_vec()) {
        Ok(truncated) => truncated,
        Err(e) => {
            tracing::warn!(error = ?e, "Token decode failed, truncating by characters");
            text.chars().take(limit * CHARS_PER_TOKEN).collect()
        }
    }
}
