//! Local token counting.
//!
//! Counting never needs credentials: the BPE tables ship with `tiktoken-rs`
//! and are loaded once per process on first use. The `cl100k_base` encoding
//! is an approximation for providers whose own tokenizer is not public.

use crate::traits::TokenCounter;
use sl_domain::error::{Error, Result};
use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;

/// A [`TokenCounter`] backed by the `cl100k_base` BPE.
#[derive(Debug, Default, Clone, Copy)]
pub struct TiktokenCounter;

impl TiktokenCounter {
    pub fn new() -> Self {
        Self
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(cl100k()?.encode_with_special_tokens(text).len())
    }
}

fn cl100k() -> Result<&'static CoreBPE> {
    static BPE: OnceLock<std::result::Result<CoreBPE, String>> = OnceLock::new();
    BPE.get_or_init(|| {
        tiktoken_rs::cl100k_base().map_err(|e| format!("failed to load tokenizer: {e}"))
    })
    .as_ref()
    .map_err(|e| Error::Tokenization(e.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_positive_and_small() {
        let count = TiktokenCounter::new().count_tokens("Hello, world!").unwrap();
        assert!(count > 0);
        assert!(count < 10);
    }

    #[test]
    fn counting_is_idempotent() {
        let counter = TiktokenCounter::new();
        let prompt = "Write a short poem about the sea in exactly 4 lines.";
        assert_eq!(
            counter.count_tokens(prompt).unwrap(),
            counter.count_tokens(prompt).unwrap()
        );
    }

    #[test]
    fn empty_prompt_has_no_tokens() {
        assert_eq!(TiktokenCounter::new().count_tokens("").unwrap(), 0);
    }
}
