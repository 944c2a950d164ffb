//! Contract over the language-model backend.
//!
//! The codecs never talk to an inference engine directly. They consume this
//! trait, which a llama.cpp-style backend implements: tokenize, detokenize,
//! and produce next-token logits for a running prefix. The backend owns a
//! KV cache that is updated in place by every logits call, so a model value
//! is borrowed mutably for the whole duration of one codec call and logits
//! requests must stay in generation order.

use crate::error::{Error, Result};

/// A token identifier in `[0, vocab_size)`.
pub type TokenId = u32;

/// The language-model surface the codecs are driven by.
pub trait LanguageModel {
    /// Tokenize UTF-8 text without adding special tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Detokenize a token sequence into UTF-8 text.
    ///
    /// The round trip through [`tokenize`](Self::tokenize) may not be
    /// byte-identical; the codecs only rely on token-level agreement.
    fn detokenize(&self, tokens: &[TokenId]) -> Result<String>;

    /// Logits for the next position, conditioned on every token fed so far.
    ///
    /// Callers pass only the tokens produced since the previous call: the
    /// full prompt on the first call, then the single last sampled token.
    /// The backend accumulates the prefix in its KV cache.
    fn next_logits(&mut self, tokens: &[TokenId]) -> Result<Vec<f32>>;

    /// Number of tokens in the vocabulary.
    fn vocab_size(&self) -> usize;

    /// Whether a token is special (end-of-generation or control).
    fn is_special(&self, token: TokenId) -> bool;

    /// Whether a token marks end of generation.
    fn is_end_of_generation(&self, token: TokenId) -> bool;

    /// First end-of-generation token in the vocabulary.
    ///
    /// # Errors
    /// Returns [`Error::ModelBackend`] if the vocabulary has none.
    fn eog_token(&self) -> Result<TokenId> {
        (0..self.vocab_size() as TokenId)
            .find(|&token| self.is_end_of_generation(token))
            .ok_or_else(|| {
                Error::ModelBackend("vocabulary has no end-of-generation token".into())
            })
    }

    /// The token whose detokenization is exactly U+0000.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedVocabulary`] if no such token exists.
    fn ascii_nul_token(&self) -> Result<TokenId> {
        for token in 0..self.vocab_size() as TokenId {
            if self.detokenize(&[token])? == "\u{0}" {
                return Ok(token);
            }
        }
        Err(Error::UnsupportedVocabulary)
    }

    /// Whether a token's detokenization ends a sentence.
    ///
    /// Checks only the last character against `.`, `!`, `?`. Deliberately
    /// locale-naive: `。`, `…` and abbreviations are not recognized.
    fn ends_sentence(&self, token: TokenId) -> Result<bool> {
        let text = self.detokenize(&[token])?;
        Ok(matches!(text.chars().last(), Some('.' | '!' | '?')))
    }
}
