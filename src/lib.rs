//! # Linguistic Steganography
//!
//! *Hiding bit strings inside text a language model would plausibly write.*
//!
//! ## Intuition First
//!
//! An autoregressive language model turns a prefix into a probability
//! distribution over the next token. Sampling from that distribution makes
//! a *choice*, and a choice carries information: if the model offers four
//! roughly equally likely continuations, picking one of them communicates
//! two bits to anyone who can reconstruct the same four options.
//!
//! That is the whole trick. The encoder lets the secret message make the
//! sampling choices, producing ordinary-looking "cover text". The decoder
//! replays the model over the same prompt, rebuilds the same options at
//! every step, observes which one the cover text took, and reads the
//! message bits back out.
//!
//! ## The Problem
//!
//! The two sides must agree *bit-for-bit* at every step. Any rounding
//! drift, reordering of equal probabilities, or off-by-one in an interval
//! boundary desynchronizes them and the message is gone. Everything in
//! this crate is therefore built around one discipline: encoder and
//! decoder share the same code path from logits to integer tables, with
//! pinned tie-breaks and fixed-point interval arithmetic.
//!
//! ## Historical Context
//!
//! ```text
//! 1952  Huffman            Optimal prefix codes
//! 1976  Rissanen           Arithmetic coding: entropy-optimal rate
//! 2019  Ziegler et al.     "Neural Linguistic Steganography": arithmetic
//!                          coding against a neural language model
//! 2023  llama.cpp          Local LLM inference cheap enough to hide in
//! ```
//!
//! ## The Two Codecs
//!
//! - [`huffman`]: fixed-rate. Each step builds a Huffman tree over the
//!   `2^k` most probable tokens and spends a root-to-leaf path of message
//!   bits. Simple, but the rate ignores how certain the model really is.
//! - [`arithmetic`]: variable-rate. Each step narrows an integer
//!   sub-interval of `[0, 2^P)` in proportion to token probabilities; a
//!   near-certain token costs almost nothing, an uncertain one carries
//!   many bits. This tracks the model's entropy and reads more naturally
//!   at the same payload size. An empty prompt switches the arithmetic
//!   entry points into pure bits↔text conversion with an in-band sentinel.
//!
//! ## Failure Modes
//!
//! 1. **Desynchronization**: decoding with a different model, prompt,
//!    temperature, or precision fails with
//!    [`Error::DecodeMismatch`](error::Error::DecodeMismatch) at the first
//!    diverging token.
//! 2. **Vocabulary gaps**: binary conversion needs a token that
//!    detokenizes to U+0000; vocabularies without one are rejected.
//!
//! ## Implementation Notes
//!
//! The model backend stays behind the [`model::LanguageModel`] trait:
//! tokenize, detokenize, next-token logits, and a few vocabulary queries.
//! The codecs are pure given (model, prompt, parameters, input) and keep
//! no state between calls.
//!
//! ## References
//!
//! - Ziegler, Z., Deng, Y., Rush, A. (2019). "Neural Linguistic
//!   Steganography."
//! - Witten, I., Neal, R., Cleary, J. (1987). "Arithmetic coding for data
//!   compression."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arithmetic;
pub mod bits;
pub mod error;
pub mod huffman;
pub mod model;
pub mod probability;

pub use arithmetic::ArithmeticParams;
pub use error::Error;
pub use model::{LanguageModel, TokenId};
