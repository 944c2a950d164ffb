//! Deterministic stub backends driving the codecs in tests.
//!
//! Logits are a pure function of the accumulated prefix, so two
//! independently constructed instances with the same seed replay the same
//! distributions. That is exactly the agreement a real backend provides
//! when encoder and decoder load the same model.

// Not every test binary exercises every fixture.
#![allow(dead_code)]

use stegotext::error::{Error, Result};
use stegotext::model::{LanguageModel, TokenId};

/// How a stub produces next-token logits.
pub enum LogitRule {
    /// Every token equally likely, every step.
    Uniform,
    /// Pseudo-random logits derived from the prefix; `quiet` tokens are
    /// pinned far below everything else.
    Seeded {
        seed: u64,
        spread: f32,
        quiet: Vec<TokenId>,
    },
    /// One token dominates on every other step, pseudo-random otherwise.
    AlternatingDominant { token: TokenId, seed: u64 },
}

pub struct StubModel {
    vocab: Vec<&'static str>,
    special: Vec<bool>,
    rule: LogitRule,
    prefix: Vec<TokenId>,
}

impl StubModel {
    pub fn new(vocab: Vec<&'static str>, special: Vec<bool>, rule: LogitRule) -> Self {
        Self {
            vocab,
            special,
            rule,
            prefix: Vec::new(),
        }
    }

    /// Four single-character tokens, uniform logits, no specials. Token 0
    /// ends a sentence so greedy tails stop immediately.
    pub fn uniform4() -> Self {
        Self::new(
            vec![".", "a", "b", "c"],
            vec![false; 4],
            LogitRule::Uniform,
        )
    }

    /// Sixteen tokens with prefix-dependent logits: an end-of-generation
    /// special, a (quiet) NUL, twelve words, and three sentence enders.
    pub fn chatty(seed: u64) -> Self {
        Self::new(
            vec![
                "<eos>", "\u{0}", " the", " cat", " sat", " mat", " dog", " ran", " big", " red",
                " fox", " now", ".", "!", "?", " and",
            ],
            {
                let mut special = vec![false; 16];
                special[0] = true;
                special
            },
            LogitRule::Seeded {
                seed,
                spread: 3.0,
                quiet: vec![1],
            },
        )
    }

    /// Sixteen tokens with uniform logits for binary conversion: the
    /// end-of-generation special first, letters, and NUL in the last slot
    /// so it ranks at the bottom of every tie-broken candidate list.
    pub fn binary16() -> Self {
        Self::new(
            vec![
                "<eos>", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
                "\u{0}",
            ],
            {
                let mut special = vec![false; 16];
                special[0] = true;
                special
            },
            LogitRule::Uniform,
        )
    }

    /// Four tokens where token 1 is near-certain on alternating steps.
    pub fn alternating(seed: u64) -> Self {
        Self::new(
            vec![".", "a", "b", "c"],
            vec![false; 4],
            LogitRule::AlternatingDominant { token: 1, seed },
        )
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn seeded_logits(seed: u64, prefix: &[TokenId], vocab: usize, spread: f32) -> Vec<f32> {
    let mut state = splitmix64(seed);
    for &token in prefix {
        state = splitmix64(state ^ u64::from(token));
    }

    (0..vocab)
        .map(|token| {
            let z = splitmix64(state ^ ((token as u64) << 32));
            let unit = (z >> 40) as f32 / (1u64 << 24) as f32;
            unit * 2.0 * spread - spread
        })
        .collect()
}

impl LanguageModel for StubModel {
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>> {
        let mut tokens = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let matched = self
                .vocab
                .iter()
                .enumerate()
                .filter(|(_, v)| rest.starts_with(*v))
                .max_by_key(|(_, v)| v.len());
            match matched {
                Some((token, v)) => {
                    tokens.push(token as TokenId);
                    rest = &rest[v.len()..];
                }
                None => {
                    return Err(Error::ModelBackend(format!(
                        "untokenizable input near {:?}",
                        &rest[..rest.len().min(8)]
                    )))
                }
            }
        }
        Ok(tokens)
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String> {
        tokens
            .iter()
            .map(|&t| {
                self.vocab
                    .get(t as usize)
                    .copied()
                    .ok_or_else(|| Error::ModelBackend(format!("unknown token {t}")))
            })
            .collect()
    }

    fn next_logits(&mut self, tokens: &[TokenId]) -> Result<Vec<f32>> {
        self.prefix.extend_from_slice(tokens);

        let logits = match &self.rule {
            LogitRule::Uniform => vec![0.0; self.vocab.len()],
            LogitRule::Seeded {
                seed,
                spread,
                quiet,
            } => {
                let mut logits = seeded_logits(*seed, &self.prefix, self.vocab.len(), *spread);
                for &token in quiet {
                    logits[token as usize] = -30.0;
                }
                logits
            }
            LogitRule::AlternatingDominant { token, seed } => {
                if self.prefix.len() % 2 == 0 {
                    let mut logits = vec![0.0; self.vocab.len()];
                    logits[*token as usize] = 25.0;
                    logits
                } else {
                    seeded_logits(*seed, &self.prefix, self.vocab.len(), 2.0)
                }
            }
        };
        Ok(logits)
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    fn is_special(&self, token: TokenId) -> bool {
        self.special.get(token as usize).copied().unwrap_or(false)
    }

    fn is_end_of_generation(&self, token: TokenId) -> bool {
        self.vocab.get(token as usize).copied() == Some("<eos>")
    }
}
