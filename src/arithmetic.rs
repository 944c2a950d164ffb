//! Variable-rate arithmetic codec.
//!
//! The coder keeps an integer sub-interval of `[0, 2^P)` and narrows it one
//! token at a time. Each step rescales the model's next-token distribution
//! onto the current interval as an integer cumulative table; the next `P`
//! message bits select the sub-interval (and thereby the token), and the
//! leading bits shared by the new bounds are consumed and shifted out.
//! High-entropy steps spend many bits per token, near-certain steps spend
//! none, which is what makes the rate track the model's entropy.
//!
//! Symmetry is the whole game: the decoder rebuilds the identical table
//! from the identical logits, recovers the token's rank, and emits the same
//! shared leading bits the encoder consumed. Every floating-point
//! operation up to the integer rounding lives in one shared code path, so
//! the two sides cannot drift.
//!
//! An empty prompt switches both entry points into binary conversion: the
//! prompt becomes the single end-of-generation token, byte payloads use the
//! self-describing padded format, and the top sub-interval of every table
//! is reserved for an ASCII-NUL sentinel that marks end of message.

use crate::bits;
use crate::error::{Error, Result};
use crate::model::{LanguageModel, TokenId};
use crate::probability;

/// Tuning for the arithmetic codec.
///
/// Encoder and decoder must be called with identical values; a mismatch
/// surfaces as [`Error::DecodeMismatch`] at the first diverging step.
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticParams {
    /// Divisor applied to raw probabilities before ranking. Values above 1
    /// flatten the working distribution, values below 1 sharpen it.
    pub temperature: f32,
    /// Hard cap on the number of candidate sub-intervals per step.
    pub top_k: usize,
    /// Interval width in bits; larger tracks the model's entropy closer.
    pub precision: u32,
}

impl Default for ArithmeticParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_k: 300,
            precision: 26,
        }
    }
}

impl ArithmeticParams {
    fn validate(&self, vocab_size: usize) -> Result<()> {
        if self.temperature <= 0.0 || !self.temperature.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "temperature must be positive and finite, got {}",
                self.temperature
            )));
        }
        if self.top_k < 2 {
            return Err(Error::InvalidParameter(format!(
                "top_k must be at least 2, got {}",
                self.top_k
            )));
        }
        if !(2..=62).contains(&self.precision) {
            return Err(Error::InvalidParameter(format!(
                "precision must be in [2, 62], got {}",
                self.precision
            )));
        }
        if vocab_size < 2 {
            return Err(Error::InvalidParameter(format!(
                "vocabulary size {vocab_size} leaves no room for two sub-intervals"
            )));
        }
        Ok(())
    }
}

/// One step's view of the distribution: the full ranked token list and the
/// cumulative table over the kept head of it, in absolute interval
/// positions.
struct StepTable {
    ranked: Vec<(TokenId, f32)>,
    cumulative: Vec<(TokenId, i64)>,
}

fn build_step_table(
    probabilities: &[f32],
    params: &ArithmeticParams,
    lo: i64,
    hi: i64,
    sentinel: Option<TokenId>,
) -> StepTable {
    let mut ranked = probability::scaled_descending(probabilities, params.temperature);

    let range = hi - lo;
    let threshold = 1.0 / range as f64;

    // Keep every weight that survives rounding, but always at least two
    // sub-intervals so a near-certain token cannot stall the coder.
    let viable = ranked
        .iter()
        .filter(|&&(_, weight)| weight as f64 >= threshold)
        .count();
    let k = viable.max(2).min(params.top_k);

    let kept = &ranked[..k];
    let sum: f32 = kept.iter().map(|pair| pair.1).sum();
    let scale = range as f32 / sum;

    let mut cumulative: Vec<(TokenId, i64)> = Vec::with_capacity(k);
    let mut running = 0i64;
    for &(token, weight) in kept {
        running = running.saturating_add((weight * scale).round() as i64);
        cumulative.push((token, running));
    }

    // Rounding can overshoot the range; surplus entries sit at the tail
    // because the cumulative values are monotonic.
    while cumulative.last().is_some_and(|&(_, c)| c > range) {
        cumulative.pop();
    }

    // A fully trimmed table only happens once the sentinel drift has
    // already desynchronized a conversion; keep the top-ranked token so the
    // step stays total instead of indexing past an empty table.
    if cumulative.is_empty() {
        if let Some(&(token, _)) = kept.first() {
            cumulative.push((token, range));
        }
    }

    // Rounding or trimming can leave a gap below the top of the interval.
    // Shifting every boundary up closes it by widening the first
    // sub-interval, which the decoder reproduces identically.
    let last = cumulative.last().map_or(0, |&(_, c)| c);
    let gap = range - last;
    for entry in &mut cumulative {
        entry.1 += gap + lo;
    }

    // Binary conversion reserves the top sub-interval for the end-of-message
    // sentinel, in the ranked list as well so rank lookup finds it.
    if let Some(nul) = sentinel {
        if let Some(top) = cumulative.len().checked_sub(1) {
            ranked[top].0 = nul;
            cumulative[top].0 = nul;
        }
    }

    debug_assert!(
        cumulative.last().map_or(true, |&(_, c)| c == hi),
        "cumulative table must fill the interval exactly"
    );

    StepTable { ranked, cumulative }
}

fn shared_prefix_len(a: &[bool], b: &[bool]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Drop the `fixed` consumed leading bits and shift in `fill` at the bottom.
fn rebase(interval_bits: &[bool], fixed: usize, fill: bool) -> Vec<bool> {
    let mut rebased = interval_bits[fixed.min(interval_bits.len())..].to_vec();
    rebased.resize(interval_bits.len(), fill);
    rebased
}

/// Hide `message` inside generated cover text.
///
/// With a non-empty `prompt` this is steganographic encoding: `message` is
/// raw bytes, and after the last bit is consumed generation continues
/// greedily until a sentence-ending token. With an empty `prompt` this is
/// binary-conversion decompression: `message` is a padded byte sequence,
/// the prompt becomes the end-of-generation token, and generation stops at
/// the ASCII-NUL sentinel instead of finishing a sentence.
///
/// # Errors
/// Propagates parameter validation, [`Error::UnsupportedVocabulary`] in
/// binary-conversion mode, and model backend failures.
pub fn encode<M: LanguageModel + ?Sized>(
    model: &mut M,
    prompt: &str,
    message: &[u8],
    params: &ArithmeticParams,
) -> Result<String> {
    params.validate(model.vocab_size())?;

    let mut prompt_tokens = model.tokenize(prompt)?;
    let decompression = prompt_tokens.is_empty();

    let message_bits = if decompression {
        bits::bytes_to_bits_stripped(message)?
    } else {
        bits::bytes_to_bits(message)
    };

    // The backend cannot run on an empty context, so binary conversion
    // conditions on the end-of-generation token alone.
    let sentinel = if decompression {
        prompt_tokens.push(model.eog_token()?);
        Some(model.ascii_nul_token()?)
    } else {
        None
    };

    let precision = params.precision as usize;
    let mut lo = 0i64;
    let mut hi = 1i64 << params.precision;

    let mut cover_tokens: Vec<TokenId> = Vec::new();
    let mut cursor = 0usize;
    let mut sentence_finished = false;
    let mut first_run = true;
    let mut sampled: TokenId = 0;

    while cursor < message_bits.len() || (!decompression && !sentence_finished) {
        let logits = model.next_logits(if first_run {
            &prompt_tokens
        } else {
            std::slice::from_ref(&sampled)
        })?;
        first_run = false;

        let mut probabilities = probability::softmax(&logits);
        probability::suppress_special(&mut probabilities, model);

        if cursor < message_bits.len() {
            let table = build_step_table(&probabilities, params, lo, hi, sentinel);

            // The next P message bits, zero-padded on the right, name an
            // absolute position; the sub-interval containing it names the
            // token.
            let end = (cursor + precision).min(message_bits.len());
            let mut chunk = message_bits[cursor..end].to_vec();
            chunk.resize(precision, false);
            let target = bits::bits_to_int(&chunk) as i64;

            let selected = table
                .cumulative
                .iter()
                .position(|&(_, c)| c > target)
                .unwrap_or_else(|| table.cumulative.len() - 1);

            let bottom = if selected > 0 {
                table.cumulative[selected - 1].1
            } else {
                lo
            };
            let top = table.cumulative[selected].1;

            let bottom_bits = bits::int_to_bits(bottom as u64, precision);
            let top_bits = bits::int_to_bits((top - 1) as u64, precision);

            let mut fixed = shared_prefix_len(&bottom_bits, &top_bits);
            if decompression && fixed == 0 {
                // A near-certain token narrows the interval by nothing; force
                // one bit of progress so the sentinel loop cannot spin. The
                // sentinel protocol absorbs the resulting drift.
                fixed = 1;
            }
            cursor += fixed;

            lo = bits::bits_to_int(&rebase(&bottom_bits, fixed, false)) as i64;
            hi = bits::bits_to_int(&rebase(&top_bits, fixed, true)) as i64 + 1;

            debug_assert!(
                decompression || (0 <= lo && lo < hi && hi <= 1i64 << params.precision),
                "interval must stay ordered inside [0, 2^P]"
            );

            sampled = table.cumulative[selected].0;
        } else {
            sampled = probability::top_token(&probabilities);
            sentence_finished = model.ends_sentence(sampled)?;
        }

        cover_tokens.push(sampled);

        if sentinel == Some(sampled) {
            break;
        }
    }

    model.detokenize(&cover_tokens)
}

/// Recover the hidden message bits from cover text.
///
/// With a non-empty `prompt` the result is the raw recovered bytes,
/// truncated to whole bytes (the sentence-completion tail contributes
/// slack bits past the original message). With an empty `prompt` this is
/// binary-conversion compression and the result is a padded byte sequence.
///
/// # Errors
/// Returns [`Error::DecodeMismatch`] with the position of the first cover
/// token that falls outside the step's candidate set; this is the failure
/// mode for mismatched model, prompt, or parameters.
pub fn decode<M: LanguageModel + ?Sized>(
    model: &mut M,
    prompt: &str,
    cover_text: &str,
    params: &ArithmeticParams,
) -> Result<Vec<u8>> {
    params.validate(model.vocab_size())?;

    let mut prompt_tokens = model.tokenize(prompt)?;
    let cover_tokens = model.tokenize(cover_text)?;

    let compression = prompt_tokens.is_empty();
    let sentinel = if compression {
        prompt_tokens.push(model.eog_token()?);
        Some(model.ascii_nul_token()?)
    } else {
        None
    };

    let precision = params.precision as usize;
    let mut lo = 0i64;
    let mut hi = 1i64 << params.precision;

    let mut message_bits: Vec<bool> = Vec::new();
    let mut first_run = true;
    let mut previous: TokenId = 0;

    for (position, &token) in cover_tokens.iter().enumerate() {
        let logits = model.next_logits(if first_run {
            &prompt_tokens
        } else {
            std::slice::from_ref(&previous)
        })?;
        first_run = false;

        let mut probabilities = probability::softmax(&logits);
        probability::suppress_special(&mut probabilities, model);

        let table = build_step_table(&probabilities, params, lo, hi, sentinel);

        // Rank in the full descending list, not the kept head: a token past
        // the keep cutoff must be detected, not silently mis-binned.
        let rank = table
            .ranked
            .iter()
            .position(|&(t, _)| t == token)
            .filter(|&rank| rank < table.cumulative.len())
            .ok_or(Error::DecodeMismatch { position })?;

        let bottom = if rank > 0 {
            table.cumulative[rank - 1].1
        } else {
            lo
        };
        let top = table.cumulative[rank].1;

        let bottom_bits = bits::int_to_bits(bottom as u64, precision);
        let top_bits = bits::int_to_bits((top - 1) as u64, precision);

        let fixed = shared_prefix_len(&bottom_bits, &top_bits);

        if position == cover_tokens.len() - 1 {
            // The final interval's entire lower bound recovers the trailing
            // bits the shared-prefix rule would truncate.
            message_bits.extend_from_slice(&bottom_bits);
        } else {
            message_bits.extend_from_slice(&bottom_bits[..fixed]);
        }

        lo = bits::bits_to_int(&rebase(&bottom_bits, fixed, false)) as i64;
        hi = bits::bits_to_int(&rebase(&top_bits, fixed, true)) as i64 + 1;

        previous = token;
    }

    if compression {
        Ok(bits::bits_to_bytes_padded(&message_bits))
    } else {
        message_bits.truncate(message_bits.len() / 8 * 8);
        bits::bits_to_bytes(&message_bits)
    }
}
