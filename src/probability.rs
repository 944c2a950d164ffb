//! Distribution handling shared by both codecs.
//!
//! Every step turns raw logits into a workable distribution the same way:
//! softmax, zero out special tokens, then (for the arithmetic coder) divide
//! by temperature and sort descending. Encoder and decoder call the same
//! functions on the same inputs, so every floating-point operation and
//! every tie-break agrees bit-for-bit between the two sides.

use crate::model::{LanguageModel, TokenId};

/// Normalize logits into probabilities.
///
/// Subtracts the maximum logit before exponentiation. This keeps `exp` from
/// overflowing and leaves the result unchanged up to the shared rounding
/// both codec sides perform identically.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let denominator: f32 = exps.iter().sum();

    exps.iter().map(|&e| e / denominator).collect()
}

/// Zero out the probability of every special token.
///
/// No renormalization happens afterwards; the interval rescale (arithmetic)
/// or top-k cut (Huffman) treats the zeroed slots as zero-mass.
pub fn suppress_special<M: LanguageModel + ?Sized>(probabilities: &mut [f32], model: &M) {
    for (token, probability) in probabilities.iter_mut().enumerate() {
        if model.is_special(token as TokenId) {
            *probability = 0.0;
        }
    }
}

/// Divide every probability by `temperature` and sort descending by the
/// resulting weight, ties broken ascending by token id.
///
/// The weights are working values, not a normalized distribution: the
/// arithmetic coder renormalizes them into its integer interval, which is
/// what makes the probability-space division equivalent in effect (though
/// not in value) to conventional logit-space temperature scaling.
pub fn scaled_descending(probabilities: &[f32], temperature: f32) -> Vec<(TokenId, f32)> {
    let mut pairs: Vec<(TokenId, f32)> = probabilities
        .iter()
        .enumerate()
        .map(|(token, &probability)| (token as TokenId, probability / temperature))
        .collect();

    pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}

/// Greedy choice: the first token carrying the maximum probability.
pub fn top_token(probabilities: &[f32]) -> TokenId {
    let mut best = 0usize;
    for (token, &probability) in probabilities.iter().enumerate() {
        if probability > probabilities[best] {
            best = token;
        }
    }
    best as TokenId
}
