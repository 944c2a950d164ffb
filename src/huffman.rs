//! Fixed-rate Huffman codec.
//!
//! Each generation step builds a fresh Huffman tree over the `2^k` most
//! probable next tokens and spends the next message bits as a root-to-leaf
//! path through it. The emitted token therefore carries (up to) `k` bits.
//! The decoder rebuilds the identical tree from the identical logits and
//! reads the cover token's code back out.
//!
//! Tree shape must agree bit-for-bit between the two sides, so the merge
//! order is pinned: a min-priority queue keyed by weight, with ties among
//! equal weights resolved first-in-first-out by insertion order.

use std::collections::{BinaryHeap, HashMap};

use crate::bits;
use crate::error::{Error, Result};
use crate::model::{LanguageModel, TokenId};
use crate::probability;

/// Huffman tree node.
#[derive(Debug)]
enum Node {
    Leaf {
        token: TokenId,
        weight: f32,
    },
    Internal {
        left: Box<Node>,
        right: Box<Node>,
        weight: f32,
    },
}

impl Node {
    fn weight(&self) -> f32 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Internal { weight, .. } => *weight,
        }
    }
}

/// Heap entry carrying the insertion sequence number that breaks weight ties.
struct HeapEntry {
    seq: u64,
    node: Node,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-priority queue; earlier-inserted node wins among equal weights
        other
            .node
            .weight()
            .total_cmp(&self.node.weight())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn build_tree(pairs: &[(TokenId, f32)]) -> Option<Node> {
    let mut heap = BinaryHeap::with_capacity(pairs.len());
    let mut seq = 0u64;

    for &(token, weight) in pairs {
        heap.push(HeapEntry {
            seq,
            node: Node::Leaf { token, weight },
        });
        seq += 1;
    }

    while heap.len() > 1 {
        if let (Some(left), Some(right)) = (heap.pop(), heap.pop()) {
            let weight = left.node.weight() + right.node.weight();
            heap.push(HeapEntry {
                seq,
                node: Node::Internal {
                    left: Box::new(left.node),
                    right: Box::new(right.node),
                    weight,
                },
            });
            seq += 1;
        }
    }

    heap.pop().map(|entry| entry.node)
}

fn assign_codes(node: &Node, prefix: Vec<bool>, codes: &mut HashMap<TokenId, Vec<bool>>) {
    match node {
        Node::Leaf { token, .. } => {
            codes.insert(*token, if prefix.is_empty() { vec![false] } else { prefix });
        }
        Node::Internal { left, right, .. } => {
            let mut left_prefix = prefix.clone();
            left_prefix.push(false);
            assign_codes(left, left_prefix, codes);

            let mut right_prefix = prefix;
            right_prefix.push(true);
            assign_codes(right, right_prefix, codes);
        }
    }
}

fn leaf_count(bits_per_token: u32, vocab_size: usize) -> Result<usize> {
    if bits_per_token == 0 {
        return Err(Error::InvalidParameter(
            "bits_per_token must be at least 1".into(),
        ));
    }

    1usize
        .checked_shl(bits_per_token)
        .filter(|&leaves| leaves <= vocab_size)
        .ok_or_else(|| {
            Error::InvalidParameter(format!(
                "2^{bits_per_token} candidate tokens exceed vocabulary size {vocab_size}"
            ))
        })
}

/// Hide `message` inside generated cover text.
///
/// Each step spends up to `bits_per_token` message bits selecting the next
/// token. Once the message is exhausted, generation continues greedily
/// until the sampled token ends a sentence.
///
/// # Errors
/// Returns [`Error::InvalidParameter`] for an unusable `bits_per_token`,
/// and propagates model backend failures.
pub fn encode<M: LanguageModel + ?Sized>(
    model: &mut M,
    prompt: &str,
    message: &[u8],
    bits_per_token: u32,
) -> Result<String> {
    let leaves = leaf_count(bits_per_token, model.vocab_size())?;

    let prompt_tokens = model.tokenize(prompt)?;
    let message_bits = bits::bytes_to_bits(message);

    let mut cover_tokens: Vec<TokenId> = Vec::new();
    let mut cursor = 0usize;
    let mut sentence_finished = false;
    let mut first_run = true;
    let mut sampled: TokenId = 0;

    while cursor < message_bits.len() || !sentence_finished {
        let logits = model.next_logits(if first_run {
            &prompt_tokens
        } else {
            std::slice::from_ref(&sampled)
        })?;
        first_run = false;

        let mut probabilities = probability::softmax(&logits);
        probability::suppress_special(&mut probabilities, model);

        if cursor < message_bits.len() {
            let ranked = probability::scaled_descending(&probabilities, 1.0);
            let root = build_tree(&ranked[..leaves]).ok_or_else(|| {
                Error::InvalidParameter("bits_per_token yields no candidate tokens".into())
            })?;

            // Walk the tree, one message bit per edge; an exhausted message
            // keeps walking the 0 side.
            let mut node = &root;
            loop {
                match node {
                    Node::Leaf { token, .. } => {
                        sampled = *token;
                        break;
                    }
                    Node::Internal { left, right, .. } => {
                        let bit = message_bits.get(cursor).copied().unwrap_or(false);
                        node = if bit { right } else { left };
                        cursor += 1;
                    }
                }
            }
        } else {
            sampled = probability::top_token(&probabilities);
            sentence_finished = model.ends_sentence(sampled)?;
        }

        cover_tokens.push(sampled);
    }

    model.detokenize(&cover_tokens)
}

/// Recover the hidden message bits from cover text.
///
/// Every cover-text token is mapped back to its per-step Huffman code; the
/// concatenated codes are truncated to whole bytes (the sentence-completion
/// tail may contribute a partial byte of slack).
///
/// # Errors
/// Returns [`Error::DecodeMismatch`] when a cover token falls outside the
/// step's `2^k` candidates, which happens when the cover text was not
/// produced under identical model and parameter conditions.
pub fn decode<M: LanguageModel + ?Sized>(
    model: &mut M,
    prompt: &str,
    cover_text: &str,
    bits_per_token: u32,
) -> Result<Vec<u8>> {
    let leaves = leaf_count(bits_per_token, model.vocab_size())?;

    let prompt_tokens = model.tokenize(prompt)?;
    let cover_tokens = model.tokenize(cover_text)?;

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

        let ranked = probability::scaled_descending(&probabilities, 1.0);
        let root = build_tree(&ranked[..leaves]).ok_or_else(|| {
            Error::InvalidParameter("bits_per_token yields no candidate tokens".into())
        })?;

        let mut codes = HashMap::new();
        assign_codes(&root, Vec::new(), &mut codes);

        let code = codes
            .get(&token)
            .ok_or(Error::DecodeMismatch { position })?;
        message_bits.extend_from_slice(code);

        previous = token;
    }

    message_bits.truncate(message_bits.len() / 8 * 8);
    bits::bits_to_bytes(&message_bits)
}
