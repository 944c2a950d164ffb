mod common;

use common::StubModel;
use proptest::prelude::*;
use stegotext::bits::{
    bits_to_bytes_padded, bits_to_int, bytes_to_bits_stripped, int_to_bits,
};
use stegotext::{arithmetic, huffman, ArithmeticParams};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_padded_bytes_roundtrip(
        payload in prop::collection::vec(any::<bool>(), 0..64),
    ) {
        let packed = bits_to_bytes_padded(&payload);
        prop_assert_eq!(bytes_to_bits_stripped(&packed).unwrap(), payload);
    }

    #[test]
    fn prop_int_bits_roundtrip(
        n in 0u64..(1 << 16),
        width in 16usize..24,
    ) {
        prop_assert_eq!(bits_to_int(&int_to_bits(n, width)), n);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_huffman_decode_recovers_message_prefix(
        message in prop::collection::vec(any::<u8>(), 1..4),
        seed in 0u64..32,
        bits_per_token in 1u32..4,
    ) {
        let mut encoder_model = StubModel::chatty(seed);
        let cover =
            huffman::encode(&mut encoder_model, " the cat", &message, bits_per_token).unwrap();

        let mut decoder_model = StubModel::chatty(seed);
        let decoded =
            huffman::decode(&mut decoder_model, " the cat", &cover, bits_per_token).unwrap();

        prop_assert!(decoded.len() >= message.len());
        prop_assert_eq!(&decoded[..message.len()], &message[..]);
    }

    #[test]
    fn prop_arithmetic_decode_recovers_message_prefix(
        message in prop::collection::vec(any::<u8>(), 1..4),
        seed in 0u64..32,
        precision in 12u32..24,
        top_k in 4usize..16,
    ) {
        let params = ArithmeticParams {
            temperature: 1.0,
            top_k,
            precision,
        };

        let mut encoder_model = StubModel::chatty(seed);
        let cover = arithmetic::encode(&mut encoder_model, " the cat", &message, &params).unwrap();

        let mut decoder_model = StubModel::chatty(seed);
        let decoded = arithmetic::decode(&mut decoder_model, " the cat", &cover, &params).unwrap();

        prop_assert!(decoded.len() >= message.len());
        prop_assert_eq!(&decoded[..message.len()], &message[..]);
    }

    #[test]
    fn prop_arithmetic_temperature_is_symmetric(
        message in prop::collection::vec(any::<u8>(), 1..3),
        seed in 0u64..16,
    ) {
        let params = ArithmeticParams {
            temperature: 1.7,
            top_k: 8,
            precision: 16,
        };

        let mut encoder_model = StubModel::chatty(seed);
        let cover = arithmetic::encode(&mut encoder_model, " the dog", &message, &params).unwrap();

        let mut decoder_model = StubModel::chatty(seed);
        let decoded = arithmetic::decode(&mut decoder_model, " the dog", &cover, &params).unwrap();

        prop_assert_eq!(&decoded[..message.len()], &message[..]);
    }
}
