#![no_main]
use libfuzzer_sys::fuzz_target;
use stegotext::bits::{bits_to_bytes_padded, bytes_to_bits, bytes_to_bits_stripped};

fuzz_target!(|data: (Vec<u8>, u8)| {
    let (bytes, trim) = data;

    // Arbitrary bit length, not just multiples of 8
    let mut payload = bytes_to_bits(&bytes);
    let new_len = payload.len().saturating_sub((trim % 8) as usize);
    payload.truncate(new_len);

    let packed = bits_to_bytes_padded(&payload);
    assert!(packed[0] < 8);
    assert_eq!(bytes_to_bits_stripped(&packed).unwrap(), payload);
});
