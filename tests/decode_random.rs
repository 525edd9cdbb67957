// tests/decode_random.rs
//
// Randomized inputs for the speculative decoder: every base64 variant must
// round back to the original, and non-base64 text must pass through untouched.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use freedom_guard::subscription::{decode, decode_bytes, extract};
use rand::Rng;

#[test]
fn random_bytes_survive_every_variant() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let len = rng.random_range(1..96);
        let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        for engine in [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD] {
            let enc = engine.encode(&bytes);
            assert_eq!(decode_bytes(&enc).as_deref(), Some(bytes.as_slice()), "{enc}");
        }
    }
}

#[test]
fn random_text_survives_every_variant() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let len = rng.random_range(1..64);
        let text: String = (0..len).map(|_| rng.random::<char>()).collect();
        for engine in [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD] {
            let enc = engine.encode(text.as_bytes());
            assert_eq!(decode(&enc), text.as_str());
        }
    }
}

#[test]
fn text_with_non_alphabet_chars_is_unchanged() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let len = rng.random_range(0..48);
        let mut text: String = (0..len)
            .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
            .collect();
        // ':' is outside both alphabets, so this can never decode.
        let at = rng.random_range(0..=text.len());
        text.insert(at, ':');
        assert_eq!(decode(&text), text.as_str());
    }
}

#[test]
fn encoded_subscription_extracts_like_plain() {
    let plain = "vless://id@h:443?security=tls#Node%201\r\nvmess://eyJ2IjoiMiJ9\ntrojan://pw@h:443\n";
    let want: Vec<_> = extract(plain).iter().map(|r| r.render()).collect();
    assert_eq!(want.len(), 3);
    for engine in [&STANDARD, &URL_SAFE_NO_PAD] {
        let got: Vec<_> = extract(&engine.encode(plain))
            .iter()
            .map(|r| r.render())
            .collect();
        assert_eq!(got, want);
    }
}
