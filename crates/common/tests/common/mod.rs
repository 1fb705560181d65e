//! Shared fixtures for identity and blinding integration tests
#![allow(dead_code)]

use common::crypto::{KeyPair, Primitives};

/// Root seed used by the fixed test vectors
pub const SEED_HEX: &str = "0123456789abcdef0123456789abcdef00000000000000000000000000000000";
/// Ed25519 public key of [`SEED_HEX`]
pub const PUBLIC_KEY_HEX: &str = "4cb76fdc6d32278e3f83dbf608360ecc6b65727934b85d2fb86862ff98c46ab7";
/// Standard (05) account id of [`SEED_HEX`]
pub const STANDARD_ID: &str = "05d2ad010eeb72d72e561d9de7bd7b6989af77dcabffa03a5111a6c859ae5c3a72";
/// Community server public key used by the vectors
pub const SERVER_KEY_HEX: &str =
    "c3b3c6f32f0ab5a57f853cc4f30f5da7fda5624b0c77b3fb0829de562ada081d";

pub const BLINDING_FACTOR_HEX: &str =
    "84e3eb75028a9b73fec031b7448e322a68ca6485fad81ab1bead56f759ebeb0f";
pub const BLINDED_SCALAR_HEX: &str =
    "61b7cba86bf9d9947eaa9547a83d6a9f16abbcd9eee2d4662e58cc5c9c0f1f05";
pub const BLINDED_PUBLIC_KEY_HEX: &str =
    "00ef3155c128c047de68d8e51442397c4c81073d9358b93a203dd948517107c0";

/// Request message for `GET /room/testroom` at 1700000000 with a zero nonce
pub const REQUEST_MESSAGE_HEX: &str = "c3b3c6f32f0ab5a57f853cc4f30f5da7fda5624b0c77b3fb0829de562ada081d00000000000000000000000000000000313730303030303030304745542f726f6f6d2f74657374726f6f6d";
pub const BLINDED_SIGNATURE_HEX: &str = "137c3fe5fc9c889fc3aa34398e2a6de31d6ade135a45c73802038e956375af945d1c04aabcefb2dc6bf23400bda5d40193df656d2862a3336afa25ca1d6ff904";
pub const PLAIN_SIGNATURE_HEX: &str = "5f00e1901940c6262f96a00d84ef72e648332bd6bbc34d254792cdd4406e56fb6e812d47ce79d1b54fbe81c2693d97c7cb9c3790a9ba64df12a41e57b830e900";

/// Version-blinded public key of [`SEED_HEX`]
pub const VERSION_PUBLIC_KEY_HEX: &str =
    "ab92099a2c017644c98414f11a178d21ce46529a0c4055c59e193bcd560b110e";

pub fn fixed_keypair() -> KeyPair {
    KeyPair::from_hex(SEED_HEX).unwrap()
}

pub fn server_key() -> Vec<u8> {
    hex::decode(SERVER_KEY_HEX).unwrap()
}

pub fn setup() -> (Primitives, KeyPair) {
    (Primitives::new(), fixed_keypair())
}
