/**
 * Cryptographic types and operations.
 *  - Root identity keypairs
 *  - Per-server key blinding and blinded signatures
 *  - Sealed transport payloads
 */
pub mod crypto;
/**
 * Prefixed account ids and matching blinded
 *  ids back to root identities.
 */
pub mod identity;

pub mod prelude {
    pub use crate::crypto::{BlindedKeyPair, CryptoError, KeyPair, Primitives};
    pub use crate::identity::{AccountId, IdPrefix};
}
