use crate::crypto::{derive_blinding_factor_hex, CryptoError, Primitives};

use super::{AccountId, IdPrefix};

/// Compute both blinded ids a standard account can have on a server
///
/// A standard id carries an X25519 key, which fixes the Ed25519 point only
/// up to sign. Blinding the positive point gives `pk1`; blinding the
/// negative one gives exactly `-pk1`, which is `pk1` with the sign bit of the
/// last byte flipped. Both are valid and the owner could be presenting
/// either.
///
/// # Errors
///
/// `InvalidServerKey` for a malformed server key, `CryptoDegenerate` if the
/// standard id's key has no usable Ed25519 form.
pub fn blind_standard_id(
    ops: &Primitives,
    standard: &AccountId,
    server_public_key_hex: &str,
) -> Result<[AccountId; 2], CryptoError> {
    let k = derive_blinding_factor_hex(ops, server_public_key_hex)?;
    let positive = ops.x25519_pk_to_ed25519(standard.public_key())?;

    let pk1 = ops.scalar_mult_noclamp(k.as_bytes(), &positive)?;
    let mut pk2 = pk1;
    pk2[31] ^= 0b1000_0000;

    Ok([
        AccountId::new(IdPrefix::Blinded, pk1),
        AccountId::new(IdPrefix::Blinded, pk2),
    ])
}

/// Check whether `blinded_id` is the blinded form of `standard_id` on a server
///
/// Never errors: blank inputs, wrong prefixes, malformed ids or server keys
/// and failed derivations all answer `false`.
pub fn matches(
    ops: &Primitives,
    standard_id: &str,
    blinded_id: &str,
    server_public_key_hex: &str,
) -> bool {
    if standard_id.trim().is_empty()
        || blinded_id.trim().is_empty()
        || server_public_key_hex.trim().is_empty()
    {
        return false;
    }

    let Ok(standard) = standard_id.parse::<AccountId>() else {
        return false;
    };
    if standard.prefix() != IdPrefix::Standard {
        return false;
    }
    let Ok(blinded) = blinded_id.parse::<AccountId>() else {
        return false;
    };
    if blinded.prefix() != IdPrefix::Blinded {
        return false;
    }

    match blind_standard_id(ops, &standard, server_public_key_hex) {
        Ok(candidates) => candidates.contains(&blinded),
        Err(e) => {
            tracing::debug!("blinded id match failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{derive_blinded_key_pair, KeyPair};

    const SERVER: &str = "c3b3c6f32f0ab5a57f853cc4f30f5da7fda5624b0c77b3fb0829de562ada081d";

    fn blinded_id_for(ops: &Primitives, keypair: &KeyPair) -> AccountId {
        let server = hex::decode(SERVER).unwrap();
        let blinded = derive_blinded_key_pair(ops, &server, keypair).unwrap();
        AccountId::new(IdPrefix::Blinded, *blinded.public_key())
    }

    #[test]
    fn test_matches_own_blinded_id() {
        let ops = Primitives::new();
        for _ in 0..8 {
            let keypair = KeyPair::generate();
            let standard = keypair.account_id(&ops).unwrap().to_string();
            let blinded = blinded_id_for(&ops, &keypair).to_string();
            assert!(matches(&ops, &standard, &blinded, SERVER));
        }
    }

    #[test]
    fn test_rejects_other_accounts() {
        let ops = Primitives::new();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let alice_standard = alice.account_id(&ops).unwrap().to_string();
        let bob_blinded = blinded_id_for(&ops, &bob).to_string();
        assert!(!matches(&ops, &alice_standard, &bob_blinded, SERVER));
    }

    #[test]
    fn test_rejects_wrong_prefixes_and_blank_input() {
        let ops = Primitives::new();
        let keypair = KeyPair::generate();
        let standard = keypair.account_id(&ops).unwrap();
        let blinded = blinded_id_for(&ops, &keypair);

        assert!(!matches(&ops, "", &blinded.to_string(), SERVER));
        assert!(!matches(&ops, &standard.to_string(), "  ", SERVER));
        assert!(!matches(&ops, &standard.to_string(), &blinded.to_string(), ""));

        // swapped arguments
        assert!(!matches(&ops, &blinded.to_string(), &standard.to_string(), SERVER));

        let unblinded = AccountId::new(IdPrefix::Unblinded, *blinded.public_key());
        assert!(!matches(&ops, &standard.to_string(), &unblinded.to_string(), SERVER));
    }

    #[test]
    fn test_malformed_server_key_is_not_a_match() {
        let ops = Primitives::new();
        let keypair = KeyPair::generate();
        let standard = keypair.account_id(&ops).unwrap();
        let blinded = blinded_id_for(&ops, &keypair);

        assert!(!matches(&ops, &standard.to_string(), &blinded.to_string(), "abcd"));
        assert!(matches!(
            blind_standard_id(&ops, &standard, "abcd"),
            Err(CryptoError::InvalidServerKey)
        ));
    }

    #[test]
    fn test_candidates_differ_only_in_sign_bit() {
        let ops = Primitives::new();
        let keypair = KeyPair::generate();
        let standard = keypair.account_id(&ops).unwrap();

        let [first, second] = blind_standard_id(&ops, &standard, SERVER).unwrap();
        assert_eq!(first.public_key()[..31], second.public_key()[..31]);
        assert_eq!(first.public_key()[31] ^ second.public_key()[31], 0x80);
    }
}
