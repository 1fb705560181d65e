//! Account identities and blinded-id matching
//!
//! An account id is a one-byte prefix plus a 32-byte public key. The prefix
//! says what kind of key follows: the root identity (`05`), a per-server
//! blinded key (`15`), an unblinded Ed25519 key (`00`) and so on.

mod account_id;
mod matcher;

pub use account_id::{AccountId, AccountIdError, IdPrefix, ACCOUNT_ID_HEX_LEN};
pub use matcher::{blind_standard_id, matches};
