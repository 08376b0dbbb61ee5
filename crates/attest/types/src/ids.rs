//! Derived identifiers for ledger entities.
//!
//! Every identifier is a 32-byte BLAKE3 digest behind a versioned domain
//! prefix. Derivation is a pure function of its inputs — the same content URI
//! always yields the same `AtomId` on every caller and every run, which is
//! what makes check-before-create possible without server coordination. Any
//! drift between client-derived and ledger-derived ids is a correctness bug,
//! not a runtime condition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ATOM_DOMAIN: &[u8] = b"attest-atom-v1:";
const TRIPLE_DOMAIN: &[u8] = b"attest-triple-v1:";

/// Canonical content URI returned by the pinning service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentUri(String);

impl ContentUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors produced when parsing an identifier from its hex form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdParseError {
    #[error("identifier is not valid hex: {0}")]
    InvalidHex(String),

    #[error("identifier must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

fn parse_hex(input: &str) -> Result<[u8; 32], IdParseError> {
    let bytes = hex::decode(input.trim_start_matches("0x"))
        .map_err(|error| IdParseError::InvalidHex(error.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| IdParseError::InvalidLength(len))
}

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name([u8; 32]);

        impl $name {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn from_hex(input: &str) -> Result<Self, IdParseError> {
                parse_hex(input).map(Self)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }
    };
}

id_newtype! {
    /// Identifier of an immutable, content-addressed atom.
    AtomId
}

id_newtype! {
    /// Identifier of an immutable (subject, predicate, object) triple.
    TripleId
}

id_newtype! {
    /// An identifier in the ledger's shared entity namespace.
    ///
    /// Atoms and triples occupy one id space on the ledger; existence queries
    /// are keyed by `EntityId` regardless of which kind the id denotes.
    EntityId
}

id_newtype! {
    /// Hash of a confirmed ledger write transaction.
    TxHash
}

impl AtomId {
    /// Derive the atom identifier for a content URI.
    pub fn derive(uri: &ContentUri) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ATOM_DOMAIN);
        hasher.update(uri.as_str().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl TripleId {
    /// Derive the triple identifier for an ordered (subject, predicate,
    /// object) tuple of atom ids. Order-sensitive.
    pub fn derive(subject: &AtomId, predicate: &AtomId, object: &AtomId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TRIPLE_DOMAIN);
        hasher.update(subject.as_bytes());
        hasher.update(predicate.as_bytes());
        hasher.update(object.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl From<AtomId> for EntityId {
    fn from(id: AtomId) -> Self {
        Self(id.0)
    }
}

impl From<TripleId> for EntityId {
    fn from(id: TripleId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn atom(seed: u8) -> AtomId {
        AtomId::from_bytes([seed; 32])
    }

    #[test]
    fn atom_derivation_is_deterministic() {
        let uri = ContentUri::new("ipfs://bafy-alice");
        assert_eq!(AtomId::derive(&uri), AtomId::derive(&uri));
    }

    #[test]
    fn triple_derivation_is_order_sensitive() {
        let (a, b, c) = (atom(1), atom(2), atom(3));
        assert_ne!(TripleId::derive(&a, &b, &c), TripleId::derive(&c, &b, &a));
        assert_ne!(TripleId::derive(&a, &b, &c), TripleId::derive(&b, &a, &c));
    }

    #[test]
    fn atom_and_triple_derivations_use_disjoint_domains() {
        let uri = ContentUri::new("ipfs://bafy-demo");
        let (a, b, c) = (atom(1), atom(2), atom(3));
        assert_ne!(
            *AtomId::derive(&uri).as_bytes(),
            *TripleId::derive(&a, &b, &c).as_bytes()
        );
    }

    #[test]
    fn hex_round_trip() {
        let id = EntityId::from_bytes([7; 32]);
        assert_eq!(EntityId::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(EntityId::from_hex(&format!("0x{}", id.to_hex())).unwrap(), id);
    }

    #[test]
    fn hex_parse_rejects_bad_input() {
        assert!(matches!(
            EntityId::from_hex("zz"),
            Err(IdParseError::InvalidHex(_))
        ));
        assert_eq!(
            EntityId::from_hex("abcd"),
            Err(IdParseError::InvalidLength(2))
        );
    }

    proptest! {
        #[test]
        fn derivation_is_pure(uri in ".{0,64}") {
            let uri = ContentUri::new(uri);
            prop_assert_eq!(AtomId::derive(&uri), AtomId::derive(&uri));
        }

        #[test]
        fn distinct_uris_yield_distinct_ids(a in ".{1,64}", b in ".{1,64}") {
            prop_assume!(a != b);
            prop_assert_ne!(
                AtomId::derive(&ContentUri::new(a)),
                AtomId::derive(&ContentUri::new(b))
            );
        }

        #[test]
        fn permuted_triples_yield_distinct_ids(s in 0u8..=255, p in 0u8..=255, o in 0u8..=255) {
            prop_assume!(s != p || p != o);
            let (s, p, o) = (atom(s), atom(p), atom(o));
            if s != o {
                prop_assert_ne!(TripleId::derive(&s, &p, &o), TripleId::derive(&o, &p, &s));
            }
        }
    }
}
