use serde::{Deserialize, Serialize};

/// Claim metadata submitted for pinning.
///
/// This is the payload the pinning service content-addresses; the resulting
/// URI is what the atom id is derived from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl AtomMetadata {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: url.into(),
            image: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Metadata for a predicate atom. Predicates are named relations, so the
    /// URI is a URN derived from the name; the same name always produces the
    /// same metadata and therefore the same atom.
    pub fn for_predicate(name: impl Into<String>) -> Self {
        let name = name.into();
        let url = format!("urn:attest:predicate:{name}");
        Self::new(name, url)
    }
}

/// A caller-supplied triple awaiting resolution.
///
/// Transient: exists only while a batch is being orchestrated, never
/// persisted. The subject atom comes from the caller's own identity and is
/// shared across a batch, so it is not part of the candidate itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTriple {
    /// Application-level id of the action that produced this candidate.
    /// Keys the publication record so the same action is not re-submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Relation name, e.g. `"trusts"`.
    pub predicate: String,
    /// Metadata of the claim's target.
    pub object: AtomMetadata,
}

impl CandidateTriple {
    pub fn new(predicate: impl Into<String>, object: AtomMetadata) -> Self {
        Self {
            origin: None,
            predicate: predicate.into(),
            object,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let metadata = AtomMetadata::new("alice.eth", "https://example.com/alice");
        let json = serde_json::to_value(&metadata).unwrap();
        assert!(json.get("description").is_none());
        assert!(json.get("image").is_none());
    }

    #[test]
    fn candidate_round_trips_through_json() {
        let candidate = CandidateTriple::new(
            "trusts",
            AtomMetadata::new("alice.eth", "https://example.com/alice"),
        )
        .with_origin("action-42");

        let json = serde_json::to_string(&candidate).unwrap();
        let back: CandidateTriple = serde_json::from_str(&json).unwrap();
        assert_eq!(back, candidate);
    }
}
