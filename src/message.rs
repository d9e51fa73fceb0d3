use serde::{Deserialize, Serialize};
use std::fmt;

/// Outreach copy generated for one lead.
///
/// The serialized keys match the JSON object the generation backend is asked
/// to return, so the same type is used to parse responses and to export them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePack {
    /// Subject line of variant A
    #[serde(rename = "subject_A")]
    pub subject_a: String,

    /// Body of variant A
    #[serde(rename = "body_A")]
    pub body_a: String,

    /// Subject line of variant B
    #[serde(rename = "subject_B")]
    pub subject_b: String,

    /// Body of variant B
    #[serde(rename = "body_B")]
    pub body_b: String,

    /// First follow-up body
    pub followup_1: String,

    /// Second follow-up body
    pub followup_2: String,
}

impl MessagePack {
    /// Wire names of the six fields, in validation order.
    pub const FIELD_NAMES: [&'static str; 6] = [
        "subject_A",
        "body_A",
        "subject_B",
        "body_B",
        "followup_1",
        "followup_2",
    ];

    /// Returns `(wire name, value)` for every field, in validation order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            (Self::FIELD_NAMES[0], self.subject_a.as_str()),
            (Self::FIELD_NAMES[1], self.body_a.as_str()),
            (Self::FIELD_NAMES[2], self.subject_b.as_str()),
            (Self::FIELD_NAMES[3], self.body_b.as_str()),
            (Self::FIELD_NAMES[4], self.followup_1.as_str()),
            (Self::FIELD_NAMES[5], self.followup_2.as_str()),
        ]
    }

    /// All six fields joined by single spaces.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.fields()
            .iter()
            .map(|(_, value)| *value)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Subject and body of the given variant.
    #[must_use]
    pub fn variant(&self, variant: Variant) -> (&str, &str) {
        match variant {
            Variant::A => (&self.subject_a, &self.body_a),
            Variant::B => (&self.subject_b, &self.body_b),
        }
    }
}

/// A/B variant tag used by the tabular exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// First phrasing
    A,
    /// Second phrasing
    B,
}

impl Variant {
    /// Both variants in export order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// Tag written into the `variant` column.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack() -> MessagePack {
        MessagePack {
            subject_a: "sa".to_string(),
            body_a: "ba".to_string(),
            subject_b: "sb".to_string(),
            body_b: "bb".to_string(),
            followup_1: "f1".to_string(),
            followup_2: "f2".to_string(),
        }
    }

    #[test]
    fn test_parses_backend_keys() {
        let json = r#"{
            "subject_A": "sa", "body_A": "ba",
            "subject_B": "sb", "body_B": "bb",
            "followup_1": "f1", "followup_2": "f2"
        }"#;
        let parsed: MessagePack = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, pack());
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let json = r#"{"subject_A": "sa", "body_A": "ba"}"#;
        assert!(serde_json::from_str::<MessagePack>(json).is_err());
    }

    #[test]
    fn test_full_text_joins_in_order() {
        assert_eq!(pack().full_text(), "sa ba sb bb f1 f2");
    }

    #[test]
    fn test_variant_accessor() {
        let pack = pack();
        assert_eq!(pack.variant(Variant::A), ("sa", "ba"));
        assert_eq!(pack.variant(Variant::B), ("sb", "bb"));
        assert_eq!(Variant::B.to_string(), "B");
    }
}
