//! Raw script data.
//!
//! A [`Script`] is the canonical, human-editable form of a rule set: keyword
//! rules with decomposition patterns and reply templates, the synonym table
//! used by `@name` references, the pre/post word substitution tables, the
//! cosmetic post-transform table, quit words and the greeting/farewell lists.
//!
//! The engine never matches against a raw script directly; it is compiled
//! exactly once into a [`crate::CompiledScript`]. Keeping the raw form as
//! plain serde-serializable data means a host can embed the stock script,
//! load one from JSON, or build one programmatically; the engine does not
//! care where the data came from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod doctor;

/// A complete rule set in canonical (uncompiled) form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Keyword rules, in authoring order. Authoring order is the tie-breaker
    /// between rules of equal rank, so it is significant.
    pub keywords: Vec<Keyword>,
    /// Canonical word -> equivalent words, consumed by `@name` references in
    /// decomposition patterns at compile time.
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
    /// Ordered (word, replacement) pairs applied to input fragments before
    /// keyword scanning.
    #[serde(default)]
    pub pre: Vec<(String, String)>,
    /// Ordered (word, replacement) pairs applied to captured wildcard text
    /// before it is spliced into a reply template.
    #[serde(default)]
    pub post: Vec<(String, String)>,
    /// Ordered (pattern, replacement) regex pairs applied to every assembled
    /// reply, each globally, in listed order.
    #[serde(default)]
    pub post_transforms: Vec<(String, String)>,
    /// Phrases that end the conversation when a sentence fragment equals one
    /// of them exactly.
    #[serde(default)]
    pub quits: Vec<String>,
    /// Greeting lines, one picked at random per `initial_greeting` call.
    #[serde(default)]
    pub initials: Vec<String>,
    /// Farewell lines, one picked at random on quit and `final_greeting`.
    #[serde(default)]
    pub finals: Vec<String>,
}

/// One keyword rule: a trigger word (or synonym pattern), a rank and an
/// ordered list of decompositions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub key: String,
    /// Priority; higher ranks are scanned first.
    pub rank: i32,
    pub decompositions: Vec<Decomposition>,
}

/// A decomposition pattern plus its reply templates.
///
/// The pattern may start with `$` (save produced replies to memory instead of
/// returning them), contain `@name` synonym references and `*` wildcards.
/// A reassembly is either literal text with `(N)` placeholders or
/// `goto <keyword>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub pattern: String,
    pub reassemblies: Vec<String>,
}

impl Script {
    /// The stock "doctor" script: the classic Rogerian-therapist rule set,
    /// embedded so the engine is usable out of the box.
    pub fn doctor() -> Script {
        doctor::DOCTOR.clone()
    }

    /// Deserialize a script from JSON.
    pub fn from_json(text: &str) -> Result<Script, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_script_has_the_expected_tables() {
        let script = Script::doctor();
        assert!(script.keywords.iter().any(|k| k.key == "xnone"));
        assert!(script.keywords.iter().any(|k| k.key == "remember" && k.rank == 5));
        assert_eq!(script.synonyms["family"][0], "mother");
        assert!(script.quits.iter().any(|q| q == "goodbye"));
        assert!(!script.initials.is_empty());
        assert!(!script.finals.is_empty());
    }

    #[test]
    fn json_round_trip_preserves_the_script() {
        let script = Script::doctor();
        let json = serde_json::to_string(&script).unwrap();
        let back = Script::from_json(&json).unwrap();
        assert_eq!(script, back);
    }
}
