//! Word substitution tables and the cosmetic post-transform.
//!
//! Two kinds of rewriting live here:
//!
//! - [`SubstTable`]: whole-word replacement driven by a single alternation
//!   regex plus a lookup map. The pre table rewrites input fragments before
//!   keyword scanning ("dont" -> "don't"); the post table rewrites captured
//!   wildcard text before it is spliced into a reply ("my" -> "your").
//!   Matching is whole-word and runs left to right over the *remainder* of
//!   the string: a replacement is never rescanned, so `me -> you` followed by
//!   `you -> I` cannot cascade within one pass.
//!
//! - [`PostTransforms`]: the ordered cosmetic pass applied to every reply
//!   that leaves the engine. Space runs collapse, a stray space before a
//!   period is dropped, each script-supplied (pattern, replacement) pair is
//!   applied globally in listed order, and finally the first letter is
//!   capitalized when the option is on.
//!
//! Both structures are compiled once and never mutated afterwards; an empty
//! substitution table compiles to a pattern that cannot match any input, so
//! the apply path needs no special casing.

use regex::Regex;
use std::collections::HashMap;

use super::compile::ScriptError;

/// A compiled whole-word rewrite table.
#[derive(Debug, Clone)]
pub(crate) struct SubstTable {
    exp: Regex,
    map: HashMap<String, String>,
}

impl SubstTable {
    /// Build the alternation regex and lookup map from ordered (word,
    /// replacement) pairs.
    pub fn compile(pairs: &[(String, String)]) -> Result<SubstTable, ScriptError> {
        if pairs.is_empty() {
            // `[^\s\S]` matches nothing at all, so an empty table is inert.
            return Ok(SubstTable { exp: regex!(r"[^\s\S]").clone(), map: HashMap::new() });
        }

        let alternation =
            pairs.iter().map(|(word, _)| word.as_str()).collect::<Vec<_>>().join("|");
        let pattern = format!(r"\b({alternation})\b");
        let exp = Regex::new(&pattern)
            .map_err(|source| ScriptError::Substitution { pattern, source })?;

        let map = pairs.iter().cloned().collect();
        Ok(SubstTable { exp, map })
    }

    /// Rewrite every whole-word match in `text`, scanning left to right and
    /// continuing after each splice.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(caps) = self.exp.captures(rest) {
            let whole = caps.get(0).unwrap();
            let word = caps.get(1).unwrap().as_str();
            out.push_str(&rest[..whole.start()]);
            out.push_str(self.map.get(word).map(String::as_str).unwrap_or(word));
            rest = &rest[whole.end()..];
        }
        out.push_str(rest);
        out
    }
}

/// The compiled cosmetic pass applied to outgoing replies.
#[derive(Debug, Clone)]
pub(crate) struct PostTransforms {
    rules: Vec<(Regex, String)>,
}

impl PostTransforms {
    pub fn compile(pairs: &[(String, String)]) -> Result<PostTransforms, ScriptError> {
        let mut rules = Vec::with_capacity(pairs.len());
        for (pattern, replacement) in pairs {
            let re = Regex::new(pattern).map_err(|source| ScriptError::PostTransform {
                pattern: pattern.clone(),
                source,
            })?;
            rules.push((re, replacement.clone()));
        }
        Ok(PostTransforms { rules })
    }

    /// Tidy spaces, run the script's transform rules in order (each globally)
    /// and capitalize the first letter when enabled.
    pub fn apply(&self, reply: &str, capitalize_first_letter: bool) -> String {
        let mut out = tidy_spaces(reply);
        for (re, replacement) in &self.rules {
            out = re.replace_all(&out, replacement.as_str()).into_owned();
        }
        if capitalize_first_letter {
            if let Some(first) = out.get_mut(..1) {
                first.make_ascii_uppercase();
            }
        }
        out
    }
}

/// Collapse runs of whitespace and drop a stray space before a period.
pub(crate) fn tidy_spaces(text: &str) -> String {
    let out = regex!(r"\s{2,}").replace_all(text, " ");
    regex!(r"\s+\.").replace_all(&out, ".").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(flat: &[&str]) -> SubstTable {
        let pairs: Vec<(String, String)> =
            flat.chunks(2).map(|c| (c[0].to_string(), c[1].to_string())).collect();
        SubstTable::compile(&pairs).unwrap()
    }

    #[test]
    fn whole_word_replacement() {
        let pre = table(&["dont", "don't"]);
        assert_eq!(pre.apply("i dont know"), "i don't know");
        // no partial-word hits
        assert_eq!(pre.apply("i dontknow"), "i dontknow");
    }

    #[test]
    fn replacements_are_not_rescanned() {
        let post = table(&["me", "you", "you", "I"]);
        // "me" becomes "you" but the spliced "you" is not rewritten again
        assert_eq!(post.apply("you me"), "I you");
    }

    #[test]
    fn captured_possessives_flip_person() {
        let post = table(&["my", "your"]);
        assert_eq!(post.apply("my book"), "your book");
    }

    #[test]
    fn empty_table_is_inert() {
        let none = table(&[]);
        assert_eq!(none.apply("anything at all"), "anything at all");
    }

    #[test]
    fn tidy_spaces_collapses_and_fixes_periods() {
        assert_eq!(tidy_spaces("a  b   c ."), "a b c.");
    }

    #[test]
    fn capitalization_is_idempotent() {
        let transforms = PostTransforms::compile(&[]).unwrap();
        let once = transforms.apply("why do you say that ?", true);
        let twice = transforms.apply(&once, true);
        assert_eq!(once, "Why do you say that ?");
        assert_eq!(once, twice);
    }

    #[test]
    fn transform_rules_apply_globally_in_order() {
        let pairs = vec![(" old old".to_string(), " old".to_string())];
        let transforms = PostTransforms::compile(&pairs).unwrap();
        assert_eq!(transforms.apply("your old old dog", true), "Your old dog");
    }

    #[test]
    fn backreference_replacements_expand() {
        let pairs =
            vec![(r"\bthey were( not)? me\b".to_string(), "it was$1 me".to_string())];
        let transforms = PostTransforms::compile(&pairs).unwrap();
        assert_eq!(transforms.apply("they were not me", false), "it was not me");
        assert_eq!(transforms.apply("they were me", false), "it was me");
    }

    #[test]
    fn bad_transform_pattern_is_rejected() {
        let pairs = vec![("(".to_string(), "x".to_string())];
        assert!(PostTransforms::compile(&pairs).is_err());
    }
}
