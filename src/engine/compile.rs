//! Script compilation.
//!
//! This module holds the *static* side of the engine: everything derived from
//! a raw [`Script`] up front so that a transform run only ever consults
//! immutable, pre-built structures.
//!
//! Compilation does four things per keyword rule:
//!
//! 1. Strip the `$` save-to-memory marker from each decomposition pattern.
//! 2. Expand `@name` synonym references into alternation groups.
//! 3. Translate `*` wildcards into greedy, whitespace-tolerant capture
//!    groups with word-boundary assertions where the neighboring characters
//!    allow them.
//! 4. Collapse literal whitespace runs so the compiled pattern tolerates any
//!    spacing in the input.
//!
//! The full rule list is then sorted by rank (descending, authoring order
//! breaking ties) and indexed by keyword name for `goto` resolution. Bad rule
//! data (a pattern or keyword that does not compile, a missing `xnone`
//! fallback rule, a cycle in the `goto` graph) is a [`ScriptError`] raised
//! here, before any session exists. Nothing on the transform path can fail.
//!
//! ## Invariants
//!
//! - `CompiledScript::keywords` order is the scan order; `by_key` values and
//!   every `last_choice` table index into it. Those must stay aligned.
//! - A compiled script is immutable. Sessions share it read-only.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use super::subst::{PostTransforms, SubstTable};
use crate::script::Script;
use crate::Reassembly;

/// Structural problems in rule data, surfaced once at compile time.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("keyword {keyword:?}: decomposition pattern {pattern:?} does not compile: {source}")]
    Pattern {
        keyword: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("keyword {keyword:?} does not compile into a word matcher: {source}")]
    Keyword {
        keyword: String,
        #[source]
        source: regex::Error,
    },
    #[error("substitution table pattern {pattern:?} does not compile: {source}")]
    Substitution {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("post-transform pattern {pattern:?} does not compile: {source}")]
    PostTransform {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("script has no fallback rule (a keyword named \"xnone\")")]
    MissingFallback,
    #[error("redirect cycle through keyword {keyword:?}")]
    GotoCycle { keyword: String },
}

/// One keyword rule in matchable form.
#[derive(Debug, Clone)]
pub(crate) struct CompiledKeyword {
    pub key: String,
    pub rank: i32,
    /// Position in the raw script; tie-breaker between equal ranks.
    pub original_index: usize,
    /// Word-boundary, case-insensitive detector for the keyword itself.
    pub matcher: Regex,
    pub decompositions: Vec<CompiledDecomposition>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledDecomposition {
    pub pattern: Regex,
    /// Compiled pattern text, kept for traces and debug output.
    pub source: String,
    pub reassemblies: Vec<Reassembly>,
    pub save_to_memory: bool,
}

/// An immutable, rank-sorted rule set plus its substitution tables.
///
/// Compile once, then share read-only across any number of sessions (it is
/// `Send + Sync`; wrap it in an `Arc`).
#[derive(Debug, Clone)]
pub struct CompiledScript {
    pub(crate) keywords: Vec<CompiledKeyword>,
    /// Keyword name -> index into `keywords`, used by `goto` resolution. For
    /// duplicate names the highest-priority rule wins, matching scan order.
    pub(crate) by_key: HashMap<String, usize>,
    /// Index of the mandatory `xnone` rule.
    pub(crate) fallback: usize,
    pub(crate) pre: SubstTable,
    pub(crate) post: SubstTable,
    pub(crate) post_transforms: PostTransforms,
    pub(crate) quits: Vec<String>,
    pub(crate) initials: Vec<String>,
    pub(crate) finals: Vec<String>,
}

impl CompiledScript {
    /// Compile `script` into matchable form.
    ///
    /// This is a pure function of the script; the result never changes
    /// afterwards. Malformed rule data fails here, never at transform time.
    pub fn compile(script: &Script) -> Result<CompiledScript, ScriptError> {
        let mut keywords = Vec::with_capacity(script.keywords.len());

        for (original_index, raw) in script.keywords.iter().enumerate() {
            let matcher = Regex::new(&format!(r"(?i)\b{}\b", raw.key)).map_err(|source| {
                ScriptError::Keyword { keyword: raw.key.clone(), source }
            })?;

            let mut decompositions = Vec::with_capacity(raw.decompositions.len());
            for decomp in &raw.decompositions {
                let (stripped, save_to_memory) = strip_memory_flag(&decomp.pattern);
                let expanded = expand_synonyms(stripped, &script.synonyms);
                let translated = expand_wildcards(&expanded);
                let compiled_text = regex!(r"\s+").replace_all(&translated, r"\s+").into_owned();
                let pattern = Regex::new(&compiled_text).map_err(|source| ScriptError::Pattern {
                    keyword: raw.key.clone(),
                    pattern: decomp.pattern.clone(),
                    source,
                })?;
                decompositions.push(CompiledDecomposition {
                    pattern,
                    source: compiled_text,
                    reassemblies: decomp.reassemblies.iter().map(|r| parse_reassembly(r)).collect(),
                    save_to_memory,
                });
            }

            keywords.push(CompiledKeyword {
                key: raw.key.clone(),
                rank: raw.rank,
                original_index,
                matcher,
                decompositions,
            });
        }

        keywords.sort_by(|a, b| {
            b.rank.cmp(&a.rank).then(a.original_index.cmp(&b.original_index))
        });

        let mut by_key = HashMap::new();
        for (idx, rule) in keywords.iter().enumerate() {
            by_key.entry(rule.key.clone()).or_insert(idx);
        }

        let fallback = *by_key.get("xnone").ok_or(ScriptError::MissingFallback)?;
        reject_goto_cycles(&keywords, &by_key)?;

        Ok(CompiledScript {
            keywords,
            by_key,
            fallback,
            pre: SubstTable::compile(&script.pre)?,
            post: SubstTable::compile(&script.post)?,
            post_transforms: PostTransforms::compile(&script.post_transforms)?,
            quits: script.quits.clone(),
            initials: script.initials.clone(),
            finals: script.finals.clone(),
        })
    }
}

/// Detect and strip a leading `$` (plus any following spaces).
fn strip_memory_flag(pattern: &str) -> (&str, bool) {
    match pattern.strip_prefix('$') {
        Some(rest) => (rest.trim_start_matches(' '), true),
        None => (pattern, false),
    }
}

/// Replace every `@name` reference with the synonym alternation for `name`,
/// or with the bare name when the table has no entry (not an error).
fn expand_synonyms(pattern: &str, synonyms: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = pattern.to_string();
    while let Some(caps) = regex!(r"@(\S+)").captures(&out) {
        let whole = caps.get(0).unwrap();
        let name = caps.get(1).unwrap().as_str();
        let expansion = match synonyms.get(name) {
            Some(words) => {
                let mut alt = String::from("(");
                alt.push_str(name);
                for word in words {
                    alt.push('|');
                    alt.push_str(word);
                }
                alt.push(')');
                alt
            }
            None => name.to_string(),
        };
        let range = whole.range();
        out.replace_range(range, &expansion);
    }
    out
}

/// Translate `*` wildcards into `\s*(.*)\s*` capture groups.
///
/// Word-boundary assertions are added on the non-space side of each wildcard
/// unless the adjacent character is a group delimiter or backslash, where a
/// `\b` would produce a malformed or wrong expression:
///
/// ```text
/// "* i remember *"   ->  \s*(.*)\s*\bi remember\b\s*(.*)\s*
/// "* my (a|b) *"     ->  \s*(.*)\s*\bmy (a|b)\b\s*(.*)\s*
/// "*"                ->  \s*(.*)\s*
/// ```
///
/// (Literal whitespace is widened to `\s+` in a later step.)
fn expand_wildcards(pattern: &str) -> String {
    // A wildcard-only pattern captures the entire text.
    if regex!(r"^\s*\*\s*$").is_match(pattern) {
        return r"\s*(.*)\s*".to_string();
    }

    // Internal wildcards: a non-space character on both sides.
    let mut done = String::new();
    let mut rest = pattern.to_string();
    while let Some(caps) = regex!(r"(\S)\s*\*\s*(\S)").captures(&rest) {
        let whole = caps.get(0).unwrap();
        let left = caps.get(1).unwrap();
        let right = caps.get(2).unwrap();
        done.push_str(&rest[..left.end()]);
        if left.as_str() != ")" {
            done.push_str(r"\b");
        }
        done.push_str(r"\s*(.*)\s*");
        if right.as_str() != "(" && right.as_str() != "\\" {
            done.push_str(r"\b");
        }
        done.push_str(right.as_str());
        rest = rest[whole.end()..].to_string();
    }
    let mut out = format!("{done}{rest}");

    // Leading wildcard.
    if let Some(caps) = regex!(r"^\s*\*\s*(\S)").captures(&out) {
        let next = caps.get(1).unwrap();
        let mut head = String::from(r"\s*(.*)\s*");
        if next.as_str() != ")" && next.as_str() != "\\" {
            head.push_str(r"\b");
        }
        head.push_str(&out[next.start()..]);
        out = head;
    }

    // Trailing wildcard.
    if let Some(caps) = regex!(r"(\S)\s*\*\s*$").captures(&out) {
        let prev = caps.get(1).unwrap();
        let mut head = out[..prev.end()].to_string();
        if prev.as_str() != "(" {
            head.push_str(r"\b");
        }
        head.push_str(r"\s*(.*)\s*");
        out = head;
    }

    out
}

fn parse_reassembly(raw: &str) -> Reassembly {
    match raw.strip_prefix("goto ") {
        Some(target) => Reassembly::Goto(target.to_string()),
        None => Reassembly::Literal(raw.to_string()),
    }
}

/// Reject scripts whose `goto` references form a cycle.
///
/// Edges are keyword -> goto target, restricted to targets that exist; a
/// dangling target is a runtime no-op, not a structural error (stock scripts
/// carry some).
fn reject_goto_cycles(
    keywords: &[CompiledKeyword],
    by_key: &HashMap<String, usize>,
) -> Result<(), ScriptError> {
    let mut state = vec![VisitState::Unvisited; keywords.len()];
    for idx in 0..keywords.len() {
        visit_goto(idx, keywords, by_key, &mut state)?;
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

fn visit_goto(
    idx: usize,
    keywords: &[CompiledKeyword],
    by_key: &HashMap<String, usize>,
    state: &mut [VisitState],
) -> Result<(), ScriptError> {
    match state[idx] {
        VisitState::Done => return Ok(()),
        VisitState::InProgress => {
            return Err(ScriptError::GotoCycle { keyword: keywords[idx].key.clone() });
        }
        VisitState::Unvisited => {}
    }
    state[idx] = VisitState::InProgress;
    for decomp in &keywords[idx].decompositions {
        for reassembly in &decomp.reassemblies {
            if let Reassembly::Goto(target) = reassembly {
                if let Some(&next) = by_key.get(target) {
                    visit_goto(next, keywords, by_key, state)?;
                }
            }
        }
    }
    state[idx] = VisitState::Done;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Decomposition, Keyword};

    fn script_of(keywords: Vec<Keyword>) -> Script {
        Script { keywords, ..Script::default() }
    }

    fn keyword(key: &str, rank: i32, decomps: &[(&str, &[&str])]) -> Keyword {
        Keyword {
            key: key.to_string(),
            rank,
            decompositions: decomps
                .iter()
                .map(|(pattern, reassemblies)| Decomposition {
                    pattern: (*pattern).to_string(),
                    reassemblies: reassemblies.iter().map(|r| (*r).to_string()).collect(),
                })
                .collect(),
        }
    }

    fn xnone() -> Keyword {
        keyword("xnone", 0, &[("*", &["Please go on."])])
    }

    #[test]
    fn wildcard_only_pattern_captures_everything() {
        assert_eq!(expand_wildcards("*"), r"\s*(.*)\s*");
        assert_eq!(expand_wildcards("  *  "), r"\s*(.*)\s*");
    }

    #[test]
    fn leading_and_trailing_wildcards_get_boundaries() {
        assert_eq!(
            expand_wildcards("* i remember *"),
            r"\s*(.*)\s*\bi remember\b\s*(.*)\s*"
        );
    }

    #[test]
    fn boundaries_are_omitted_next_to_group_delimiters() {
        // internal wildcard bordered by an alternation group: no boundary
        // after the closing paren, none before an opening one, boundary kept
        // next to plain words
        assert_eq!(expand_wildcards("(a|b) * c"), r"(a|b)\s*(.*)\s*\bc");
        assert_eq!(expand_wildcards("a * (b|c)"), r"a\b\s*(.*)\s*(b|c)");
        assert_eq!(expand_wildcards("(a|b) *"), r"(a|b)\b\s*(.*)\s*");
    }

    #[test]
    fn synonym_references_expand_to_alternations() {
        let mut synonyms = BTreeMap::new();
        synonyms.insert(
            "family".to_string(),
            vec!["mother".to_string(), "father".to_string()],
        );
        assert_eq!(
            expand_synonyms("* my @family *", &synonyms),
            "* my (family|mother|father) *"
        );
        // unknown references degrade to the bare word
        assert_eq!(expand_synonyms("* @nobody *", &synonyms), "* nobody *");
    }

    #[test]
    fn memory_flag_is_stripped() {
        assert_eq!(strip_memory_flag("$ * my *"), ("* my *", true));
        assert_eq!(strip_memory_flag("* my *"), ("* my *", false));
    }

    #[test]
    fn whitespace_runs_become_flexible_matchers() {
        let script = script_of(vec![
            xnone(),
            keyword("remember", 5, &[("* i   remember *", &["Why (2) ?"])]),
        ]);
        let compiled = CompiledScript::compile(&script).unwrap();
        let rule = &compiled.keywords[compiled.by_key["remember"]];
        assert_eq!(rule.decompositions[0].source, r"\s*(.*)\s*\bi\s+remember\b\s*(.*)\s*");
        assert!(rule.decompositions[0].pattern.is_match("i  remember the lake"));
    }

    #[test]
    fn rules_sort_by_rank_then_authoring_order() {
        let script = script_of(vec![
            keyword("alpha", 0, &[("*", &["A"])]),
            keyword("bravo", 10, &[("*", &["B"])]),
            keyword("charlie", 10, &[("*", &["C"])]),
            xnone(),
        ]);
        let compiled = CompiledScript::compile(&script).unwrap();
        let order: Vec<&str> = compiled.keywords.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(order, vec!["bravo", "charlie", "alpha", "xnone"]);
    }

    #[test]
    fn missing_fallback_rule_is_a_compile_error() {
        let script = script_of(vec![keyword("hello", 0, &[("*", &["Hi."])])]);
        assert!(matches!(
            CompiledScript::compile(&script),
            Err(ScriptError::MissingFallback)
        ));
    }

    #[test]
    fn malformed_pattern_is_a_compile_error() {
        let script = script_of(vec![
            xnone(),
            keyword("broken", 0, &[("* ( *", &["Oops."])]),
        ]);
        assert!(matches!(
            CompiledScript::compile(&script),
            Err(ScriptError::Pattern { .. })
        ));
    }

    #[test]
    fn goto_cycles_are_rejected() {
        let script = script_of(vec![
            xnone(),
            keyword("ping", 0, &[("*", &["goto pong"])]),
            keyword("pong", 0, &[("*", &["goto ping"])]),
        ]);
        assert!(matches!(
            CompiledScript::compile(&script),
            Err(ScriptError::GotoCycle { .. })
        ));
    }

    #[test]
    fn dangling_goto_targets_compile_fine() {
        let script = script_of(vec![
            xnone(),
            keyword("why", 0, &[("*", &["goto what"])]),
        ]);
        assert!(CompiledScript::compile(&script).is_ok());
    }

    #[test]
    fn the_stock_script_compiles() {
        let compiled = CompiledScript::compile(&Script::doctor()).unwrap();
        // highest rank first
        assert_eq!(compiled.keywords[0].key, "computer");
        assert_eq!(compiled.keywords[compiled.fallback].key, "xnone");
    }
}
