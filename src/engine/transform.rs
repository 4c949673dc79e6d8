//! Matching and reassembly.
//!
//! This module is the operational core of the engine. A [`Responder`] borrows
//! the compiled script (read-only), one session's mutable state and the
//! session's random source, and runs the reply pipeline:
//!
//! ```text
//! raw text
//!   │ normalize: lowercase, strip punctuation, mark sentence breaks
//!   v
//! fragments ── quit word? ──────────────────────────▶ farewell (quit = true)
//!   │ pre-substitution ("dont" -> "don't")
//!   v
//! keyword scan (rank order) ── match ─▶ exec_rule ─▶ reply
//!   │ no keyword produced a reply
//!   v
//! memory fetch ── entry ─▶ reply
//!   │ empty
//!   v
//! xnone rule ─▶ reply (or the fixed out-of-words line)
//! ```
//!
//! `exec_rule` walks a rule's decompositions in order, picks a reassembly at
//! random without repeating the previous pick for that decomposition,
//! resolves `goto` redirects through the compiled index and splices captured
//! groups (post-substituted) into the template. Memory-flagged decompositions
//! park their reply and keep scanning; everything else returns immediately.
//!
//! Every match attempt is a pure function of (pattern, fragment): no matcher
//! carries position state between calls. The cosmetic post-transform is
//! applied exactly once, to whatever string leaves `transform`.
//!
//! ## Debugging
//!
//! Set `ROGERIAN_DEBUG_RULES=1` to print match traces.

use super::compile::CompiledScript;
use super::session::SessionState;
use super::subst::tidy_spaces;
use crate::api::{MatchSummary, Options, ReplySource, TransformTrace};
use crate::Reassembly;

/// Reply returned when even the fallback rule produces nothing.
const OUT_OF_WORDS: &str = "I am at a loss for words.";

/// One transform run's view of the engine: compiled script, session state,
/// random source and trace sink.
pub(crate) struct Responder<'a> {
    script: &'a CompiledScript,
    state: &'a mut SessionState,
    options: &'a Options,
    rand: &'a mut dyn FnMut() -> f64,
    trace: &'a mut TransformTrace,
}

impl<'a> Responder<'a> {
    pub fn new(
        script: &'a CompiledScript,
        state: &'a mut SessionState,
        options: &'a Options,
        rand: &'a mut dyn FnMut() -> f64,
        trace: &'a mut TransformTrace,
    ) -> Self {
        Responder { script, state, options, rand, trace }
    }

    /// Produce a reply for `text`. Always returns a string; the only
    /// side effects are on the session state (quit flag, memory,
    /// last-reassembly table) and the random source.
    pub fn transform(&mut self, text: &str) -> String {
        self.state.quit = false;

        let normalized = normalize(text);
        for part in normalized.split('.') {
            if part.is_empty() {
                continue;
            }
            if self.script.quits.iter().any(|q| q == part) {
                self.state.quit = true;
                self.trace.source = ReplySource::Farewell;
                return pick_random(&self.script.finals, &mut *self.rand)
                    .cloned()
                    .unwrap_or_default();
            }

            let sentence = self.script.pre.apply(part);
            self.trace.fragments.push(sentence.clone());

            for k in 0..self.script.keywords.len() {
                if !self.script.keywords[k].matcher.is_match(&sentence) {
                    continue;
                }
                if let Some(reply) = self.exec_rule(k, &sentence, 0) {
                    self.trace.source = ReplySource::Keyword;
                    return self.finish(&reply);
                }
            }
        }

        if let Some(reply) = self.state.memory.fetch(&mut *self.rand) {
            self.trace.source = ReplySource::Memory;
            return self.finish(&reply);
        }

        // Run the fallback rule against a single space so its wildcard has
        // something harmless to capture.
        self.trace.source = ReplySource::Fallback;
        if let Some(reply) = self.exec_rule(self.script.fallback, " ", 0) {
            return self.finish(&reply);
        }
        OUT_OF_WORDS.to_string()
    }

    fn finish(&self, reply: &str) -> String {
        self.script.post_transforms.apply(reply, self.options.capitalize_first_letter)
    }

    /// Execute rule `k` against `sentence`: first matching decomposition
    /// wins, its reassembly is selected and assembled. `None` means the rule
    /// produced nothing for this fragment (distinct from an empty reply).
    fn exec_rule(&mut self, k: usize, sentence: &str, depth: usize) -> Option<String> {
        // Redirect chains are acyclic in a compiled script; the guard stops
        // runaway recursion if rule data is somehow malformed anyway.
        if depth > self.script.keywords.len() {
            return None;
        }

        let script = self.script;
        let rule = &script.keywords[k];
        let debug = std::env::var_os("ROGERIAN_DEBUG_RULES").is_some();

        for (i, decomp) in rule.decompositions.iter().enumerate() {
            let Some(caps) = decomp.pattern.captures(sentence) else {
                continue;
            };
            if decomp.reassemblies.is_empty() {
                continue;
            }

            let ri = self.select_reassembly(k, i, decomp.reassemblies.len());
            let reassembly = &decomp.reassemblies[ri];

            if debug {
                eprintln!(
                    "[rule:match] key=\"{}\" rank={} decomp=\"{}\" reasmb=\"{}\" mem={}",
                    rule.key,
                    rule.rank,
                    decomp.source,
                    reassembly.source(),
                    decomp.save_to_memory,
                );
            }
            self.trace.matches.push(MatchSummary {
                key: rule.key.clone(),
                rank: rule.rank,
                pattern: decomp.source.clone(),
                reassembly: reassembly.source(),
                saved_to_memory: decomp.save_to_memory
                    && matches!(reassembly, Reassembly::Literal(_)),
            });

            match reassembly {
                Reassembly::Goto(target) => match script.by_key.get(target) {
                    Some(&next) => return self.exec_rule(next, sentence, depth + 1),
                    // Dangling target: this decomposition yields nothing.
                    None => continue,
                },
                Reassembly::Literal(template) => {
                    let assembled = tidy_spaces(&self.substitute_params(template, &caps));
                    if decomp.save_to_memory {
                        self.state.memory.save(assembled, self.options.mem_size);
                        continue;
                    }
                    return Some(assembled);
                }
            }
        }
        None
    }

    /// Random pick over `len` reassemblies that never repeats the previous
    /// pick for this (rule, decomposition) pair: a colliding draw advances to
    /// the next index instead, wrapping to 0 (and forgetting the record) when
    /// it runs off the end.
    fn select_reassembly(&mut self, k: usize, i: usize, len: usize) -> usize {
        let mut ri = self.rand_index(len);
        let last = self.state.last_choice[k][i];
        if last == ri as isize {
            let next = last + 1;
            if next as usize >= len {
                ri = 0;
                self.state.last_choice[k][i] = -1;
            } else {
                ri = next as usize;
                self.state.last_choice[k][i] = next;
            }
        } else {
            self.state.last_choice[k][i] = ri as isize;
        }
        ri
    }

    /// Splice captured groups into `template`, applying post-substitution to
    /// each captured text. `(0)` is the whole matched fragment; a group that
    /// did not participate or does not exist splices the empty string.
    fn substitute_params(&self, template: &str, caps: &regex::Captures<'_>) -> String {
        let mut out = String::new();
        let mut rest = template;
        while let Some(m) = regex!(r"\(([0-9]+)\)").captures(rest) {
            let whole = m.get(0).unwrap();
            let captured = m[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| caps.get(n))
                .map(|g| g.as_str())
                .unwrap_or("");
            out.push_str(&rest[..whole.start()]);
            out.push_str(&self.script.post.apply(captured));
            rest = &rest[whole.end()..];
        }
        out.push_str(rest);
        out
    }

    fn rand_index(&mut self, len: usize) -> usize {
        (((self.rand)() * len as f64) as usize).min(len - 1)
    }
}

/// Pick a uniformly random entry, or `None` for an empty list.
pub(crate) fn pick_random<'s>(
    list: &'s [String],
    rand: &mut dyn FnMut() -> f64,
) -> Option<&'s String> {
    if list.is_empty() {
        return None;
    }
    let idx = ((rand() * list.len() as f64) as usize).min(list.len() - 1);
    list.get(idx)
}

/// Lowercase, blank out blacklisted punctuation and fold sentence breaks
/// (` - ` runs, `,.?!;` runs, the word "but") into periods.
fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let out = regex!(r"[@#$%^&*()_+=~`{\[}\]|:;<>/\\\t]").replace_all(&lowered, " ");
    let out = regex!(r"\s+-+\s+").replace_all(&out, ".");
    let out = regex!(r"\s*[,.?!;]+\s*").replace_all(&out, ".");
    let out = regex!(r"\s*\bbut\b\s*").replace_all(&out, ".");
    regex!(r"\s{2,}").replace_all(&out, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_lowercases_and_splits_sentences() {
        assert_eq!(normalize("Hello, World!"), "hello.world.");
        assert_eq!(normalize("one - two"), "one.two");
        assert_eq!(normalize("I like it but it hurts"), "i like it.it hurts");
    }

    #[test]
    fn normalization_blanks_blacklisted_punctuation() {
        assert_eq!(normalize("a@b#c"), "a b c");
        assert_eq!(normalize("tab\there"), "tab here");
    }

    #[test]
    fn pick_random_covers_the_whole_list() {
        let list: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut low = || 0.0;
        let mut high = || 0.999;
        assert_eq!(pick_random(&list, &mut low).map(String::as_str), Some("a"));
        assert_eq!(pick_random(&list, &mut high).map(String::as_str), Some("c"));
        assert_eq!(pick_random(&[], &mut low), None);
    }
}
