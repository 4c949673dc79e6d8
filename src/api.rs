use crate::engine::{self, CompiledScript};
use crate::script::Script;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Options that affect reply production.
#[derive(Debug, Clone)]
pub struct Options {
    /// Uppercase the first letter of every outgoing reply.
    pub capitalize_first_letter: bool,
    /// Capacity of the deferred-reply memory.
    pub mem_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options { capitalize_first_letter: true, mem_size: 20 }
    }
}

/// One conversation.
///
/// A session owns its mutable state (memory, reassembly history, quit flag)
/// and its random source, and shares an immutable [`CompiledScript`]. Create
/// one session per conversation; a single compiled script can back any number
/// of them.
///
/// The engine is fully deterministic given the sequence produced by its
/// random source: two sessions built over the same script and fed the same
/// source and the same calls produce byte-identical output.
///
/// # Example
/// ```
/// use rogerian::{CompiledScript, Lcg, Script, Session};
/// use std::sync::Arc;
///
/// let script = Arc::new(CompiledScript::compile(&Script::doctor()).unwrap());
/// let mut session = Session::with_random_source(script, Lcg::new(1234).into_source());
/// let reply = session.transform("I remember my childhood");
/// assert!(!reply.is_empty());
/// ```
pub struct Session {
    script: Arc<CompiledScript>,
    options: Options,
    state: engine::SessionState,
    rand: Box<dyn FnMut() -> f64 + Send>,
}

impl Session {
    /// Create a session over `script` with default [`Options`] and an
    /// OS-seeded random source.
    pub fn new(script: Arc<CompiledScript>) -> Session {
        let mut rng = StdRng::from_os_rng();
        Session::with_random_source(script, move || rng.random::<f64>())
    }

    /// Create a session with default [`Options`] and an explicit random
    /// source. `source` must yield floats in `[0, 1)`; the engine never
    /// generates entropy of its own, so a deterministic source makes the
    /// whole session reproducible.
    pub fn with_random_source(
        script: Arc<CompiledScript>,
        source: impl FnMut() -> f64 + Send + 'static,
    ) -> Session {
        Session::with_options(script, Options::default(), source)
    }

    /// Create a session with explicit [`Options`] and random source.
    pub fn with_options(
        script: Arc<CompiledScript>,
        options: Options,
        source: impl FnMut() -> f64 + Send + 'static,
    ) -> Session {
        let state = engine::SessionState::new(&script);
        Session { script, options, state, rand: Box::new(source) }
    }

    /// Produce a reply for `text`.
    ///
    /// Total over all inputs: empty strings, pure punctuation and inputs that
    /// match no keyword all flow through the memory/fallback path and still
    /// yield a reply. Clears and may set the [`quit`](Session::quit) flag.
    pub fn transform(&mut self, text: &str) -> String {
        self.transform_verbose(text).0
    }

    /// Like [`transform`](Session::transform), returning the trace of what
    /// the engine did alongside the reply. Useful for rule debugging.
    pub fn transform_verbose(&mut self, text: &str) -> (String, TransformTrace) {
        let mut trace = TransformTrace::default();
        let reply = engine::Responder::new(
            &self.script,
            &mut self.state,
            &self.options,
            &mut *self.rand,
            &mut trace,
        )
        .transform(text);
        (reply, trace)
    }

    /// A randomly chosen greeting line.
    pub fn initial_greeting(&mut self) -> String {
        engine::pick_random(&self.script.initials, &mut *self.rand)
            .cloned()
            .unwrap_or_default()
    }

    /// A randomly chosen farewell line.
    pub fn final_greeting(&mut self) -> String {
        engine::pick_random(&self.script.finals, &mut *self.rand).cloned().unwrap_or_default()
    }

    /// True when the last [`transform`](Session::transform) hit a quit word.
    pub fn quit(&self) -> bool {
        self.state.quit
    }

    /// Number of replies currently parked in memory.
    pub fn memory_len(&self) -> usize {
        self.state.memory.len()
    }

    /// Forget everything: clears memory, the reassembly history and the quit
    /// flag. The compiled script is untouched (and is never recompiled).
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("rand", &"<function>")
            .finish()
    }
}

/// What a [`Session::transform_verbose`] call did, step by step.
#[derive(Debug, Clone, Default)]
pub struct TransformTrace {
    /// Sentence fragments after normalization and pre-substitution, in
    /// processing order.
    pub fragments: Vec<String>,
    /// Every decomposition match, including redirect hops and memory saves.
    pub matches: Vec<MatchSummary>,
    /// Where the returned reply came from.
    pub source: ReplySource,
}

/// One matched decomposition within a transform run.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    pub key: String,
    pub rank: i32,
    /// Compiled decomposition pattern text.
    pub pattern: String,
    /// The selected reassembly template (or `goto <keyword>`).
    pub reassembly: String,
    /// True when the assembled reply went to memory instead of returning.
    pub saved_to_memory: bool,
}

/// Origin of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplySource {
    /// A keyword rule matched the input.
    Keyword,
    /// No keyword matched; a deferred reply was drained from memory.
    Memory,
    /// No keyword matched and memory was empty; the `xnone` rule answered.
    #[default]
    Fallback,
    /// A quit word ended the conversation.
    Farewell,
}

/// The linear-congruential float source historically used to drive this
/// engine deterministically (seed 1234 by default, constants
/// 9301 / 49297 / 233280). Yields values in `[0, 1)`.
///
/// # Example
/// ```
/// use rogerian::Lcg;
///
/// let mut a = Lcg::new(42);
/// let mut b = Lcg::new(42);
/// assert_eq!(a.next_value(), b.next_value());
/// ```
#[derive(Debug, Clone)]
pub struct Lcg {
    seed: u64,
}

impl Lcg {
    pub fn new(seed: u32) -> Lcg {
        Lcg { seed: u64::from(seed) }
    }

    /// Advance the generator and return the next value in `[0, 1)`.
    pub fn next_value(&mut self) -> f64 {
        self.seed = (self.seed * 9301 + 49297) % 233280;
        self.seed as f64 / 233280.0
    }

    /// Consume the generator into a random source for
    /// [`Session::with_random_source`].
    pub fn into_source(mut self) -> impl FnMut() -> f64 + Send {
        move || self.next_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Decomposition, Keyword};

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

    fn compile(script: &Script) -> Arc<CompiledScript> {
        Arc::new(CompiledScript::compile(script).unwrap())
    }

    fn session_of(script: &Script) -> Session {
        // always picks index 0
        Session::with_random_source(compile(script), || 0.0)
    }

    fn doctor_session(seed: u32) -> Session {
        Session::with_random_source(compile(&Script::doctor()), Lcg::new(seed).into_source())
    }

    #[test]
    fn wildcard_captures_splice_into_the_reply() {
        let script = Script {
            keywords: vec![
                xnone(),
                keyword("remember", 5, &[("* i remember *", &["Why do you remember (2) ?"])]),
            ],
            ..Script::default()
        };
        let mut session = session_of(&script);
        assert_eq!(
            session.transform("I remember my childhood"),
            "Why do you remember my childhood ?"
        );
    }

    #[test]
    fn pre_substitution_rewrites_input_before_matching() {
        let script = Script {
            keywords: vec![
                xnone(),
                keyword("don't", 1, &[("*", &["Why the contraction ?"])]),
            ],
            pre: vec![("dont".to_string(), "don't".to_string())],
            ..Script::default()
        };
        let mut session = session_of(&script);
        assert_eq!(session.transform("i dont agree"), "Why the contraction ?");
    }

    #[test]
    fn post_substitution_flips_person_in_captures() {
        let script = Script {
            keywords: vec![xnone(), keyword("book", 1, &[("*", &["You said: (1)"])])],
            post: vec![("my".to_string(), "your".to_string())],
            ..Script::default()
        };
        let mut session = session_of(&script);
        assert_eq!(session.transform("my book is lost"), "You said: your book is lost");
    }

    #[test]
    fn higher_rank_keywords_are_tried_first() {
        let script = Script {
            keywords: vec![
                xnone(),
                keyword("low", 1, &[("*", &["From the low rule."])]),
                keyword("high", 10, &[("*", &["From the high rule."])]),
            ],
            ..Script::default()
        };
        let mut session = session_of(&script);
        assert_eq!(session.transform("low and high together"), "From the high rule.");
    }

    #[test]
    fn a_reassembly_is_never_repeated_back_to_back() {
        let script = Script {
            keywords: vec![xnone(), keyword("topic", 1, &[("*", &["Alpha.", "Beta."])])],
            ..Script::default()
        };
        // the source always proposes index 0; the engine must still alternate
        let mut session = session_of(&script);
        assert_eq!(session.transform("topic"), "Alpha.");
        assert_eq!(session.transform("topic"), "Beta.");
        assert_eq!(session.transform("topic"), "Alpha.");
        assert_eq!(session.transform("topic"), "Beta.");
    }

    #[test]
    fn quit_words_short_circuit_to_a_farewell() {
        let mut session = doctor_session(1234);
        session.transform("my dog ate my homework");
        let reply = session.transform("goodbye");
        assert!(session.quit());
        assert!(Script::doctor().finals.contains(&reply));
    }

    #[test]
    fn goto_redirects_resolve_through_the_compiled_index() {
        let mut session = doctor_session(7);
        let (reply, trace) = session.transform_verbose("hi");
        // the stock "hello" replies, after space tidying
        assert!(
            reply == "How do you do. Please state your problem."
                || reply == "Hi. What seems to be your problem ?",
            "unexpected reply: {reply}"
        );
        assert_eq!(trace.matches[0].key, "hi");
        assert_eq!(trace.matches[0].reassembly, "goto hello");
        assert_eq!(trace.matches[1].key, "hello");
    }

    #[test]
    fn dangling_goto_targets_fall_through_to_the_fallback() {
        let script = Script {
            keywords: vec![xnone(), keyword("why", 1, &[("*", &["goto what"])])],
            ..Script::default()
        };
        let mut session = session_of(&script);
        assert_eq!(session.transform("why is that"), "Please go on.");
    }

    #[test]
    fn memory_flagged_rules_defer_their_reply() {
        let script = Script {
            keywords: vec![
                xnone(),
                keyword("my", 2, &[("$ * my *", &["Earlier you said your (2)."])]),
                keyword("hello", 0, &[("*", &["Hello there."])]),
            ],
            ..Script::default()
        };
        let mut session = session_of(&script);

        // "my" outranks "hello": its reply is parked, hello's is returned
        let (reply, trace) = session.transform_verbose("hello my friend");
        assert_eq!(reply, "Hello there.");
        assert!(trace.matches[0].saved_to_memory);
        assert_eq!(session.memory_len(), 1);

        // the next unmatched input drains the parked reply
        let (reply, trace) = session.transform_verbose("qqq");
        assert_eq!(reply, "Earlier you said your friend.");
        assert_eq!(trace.source, ReplySource::Memory);
        assert_eq!(session.memory_len(), 0);
    }

    #[test]
    fn memory_never_exceeds_its_capacity() {
        let script = Script {
            keywords: vec![
                xnone(),
                keyword("my", 2, &[("$ * my *", &["Your (2)."])]),
                keyword("ok", 0, &[("*", &["Fine."])]),
            ],
            ..Script::default()
        };
        let mut session = Session::with_options(
            compile(&script),
            Options { mem_size: 3, ..Options::default() },
            || 0.0,
        );
        for i in 0..10 {
            session.transform(&format!("ok my thing {i}"));
        }
        assert_eq!(session.memory_len(), 3);
    }

    #[test]
    fn transform_is_total_over_hostile_input() {
        let mut session = doctor_session(99);
        let wall_of_words = "word ".repeat(1000);
        for input in [
            "",
            "   ",
            "?!.,;",
            "@#$%^&*()",
            wall_of_words.as_str(),
            "but but but",
        ] {
            let reply = session.transform(input);
            assert!(!reply.is_empty(), "no reply for {input:?}");
        }
    }

    #[test]
    fn equal_sources_make_equal_sessions() {
        let mut a = doctor_session(1234);
        let mut b = doctor_session(1234);

        assert_eq!(a.initial_greeting(), b.initial_greeting());
        for input in [
            "hello",
            "i remember the lake",
            "my mother cooks well",
            "do you remember me ?",
            "why can't i sleep",
            "no",
        ] {
            assert_eq!(a.transform(input), b.transform(input), "diverged on {input:?}");
        }
        assert_eq!(a.final_greeting(), b.final_greeting());
    }

    #[test]
    fn reset_restores_a_fresh_conversation() {
        let mut session = doctor_session(1234);
        // "my" parks a deferred reply before the direct decomposition answers
        session.transform("hello my friend");
        assert_eq!(session.memory_len(), 1);
        session.transform("goodbye");
        assert!(session.quit());

        session.reset();
        assert_eq!(session.memory_len(), 0);
        assert!(!session.quit());
    }

    #[test]
    fn replies_start_with_a_capital_letter_by_default() {
        let script = Script {
            keywords: vec![xnone(), keyword("topic", 1, &[("*", &["lowercase reply."])])],
            ..Script::default()
        };
        let mut session = session_of(&script);
        assert_eq!(session.transform("topic"), "Lowercase reply.");

        let mut plain = Session::with_options(
            compile(&script),
            Options { capitalize_first_letter: false, ..Options::default() },
            || 0.0,
        );
        assert_eq!(plain.transform("topic"), "lowercase reply.");
    }

    #[test]
    fn the_stock_script_answers_in_character() {
        // seed 1 draws 0.2511..: index 1 of the seven "i remember" templates
        let mut session = doctor_session(1);
        let reply = session.transform("I remember my childhood");
        // capture group 2 is post-substituted: "my" flips to "your"
        assert_eq!(reply, "Does thinking of your childhood bring anything else to mind ?");
    }

    #[test]
    fn greetings_and_farewells_come_from_the_configured_lists() {
        let mut session = doctor_session(5);
        let script = Script::doctor();
        assert!(script.initials.contains(&session.initial_greeting()));
        assert!(script.finals.contains(&session.final_greeting()));
    }

    #[test]
    fn lcg_reproduces_the_reference_sequence() {
        let mut lcg = Lcg::new(1234);
        // (1234 * 9301 + 49297) % 233280 = 96011
        assert_eq!(lcg.next_value(), 96011.0 / 233280.0);
        // (96011 * 9301 + 49297) % 233280 = ((96011 * 9301 + 49297) mod 233280)
        let second = lcg.next_value();
        assert!((0.0..1.0).contains(&second));
    }
}
