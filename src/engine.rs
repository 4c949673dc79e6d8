//! Compilation and reply engine.
//!
//! This module is the *public entry point* for the response engine. It is
//! split into focused submodules under `src/engine/` while keeping public
//! paths stable (for example `crate::engine::CompiledScript`).
//!
//! ## How the parts work together
//!
//! Producing a reply is a two-phase affair:
//!
//! ```text
//! Script (raw data)  ──┐
//!                      │  CompiledScript::compile      (compile.rs)
//!                      └──────────────┬───────────────
//!                                     │  rank-sorted rules, keyword index,
//!                                     │  substitution tables (immutable)
//!                                     v
//! input ──────────────────▶ Responder::transform       (transform.rs)
//!                             - normalize + split
//!                             - pre-substitute          (subst.rs)
//!                             - keyword scan, exec_rule
//!                             - memory save/drain       (memory.rs)
//!                             - post-transform          (subst.rs)
//!                                     │
//!                                     v
//!                                reply string
//! ```
//!
//! Compilation happens exactly once per script and its output never mutates;
//! everything that changes during a conversation lives in `SessionState`
//! (session.rs). That split is what makes one compiled script safely
//! shareable across many concurrent sessions.
//!
//! ## Responsibilities by module
//!
//! - `compile.rs`: translates raw patterns (synonyms, wildcards, memory
//!   flags) into regexes, sorts rules by rank and indexes them by name;
//!   rejects malformed rule data with `ScriptError`.
//! - `transform.rs`: the reply pipeline and per-rule execution, including
//!   reassembly selection, `goto` resolution and parameter splicing.
//! - `subst.rs`: whole-word substitution tables and the cosmetic
//!   post-transform pass.
//! - `memory.rs`: the bounded deferred-reply buffer.
//! - `session.rs`: per-conversation mutable state and reset.
//!
//! ## Debugging
//!
//! Set `ROGERIAN_DEBUG_RULES=1` to print match traces.

#[path = "engine/compile.rs"]
mod compile;
#[path = "engine/memory.rs"]
mod memory;
#[path = "engine/session.rs"]
mod session;
#[path = "engine/subst.rs"]
mod subst;
#[path = "engine/transform.rs"]
mod transform;

pub use compile::{CompiledScript, ScriptError};
pub(crate) use session::SessionState;
pub(crate) use transform::{Responder, pick_random};
