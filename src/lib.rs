extern crate self as rogerian;

#[macro_use]
mod macros;
mod api;
mod engine;
mod script;

pub use api::{Lcg, MatchSummary, Options, ReplySource, Session, TransformTrace};
pub use engine::{CompiledScript, ScriptError};
pub use script::{Decomposition, Keyword, Script};

// --- Internal types ---------------------------------------------------------

/// A reply template owned by a decomposition: either literal text (possibly
/// containing positional `(N)` placeholders) or a redirect to another
/// keyword's rule. The distinction is made once, at compile time, from the
/// `"goto "` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reassembly {
    Literal(String),
    Goto(String),
}

impl Reassembly {
    /// Template text as it appears in the script, for traces and debug output.
    pub fn source(&self) -> String {
        match self {
            Reassembly::Literal(template) => template.clone(),
            Reassembly::Goto(target) => format!("goto {target}"),
        }
    }
}
