//! The embedded "doctor" script.
//!
//! Data tables for the stock Rogerian-therapist persona. The engine itself is
//! script-agnostic; everything persona-specific lives here.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::{Decomposition, Keyword, Script};

pub(super) static DOCTOR: Lazy<Script> = Lazy::new(build);

fn kw(key: &str, rank: i32, decompositions: &[(&str, &[&str])]) -> Keyword {
    Keyword {
        key: key.to_string(),
        rank,
        decompositions: decompositions
            .iter()
            .map(|(pattern, reassemblies)| Decomposition {
                pattern: (*pattern).to_string(),
                reassemblies: reassemblies.iter().map(|r| (*r).to_string()).collect(),
            })
            .collect(),
    }
}

fn pairs(flat: &[&str]) -> Vec<(String, String)> {
    flat.chunks(2).map(|c| (c[0].to_string(), c[1].to_string())).collect()
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn build() -> Script {
    let keywords = vec![
        kw("xnone", 0, &[(
            "*",
            &[
                "I'm not sure I understand you fully.",
                "Please go on.",
                "Can you repeat that please ?",
                "What does that suggest to you ?",
                "Do you feel strongly about discussing such things ?",
                "That is interesting.  Please continue.",
                "Tell me more about that.",
                "Do go on.",
                "Please talk more about it",
                "Does talking about this bother you ?",
                "Can you rephrase that ?",
                "I see. Tell me more.",
                "Interesting. Is this something you are sorry about ?",
                "Mmm hmmm. Is this is your favorite subject ?",
                "Now we are getting somewhere. Explain more.",
                "I see. How does that make you feel ?",
            ],
        )]),
        kw("sorry", 0, &[(
            "*",
            &[
                "Please don't apologize.",
                "Apologies are not necessary.",
                "I've told you that apologies are not required.",
                "It did not bother me.  Please continue.",
                "I have no feelings. Do continue.",
                "There is nothing to worry about",
            ],
        )]),
        kw("apologize", 0, &[("*", &["goto sorry"])]),
        kw("remember", 5, &[
            (
                "* i remember *",
                &[
                    "Do you often think of (2) ?",
                    "Does thinking of (2) bring anything else to mind ?",
                    "What else do you recollect ?",
                    "Why do you remember (2) just now ?",
                    "What in the present situation reminds you of (2) ?",
                    "What is the connection between me and (2) ?",
                    "What else does (2) remind you of ?",
                ],
            ),
            (
                "* do you remember *",
                &[
                    "Did you think I would forget (2) ?",
                    "Why do you think I should recall (2) now ?",
                    "What about (2) ?",
                    "goto what",
                    "You mentioned (2) ?",
                ],
            ),
            (
                "* you remember *",
                &[
                    "How could I forget (2) ?",
                    "What about (2) should I remember ?",
                    "goto you",
                ],
            ),
        ]),
        kw("forget", 5, &[
            (
                "* i forget *",
                &[
                    "Can you think of why you might forget (2) ?",
                    "Why can't you remember (2) ?",
                    "How often do you think of (2) ?",
                    "Does it bother you to forget that ?",
                    "Could it be a mental block ?",
                    "Are you generally forgetful ?",
                    "Do you think you are suppressing (2) ?",
                ],
            ),
            (
                "* did you forget *",
                &[
                    "Why do you ask ?",
                    "Are you sure you told me ?",
                    "Would it bother you if I forgot (2) ?",
                    "Why should I recall (2) just now ?",
                    "goto what",
                    "Tell me more about (2).",
                ],
            ),
        ]),
        kw("hello", 0, &[(
            "*",
            &[
                "How do you do.  Please state your problem.",
                "Hi.  What seems to be your problem ?",
            ],
        )]),
        kw("hi", 0, &[("*", &["goto hello"])]),
        kw("hey", 0, &[("*", &["goto hello"])]),
        kw("computer", 50, &[(
            "*",
            &[
                "Do computers worry you ?",
                "Why do you mention computers ?",
                "What do you think machines have to do with your problem ?",
                "Don't you think computers can help people ?",
                "What about machines worries you ?",
                "What do you think about machines ?",
                "You don't think I am a computer program, do you ?",
            ],
        )]),
        kw("name", 15, &[(
            "*",
            &[
                "I am not interested in names.",
                "OK, my name is ElizaBot. What do you need to know ?",
                "I've told you before, I don't care about names -- please continue.",
            ],
        )]),
        kw("yes", 0, &[(
            "*",
            &[
                "You seem quite sure.",
                "OK, but can you elaborate a bit?",
            ],
        )]),
        kw("no", 0, &[(
            "*",
            &[
                "Are you saying no just to be negative?",
                "You are being a bit negative.",
                "Why not?",
                "Why 'no'?",
            ],
        )]),
        kw("my", 2, &[
            (
                "$ * my *",
                &[
                    "Does that have anything to do with the fact that your (2) ?",
                    "Lets discuss further why your (2).",
                    "Earlier you said your (2).",
                    "But your (2).",
                ],
            ),
            (
                "* my *",
                &[
                    "Let's discuss further why your (2).",
                    "Earlier you said your (2).",
                    "But your (2).",
                    "Does that suggest anything else which belongs to you?",
                    "Is it important to you that your (2)?",
                ],
            ),
        ]),
        kw("you", 0, &[
            (
                "* you are *",
                &[
                    "What makes you think I am (2)?",
                    "Does it please you to believe I am (2)?",
                    "Do you sometimes wish you were (2)?",
                    "Perhaps you would like to be (2).",
                ],
            ),
            (
                "* you *",
                &[
                    "We were discussing you, not me.",
                    "Oh, I (2)?",
                    "You're not really talking about me, are you?",
                    "What are your feelings now?",
                ],
            ),
        ]),
        kw("why", 0, &[
            (
                "* why don't you *",
                &[
                    "Do you believe I don't (2)?",
                    "Perhaps I will (2) in good time.",
                    "Should you (2) yourself?",
                    "You want me to (2)?",
                    "goto what",
                ],
            ),
            (
                "* why can't i *",
                &[
                    "Do you think you should be able to (2)?",
                    "Do you want to be able to (2)?",
                    "Do you believe this will help you to (2)?",
                    "Have you any idea why you can't (2)?",
                    "goto what",
                ],
            ),
            ("*", &["goto what"]),
        ]),
    ];

    let mut synonyms = BTreeMap::new();
    for (canonical, words) in [
        ("be", vec!["am", "is", "are", "was"]),
        ("belief", vec!["feel", "think", "believe", "wish"]),
        ("cannot", vec!["can't"]),
        ("desire", vec!["want", "need"]),
        ("everyone", vec!["everybody", "nobody", "noone"]),
        (
            "family",
            vec![
                "mother", "mom", "father", "dad", "sister", "brother", "wife", "children",
                "child", "uncle", "aunt",
            ],
        ),
        ("happy", vec!["elated", "glad", "better"]),
        ("sad", vec!["unhappy", "depressed", "sick"]),
    ] {
        synonyms.insert(canonical.to_string(), strings(&words));
    }

    Script {
        keywords,
        synonyms,
        pre: pairs(&[
            "dont", "don't",
            "cant", "can't",
            "wont", "won't",
            "recollect", "remember",
            "recall", "remember",
            "dreamt", "dreamed",
            "dreams", "dream",
            "maybe", "perhaps",
            "certainly", "yes",
            "machine", "computer",
            "machines", "computer",
            "computers", "computer",
            "were", "was",
            "you're", "you are",
            "i'm", "i am",
            "same", "alike",
            "identical", "alike",
            "equivalent", "alike",
        ]),
        post: pairs(&[
            "am", "are",
            "your", "my",
            "me", "you",
            "myself", "yourself",
            "yourself", "myself",
            "i", "you",
            "you", "I",
            "my", "your",
            "i'm", "you are",
        ]),
        post_transforms: pairs(&[
            " old old", " old",
            r"\bthey were( not)? me\b", "it was$1 me",
            r"\bthey are( not)? me\b", "it is$1 me",
            r"Are they( always)? me\b", "it is$1 me",
            r"\bthat your( own)? (\w+)( now)? \?", "that you have your$1 $2 ?",
            r"\bI to have (\w+)", "I have $1",
            r"Earlier you said your( own)? (\w+)( now)?\.", "Earlier you talked about your $2.",
        ]),
        quits: strings(&["bye", "goodbye", "done", "exit", "quit"]),
        initials: strings(&[
            "How do you do.  Please tell me your problem.",
            "Please tell me what's been bothering you.",
            "Is something troubling you ?",
            "Im here. Talk to me.",
            "Talk to me",
            "Top of the morning to you.",
            "Thanks for waking me up",
        ]),
        finals: strings(&[
            "Goodbye.  It was nice talking to you.",
            "Goodbye.  This was really a nice talk.",
            "Goodbye.  I'm looking forward to our next session.",
            "This was a good session, wasn't it -- but time is over now.   Goodbye.",
            "Maybe we could discuss this moreover in our next session ?   Goodbye.",
        ]),
    }
}
