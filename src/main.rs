mod debug_report;

use rogerian::{CompiledScript, Lcg, Script, Session};
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

const DEFAULT_SEED: u32 = 1234;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let script = match load_script(config.script_path.as_deref()) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let compiled = match CompiledScript::compile(&script) {
        Ok(compiled) => Arc::new(compiled),
        Err(err) => {
            eprintln!("error: bad script: {err}");
            std::process::exit(1);
        }
    };

    let mut session = match config.seed {
        Some(seed) => Session::with_random_source(compiled, Lcg::new(seed).into_source()),
        None => Session::new(compiled),
    };

    if let Some(input) = config.input.as_deref() {
        reply_once(&mut session, input, &config);
        return;
    }

    converse(&mut session, &config);
}

struct CliConfig {
    /// `None` means entropy (`--random`); otherwise a fixed seed.
    seed: Option<u32>,
    script_path: Option<String>,
    input: Option<String>,
    trace: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut seed = Some(DEFAULT_SEED);
    let mut script_path: Option<String> = None;
    let mut input: Option<String> = None;
    let mut trace = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("rogerian {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--trace" => trace = true,
            "--color" => color = true,
            "--no-color" => color = false,
            "--random" => seed = None,
            "--seed" => {
                let value = args.next().ok_or_else(|| "error: --seed expects a value".to_string())?;
                seed = Some(parse_seed(&value)?);
            }
            "--script" => {
                let value = args.next().ok_or_else(|| "error: --script expects a path".to_string())?;
                script_path = Some(value);
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--seed=") => {
                seed = Some(parse_seed(arg.trim_start_matches("--seed="))?);
            }
            _ if arg.starts_with("--script=") => {
                script_path = Some(arg.trim_start_matches("--script=").to_string());
            }
            _ if arg.starts_with("--input=") => {
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(arg.trim_start_matches("--input=").to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    Ok(CliConfig { seed, script_path, input, trace, color })
}

fn parse_seed(value: &str) -> Result<u32, String> {
    value.parse::<u32>().map_err(|_| format!("error: invalid --seed '{value}' (expected an integer)"))
}

fn load_script(path: Option<&str>) -> Result<Script, String> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| format!("failed to read script '{path}': {err}"))?;
            Script::from_json(&text).map_err(|err| format!("failed to parse script '{path}': {err}"))
        }
        None => Ok(Script::doctor()),
    }
}

fn reply_once(session: &mut Session, input: &str, config: &CliConfig) {
    if config.trace {
        let (reply, trace) = session.transform_verbose(input);
        debug_report::print_trace(input, &trace, config.color);
        println!("{reply}");
    } else {
        println!("{}", session.transform(input));
    }
}

/// Interactive loop: greet, answer line by line, stop on a quit word or EOF.
fn converse(session: &mut Session, config: &CliConfig) {
    let interactive = io::stdin().is_terminal();

    println!("{}", session.initial_greeting());
    let stdin = io::stdin();
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush().ok();
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF: say goodbye ourselves
                println!("{}", session.final_greeting());
                break;
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("error: failed to read stdin: {err}");
                std::process::exit(1);
            }
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        reply_once(session, line, config);
        if session.quit() {
            break;
        }
    }
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "rogerian {version}

Rule-based conversational response engine CLI.

Usage:
  rogerian [OPTIONS]                 Interactive conversation.
  rogerian [OPTIONS] [--] <input...> Reply to a single input and exit.
  rogerian [OPTIONS] --input <text>

Options:
  -i, --input <text>    Input text to answer once. If omitted, enters an
                        interactive conversation (or answers stdin lines).
  --script <path>       Load a JSON script instead of the built-in one.
  --seed <n>            Seed for the deterministic random source.
                        Default: {default_seed}
  --random              Use OS entropy instead of a fixed seed.
  --trace               Print a transform trace before each reply.
  --color               Force ANSI color output.
  --no-color            Disable ANSI color output.
  -h, --help            Show this help message.
  -V, --version         Print version information.

Exit codes:
  0  Success.
  1  Bad script data.
  2  Invalid arguments or unreadable input.
",
        version = env!("CARGO_PKG_VERSION"),
        default_seed = DEFAULT_SEED
    )
}
