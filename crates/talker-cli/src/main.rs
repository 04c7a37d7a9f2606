mod grammars;

use std::{io::Read as _, str::FromStr};

use anyhow::{bail, Context};
use talker::{Grammar, LogTrace, NoTrace, ParseError, ParseOptions, RecordingTrace, Trace};

const USAGE: &str = "\
usage: talker [OPTIONS] FILE|-

options:
  --grammar NAME    grammar to parse with (numbers, json), default numbers
  --rules           print the compiled rules
  --tokens          print the token stream
  --tree            print the parse tree (default)
  --json            print the parse tree as json
  --trace           print every parse attempt to stderr
  --hide-ignored    leave ignored tokens out of the tree
  --max-depth N     rule nesting limit";

fn main() {
    if let Err(e) = init_logger() {
        eprintln!("{e:#}");
    }
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logger() -> anyhow::Result<()> {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_owned());
    let level = log::LevelFilter::from_str(&level)
        .with_context(|| format!("invalid RUST_LOG level `{level}`"))?;

    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_time_format_custom(&[])
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    )
    .context("failed to install logger")
}

struct StdoutSink;

impl std::fmt::Write for StdoutSink {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        use std::io::Write as _;
        std::io::stdout()
            .write_all(s.as_bytes())
            .map_err(|_| std::fmt::Error)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Output {
    Tree,
    Json,
}

struct Args {
    grammar: String,
    rules: bool,
    tokens: bool,
    output: Option<Output>,
    trace: bool,
    hide_ignored: bool,
    options: ParseOptions,
    input: String,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
        let mut grammar = "numbers".to_owned();
        let mut rules = false;
        let mut tokens = false;
        let mut output = None;
        let mut trace = false;
        let mut hide_ignored = false;
        let mut options = ParseOptions::default();

        let mut files = Vec::new();
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--grammar" => grammar = iter.next().context("--grammar expects a name")?,
                "--rules" => rules = true,
                "--tokens" => tokens = true,
                "--tree" => output = Some(Output::Tree),
                "--json" => output = Some(Output::Json),
                "--trace" => trace = true,
                "--hide-ignored" => hide_ignored = true,
                "--max-depth" => {
                    let value = iter.next().context("--max-depth expects a number")?;
                    options.max_depth = value
                        .parse()
                        .with_context(|| format!("invalid --max-depth `{value}`"))?;
                }
                "-h" | "--help" => bail!("{USAGE}"),
                "-" => files.push(arg),
                _ if arg.starts_with('-') => bail!("unknown option `{arg}`\n\n{USAGE}"),
                _ => files.push(arg),
            }
        }

        let input = match files.len() {
            0 => bail!("no input file provided\n\n{USAGE}"),
            1 => files.remove(0),
            _ => bail!("only one input file may be provided"),
        };

        // only --rules or --tokens suppresses the tree unless it is asked for
        if output.is_none() && !rules && !tokens {
            output = Some(Output::Tree);
        }

        Ok(Args {
            grammar,
            rules,
            tokens,
            output,
            trace,
            hide_ignored,
            options,
            input,
        })
    }
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut src = String::new();
        std::io::stdin()
            .read_to_string(&mut src)
            .context("failed to read stdin")?;
        return Ok(src);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read `{input}`"))
}

fn load_grammar(name: &str) -> anyhow::Result<Grammar> {
    match grammars::load(name) {
        Some(grammar) => Ok(grammar?),
        None => bail!(
            "unknown grammar `{name}`, expected one of: {}",
            grammars::NAMES.join(", ")
        ),
    }
}

/// Prefixes the error with `file:line:column` when the location is known.
fn locate(input: &str, err: ParseError) -> anyhow::Error {
    let position = match &err {
        ParseError::Unconsumed { position, .. } => *position,
        ParseError::Tokenize(talker::TokenizeError::Unrecognized { position, .. })
        | ParseError::Tokenize(talker::TokenizeError::Dedent { position }) => {
            Some(*position)
        }
        _ => None,
    };
    match position {
        Some(position) => anyhow::Error::new(err).context(format!("{input}:{position}")),
        None => anyhow::Error::new(err).context(input.to_owned()),
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    let grammar = load_grammar(&args.grammar)?;
    let src = read_input(&args.input)?;

    log::info!(
        "parsing `{}` ({} bytes) with grammar `{}`",
        args.input,
        src.len(),
        args.grammar
    );

    if args.rules {
        grammar.display_rules(&mut StdoutSink)?;
    }

    if args.tokens {
        let stream = grammar.tokenize(&src).map_err(|e| locate(&args.input, e.into()))?;
        for token in stream.tokens() {
            let kind = grammar.tokens().name(token.kind());
            match token.position() {
                Some(position) => println!("{kind} {:?} {position}", token.value()),
                None => println!("{kind} {:?}", token.value()),
            }
        }
    }

    let Some(output) = args.output else {
        return Ok(());
    };

    let mut recording = RecordingTrace::new();
    let mut logged = LogTrace::new();
    let mut silent = NoTrace;
    let trace: &mut dyn Trace = if args.trace {
        &mut recording
    } else if log::log_enabled!(log::Level::Trace) {
        &mut logged
    } else {
        &mut silent
    };

    let result = grammar.parse_with(&src, &args.options, trace);
    if args.trace {
        eprint!("{}", recording.text());
    }
    let tree = result.map_err(|e| locate(&args.input, e))?;

    log::debug!("parsed into {} tokens", tree.tokens().count());

    match output {
        Output::Tree => {
            let hidden = args.hide_ignored.then(|| grammar.ignored());
            print!("{}", tree.display(grammar.tokens(), hidden));
        }
        Output::Json => {
            let mut json = tree.to_json(grammar.tokens());
            if args.hide_ignored {
                strip_ignored(&mut json, &grammar);
            }
            let json = serde_json::to_string_pretty(&json)?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Removes ignored tokens from an exported tree.
fn strip_ignored(json: &mut serde_json::Value, grammar: &Grammar) {
    let Some(children) = json.get_mut("children").and_then(|c| c.as_array_mut()) else {
        return;
    };
    children.retain(|child| {
        let Some(name) = child.get("token").and_then(|t| t.as_str()) else {
            return true;
        };
        grammar
            .tokens()
            .find(name)
            .map_or(true, |kind| !grammar.is_ignored(kind))
    });
    for child in children {
        strip_ignored(child, grammar);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags() {
        let a = args(&["--grammar", "json", "--json", "--max-depth", "40", "in.json"]).unwrap();
        assert_eq!(a.grammar, "json");
        assert!(a.output == Some(Output::Json));
        assert_eq!(a.options.max_depth, 40);
        assert_eq!(a.input, "in.json");

        let a = args(&["-"]).unwrap();
        assert_eq!(a.grammar, "numbers");
        assert!(a.output == Some(Output::Tree));
        assert_eq!(a.input, "-");

        let a = args(&["--tokens", "f"]).unwrap();
        assert!(a.output.is_none());
        let a = args(&["--tokens", "--tree", "f"]).unwrap();
        assert!(a.output == Some(Output::Tree));
    }

    #[test]
    fn bad_flags() {
        assert!(args(&[]).is_err());
        assert!(args(&["a", "b"]).is_err());
        assert!(args(&["--grammar"]).is_err());
        assert!(args(&["--max-depth", "deep", "f"]).is_err());
        assert!(args(&["--verbose", "f"]).is_err());
        assert!(load_grammar("yaml").is_err());
    }

    #[test]
    fn errors_carry_the_location() {
        let grammar = load_grammar("numbers").unwrap();
        let err = grammar.parse("1,\n2,").unwrap_err();
        let err = locate("list.txt", err);
        assert_eq!(
            format!("{err:#}"),
            "list.txt:2:2: not everything was parsed: ',' left"
        );

        let err = locate("list.txt", grammar.parse("").unwrap_err());
        assert_eq!(format!("{err:#}"), "list.txt: failed to parse");
    }

    #[test]
    fn hidden_tokens_leave_the_json() {
        let grammar = load_grammar("numbers").unwrap();
        let tree = grammar.parse("1, 2").unwrap();
        let mut json = tree.to_json(grammar.tokens());
        strip_ignored(&mut json, &grammar);

        let values: Vec<_> = json["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["value"].as_str().unwrap())
            .collect();
        assert_eq!(values, ["1", ",", "2"]);
    }
}
