use clap::Parser;
use machine_grammar::{
    unary_word, Automaton, AutomatonLoader, DerivationChecker, Grammar, GrammarError,
    MachineCatalog, MachineKind, TapeSimulator, PRIMALITY,
};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Checks whether unary numbers are derivable in grammars compiled from a Turing machine
/// (ck0) and a linear bounded automaton (ck1).
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "COMMANDS:
  ck0 <n>   check 1^n in the unrestricted grammar of the Turing machine
  ck1 <n>   check 1^n in the context-sensitive grammar of the bounded automaton
  q         quit

EXAMPLES:
  mgram
  mgram --tm machines/primality.tm --lba machines/primality.lba
  mgram -c 'ck0 7' -c 'ck1 8' --quiet
  echo 'ck0 7' | mgram --oracle")]
struct Cli {
    /// Turing machine descriptor (.tm). Defaults to the embedded primality machine.
    #[clap(long)]
    tm: Option<PathBuf>,

    /// Linear bounded automaton descriptor (.lba). Defaults to the embedded primality
    /// automaton.
    #[clap(long)]
    lba: Option<PathBuf>,

    /// Write both grammars into this directory, one production per line.
    #[clap(long)]
    dump: Option<PathBuf>,

    /// Cross-check every verdict against a direct run of the machine.
    #[clap(long)]
    oracle: bool,

    /// Give up on derivations needing more transition steps than this.
    #[clap(long)]
    max_steps: Option<usize>,

    /// Print verdicts as JSON.
    #[clap(long)]
    json: bool,

    /// Do not print derivation traces.
    #[clap(short, long)]
    quiet: bool,

    /// Run these commands instead of reading commands from stdin.
    #[clap(short, long = "command")]
    commands: Vec<String>,

    /// Log grammar construction and derivation phases.
    #[clap(short, long)]
    verbose: bool,
}

/// A line of input to the command loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Check { kind: MachineKind, n: usize },
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();

        let kind = match words.as_slice() {
            ["q"] => return Ok(Command::Quit),
            ["ck0", _] => MachineKind::Unbounded,
            ["ck1", _] => MachineKind::Bounded,
            [] => return Err("Empty command".to_string()),
            _ => return Err(format!("Unknown command '{}'", line.trim())),
        };

        match words[1].parse::<usize>() {
            Ok(n) if n > 0 => Ok(Command::Check { kind, n }),
            _ => Err(format!("Expected a positive integer, got '{}'", words[1])),
        }
    }
}

/// Whether the command loop keeps going.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy, Default)]
struct Options {
    oracle: bool,
    max_steps: Option<usize>,
    json: bool,
    quiet: bool,
}

/// Both grammars, built once at startup.
struct Session {
    unrestricted: Grammar,
    context_sensitive: Grammar,
    options: Options,
}

impl Session {
    fn new(tm: &Automaton, lba: &Automaton, options: Options) -> Self {
        Self {
            unrestricted: Grammar::from_automaton(tm),
            context_sensitive: Grammar::from_automaton(lba),
            options,
        }
    }

    fn grammar(&self, kind: MachineKind) -> &Grammar {
        match kind {
            MachineKind::Unbounded => &self.unrestricted,
            MachineKind::Bounded => &self.context_sensitive,
        }
    }

    /// Startup summary of both machines and grammars.
    fn summary(&self) -> String {
        [&self.unrestricted, &self.context_sensitive]
            .iter()
            .map(|grammar| format!("{}\n{}", grammar.automaton().info(), grammar.summary()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn dump(&self, directory: &Path) -> Result<Vec<PathBuf>, GrammarError> {
        [
            ("unrestricted.grammar", &self.unrestricted),
            ("context-sensitive.grammar", &self.context_sensitive),
        ]
        .into_iter()
        .map(|(name, grammar)| {
            let path = directory.join(name);
            grammar.save_to_file(&path).map(|_| path)
        })
        .collect()
    }

    /// Parses and runs one input line, printing its output.
    fn handle(&self, line: &str) -> Flow {
        match line.parse::<Command>() {
            Ok(Command::Quit) => return Flow::Quit,
            Ok(Command::Check { kind, n }) => match self.check(kind, n) {
                Ok(output) => println!("{output}"),
                Err(e) => eprintln!("Error: {e}"),
            },
            Err(warning) => eprintln!("Warning: {warning}"),
        }

        Flow::Continue
    }

    /// Checks `1^n` and renders the report.
    fn check(&self, kind: MachineKind, n: usize) -> Result<String, GrammarError> {
        let grammar = self.grammar(kind);
        let mut checker = DerivationChecker::new(grammar);
        if let Some(limit) = self.options.max_steps {
            checker = checker.with_step_limit(limit);
        }

        let verdict = checker.check_number(n)?;
        debug!(kind = %grammar.kind(), n, accepted = verdict.is_accepted(), "Checked");

        let oracle = if self.options.oracle {
            let mut simulator = TapeSimulator::new(grammar.automaton());
            if let Some(limit) = self.options.max_steps {
                simulator = simulator.with_step_limit(limit);
            }
            let outcome = simulator.run(&unary_word(n))?;
            if outcome.accepted != verdict.is_accepted() || outcome.steps != verdict.steps() {
                return Err(GrammarError::InvariantViolation(format!(
                    "Direct run disagrees: {outcome}, derivation: {verdict}"
                )));
            }
            Some(outcome)
        } else {
            None
        };

        if self.options.json {
            let mut report = json!({
                "command": command_name(kind),
                "n": n,
                "verdict": verdict,
            });
            if self.options.quiet {
                if let Some(verdict) = report["verdict"].as_object_mut() {
                    verdict.remove("trace");
                }
            }
            if let Some(outcome) = oracle {
                report["oracle"] = json!(outcome);
            }
            return serde_json::to_string_pretty(&report)
                .map_err(|e| GrammarError::InvariantViolation(e.to_string()));
        }

        let mut lines = Vec::new();
        if !self.options.quiet {
            lines.extend(verdict.trace().lines());
        }
        lines.push(verdict.to_string());
        if let Some(outcome) = oracle {
            lines.push(format!("Direct run: {outcome}"));
        }

        Ok(lines.join("\n"))
    }
}

fn command_name(kind: MachineKind) -> &'static str {
    match kind {
        MachineKind::Unbounded => "ck0",
        MachineKind::Bounded => "ck1",
    }
}

fn load_automaton(path: Option<&Path>, kind: MachineKind) -> Result<Automaton, GrammarError> {
    match path {
        Some(path) => AutomatonLoader::load(path, kind),
        None => MachineCatalog::get(PRIMALITY, kind),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let automata = load_automaton(cli.tm.as_deref(), MachineKind::Unbounded).and_then(|tm| {
        load_automaton(cli.lba.as_deref(), MachineKind::Bounded).map(|lba| (tm, lba))
    });
    let (tm, lba) = match automata {
        Ok(automata) => automata,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let session = Session::new(
        &tm,
        &lba,
        Options {
            oracle: cli.oracle,
            max_steps: cli.max_steps,
            json: cli.json,
            quiet: cli.quiet,
        },
    );

    if !cli.quiet && !cli.json {
        println!("{}\n", session.summary());
    }

    if let Some(directory) = &cli.dump {
        match session.dump(directory) {
            Ok(paths) => paths
                .iter()
                .for_each(|path| eprintln!("Wrote {}", path.display())),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if !cli.commands.is_empty() {
        for command in &cli.commands {
            if session.handle(command) == Flow::Quit {
                break;
            }
        }
        return;
    }

    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            let _ = io::stdout().flush();
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error: Failed to read from stdin: {}", e);
                break;
            }
            None => break,
        };

        if session.handle(&line) == Flow::Quit {
            break;
        }
    }
}
