// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL for the YASL compiler.
//!
//! Every entry is compiled against the same [`Compiler`], so globals and
//! functions declared earlier stay visible. A failed entry leaves the
//! session untouched.

use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;
use yasl_compiler::compiler::bytecode::BUILTINS;
use yasl_compiler::{Compiler, compile_with, disassemble};

const HISTORY_FILE: &str = ".yasl_history";
const MAX_HISTORY_SIZE: usize = 1000;

const KEYWORDS: &[&str] = &[
    "let", "print", "if", "elseif", "else", "while", "func", "return", "and", "or",
];

const LITERALS: &[&str] = &["true", "false", "undef"];

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Load,
    Disasm,
    Reset,
}

impl ReplCommand {
    /// Parses a command line such as `.load file.yasl`.
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;
        let (cmd, arg) = match rest.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };

        let cmd = match cmd.to_lowercase().as_str() {
            "help" | "h" | "?" => ReplCommand::Help,
            "exit" | "quit" | "q" => ReplCommand::Exit,
            "clear" | "cls" => ReplCommand::Clear,
            "version" | "v" => ReplCommand::Version,
            "load" | "l" => ReplCommand::Load,
            "disasm" | "d" => ReplCommand::Disasm,
            "reset" => ReplCommand::Reset,
            _ => return None,
        };
        Some((cmd, arg))
    }

    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".load <file>", "Compile a source file into the session"),
            (".disasm", "Disassemble the last compiled module"),
            (".reset", "Forget all globals and functions"),
        ]
    }
}

/// Completion, hints, highlighting and multi-line validation
struct YaslHelper {
    words: Vec<String>,
}

impl YaslHelper {
    fn new() -> Self {
        let words = KEYWORDS
            .iter()
            .chain(LITERALS)
            .copied()
            .chain(BUILTINS.iter().map(|(name, _)| *name))
            .map(String::from)
            .chain(
                ReplCommand::all_commands()
                    .iter()
                    .map(|(cmd, _)| cmd.split(' ').next().unwrap_or(cmd).to_string()),
            )
            .collect();
        Self { words }
    }

    fn current_word<'l>(line: &'l str, pos: usize) -> (usize, &'l str) {
        let start = line[..pos]
            .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '.')
            .map(|i| i + 1)
            .unwrap_or(0);
        (start, &line[start..pos])
    }
}

impl Completer for YaslHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (_, word) = Self::current_word(line, pos);
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches = self
            .words
            .iter()
            .filter(|w| w.starts_with(word))
            .map(|w| Pair {
                display: w.clone(),
                replacement: w[word.len()..].to_string(),
            })
            .collect();
        Ok((pos, matches))
    }
}

impl Hinter for YaslHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }
        let (_, word) = Self::current_word(line, pos);
        if word.len() < 2 {
            return None;
        }
        self.words
            .iter()
            .find(|w| w.starts_with(word) && w.len() > word.len())
            .map(|w| w[word.len()..].to_string().dimmed().to_string())
    }
}

impl Highlighter for YaslHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.trim_start().starts_with('.') {
            return Cow::Owned(line.magenta().to_string());
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut word = String::new();
        let mut in_string = false;

        for c in line.chars() {
            if in_string {
                result.push_str(&c.green().to_string());
                if c == '"' {
                    in_string = false;
                }
                continue;
            }
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                continue;
            }
            if !word.is_empty() {
                result.push_str(&highlight_word(&word));
                word.clear();
            }
            let colored = match c {
                '"' => {
                    in_string = true;
                    c.green().to_string()
                }
                '(' | ')' | '[' | ']' | '{' | '}' => c.yellow().to_string(),
                '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '|' | '?' | '#' => {
                    c.cyan().to_string()
                }
                _ => c.to_string(),
            };
            result.push_str(&colored);
        }
        if !word.is_empty() {
            result.push_str(&highlight_word(&word));
        }

        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn highlight_word(word: &str) -> String {
    if KEYWORDS.contains(&word) {
        word.magenta().bold().to_string()
    } else if LITERALS.contains(&word) {
        word.blue().to_string()
    } else if BUILTINS.iter().any(|(name, _)| *name == word) {
        word.cyan().to_string()
    } else if word.starts_with(|c: char| c.is_ascii_digit()) {
        word.yellow().to_string()
    } else {
        word.to_string()
    }
}

impl Validator for YaslHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }

        // A trailing operator means the expression continues
        let trimmed = input.trim_end();
        let continues = ["\\", "+", "-", "*", "/", "=", ",", "(", "[", "{", "->", "?", ":"]
            .iter()
            .any(|tail| trimmed.ends_with(tail));
        if continues {
            return Ok(ValidationResult::Incomplete);
        }

        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for YaslHelper {}

/// Checks that brackets are closed, ignoring strings and comments.
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut in_block_comment = false;

    while let Some(c) = chars.next() {
        if in_block_comment {
            if c == '*' && chars.peek() == Some(&'$') {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }
        if in_string {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '$' if chars.peek() == Some(&'$') => {
                // Line comment runs to the newline
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '$' if chars.peek() == Some(&'*') => {
                chars.next();
                in_block_comment = true;
            }
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                if stack.pop() != Some(c) {
                    // Mismatched: let the parser report it
                    return true;
                }
            }
            _ => {}
        }
    }

    stack.is_empty() && !in_string && !in_block_comment
}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

/// The interactive REPL
pub struct Repl {
    compiler: Compiler,
    editor: Editor<YaslHelper, DefaultHistory>,
    history_path: PathBuf,
    last_module: Option<Vec<u8>>,
}

impl Repl {
    pub fn new() -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(YaslHelper::new()));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yasl")
            .join(HISTORY_FILE);
        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(&history_path);

        Ok(Self {
            compiler: Compiler::new(),
            editor,
            history_path,
            last_module: None,
        })
    }

    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "yasl>".bright_green().bold());
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    self.compile_and_report(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);
        println!();
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "YASL".bright_cyan().bold(),
            "v".dimmed(),
            env!("CARGO_PKG_VERSION").bright_yellow()
        );
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Version => {
                println!("{} {}", "yasl".bright_cyan().bold(), env!("CARGO_PKG_VERSION").yellow());
            }
            ReplCommand::Load => match arg {
                Some(path) => self.load_file(Path::new(path)),
                None => eprintln!(
                    "{}: {} {}",
                    "Error".red().bold(),
                    ".load".cyan(),
                    "requires a file path".dimmed()
                ),
            },
            ReplCommand::Disasm => match &self.last_module {
                Some(module) => match disassemble(module) {
                    Ok(listing) => print!("{}", listing),
                    Err(e) => print_error(&e.to_string()),
                },
                None => println!("{}", "nothing compiled yet".dimmed()),
            },
            ReplCommand::Reset => {
                self.compiler = Compiler::new();
                self.last_module = None;
                println!("{}", "session reset".dimmed());
            }
        }
        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();
        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:16} {}", cmd.cyan(), desc.dimmed());
        }
        println!();
    }

    fn load_file(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(source) => self.compile_and_report(&source),
            Err(e) => print_error(&format!("failed to read '{}': {}", path.display(), e)),
        }
    }

    fn compile_and_report(&mut self, source: &str) {
        match compile_with(&mut self.compiler, source) {
            Ok(module) => {
                debug!(bytes = module.len(), "compiled entry");
                println!(
                    "{} {}",
                    "ok".green(),
                    format!(
                        "({} bytes, {} globals)",
                        module.len(),
                        self.compiler.globals().size()
                    )
                    .dimmed()
                );
                self.last_module = Some(module);
            }
            Err(e) => print_error(&e.to_string()),
        }
    }
}

fn print_error(message: &str) {
    match message.split_once(':') {
        Some((kind, rest)) => eprintln!("{}:{}", kind.red().bold(), rest),
        None => eprintln!("{}", message.red()),
    }
}
