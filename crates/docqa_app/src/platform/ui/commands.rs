use std::path::PathBuf;

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    Text(String),
    Ask(Option<String>),
    Upload,
    Remove(String),
    History,
    Cancel,
    Health,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP: &[&str] = &[
    "Commands:",
    "  open <path>       choose a document (.pdf .txt .xls .xlsx)",
    "  upload            upload and index the chosen document",
    "  text <question>   set the question without asking",
    "  ask [question]    ask the current (or given) question",
    "  remove <name>     drop an indexed document and clear the conversation",
    "  history           show earlier questions and answers",
    "  cancel            abort the request in flight",
    "  health            check that the backend is reachable",
    "  help              show this list",
    "  quit              exit",
];

pub fn parse_line(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.trim().is_empty() {
        return Command::Empty;
    }

    // Question text after the first separating whitespace is kept verbatim.
    let (word, argument) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));

    match word.to_ascii_lowercase().as_str() {
        "open" | "file" => {
            let path = argument.trim();
            if path.is_empty() {
                Command::Unknown(line.to_string())
            } else {
                Command::Open(PathBuf::from(path))
            }
        }
        "text" => Command::Text(argument.to_string()),
        "ask" => {
            if argument.is_empty() {
                Command::Ask(None)
            } else {
                Command::Ask(Some(argument.to_string()))
            }
        }
        "upload" => Command::Upload,
        "remove" | "rm" => {
            let name = argument.trim();
            if name.is_empty() {
                Command::Unknown(line.to_string())
            } else {
                Command::Remove(name.to_string())
            }
        }
        "history" => Command::History,
        "cancel" => Command::Cancel,
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}
