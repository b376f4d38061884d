//! Slash commands understood by the terminal client

pub const HELP: &str = "\
Enter a pump model (e.g. TACO 0014-SF1) or ask a question about one.
  /new            start a new conversation
  /search [term]  search conversation titles
  /history        list recent conversations
  /open <n>       reopen conversation n
  /delete <n>     delete conversation n
  /clear          delete all conversations
  /help           show this help
  /quit           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything that is not a slash command
    Input(String),
    New,
    Search(Option<String>),
    History,
    Open(usize),
    Delete(usize),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Input(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "new" => Command::New,
            "search" if arg.is_empty() => Command::Search(None),
            "search" => Command::Search(Some(arg.to_string())),
            "history" | "h" => Command::History,
            "open" => index(arg).map(Command::Open).unwrap_or_else(|| usage("/open <n>")),
            "delete" | "rm" => index(arg).map(Command::Delete).unwrap_or_else(|| usage("/delete <n>")),
            "clear" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Invalid(format!("Unknown command: /{}", other)),
        }
    }
}

fn index(arg: &str) -> Option<usize> {
    arg.parse().ok()
}

fn usage(form: &str) -> Command {
    Command::Invalid(format!("Usage: {}", form))
}
