//! Input line parsing for the interactive prompt.

/// What one line of user input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to submit.
    Say(String),
    /// Blank line; ignored.
    Nothing,
    /// Back to the welcome screen.
    Reset,
    /// List quick actions.
    ListQuickActions,
    /// Submit quick action N (1-based as typed).
    Quick(usize),
    /// Switch to remote resolution.
    Endpoint(String),
    /// Switch back to local resolution.
    Local,
    Help,
    Quit,
    /// A `/command` that is not recognised or is missing its argument.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Nothing;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match (name.as_str(), arg) {
            ("reset" | "home", _) => Command::Reset,
            ("quick", None) => Command::ListQuickActions,
            ("quick", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Command::Quick(n),
                _ => Command::Invalid(format!("not a quick action number: {}", n)),
            },
            ("endpoint", Some(url)) => Command::Endpoint(url.to_string()),
            ("endpoint", None) => Command::Invalid("usage: /endpoint URL".to_string()),
            ("local", _) => Command::Local,
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Invalid(format!("unknown command: /{}", name)),
        }
    }
}

pub const HELP: &str = "\
/reset, /home     back to the welcome screen
/quick            list quick actions
/quick N          send quick action N
/endpoint URL     answer through a remote chat endpoint
/local            answer from the local catalog only
/quit             leave";
