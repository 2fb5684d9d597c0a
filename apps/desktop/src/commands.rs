//! Shell commands typed at the prompt.

use shared::domain::Section;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Login { email: String, password: String },
    Signup { email: String, password: String },
    ResendVerification,
    AwaitVerification,
    CancelVerification,
    Logout,
    Go { section: Section },
    Reload,
    Open { category: String },
    Back,
    Download { filename: String },
    Delete { filename: String },
    Confirm,
    Share { filename: String },
    Recipient { email: String },
    Send,
    Redact { filename: String },
    Summarize { filename: String },
    Upload { path: String },
    Dismiss,
    Show,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ShellCommand::Login { .. } => "login",
            ShellCommand::Signup { .. } => "signup",
            ShellCommand::ResendVerification => "resend",
            ShellCommand::AwaitVerification => "wait",
            ShellCommand::CancelVerification => "cancel",
            ShellCommand::Logout => "logout",
            ShellCommand::Go { .. } => "go",
            ShellCommand::Reload => "reload",
            ShellCommand::Open { .. } => "open",
            ShellCommand::Back => "back",
            ShellCommand::Download { .. } => "download",
            ShellCommand::Delete { .. } => "delete",
            ShellCommand::Confirm => "confirm",
            ShellCommand::Share { .. } => "share",
            ShellCommand::Recipient { .. } => "to",
            ShellCommand::Send => "send",
            ShellCommand::Redact { .. } => "redact",
            ShellCommand::Summarize { .. } => "summarize",
            ShellCommand::Upload { .. } => "upload",
            ShellCommand::Dismiss => "dismiss",
            ShellCommand::Show => "show",
            ShellCommand::Help => "help",
            ShellCommand::Quit => "quit",
        }
    }
}

pub const HELP: &str = "\
login <email> <password>    sign in
signup <email> <password>   create an account and wait for the verification email
resend | wait | cancel      resend the verification email, wait for it, or go back to login
logout
go <section>                home, upload, browse, redact, summarize, shared
reload                      fetch the current section again
open <category> | back      drill into a category or return to the grid
download|delete|redact|summarize <file>
confirm                     confirm a pending delete
share <file>, to <email>, send
upload <path>               pdf, png, jpg or jpeg
dismiss                     close the open dialog
show | help | quit";

/// Splits `line` into a command. Arguments after the verb keep their inner spaces.
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "login" | "signup" => {
            let (email, password) = credentials(rest)
                .ok_or_else(|| format!("usage: {verb} <email> <password>"))?;
            if verb.eq_ignore_ascii_case("login") {
                ShellCommand::Login { email, password }
            } else {
                ShellCommand::Signup { email, password }
            }
        }
        "resend" => ShellCommand::ResendVerification,
        "wait" => ShellCommand::AwaitVerification,
        "cancel" => ShellCommand::CancelVerification,
        "logout" => ShellCommand::Logout,
        "go" => {
            let section =
                Section::parse(rest).ok_or_else(|| format!("unknown section '{rest}'"))?;
            ShellCommand::Go { section }
        }
        "reload" => ShellCommand::Reload,
        "open" => ShellCommand::Open {
            category: required(rest, "open <category>")?,
        },
        "back" => ShellCommand::Back,
        "download" => ShellCommand::Download {
            filename: required(rest, "download <file>")?,
        },
        "delete" => ShellCommand::Delete {
            filename: required(rest, "delete <file>")?,
        },
        "confirm" => ShellCommand::Confirm,
        "share" => ShellCommand::Share {
            filename: required(rest, "share <file>")?,
        },
        "to" => ShellCommand::Recipient {
            email: rest.to_string(),
        },
        "send" => ShellCommand::Send,
        "redact" => ShellCommand::Redact {
            filename: required(rest, "redact <file>")?,
        },
        "summarize" => ShellCommand::Summarize {
            filename: required(rest, "summarize <file>")?,
        },
        "upload" => ShellCommand::Upload {
            path: required(rest, "upload <path>")?,
        },
        "dismiss" => ShellCommand::Dismiss,
        "show" | "" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}'; try help")),
    };
    Ok(command)
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        return Err(format!("usage: {usage}"));
    }
    Ok(rest.to_string())
}

fn credentials(rest: &str) -> Option<(String, String)> {
    let (email, password) = rest.split_once(char::is_whitespace)?;
    let password = password.trim();
    if email.is_empty() || password.is_empty() {
        return None;
    }
    Some((email.to_string(), password.to_string()))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
