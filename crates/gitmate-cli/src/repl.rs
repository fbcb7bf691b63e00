//! Interactive chat loop.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context as _, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use gitmate_application::{SendOutcome, WorkspaceController};
use gitmate_core::chat::{ChatModel, ImageAttachment, QuickAction, Speaker, Turn};
use gitmate_core::error::GitMateError;

const COMMANDS: &[&str] = &[
    "/ls",
    "/add",
    "/put",
    "/edit",
    "/rm",
    "/files",
    "/show",
    "/clear",
    "/clear-context",
    "/model",
    "/token",
    "/image",
    "/apply",
    "/quick",
    "/analyze",
    "/export",
    "/help",
    "/exit",
    "/quit",
];

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(String),
    Add(String),
    Put { path: String, local: String },
    Edit { path: String, local: String },
    Remove(String),
    Files,
    Show(String),
    ClearChat,
    ClearContext,
    Model(Option<ChatModel>),
    Token(Option<String>),
    Image { file: String, text: String },
    Apply { index: usize, path: String },
    Quick(QuickAction),
    Analyze(String),
    Export(Option<String>),
    Help,
    Exit,
    Quit,
    Send(String),
}

fn required(arg: Option<&str>, usage: &str) -> Result<String> {
    arg.map(str::to_string)
        .ok_or_else(|| anyhow!("usage: {usage}"))
}

/// Parses one input line. Anything not starting with `/` is a chat message.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Ok(Command::Send(line.to_string()));
    }

    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace();

    let command = match name {
        "/ls" => Command::List(args.next().unwrap_or("").to_string()),
        "/add" => Command::Add(required(args.next(), "/add <path>")?),
        "/put" => Command::Put {
            path: required(args.next(), "/put <path> <local-file>")?,
            local: required(args.next(), "/put <path> <local-file>")?,
        },
        "/edit" => Command::Edit {
            path: required(args.next(), "/edit <path> <local-file>")?,
            local: required(args.next(), "/edit <path> <local-file>")?,
        },
        "/rm" => Command::Remove(required(args.next(), "/rm <path>")?),
        "/files" => Command::Files,
        "/show" => Command::Show(required(args.next(), "/show <path>")?),
        "/clear" => Command::ClearChat,
        "/clear-context" => Command::ClearContext,
        "/model" => Command::Model(args.next().map(ChatModel::from_str).transpose()?),
        "/token" => match args.next() {
            Some("clear") => Command::Token(None),
            Some(token) => Command::Token(Some(token.to_string())),
            None => bail!("usage: /token <token>|clear"),
        },
        "/image" => {
            let (file, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if file.is_empty() {
                bail!("usage: /image <file> [text]");
            }
            Command::Image {
                file: file.to_string(),
                text: text.trim().to_string(),
            }
        }
        "/apply" => {
            let index = required(args.next(), "/apply <n> <path>")?;
            let index: usize = index
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("block number must be 1 or more, got '{index}'"))?;
            Command::Apply {
                index,
                path: required(args.next(), "/apply <n> <path>")?,
            }
        }
        "/quick" => Command::Quick(QuickAction::from_str(&required(
            args.next(),
            "/quick explain|bugs|refactor|tests",
        )?)?),
        "/analyze" => Command::Analyze(required(args.next(), "/analyze <path>")?),
        "/export" => Command::Export(args.next().map(str::to_string)),
        "/help" => Command::Help,
        "/exit" => Command::Exit,
        "/quit" => Command::Quit,
        other => bail!("unknown command '{other}' (try /help)"),
    };
    Ok(command)
}

/// Reads a local image and encodes it for an inline attachment.
pub fn load_image(path: &Path) -> Result<ImageAttachment> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        bail!("{} is not an image ({mime})", path.display());
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(ImageAttachment::new(STANDARD.encode(bytes), mime.essence_str()))
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn print_help() {
    let lines = [
        ("/ls [path]", "browse the repository"),
        ("/add <path>", "add a repository file to the context"),
        ("/put <path> <local-file>", "add a local file under <path>"),
        ("/edit <path> <local-file>", "replace a context file's body"),
        ("/rm <path>", "remove a file from the context"),
        ("/files", "list context files"),
        ("/show <path>", "print a context file"),
        ("/clear", "clear the chat"),
        ("/clear-context", "remove all context files"),
        ("/model [flash|pro]", "switch model (toggles without argument)"),
        ("/token <t>|clear", "set or clear the GitHub token"),
        ("/image <file> [text]", "send an image"),
        ("/apply <n> <path>", "apply code block n of the last reply"),
        ("/quick <action>", "explain | bugs | refactor | tests"),
        ("/analyze <path>", "analyze a context file"),
        ("/export [file]", "print or write the sync script"),
        ("/exit", "close the workspace and forget it"),
        ("/quit", "leave, keeping the workspace for next time"),
    ];
    for (usage, about) in lines {
        println!("  {:<28}{}", usage.bright_cyan(), about.bright_black());
    }
}

fn print_turn(turn: &Turn) {
    match turn.speaker {
        Speaker::User => {
            println!("{}", format!("> {}", turn.body()).green());
            if turn.attachment().is_some() {
                println!("{}", "  [image attached]".bright_black());
            }
        }
        Speaker::Assistant if turn.is_status() => println!("{}", turn.body().bright_yellow()),
        Speaker::Assistant => {
            for line in turn.body().lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

fn print_reader_error(error: &GitMateError, retry: &str) {
    eprintln!("{}", error.to_string().red());
    if error.is_rate_limited() {
        eprintln!("{}", "Set a token with /token <t>, then retry.".yellow());
    } else {
        eprintln!("{}", format!("Retry with {retry}").bright_black());
    }
}

async fn send(
    controller: &WorkspaceController,
    text: &str,
    image: Option<ImageAttachment>,
) -> Result<()> {
    let outcome = controller
        .send_message(text, image, |fragment| {
            print!("{}", fragment.bright_blue());
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    if let SendOutcome::Failed { error } = outcome {
        println!("{}", gitmate_core::chat::APOLOGY_NOTICE.bright_yellow());
        eprintln!("{}", error.to_string().bright_black());
    }
    Ok(())
}

async fn file_id(controller: &WorkspaceController, path: &str) -> Result<String> {
    let path = path.trim_matches('/');
    controller
        .workspace()
        .await
        .find_file_by_path(path)
        .map(|f| f.id.clone())
        .ok_or_else(|| anyhow!("{path} is not in the context"))
}

/// Executes one command. Returns `false` when the loop should stop.
async fn dispatch(controller: &WorkspaceController, command: Command) -> Result<bool> {
    match command {
        Command::Send(text) => {
            if !text.is_empty() {
                send(controller, &text, None).await?;
            }
        }
        Command::List(path) => match controller.list_directory(&path).await {
            Ok(nodes) if nodes.is_empty() => println!("{}", "(empty)".bright_black()),
            Ok(nodes) => {
                for node in nodes {
                    if node.is_dir() {
                        println!("  {}", format!("{}/", node.path).bright_blue().bold());
                    } else {
                        println!("  {}", node.path);
                    }
                }
            }
            Err(e) => print_reader_error(&e, &format!("/ls {path}")),
        },
        Command::Add(path) => match controller.add_repository_file(&path).await {
            Ok(_) => println!("{}", format!("Added {path} to context.").green()),
            Err(e) if e.is_repository_error() => print_reader_error(&e, &format!("/add {path}")),
            Err(e) => return Err(e.into()),
        },
        Command::Put { path, local } => {
            let body = std::fs::read_to_string(&local)
                .with_context(|| format!("failed to read {local}"))?;
            controller.add_file(&path, &body).await?;
            println!("{}", format!("Added {path} to context.").green());
        }
        Command::Edit { path, local } => {
            let body = std::fs::read_to_string(&local)
                .with_context(|| format!("failed to read {local}"))?;
            let id = file_id(controller, &path).await?;
            controller.edit_file(&id, &body).await?;
            println!("{}", format!("Updated {path}.").green());
        }
        Command::Remove(path) => {
            let id = file_id(controller, &path).await?;
            controller.remove_file(&id).await?;
            println!("{}", format!("Removed {path} from context.").green());
        }
        Command::Files => {
            let workspace = controller.workspace().await;
            if workspace.selected_files.is_empty() {
                println!("{}", "No files in context.".bright_black());
            }
            for file in &workspace.selected_files {
                println!(
                    "  {} {}",
                    file.path,
                    format!("({} bytes)", file.body.len()).bright_black()
                );
            }
        }
        Command::Show(path) => {
            let workspace = controller.workspace().await;
            let file = workspace
                .find_file_by_path(path.trim_matches('/'))
                .ok_or_else(|| anyhow!("{path} is not in the context"))?;
            println!("{}", format!("--- {} ---", file.path).bright_black());
            println!("{}", file.body);
        }
        Command::ClearChat => {
            controller.clear_chat().await?;
            if let Some(turn) = controller.workspace().await.chat_turns.last() {
                print_turn(turn);
            }
        }
        Command::ClearContext => {
            controller.clear_context().await?;
            println!("{}", "Context cleared.".green());
        }
        Command::Model(model) => {
            match model {
                Some(model) => controller.switch_model(model).await?,
                None => {
                    controller.toggle_model().await?;
                }
            }
            let workspace = controller.workspace().await;
            println!(
                "{}",
                format!("Model: {}", workspace.selected_model.label()).bright_yellow()
            );
        }
        Command::Token(token) => {
            let set = token.is_some();
            controller.set_access_token(token).await?;
            let message = if set { "Token saved." } else { "Token cleared." };
            println!("{}", message.green());
        }
        Command::Image { file, text } => {
            let image = load_image(Path::new(&file))?;
            send(controller, &text, Some(image)).await?;
        }
        Command::Apply { index, path } => {
            let blocks = controller.reply_code_blocks().await;
            let block = blocks
                .get(index - 1)
                .ok_or_else(|| anyhow!("the last reply has {} code block(s)", blocks.len()))?;
            controller.apply_code(&path, &block.code).await?;
            if let Some(turn) = controller.workspace().await.chat_turns.last() {
                print_turn(turn);
            }
        }
        Command::Quick(action) => {
            println!("{}", format!("> {}", action.label()).green());
            let outcome = controller
                .quick_action(action, |fragment| {
                    print!("{}", fragment.bright_blue());
                    let _ = std::io::stdout().flush();
                })
                .await?;
            println!();
            if let SendOutcome::Failed { error } = outcome {
                eprintln!("{}", error.to_string().red());
            }
        }
        Command::Analyze(path) => {
            let outcome = controller
                .analyze_file(path.trim_matches('/'), |fragment| {
                    print!("{}", fragment.bright_blue());
                    let _ = std::io::stdout().flush();
                })
                .await?;
            println!();
            if let SendOutcome::Failed { error } = outcome {
                eprintln!("{}", error.to_string().red());
            }
        }
        Command::Export(target) => {
            let script = controller.export_script().await?;
            match target {
                Some(target) => {
                    std::fs::write(&target, script)
                        .with_context(|| format!("failed to write {target}"))?;
                    println!("{}", format!("Wrote {target}").green());
                }
                None => println!("{script}"),
            }
        }
        Command::Help => print_help(),
        Command::Exit => {
            controller.exit().await?;
            println!("{}", "Workspace closed. Goodbye!".bright_green());
            return Ok(false);
        }
        Command::Quit => {
            println!("{}", "Goodbye!".bright_green());
            return Ok(false);
        }
    }
    Ok(true)
}

/// Runs the REPL until `/exit`, `/quit` or end of input.
pub async fn run(controller: &WorkspaceController) -> Result<()> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    let workspace = controller.workspace().await;
    println!(
        "{}",
        format!("=== GitMate: {} ===", workspace.display_name)
            .bright_magenta()
            .bold()
    );
    println!(
        "{}",
        format!(
            "{} | {} file(s) in context | /help for commands",
            workspace.selected_model.label(),
            workspace.selected_files.len()
        )
        .bright_black()
    );
    println!();
    for turn in &workspace.chat_turns {
        print_turn(turn);
    }

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                let keep_going = match parse_command(&line) {
                    Ok(command) => match dispatch(controller, command).await {
                        Ok(keep_going) => keep_going,
                        Err(e) => {
                            eprintln!("{}", format!("Error: {e:#}").red());
                            true
                        }
                    },
                    Err(e) => {
                        eprintln!("{}", e.to_string().yellow());
                        true
                    }
                };
                if !keep_going {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to leave.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}
