//! Console input parsing.
//!
//! Plain text is a prompt. Lines starting with `/` are commands.

use std::path::PathBuf;

use crate::imaging::{Quality, Size, Style};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    SetKey(String),
    Quality(Quality),
    Style(Style),
    Size(Size),
    Count(String),
    Reset,
    ShowConfig,
    Clear,
    /// Export image `index` (1-based) of the latest batch to `path`.
    Save { index: usize, path: PathBuf },
    History,
    Help,
    Quit,
}

pub const HELP: &str = "\
Type a prompt to generate images. Commands:
  /key <api-key>              set the OpenAI API key
  /quality <standard|hd>      image quality
  /style <vivid|natural>      image style
  /size <1024x1024|1792x1024|1024x1792>
  /count <n>                  images per prompt
  /reset                      restore default image settings
  /config                     show current settings
  /clear                      delete all messages and images
  /save <n> <path>            save image n of the latest batch
  /history                    show the whole conversation
  /help                       this text
  /quit                       exit
Ctrl-C cancels a running generation (or exits when idle).";

/// Parses one input line. Blank lines are `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Prompt(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "key" => Command::SetKey(required(arg, "/key <api-key>")?.to_string()),
        "quality" => Command::Quality(required(arg, "/quality <standard|hd>")?.parse()?),
        "style" => Command::Style(required(arg, "/style <vivid|natural>")?.parse()?),
        "size" => Command::Size(required(arg, "/size <WxH>")?.parse()?),
        "count" => {
            let count = required(arg, "/count <n>")?;
            match count.parse::<u32>() {
                Ok(n) if n > 0 => Command::Count(count.to_string()),
                _ => return Err(format!("count must be a positive number, got '{count}'")),
            }
        }
        "reset" => Command::Reset,
        "config" => Command::ShowConfig,
        "clear" => Command::Clear,
        "save" => {
            let usage = "/save <n> <path>";
            let (index, path) = required(arg, usage)?
                .split_once(char::is_whitespace)
                .ok_or_else(|| format!("usage: {usage}"))?;
            let index = match index.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(format!("image number must be 1 or more, got '{index}'")),
            };
            Command::Save {
                index,
                path: PathBuf::from(path.trim()),
            }
        }
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '/{other}' (try /help)")),
    };
    Ok(Some(command))
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(arg)
    }
}
