//! Command line parsing.

use std::path::PathBuf;

pub const USAGE: &str = "\
usage: tfmesh [--config <path>] <command>

commands:
  replay <file>                              replay a rosbridge JSON-lines capture
  frames <file>                              list frames known after replay
  lookup [--json] <file> <source> <target> [time_ms]
                                             resolve a transform after replay
                                             (latest common time if omitted)
  config                                     print the effective configuration
  help                                       show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Replay {
        file: PathBuf,
    },
    Frames {
        file: PathBuf,
    },
    Lookup {
        file: PathBuf,
        source: String,
        target: String,
        time_ms: Option<u64>,
        json: bool,
    },
    Config,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub command: Command,
}

/// Parse the arguments following the program name.
pub fn parse<I>(args: I) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut json = false;
    let mut positional = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--json" => json = true,
            "-h" | "--help" => positional.insert(0, "help".to_string()),
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            _ => positional.push(arg),
        }
    }

    let mut rest = positional.into_iter();
    let name = rest.next().unwrap_or_else(|| "help".to_string());
    let mut next = |what: &str| rest.next().ok_or(format!("{name}: missing {what}"));

    let command = match name.as_str() {
        "replay" => Command::Replay {
            file: next("<file>")?.into(),
        },
        "frames" => Command::Frames {
            file: next("<file>")?.into(),
        },
        "lookup" => {
            let file = next("<file>")?.into();
            let source = next("<source>")?;
            let target = next("<target>")?;
            let time_ms = match rest.next() {
                Some(t) => Some(
                    t.parse::<u64>()
                        .map_err(|_| format!("lookup: invalid time_ms '{t}'"))?,
                ),
                None => None,
            };
            Command::Lookup {
                file,
                source,
                target,
                time_ms,
                json,
            }
        }
        "config" => Command::Config,
        "help" => Command::Help,
        other => return Err(format!("unknown command '{other}'")),
    };

    if let Some(extra) = rest.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }

    Ok(Args { config, command })
}
