use prg_core::Msg;

pub(crate) const HELP: &str = "\
commands:
  auto on|off|toggle   switch automatic gathering
  gather               gather clean files now (auto-gather off only)
  list                 show the issue list again
  open <n>             open the folder of issue row <n>
  save                 save state now
  quit                 save and exit";

/// One parsed line of operator input.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Msg(Msg),
    Help,
    Empty,
}

pub(crate) fn parse_line(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Input::Empty);
    };
    let argument = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for {command:?}"));
    }

    let msg = match (command.to_ascii_lowercase().as_str(), argument) {
        ("auto", Some("on")) => Msg::AutoGatherSet(true),
        ("auto", Some("off")) => Msg::AutoGatherSet(false),
        ("auto", Some("toggle") | None) => Msg::AutoGatherToggled,
        ("auto", Some(other)) => return Err(format!("auto expects on, off or toggle, not {other:?}")),
        ("gather", None) => Msg::GatherClicked,
        ("list" | "ls", None) => Msg::ListRequested,
        ("open", Some(row)) => match row.parse::<usize>() {
            Ok(n) if n > 0 => Msg::OpenRowRequested(n - 1),
            _ => return Err(format!("open expects a row number, not {row:?}")),
        },
        ("open", None) => return Err("open expects a row number".to_string()),
        ("save", None) => Msg::SaveRequested,
        ("quit" | "exit" | "q", None) => Msg::QuitRequested,
        ("help" | "?", None) => return Ok(Input::Help),
        _ => return Err(format!("unknown command {line:?}; type help")),
    };
    Ok(Input::Msg(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        let cases = [
            ("auto on", Msg::AutoGatherSet(true)),
            ("auto off", Msg::AutoGatherSet(false)),
            ("auto toggle", Msg::AutoGatherToggled),
            ("AUTO", Msg::AutoGatherToggled),
            ("gather", Msg::GatherClicked),
            ("list", Msg::ListRequested),
            ("open 3", Msg::OpenRowRequested(2)),
            ("save", Msg::SaveRequested),
            ("  quit  ", Msg::QuitRequested),
        ];
        for (line, msg) in cases {
            assert_eq!(parse_line(line), Ok(Input::Msg(msg)), "{line}");
        }
    }

    #[test]
    fn blank_and_help_lines() {
        assert_eq!(parse_line("   "), Ok(Input::Empty));
        assert_eq!(parse_line("help"), Ok(Input::Help));
    }

    #[test]
    fn rejects_bad_input() {
        for line in ["open", "open 0", "open x", "auto maybe", "gather now", "frobnicate"] {
            assert!(parse_line(line).is_err(), "{line}");
        }
    }
}
