use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::GroupId;

pub const SILENT_FLAG: &str = "--silent";
pub const EDIT_KEYWORD: &str = "EditGroupWindow";
pub const LAUNCH_ALL_KEYWORD: &str = "LaunchAll";

static KEY_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--([A-Za-z][A-Za-z0-9]*)=(.*)$").expect("static regex"));

/// What the first positional argument asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// No positional argument.
    Main,
    /// `EditGroupWindow [--id=<n>]`
    Edit { id: Option<GroupId> },
    /// `LaunchAll [--groupName=<name> | --groupId=<n>]`
    LaunchAll {
        group_name: Option<String>,
        group_id: Option<GroupId>,
    },
    /// Anything else is taken as a group name.
    Group(String),
}

/// One process invocation, split into positionals and flags.
///
/// `arg_count` counts the program name and every positional argument.
/// `--silent` and `--key=value` flags are not counted, so the watchdog's
/// relaunch form `exe <name> --silent` has an `arg_count` of 2.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    positionals: Vec<String>,
    flags: HashMap<String, String>,
    silent: bool,
}

impl Invocation {
    /// Parses a full argv, program name first.
    pub fn parse<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inv = Self::default();
        for arg in argv.into_iter().skip(1).map(Into::into) {
            if arg.eq_ignore_ascii_case(SILENT_FLAG) {
                inv.silent = true;
            } else if let Some(caps) = KEY_VALUE.captures(&arg) {
                inv.flags.insert(caps[1].to_string(), strip_quotes(&caps[2]).to_string());
            } else {
                inv.positionals.push(strip_quotes(&arg).to_string());
            }
        }
        inv
    }

    pub fn silent(&self) -> bool {
        self.silent
    }

    pub fn arg_count(&self) -> usize {
        1 + self.positionals.len()
    }

    pub fn arg1(&self) -> Option<&str> {
        self.positionals.first().map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> Option<&str> {
        self.flags.get(key).map(String::as_str)
    }

    fn id_flag(&self, key: &str) -> Option<GroupId> {
        let raw = self.flag(key)?;
        match raw.trim().parse::<GroupId>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                tracing::warn!(flag = key, value = raw, "ignoring non-numeric group id");
                None
            }
        }
    }

    pub fn command(&self) -> Command {
        match self.arg1() {
            None => Command::Main,
            Some(EDIT_KEYWORD) => Command::Edit { id: self.id_flag("id") },
            Some(LAUNCH_ALL_KEYWORD) => Command::LaunchAll {
                group_name: self.flag("groupName").filter(|n| !n.is_empty()).map(str::to_string),
                group_id: self.id_flag("groupId"),
            },
            Some(name) => Command::Group(name.to_string()),
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Invocation {
        Invocation::parse(std::iter::once("app-group.exe").chain(args.iter().copied()))
    }

    #[test]
    fn no_arguments_is_main() {
        let inv = parse(&[]);
        assert_eq!(inv.arg_count(), 1);
        assert!(!inv.silent());
        assert_eq!(inv.command(), Command::Main);
    }

    #[test]
    fn silent_and_flags_are_not_counted() {
        assert_eq!(parse(&["--silent"]).arg_count(), 1);
        assert_eq!(parse(&["Dev", "--silent"]).arg_count(), 2);
        assert_eq!(parse(&["Dev", "extra", "--silent"]).arg_count(), 3);
        assert_eq!(parse(&["EditGroupWindow", "--id=4"]).arg_count(), 2);
    }

    #[test]
    fn group_name_quotes_are_stripped() {
        let inv = parse(&["\"My Tools\""]);
        assert_eq!(inv.command(), Command::Group("My Tools".into()));
    }

    #[test]
    fn edit_with_and_without_id() {
        assert_eq!(parse(&["EditGroupWindow", "--id=12"]).command(), Command::Edit { id: Some(12) });
        assert_eq!(parse(&["EditGroupWindow"]).command(), Command::Edit { id: None });
        assert_eq!(parse(&["EditGroupWindow", "--id=x"]).command(), Command::Edit { id: None });
    }

    #[test]
    fn launch_all_by_name_or_id() {
        assert_eq!(
            parse(&["LaunchAll", "--groupName=\"Dev Box\""]).command(),
            Command::LaunchAll {
                group_name: Some("Dev Box".into()),
                group_id: None
            }
        );
        assert_eq!(
            parse(&["LaunchAll", "--groupId=3"]).command(),
            Command::LaunchAll {
                group_name: None,
                group_id: Some(3)
            }
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(parse(&["launchall"]).command(), Command::Group("launchall".into()));
    }
}
