//! Per-process startup decision.
//!
//! Every launch of the executable runs [`decide`] exactly once, before any
//! window exists. The result says which mailbox slots to write and whether to
//! hand off to an already running instance, run a one-shot command, or become
//! the single UI-hosting process. The caller executes the plan.

use crate::cli::{Command, Invocation};
use crate::mailbox::Slot;
use crate::model::{ConfigDocument, GroupId};
use crate::registry::{Liveness, WindowRole};

/// Why a process ends without doing any UI work. All of these exit with 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `--silent` combined with more than one positional argument.
    InvalidSilentArgs,
    UnknownGroup(String),
    /// A silent start found its popup already running.
    AlreadyRunning,
    /// Another process hosts the UI and reads the mailbox on activation.
    Deferred,
}

/// Window to show after a full bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Show {
    /// Silent start: create everything hidden.
    Nothing,
    Main,
    Popup(GroupId),
    Edit(GroupId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Exit(ExitReason),
    /// Activate a window owned by another process, then exit.
    ActivateAndExit { role: WindowRole, reposition: bool },
    /// Launch every item of the group, then exit.
    LaunchAll { group_id: GroupId },
    /// Create the main, popup and edit windows in this process and show one.
    /// `popup_group` is the group the (possibly hidden) popup is bound to.
    Bootstrap { show: Show, popup_group: Option<GroupId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Written before the action runs.
    pub mailbox: Vec<(Slot, String)>,
    pub action: Action,
}

impl LaunchPlan {
    fn exit(reason: ExitReason) -> Self {
        Self::from(Action::Exit(reason))
    }

    /// Process exit code once the action completed without error.
    pub fn exit_code(&self) -> i32 {
        0
    }

    pub fn hosts_ui(&self) -> bool {
        matches!(self.action, Action::Bootstrap { .. })
    }
}

impl From<Action> for LaunchPlan {
    fn from(action: Action) -> Self {
        Self {
            mailbox: Vec::new(),
            action,
        }
    }
}

/// Title to probe for a live popup: the group argument when given, otherwise
/// the group the last popup was asked to show.
pub fn popup_probe_title<'a>(inv: &'a Invocation, last_open: Option<&'a str>) -> Option<&'a str> {
    match inv.command() {
        Command::Group(_) => inv.arg1(),
        _ => last_open,
    }
}

/// First matching rule wins.
pub fn decide(inv: &Invocation, live: Liveness, doc: &ConfigDocument) -> LaunchPlan {
    let silent = inv.silent();
    let argc = inv.arg_count();
    let command = inv.command();

    if silent && argc > 2 {
        return LaunchPlan::exit(ExitReason::InvalidSilentArgs);
    }

    if argc <= 1 && !silent && live.main {
        return Action::ActivateAndExit {
            role: WindowRole::Main,
            reposition: false,
        }
        .into();
    }

    if let Command::Group(name) = &command {
        if !silent && !doc.has_group(name) {
            return LaunchPlan::exit(ExitReason::UnknownGroup(name.clone()));
        }
    }

    if silent {
        if live.popup {
            return LaunchPlan::exit(ExitReason::AlreadyRunning);
        }
        let popup_group = match &command {
            Command::Group(name) => doc.find_id_by_name(name).ok(),
            _ => None,
        };
        return Action::Bootstrap {
            show: Show::Nothing,
            popup_group,
        }
        .into();
    }

    match command {
        Command::Edit { id } => {
            let id = id.unwrap_or_else(|| doc.next_id());
            let action = if live.edit {
                Action::ActivateAndExit {
                    role: WindowRole::Edit,
                    reposition: false,
                }
            } else if live.main || live.popup {
                Action::Exit(ExitReason::Deferred)
            } else {
                Action::Bootstrap {
                    show: Show::Edit(id),
                    popup_group: None,
                }
            };
            LaunchPlan {
                mailbox: vec![(Slot::LastEdit, id.to_string())],
                action,
            }
        }
        Command::LaunchAll { group_name, group_id } => {
            let resolved = match (group_name, group_id) {
                (Some(name), _) => doc.find_id_by_name(&name).map_err(|_| name),
                (None, Some(id)) if doc.contains(id) => Ok(id),
                (None, Some(id)) => Err(id.to_string()),
                (None, None) => Err(String::new()),
            };
            match resolved {
                Ok(group_id) => Action::LaunchAll { group_id }.into(),
                Err(missing) => LaunchPlan::exit(ExitReason::UnknownGroup(missing)),
            }
        }
        Command::Group(name) => {
            let id = doc.find_id_by_name(&name).ok();
            let action = if live.popup {
                Action::ActivateAndExit {
                    role: WindowRole::Popup(name.clone()),
                    reposition: true,
                }
            } else if live.main || live.edit {
                Action::Exit(ExitReason::Deferred)
            } else {
                match id {
                    Some(id) => Action::Bootstrap {
                        show: Show::Popup(id),
                        popup_group: Some(id),
                    },
                    None => Action::Exit(ExitReason::UnknownGroup(name.clone())),
                }
            };
            let mut mailbox = vec![(Slot::LastOpen, name)];
            if let Some(id) = id {
                mailbox.push((Slot::LastEdit, id.to_string()));
            }
            LaunchPlan { mailbox, action }
        }
        Command::Main => Action::Bootstrap {
            show: Show::Main,
            popup_group: None,
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupRecord;

    const NONE: Liveness = Liveness {
        main: false,
        popup: false,
        edit: false,
    };

    fn live(main: bool, popup: bool, edit: bool) -> Liveness {
        Liveness { main, popup, edit }
    }

    fn doc() -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.insert(1, GroupRecord::new("Dev"));
        doc.insert(4, GroupRecord::new("Games"));
        doc
    }

    fn inv(args: &[&str]) -> Invocation {
        Invocation::parse(std::iter::once("app-group.exe").chain(args.iter().copied()))
    }

    fn bootstrap(show: Show, popup_group: Option<GroupId>) -> Action {
        Action::Bootstrap { show, popup_group }
    }

    fn activate(role: WindowRole, reposition: bool) -> Action {
        Action::ActivateAndExit { role, reposition }
    }

    #[test]
    fn dispatch_table() {
        use ExitReason::*;

        let cases: Vec<(Vec<&str>, Liveness, Action)> = vec![
            // 1. silent with more than one positional
            (vec!["Dev", "x", "--silent"], NONE, Action::Exit(InvalidSilentArgs)),
            (vec!["Dev", "x", "--silent"], live(true, true, true), Action::Exit(InvalidSilentArgs)),
            // 2. bare launch with a live main window
            (vec![], live(true, false, false), activate(WindowRole::Main, false)),
            (vec![], live(true, true, true), activate(WindowRole::Main, false)),
            // 3. unknown group name
            (vec!["Nope"], NONE, Action::Exit(UnknownGroup("Nope".into()))),
            (vec!["dev"], live(true, false, false), Action::Exit(UnknownGroup("dev".into()))),
            // 4. silent starts
            (vec!["--silent"], NONE, bootstrap(Show::Nothing, None)),
            (vec!["--silent"], live(true, false, false), bootstrap(Show::Nothing, None)),
            (vec!["--silent"], live(false, true, false), Action::Exit(AlreadyRunning)),
            (vec!["Dev", "--silent"], NONE, bootstrap(Show::Nothing, Some(1))),
            (vec!["Dev", "--silent"], live(true, true, false), Action::Exit(AlreadyRunning)),
            (vec!["Nope", "--silent"], NONE, bootstrap(Show::Nothing, None)),
            // 5. editor
            (vec!["EditGroupWindow", "--id=4"], NONE, bootstrap(Show::Edit(4), None)),
            (vec!["EditGroupWindow"], NONE, bootstrap(Show::Edit(5), None)),
            (vec!["EditGroupWindow", "--id=4"], live(true, true, true), activate(WindowRole::Edit, false)),
            (vec!["EditGroupWindow"], live(true, false, false), Action::Exit(Deferred)),
            (vec!["EditGroupWindow"], live(false, true, false), Action::Exit(Deferred)),
            // 6. launch all
            (vec!["LaunchAll", "--groupName=\"Games\""], NONE, Action::LaunchAll { group_id: 4 }),
            (vec!["LaunchAll", "--groupId=1"], live(true, true, true), Action::LaunchAll { group_id: 1 }),
            (vec!["LaunchAll", "--groupId=9"], NONE, Action::Exit(UnknownGroup("9".into()))),
            (vec!["LaunchAll", "--groupName=Nope"], NONE, Action::Exit(UnknownGroup("Nope".into()))),
            (vec!["LaunchAll"], NONE, Action::Exit(UnknownGroup(String::new()))),
            // 7. group popup
            (vec!["Dev"], live(false, true, false), activate(WindowRole::Popup("Dev".into()), true)),
            (vec!["Dev"], live(true, true, true), activate(WindowRole::Popup("Dev".into()), true)),
            (vec!["Dev"], live(true, false, false), Action::Exit(Deferred)),
            (vec!["Dev"], live(false, false, true), Action::Exit(Deferred)),
            (vec!["Dev"], NONE, bootstrap(Show::Popup(1), Some(1))),
            // 8. nothing alive
            (vec![], NONE, bootstrap(Show::Main, None)),
            (vec![], live(false, true, true), bootstrap(Show::Main, None)),
        ];

        let doc = doc();
        for (args, liveness, expected) in cases {
            let plan = decide(&inv(&args), liveness, &doc);
            assert_eq!(plan.action, expected, "args {args:?} with {liveness:?}");
            assert_eq!(plan.exit_code(), 0);
        }
    }

    #[test]
    fn editor_posts_resolved_id() {
        let plan = decide(&inv(&["EditGroupWindow"]), NONE, &doc());
        assert_eq!(plan.mailbox, vec![(Slot::LastEdit, "5".to_string())]);

        let plan = decide(&inv(&["EditGroupWindow", "--id=1"]), live(false, false, true), &doc());
        assert_eq!(plan.mailbox, vec![(Slot::LastEdit, "1".to_string())]);
    }

    #[test]
    fn group_launch_posts_name_even_when_deferring() {
        let plan = decide(&inv(&["Games"]), live(true, false, false), &doc());
        assert_eq!(
            plan.mailbox,
            vec![(Slot::LastOpen, "Games".to_string()), (Slot::LastEdit, "4".to_string())]
        );
        assert!(!plan.hosts_ui());

        let plan = decide(&inv(&["Dev"]), NONE, &doc());
        assert_eq!(
            plan.mailbox,
            vec![(Slot::LastOpen, "Dev".to_string()), (Slot::LastEdit, "1".to_string())]
        );
    }

    #[test]
    fn rejected_launches_post_nothing() {
        for args in [&["Nope"][..], &["Dev", "x", "--silent"], &["--silent"]] {
            assert!(decide(&inv(args), NONE, &doc()).mailbox.is_empty(), "{args:?}");
        }
    }

    #[test]
    fn probe_title_prefers_group_argument() {
        assert_eq!(popup_probe_title(&inv(&["Dev"]), Some("Games")), Some("Dev"));
        assert_eq!(popup_probe_title(&inv(&["--silent"]), Some("Games")), Some("Games"));
        assert_eq!(popup_probe_title(&inv(&["EditGroupWindow"]), None), None);
    }
}
