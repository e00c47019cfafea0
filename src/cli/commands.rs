//! Command dispatch

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::MemberDraft;
use crate::cli::args::{Cli, Commands, ConfigCommands, MemberArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::MemberId;
use crate::infrastructure::ServiceContainer;
use crate::render::{self, LabelOptions, TreeNodeConvert};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `famtree --help`".into(),
        ));
    };

    let container = || -> CliResult<ServiceContainer> {
        let container = ServiceContainer::new(Settings::load()?, cli.file.clone());
        debug!("roster: {}", container.family.roster_path().display());
        Ok(container)
    };

    match command {
        Commands::Tree { focus, json } => _tree(&container()?, focus.as_deref(), *json),
        Commands::Roots => _roots(&container()?),
        Commands::List => _list(&container()?),
        Commands::Check => _check(&container()?),
        Commands::Add(fields) => _add(&container()?, fields),
        Commands::Edit {
            id,
            fields,
            no_parent,
            no_spouse,
        } => _edit(&container()?, id, fields, *no_parent, *no_spouse),
        Commands::Remove { id } => _remove(&container()?, id),
        Commands::Config { command } => _config(&container()?, command),
        Commands::Completion { shell } => _completion(*shell, &mut io::stdout()),
    }
}

/// Runs without loading settings.
fn _completion(shell: Shell, out: &mut impl Write) -> CliResult<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "famtree", out);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn _tree(container: &ServiceContainer, focus: Option<&str>, json: bool) -> CliResult<()> {
    let opts = LabelOptions::from_settings(&container.settings);

    if let Some(id) = focus {
        let family = container.family.focus(&MemberId::new(id))?;
        if json {
            output::info(&render::to_json(&family.forest, &[family.root])?);
        } else {
            output::header(&family.title());
            output::info(&render::subtree_string(&family.forest, family.root, &opts));
        }
        return Ok(());
    }

    let forest = container.family.forest()?;
    if json {
        output::info(&render::to_json(&forest, forest.roots())?);
    } else {
        output::info(&forest.to_tree_string(&opts));
    }
    for id in forest.unplaced() {
        output::warning(&format!("{id} could not be placed in the tree"));
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn _roots(container: &ServiceContainer) -> CliResult<()> {
    let opts = LabelOptions::from_settings(&container.settings);
    let forest = container.family.forest()?;
    for &root in forest.roots() {
        if let Some(node) = forest.get_node(root) {
            output::member_row(node.id().as_str(), &render::couple_label(node, &opts));
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn _list(container: &ServiceContainer) -> CliResult<()> {
    let opts = LabelOptions::from_settings(&container.settings);
    for member in container.family.list()? {
        output::member_row(member.id.as_str(), &render::roster_label(&member, &opts));
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn _check(container: &ServiceContainer) -> CliResult<()> {
    let report = container.family.check()?;
    if report.is_clean() {
        output::success("roster is consistent");
        return Ok(());
    }
    for issue in report.fatal() {
        output::failure(issue);
    }
    for issue in report.warnings() {
        output::warning(issue);
    }
    Err(CliError::Issues(report.issues().len()))
}

#[instrument(level = "debug", skip(container))]
fn _add(container: &ServiceContainer, fields: &MemberArgs) -> CliResult<()> {
    let (Some(first), Some(last)) = (&fields.first, &fields.last) else {
        return Err(CliError::InvalidArgs(
            "--first and --last are required".into(),
        ));
    };
    let mut draft = MemberDraft::new(first, last);
    apply_fields(fields, &mut draft);

    let id = container.family.add(draft)?;
    output::action("Added", &id);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn _edit(
    container: &ServiceContainer,
    id: &str,
    fields: &MemberArgs,
    no_parent: bool,
    no_spouse: bool,
) -> CliResult<()> {
    let member = container.family.update(&MemberId::new(id), |draft| {
        apply_fields(fields, draft);
        if no_parent {
            draft.parent_id = None;
        }
        if no_spouse {
            draft.spouse_id = None;
        }
    })?;
    output::action("Updated", &format!("{} ({})", member, member.id));
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn _remove(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let member = container.family.remove(&MemberId::new(id))?;
    output::action("Removed", &format!("{} ({})", member, member.id));
    Ok(())
}

fn _config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let marker = if path.exists() { "" } else { " (not found)" };
                    output::action("config", &format!("{}{}", path.display(), marker));
                }
                None => output::warning("no config directory on this platform"),
            }
            output::action("roster", &container.family.roster_path().display());
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

/// Copy the fields given on the command line into `draft`.
fn apply_fields(fields: &MemberArgs, draft: &mut MemberDraft) {
    fn set(target: &mut Option<String>, value: &Option<String>) {
        if let Some(value) = value {
            *target = Some(value.clone());
        }
    }

    if let Some(first) = &fields.first {
        draft.first_name = first.clone();
    }
    if let Some(last) = &fields.last {
        draft.last_name = last.clone();
    }
    set(&mut draft.middle_name, &fields.middle);
    set(&mut draft.maiden_middle_name, &fields.maiden);
    set(&mut draft.nick_name, &fields.nick);
    set(&mut draft.birthdate, &fields.born);
    set(&mut draft.deathdate, &fields.died);
    set(&mut draft.photo_url, &fields.photo);
    set(&mut draft.gender, &fields.gender);
    if let Some(parent) = &fields.parent {
        draft.parent_id = Some(MemberId::new(parent));
    }
    if let Some(spouse) = &fields.spouse {
        draft.spouse_id = Some(MemberId::new(spouse));
    }
    if fields.order.is_some() {
        draft.child_order = fields.order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_fields_when_applying_then_untouched_fields_are_kept() {
        let mut draft = MemberDraft::new("Ann", "Doe");
        draft.nick_name = Some("Annie".into());
        let fields = MemberArgs {
            last: Some("Roe".into()),
            spouse: Some("b".into()),
            ..MemberArgs::default()
        };

        apply_fields(&fields, &mut draft);

        assert_eq!(draft.first_name, "Ann");
        assert_eq!(draft.last_name, "Roe");
        assert_eq!(draft.nick_name.as_deref(), Some("Annie"));
        assert_eq!(draft.spouse_id, Some(MemberId::new("b")));
    }

    #[test]
    fn given_bash_when_generating_completion_then_script_names_binary() {
        let mut out = Vec::new();

        _completion(Shell::Bash, &mut out).unwrap();

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("_famtree()"), "{script}");
    }
}
