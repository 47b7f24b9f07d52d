//! Subcommand execution against an initialized store.
//!
//! Every command returns the text to print, so `main` only decides where it
//! goes.

use super::{AddArgs, Command, ListArgs};
use crate::error::StoreError;
use crate::format::{
    OutputFormat, format_groups_markdown, format_list_markdown, format_task_line,
    format_tree_markdown, to_json,
};
use crate::store::TodoStore;
use crate::tree::DATE_FORMAT;
use crate::types::{GroupId, NewTask, TaskId};
use anyhow::{Result, bail};
use chrono::Local;
use serde_json::json;

/// Run one subcommand. `None` lists the whole tree.
pub async fn execute(
    store: &TodoStore,
    command: Option<Command>,
    format: OutputFormat,
) -> Result<String> {
    let Some(command) = command else {
        return list(store, ListArgs::default(), format);
    };

    match command {
        Command::List(args) => list(store, args, format),
        Command::Add(args) => add(store, args, format).await,
        Command::Done { id } => {
            require_task(store.set_completed(id, true).await?, id)?;
            task_result(store, id, "Completed", format)
        }
        Command::Reopen { id } => {
            require_task(store.set_completed(id, false).await?, id)?;
            task_result(store, id, "Reopened", format)
        }
        Command::Edit { id, content } => {
            let content = content.join(" ");
            require_task(store.set_content(id, &content).await?, id)?;
            if content.trim().is_empty() {
                deleted(id, format)
            } else {
                task_result(store, id, "Updated", format)
            }
        }
        Command::Due { id, date } => {
            let date = date.map(|d| d.format(DATE_FORMAT).to_string());
            require_task(store.set_due_date(id, date.as_deref()).await?, id)?;
            task_result(store, id, "Updated", format)
        }
        Command::Expect { id, time } => {
            require_task(
                store
                    .set_expected_completion_time(id, time.as_deref())
                    .await?,
                id,
            )?;
            task_result(store, id, "Updated", format)
        }
        Command::Remind { id, time } => {
            require_task(store.set_reminder_time(id, time.as_deref()).await?, id)?;
            task_result(store, id, "Updated", format)
        }
        Command::Assign { id, group } => {
            if let Some(group_id) = group.filter(|g| *g != 0) {
                require_group(store, group_id)?;
            }
            require_task(store.set_group(id, group).await?, id)?;
            task_result(store, id, "Updated", format)
        }
        Command::Rm { id } => {
            require_task(store.delete_task(id).await?, id)?;
            deleted(id, format)
        }
        Command::Toggle { id } => {
            require_task(store.toggle_expanded(id), id)?;
            task_result(store, id, "Toggled", format)
        }
        Command::Groups => groups(store, format),
        Command::GroupAdd { name, color } => {
            let Some(group) = store.add_group(&name, color.as_deref()).await? else {
                bail!(StoreError::missing_field("name"));
            };
            match format {
                OutputFormat::Json => to_json(&group),
                OutputFormat::Markdown => {
                    Ok(format!("Created group {} (#{}).\n", group.name, group.id))
                }
            }
        }
        Command::GroupEdit { id, name, color } => {
            let existing = require_group(store, id)?;
            let color = color.unwrap_or(existing.color);
            if !store.update_group(id, &name, &color).await? {
                bail!(StoreError::group_not_found(id));
            }
            match format {
                OutputFormat::Json => to_json(&store.group(id)),
                OutputFormat::Markdown => Ok(format!("Updated group #{}.\n", id)),
            }
        }
        Command::GroupRm { id } => {
            if !store.delete_group(id).await? {
                bail!(StoreError::group_not_found(id));
            }
            match format {
                OutputFormat::Json => to_json(&json!({ "deleted": id })),
                OutputFormat::Markdown => Ok(format!("Deleted group #{}.\n", id)),
            }
        }
        Command::GroupOrder { ids } => {
            store.reorder_groups(&ids).await?;
            groups(store, format)
        }
    }
}

fn list(store: &TodoStore, args: ListArgs, format: OutputFormat) -> Result<String> {
    let (title, tasks) = if let Some(day) = args.date {
        (format!("Due {}", day.format(DATE_FORMAT)), store.for_day(day))
    } else if args.today {
        let today = Local::now().date_naive();
        (format!("Due today ({})", today.format(DATE_FORMAT)), store.for_day(today))
    } else if args.dated {
        ("Scheduled".to_string(), store.with_due_date())
    } else if args.undated {
        ("Unscheduled".to_string(), store.without_due_date())
    } else {
        let groups = store.groups();
        return match format {
            OutputFormat::Json => to_json(&store.tasks()),
            OutputFormat::Markdown => {
                Ok(store.with_tasks(|roots| format_tree_markdown(roots, &groups)))
            }
        };
    };

    match format {
        OutputFormat::Json => to_json(&tasks),
        OutputFormat::Markdown => Ok(format_list_markdown(&title, &tasks, &store.groups())),
    }
}

async fn add(store: &TodoStore, args: AddArgs, format: OutputFormat) -> Result<String> {
    let mut new = NewTask::new(args.content.join(" "));
    if let Some(parent) = args.parent {
        if !store.contains(parent) {
            bail!(StoreError::task_not_found(parent));
        }
        new = new.under(parent);
    }
    if let Some(due) = args.due {
        new = new.due(due.format(DATE_FORMAT).to_string());
    }
    if let Some(expect) = args.expect {
        new = new.expected_at(expect);
    }
    if let Some(remind) = args.remind {
        new = new.remind_at(remind);
    }
    if let Some(group) = args.group {
        require_group(store, group)?;
        new = new.in_group(group);
    }

    let Some(task) = store.add_task(new).await? else {
        bail!(StoreError::missing_field("content"));
    };
    match format {
        OutputFormat::Json => to_json(&task),
        OutputFormat::Markdown => Ok(format!(
            "Added {}\n",
            format_task_line(&task, &store.groups())
        )),
    }
}

fn groups(store: &TodoStore, format: OutputFormat) -> Result<String> {
    let groups = store.groups();
    match format {
        OutputFormat::Json => to_json(&groups),
        OutputFormat::Markdown => Ok(format_groups_markdown(&groups)),
    }
}

fn task_result(store: &TodoStore, id: TaskId, verb: &str, format: OutputFormat) -> Result<String> {
    let Some(task) = store.find(id) else {
        bail!(StoreError::task_not_found(id));
    };
    match format {
        OutputFormat::Json => to_json(&task),
        OutputFormat::Markdown => Ok(format!(
            "{} {}\n",
            verb,
            format_task_line(&task, &store.groups())
        )),
    }
}

fn deleted(id: TaskId, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(&json!({ "deleted": id })),
        OutputFormat::Markdown => Ok(format!("Deleted task #{}.\n", id)),
    }
}

fn require_task(found: bool, id: TaskId) -> Result<()> {
    if !found {
        bail!(StoreError::task_not_found(id));
    }
    Ok(())
}

fn require_group(store: &TodoStore, id: GroupId) -> Result<crate::types::Group> {
    store
        .group(id)
        .ok_or_else(|| StoreError::group_not_found(id).into())
}
