//! Restaurant admin command handlers: branch listing, branch selection and
//! the activity feed.

use clap::Subcommand;
use dinemore_client::{AppSession, BranchContext, LoadOutcome};
use dinemore_core::{ActivityLog, ALL_BRANCHES_SENTINEL};

#[derive(Debug, Subcommand)]
pub enum BranchesCommands {
    /// List branches and mark the current selection
    List {
        #[arg(long)]
        restaurant: String,
    },
    /// Select a branch by id, or `all` for the aggregate view
    Select {
        #[arg(long)]
        restaurant: String,
        branch: String,
    },
}

/// Loads the branch list for `restaurant` into the session's context.
async fn load_branches<'a>(
    app: &'a mut AppSession,
    restaurant: &str,
) -> anyhow::Result<&'a mut BranchContext> {
    let api = app.api().clone();
    let ctx = app.enter_restaurant(Some(restaurant))?;
    match ctx.load(&api).await? {
        LoadOutcome::Failed => {
            let reason = ctx.error().unwrap_or("unknown error");
            anyhow::bail!("failed to load branches for restaurant {restaurant}: {reason}");
        }
        outcome => tracing::debug!(restaurant, ?outcome, "branch list loaded"),
    }
    Ok(ctx)
}

fn print_branches(ctx: &BranchContext) {
    if ctx.branches().is_empty() {
        println!("no branches configured");
        return;
    }
    if ctx.is_all_branches_view() {
        println!("view: all branches");
    }
    println!("{:<3}{:<20}{:<28}ADDRESS", "", "ID", "NAME");
    for branch in ctx.branches() {
        let marker = if ctx.selected_branch_id() == Some(branch.id.as_str()) {
            "*"
        } else {
            ""
        };
        let mut name = branch.name.clone();
        if branch.is_default {
            name.push_str(" (default)");
        }
        if !branch.is_active {
            name.push_str(" (inactive)");
        }
        println!(
            "{:<3}{:<20}{:<28}{}",
            marker,
            branch.id,
            name,
            branch.address.as_deref().unwrap_or("-")
        );
    }
}

pub(crate) async fn run_branches(
    app: &mut AppSession,
    command: BranchesCommands,
) -> anyhow::Result<()> {
    match command {
        BranchesCommands::List { restaurant } => {
            let ctx = load_branches(app, &restaurant).await?;
            print_branches(ctx);
        }
        BranchesCommands::Select { restaurant, branch } => {
            let ctx = load_branches(app, &restaurant).await?;
            if branch == ALL_BRANCHES_SENTINEL {
                ctx.set_selected_branch_id(None)?;
                println!("selected all branches for restaurant {restaurant}");
            } else {
                if !ctx.branches().iter().any(|b| b.id == branch) {
                    anyhow::bail!("branch '{branch}' not found for restaurant {restaurant}");
                }
                ctx.set_selected_branch_id(Some(&branch))?;
                println!("selected branch {branch} for restaurant {restaurant}");
            }
        }
    }
    Ok(())
}

fn format_entry(log: &ActivityLog) -> String {
    let mut line = format!(
        "{}  {:<16}{:<24}",
        log.created_at.format("%Y-%m-%d %H:%M"),
        log.actor_name().unwrap_or("-"),
        log.action
    );
    if let Some(details) = log.details_json() {
        line.push_str(&details.to_string());
    }
    line.trim_end().to_string()
}

/// Prints the newest `limit` activity entries for `restaurant`.
///
/// # Errors
///
/// Returns an error if the request fails, including when the stored identity
/// is not allowed to read the restaurant's activity.
pub(crate) async fn run_activity(
    app: &AppSession,
    restaurant: &str,
    limit: u32,
) -> anyhow::Result<()> {
    let logs = app.api().activity_logs(restaurant, limit).await?;
    if logs.is_empty() {
        println!("no activity recorded for restaurant {restaurant}");
        return Ok(());
    }
    for log in &logs {
        println!("{}", format_entry(log));
    }
    Ok(())
}
