//! Command-line front end over `projtrack_core`.
//!
//! # Responsibility
//! - Stand in for the desktop presentation layer: render the status tree,
//!   resolve selections, and drive mutations through the core facade.
//! - Answer confirmation requests from `--yes` or an interactive prompt.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use projtrack_core::{
    init_logging, CompletionOutcome, ConfirmRequest, ConfirmationPolicy, CoreConfig,
    DeleteOutcome, EntityStore, JsonFileStorage, NodeType, ProjectDraft, ProjectPatch,
    ProjectsService, SelectionView, Status, TreeNode,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "projtrack", version, about = "Track wrappers and projects")]
struct Cli {
    /// Projects document; overrides PROJTRACK_DATA_PATH / PROJTRACK_RESOURCE_PATH.
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Answer yes to every confirmation.
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the grouped status tree.
    Tree,
    /// Show the child list or project detail for one node.
    Show {
        /// status_root | wrapper | project
        node_type: NodeType,
        node_id: String,
    },
    /// List wrappers as `id<TAB>name`.
    Wrappers,
    AddWrapper {
        name: String,
    },
    RenameWrapper {
        id: String,
        name: String,
    },
    AddProject(AddProjectArgs),
    UpdateProject(UpdateProjectArgs),
    DeleteProject {
        id: String,
    },
    DeleteWrapper {
        id: String,
    },
    /// Complete a project; offers to complete its wrapper when eligible.
    CompleteProject {
        id: String,
    },
    CompleteWrapper {
        id: String,
    },
    /// Print the core version.
    Version,
}

#[derive(Args, Debug)]
struct AddProjectArgs {
    name: String,
    /// YYYY-MM-DD
    #[arg(long)]
    start: String,
    /// YYYY-MM-DD
    #[arg(long)]
    end: String,
    #[arg(long)]
    wrapper: Option<String>,
    #[arg(long, default_value = "")]
    owner: String,
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(Args, Debug)]
struct UpdateProjectArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    owner: Option<String>,
    #[arg(long, conflicts_with = "detach")]
    wrapper: Option<String>,
    /// Detach the project from its wrapper.
    #[arg(long)]
    detach: bool,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CoreConfig::from_env(cli.data.as_deref());
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)
            .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;
    }

    if let Command::Version = cli.command {
        println!("projtrack_core version={}", projtrack_core::core_version());
        return Ok(());
    }

    let storage = JsonFileStorage::new(&config.data_path);
    let model = storage
        .load_or_default()
        .with_context(|| format!("failed to load `{}`", config.data_path.display()))?;
    let mut service = ProjectsService::from_store(EntityStore::with_model(storage, model));
    let mut confirm = PromptConfirm {
        assume_yes: cli.yes,
    };

    match cli.command {
        Command::Tree => {
            for root in &service.tree().roots {
                print_node(root, 0);
            }
        }
        Command::Show { node_type, node_id } => match service.select(node_type, &node_id) {
            Some(SelectionView::Children { rows }) => {
                for row in rows {
                    println!("{}\t{}\t{}\t{}", row.node_type, row.id, row.name, row.status);
                }
            }
            Some(SelectionView::ProjectDetail { project }) => {
                println!("id:       {}", project.id);
                println!("name:     {}", project.name);
                println!("status:   {}", project.status);
                println!("wrapper:  {}", project.wrapper_id.as_deref().unwrap_or("-"));
                println!("owner:    {}", project.owner);
                println!("start:    {}", project.start_date);
                println!("end:      {}", project.end_date);
                println!("notes:    {}", project.notes);
            }
            None => anyhow::bail!("no {node_type} node with id `{node_id}`"),
        },
        Command::Wrappers => {
            for (id, name) in service.wrapper_choices() {
                println!("{id}\t{name}");
            }
        }
        Command::AddWrapper { name } => {
            let id = service.add_wrapper(&name)?;
            println!("{id}");
        }
        Command::RenameWrapper { id, name } => service.rename_wrapper(&id, &name)?,
        Command::AddProject(args) => {
            let mut draft = ProjectDraft::new(
                args.name,
                parse_date(&args.start)?,
                parse_date(&args.end)?,
            )
            .with_owner(args.owner)
            .with_notes(args.notes);
            if let Some(wrapper_id) = args.wrapper {
                draft = draft.in_wrapper(wrapper_id);
            }
            let id = service.add_project(draft)?;
            println!("{id}");
        }
        Command::UpdateProject(args) => {
            let patch = ProjectPatch {
                name: args.name,
                owner: args.owner,
                wrapper_id: if args.detach {
                    Some(None)
                } else {
                    args.wrapper.map(Some)
                },
                start_date: args.start.as_deref().map(parse_date).transpose()?,
                end_date: args.end.as_deref().map(parse_date).transpose()?,
                notes: args.notes,
            };
            service.update_project(&args.id, &patch)?;
        }
        Command::DeleteProject { id } => {
            report_delete(service.delete_project(&id, &mut confirm)?);
        }
        Command::DeleteWrapper { id } => {
            report_delete(service.delete_wrapper(&id, &mut confirm)?);
        }
        Command::CompleteProject { id } => {
            match service.complete_project_with_cascade(&id, &mut confirm)? {
                CompletionOutcome::AlreadyCompleted => println!("project already completed"),
                CompletionOutcome::ProjectCompleted => println!("project completed"),
                CompletionOutcome::CascadeDeclined { wrapper_id } => {
                    println!("project completed; wrapper {wrapper_id} left in progress")
                }
                CompletionOutcome::WrapperCompleted { wrapper_id } => {
                    println!("project and wrapper {wrapper_id} completed")
                }
            }
        }
        Command::CompleteWrapper { id } => {
            service.complete_wrapper(&id)?;
            println!("wrapper completed");
        }
        Command::Version => {}
    }
    Ok(())
}

fn print_node(node: &TreeNode, depth: usize) {
    let marker = match (node.node_type, node.status) {
        (NodeType::StatusRoot, _) => "#",
        (_, Status::InProgress) => "o",
        (_, Status::Completed) => "x",
    };
    println!(
        "{}{marker} {} [{}]",
        "  ".repeat(depth),
        node.label,
        node.node_id
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn report_delete(outcome: DeleteOutcome) {
    match outcome {
        DeleteOutcome::Deleted => println!("deleted"),
        DeleteOutcome::Declined => println!("cancelled"),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date `{value}`; expected YYYY-MM-DD"))
}

/// Answers confirmations from `--yes` or a stdin prompt.
struct PromptConfirm {
    assume_yes: bool,
}

impl ConfirmationPolicy for PromptConfirm {
    fn confirm(&mut self, request: &ConfirmRequest<'_>) -> bool {
        self.assume_yes || prompt(request)
    }
}

fn prompt(request: &ConfirmRequest<'_>) -> bool {
    let question = match request {
        ConfirmRequest::DeleteProject { project } => format!("Delete project `{}`?", project.name),
        ConfirmRequest::DeleteWrapper { wrapper } => format!("Delete wrapper `{}`?", wrapper.name),
        ConfirmRequest::CascadeComplete { wrapper } => format!(
            "All projects in `{}` are completed. Complete the wrapper too?",
            wrapper.name
        ),
    };
    print!("{question} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(err) => {
            log::warn!("event=confirm_prompt module=cli status=error error={err}");
            false
        }
    }
}
