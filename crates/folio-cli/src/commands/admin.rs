//! Administrative commands
//!
//! The commands live in an [`AdminCommandTable`] built once at startup and
//! handed to [`dispatch`]. A command is addressed by its position in the
//! table or by its name.

use std::collections::HashMap;

use anyhow::{bail, Result};
use uuid::Uuid;

use super::FolioService;
use crate::output::{short_id, Output, OutputFormat};

type Handler = fn(&FolioService, &[String], &Output) -> Result<()>;

/// One administrative command
pub struct AdminCommand {
    pub name: &'static str,
    /// Argument names, in order
    pub args: &'static [&'static str],
    pub about: &'static str,
    handler: Handler,
}

impl AdminCommand {
    pub fn usage(&self) -> String {
        let mut usage = self.name.to_string();
        for arg in self.args {
            usage.push_str(&format!(" <{}>", arg));
        }
        usage
    }
}

/// Ordered set of administrative commands
pub struct AdminCommandTable {
    commands: Vec<AdminCommand>,
}

impl AdminCommandTable {
    pub fn new(commands: Vec<AdminCommand>) -> Self {
        Self { commands }
    }

    /// The commands `folio admin` ships with
    pub fn standard() -> Self {
        Self::new(vec![
            AdminCommand {
                name: "list-accounts",
                args: &[],
                about: "List registered accounts",
                handler: list_accounts,
            },
            AdminCommand {
                name: "list-documents",
                args: &[],
                about: "List every document with its owner",
                handler: list_documents,
            },
            AdminCommand {
                name: "list-sessions",
                args: &[],
                about: "List live sessions",
                handler: list_sessions,
            },
            AdminCommand {
                name: "delete-document",
                args: &["username", "title"],
                about: "Delete a document by owner and title",
                handler: delete_document,
            },
            AdminCommand {
                name: "reconcile-counts",
                args: &[],
                about: "Recount owned documents and fix drifted counters",
                handler: reconcile_counts,
            },
        ])
    }

    /// Find a command by numeric index or by name
    pub fn lookup(&self, key: &str) -> Option<&AdminCommand> {
        match key.parse::<usize>() {
            Ok(index) => self.commands.get(index),
            Err(_) => self.commands.iter().find(|c| c.name == key),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdminCommand> {
        self.commands.iter()
    }
}

/// Run the command addressed by `key`, or list the table when none is given
pub fn dispatch(
    table: &AdminCommandTable,
    service: &FolioService,
    key: Option<&str>,
    args: &[String],
    output: &Output,
) -> Result<()> {
    let Some(key) = key else {
        print_table(table, output);
        return Ok(());
    };

    let Some(command) = table.lookup(key) else {
        bail!("Unknown admin command: '{}'. Run `folio admin` to list commands.", key);
    };

    if args.len() != command.args.len() {
        bail!("Usage: folio admin {}", command.usage());
    }

    tracing::info!(command = command.name, "running admin command");
    (command.handler)(service, args, output)
}

fn print_table(table: &AdminCommandTable, output: &Output) {
    match output.format {
        OutputFormat::Json => {
            let commands: Vec<_> = table
                .iter()
                .enumerate()
                .map(|(index, c)| {
                    serde_json::json!({"index": index, "name": c.name, "usage": c.usage(), "about": c.about})
                })
                .collect();
            output.json(&commands);
        }
        OutputFormat::Quiet => {
            for command in table.iter() {
                println!("{}", command.name);
            }
        }
        OutputFormat::Human => {
            println!("Admin commands:");
            for (index, command) in table.iter().enumerate() {
                println!("  {}  {:<36} {}", index, command.usage(), command.about);
            }
        }
    }
}

fn list_accounts(service: &FolioService, _args: &[String], output: &Output) -> Result<()> {
    output.print_accounts(&service.list_accounts()?);
    Ok(())
}

fn list_documents(service: &FolioService, _args: &[String], output: &Output) -> Result<()> {
    let owners: HashMap<Uuid, String> = service
        .list_accounts()?
        .into_iter()
        .map(|a| (a.id, a.username))
        .collect();
    let documents = service.list_documents()?;
    let owner_of = |id: &Uuid| owners.get(id).map(String::as_str).unwrap_or("?");

    match output.format {
        OutputFormat::Json => {
            let rows: Vec<_> = documents
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "id": d.id,
                        "title": d.title,
                        "owner": owner_of(&d.owner_id),
                        "length": d.content.chars().count(),
                        "lastUpdated": d.last_updated,
                    })
                })
                .collect();
            output.json(&rows);
        }
        OutputFormat::Quiet => {
            for document in &documents {
                println!("{}", document.id);
            }
        }
        OutputFormat::Human => {
            if documents.is_empty() {
                println!("No documents found.");
                return Ok(());
            }
            for document in &documents {
                println!(
                    "{} | {:<16} | {} | {} char(s)",
                    short_id(&document.id.to_string()),
                    owner_of(&document.owner_id),
                    document.title,
                    document.content.chars().count()
                );
            }
            println!("\n{} document(s)", documents.len());
        }
    }
    Ok(())
}

fn list_sessions(service: &FolioService, _args: &[String], output: &Output) -> Result<()> {
    output.print_sessions(&service.list_sessions()?);
    Ok(())
}

fn delete_document(service: &FolioService, args: &[String], output: &Output) -> Result<()> {
    let deleted = service.purge_document(&args[0], &args[1])?;

    match output.format {
        OutputFormat::Json => output.json(&deleted),
        _ => output.success(&format!("Deleted '{}' owned by {}", deleted.title, args[0])),
    }
    Ok(())
}

fn reconcile_counts(service: &FolioService, _args: &[String], output: &Output) -> Result<()> {
    let corrected = service.reconcile_document_counts()?;

    match output.format {
        OutputFormat::Json => output.json(&corrected),
        OutputFormat::Quiet => {
            for account in &corrected {
                println!("{}", account.username);
            }
        }
        OutputFormat::Human => {
            if corrected.is_empty() {
                println!("All document counts are consistent.");
            } else {
                for account in &corrected {
                    println!("{} -> {}", account.username, account.document_count);
                }
                println!("\nCorrected {} account(s)", corrected.len());
            }
        }
    }
    Ok(())
}
