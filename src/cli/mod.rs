//! `crmhub` admin CLI.
//!
//! Talks to the REST API of a running `crmhub-api`; it never opens the
//! database itself.

pub mod api_client;
mod commands;
pub mod error;
mod utils;

#[cfg(test)]
mod error_test;
#[cfg(test)]
mod utils_test;

use clap::{Parser, Subcommand, ValueEnum};

use commands::{admin, agent, logs};
use error::CliResult;

#[derive(Parser)]
#[command(name = "crmhub")]
#[command(author, version, about = "CRM hub admin CLI", long_about = None)]
pub struct Cli {
    /// Override the API URL (default: CRMHUB_API_URL env or http://localhost:3000)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

impl Format {
    fn as_str(self) -> &'static str {
        match self {
            Format::Table => "table",
            Format::Json => "json",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// AI agent and permission management
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Show the agent audit log, newest first
    Logs {
        /// Only entries for this agent ID
        #[arg(long)]
        agent: Option<String>,
        /// Only entries for this module server (e.g. tasks-server)
        #[arg(long)]
        module: Option<String>,
        /// Success, Denied or Error
        #[arg(long)]
        result: Option<String>,
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Admin user management
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List agents
    List,
    /// Show an agent and its permissions
    Show { id: String },
    /// Register a new agent
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an agent
    Delete {
        id: String,
        /// Confirm deletion
        #[arg(long)]
        force: bool,
    },
    /// Enable a module and add tools to the agent's allow-list
    Grant {
        id: String,
        /// Module server name (e.g. tasks-server)
        #[arg(long)]
        module: String,
        /// Comma-separated tool names
        #[arg(long, default_value = "")]
        tools: String,
    },
    /// Disable a module for the agent
    Revoke {
        id: String,
        #[arg(long)]
        module: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List admin users
    List,
    /// Create an admin user
    Create {
        name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        email: Option<String>,
        /// Defaults to admin
        #[arg(long)]
        role: Option<String>,
    },
}

pub async fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let api_client = api_client::ApiClient::new(cli.api_url);
    let format = cli.format.as_str();

    let Some(command) = cli.command else {
        // Show help when no command provided
        let _ = Cli::parse_from(["crmhub", "--help"]);
        return Ok(());
    };

    let output = dispatch(&api_client, command, format).await?;
    println!("{}", output);
    Ok(())
}

async fn dispatch(
    api_client: &api_client::ApiClient,
    command: Commands,
    format: &str,
) -> CliResult<String> {
    match command {
        Commands::Agent { command } => match command {
            AgentCommands::List => agent::list_agents(api_client, format).await,
            AgentCommands::Show { id } => agent::get_agent(api_client, &id, format).await,
            AgentCommands::Create { name, description } => {
                agent::create_agent(api_client, agent::CreateAgentRequest { name, description })
                    .await
            }
            AgentCommands::Delete { id, force } => {
                agent::delete_agent(api_client, &id, force).await
            }
            AgentCommands::Grant { id, module, tools } => {
                agent::grant(api_client, &id, &module, utils::parse_list(&tools)).await
            }
            AgentCommands::Revoke { id, module } => {
                agent::revoke(api_client, &id, &module).await
            }
        },
        Commands::Logs {
            agent,
            module,
            result,
            limit,
        } => {
            let filter = logs::LogFilter {
                agent_id: agent.as_deref(),
                module: module.as_deref(),
                result: result.as_deref(),
                limit,
            };
            logs::list_logs(api_client, filter, format).await
        }
        Commands::Admin { command } => match command {
            AdminCommands::List => admin::list_admins(api_client, format).await,
            AdminCommands::Create {
                name,
                mobile,
                email,
                role,
            } => {
                admin::create_admin(
                    api_client,
                    admin::CreateAdminUserRequest {
                        name,
                        mobile,
                        email,
                        role,
                    },
                )
                .await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn grant_parses_module_and_tools() {
        let cli = Cli::parse_from([
            "crmhub",
            "--format",
            "json",
            "agent",
            "grant",
            "a1b2c3d4",
            "--module",
            "tasks-server",
            "--tools",
            "get_tasks,create_task",
        ]);

        assert_eq!(cli.format, Format::Json);
        match cli.command {
            Some(Commands::Agent {
                command: AgentCommands::Grant { id, module, tools },
            }) => {
                assert_eq!(id, "a1b2c3d4");
                assert_eq!(module, "tasks-server");
                assert_eq!(tools, "get_tasks,create_task");
            }
            _ => panic!("expected agent grant"),
        }
    }

    #[test]
    fn format_defaults_to_table() {
        let cli = Cli::parse_from(["crmhub", "logs", "--result", "Denied"]);
        assert_eq!(cli.format, Format::Table);
    }
}
