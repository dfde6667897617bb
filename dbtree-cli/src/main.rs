//! `DbTree` CLI - Command-line interface for the `DbTree` server tree
//!
//! Provides commands for managing server groups and connection profiles,
//! searching and filtering the server tree, and filtering profiler events.

use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use dbtree_core::{
    filter_data, filter_tree_view, ConfigManager, ConnectionManager, ConnectionProfile,
    ConnectionStatus, ExplorerSnapshot, ExplorerTree, FilterClause, FilterOperator, GroupTree,
    NodeId, ProfilerFilter, Row, ServerTree, TreeDataSource, TreeElement, TreeView,
    TreeVisibilityFilter,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// `DbTree` command-line interface for server groups and tree filtering
#[derive(Parser)]
#[command(name = "dbtree-cli")]
#[command(author, version, about = "DbTree command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage server groups
    #[command(subcommand)]
    Group(GroupCommands),

    /// Manage connection profiles
    #[command(subcommand)]
    Connection(ConnectionCommands),

    /// Search connection profiles by text
    #[command(about = "Search connections by server or database name")]
    Search {
        /// Text to look for
        text: String,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Print the server tree
    #[command(about = "Print the server tree, optionally filtered")]
    Tree {
        /// Tree filter, e.g. `sales` or `db:sales`
        #[arg(short, long)]
        filter: Option<String>,

        /// JSON file describing loaded object explorer nodes
        #[arg(short, long)]
        objects: Option<PathBuf>,

        /// Which connections to show (defaults to the configured view)
        #[arg(long, value_enum)]
        view: Option<ViewArg>,
    },

    /// Show or clear recently used connections
    #[command(about = "Show or clear the recently used connections")]
    Recent {
        /// Clear the list instead of showing it
        #[arg(long)]
        clear: bool,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Filter profiler events
    #[command(about = "Filter profiler event rows read from a JSON file")]
    Profiler {
        /// JSON file holding an array of event objects
        #[arg(short, long)]
        rows: PathBuf,

        /// Clause as `field,operator[,value]`; repeat for AND
        #[arg(long = "clause", value_parser = parse_clause)]
        clauses: Vec<FilterClause>,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

/// Group subcommands
#[derive(Subcommand)]
pub enum GroupCommands {
    /// List all groups
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Create a group
    Create {
        /// Group name, or a full name such as `Prod/Web` with `--path`
        name: String,

        /// Parent group full name or UUID
        #[arg(short, long)]
        parent: Option<String>,

        /// Treat NAME as a full name and create missing groups along it
        #[arg(long, conflicts_with = "parent")]
        path: bool,

        /// Group color
        #[arg(long)]
        color: Option<String>,

        /// Group description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Rename a group
    Rename {
        /// Group full name or UUID
        group: String,

        /// New name
        new_name: String,
    },

    /// Move a group under another group
    Move {
        /// Group full name or UUID
        group: String,

        /// New parent full name or UUID (`ROOT` for the top level)
        parent: String,
    },

    /// Delete a group with everything below it
    Delete {
        /// Group full name or UUID
        group: String,
    },
}

/// Connection subcommands
#[derive(Subcommand)]
pub enum ConnectionCommands {
    /// List connections
    List {
        /// Only connections in this group and below
        #[arg(short, long)]
        group: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Add a connection profile
    Add {
        /// Server host name or address
        #[arg(short, long)]
        server: String,

        /// Database name
        #[arg(short, long)]
        database: Option<String>,

        /// Login user name
        #[arg(short, long)]
        user: Option<String>,

        /// Display title
        #[arg(short, long)]
        name: Option<String>,

        /// Data provider
        #[arg(short, long)]
        provider: Option<String>,

        /// Group full name; missing groups are created
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Move a connection to another group
    Move {
        /// Connection name or UUID
        connection: String,

        /// Target group full name or UUID
        group: String,
    },

    /// Delete a connection
    Delete {
        /// Connection name or UUID
        connection: String,
    },

    /// Record a connection as used
    Connect {
        /// Connection name or UUID
        connection: String,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
}

/// Tree view selection
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ViewArg {
    /// Every connection
    All,
    /// Connections with loaded explorer nodes
    Active,
    /// Recently used connections
    Recent,
}

impl From<ViewArg> for TreeView {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::All => Self::All,
            ViewArg::Active => Self::Active,
            ViewArg::Recent => Self::Recent,
        }
    }
}

/// Connection output for JSON listings
#[derive(Serialize)]
struct ConnectionOutput {
    id: Uuid,
    name: String,
    server: String,
    database: Option<String>,
    user: Option<String>,
    provider: String,
    group: Option<String>,
}

impl ConnectionOutput {
    fn new(tree: &GroupTree, profile: &ConnectionProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.display_name(),
            server: profile.server_name.clone(),
            database: profile.database_name.clone(),
            user: profile.user_name.clone(),
            provider: profile.provider.clone(),
            group: tree.full_name(profile.group_id),
        }
    }
}

/// Group output for JSON listings
#[derive(Serialize)]
struct GroupOutput {
    id: Uuid,
    name: String,
    full_name: String,
    connections: usize,
    color: Option<String>,
    description: Option<String>,
}

/// Parses a profiler clause given as `field,operator[,value]`
///
/// The value is everything after the second comma, so it may contain commas.
fn parse_clause(s: &str) -> Result<FilterClause, String> {
    let mut parts = s.splitn(3, ',');
    let field = parts.next().map(str::trim).unwrap_or_default();
    let operator = parts
        .next()
        .ok_or_else(|| format!("invalid clause '{s}': expected field,operator[,value]"))?
        .trim()
        .parse::<FilterOperator>()
        .map_err(|e| e.to_string())?;
    let value = parts.next().map(str::to_string);

    let clause = match value {
        Some(value) => FilterClause::new(field, operator, value),
        None => FilterClause {
            field: field.to_string(),
            operator,
            value: None,
        },
    };
    clause.validate().map_err(|e| e.to_string())?;
    Ok(clause)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.config.as_deref(), cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Group(subcmd) => cmd_group(config, subcmd),
        Commands::Connection(subcmd) => cmd_connection(config, subcmd),
        Commands::Search { text, format } => cmd_search(config, &text, format),
        Commands::Tree {
            filter,
            objects,
            view,
        } => cmd_tree(config, filter.as_deref(), objects.as_deref(), view),
        Commands::Recent { clear, format } => cmd_recent(config, clear, format),
        Commands::Profiler {
            rows,
            clauses,
            format,
        } => cmd_profiler(&rows, clauses, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// Installs the log subscriber
///
/// `RUST_LOG` wins; otherwise `-v` flags, then the configured level.
fn init_logging(config: Option<&Path>, verbose: u8) {
    let configured = open_config(config)
        .and_then(|manager| {
            manager
                .load_settings()
                .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))
        })
        .map(|settings| settings.logging.level)
        .unwrap_or_else(|_| "warn".to_string());

    let level = match verbose {
        0 => configured,
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_config(config: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config {
        Some(dir) => Ok(ConfigManager::with_config_dir(dir.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

fn open_manager(config: Option<&Path>) -> Result<ConnectionManager, CliError> {
    let config_manager = open_config(config)?;
    ConnectionManager::new(config_manager)
        .map_err(|e| CliError::Config(format!("Failed to load connections: {e}")))
}

// ============================================================================
// Group commands
// ============================================================================

/// Group command handler
fn cmd_group(config: Option<&Path>, subcmd: GroupCommands) -> Result<(), CliError> {
    match subcmd {
        GroupCommands::List { format } => cmd_group_list(config, format),
        GroupCommands::Create {
            name,
            parent,
            path,
            color,
            description,
        } => cmd_group_create(
            config,
            &name,
            parent.as_deref(),
            path,
            color.as_deref(),
            description.as_deref(),
        ),
        GroupCommands::Rename { group, new_name } => cmd_group_rename(config, &group, &new_name),
        GroupCommands::Move { group, parent } => cmd_group_move(config, &group, &parent),
        GroupCommands::Delete { group } => cmd_group_delete(config, &group),
    }
}

/// List groups command handler
fn cmd_group_list(config: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let manager = open_manager(config)?;
    let tree = manager.tree();

    match format {
        OutputFormat::Table => println!("{}", format_group_table(tree)),
        OutputFormat::Json => {
            let output: Vec<GroupOutput> = tree
                .subgroups(tree.root_id())
                .into_iter()
                .map(|group| GroupOutput {
                    id: group.id,
                    name: group.name.clone(),
                    full_name: tree.full_name(group.id).unwrap_or_default(),
                    connections: tree.connections_in_group(group.id).len(),
                    color: group.color.clone(),
                    description: group.description.clone(),
                })
                .collect();
            println!("{}", to_json(&output)?);
        }
    }
    Ok(())
}

/// Format groups as a table string, in tree order
#[must_use]
pub fn format_group_table(tree: &GroupTree) -> String {
    let groups = tree.subgroups(tree.root_id());
    if groups.is_empty() {
        return "No groups found.".to_string();
    }

    let rows: Vec<(String, usize, Uuid)> = groups
        .iter()
        .map(|g| {
            (
                tree.full_name(g.id).unwrap_or_default(),
                tree.connections_in_group(g.id).len(),
                g.id,
            )
        })
        .collect();
    let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(4).max(4);
    let count_width = 11; // "CONNECTIONS"

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<name_width$}  {:<count_width$}  ID",
        "NAME", "CONNECTIONS"
    );
    let _ = writeln!(output, "{:-<name_width$}  {:-<count_width$}  {:-<36}", "", "", "");
    for (name, count, id) in rows {
        let _ = writeln!(output, "{name:<name_width$}  {count:<count_width$}  {id}");
    }

    output.trim_end().to_string()
}

/// Create group command handler
fn cmd_group_create(
    config: Option<&Path>,
    name: &str,
    parent: Option<&str>,
    path: bool,
    color: Option<&str>,
    description: Option<&str>,
) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;

    let id = if path {
        manager
            .save_group(name, color, description)
            .map_err(|e| CliError::Group(format!("Failed to create group: {e}")))?
    } else {
        let parent_id = match parent {
            Some(parent) => find_group(manager.tree(), parent)?,
            None => manager.tree().root_id(),
        };
        let id = manager
            .create_group(name, parent_id)
            .map_err(|e| CliError::Group(format!("Failed to create group: {e}")))?;
        if color.is_some() || description.is_some() {
            manager
                .edit_group(
                    id,
                    name,
                    color.map(str::to_string),
                    description.map(str::to_string),
                )
                .map_err(|e| CliError::Group(format!("Failed to update group: {e}")))?;
        }
        id
    };

    let full_name = manager.tree().full_name(id).unwrap_or_default();
    println!("Created group '{full_name}' (ID: {id})");
    Ok(())
}

/// Rename group command handler
fn cmd_group_rename(config: Option<&Path>, group: &str, new_name: &str) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;
    let id = find_group(manager.tree(), group)?;
    let (color, description) = manager
        .get_group(id)
        .map(|g| (g.color.clone(), g.description.clone()))
        .unwrap_or_default();

    manager
        .edit_group(id, new_name, color, description)
        .map_err(|e| CliError::Group(format!("Failed to rename group: {e}")))?;

    let full_name = manager.tree().full_name(id).unwrap_or_default();
    println!("Renamed group to '{full_name}' (ID: {id})");
    Ok(())
}

/// Move group command handler
fn cmd_group_move(config: Option<&Path>, group: &str, parent: &str) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;
    let id = find_group(manager.tree(), group)?;
    let parent_id = find_group(manager.tree(), parent)?;

    manager
        .move_group(id, parent_id)
        .map_err(|e| CliError::Group(format!("Failed to move group: {e}")))?;

    let full_name = manager.tree().full_name(id).unwrap_or_default();
    println!("Moved group to '{full_name}' (ID: {id})");
    Ok(())
}

/// Delete group command handler
fn cmd_group_delete(config: Option<&Path>, group: &str) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;
    let id = find_group(manager.tree(), group)?;
    let full_name = manager.tree().full_name(id).unwrap_or_default();

    let removed = manager
        .delete_group(id)
        .map_err(|e| CliError::Group(format!("Failed to delete group: {e}")))?;

    println!(
        "Deleted group '{full_name}' (ID: {id}) and {} connection(s)",
        removed.len()
    );
    Ok(())
}

/// Find a group by full name or UUID
fn find_group(tree: &GroupTree, name_or_id: &str) -> Result<Uuid, CliError> {
    if let Ok(uuid) = Uuid::parse_str(name_or_id) {
        if tree.group(uuid).is_some() {
            return Ok(uuid);
        }
    }

    tree.find_group_by_full_name(name_or_id)
        .map(|g| g.id)
        .ok_or_else(|| CliError::GroupNotFound(name_or_id.to_string()))
}

// ============================================================================
// Connection commands
// ============================================================================

/// Connection command handler
fn cmd_connection(config: Option<&Path>, subcmd: ConnectionCommands) -> Result<(), CliError> {
    match subcmd {
        ConnectionCommands::List { group, format } => {
            cmd_connection_list(config, group.as_deref(), format)
        }
        ConnectionCommands::Add {
            server,
            database,
            user,
            name,
            provider,
            group,
        } => {
            let mut profile = ConnectionProfile::new(server);
            if let Some(database) = database {
                profile = profile.with_database(database);
            }
            if let Some(user) = user {
                profile = profile.with_user(user);
            }
            if let Some(name) = name {
                profile = profile.with_connection_name(name);
            }
            if let Some(provider) = provider {
                profile = profile.with_provider(provider);
            }
            cmd_connection_add(config, profile, group.as_deref())
        }
        ConnectionCommands::Move { connection, group } => {
            cmd_connection_move(config, &connection, &group)
        }
        ConnectionCommands::Delete { connection } => cmd_connection_delete(config, &connection),
        ConnectionCommands::Connect { connection } => cmd_connection_connect(config, &connection),
    }
}

/// List connections command handler
fn cmd_connection_list(
    config: Option<&Path>,
    group: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let manager = open_manager(config)?;
    let tree = manager.tree();

    let group_id = match group {
        Some(group) => find_group(tree, group)?,
        None => tree.root_id(),
    };
    let connections = tree.connections_in_group(group_id);
    print_connections(tree, &connections, format)
}

/// Add connection command handler
fn cmd_connection_add(
    config: Option<&Path>,
    profile: ConnectionProfile,
    group: Option<&str>,
) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;

    let group_id = match group {
        Some(group) => manager
            .save_group(group, None, None)
            .map_err(|e| CliError::Group(format!("Failed to resolve group: {e}")))?,
        None => manager.tree().root_id(),
    };
    let profile = profile.with_group(group_id);
    let name = profile.display_name();

    let id = manager
        .create_connection(profile)
        .map_err(|e| CliError::Config(format!("Failed to add connection: {e}")))?;

    println!("Added connection '{name}' (ID: {id})");
    Ok(())
}

/// Move connection command handler
fn cmd_connection_move(
    config: Option<&Path>,
    connection: &str,
    group: &str,
) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;
    let (id, name) = {
        let profile = find_connection(manager.tree(), connection)?;
        (profile.id, profile.display_name())
    };
    let group_id = find_group(manager.tree(), group)?;

    manager
        .move_connection(id, group_id)
        .map_err(|e| CliError::Group(format!("Failed to move connection: {e}")))?;

    let group_name = manager
        .tree()
        .full_name(group_id)
        .unwrap_or_else(|| dbtree_core::ROOT_NAME.to_string());
    println!("Moved connection '{name}' to '{group_name}'");
    Ok(())
}

/// Delete connection command handler
fn cmd_connection_delete(config: Option<&Path>, connection: &str) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;
    let id = find_connection(manager.tree(), connection)?.id;

    let removed = manager
        .delete_connection(id)
        .map_err(|e| CliError::Config(format!("Failed to delete connection: {e}")))?;

    println!("Deleted connection '{}' (ID: {id})", removed.display_name());
    Ok(())
}

/// Connect command handler
///
/// Only records the use; the CLI keeps no live connections.
fn cmd_connection_connect(config: Option<&Path>, connection: &str) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;
    let (id, name) = {
        let profile = find_connection(manager.tree(), connection)?;
        (profile.id, profile.display_name())
    };

    manager
        .mark_connected(id)
        .map_err(|e| CliError::Config(format!("Failed to record connection: {e}")))?;

    println!("Recorded connection to '{name}' (ID: {id})");
    Ok(())
}

/// Find a connection by title, display name or UUID
fn find_connection<'a>(
    tree: &'a GroupTree,
    name_or_id: &str,
) -> Result<&'a ConnectionProfile, CliError> {
    if let Ok(uuid) = Uuid::parse_str(name_or_id) {
        if let Some(profile) = tree.connection(uuid) {
            return Ok(profile);
        }
    }

    let connections = tree.connections_in_group(tree.root_id());

    // Exact display name first
    if let Some(profile) = connections
        .iter()
        .find(|c| c.display_name() == name_or_id)
    {
        return Ok(*profile);
    }

    let lower = name_or_id.to_lowercase();
    let matches: Vec<_> = connections
        .into_iter()
        .filter(|c| {
            c.display_name().to_lowercase() == lower || c.server_name.to_lowercase() == lower
        })
        .collect();

    match matches.len() {
        0 => Err(CliError::ConnectionNotFound(name_or_id.to_string())),
        1 => Ok(matches[0]),
        _ => {
            let names: Vec<_> = matches.iter().map(|c| c.display_name()).collect();
            Err(CliError::Config(format!(
                "Ambiguous connection name '{}'. Matches: {}",
                name_or_id,
                names.join(", ")
            )))
        }
    }
}

fn print_connections(
    tree: &GroupTree,
    connections: &[&ConnectionProfile],
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Table => println!("{}", format_connection_table(tree, connections)),
        OutputFormat::Json => {
            let output: Vec<ConnectionOutput> = connections
                .iter()
                .map(|c| ConnectionOutput::new(tree, c))
                .collect();
            println!("{}", to_json(&output)?);
        }
    }
    Ok(())
}

/// Format connections as a table string
#[must_use]
pub fn format_connection_table(tree: &GroupTree, connections: &[&ConnectionProfile]) -> String {
    if connections.is_empty() {
        return "No connections found.".to_string();
    }

    let rows: Vec<[String; 4]> = connections
        .iter()
        .map(|c| {
            [
                c.display_name(),
                c.server_name.clone(),
                c.database_name.clone().unwrap_or_default(),
                tree.full_name(c.group_id).unwrap_or_default(),
            ]
        })
        .collect();
    let width = |i: usize, header: &str| {
        rows.iter()
            .map(|r| r[i].len())
            .max()
            .unwrap_or(0)
            .max(header.len())
    };
    let name_width = width(0, "NAME");
    let server_width = width(1, "SERVER");
    let database_width = width(2, "DATABASE");

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<name_width$}  {:<server_width$}  {:<database_width$}  GROUP",
        "NAME", "SERVER", "DATABASE"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<server_width$}  {:-<database_width$}  -----",
        "", "", ""
    );
    for [name, server, database, group] in rows {
        let _ = writeln!(
            output,
            "{name:<name_width$}  {server:<server_width$}  {database:<database_width$}  {group}"
        );
    }

    output.trim_end().to_string()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))
}

// ============================================================================
// Search, tree and recent
// ============================================================================

/// Search command handler
fn cmd_search(config: Option<&Path>, text: &str, format: OutputFormat) -> Result<(), CliError> {
    let manager = open_manager(config)?;
    let results = manager.search(text);
    debug!(text, results = results.len(), "Search finished");
    print_connections(manager.tree(), &results, format)
}

/// Connection state for one CLI invocation
///
/// Profiles with loaded explorer nodes count as connected.
struct SessionStatus<'a> {
    manager: &'a ConnectionManager,
    connected: HashSet<Uuid>,
}

impl ConnectionStatus for SessionStatus<'_> {
    fn is_connected(&self, connection_id: Uuid) -> bool {
        self.connected.contains(&connection_id) || self.manager.is_connected(connection_id)
    }

    fn is_recent(&self, connection_id: Uuid) -> bool {
        self.manager.is_recent(connection_id)
    }
}

/// Tree command handler
fn cmd_tree(
    config: Option<&Path>,
    filter: Option<&str>,
    objects: Option<&Path>,
    view: Option<ViewArg>,
) -> Result<(), CliError> {
    let manager = open_manager(config)?;
    let view = match view {
        Some(view) => TreeView::from(view),
        None => {
            open_config(config)?
                .load_settings()
                .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?
                .tree
                .default_view
        }
    };

    let snapshot = match objects {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            ExplorerSnapshot::from_json(&content).map_err(|e| {
                CliError::Config(format!("Failed to load {}: {e}", path.display()))
            })?
        }
        None => ExplorerSnapshot::default(),
    };
    let explorer = ExplorerTree::from_snapshot(&snapshot);

    let status = SessionStatus {
        manager: &manager,
        connected: snapshot
            .connections
            .iter()
            .map(|c| c.connection_id)
            .collect(),
    };
    let Some(groups) = filter_tree_view(manager.tree(), view, &status) else {
        println!("No connections in the {view} view.");
        return Ok(());
    };

    let mut visibility = TreeVisibilityFilter::with_filter(filter.unwrap_or_default());
    println!("{}", format_tree(&groups, &explorer, &mut visibility));
    Ok(())
}

/// Renders the visible part of the server tree, two spaces per level
///
/// Groups end with `/`, explorer nodes carry their type in brackets.
#[must_use]
pub fn format_tree(
    groups: &GroupTree,
    explorer: &ExplorerTree,
    filter: &mut TreeVisibilityFilter,
) -> String {
    let mut printer = TreePrinter {
        groups,
        explorer,
        filter,
        output: String::new(),
    };
    printer.group(groups.root_id(), 0);

    if printer.output.is_empty() {
        return "No matching elements.".to_string();
    }
    printer.output.trim_end().to_string()
}

struct TreePrinter<'a> {
    groups: &'a GroupTree,
    explorer: &'a ExplorerTree,
    filter: &'a mut TreeVisibilityFilter,
    output: String,
}

impl TreePrinter<'_> {
    fn visible(&mut self, element: TreeElement) -> bool {
        let source = ServerTree::new(self.groups, self.explorer);
        self.filter.is_visible(&source, element)
    }

    fn group(&mut self, id: Uuid, depth: usize) {
        let groups = self.groups;
        for child in groups.child_groups(id) {
            if !self.visible(TreeElement::Group(child.id)) {
                continue;
            }
            let _ = writeln!(self.output, "{:indent$}{}/", "", child.name, indent = depth * 2);
            self.group(child.id, depth + 1);
        }
        for profile in groups.group_connections(id) {
            if !self.visible(TreeElement::Profile(profile.id)) {
                continue;
            }
            let _ = writeln!(
                self.output,
                "{:indent$}{}",
                "",
                profile.display_name(),
                indent = depth * 2
            );
            if let Some(root) = self.explorer.root_for(profile.id) {
                self.node(root, depth + 1);
            }
        }
    }

    fn node(&mut self, id: NodeId, depth: usize) {
        let explorer = self.explorer;
        let Some(node) = explorer.node(id) else {
            return;
        };
        if !self.visible(TreeElement::Node(id)) {
            return;
        }
        let _ = writeln!(
            self.output,
            "{:indent$}{} [{}]",
            "",
            node.label,
            node.node_type,
            indent = depth * 2
        );
        let source = ServerTree::new(self.groups, explorer);
        for child in source.displayed_children(node) {
            self.node(child, depth + 1);
        }
    }
}

/// Recent command handler
fn cmd_recent(config: Option<&Path>, clear: bool, format: OutputFormat) -> Result<(), CliError> {
    let mut manager = open_manager(config)?;

    if clear {
        manager
            .clear_recent()
            .map_err(|e| CliError::Config(format!("Failed to clear recent connections: {e}")))?;
        println!("Cleared recent connections");
        return Ok(());
    }

    let recent = manager.recent_connections();
    print_connections(manager.tree(), &recent, format)
}

// ============================================================================
// Profiler command
// ============================================================================

/// Profiler command handler
fn cmd_profiler(
    rows: &Path,
    clauses: Vec<FilterClause>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let content = fs::read_to_string(rows)?;
    let rows: Vec<Row> = serde_json::from_str(&content)
        .map_err(|e| CliError::Profiler(format!("Failed to parse {}: {e}", rows.display())))?;

    let filter = clauses
        .into_iter()
        .fold(ProfilerFilter::new(), ProfilerFilter::with_clause);
    filter
        .validate()
        .map_err(|e| CliError::Profiler(e.to_string()))?;

    let matched = filter_data(&filter, &rows);
    match format {
        OutputFormat::Table => println!("{}", format_rows(&matched)),
        OutputFormat::Json => println!("{}", to_json(&matched)?),
    }
    Ok(())
}

/// Format event rows as a table; columns are the sorted union of fields
#[must_use]
pub fn format_rows(rows: &[&Row]) -> String {
    if rows.is_empty() {
        return "No events matched.".to_string();
    }

    let columns: Vec<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(*column))
                .map(String::len)
                .max()
                .unwrap_or(0)
                .max(column.len())
        })
        .collect();

    let mut output = String::new();
    let header: Vec<String> = columns.iter().map(|c| c.to_uppercase()).collect();
    let header: Vec<&str> = header.iter().map(String::as_str).collect();
    write_row(&mut output, &header, &widths);
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rules: Vec<&str> = rules.iter().map(String::as_str).collect();
    write_row(&mut output, &rules, &widths);
    for row in rows {
        let cells: Vec<&str> = columns
            .iter()
            .map(|column| row.get(*column).map_or("", String::as_str))
            .collect();
        write_row(&mut output, &cells, &widths);
    }

    output.trim_end().to_string()
}

fn write_row(output: &mut String, cells: &[&str], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}", width = *width))
        .collect();
    let _ = writeln!(output, "{}", padded.join("  ").trim_end());
}

// ============================================================================
// Errors
// ============================================================================

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, validation, or other failures
    pub const GENERAL_ERROR: i32 = 1;
    /// Lookup failure - the named connection or group does not exist
    pub const NOT_FOUND: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Group not found
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Group operation error
    #[error("Group error: {0}")]
    Group(String),

    /// Profiler filter error
    #[error("Profiler error: {0}")]
    Profiler(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, validation, profiler, IO)
    /// - 2: Lookup failure (connection or group not found)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionNotFound(_) | Self::GroupNotFound(_) => exit_codes::NOT_FOUND,
            Self::Config(_) | Self::Group(_) | Self::Profiler(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
