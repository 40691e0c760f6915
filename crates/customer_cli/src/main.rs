//! Command-line front end for the customer core.
//!
//! # Responsibility
//! - Map one command line onto one `CustomerService` call.
//! - Render the outcome as a single JSON document with an HTTP-equivalent
//!   status code.
//!
//! # Invariants
//! - Exit code is 0 exactly when `status` is 2xx.

use clap::{Args, Parser, Subcommand};
use customer_core::db::open_store;
use customer_core::{
    core_version, dao_for, default_log_level, init_logging, BackendKind, CoreConfig,
    CustomerDao, CustomerId, CustomerRegistrationRequest, CustomerService, CustomerUpdateRequest,
    ServiceError,
};
use log::info;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

/// Customer records over a local SQLite store.
#[derive(Parser, Debug)]
#[command(name = "customer", version, about = "Customer CRUD over SQLite")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

/// Store and logging options shared by every subcommand.
#[derive(Args, Debug)]
struct StoreArgs {
    /// SQLite database file; an in-memory store is used when omitted.
    #[arg(long, global = true, env = "CUSTOMER_DB")]
    db: Option<PathBuf>,

    /// DAO backend: direct-sql or mapped.
    #[arg(
        long,
        global = true,
        env = "CUSTOMER_BACKEND",
        default_value = "direct-sql",
        value_parser = parse_backend
    )]
    backend: BackendKind,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "CUSTOMER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging stays off when unset.
    #[arg(long, global = true, env = "CUSTOMER_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Customer(CustomerCommand),
    /// Print the core version.
    Version,
}

/// Subcommands that run against the customer store.
#[derive(Subcommand, Debug)]
enum CustomerCommand {
    /// List every customer.
    List,
    /// Show one customer.
    Get { id: CustomerId },
    /// Register a new customer.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        age: Option<i32>,
    },
    /// Apply a sparse update; omitted fields keep their stored value.
    Update {
        id: CustomerId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        age: Option<i32>,
    },
    /// Delete one customer.
    Delete { id: CustomerId },
}

impl CustomerCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get { .. } => "get",
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

fn parse_backend(value: &str) -> Result<BackendKind, String> {
    value.parse().map_err(|err| format!("{err}"))
}

/// JSON document printed for every invocation.
#[derive(Debug, Serialize, PartialEq)]
struct Outcome {
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<CustomerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Outcome {
    fn ok(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            location: None,
            body,
            error: None,
        }
    }

    fn failed(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: None,
            error: Some(message.into()),
        }
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<ServiceError> for Outcome {
    fn from(err: ServiceError) -> Self {
        Self::failed(err.http_status(), err.to_string())
    }
}

fn to_body(value: impl Serialize) -> Outcome {
    match serde_json::to_value(value) {
        Ok(body) => Outcome::ok(200, Some(body)),
        Err(err) => Outcome::failed(500, format!("failed to encode response: {err}")),
    }
}

fn config_from(args: StoreArgs) -> Result<CoreConfig, Outcome> {
    CoreConfig {
        backend: args.backend,
        db_path: args.db,
        log_level: args
            .log_level
            .unwrap_or_else(|| default_log_level().to_string()),
        log_dir: args.log_dir,
    }
    .validate()
    .map_err(|err| Outcome::failed(400, err.to_string()))
}

fn start_logging(config: &CoreConfig) -> Result<(), Outcome> {
    let Some(dir) = &config.log_dir else {
        return Ok(());
    };
    // `validate` has already rejected non UTF-8 directories.
    let dir = dir.to_string_lossy();
    init_logging(&config.log_level, &dir).map_err(|err| Outcome::failed(500, err))
}

fn run(cli: Cli) -> Outcome {
    let command = match cli.command {
        Command::Customer(command) => command,
        Command::Version => {
            return Outcome::ok(200, Some(json!({ "core_version": core_version() })))
        }
    };

    let config = match config_from(cli.store) {
        Ok(config) => config,
        Err(outcome) => return outcome,
    };
    if let Err(outcome) = start_logging(&config) {
        return outcome;
    }

    let conn = match open_store(&config) {
        Ok(conn) => conn,
        Err(err) => return Outcome::failed(500, format!("failed to open store: {err}")),
    };
    let dao = match dao_for(config.backend, &conn) {
        Ok(dao) => dao,
        Err(err) => return Outcome::failed(500, err.to_string()),
    };
    let service = CustomerService::new(dao);

    info!(
        "event=cli_command module=cli status=start command={} backend={}",
        command.name(),
        config.backend
    );
    dispatch(&service, command)
}

fn dispatch<D: CustomerDao>(
    service: &CustomerService<D>,
    command: CustomerCommand,
) -> Outcome {
    let result = match command {
        CustomerCommand::List => service.find_all_customers().map(to_body),
        CustomerCommand::Get { id } => service.find_customer_by_id(id).map(to_body),
        CustomerCommand::Create { name, email, age } => service
            .save_customer(CustomerRegistrationRequest::new(name, email, age))
            .map(|customer| {
                let mut outcome = to_body(&customer);
                if outcome.is_success() {
                    outcome.status = 201;
                    outcome.location = Some(customer.id);
                }
                outcome
            }),
        CustomerCommand::Update {
            id,
            name,
            email,
            age,
        } => {
            let patch = CustomerUpdateRequest { name, email, age };
            service.update_customer(id, patch).map(to_body)
        }
        CustomerCommand::Delete { id } => service
            .delete_customer(id)
            .map(|()| Outcome::ok(204, None)),
    };
    result.unwrap_or_else(Outcome::from)
}

fn main() -> ExitCode {
    let outcome = run(Cli::parse());
    match serde_json::to_string_pretty(&outcome) {
        Ok(document) => println!("{document}"),
        Err(err) => eprintln!("failed to render outcome: {err}"),
    }
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, run, Cli, Command, CustomerCommand, Outcome};
    use clap::Parser;
    use customer_core::db::open_db_in_memory;
    use customer_core::{dao_for, BackendKind, CustomerService};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["customer"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = parse(&["get", "7", "--backend", "mapped"]);
        assert_eq!(cli.store.backend, BackendKind::Mapped);
        assert!(matches!(
            cli.command,
            Command::Customer(CustomerCommand::Get { id: 7 })
        ));
    }

    #[test]
    fn rejects_unknown_backend() {
        let parsed = Cli::try_parse_from(["customer", "--backend", "mongo", "list"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn create_reports_created_with_location() {
        let outcome = run(parse(&[
            "create", "--name", "Ada", "--email", "ada@x.com", "--age", "30",
        ]));
        assert_eq!(outcome.status, 201);
        assert_eq!(outcome.location, Some(1));
        assert_eq!(outcome.body.unwrap()["email"], "ada@x.com");
    }

    #[test]
    fn version_answers_without_opening_a_store() {
        let outcome = run(parse(&["version", "--log-level", "loud"]));
        assert_eq!(outcome.status, 200);
        assert!(outcome.body.unwrap()["core_version"].is_string());
    }

    #[test]
    fn create_without_age_stores_default_age() {
        let outcome = run(parse(&["create", "--name", "Ada", "--email", "ada@x.com"]));
        assert_eq!(outcome.status, 201);
        assert_eq!(outcome.body.unwrap()["age"], 0);
    }

    #[test]
    fn get_on_fresh_store_is_not_found() {
        let outcome = run(parse(&["get", "1"]));
        assert_eq!(
            outcome,
            Outcome::failed(404, "Customer with id = [1] not found")
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn invalid_log_level_is_a_bad_request() {
        let outcome = run(parse(&["list", "--log-level", "loud"]));
        assert_eq!(outcome.status, 400);
    }

    #[test]
    fn dispatch_walks_a_full_lifecycle() {
        let conn = open_db_in_memory().unwrap();
        let service = CustomerService::new(dao_for(BackendKind::DirectSql, &conn).unwrap());

        let created = dispatch(
            &service,
            CustomerCommand::Create {
                name: "Ada".to_string(),
                email: "ada@x.com".to_string(),
                age: Some(30),
            },
        );
        let id = created.location.unwrap();

        let unchanged = dispatch(
            &service,
            CustomerCommand::Update {
                id,
                name: None,
                email: Some("ada@x.com".to_string()),
                age: None,
            },
        );
        assert_eq!(unchanged, Outcome::failed(400, "No changes found"));

        let aged = dispatch(
            &service,
            CustomerCommand::Update {
                id,
                name: None,
                email: None,
                age: Some(31),
            },
        );
        assert_eq!(aged.body.unwrap()["age"], 31);

        assert_eq!(dispatch(&service, CustomerCommand::Delete { id }).status, 204);
        assert_eq!(dispatch(&service, CustomerCommand::Delete { id }).status, 404);
        assert_eq!(
            dispatch(&service, CustomerCommand::List).body.unwrap(),
            serde_json::json!([])
        );
    }
}
