/// Command-line bridge to the Cockpit backend.
/// Runs one named command over the loopback HTTP bridge and prints the JSON result,
/// for scripting and for poking at the backend without the desktop UI.
use anyhow::{bail, Context};
use cockpit_client::config::load_client_config;
use cockpit_client::{logging, HttpTransport, Invoker};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

const USAGE: &str = "usage: cockpit-invoke <command> [json-input]\n       cockpit-invoke --list";

lazy_static! {
    static ref COMMAND_NAME: Regex = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}

// --- Known commands ---

/// Commands the client crate wraps, with their input shape.
const COMMANDS: &[(&str, &str)] = &[
    ("list_ideas", "-"),
    ("get_idea", "{id}"),
    ("create_idea", "{title, summary?, status?, priority?, target?}"),
    ("update_idea_metadata", "{id, title?, summary?, status?, priority?, target?}"),
    ("archive_idea", "{id}"),
    ("delete_idea", "{id}"),
    ("list_writings", "{ideaId?}"),
    ("get_writing", "{id}"),
    ("create_writing", "{title, ideaId?, writingType?}"),
    ("save_writing_draft", "{writingId, contentJson}"),
    ("publish_writing", "{id}"),
    ("list_news_articles", "{status?, limit?, offset?, search?, sourceId?, starred?, startDate?, endDate?, sortBy?}"),
    ("get_news_article", "{id}"),
    ("toggle_star_news_article", "{id, starred}"),
    ("update_news_article_status", "{id, status}"),
    ("delete_news_article", "{id}"),
    ("list_feed_sources", "-"),
    ("create_feed_source", "{name, url, sourceType?, fetchIntervalMinutes?, enabled?}"),
    ("update_feed_source", "{id, name?, url?, fetchIntervalMinutes?, enabled?}"),
    ("delete_feed_source", "{id}"),
    ("toggle_feed_source", "{id, enabled}"),
    ("sync_feed_source_now", "{sourceId}"),
    ("sync_all_feed_sources", "-"),
    ("get_storage_statistics", "-"),
    ("list_database_backups", "-"),
    ("create_database_backup", "-"),
    ("restore_database_from_backup", "{backupPath}"),
    ("delete_database_backup", "{backupPath}"),
    ("export_database", "-"),
    ("import_database", "{importPath}"),
    ("get_application_logs", "{level?, module?, search?, startDate?, endDate?, limit?, offset?}"),
    ("get_application_log_stats", "-"),
    ("clear_application_logs", "{olderThanDays?}"),
    ("get_app_settings", "-"),
    ("update_settings", "[{key, value}]"),
    ("check_setup_status_command", "-"),
    ("list_system_tasks", "{taskType?}"),
    ("run_system_task_now", "{taskType}"),
    ("update_system_task", "{id, enabled?, cronExpression?, config?}"),
    ("list_task_runs", "{taskId?, limit?}"),
];

#[derive(Debug, PartialEq)]
enum Request {
    List,
    Invoke { command: String, input: Option<Value> },
}

fn parse_args(args: &[String]) -> anyhow::Result<Request> {
    match args {
        [flag] if flag == "--list" => Ok(Request::List),
        [command] => Ok(Request::Invoke {
            command: checked_command(command)?,
            input: None,
        }),
        [command, input] => {
            let input: Value = serde_json::from_str(input)
                .with_context(|| format!("input for {command} is not valid JSON"))?;
            Ok(Request::Invoke {
                command: checked_command(command)?,
                input: Some(input),
            })
        }
        _ => bail!("{USAGE}"),
    }
}

fn checked_command(command: &str) -> anyhow::Result<String> {
    if !COMMAND_NAME.is_match(command) {
        bail!("invalid command name: {command:?}");
    }
    if !COMMANDS.iter().any(|(name, _)| *name == command) {
        tracing::warn!(command, "command is not one the client knows, sending anyway");
    }
    Ok(command.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, input) = match parse_args(&args)? {
        Request::List => {
            for (name, shape) in COMMANDS {
                println!("{name:<32} {shape}");
            }
            return Ok(());
        }
        Request::Invoke { command, input } => (command, input),
    };

    let config = load_client_config();
    tracing::debug!(endpoint = %config.endpoint, "using backend");
    let invoker = Invoker::new(Arc::new(HttpTransport::from_config(&config)));

    let result: Value = match &input {
        Some(input) => invoker.invoke_with(&command, input).await,
        None => invoker.invoke(&command).await,
    }
    .with_context(|| format!("{command} failed (backend at {})", config.endpoint))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command_without_input() {
        assert_eq!(
            parse_args(&args(&["list_ideas"])).unwrap(),
            Request::Invoke {
                command: "list_ideas".into(),
                input: None
            }
        );
    }

    #[test]
    fn test_parse_command_with_json_input() {
        assert_eq!(
            parse_args(&args(&["get_idea", r#"{"id": 3}"#])).unwrap(),
            Request::Invoke {
                command: "get_idea".into(),
                input: Some(json!({"id": 3}))
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["get_idea", "{id:"])).is_err());
        assert!(parse_args(&args(&["../admin"])).is_err());
        assert!(parse_args(&args(&["a", "{}", "extra"])).is_err());
        assert_eq!(parse_args(&args(&["--list"])).unwrap(), Request::List);
    }

    #[test]
    fn test_command_table_names_are_valid() {
        for (name, _) in COMMANDS {
            assert!(COMMAND_NAME.is_match(name), "{name}");
        }
    }
}
