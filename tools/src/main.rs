//! triage-runner: headless runner for the complaint triage desk.
//!
//! Usage:
//!   triage-runner --seed 42 --complaints 50 --db desk.db
//!   triage-runner --db desk.db --ipc-mode        (one JSON command per stdin line)
//!
//! IPC mode provisions the seeded roster (admin@university.edu,
//! it-support-N@..., employee-N@...) before reading commands.

use anyhow::Result;
use serde_json::{json, Value};
use std::env;
use std::io::{self, BufRead, Write};
use triage_core::{
    actor::{ActorDirectory, Role},
    allocator::AllocationMode,
    complaint::ComplaintUpdate,
    config::DeskConfig,
    engine::TriageEngine,
    error::{TriageError, TriageResult},
    query::{ComplaintFilter, Page},
    seed::{self, SeedPlan, ADMIN_IDENTITY},
    store::DeskStore,
    types::ComplaintId,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Create {
        actor: String,
        text: String,
    },
    Get {
        actor: String,
        id: ComplaintId,
    },
    List {
        actor: String,
        #[serde(default)]
        filter: ComplaintFilter,
        #[serde(default)]
        skip: Option<u64>,
        #[serde(default)]
        limit: Option<u64>,
    },
    Update {
        actor: String,
        id: ComplaintId,
        changes: Value,
    },
    Delete {
        actor: String,
        id: ComplaintId,
    },
    Classify {
        text: String,
    },
    Stats {
        actor: String,
    },
    Relationships {
        actor: String,
    },
    Trends {
        actor: String,
    },
    Words {
        actor: String,
        #[serde(default = "default_word_limit")]
        limit: usize,
    },
    Events {
        actor: String,
        id: ComplaintId,
    },
    Quit,
}

fn default_word_limit() -> usize {
    30
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let plan = SeedPlan {
        seed: parse_arg(&args, "--seed", 42u64),
        support: parse_arg(&args, "--support", 10usize),
        employees: parse_arg(&args, "--employees", 20usize),
        complaints: parse_arg(&args, "--complaints", 50usize),
        ..SeedPlan::default()
    };
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    let mut config = DeskConfig::load(data_dir)?;
    if let Some(mode) = string_arg(&args, "--allocation") {
        config = config.with_allocation_mode(match mode {
            "sequence" => AllocationMode::Sequence,
            "live_count" => AllocationMode::LiveCount,
            other => anyhow::bail!("unknown allocation mode '{other}' (live_count | sequence)"),
        });
    }

    if !ipc_mode {
        println!("Complaint Triage Desk: triage-runner");
        println!("  seed:        {}", plan.seed);
        println!("  support:     {}", plan.support);
        println!("  employees:   {}", plan.employees);
        println!("  complaints:  {}", plan.complaints);
        println!("  db:          {db}");
        println!("  data_dir:    {data_dir}");
        println!("  allocation:  {:?}", config.allocation_mode);
        println!();
    }

    let store = if db == ":memory:" {
        DeskStore::in_memory()?
    } else {
        DeskStore::open(db)?
    };
    store.migrate()?;
    let engine = TriageEngine::build(store, config);

    if ipc_mode {
        let stdin = io::stdin();
        run_ipc_session(&engine, &plan, stdin.lock(), io::stdout())?;
    } else {
        let started = chrono::Utc::now();
        let report = seed::seed_desk(&engine, &plan)?;
        let elapsed = chrono::Utc::now() - started;
        print_summary(&engine, &report, elapsed.num_milliseconds())?;
    }

    Ok(())
}

/// Provision the roster, then serve commands until EOF or `quit`.
fn run_ipc_session(
    engine: &TriageEngine,
    plan: &SeedPlan,
    input: impl BufRead,
    output: impl Write,
) -> Result<()> {
    // Commands are bound to actor identities, so the roster must exist.
    let added = seed::seed_actors(engine, plan)?;
    log::info!("ipc: roster ready ({added} actors added)");
    run_ipc_loop(engine, input, output)
}

fn run_ipc_loop(engine: &TriageEngine, mut handle: impl BufRead, mut stdout: impl Write) -> Result<()> {
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = json!({ "error": { "kind": "invalid_command", "message": e.to_string() } });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };
        let response = match handle_command(engine, cmd) {
            Ok(None) => break,
            Ok(Some(value)) => json!({ "ok": value }),
            Err(e) => {
                log::debug!("command failed: {e}");
                json!({ "error": { "kind": e.kind(), "message": e.to_string() } })
            }
        };
        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

/// `Ok(None)` ends the session.
fn handle_command(engine: &TriageEngine, cmd: IpcCommand) -> TriageResult<Option<Value>> {
    let value = match cmd {
        IpcCommand::Create { actor, text } => to_json(engine.create_complaint(&text, &actor)?)?,
        IpcCommand::Get { actor, id } => to_json(engine.get_complaint(id, &actor)?)?,
        IpcCommand::List { actor, filter, skip, limit } => {
            let page = match (skip, limit) {
                (None, None) => None,
                (skip, limit) => Some(Page::new(
                    skip.unwrap_or(0),
                    limit.unwrap_or(engine.config().default_page_limit),
                )),
            };
            to_json(engine.list_complaints(&actor, &filter, page)?)?
        }
        IpcCommand::Update { actor, id, changes } => {
            let changes = ComplaintUpdate::from_json(changes)?;
            to_json(engine.update_complaint(id, &actor, &changes)?)?
        }
        IpcCommand::Delete { actor, id } => {
            engine.delete_complaint(id, &actor)?;
            json!({ "deleted": id })
        }
        IpcCommand::Classify { text } => to_json(engine.classify_text(&text)?)?,
        IpcCommand::Stats { actor } => to_json(engine.basic_stats(&actor)?)?,
        IpcCommand::Relationships { actor } => to_json(engine.category_relationships(&actor)?)?,
        IpcCommand::Trends { actor } => to_json(engine.time_trends(&actor)?)?,
        IpcCommand::Words { actor, limit } => to_json(engine.word_frequency(&actor, limit)?)?,
        IpcCommand::Events { actor, id } => {
            let events = engine
                .complaint_events(id, &actor)?
                .iter()
                .map(|e| e.decode())
                .collect::<Result<Vec<_>, _>>()?;
            to_json(events)?
        }
        IpcCommand::Quit => return Ok(None),
    };
    Ok(Some(value))
}

fn to_json<T: serde::Serialize>(value: T) -> TriageResult<Value> {
    serde_json::to_value(value).map_err(TriageError::from)
}

fn print_summary(engine: &TriageEngine, report: &seed::SeedReport, elapsed_ms: i64) -> Result<()> {
    let stats = engine.basic_stats(ADMIN_IDENTITY)?;

    println!("=== SEED SUMMARY ===");
    println!("  actors added:     {}", report.actors_added);
    println!("  complaints filed: {}", report.complaints_filed);
    println!("  status changes:   {}", report.status_changes);
    println!("  elapsed:          {elapsed_ms} ms");
    println!("  total in store:   {}", stats.total_complaints);
    println!("  assigned rate:    {:.1}%", stats.assigned_rate);
    println!("  response rate:    {:.1}%", stats.response_rate);

    println!();
    println!("=== BY STATUS ===");
    for (status, n) in &stats.by_status {
        println!("  {status:<24} {n}");
    }

    println!();
    println!("=== BY CATEGORY ===");
    for (category, n) in &stats.by_category {
        println!("  {category:<24} {n}");
    }

    println!();
    println!("=== SUPPORT LOAD ===");
    let roster = engine.store().list_active_actors_by_role(Role::Support)?;
    if roster.is_empty() {
        println!("  (no active support actors, complaints went to the placeholder)");
    }
    for actor in roster {
        let filter = ComplaintFilter::default().assigned_to(actor.email.clone());
        let load = engine.list_complaints(ADMIN_IDENTITY, &filter, Some(Page::new(0, 0)))?;
        println!("  {:<32} {}", actor.email, load.total);
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(lines: &[Value]) -> Vec<Value> {
        let store = DeskStore::in_memory().unwrap();
        store.migrate().unwrap();
        let engine = TriageEngine::build(store, DeskConfig::default_test());
        let plan = SeedPlan {
            support: 2,
            employees: 2,
            ..SeedPlan::default()
        };
        let input: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let mut output = Vec::new();
        run_ipc_session(&engine, &plan, Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn ipc_session_serves_the_seeded_roster() {
        let replies = session(&[
            json!({"type": "create", "actor": "employee-1@university.edu", "text": "The printer is broken again"}),
            json!({"type": "list", "actor": "it-support-1@university.edu"}),
            json!({"type": "stats", "actor": ADMIN_IDENTITY}),
        ]);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["ok"]["assignedTo"], "it-support-1@university.edu");
        assert_eq!(replies[1]["ok"]["total"], 1);
        assert_eq!(replies[2]["ok"]["totalComplaints"], 1);
    }

    #[test]
    fn quit_ends_the_session() {
        let replies = session(&[
            json!({"type": "classify", "text": "The wifi keeps dropping"}),
            json!({"type": "quit"}),
            json!({"type": "stats", "actor": ADMIN_IDENTITY}),
        ]);
        assert_eq!(replies.len(), 1, "nothing after quit is answered");
        assert_eq!(replies[0]["ok"]["category"], "IT Support");
    }

    #[test]
    fn errors_carry_their_kind() {
        let replies = session(&[
            json!({"type": "get", "actor": "nobody@x", "id": 1}),
            json!({"type": "teleport"}),
            json!({"type": "words", "actor": ADMIN_IDENTITY}),
        ]);
        assert_eq!(replies[0]["error"]["kind"], "not_found");
        assert_eq!(replies[1]["error"]["kind"], "invalid_command");
        assert_eq!(replies[2]["ok"], json!([]));
    }
}
