//! `worm` - play worm puzzles from a terminal.
//!
//! One command per invocation, or `worm repl` to keep sessions alive while
//! reading commands from stdin.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use scriptcli::{
    ActionTable, ArgumentSpec, CommandBuilder, CommandTree, Invocation, OptionSpec, Outcome,
    Terminal, ValueType, complete, infer_all, render_help, run_program,
};
use tracing_subscriber::EnvFilter;
use worm::{GuessField, SessionId, SessionOwner, SystemClock, TokioScheduler, WormApi, WormConfig};

const CONFIG_ENV: &str = "WORM_CONFIG";

struct App {
    api: WormApi,
    tree: CommandTree,
    runtime: tokio::runtime::Runtime,
    repl_requested: bool,
}

impl Terminal for App {
    fn print(&mut self, message: &str) {
        println!("{message}");
    }

    fn error(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

fn command_tree() -> anyhow::Result<CommandTree> {
    let id = || ArgumentSpec::new("id", ValueType::Number).description("Session id");
    let tree = CommandBuilder::new("worm")
        .name("worm")
        .version(env!("CARGO_PKG_VERSION"))
        .description("Test hidden automata and guess their properties.")
        .action("usage")
        .command(|c| {
            c.name("create")
                .description("Start a new session")
                .option(
                    OptionSpec::new("pid", ValueType::Number)
                        .description("Owning process; the session ends with it"),
                )
                .action("create")
        })
        .command(|c| c.name("list").description("List unsolved sessions").action("list"))
        .command(|c| {
            c.name("show")
                .description("Print a session as JSON")
                .argument(id())
                .action("show")
        })
        .command(|c| {
            c.name("test")
                .description("Walk an input from the start state (-t sets threads)")
                .argument(id())
                .argument(ArgumentSpec::new("input", ValueType::String))
                .action("test")
        })
        .command(|c| {
            c.name("guess")
                .description("Set one field of a guess")
                .action("usage")
                .command(|c| {
                    c.name("path")
                        .argument(id())
                        .argument(ArgumentSpec::new("path", ValueType::String))
                        .action("guess-path")
                })
                .command(|c| {
                    c.name("bipartite")
                        .argument(id())
                        .argument(ArgumentSpec::new("bipartite", ValueType::Boolean))
                        .action("guess-bipartite")
                })
                .command(|c| {
                    c.name("value")
                        .argument(id())
                        .argument(ArgumentSpec::new("value", ValueType::Number))
                        .action("guess-value")
                })
                .command(|c| {
                    c.name("indegree")
                        .argument(id())
                        .argument(ArgumentSpec::new("indegree", ValueType::Number))
                        .action("guess-indegree")
                })
                .command(|c| {
                    c.name("dfs")
                        .argument(id())
                        .argument(ArgumentSpec::new("state", ValueType::String))
                        .action("guess-dfs")
                })
        })
        .command(|c| {
            c.name("solve")
                .description("Submit the guess and collect the reward")
                .argument(id())
                .action("solve")
        })
        .command(|c| c.name("history").description("List finished sessions").action("history"))
        .command(|c| {
            c.name("sweep")
                .description("End process-owned sessions whose pid is not in the alive list")
                .argument(
                    ArgumentSpec::new("alive", ValueType::String)
                        .description("Comma separated pids still running"),
                )
                .action("sweep")
        })
        .command(|c| {
            c.name("bonus")
                .description("Inspect or pick the active bonus")
                .action("usage")
                .command(|c| {
                    c.name("set")
                        .argument(ArgumentSpec::new("id", ValueType::Number))
                        .action("bonus-set")
                })
                .command(|c| c.name("show").action("bonus-show"))
        })
        .command(|c| {
            c.name("complete")
                .description("Suggest the next word of a command line")
                .argument(ArgumentSpec::new("line", ValueType::String))
                .action("complete")
        })
        .command(|c| {
            c.name("repl")
                .description("Read commands from stdin, one per line")
                .action("repl")
        })
        .build()?;
    Ok(tree)
}

fn action_table() -> ActionTable<App> {
    ActionTable::new()
        .on("usage", usage)
        .on("create", create)
        .on("list", list)
        .on("show", show)
        .on("test", test_input)
        .on("guess-path", |app: &mut App, inv: &Invocation| {
            let path = inv.arg_str(1).unwrap_or_default().to_string();
            set_guess(app, inv, GuessField::Path(path))
        })
        .on("guess-bipartite", |app: &mut App, inv: &Invocation| {
            let bipartite = inv.arg_bool(1).unwrap_or(false);
            set_guess(app, inv, GuessField::Bipartite(bipartite))
        })
        .on("guess-value", |app: &mut App, inv: &Invocation| {
            let value = integer_arg(inv, 1, "value")?;
            set_guess(app, inv, GuessField::Value(value))
        })
        .on("guess-indegree", |app: &mut App, inv: &Invocation| {
            let indegree = integer_arg(inv, 1, "indegree")?;
            set_guess(app, inv, GuessField::Indegree(indegree))
        })
        .on("guess-dfs", |app: &mut App, inv: &Invocation| {
            let state = inv.arg_str(1).unwrap_or_default().to_string();
            set_guess(app, inv, GuessField::DfsState(state))
        })
        .on("solve", solve)
        .on("history", history)
        .on("sweep", sweep)
        .on("bonus-set", bonus_set)
        .on("bonus-show", bonus_show)
        .on("complete", complete_line)
        .on("repl", |app: &mut App, _: &Invocation| {
            app.repl_requested = true;
            Ok(())
        })
}

fn integer_arg(inv: &Invocation, index: usize, name: &str) -> anyhow::Result<i64> {
    let Some(n) = inv.arg_number(index) else {
        bail!("missing {name}");
    };
    if n.fract() != 0.0 {
        bail!("{name} must be a whole number, got {n}");
    }
    Ok(n as i64)
}

fn session_id(inv: &Invocation) -> anyhow::Result<SessionId> {
    let id = integer_arg(inv, 0, "session id")?;
    let id = u64::try_from(id).context("session id must not be negative")?;
    Ok(SessionId(id))
}

fn usage(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let text = render_help(&app.tree, inv.command);
    app.print(&text);
    Ok(())
}

fn create(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let owner = match inv.option_number("pid") {
        Some(pid) => SessionOwner::Process(u32::try_from(pid as i64).context("invalid pid")?),
        None => SessionOwner::Manual,
    };
    match app.api.create_session(owner)? {
        Some(id) => app.print(&id.to_string()),
        None => app.error("No session created: cooldown running or session limit reached"),
    }
    Ok(())
}

fn list(app: &mut App, _: &Invocation) -> anyhow::Result<()> {
    let ids = app.api.unsolved_sessions();
    if ids.is_empty() {
        app.print("No active sessions");
    }
    for id in ids {
        let states = app.api.session_states(id)?.len();
        let symbols = app.api.session_symbols(id)?.len();
        app.print(&format!("{id}\t{states} states\t{symbols} symbols"));
    }
    Ok(())
}

fn show(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let id = session_id(inv)?;
    let snapshot = match app.api.session_snapshot(id) {
        Ok(snapshot) => snapshot,
        Err(_) => app.api.finished_session(id)?,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;
    app.print(&json);
    Ok(())
}

fn test_input(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let id = session_id(inv)?;
    let input = inv.arg_str(1).unwrap_or_default();
    let threads = inv
        .reserved
        .iter()
        .find(|(flag, _)| flag == "-t")
        .and_then(|(_, value)| value.as_ref()?.as_number())
        .map_or(1, |t| t.max(1.0) as u32);

    let state = app.runtime.block_on(app.api.test_input(id, input, threads))?;
    app.print(&state);
    Ok(())
}

fn set_guess(app: &mut App, inv: &Invocation, field: GuessField) -> anyhow::Result<()> {
    let id = session_id(inv)?;
    app.api.set_guess(id, field)?;
    Ok(())
}

fn solve(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let id = session_id(inv)?;
    let reward = app.api.solve_session(id)?;
    app.print(&format!("Reward: {reward:.3}"));
    Ok(())
}

fn history(app: &mut App, _: &Invocation) -> anyhow::Result<()> {
    let ids = app.api.finished_sessions();
    if ids.is_empty() {
        app.print("No finished sessions");
    }
    for id in ids {
        let snapshot = app.api.finished_session(id)?;
        let reward = snapshot.reward.unwrap_or(0.0);
        app.print(&format!("{id}\t{reward:.3}\t{} tests", snapshot.tests_done));
    }
    Ok(())
}

fn sweep(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let list = inv.arg_str(0).unwrap_or_default();
    let alive = list
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|pid| !pid.is_empty())
        .map(|pid| pid.parse::<u32>().with_context(|| format!("invalid pid '{pid}'")))
        .collect::<anyhow::Result<HashSet<u32>>>()?;

    let ended = app.api.remove_idle_sessions(&alive);
    if ended.is_empty() {
        app.print("No sessions ended");
    }
    for id in ended {
        app.print(&format!("ended {id}"));
    }
    Ok(())
}

fn bonus_set(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let id = integer_arg(inv, 0, "bonus id")?;
    app.api
        .set_bonus(u32::try_from(id).context("bonus id must not be negative")?)?;
    bonus_show(app, inv)
}

fn bonus_show(app: &mut App, _: &Invocation) -> anyhow::Result<()> {
    let worm = app.api.worm();
    let effect = worm.bonus_effect();
    let text = format!(
        "{} (#{}): {}\nCompletions: {:.3}",
        worm.bonus.name,
        worm.bonus.id,
        worm.bonus.describe(effect),
        worm.completions
    );
    app.print(&text);
    Ok(())
}

fn complete_line(app: &mut App, inv: &Invocation) -> anyhow::Result<()> {
    let line = inv.arg_str(0).unwrap_or_default();
    let words: Vec<&str> = line.split_whitespace().collect();
    let suggestions = complete(&app.tree, &infer_all(&words));
    app.print(&suggestions.join("\n"));
    Ok(())
}

fn repl(app: &mut App, actions: &ActionTable<App>) -> anyhow::Result<()> {
    let tree = app.tree.clone();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first() {
            None => continue,
            Some(&("exit" | "quit")) => break,
            Some(&"repl") => {
                app.error("already in repl");
                continue;
            }
            Some(_) => {}
        }
        if let Err(e) = run_program(&tree, actions, &words, app) {
            app.error(&e.to_string());
        }
    }
    Ok(())
}

fn load_config() -> WormConfig {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => WormConfig::load_from_path(&PathBuf::from(path)),
        None => WormConfig::load(&std::env::current_dir().unwrap_or_default()),
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let tree = command_tree()?;
    let actions = action_table();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start runtime")?;
    let api = WormApi::new(load_config(), Arc::new(SystemClock), Arc::new(TokioScheduler));
    let mut app = App {
        api,
        tree: tree.clone(),
        runtime,
        repl_requested: false,
    };

    let outcome = run_program(&tree, &actions, &args, &mut app)?;
    if app.repl_requested {
        repl(&mut app, &actions)?;
    }

    Ok(match outcome {
        Outcome::Rejected(_) => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("worm: {e:#}");
            ExitCode::FAILURE
        }
    }
}
