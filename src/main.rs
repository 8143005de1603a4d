use anyhow::{anyhow, bail, Context, Result};
use participant_registry::{
    surface::{
        DirectoryPicker, MemoryForm, MemorySelection, RecordingNotifier, SelectionSurface,
        Surfaces,
    },
    ParticipantRegistry, RegistryConfig, SessionState,
};
use std::{
    env,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "\
usage: participant-registry [--config <file.yaml>] <list.csv | folder> <command> [args]

commands:
  keys                              list participant ids
  show <ppid>                       print a participant as JSON
  set <ppid> <field> <value>        change one field and write the list
  add <field=value>...              add a participant
  edit <ppid> <field=value>...      change a participant through the form";

struct Console {
    form: MemoryForm,
    selection: MemorySelection,
    notifier: RecordingNotifier,
}

impl Console {
    fn ui(&mut self) -> Surfaces<'_> {
        Surfaces {
            form: &mut self.form,
            selection: &mut self.selection,
            notifier: &mut self.notifier,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // ─── 2) parse arguments ──────────────────────────────────────────
    let mut args: Vec<String> = env::args().skip(1).collect();
    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow!("--config needs a file\n{}", USAGE))?;
            args.drain(i..=i + 1);
            RegistryConfig::from_yaml_file(&path)?
        }
        None => RegistryConfig::default(),
    };
    if args.len() < 2 {
        bail!(USAGE);
    }
    let target = PathBuf::from(&args[0]);
    let command = args[1].as_str();
    let rest = &args[2..];

    // ─── 3) open the participant list ────────────────────────────────
    let defaults = config
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.default.clone()));
    let mut console = Console {
        form: MemoryForm::with_defaults(defaults),
        selection: MemorySelection::new(),
        notifier: RecordingNotifier::new(),
    };
    let mut registry = ParticipantRegistry::new(config);
    registry.init(&mut console.ui());

    let state = open_list(&mut registry, &target, &mut console).await?;
    if state == SessionState::NeedsBootstrap {
        bootstrap_if_confirmed(&mut registry, &mut console)?;
    }

    // ─── 4) run the command ──────────────────────────────────────────
    match command {
        "keys" => {
            for key in registry.keys() {
                println!("{}", key);
            }
        }
        "show" => {
            let ppid = rest.first().ok_or_else(|| anyhow!(USAGE))?;
            registry.select_participant(ppid, &mut console.form)?;
            println!("{}", serde_json::to_string_pretty(&console.form.values)?);
        }
        "set" => {
            let [ppid, field, value] = rest else {
                bail!(USAGE);
            };
            registry.update_field(ppid, field, value)?;
            registry.commit()?;
            info!(ppid = %ppid, field = %field, "field updated");
        }
        "add" => {
            console.selection.select_new();
            console.form.fill(parse_assignments(rest)?);
            let ppid = registry.finish(&mut console.ui())?;
            println!("{}", ppid);
        }
        "edit" => {
            let (ppid, assignments) = rest.split_first().ok_or_else(|| anyhow!(USAGE))?;
            registry.select_participant(ppid, &mut console.form)?;
            console.selection.select(ppid.clone());
            console.form.fill(parse_assignments(assignments)?);
            let ppid = registry.finish(&mut console.ui())?;
            if let Some(details) = registry.participant_details() {
                println!("{}", serde_json::to_string_pretty(details)?);
            }
            info!(ppid = %ppid, "participant updated");
        }
        other => bail!("unknown command `{}`\n{}", other, USAGE),
    }
    Ok(())
}

/// A folder goes through the directory picker, anything else is taken as the list path.
async fn open_list(
    registry: &mut ParticipantRegistry,
    target: &Path,
    console: &mut Console,
) -> Result<SessionState> {
    if target.is_dir() {
        registry.set_current_folder(target);
        let mut ui = console.ui();
        let picked = registry.select_list(&DirectoryPicker, &mut ui).await?;
        if let Some(state) = picked {
            return Ok(state);
        }
        warn!("no participant list in {}", target.display());
        let created = registry.create_list(&DirectoryPicker, &mut ui).await?;
        return created.ok_or_else(|| anyhow!("no list path chosen in {}", target.display()));
    }
    registry
        .check_set_list(target, &mut console.ui())
        .with_context(|| format!("loading {}", target.display()))
}

fn bootstrap_if_confirmed(registry: &mut ParticipantRegistry, console: &mut Console) -> Result<()> {
    let notice = console
        .notifier
        .last()
        .cloned()
        .ok_or_else(|| anyhow!("participant list is unusable"))?;
    eprintln!("{}", notice.message);
    eprint!("Create it? [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if !answer.trim().eq_ignore_ascii_case("y") {
        bail!("no participant list; nothing done");
    }

    let action = notice
        .on_confirm
        .ok_or_else(|| anyhow!("notice has nothing to confirm"))?;
    registry.confirm(action, &mut console.ui())?;
    Ok(())
}

fn parse_assignments(items: &[String]) -> Result<Vec<(String, String)>> {
    items
        .iter()
        .map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("expected field=value, got `{}`", item))
        })
        .collect()
}
