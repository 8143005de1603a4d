//! Integrity check for participant lists: reports the schema, record count,
//! blank keys and keys shared by several records.
//!
//! usage: list_check [--key <column>] <list.csv | glob>...

use anyhow::{bail, Context, Result};
use glob::glob;
use participant_registry::{
    config::DEFAULT_KEY_COLUMN,
    persist::{self, LoadOutcome},
};
use std::{env, path::PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    // 1) Arguments: optional key column, then paths or glob patterns
    let mut args: Vec<String> = env::args().skip(1).collect();
    let key_column = match args.iter().position(|a| a == "--key") {
        Some(i) if i + 1 < args.len() => {
            let key = args[i + 1].clone();
            args.drain(i..=i + 1);
            key
        }
        Some(_) => bail!("--key needs a column name"),
        None => DEFAULT_KEY_COLUMN.to_string(),
    };
    if args.is_empty() {
        bail!("usage: list_check [--key <column>] <list.csv | glob>...");
    }

    // 2) Expand patterns
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in &args {
        let matched: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("invalid pattern '{}'", pattern))?
            .filter_map(Result::ok)
            .collect();
        if matched.is_empty() {
            paths.push(PathBuf::from(pattern));
        } else {
            paths.extend(matched);
        }
    }

    // 3) Check each list
    let mut faulty = 0usize;
    for path in &paths {
        let table = match persist::load(path, &key_column)
            .with_context(|| format!("reading {}", path.display()))?
        {
            LoadOutcome::Loaded(t) => t,
            LoadOutcome::Empty(reason) => {
                warn!(path = %path.display(), ?reason, "no usable participant list");
                faulty += 1;
                continue;
            }
        };

        let columns: Vec<&str> = table.column_names().collect();
        info!(
            path = %path.display(),
            records = table.len(),
            columns = ?columns,
            "participant list"
        );

        let mut ok = true;
        if !table.has_column(&key_column) {
            warn!(path = %path.display(), "key column '{}' missing", key_column);
            ok = false;
        }
        let blank = table.all_keys().filter(|k| k.trim().is_empty()).count();
        if blank > 0 {
            warn!(path = %path.display(), blank, "records without a participant id");
            ok = false;
        }
        for (key, count) in table.duplicate_keys() {
            error!(path = %path.display(), key = %key, count, "duplicate participant id");
            ok = false;
        }
        if !ok {
            faulty += 1;
        }
    }

    if faulty > 0 {
        bail!("{} of {} participant lists have problems", faulty, paths.len());
    }
    println!("{} participant lists OK", paths.len());
    Ok(())
}
