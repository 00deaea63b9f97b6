//! `rivd-migrate`: upgrades a legacy consensus database in place.

use std::path::PathBuf;

use rivd_chainstate::{ConsensusDb, MigrationReport, Section};
use rivd_consensus::CONSENSUS_DB_VERSION;
use rivd_log::log_info;
use rivd_storage::fjall::FjallStore;
use serde_json::json;

use crate::config::{default_data_dir, NodeConfig, CONF_FILE_NAME};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MigrateArgs {
    pub data_dir: Option<PathBuf>,
    pub conf_path: Option<PathBuf>,
    pub json: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MigrateAction {
    PrintHelp,
    Run(MigrateArgs),
}

pub fn usage() -> String {
    [
        "Usage:",
        "  rivd-migrate [options]",
        "",
        "Upgrades the consensus database under the data directory to the",
        "current schema. A database already at the current schema is left as is.",
        "",
        "Options:",
        "  --help, -h        Print this help and exit",
        "  --datadir <path>  Data directory (default: ~/.rivd)",
        "  --conf <path>     Conf file (default: <datadir>/rivd.conf)",
        "  --json            Print the migration report as JSON",
    ]
    .join("\n")
}

pub fn parse_args_from<I>(raw_args: I) -> Result<MigrateAction, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = MigrateArgs::default();
    let mut args = raw_args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--datadir" | "--data-dir" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for --datadir\n{}", usage()))?;
                parsed.data_dir = Some(PathBuf::from(value));
            }
            "--conf" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for --conf\n{}", usage()))?;
                parsed.conf_path = Some(PathBuf::from(value));
            }
            "--json" => parsed.json = true,
            "--help" | "-h" => return Ok(MigrateAction::PrintHelp),
            other => return Err(format!("unknown argument '{other}'\n{}", usage())),
        }
    }
    Ok(MigrateAction::Run(parsed))
}

/// Conf file values, with a `--datadir` on the command line taking precedence.
pub fn resolve_config(args: &MigrateArgs) -> Result<NodeConfig, String> {
    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    let conf_path = args
        .conf_path
        .clone()
        .unwrap_or_else(|| data_dir.join(CONF_FILE_NAME));
    let mut config = NodeConfig::load(&conf_path).map_err(|err| err.to_string())?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Opens the consensus database of `config`, upgrading it when it is legacy.
pub fn run_migration(config: &NodeConfig) -> Result<Option<MigrationReport>, String> {
    let path = config.consensus_db_path();
    log_info!("Opening consensus database at {}", path.display());
    let store = FjallStore::open_with_options(&path, config.fjall_options())
        .map_err(|err| format!("failed to open {}: {err}", path.display()))?;
    let (db, report) = ConsensusDb::open_with_report(store).map_err(|err| err.to_string())?;
    db.store().persist().map_err(|err| err.to_string())?;
    Ok(report)
}

pub fn render_report(report: &MigrationReport, as_json: bool) -> String {
    if as_json {
        let mut sections = serde_json::Map::new();
        for section in Section::ALL {
            let counts = report.section(section);
            sections.insert(
                section.as_str().to_string(),
                json!({
                    "scanned": counts.scanned,
                    "rewritten": counts.rewritten,
                    "already_current": counts.already_current,
                    "unchanged": counts.unchanged,
                }),
            );
        }
        return json!({
            "version": CONSENSUS_DB_VERSION,
            "sections": sections,
        })
        .to_string();
    }
    let mut lines = vec![format!("upgraded consensus database to {CONSENSUS_DB_VERSION}")];
    for section in Section::ALL {
        let counts = report.section(section);
        lines.push(format!(
            "  {section}: {} scanned, {} rewritten, {} already current, {} unchanged",
            counts.scanned, counts.rewritten, counts.already_current, counts.unchanged
        ));
    }
    lines.join("\n")
}

pub fn run_entry<I>(raw_args: I) -> Result<(), String>
where
    I: IntoIterator<Item = String>,
{
    let args = match parse_args_from(raw_args)? {
        MigrateAction::PrintHelp => {
            println!("{}", usage());
            return Ok(());
        }
        MigrateAction::Run(args) => args,
    };
    let config = resolve_config(&args)?;
    rivd_log::init(config.log_config());
    match run_migration(&config)? {
        Some(report) => println!("{}", render_report(&report, args.json)),
        None => println!("consensus database already at version {CONSENSUS_DB_VERSION}"),
    }
    Ok(())
}
