use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plan_core::{compile_protocol, CompilerConfig, GeneratedProtocol};
use plan_tables::{
    apply_overrides, load_config, load_inputs, parse_override, write_inventory_csv,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "plan_cli", about = "Liquid-handling protocol compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile stock, labware and transfer tables into a protocol script.
    Compile {
        #[arg(long)]
        stocks: PathBuf,
        #[arg(long)]
        labware: PathBuf,
        #[arg(long)]
        transfers: PathBuf,
        /// Where to write the generated protocol.
        #[arg(long)]
        output: PathBuf,
        /// Compiler configuration JSON. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override a configuration key, e.g. `--set high_capacity_ul=1000`.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        /// Also write the final inventory as CSV.
        #[arg(long)]
        inventory_out: Option<PathBuf>,
        /// Log filter; takes precedence over RUST_LOG.
        #[arg(long)]
        log_level: Option<String>,
    },
}

fn setup_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Compile
// ---------------------------------------------------------------------------

fn resolve_config(path: Option<&Path>, overrides: &[String]) -> Result<CompilerConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => CompilerConfig::default(),
    };
    let parsed: HashMap<String, serde_json::Value> = overrides
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<_>>()?;
    apply_overrides(&mut config, &parsed)?;
    Ok(config)
}

struct CompileArgs<'a> {
    stocks: &'a Path,
    labware: &'a Path,
    transfers: &'a Path,
    output: &'a Path,
    inventory_out: Option<&'a Path>,
}

/// Compiles and writes outputs. Nothing is written unless compilation
/// succeeds.
fn compile(args: &CompileArgs<'_>, config: &CompilerConfig) -> Result<GeneratedProtocol> {
    let inputs = load_inputs(args.stocks, args.labware, args.transfers)?;
    let generated = compile_protocol(&inputs.stocks, &inputs.labware, &inputs.transfers, config)
        .context("compiling transfer plan")?;

    std::fs::write(args.output, &generated.script)
        .with_context(|| format!("writing protocol {}", args.output.display()))?;
    info!(path = %args.output.display(), "wrote protocol");
    if let Some(path) = args.inventory_out {
        write_inventory_csv(path, &generated.plan.inventory)?;
        info!(path = %path.display(), "wrote inventory snapshot");
    }
    Ok(generated)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            stocks,
            labware,
            transfers,
            output,
            config,
            overrides,
            inventory_out,
            log_level,
        } => {
            setup_logging(log_level.as_deref());
            let config = resolve_config(config.as_deref(), &overrides)?;
            let args = CompileArgs {
                stocks: &stocks,
                labware: &labware,
                transfers: &transfers,
                output: &output,
                inventory_out: inventory_out.as_deref(),
            };
            let generated = compile(&args, &config)?;
            println!(
                "Wrote {}: {} operations, {} actions, {} annotations",
                output.display(),
                generated.plan.order.len(),
                generated.plan.actions.len(),
                generated.plan.actions.annotations().len(),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        stocks: PathBuf,
        labware: PathBuf,
        transfers: PathBuf,
        output: PathBuf,
        inventory: PathBuf,
    }

    fn fixture(labware_rows: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let stocks = write(
            dir.path(),
            "stocks.csv",
            "stock name,volume(ul),labware location,well location\nbuffer,14000,11,A1\n",
        );
        let labware = write(
            dir.path(),
            "labware.csv",
            &format!("labware_title,location\n{labware_rows}"),
        );
        let transfers = write(
            dir.path(),
            "transfers.csv",
            "stock labware location 1,stock well location 1,receiving labware location,receiving well location,volume 1\n11,A1,1,A1,250\n",
        );
        let output = dir.path().join("protocol.py");
        let inventory = dir.path().join("inventory.csv");
        Fixture {
            _dir: dir,
            stocks,
            labware,
            transfers,
            output,
            inventory,
        }
    }

    fn args(f: &Fixture) -> CompileArgs<'_> {
        CompileArgs {
            stocks: &f.stocks,
            labware: &f.labware,
            transfers: &f.transfers,
            output: &f.output,
            inventory_out: Some(&f.inventory),
        }
    }

    #[test]
    fn test_compile_writes_protocol_and_snapshot() {
        let f = fixture(
            "ecmcustom_15_tuberack_14780ul,11\nnest_96_wellplate_200ul_flat,1\nopentrons_96_tiprack_300ul,10\n",
        );
        let generated = compile(&args(&f), &CompilerConfig::default()).unwrap();
        let script = std::fs::read_to_string(&f.output).unwrap();
        assert_eq!(script, generated.script);
        assert!(script.contains("p300.aspirate(200.0, labware_11['A1'].bottom(z=47.5))"));
        let snapshot = std::fs::read_to_string(&f.inventory).unwrap();
        assert!(snapshot.starts_with("stock name,volume(ul),labware location,well location\n"));
        assert!(snapshot.contains("buffer,13750.00,11,A1"));
    }

    #[test]
    fn test_failed_compile_writes_nothing() {
        let f = fixture("ecmcustom_15_tuberack_14780ul,11\nnest_96_wellplate_200ul_flat,1\n");
        let err = compile(&args(&f), &CompilerConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("no tip racks"));
        assert!(!f.output.exists());
        assert!(!f.inventory.exists());
    }

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let config = resolve_config(None, &["high_capacity_ul=1000".to_string()]).unwrap();
        assert!((config.high_capacity_ul - 1000.0).abs() < 1e-9);
        assert!(resolve_config(None, &["bogus=1".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_repeated_set() {
        let cli = Cli::try_parse_from([
            "plan_cli",
            "compile",
            "--stocks",
            "s.csv",
            "--labware",
            "l.csv",
            "--transfers",
            "t.csv",
            "--output",
            "out.py",
            "--set",
            "touch_speed=40",
            "--set",
            "author=Bench",
        ])
        .unwrap();
        let Commands::Compile { overrides, config, .. } = cli.command;
        assert_eq!(overrides, vec!["touch_speed=40", "author=Bench"]);
        assert!(config.is_none());
    }
}
