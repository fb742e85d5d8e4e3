use alertscope::ingest::{self, InputFormat};
use alertscope::render::{CsvDirRenderer, JsonRenderer, ReportRenderer, TableRenderer};
use alertscope::{DescriptorField, ReportConfig, Variant};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "alertscope", version, about = "Repeated alert report: normalize, group and classify monitoring alerts")]
struct Cli {
    /// Input table (.csv, .jsonl, .xlsx, .xls). `-` reads CSV or JSON Lines from stdin.
    input: PathBuf,

    /// Group on the kpiName column instead of title
    #[arg(long = "kpi", default_value_t = false)]
    kpi: bool,

    /// Basic report: grouping and counts only, no ETA/business classification
    #[arg(long = "basic", default_value_t = false)]
    basic: bool,

    /// JSON file with report settings (business window, exclusion patterns)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Force the input format instead of going by extension
    #[arg(long = "input-format", value_enum)]
    input_format: Option<InputKind>,

    /// Report format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write JSON here instead of stdout
    #[arg(long = "output", short = 'o')]
    output: Option<PathBuf>,

    /// Also write one CSV per table into this directory
    #[arg(long = "csv-dir")]
    csv_dir: Option<PathBuf>,

    /// Issues listed per application (and rows in table output)
    #[arg(long = "top")]
    top: Option<usize>,

    /// Include every classified alert row in JSON output
    #[arg(long = "alerts", default_value_t = false)]
    alerts: bool,

    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InputKind {
    Csv,
    #[value(aliases = ["ndjson", "json"])]
    Jsonl,
    #[value(aliases = ["xlsx", "xls"])]
    Excel,
}

impl From<InputKind> for InputFormat {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Csv => InputFormat::Csv,
            InputKind::Jsonl => InputFormat::JsonLines,
            InputKind::Excel => InputFormat::Excel,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Pretty JSON report
    Json,
    /// Top issue groups as a text table
    Table,
}

fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_stdin(format: Option<InputFormat>) -> anyhow::Result<ingest::Table> {
    let stdin = io::stdin();
    let table = match format.unwrap_or(InputFormat::Csv) {
        InputFormat::Csv => ingest::read_csv(stdin.lock())?,
        InputFormat::JsonLines => ingest::read_json_lines(stdin.lock())?,
        InputFormat::Excel => anyhow::bail!("excel input cannot be read from stdin; pass a file path"),
    };
    Ok(table)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = match &cli.config {
        Some(p) => ReportConfig::load(p).with_context(|| format!("loading config {}", p.display()))?,
        None => ReportConfig::default(),
    };
    if cli.kpi {
        cfg.descriptor = DescriptorField::KpiName;
    }
    if cli.basic {
        cfg.variant = Variant::Basic;
    }
    if let Some(top) = cli.top {
        cfg.top_n = top;
    }

    let forced = cli.input_format.map(InputFormat::from);
    let table = if is_stdout(&cli.input) {
        read_stdin(forced)?
    } else {
        ingest::load_table(&cli.input, forced).with_context(|| format!("reading {}", cli.input.display()))?
    };
    tracing::info!(rows = table.len(), columns = table.headers.len(), "loaded input");

    // Everything is computed before any artifact is written.
    let report = alertscope::build_report(&table, &cfg)?;

    if let Some(dir) = &cli.csv_dir {
        let mut csv_out = CsvDirRenderer::new(dir);
        csv_out.render(&report)?;
        tracing::info!(files = csv_out.written().len(), dir = %dir.display(), "wrote csv tables");
    }

    match cli.format {
        OutputFormat::Table => {
            let stdout = io::stdout();
            TableRenderer::new(stdout.lock(), cli.top.unwrap_or(20)).render(&report)?;
        }
        OutputFormat::Json => match &cli.output {
            Some(path) if !is_stdout(path) => {
                let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
                let mut json = JsonRenderer::new(BufWriter::new(f)).include_alerts(cli.alerts);
                json.render(&report)?;
                json.into_inner().flush()?;
            }
            _ => {
                let stdout = io::stdout();
                JsonRenderer::new(stdout.lock()).include_alerts(cli.alerts).render(&report)?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_defaults_to_json() {
        let cli = Cli::try_parse_from(["alertscope", "alerts.csv"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        let cli = Cli::try_parse_from(["alertscope", "alerts.csv", "--format", "table"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn unknown_formats_are_rejected() {
        assert!(Cli::try_parse_from(["alertscope", "alerts.csv", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["alertscope", "alerts.csv", "--input-format", "parquet"]).is_err());
    }

    #[test]
    fn input_format_aliases_map_to_readers() {
        let cli = Cli::try_parse_from(["alertscope", "-", "--input-format", "ndjson"]).unwrap();
        assert_eq!(cli.input_format.map(InputFormat::from), Some(InputFormat::JsonLines));
        let cli = Cli::try_parse_from(["alertscope", "dump.bin", "--input-format", "xlsx"]).unwrap();
        assert_eq!(cli.input_format.map(InputFormat::from), Some(InputFormat::Excel));
    }

    #[test]
    fn dash_means_standard_streams() {
        assert!(is_stdout(Path::new("-")));
        assert!(!is_stdout(Path::new("./-alerts.csv")));
    }
}
