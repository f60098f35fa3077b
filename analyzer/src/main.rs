use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use grapecore::inventory::{FileInventory, NodeRegistry};
use grapecore::processing::{BandType, CutoffPeriods, FilterSpec, FilterState};
use report::{write_json, InventoryReport};
use workflow::config::AnalysisConfig;
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Grape1 station inventory and Doppler analysis driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List station files per node and carrier
    Inventory {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = ".csv")]
        suffix: String,
        /// Also annotate nodes from this node list
        #[arg(long)]
        nodelist: Option<PathBuf>,
        /// Write the inventory timeline as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Show which registered nodes have logged data
    Nodes {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        nodelist: PathBuf,
        #[arg(long, default_value = ".csv")]
        suffix: String,
    },
    /// Resample, filter and export one station
    Analyze(AnalyzeArgs),
    /// Print the frequency response of a filter design
    Response {
        #[command(flatten)]
        filter: FilterArgs,
        /// Sampling rate in Hz
        #[arg(long, default_value_t = 1.0)]
        fs: f64,
        #[arg(long, default_value_t = 16)]
        points: usize,
    },
    /// Write synthetic Grape1 station files
    Generate {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 1)]
        node: u32,
        #[arg(long, default_value = "WWV10")]
        frequency: String,
        #[arg(long, default_value_t = 1)]
        days: u32,
        #[arg(long, default_value_t = 86_400)]
        span_seconds: u32,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    order: Option<usize>,
    /// Cutoff period in minutes; give two for band types
    #[arg(long, num_args = 1..=2)]
    tc: Vec<f64>,
    #[arg(long)]
    band: Option<BandType>,
}

impl FilterArgs {
    fn apply(&self, spec: &mut FilterSpec) -> anyhow::Result<()> {
        if let Some(order) = self.order {
            spec.order = order;
        }
        match self.tc.as_slice() {
            [] => {}
            [tc] => spec.tc_min = CutoffPeriods::Single(*tc),
            [first, second] => spec.tc_min = CutoffPeriods::Band([*first, *second]),
            _ => bail!("--tc takes one or two periods"),
        }
        if let Some(band) = self.band {
            spec.band = band;
        }
        Ok(())
    }
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Load an analysis config from YAML; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data: Option<PathBuf>,
    #[arg(long)]
    node: Option<u32>,
    /// Frequency label (e.g. WWV10) or carrier in Hz
    #[arg(long)]
    frequency: Option<String>,
    #[arg(long)]
    nodelist: Option<PathBuf>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    callsign: Option<String>,
    /// Resample cadence in seconds
    #[arg(long)]
    cadence: Option<f64>,
    #[command(flatten)]
    filter: FilterArgs,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Remove the output directory before writing
    #[arg(long, default_value_t = false)]
    clear: bool,
}

impl AnalyzeArgs {
    fn into_config(self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => {
                let (Some(data), Some(node), Some(frequency)) =
                    (self.data.clone(), self.node, self.frequency.as_deref())
                else {
                    bail!("--data, --node and --frequency are required without --config");
                };
                AnalysisConfig::from_args(data, node, frequency)
            }
        };

        if let Some(data) = self.data {
            config.data_dir = data;
        }
        if let Some(node) = self.node {
            config.node = node;
        }
        if let Some(frequency) = self.frequency {
            config.frequency = frequency;
        }
        if self.nodelist.is_some() {
            config.nodelist = self.nodelist;
        }
        if self.start.is_some() {
            config.start = self.start;
        }
        if self.end.is_some() {
            config.end = self.end;
        }
        if self.callsign.is_some() {
            config.callsign = self.callsign;
        }
        if let Some(cadence) = self.cadence {
            config.pipeline.cadence_seconds = cadence;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        config.clear_output |= self.clear;
        self.filter.apply(&mut config.pipeline.filter)?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Inventory {
            data,
            suffix,
            nodelist,
            json,
        } => {
            let inventory = FileInventory::build(&data, &suffix, Default::default())
                .with_context(|| format!("scanning {}", data.display()))?;
            let statuses = match nodelist {
                Some(path) => {
                    let mut registry = NodeRegistry::load(&path)?;
                    registry.annotate(&inventory.nodes_with_data());
                    Some(registry.status_table())
                }
                None => None,
            };
            let report = InventoryReport::new(&inventory, statuses);

            for (node, frequencies) in &report.nodes {
                let labels: Vec<String> = frequencies
                    .iter()
                    .map(|&hz| {
                        inventory
                            .table()
                            .label_for(hz)
                            .map_or_else(|| format!("{hz} Hz"), str::to_string)
                    })
                    .collect();
                println!("N{node:07}: {}", labels.join(", "));
            }
            println!(
                "{} files, {} nodes, {} dropped",
                report.spans.len(),
                report.nodes.len(),
                report.dropped.len()
            );
            if let Some(path) = json {
                write_json(&path, &report)?;
            }
        }
        Command::Nodes {
            data,
            nodelist,
            suffix,
        } => {
            let inventory = FileInventory::build(&data, &suffix, Default::default())
                .with_context(|| format!("scanning {}", data.display()))?;
            let mut registry = NodeRegistry::load(&nodelist)?;
            registry.annotate(&inventory.nodes_with_data());
            for row in registry.status_table() {
                println!("N{:07} {:<10} {}", row.node, row.callsign, row.status);
            }
        }
        Command::Analyze(args) => {
            let config = args.into_config()?;
            let result = Runner::new(config).execute()?;
            for stage in &result.summary.stages {
                println!(
                    "{:<10} {:>8} samples  {}",
                    stage.kind.name(),
                    stage.samples,
                    stage.label
                );
            }
            println!(
                "{} -> {} files written",
                result.summary.station.label,
                result.written.len()
            );
        }
        Command::Response { filter, fs, points } => {
            let mut spec = FilterSpec::default();
            filter.apply(&mut spec)?;
            let state = FilterState::design(&spec, fs)?;
            println!("{}", spec.label());
            println!("b = {:?}", state.b());
            println!("a = {:?}", state.a());
            for point in state.frequency_response(points) {
                println!(
                    "{:>12.6} Hz {:>10.3} dB {:>8.4} rad",
                    point.frequency_hz, point.gain_db, point.phase_rad
                );
            }
        }
        Command::Generate {
            output,
            node,
            frequency,
            days,
            span_seconds,
            seed,
        } => {
            let config = generator::profile::GeneratorConfig {
                node,
                frequency_label: frequency,
                days,
                span_seconds,
                seed,
                ..Default::default()
            };
            let written = generator::profile::write_station_files(&config, &output)?;
            println!("wrote {} files to {}", written.len(), output.display());
        }
    }

    Ok(())
}
