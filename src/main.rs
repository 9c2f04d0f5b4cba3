use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use stream_rollup::pipeline::{
    ConsoleSink, InputFormat, LineDecoder, OutputFormat, PipelineConfig, StreamPipeline,
};
use stream_rollup::{RawRecord, ReferenceClock};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(name = "stream-rollup")]
#[command(about = "Per-minute averages over a stream of timestamped values", long_about = None)]
struct Cli {
    /// Input file, one record per line; stdin when omitted or `-`
    input: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minutes a bucket stays open after its minute ends
    #[arg(short, long)]
    buffer_minutes: Option<u32>,

    /// Time source for bucket closure
    #[arg(long, value_enum)]
    reference_clock: Option<ReferenceClock>,

    /// Emit buckets still open when the stream ends
    #[arg(long)]
    flush_on_end: bool,

    /// Input line format
    #[arg(short, long, value_enum)]
    format: Option<InputFormat>,

    /// Field delimiter for delimited input
    #[arg(long)]
    delimiter: Option<char>,

    /// Output format for emissions
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Replay the built-in sample stream instead of reading input
    #[arg(long)]
    sample: bool,

    /// Write logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// File config (or defaults) with command line overrides applied
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(minutes) = self.buffer_minutes {
            config.aggregator.buffer_minutes = minutes;
        }
        if let Some(clock) = self.reference_clock {
            config.aggregator.reference_clock = clock;
        }
        if self.flush_on_end {
            config.flush_on_end = true;
        }
        if let Some(format) = self.format {
            config.input_format = format;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(output) = self.output {
            config.output_format = output;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Ten records with late and out-of-order arrivals
fn sample_records() -> Vec<RawRecord> {
    [
        ("2025-02-10 5:47:10", "0.001025318456"),
        ("2025-02-10 5:38:00", "0.001025318456"),
        ("2025-02-10 6:16:00", "0.4645070349"),
        ("2025-02-10 5:47:10", "0.001025318456"),
        ("2025-02-10 6:11:00", "0.240809372"),
        ("2025-02-10 5:47:25", "0.001025318456"),
        ("2025-02-10 5:51:00", "0.001025318456"),
        ("2025-02-10 6:07:00", "0.2016774278"),
        ("2025-02-10 5:55:00", "0.001025318456"),
        ("2025-02-10 5:56:00", "0.001025318456"),
    ]
    .into_iter()
    .map(|(ts, value)| RawRecord::pair(ts, value))
    .collect()
}

async fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    stream_rollup::init_tracing(cli.log_json, level);

    let config = cli.pipeline_config()?;
    let sink = ConsoleSink::new(std::io::stdout(), config.output_format);
    let mut pipeline = StreamPipeline::new(&config, sink)?;

    if cli.sample {
        pipeline.run(sample_records())?;
    } else {
        let decoder = LineDecoder::from_config(&config);
        let mut lines = open_input(cli.input.as_ref()).await?.lines();

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if let Some(raw) = decoder.decode(&line) {
                            pipeline.process(raw)?;
                        }
                    }
                    None => break,
                },
                _ = &mut shutdown => {
                    info!("interrupted, ending stream");
                    break;
                }
            }
        }
    }

    let (stats, _) = pipeline.finish()?;
    if stats.rejected_total() > 0 {
        eprintln!(
            "Processed {} records, dropped {}",
            stats.records,
            stats.rejected_total()
        );
    }

    Ok(())
}
