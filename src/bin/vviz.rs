use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vviz::{
    Analysis, AnalysisOptions, BoxProbe, CapturedBoxDump, CapturedFrameProbe, FfprobeCommand,
    FragmentSummary, FrameProbe, GopSummary, JsonSink, Mp4dumpCommand, VisualizationSink, analysis,
    utilities::{delta_seconds, format_bits, format_delta},
};

const CLI_AFTER_HELP: &str = "Examples:\n  vviz gops input.mp4\n  vviz analyze input.mp4 --intervals %+10 --out report.json --progress\n  vviz fragments --frames-json ffprobe.json --boxes-json mp4dump.json --json\n  vviz validate input.mp4 --ffprobe-exec /opt/ffmpeg/bin/ffprobe\n  vviz completions zsh > _vviz";

#[derive(Debug, Parser)]
#[command(
    name = "vviz",
    version,
    about = "Inspect the frame, GOP and fragment structure of video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a spinner while the external tools run.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,
}

/// Where the frame and box data come from.
#[derive(Debug, Parser, Clone)]
struct SourceOptions {
    /// Video file to inspect. Not needed when both captured JSON files are given.
    input: Option<PathBuf>,

    /// ffprobe executable.
    #[arg(long, default_value = "ffprobe")]
    ffprobe_exec: String,

    /// mp4dump executable.
    #[arg(long, default_value = "mp4dump")]
    mp4dump_exec: String,

    /// Streams to read (see ffprobe -select_streams).
    #[arg(long, default_value = "v:0")]
    streams: String,

    /// Interval to read (see ffprobe -read_intervals). Fragments are clipped to it.
    #[arg(long)]
    intervals: Option<String>,

    /// Read captured ffprobe JSON instead of running ffprobe.
    #[arg(long)]
    frames_json: Option<PathBuf>,

    /// Read captured mp4dump JSON instead of running mp4dump.
    #[arg(long)]
    boxes_json: Option<PathBuf>,

    /// Position of the stream to analyse in the probe's stream list.
    #[arg(long, default_value_t = 0)]
    stream: usize,

    /// Track id. Defaults to the id declared by the first fragment.
    #[arg(long)]
    track_id: Option<u32>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write the full analysis report as JSON.
    #[command(about = "Write the analysis report as JSON")]
    Analyze {
        #[command(flatten)]
        source: SourceOptions,

        /// Output file. Defaults to standard output.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,

        /// Rolling bitrate window in frames. Defaults to one second of frames.
        #[arg(long)]
        window: Option<usize>,
    },

    /// Print one line per GOP.
    #[command(about = "Print the GOP structure")]
    Gops {
        #[command(flatten)]
        source: SourceOptions,

        #[arg(long)]
        json: bool,
    },

    /// Print one line per fragment.
    #[command(about = "Print the fragment structure")]
    Fragments {
        #[command(flatten)]
        source: SourceOptions,

        #[arg(long)]
        json: bool,
    },

    /// Check stream and track structure.
    #[command(about = "Validate stream and track structure")]
    Validate {
        #[command(flatten)]
        source: SourceOptions,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn frame_probe(source: &SourceOptions) -> Result<Box<dyn FrameProbe>, Box<dyn std::error::Error>> {
    if let Some(path) = &source.frames_json {
        return Ok(Box::new(CapturedFrameProbe::new(path)));
    }
    let input = source
        .input
        .as_ref()
        .ok_or("an input file or --frames-json is required")?;
    let mut command = FfprobeCommand::new(input)
        .with_executable(&source.ffprobe_exec)
        .with_streams(&source.streams);
    if let Some(intervals) = &source.intervals {
        command = command.with_read_intervals(intervals);
    }
    Ok(Box::new(command))
}

fn box_probe(source: &SourceOptions) -> Result<Box<dyn BoxProbe>, Box<dyn std::error::Error>> {
    if let Some(path) = &source.boxes_json {
        return Ok(Box::new(CapturedBoxDump::new(path)));
    }
    let input = source
        .input
        .as_ref()
        .ok_or("an input file or --boxes-json is required")?;
    Ok(Box::new(
        Mp4dumpCommand::new(input).with_executable(&source.mp4dump_exec),
    ))
}

fn analysis_options(source: &SourceOptions) -> AnalysisOptions {
    let mut options = AnalysisOptions::new()
        .with_stream_position(source.stream)
        .with_clip_fragments_to_stream(source.intervals.is_some());
    if let Some(track_id) = source.track_id {
        options = options.with_track_id(track_id);
    }
    options
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn spinner(
    global: &GlobalOptions,
    message: &str,
) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !global.progress {
        return Ok(None);
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(bar))
}

fn load(
    global: &GlobalOptions,
    source: &SourceOptions,
    options: &AnalysisOptions,
) -> Result<Analysis, Box<dyn std::error::Error>> {
    let frames = frame_probe(source)?;
    let boxes = box_probe(source)?;

    if global.verbose {
        eprintln!(
            "{} stream position {}, track {}",
            "analyzing".cyan().bold(),
            options.stream_position,
            options
                .track_id
                .map_or_else(|| "auto".to_string(), |id| id.to_string())
        );
    }

    let bar = spinner(global, "probing")?;
    let result = analysis::analyze(frames.as_ref(), boxes.as_ref(), options);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let analysis = result?;

    if global.verbose {
        eprintln!(
            "{} {} frames, {} fragments",
            "loaded".cyan().bold(),
            analysis.stream().frames().len(),
            analysis.track().fragments().len()
        );
    }
    Ok(analysis)
}

fn gop_line(summary: &GopSummary) -> String {
    let state = if summary.closed {
        "CLOSED".green()
    } else {
        "OPEN".yellow()
    };
    format!(
        "GOP {}: {} {} {}",
        summary.position, summary.pattern, summary.frame_count, state
    )
}

fn fragment_line(summary: &FragmentSummary) -> String {
    format!(
        "Fragment {}: {} samples from {} for {}s, {}",
        summary.position,
        summary.sample_count,
        summary.start_time.format("%H:%M:%S%.3f"),
        summary.duration,
        format_bits(summary.size as f64, "b")
    )
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            out,
            pretty,
            window,
        } => {
            let mut options = analysis_options(&source);
            if let Some(window) = window {
                options = options.with_bitrate_window(window);
            }
            let analysis = load(&cli.global, &source, &options)?;
            let report = analysis.report(&options)?;

            match out {
                Some(path) => {
                    ensure_writable_path(&path, cli.global.overwrite)?;
                    let file = BufWriter::new(File::create(&path)?);
                    let mut sink = JsonSink::new(file).pretty(pretty);
                    sink.render(&report)?;
                    println!("{} {}", "saved".green().bold(), path.display());
                }
                None => {
                    let mut sink = JsonSink::new(io::stdout().lock()).pretty(pretty);
                    sink.render(&report)?;
                }
            }
        }
        Commands::Gops { source, json } => {
            let options = analysis_options(&source);
            let analysis = load(&cli.global, &source, &options)?;
            let report = analysis.report(&options)?;

            if json {
                let payload = json!({
                    "statistics": report.gop_statistics,
                    "gops": report.gops,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for gop in &report.gops {
                    println!("{}", gop_line(gop));
                }
                let statistics = &report.gop_statistics;
                println!(
                    "{} {} GOPs, {} closed, average length {:.1} frames",
                    "summary:".bold(),
                    statistics.count,
                    statistics.closed_count,
                    statistics.average_length
                );
            }
        }
        Commands::Fragments { source, json } => {
            let options = analysis_options(&source);
            let analysis = load(&cli.global, &source, &options)?;
            let report = analysis.report(&options)?;

            if json {
                let payload = json!({
                    "track": report.track,
                    "fragments": report.fragments,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if report.fragments.is_empty() {
                println!("{}", "No fragments (file is not fragmented)".yellow());
            } else {
                for fragment in &report.fragments {
                    println!("{}", fragment_line(fragment));
                }
                if let Some(duration) = analysis.track().duration() {
                    println!(
                        "{} track duration {} ({}s)",
                        "summary:".bold(),
                        format_delta(duration),
                        delta_seconds(duration)
                    );
                }
            }
        }
        Commands::Validate { source } => {
            let options = analysis_options(&source);
            let analysis = load(&cli.global, &source, &options)?;
            let report = analysis.validate();
            print!("{report}");
            if !report.is_valid() {
                return Err(format!("validation found {} error(s)", report.errors.len()).into());
            }
            println!("{}", "valid".green().bold());
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vviz", &mut io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
