use clap::{Parser, Subcommand};
use rwn_core::config::parse_pace_seconds;
use rwn_core::estimate::estimate_structure;
use rwn_core::{
    compute_canonical_name, detect_intervals_from_strokes, detect_warmup_cooldown, format_clock,
    import, naming, to_notation, validate_with, Config, DurationEstimate, Error, Result,
    WorkoutStructure,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rwn")]
#[command(about = "Workout notation parser and canonical namer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse notation and print the structure as JSON
    Parse {
        /// Workout notation, e.g. "4x500m/1:00r"
        text: String,
    },

    /// Check notation and report errors, hints and warnings
    Validate {
        text: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical name of the main set
    Name { text: String },

    /// Print normalized notation
    Format { text: String },

    /// Estimate work, rest and total time
    Estimate {
        text: String,

        /// Default split per 500m (m:ss); overrides the config file
        #[arg(long)]
        pace: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Name a recorded interval file (.json or .csv)
    NameIntervals { file: PathBuf },

    /// Detect warmup and cooldown in a recorded interval file
    Detect {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Rebuild intervals from a stroke file and name them
    Strokes {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        rwn_core::logging::init_with_level("debug");
    } else {
        rwn_core::logging::init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Parse { text } => cmd_parse(&text, &config),
        Commands::Validate { text, json } => cmd_validate(&text, json, &config),
        Commands::Name { text } => cmd_name(&text, &config),
        Commands::Format { text } => cmd_format(&text, &config),
        Commands::Estimate { text, pace, json } => cmd_estimate(&text, pace.as_deref(), json, &config),
        Commands::NameIntervals { file } => cmd_name_intervals(&file),
        Commands::Detect { file, json } => cmd_detect(&file, json),
        Commands::Strokes { file, json } => cmd_strokes(&file, json),
    }
}

/// Parse with the configured limits, reporting failures on stderr
fn parse_text(text: &str, config: &Config) -> Result<WorkoutStructure> {
    config.parser.parser().parse_notation(text).map_err(|e| {
        eprintln!("Could not parse {:?}: {}", text, e);
        Error::Parse(e)
    })
}

fn cmd_parse(text: &str, config: &Config) -> Result<()> {
    let structure = parse_text(text, config)?;
    println!("{}", serde_json::to_string_pretty(&structure)?);
    Ok(())
}

fn cmd_validate(text: &str, json: bool, config: &Config) -> Result<()> {
    let result = validate_with(text, &config.parser.parser(), &config.validation.limits());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.valid {
        println!("✓ Valid");
        if let Some(structure) = &result.structure {
            println!("  Name: {}", compute_canonical_name(structure));
        }
        for warning in &result.warnings {
            println!("  ⚠ {}", warning);
        }
    } else {
        println!("✗ Invalid");
        for error in &result.errors {
            println!("  - {}", error);
        }
    }

    if result.valid {
        Ok(())
    } else {
        Err(Error::Other(format!("invalid notation {:?}", text)))
    }
}

fn cmd_name(text: &str, config: &Config) -> Result<()> {
    let structure = parse_text(text, config)?;
    println!("{}", compute_canonical_name(&structure));
    Ok(())
}

fn cmd_format(text: &str, config: &Config) -> Result<()> {
    let structure = parse_text(text, config)?;
    println!("{}", to_notation(&structure));
    Ok(())
}

fn cmd_estimate(text: &str, pace: Option<&str>, json: bool, config: &Config) -> Result<()> {
    let pace_seconds = match pace {
        Some(p) => parse_pace_seconds(p)?,
        None => config.estimate.default_pace_seconds()?,
    };

    let structure = parse_text(text, config)?;
    let estimate = estimate_structure(&structure, pace_seconds);

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        display_estimate(&estimate);
    }
    Ok(())
}

fn display_estimate(estimate: &DurationEstimate) {
    println!("  Work:     {} ({}m)", format_clock(estimate.work_time), estimate.work_distance);
    println!("  Rest:     {}", format_clock(estimate.rest_time));
    println!("  Total:    {}", format_clock(estimate.total_time));
    println!("  Method:   {:?}", estimate.estimate_method);
    if let Some(pace) = estimate.pace_used {
        let tenths = (pace * 10.0).round() as u32;
        println!("  Pace:     {}/500m", rwn_core::format_clock_tenths(tenths));
    }
    if estimate.requires_baseline {
        println!("  ℹ Some targets need your test results to resolve");
    }
}

fn cmd_name_intervals(file: &Path) -> Result<()> {
    let intervals = import::load_intervals(file)?;
    println!("{}", naming::canonical_name(&intervals));
    Ok(())
}

fn cmd_detect(file: &Path, json: bool) -> Result<()> {
    let intervals = import::load_intervals(file)?;
    let result = detect_warmup_cooldown(&intervals);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.detected {
        println!("✓ {}", result.description);
        println!("  Main set:  {}", result.main_canonical_name);
        println!("  Suggested: {}", result.suggested_rwn);
    } else {
        println!("No warmup or cooldown detected");
        println!("  Name: {}", result.main_canonical_name);
    }
    Ok(())
}

fn cmd_strokes(file: &Path, json: bool) -> Result<()> {
    let strokes = import::load_strokes(file)?;
    let intervals = detect_intervals_from_strokes(&strokes);

    if json {
        println!("{}", serde_json::to_string_pretty(&intervals)?);
        return Ok(());
    }

    println!("{} intervals: {}", intervals.len(), naming::canonical_name(&intervals));
    for interval in &intervals {
        println!(
            "  {}m in {} @ {}W",
            interval.distance,
            rwn_core::format_clock_tenths(interval.time),
            interval.watts
        );
    }
    Ok(())
}
