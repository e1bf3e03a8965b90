use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use vitals_core::{
    resolve_ideal_ranges, Gender, IdealRange, PatientIdentity, PatientReport, ReportConfig,
    ReportMode, RiskAxis, RiskLabel, RiskTier, VitalField, VitalReading,
};
use vitals_predict::{ModelBundle, ModelSet, MISSING_UPLOAD_WARNING};

#[derive(Parser, Debug)]
#[command(
    name = "vitals-cli",
    about = "Predict stress, cardio-respiratory and fever risk from patient vitals."
)]
struct Cli {
    /// Model bundle JSON file or directory of per-axis artifacts.
    #[arg(long, global = true, default_value = "models")]
    models: PathBuf,

    /// JSON file with report settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict from a single reading.
    Manual {
        #[command(flatten)]
        patient: PatientArgs,
        #[arg(long, default_value_t = 75)]
        heart_rate: u32,
        #[arg(long, default_value_t = 50)]
        hrv: u32,
        #[arg(long, default_value_t = 98)]
        spo2: u32,
        #[arg(long, default_value_t = 16)]
        respiration: u32,
        #[arg(long, default_value_t = 37.0)]
        temperature: f64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Predict every row of a sensor CSV.
    Csv {
        /// CSV with Heart_Rate, HRV, SpO2, Respiration_Rate, Temperature columns.
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        patient: PatientArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the ideal vital ranges for an age.
    Ranges {
        #[arg(long)]
        age: u32,
    },
    /// Print the severity tier of a risk label.
    Classify { label: String },
}

#[derive(Args, Debug)]
struct PatientArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value_t = 30)]
    age: u32,
    #[arg(long, default_value = "Male")]
    gender: Gender,
}

impl PatientArgs {
    fn identity(&self) -> anyhow::Result<PatientIdentity> {
        let patient = PatientIdentity::new(self.name.clone(), self.age, self.gender);
        patient.validate()?;
        Ok(patient)
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Append age-band ideal ranges to the report.
    #[arg(long)]
    ideal: bool,
    /// Write the CSV report here; a directory gets the suggested file name.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match &cli.command {
        Command::Ranges { age } => print_ranges(*age),
        Command::Classify { label } => {
            let tier = RiskTier::classify(label);
            println!("{label}: {} ({})", paint(tier, &tier.to_string()), tier.color());
        }
        Command::Manual {
            patient,
            heart_rate,
            hrv,
            spo2,
            respiration,
            temperature,
            output,
        } => {
            let patient = patient.identity()?;
            let config = load_config(cli.config.as_deref(), output)?;
            let models = load_models(&cli.models)?;
            let reading = VitalReading {
                heart_rate: *heart_rate,
                hrv: *hrv,
                spo2: *spo2,
                respiration_rate: *respiration,
                temperature: *temperature,
            };
            let report = vitals_predict::predict_manual(&models, &patient, reading, &config)?;
            print_report(&report);
            write_report(&report, output.output.as_deref())?;
        }
        Command::Csv {
            input,
            patient,
            output,
        } => {
            let patient = patient.identity()?;
            let config = load_config(cli.config.as_deref(), output)?;
            let models = load_models(&cli.models)?;
            match upload_report(&models, &patient, input.as_deref(), &config)? {
                Some(report) => {
                    print_report(&report);
                    write_report(&report, output.output.as_deref())?;
                }
                None => eprintln!("{MISSING_UPLOAD_WARNING}"),
            }
        }
    }

    Ok(())
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>, output: &OutputArgs) -> anyhow::Result<ReportConfig> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Could not read config {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ReportConfig::default(),
    };
    if output.ideal {
        config.include_ideal_ranges = true;
    }
    Ok(config)
}

fn load_models(path: &Path) -> anyhow::Result<ModelSet> {
    let bundle = ModelBundle::load(path)
        .with_context(|| format!("Could not load models from {}", path.display()))?;
    Ok(ModelSet::from(bundle))
}

/// `Ok(None)` when no upload path was given.
fn upload_report(
    models: &ModelSet,
    patient: &PatientIdentity,
    input: Option<&Path>,
    config: &ReportConfig,
) -> anyhow::Result<Option<PatientReport>> {
    let upload = input
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Could not read upload {}", path.display()))
        })
        .transpose()?;
    Ok(vitals_predict::predict_upload(
        models,
        patient,
        upload.as_deref(),
        config,
    )?)
}

fn print_ranges(age: u32) {
    let ranges = resolve_ideal_ranges(age);
    println!("Age {age} (band {})", ranges.band);
    for (field, range) in ranges.entries() {
        println!("  {}", ideal_line(field, range, None));
    }
}

fn print_report(report: &PatientReport) {
    println!("{}", report.greeting());
    match report.mode {
        ReportMode::Manual => {
            if let Some(row) = report.rows().first() {
                for axis in RiskAxis::ALL {
                    println!("  {}: {}", axis.title(), paint_label(row.label(axis)));
                }
            }
        }
        ReportMode::Batch => {
            println!(
                "  {:>3}  {:>4} {:>4} {:>4} {:>4} {:>5}  {:<8} {:<8} {:<8}",
                "#", "HR", "HRV", "SpO2", "RR", "Temp", "Stress", "Cardio", "Fever"
            );
            for (index, row) in report.rows().iter().enumerate() {
                let reading = &row.reading;
                println!(
                    "  {:>3}  {:>4} {:>4} {:>4} {:>4} {:>5.1}  {} {} {}",
                    index + 1,
                    reading.heart_rate,
                    reading.hrv,
                    reading.spo2,
                    reading.respiration_rate,
                    reading.temperature,
                    paint_label(&row.stress),
                    paint_label(&row.cardio_respiratory),
                    paint_label(&row.fever),
                );
            }
        }
    }
    if let Some(ranges) = &report.ideal_ranges {
        println!("Ideal ranges for age {} (band {}):", report.patient.age, ranges.band);
        let reading = match report.mode {
            ReportMode::Manual => report.rows().first().map(|row| &row.reading),
            ReportMode::Batch => None,
        };
        for (field, range) in ranges.entries() {
            println!("  {}", ideal_line(field, range, reading));
        }
    }
}

/// One ideal-range line, flagging a manual reading that falls outside it.
fn ideal_line(field: VitalField, range: IdealRange, reading: Option<&VitalReading>) -> String {
    let line = format!("{:<32} {range}", field.label());
    match reading {
        Some(reading) if !range.contains(reading.value(field)) => {
            format!("{line}  (yours: {})", reading.column_text(field))
        }
        _ => line,
    }
}

fn write_report(report: &PatientReport, output: Option<&Path>) -> anyhow::Result<()> {
    let Some(output) = output else {
        return Ok(());
    };
    let path = report_path(report, output);
    let csv = vitals_predict::report_to_csv(report)?;
    fs::write(&path, csv).with_context(|| format!("Could not write {}", path.display()))?;
    info!(path = %path.display(), rows = report.rows().len(), "report written");
    println!("Report saved to {}", path.display());
    Ok(())
}

fn report_path(report: &PatientReport, output: &Path) -> PathBuf {
    if output.is_dir() {
        output.join(report.suggested_file_name())
    } else {
        output.to_path_buf()
    }
}

fn paint_label(label: &RiskLabel) -> String {
    paint(label.tier(), &format!("{:<8}", label.as_str()))
}

fn paint(tier: RiskTier, text: &str) -> String {
    let code = match tier {
        RiskTier::High => "1;31",
        RiskTier::Medium => "1;33",
        RiskTier::Low => "1;32",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn manual_defaults_match_the_form() {
        let cli = Cli::try_parse_from(["vitals-cli", "manual", "--name", "Ana"]).unwrap();
        match cli.command {
            Command::Manual {
                patient,
                heart_rate,
                temperature,
                output,
                ..
            } => {
                assert_eq!(patient.name, "Ana");
                assert_eq!(patient.age, 30);
                assert_eq!(patient.gender, Gender::Male);
                assert_eq!(heart_rate, 75);
                assert_eq!(temperature, 37.0);
                assert!(!output.ideal);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.models, PathBuf::from("models"));
    }

    #[test]
    fn gender_and_log_level_parse() {
        let cli = Cli::try_parse_from([
            "vitals-cli",
            "--log-level",
            "debug",
            "csv",
            "--gender",
            "female",
            "--age",
            "70",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Command::Csv { input, patient, .. } => {
                assert!(input.is_none());
                assert_eq!(patient.gender, Gender::Female);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["vitals-cli", "csv", "--gender", "robot"]).is_err());
    }

    #[test]
    fn ideal_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, r#"{"validate_batch_bounds": true}"#).unwrap();

        let output = OutputArgs {
            ideal: true,
            output: None,
        };
        let config = load_config(Some(&path), &output).unwrap();
        assert!(config.include_ideal_ranges);
        assert!(config.validate_batch_bounds);

        let plain = OutputArgs {
            ideal: false,
            output: None,
        };
        assert_eq!(load_config(None, &plain).unwrap(), ReportConfig::default());
    }

    #[test]
    fn directory_output_uses_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let report = PatientReport::new(
            PatientIdentity::new("Ana", 30, Gender::Female),
            ReportMode::Batch,
            Vec::new(),
            None,
        );
        assert_eq!(
            report_path(&report, dir.path()),
            dir.path().join("Ana_live_report.csv")
        );
        let file = dir.path().join("custom.csv");
        assert_eq!(report_path(&report, &file), file);
    }

    fn demo_path(relative: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(relative)
    }

    #[test]
    fn csv_upload_runs_through_the_batch_path() {
        let models = load_models(&demo_path("models")).unwrap();
        let patient = PatientIdentity::new("Ana", 30, Gender::Female);
        let config = ReportConfig::default();

        assert!(upload_report(&models, &patient, None, &config)
            .unwrap()
            .is_none());

        let input = demo_path("data/sensor_readings.csv");
        let report = upload_report(&models, &patient, Some(&input), &config)
            .unwrap()
            .unwrap();
        assert_eq!(report.mode, ReportMode::Batch);
        assert!(!report.rows().is_empty());

        let missing = demo_path("data/absent.csv");
        assert!(upload_report(&models, &patient, Some(&missing), &config).is_err());
    }

    #[test]
    fn ideal_lines_flag_readings_outside_the_range() {
        let ranges = resolve_ideal_ranges(30);
        let reading = VitalReading {
            heart_rate: 120,
            ..VitalReading::default()
        };
        let heart = ideal_line(VitalField::HeartRate, ranges.heart_rate, Some(&reading));
        assert!(heart.ends_with("60-100  (yours: 120)"), "{heart}");
        let spo2 = ideal_line(VitalField::Spo2, ranges.spo2, Some(&reading));
        assert!(spo2.ends_with("95-100"), "{spo2}");
        let plain = ideal_line(VitalField::HeartRate, ranges.heart_rate, None);
        assert!(plain.ends_with("60-100"), "{plain}");
    }

    #[test]
    fn labels_are_colored_by_tier() {
        assert!(paint_label(&RiskLabel::from("HIGH")).starts_with("\x1b[1;31m"));
        assert!(paint_label(&RiskLabel::from("Medium")).starts_with("\x1b[1;33m"));
        assert!(paint_label(&RiskLabel::from("whatever")).starts_with("\x1b[1;32m"));
    }
}
