use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timecourse::error::Result;
use timecourse::reader::{
    detect_dataset_kind, load_copies_per_embryo, load_temporal_input, load_time_course, DatasetKind,
};
use timecourse::settings::Settings;
use timecourse::store::DataStore;

/// Reads a time-course, temporal input or copies-per-embryo document and
/// reports what it holds.
#[derive(Parser, Debug)]
#[command(name = "timecourse", version, long_about = None)]
struct Args {
    /// Settings file merged under the TIMECOURSE__* environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the dataset as XML instead of a JSON summary
    #[arg(long)]
    emit: bool,

    /// Document to read
    document: PathBuf,
}

fn run(args: Args, settings: Settings) -> Result<()> {
    let xml = std::fs::read_to_string(&args.document)?;
    let store = Arc::new(DataStore::new(settings.time_axis.clone()));
    let options = settings.factory;
    let kind = detect_dataset_kind(&xml)?;
    info!(document = %args.document.display(), ?kind, "reading document");
    let (summary, emitted) = match kind {
        DatasetKind::TimeCourse => {
            let data = load_time_course(&store, &xml, options)?;
            let summary = json!({
                "kind": kind,
                "serial": data.serial_number(),
                "genes": data.genes().len(),
                "template": data.template().iter().map(|e| settings.time_axis.display_entry(e)).collect::<Vec<_>>(),
                "regions": data.all_regions(),
                "topologies": data.topologies().len(),
            });
            (summary, data.to_xml()?)
        }
        DatasetKind::TemporalInput => {
            let data = load_temporal_input(&store, &xml, options)?;
            let summary = json!({
                "kind": kind,
                "entries": data.entries().len(),
                "times": data.all_times(),
                "regions": data.all_regions(),
            });
            (summary, data.to_xml()?)
        }
        DatasetKind::CopiesPerEmbryo => {
            let data = load_copies_per_embryo(&store, &xml, options)?;
            let summary = json!({
                "kind": kind,
                "genes": data.genes().len(),
                "times": data.all_times(),
            });
            (summary, data.to_xml()?)
        }
    };
    if args.emit {
        print!("{emitted}");
    } else {
        let maps = store.data_maps()?;
        let mut summary = summary;
        summary["legacy_maps"] = json!(!maps.is_empty());
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
    match run(args, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, user_facing = e.is_user_facing(), "timecourse failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Args;

    #[test]
    fn command_line_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn options_and_document_are_read() {
        let args = Args::try_parse_from(["timecourse", "--config", "tc.toml", "--emit", "data.xml"]).unwrap();
        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("tc.toml")));
        assert!(args.emit);
        assert_eq!(args.document, std::path::PathBuf::from("data.xml"));
        assert!(Args::try_parse_from(["timecourse"]).is_err());
        assert!(Args::try_parse_from(["timecourse", "--bogus", "data.xml"]).is_err());
    }
}
