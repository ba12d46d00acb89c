use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ilthermo::client::{IltApi, IltHttpClient};
use ilthermo::dataset::Dataset;
use ilthermo::doi::{CitationResolver, CrossrefResolver, DoiCache};
use ilthermo::error::IltError;
use ilthermo::props::{self, PropertyCatalog};
use ilthermo::report::{ReportOptions, write_report};
use ilthermo::search::{QueryParams, SearchResult, query};

#[derive(Parser)]
#[command(name = "ilt2report")]
#[command(
    about = "A search and report tool for the ILThermo v2.0 database from NIST (http://ilthermo.boulder.nist.gov)"
)]
#[command(version)]
struct Cli {
    /// Chemical formula, CAS registry number, or name (part or full)
    #[arg(short = 'c', value_name = "str", default_value = "")]
    comp: String,

    /// Number of mixture components (0 = any number)
    #[arg(short = 'n', value_name = "0", default_value_t = 0)]
    num_of_comp: u32,

    /// Publication year
    #[arg(short = 'y', value_name = "2018", default_value = "")]
    year: String,

    /// Author's last name
    #[arg(short = 'a', value_name = "name", default_value = "")]
    author: String,

    /// Keyword(s)
    #[arg(short = 'k', value_name = "str", default_value = "")]
    keywords: String,

    /// Physical property by abbreviation
    #[arg(short = 'p', value_name = "prop")]
    prop: Option<String>,

    /// Result folder for output files
    #[arg(short = 'o', long = "out", value_name = "dir")]
    out: Option<Utf8PathBuf>,

    /// Try to resolve DOI from citation (experimental)
    #[arg(long)]
    doi: bool,

    /// Don't ask whether to proceed creating the report
    #[arg(long)]
    auto: bool,

    /// Show property abbreviations and exit
    #[arg(long)]
    props: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(ilt) = report.downcast_ref::<IltError>() {
            return ExitCode::from(map_exit_code(ilt));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IltError) -> u8 {
    match error {
        IltError::SetNotFound(_) => 2,
        IltError::Http(_)
        | IltError::Status { .. }
        | IltError::CrossrefHttp(_)
        | IltError::CrossrefStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = PropertyCatalog::builtin();

    if cli.props {
        print_prop_table(&catalog);
        return Ok(());
    }

    // Validate the property abbreviation before touching the network.
    if let Some(abbr) = &cli.prop {
        catalog.search_key(abbr).into_diagnostic()?;
    }

    let client = IltHttpClient::new().into_diagnostic()?;
    let params = QueryParams {
        comp: cli.comp,
        num_of_comp: cli.num_of_comp,
        year: cli.year,
        author: cli.author,
        keywords: cli.keywords,
        prop: cli.prop,
    };

    let spinner = new_spinner("Make query to NIST...");
    let result = match query(&client, &catalog, &params) {
        Ok(result) => result,
        Err(err) => {
            spinner.finish_and_clear();
            return Err(err.into());
        }
    };
    spinner.finish_with_message(format!("Query done ({} hits)", result.len()));

    print_result_table(&result);
    if result.is_empty() {
        return Ok(());
    }

    if !cli.auto && !confirm_proceed().into_diagnostic()? {
        println!("Abort by user!");
        return Ok(());
    }

    let datasets = fetch_all(&client, &result)?;

    let resolver: Option<DoiCache<CrossrefResolver>> = if cli.doi {
        Some(DoiCache::new(CrossrefResolver::new().into_diagnostic()?))
    } else {
        None
    };

    let options = ReportOptions { dir: cli.out };
    let dir = write_report(
        &datasets,
        &options,
        resolver
            .as_ref()
            .map(|cache| cache as &dyn CitationResolver),
    )
    .into_diagnostic()?;

    println!("\nReport written to {dir}");
    println!("ilt2report finished!");
    Ok(())
}

/// Table of the physical properties addressable with `-p`.
fn print_prop_table(catalog: &PropertyCatalog) {
    println!("{:>6}  {}", "Abbr.", "Property");
    println!("------  -----------------------------------------");
    for abbr in catalog.abbreviations() {
        let name = props::find_by_abbr(abbr).map(|prop| prop.name).unwrap_or("");
        println!("{abbr:>6}  {name}");
    }
}

/// Result table similar to the web version.
fn print_result_table(result: &SearchResult) {
    println!("\n   # {:20} {:6} {:>4} {}", "ref", "prop", "np", "components(s)");
    println!(
        "{} {} {} {} {}",
        "-".repeat(4),
        "-".repeat(20),
        "-".repeat(6),
        "-".repeat(4),
        "-".repeat(40)
    );
    for (index, record) in result.iter().enumerate() {
        let sref = record.citation_key().unwrap_or_else(|_| "?".to_string());
        let prop = record.prop().unwrap_or_default();
        let abbr = props::abbr_for_name(&prop)
            .map(str::to_string)
            .unwrap_or(prop);
        let np = record.points().unwrap_or(0);
        let components = record.component_names().join(" | ");
        println!("{index:4} {sref:20} {abbr:6} {np:4} {components}");
    }
}

fn confirm_proceed() -> io::Result<bool> {
    print!("\nProceed? [Y]/n  ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "" | "y" | "Y"))
}

/// Requests the full data set for every reference, in result order.
fn fetch_all(api: &dyn IltApi, result: &SearchResult) -> miette::Result<Vec<Dataset>> {
    println!("\nRequest data sets from NIST:");
    let mut datasets = Vec::with_capacity(result.len());
    for record in result {
        let label = record
            .citation()
            .map(|cite| cite.as_str().to_string())
            .unwrap_or_else(|_| "?".to_string());
        let setid = record
            .setid()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|_| "?".to_string());
        let spinner = new_spinner(&format!(" >> {label} [{setid}] ..."));
        match record.retrieve(api) {
            Ok(dataset) => {
                spinner.finish_with_message(format!(" >> {label} [{setid}] done!"));
                datasets.push(dataset);
            }
            Err(err) => {
                spinner.finish_and_clear();
                return Err(err.into());
            }
        }
    }
    Ok(datasets)
}

fn new_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style.tick_chars("|/-\\ "));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
