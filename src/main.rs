use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use wikigraph::command::{Command, Fixup, Outcome};
use wikigraph::config::DEFAULT_PAGE_VIEW_PROJECT;
use wikigraph::diagnostics::{Diagnostic, DiagnosticSink, Severity, TracingSink};
use wikigraph::report::{CycleReport, LoadReport, PathReport, RedLinkReport, SetReport};
use wikigraph::source::{FileProvider, Table};
use wikigraph::Engine;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikigraph")]
#[command(about = "Query and analyse MediaWiki page, category and link tables in memory")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print per-table load statistics to stderr when done
    #[arg(long, global = true)]
    stats: bool,

    #[command(flatten)]
    tables: TableArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TableArgs {
    /// Page table export (tab-separated)
    #[arg(long)]
    pages: PathBuf,

    /// Category link table export (tab-separated)
    #[arg(long)]
    categorylinks: Option<PathBuf>,

    /// Template link table export (tab-separated)
    #[arg(long)]
    templatelinks: Option<PathBuf>,

    /// Page link table export (tab-separated)
    #[arg(long)]
    pagelinks: Option<PathBuf>,

    /// External link table export (tab-separated)
    #[arg(long)]
    externallinks: Option<PathBuf>,

    /// Page view counts (space-separated: project, title, views)
    #[arg(long)]
    pageviews: Option<PathBuf>,

    /// Page view projects to count (repeatable)
    #[arg(long = "project", default_value = DEFAULT_PAGE_VIEW_PROJECT)]
    projects: Vec<String>,

    /// Category fixup applied after loading, e.g. "-cat|Page|Category" (repeatable)
    #[arg(long = "fixup")]
    fixups: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query script, one command per line
    Query {
        /// Script path; blank lines and lines starting with '#' are ignored
        script: PathBuf,
    },
    /// Find category cycles below a category
    Cycles {
        /// Category name, with or without the "Category:" prefix
        category: String,
    },
    /// Find the pages farthest from a page along internal links
    LongestPath {
        /// Destination title, optionally namespace-prefixed
        title: String,
    },
    /// Find the globally longest shortest path between main-namespace pages
    Diameter,
    /// Count links to pages that do not exist
    Redlinks {
        /// Number of most wanted pages to list
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

/// Ticks a spinner on progress diagnostics and logs the rest.
struct ConsoleSink {
    spinner: ProgressBar,
    inner: TracingSink,
}

impl DiagnosticSink for ConsoleSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Progress {
            self.spinner
                .set_message(format!("Loading {}: {}", diagnostic.table, diagnostic.message));
            self.spinner.tick();
        } else {
            self.inner.report(diagnostic);
        }
    }
}

fn make_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn build_engine(tables: &TableArgs, spinner: &ProgressBar) -> Result<Engine> {
    let mut provider = FileProvider::new().with_table(Table::Page, &tables.pages);
    let optional = [
        (Table::CategoryLinks, &tables.categorylinks),
        (Table::TemplateLinks, &tables.templatelinks),
        (Table::PageLinks, &tables.pagelinks),
        (Table::ExternalLinks, &tables.externallinks),
        (Table::PageViews, &tables.pageviews),
    ];
    for (table, path) in optional {
        if let Some(path) = path {
            provider.set_table(table, path);
        }
    }

    let mut engine = Engine::new(provider).with_sink(ConsoleSink {
        spinner: spinner.clone(),
        inner: TracingSink,
    });

    engine.load_pages().context("Failed to load page table")?;

    if tables.pageviews.is_some() {
        let projects: FxHashSet<String> = tables.projects.iter().cloned().collect();
        engine
            .load_page_views(&projects)
            .context("Failed to load page views")?;
    }

    if !tables.fixups.is_empty() {
        let fixups = tables
            .fixups
            .iter()
            .map(|line| {
                line.parse::<Fixup>()
                    .with_context(|| format!("Invalid fixup: {}", line))
            })
            .collect::<Result<Vec<_>>>()?;
        engine
            .apply_fixups(&fixups)
            .context("Failed to apply fixups")?;
        info!(count = fixups.len(), "Fixups applied");
    }

    Ok(engine)
}

#[derive(Serialize)]
struct QueryStep {
    line: usize,
    command: String,
    outcome: Outcome,
}

#[derive(Serialize)]
struct QueryReport {
    steps: Vec<QueryStep>,
    working_set: SetReport,
}

fn emit<T: Serialize + std::fmt::Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn run_query(
    engine: &mut Engine,
    script: &Path,
    spinner: &ProgressBar,
    json: bool,
) -> Result<()> {
    let text = fs::read_to_string(script)
        .with_context(|| format!("Failed to read query script: {}", script.display()))?;

    let mut steps = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = number + 1;
        let command: Command = line
            .parse()
            .with_context(|| format!("{}:{}: cannot parse '{}'", script.display(), number, line))?;
        let outcome = command
            .execute(engine)
            .with_context(|| format!("{}:{}: '{}' failed", script.display(), number, line))?;
        steps.push(QueryStep {
            line: number,
            command: line.to_string(),
            outcome,
        });
    }
    spinner.finish_and_clear();

    let working_set = SetReport::new(engine.store(), engine.working_set());
    if json {
        let report = QueryReport { steps, working_set };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for step in &steps {
            println!("{:>4}  {:<40} {}", step.line, step.command, step.outcome);
        }
        println!();
        print!("{}", working_set);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let spinner = make_spinner();
    let start = Instant::now();
    let mut engine = build_engine(&cli.tables, &spinner)?;

    let result = match &cli.command {
        Commands::Query { script } => run_query(&mut engine, script, &spinner, cli.json),
        Commands::Cycles { category } => {
            let cycles = engine
                .category_cycles(category)
                .with_context(|| format!("Cycle search below {} failed", category))?;
            spinner.finish_and_clear();
            emit(&CycleReport::new(engine.store(), category, &cycles), cli.json)
        }
        Commands::LongestPath { title } => {
            let longest = engine
                .longest_path_to(title)
                .with_context(|| format!("Longest path search to {} failed", title))?;
            spinner.finish_and_clear();
            emit(&PathReport::new(engine.store(), &longest), cli.json)
        }
        Commands::Diameter => {
            let longest = engine
                .globally_longest_path()
                .context("All-pairs path search failed")?;
            spinner.finish_and_clear();
            emit(&PathReport::new(engine.store(), &longest), cli.json)
        }
        Commands::Redlinks { limit } => {
            let wanted = engine.red_links().context("Red link count failed")?;
            spinner.finish_and_clear();
            emit(&RedLinkReport::new(&wanted, *limit), cli.json)
        }
    };
    spinner.finish_and_clear();
    result?;

    info!(
        duration_secs = start.elapsed().as_secs_f64(),
        pages = engine.store().len(),
        "Done"
    );
    if cli.stats {
        eprint!("{}", LoadReport::new(engine.loader()));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
