//! Command line front end: solves a grid layout read from a file or standard input.
//!
//! Layouts are rows of `.` (empty), `#` (water), `+` (land) and anchor sizes (`1`-`9`, then letters from 10).

use std::fs;
use std::io::{self, Read};
use std::num::NonZero;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, warn, LevelFilter};

use nurikabe::cryptic::Cryptic;
use nurikabe::SquareBoardBuilder;

/// Finds every solution of a Nurikabe puzzle.
#[derive(Parser)]
#[command(name = "solver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File holding the layout. Read from standard input if omitted.
    file: Option<PathBuf>,
    /// Treat lowercase letters as anchors of unknown size, equal letters having equal sizes.
    #[arg(long)]
    cryptic: bool,
    /// Largest size tried for each unknown.
    #[arg(long, default_value_t = 9, requires = "cryptic")]
    max_size: usize,
    /// Stop after this many solutions. With --cryptic, every assignment is still searched in full and counted, but
    /// at most this many solutions are printed for each.
    #[arg(long)]
    limit: Option<usize>,
    /// Give up after this many seconds, printing what was found so far.
    #[arg(long)]
    timeout: Option<u64>,
    /// Log more; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .parse_default_env()
        .init();

    let layout = match &cli.file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?,
        None => {
            let mut layout = String::new();
            io::stdin().read_to_string(&mut layout).context("could not read standard input")?;
            layout
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    if let Some(seconds) = cli.timeout {
        let flag = Arc::clone(&cancel);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(seconds));
            flag.store(true, Ordering::Relaxed);
        });
    }

    let start = Instant::now();
    if cli.cryptic {
        run_cryptic(&cli, &layout, cancel)?;
    } else {
        run_plain(&cli, &layout, cancel)?;
    }
    info!("took {:?}", start.elapsed());

    Ok(())
}

/// Solves a layout whose anchors are all known, printing the board and each solution.
fn run_plain(cli: &Cli, layout: &str, cancel: Arc<AtomicBool>) -> Result<()> {
    let mut board = layout.parse::<SquareBoardBuilder>()?.build()?;
    println!("Board:\n{}", board);

    let mut solver = board.solver().with_cancel_flag(Arc::clone(&cancel));
    let labelings = match cli.limit {
        Some(limit) => solver.by_ref().take(limit).collect::<Vec<_>>(),
        None => solver.by_ref().collect(),
    };
    let stats = solver.stats();
    drop(solver);
    info!("visited {} search nodes, rejected {} labels", stats.visited, stats.rejected);

    if cancel.load(Ordering::Relaxed) {
        warn!("timed out; the solutions found may be incomplete");
    }

    println!("Solutions:");
    if labelings.is_empty() {
        println!("None");
    }
    for labeling in labelings {
        println!("{}", board.frame(labeling));
    }

    Ok(())
}

/// Solves a layout with unknown anchor sizes, printing the solutions under each assignment that has any.
fn run_cryptic(cli: &Cli, layout: &str, cancel: Arc<AtomicBool>) -> Result<()> {
    let max_size = NonZero::new(cli.max_size).context("--max-size must be at least 1")?;
    let cryptic = Cryptic::parse(layout)?.with_max_size(max_size).with_cancel_flag(Arc::clone(&cancel));
    println!("Unknowns: {}", cryptic.unknowns().iter().collect::<String>());

    let start = Instant::now();
    let found = cryptic.solve()?;

    let mut total = 0;
    for group in &found {
        let assignment = group.assignment.iter().map(|(letter, size)| format!("{letter}={size}")).collect::<Vec<_>>();
        println!("With {}:", assignment.join(", "));

        for solution in group.solutions.iter().take(cli.limit.unwrap_or(usize::MAX)) {
            println!("{}", solution);
        }
        total += group.solutions.len();
    }

    if cancel.load(Ordering::Relaxed) {
        warn!("timed out; the solutions found may be incomplete");
    }
    println!("Total solutions: {}", total);
    println!("Elapsed: {:.3?}", start.elapsed());

    Ok(())
}
