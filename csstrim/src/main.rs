use clap::Parser;
use csstrim_lib::{PruneOptions, PruneOutcome, PruneReport, Pruner};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csstrim")]
#[command(about = "Remove CSS rules that cannot match anything in the given HTML pages")]
struct Args {
    /// Stylesheet to prune.
    css: PathBuf,

    /// HTML pages to prune against. Each page gets its own pruned stylesheet.
    #[arg(required = true)]
    html: Vec<PathBuf>,

    /// Write `<page>.css` for every page into this directory instead of
    /// printing to stdout. Required when more than one page is given.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Refuse any input larger than this many bytes.
    #[arg(long)]
    max_input_bytes: Option<usize>,

    /// Print what was removed for every page to stderr.
    #[arg(short, long)]
    report: bool,
}

/// Raw bytes; the library checks the encoding so bad input gets its own
/// error kind.
fn read_input(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("Error reading {}: {}", path.display(), e))
}

/// `site/page.html` becomes `<dir>/page.css`.
fn output_path(dir: &Path, page: &Path) -> PathBuf {
    let stem = page
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    dir.join(format!("{stem}.css"))
}

/// One output file per page. Two pages that would write the same file are
/// an error, reported before anything is written.
fn output_paths(dir: &Path, pages: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    let mut paths = Vec::with_capacity(pages.len());
    for page in pages {
        let path = output_path(dir, page);
        if let Some(first) = claimed.insert(path.clone(), page) {
            return Err(format!(
                "{} and {} would both be written to {}",
                first.display(),
                page.display(),
                path.display()
            ));
        }
        paths.push(path);
    }
    Ok(paths)
}

fn print_report(page: &Path, report: &PruneReport) {
    eprintln!(
        "{}: {} rulesets analyzed, {} dropped, {} rewritten, {} selectors removed, {} comments removed, {} empty rulesets removed",
        page.display(),
        report.rulesets_analyzed,
        report.rulesets_dropped,
        report.rulesets_rewritten,
        report.selectors_removed,
        report.comments_removed,
        report.empty_rulesets_removed
    );
}

fn run(args: &Args) -> Result<(), String> {
    if args.output_dir.is_none() && args.html.len() > 1 {
        return Err("--output-dir is required when pruning against more than one page".into());
    }
    let destinations = match &args.output_dir {
        Some(dir) => Some(output_paths(dir, &args.html)?),
        None => None,
    };

    let mut options = PruneOptions::new();
    if let Some(limit) = args.max_input_bytes {
        options = options.with_max_input_bytes(limit);
    }
    let pruner = Pruner::new(options);

    let css = read_input(&args.css)?;
    let pages = args
        .html
        .iter()
        .map(|path| read_input(path))
        .collect::<Result<Vec<_>, _>>()?;
    let pages: Vec<&[u8]> = pages.iter().map(Vec::as_slice).collect();

    let results = pruner
        .prune_pages_bytes(&css, &pages)
        .map_err(|e| format!("Error pruning {}: {}", args.css.display(), e))?;

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Error creating {}: {}", dir.display(), e))?;
    }

    for (i, (page, result)) in args.html.iter().zip(results).enumerate() {
        let PruneOutcome { css, report } =
            result.map_err(|e| format!("Error pruning against {}: {}", page.display(), e))?;
        if args.report {
            print_report(page, &report);
        }
        match destinations.as_ref().and_then(|paths| paths.get(i)) {
            Some(path) => {
                fs::write(path, css)
                    .map_err(|e| format!("Error writing {}: {}", path.display(), e))?;
                log::info!("wrote {}", path.display());
            }
            None => println!("{css}"),
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    if let Err(message) = run(&args) {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}
