// src/main.rs
//
// sectionize — collapsible-section retrofitter for courseware HTML
//
// - Wraps heading-delimited prose and embedded demo widgets in
//   <section id="..." section-title="..."> containers without changing any
//   reader-visible text.
// - Batch driver: walks a content root (skipping one excluded subtree),
//   transforms each file independently, and reports per-file status. A
//   failure in one file never aborts the rest of the batch.
// - Modes: dry-run (unified diffs, no writes), verified write (aborts a
//   file whose visible text would change), direct write, mirrored write
//   under an alternate output root.
// - `menu` regenerates chapters.json and sitemap.xml from the same tree.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use similar::TextDiff;

use sectionize::error::Error;
use sectionize::transform::{self, Outcome};
use sectionize::{menu, walk};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap headings and demos in collapsible sections
    Wrap(WrapArgs),
    /// Regenerate chapters.json and sitemap.xml from the content tree
    Menu(MenuArgs),
}

#[derive(Args)]
struct WrapArgs {
    /// Content root to scan
    #[arg(long, default_value = "Content")]
    root: PathBuf,

    /// Top-level subtree under the root that is never descended into
    #[arg(long, default_value = "Problems")]
    exclude: String,

    /// Print unified diffs instead of writing
    #[arg(long)]
    dry_run: bool,

    /// Only process files whose name carries the DRAFT marker
    #[arg(long)]
    only_drafts: bool,

    /// Mirror updated files under this root instead of writing in place
    #[arg(long)]
    out_root: Option<PathBuf>,

    /// Refuse any write that would change reader-visible text
    #[arg(long)]
    verify: bool,

    /// Explicit files or directories (default: the whole content root)
    paths: Vec<PathBuf>,
}

#[derive(Args)]
struct MenuArgs {
    /// Content root to scan
    #[arg(long, default_value = "Content")]
    root: PathBuf,

    /// Site root the sitemap locations point at (include the trailing slash)
    #[arg(long)]
    site_root: String,

    /// Directory receiving chapters.json and sitemap.xml
    #[arg(long, default_value = "scripts")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Wrap(args) => run_wrap(&args),
        Commands::Menu(args) => run_menu(&args),
    }
}

fn run_menu(args: &MenuArgs) -> Result<()> {
    let entries = menu::generate(&args.root, &args.site_root, &args.out_dir)?;
    println!(
        "Wrote {} and {} ({entries} entries).",
        args.out_dir.join("chapters.json").display(),
        args.out_dir.join("sitemap.xml").display(),
    );
    Ok(())
}

/// Path shown in diffs and status lines: relative to the content root's
/// parent so the root directory name stays visible.
fn display_rel(path: &Path, root: &Path) -> PathBuf {
    let base = root.parent().filter(|p| !p.as_os_str().is_empty());
    match base {
        Some(base) => path.strip_prefix(base).unwrap_or(path).to_path_buf(),
        None => path.to_path_buf(),
    }
}

fn unified_diff(old: &str, new: &str, rel: &Path) -> String {
    let rel = rel.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{rel}"), &format!("b/{rel}"))
        .to_string()
}

fn run_wrap(args: &WrapArgs) -> Result<()> {
    let targets = walk::collect_targets(&args.root, &args.paths, &args.exclude);
    let mut scanned = 0usize;
    let mut updated = 0usize;

    for path in &targets {
        if args.only_drafts && !walk::is_draft(path) {
            continue;
        }
        let (html, fell_back) = match walk::read_text_best_effort(path) {
            Ok(read) => read,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "unreadable, skipped");
                continue;
            }
        };
        if fell_back {
            tracing::warn!(path = %path.display(), "not valid UTF-8, decoded as windows-1252");
        }
        scanned += 1;

        let new_html = match transform::transform_document(&html) {
            Outcome::NoBody => {
                tracing::debug!(path = %path.display(), "no body region, skipped");
                continue;
            }
            Outcome::Unchanged => continue,
            Outcome::Changed { html } => html,
        };
        let rel = display_rel(path, &args.root);

        if args.dry_run {
            print!("{}", unified_diff(&html, &new_html, &rel));
            updated += 1;
            continue;
        }

        let dest = match &args.out_root {
            Some(out_root) => out_root.join(&rel),
            None => path.clone(),
        };
        let written = if args.verify {
            walk::write_verified(&dest, &html, &new_html)
        } else {
            walk::write_text_utf8(&dest, &new_html).map_err(Error::from)
        };
        match written {
            Ok(()) => {
                println!("Updated: {}", rel.display());
                updated += 1;
            }
            Err(Error::TextNotPreserved(_)) => {
                println!("Verification failed: {}", rel.display());
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "write failed");
            }
        }
    }

    if args.dry_run {
        println!("Generated diffs for {updated} of {scanned} HTML files.");
    } else {
        println!("Scanned {scanned} HTML files; updated {updated}.");
    }
    Ok(())
}
