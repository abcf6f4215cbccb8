use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mdnav_watch::{logs, watcher, FsStore, Outcome, Processor, Settings, SkipReason, WriteGuard};
use tracing::{info, warn};

const USAGE: &str = "Usage: mdnav-watch watch <vault> [--settings <file>]\n       \
                     mdnav-watch run <vault> <relative-file> [--settings <file>]\n       \
                     mdnav-watch print <file> [--settings <file>]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logs::init();

    let (positional, settings_path) = parse_args(env::args().skip(1))?;
    let settings = Settings::load(settings_path.as_deref())?;
    let args: Vec<&str> = positional.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["watch", vault] => watch(Path::new(vault), settings),
        ["run", vault, file] => run(Path::new(vault), Path::new(file), settings),
        ["print", file] => print(Path::new(file), &settings),
        _ => Err(USAGE.into()),
    }
}

fn parse_args(
    args: impl Iterator<Item = String>,
) -> Result<(Vec<String>, Option<PathBuf>), Box<dyn std::error::Error>> {
    let mut positional = Vec::new();
    let mut settings = None;
    let mut args = args;
    while let Some(arg) = args.next() {
        if arg == "--settings" {
            let path = args.next().ok_or(USAGE)?;
            settings = Some(PathBuf::from(path));
        } else {
            positional.push(arg);
        }
    }
    Ok((positional, settings))
}

fn watch(vault: &Path, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let debounce = Duration::from_millis(settings.debounce_ms);
    let processor = Processor::new(FsStore::new(vault), settings, WriteGuard::default());
    let handle = watcher::watch_vault(vault, Arc::new(processor), debounce)?;
    handle.join();
    Ok(())
}

fn run(vault: &Path, file: &Path, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let processor = Processor::new(FsStore::new(vault), settings, WriteGuard::default());
    match processor.process(file)? {
        Outcome::Rewritten => info!(path = %file.display(), "note updated"),
        Outcome::Unchanged => info!(path = %file.display(), "note already up to date"),
        Outcome::Skipped(SkipReason::NotMarkdown) => warn!("no Markdown file given"),
        Outcome::Skipped(SkipReason::Excluded) => warn!(path = %file.display(), "folder excluded"),
        Outcome::Skipped(SkipReason::Guarded) => warn!(path = %file.display(), "note is being written"),
    }
    Ok(())
}

fn print(file: &Path, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(file)?;
    let stem = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    print!("{}", mdnav_rs::transform(&raw, &stem, &settings.transform_config()));
    Ok(())
}
