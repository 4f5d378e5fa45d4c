//! `tracing` subscriber setup driven by [`LoggingConfig`].
//!
//! Each named section routes one subsystem (a target prefix) to the console
//! and, optionally, its own rotating JSON file. The `default` section covers
//! every target not claimed by another section.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::config::{LoggingConfig, Section};

const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// True if `target` is `prefix` itself or one of its `prefix::` children.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

type DefaultFilter = FilterFn<Box<dyn Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static>>;

/// Everything not claimed by a named subsystem, up to `max_level`.
fn unclaimed_filter(subsystems: &[String], max_level: Level) -> DefaultFilter {
    let subsystems = subsystems.to_vec();
    FilterFn::new(Box::new(move |meta: &tracing::Metadata<'_>| {
        let target = meta.target();
        !subsystems.iter().any(|s| matches_prefix(target, s)) && *meta.level() <= max_level
    }))
}

// -------- rotating file writers --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file writer poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file writer poisoned"))?
            .flush()
    }
}

/// Writer that may discard everything.
struct MaybeWriter(Option<RotWriter>);

impl Write for MaybeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes each record to its subsystem's file, or the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    // Longest prefix first so nested subsystems win over their parents.
    by_prefix: Vec<(String, RotWriter)>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeWriter(self.resolve_for(meta.target()))
    }
}

/// Relative log paths live under `base_dir` (the service home).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating_writer(log_path: &Path, section: &Section) -> io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let keep = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(keep)),
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn file_writer_for(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let log_path = resolve_log_path(&section.file, base_dir);
    match open_rotating_writer(&log_path, section) {
        Ok(writer) => Some(writer),
        Err(e) => {
            // The subscriber is not installed yet, so stderr is the only sink.
            eprintln!(
                "failed to open log file for '{}' at {}: {}",
                name,
                log_path.display(),
                e
            );
            None
        }
    }
}

// -------- config → filters --------

/// Named (non-default) sections, sorted longest name first.
fn subsystem_sections(cfg: &LoggingConfig) -> Vec<(&str, &Section)> {
    let mut sections: Vec<(&str, &Section)> = cfg
        .sections
        .iter()
        .filter(|(name, _)| name.as_str() != "default")
        .map(|(name, section)| (name.as_str(), section))
        .collect();
    sections.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
    sections
}

fn targets_for<'a>(
    sections: impl Iterator<Item = (&'a str, &'a Section)>,
    level_of: impl Fn(&Section) -> &str,
) -> Targets {
    sections.fold(
        Targets::new().with_default(LevelFilter::OFF),
        |targets, (name, section)| match parse_tracing_level(level_of(section)) {
            Some(level) => targets.with_target(name, LevelFilter::from_level(level)),
            None => targets,
        },
    )
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let default = cfg
        .default_section()
        .and_then(|s| file_writer_for("default", s, base_dir));
    let by_prefix = subsystem_sections(cfg)
        .into_iter()
        .filter_map(|(name, s)| file_writer_for(name, s, base_dir).map(|w| (name.to_string(), w)))
        .collect();
    FileRouter { default, by_prefix }
}

// -------- public init --------

/// Install the global subscriber. Relative log files resolve against `base_dir`
/// (normally `server.home_dir`). Calling it twice keeps the first subscriber.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records before the subscriber goes in.
    let _ = tracing_log::LogTracer::init();

    if cfg.sections.is_empty() {
        init_default_logging();
        return;
    }

    let subsystems = subsystem_sections(cfg);
    let subsystem_names: Vec<String> = subsystems.iter().map(|(n, _)| n.to_string()).collect();
    let console_targets = targets_for(subsystems.iter().copied(), |s| s.console_level.as_str());
    let file_targets = targets_for(
        subsystems.iter().copied().filter(|(_, s)| !s.file.trim().is_empty()),
        |s| s.file_level.as_str(),
    );
    let router = build_file_router(cfg, base_dir);
    let ansi = atty::is(atty::Stream::Stdout);
    let default_section = cfg.default_section();

    let console_named = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets);

    let console_default = default_section
        .and_then(|s| parse_tracing_level(&s.console_level))
        .map(|level| {
            fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(unclaimed_filter(&subsystem_names, level))
        });

    let file_named = (!router.by_prefix.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router.clone())
            .with_filter(file_targets)
    });

    let file_default = router
        .default
        .as_ref()
        .and(default_section)
        .and_then(|s| parse_tracing_level(&s.file_level))
        .map(|level| {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router.clone())
                .with_filter(unclaimed_filter(&subsystem_names, level))
        });

    let _ = Registry::default()
        .with(console_named)
        .with(console_default)
        .with(file_named)
        .with(file_default)
        .try_init();
}

fn init_default_logging() {
    let _ = fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}
