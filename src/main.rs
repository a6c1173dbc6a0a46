// Main CLI entry point for pvreplace
// Uses clap for argument parsing; all flags are resolved once into immutable
// policies before the first URL is read

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use pvreplace::banner;
use pvreplace::config::{load_policies, resolve_policies};
use pvreplace::engine::{MutationEngine, RunStats};
use pvreplace::error::Error;
use pvreplace::logging;
use pvreplace::payloads::{encode_payloads, load_payloads, read_list_file, split_list};
use pvreplace::raw::{collect_request_files, RawRequestMutator};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_INPUT: i32 = 74;
const EXIT_INTERRUPTED: i32 = 130;

/// Single-dash long flags from older releases and their current spelling.
const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("payload", "--payload"),
    ("list", "--list"),
    ("raw", "--raw"),
    ("ignore-lines", "--ignore-lines"),
    ("fuzzing-part", "--part"),
    ("fuzzing-type", "--type"),
    ("fuzzing-mode", "--mode"),
    ("config", "--config"),
    ("silent", "--silent"),
    ("verbose", "--verbose"),
    ("version", "--version"),
];

/// Rewrite legacy `-flag` / `-flag=value` arguments to their `--` form.
///
/// Returns the rewritten argv and each legacy flag seen with its replacement.
fn normalize_legacy_args<I>(args: I) -> (Vec<OsString>, Vec<(String, &'static str)>)
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut seen = Vec::new();
    let mut passthrough = false;

    for arg in args {
        let rewritten = match arg.to_str() {
            Some("--") => {
                passthrough = true;
                None
            }
            Some(s) if !passthrough && s.starts_with('-') && !s.starts_with("--") => {
                let (name, value) = match s[1..].split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (&s[1..], None),
                };
                LEGACY_FLAGS
                    .iter()
                    .find(|(legacy, _)| *legacy == name)
                    .map(|(_, current)| {
                        seen.push((format!("-{}", name), *current));
                        match value {
                            Some(v) => OsString::from(format!("{}={}", current, v)),
                            None => OsString::from(*current),
                        }
                    })
            }
            _ => None,
        };
        out.push(rewritten.unwrap_or(arg));
    }

    (out, seen)
}

fn build_cli() -> Command {
    Command::new("pvreplace")
        .version(banner::VERSION)
        .author("Jake Abendroth")
        .about("Injects fuzzing payloads into URL parameters, names and paths")
        .after_help("EXAMPLES:\n  cat urls.txt | pvreplace --payload FUZZ\n  pvreplace -u 'http://x.com/a?id=1' --part param-name --type prefix --mode single\n  pvreplace -l urls.txt -p payloads.txt --encode --part all\n  pvreplace --raw requests/ --ignore-lines 'Host,Content-Length'")
        .arg(Arg::new("payload")
            .short('p')
            .long("payload")
            .num_args(1)
            .default_value("FUZZ")
            .allow_hyphen_values(true)
            .help("Comma-separated payloads, or a .txt file with one payload per line"))
        .arg(Arg::new("url")
            .short('u')
            .long("url")
            .num_args(1)
            .conflicts_with_all(["list", "raw"])
            .help("Single URL to process"))
        .arg(Arg::new("list")
            .short('l')
            .long("list")
            .num_args(1)
            .conflicts_with("raw")
            .help("File with one URL per line (default: stdin)"))
        .arg(Arg::new("raw")
            .long("raw")
            .num_args(1)
            .help("Raw HTTP request file, or a directory of them"))
        .arg(Arg::new("ignore_lines")
            .long("ignore-lines")
            .num_args(1)
            .requires("raw")
            .help("Comma-separated line prefixes (or a .txt file) left untouched in raw requests"))
        .arg(Arg::new("part")
            .long("part")
            .visible_alias("fuzzing-part")
            .num_args(1)
            .default_value("param-value")
            .value_parser([
                "param-value",
                "param-name",
                "path-suffix",
                "path-suffix-slash",
                "path-segment",
                "ext-filename",
                "path-ext",
                "all",
            ])
            .help("URL part to fuzz"))
        .arg(Arg::new("type")
            .long("type")
            .visible_alias("fuzzing-type")
            .num_args(1)
            .default_value("replace")
            .value_parser(["replace", "prefix", "postfix"])
            .help("How the payload combines with the original content"))
        .arg(Arg::new("mode")
            .long("mode")
            .visible_alias("fuzzing-mode")
            .num_args(1)
            .default_value("multiple")
            .value_parser(["single", "multiple"])
            .help("One output per site (single) or all sites at once (multiple)"))
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .num_args(1)
            .conflicts_with_all(["part", "type", "mode"])
            .help("YAML file with fuzzing configurations"))
        .arg(Arg::new("encode")
            .long("encode")
            .action(ArgAction::SetTrue)
            .help("Percent-encode payloads before injecting them"))
        .arg(Arg::new("silent")
            .long("silent")
            .action(ArgAction::SetTrue)
            .help("Do not print the banner"))
        .arg(Arg::new("verbose")
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Log what is being processed to stderr"))
}

/// Where URLs are read from
enum UrlSource {
    Stdin,
    Single(String),
    List(PathBuf),
}

/// A fully resolved run, built before any input is read
enum Job {
    Urls {
        engine: MutationEngine,
        source: UrlSource,
    },
    Raw {
        mutator: RawRequestMutator,
        files: Vec<PathBuf>,
        payloads: Vec<String>,
    },
}

impl Job {
    fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let payload_source = matches
            .get_one::<String>("payload")
            .map(String::as_str)
            .unwrap_or("FUZZ");
        let mut payloads = load_payloads(payload_source).context("loading payloads")?;
        if matches.get_flag("encode") {
            payloads = encode_payloads(&payloads);
        }
        debug!("{} payload(s) loaded", payloads.len());

        if let Some(raw) = matches.get_one::<String>("raw") {
            let ignore_prefixes = match matches.get_one::<String>("ignore_lines") {
                Some(source) if source.ends_with(".txt") => {
                    read_list_file(Path::new(source)).context("loading ignore lines")?
                }
                Some(source) => split_list(source),
                None => Vec::new(),
            };
            let files = collect_request_files(Path::new(raw))?;
            return Ok(Job::Raw {
                mutator: RawRequestMutator::new(ignore_prefixes),
                files,
                payloads,
            });
        }

        let policies = match matches.get_one::<String>("config") {
            Some(path) => load_policies(Path::new(path))?,
            None => resolve_policies(
                arg_or(matches, "part", "param-value"),
                arg_or(matches, "type", "replace"),
                arg_or(matches, "mode", "multiple"),
            )?,
        };
        for policy in &policies {
            debug!(%policy, "policy resolved");
        }

        let source = if let Some(url) = matches.get_one::<String>("url") {
            UrlSource::Single(url.clone())
        } else if let Some(list) = matches.get_one::<String>("list") {
            UrlSource::List(PathBuf::from(list))
        } else {
            UrlSource::Stdin
        };

        Ok(Job::Urls {
            engine: MutationEngine::new(policies, payloads),
            source,
        })
    }

    /// Runs on a blocking thread; writes through `io::stdout()` one line at a time.
    fn run(self, cancel: &AtomicBool) -> pvreplace::Result<RunStats> {
        let mut stdout = io::stdout();
        match self {
            Job::Urls { engine, source } => match source {
                UrlSource::Stdin => engine.run(io::stdin().lock(), &mut stdout, cancel),
                UrlSource::Single(url) => engine.run(Cursor::new(url), &mut stdout, cancel),
                UrlSource::List(path) => {
                    let file = File::open(&path).map_err(|source| Error::ReadFile {
                        path: path.clone(),
                        source,
                    })?;
                    engine.run(BufReader::new(file), &mut stdout, cancel)
                }
            },
            Job::Raw {
                mutator,
                files,
                payloads,
            } => mutator.run(&files, &payloads, &mut stdout, cancel),
        }
    }
}

fn arg_or<'a>(matches: &'a ArgMatches, id: &str, default: &'a str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or(default)
}

/// Exit status for a failed run.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_config() => EXIT_CONFIG,
        Some(e) if e.is_input() => EXIT_INPUT,
        _ => EXIT_FAILURE,
    }
}

fn fail(err: anyhow::Error) -> ! {
    error!("{:#}", err);
    eprintln!("pvreplace error: {:#}", err);
    std::process::exit(exit_code(&err));
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() {
    let (args, legacy) = normalize_legacy_args(std::env::args_os());
    let matches = build_cli().get_matches_from(args);

    logging::init_logging(matches.get_flag("verbose"));
    for (flag, current) in &legacy {
        warn!("{} is deprecated, use {}", flag, current);
    }
    if !matches.get_flag("silent") {
        banner::print_banner();
    }

    let job = Job::from_matches(&matches).unwrap_or_else(|e| fail(e));

    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let mut worker = tokio::task::spawn_blocking(move || job.run(&worker_cancel));

    tokio::select! {
        joined = &mut worker => match joined {
            Ok(Ok(stats)) => {
                debug!(lines = stats.lines, emitted = stats.emitted, "done");
                std::process::exit(0);
            }
            Ok(Err(e)) => fail(e.into()),
            Err(e) => fail(anyhow::anyhow!("worker failed: {}", e)),
        },
        _ = interrupted() => {
            cancel.store(true, Ordering::SeqCst);
            // Wait out the line being written, then exit holding the lock
            let _stdout = io::stdout().lock();
            info!("interrupted");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn legacy_flags_rewritten() {
        let (args, seen) = normalize_legacy_args(os(&[
            "pvreplace",
            "-payload",
            "-1",
            "-fuzzing-part=param-name",
            "-u",
            "http://x.com/?a=1",
        ]));
        assert_eq!(
            args,
            os(&["pvreplace", "--payload", "-1", "--part=param-name", "-u", "http://x.com/?a=1"])
        );
        assert_eq!(
            seen,
            vec![("-payload".to_string(), "--payload"), ("-fuzzing-part".to_string(), "--part")]
        );
    }

    #[test]
    fn legacy_rewrite_stops_at_double_dash() {
        let (args, seen) = normalize_legacy_args(os(&["pvreplace", "--", "-list"]));
        assert_eq!(args, os(&["pvreplace", "--", "-list"]));
        assert!(seen.is_empty());
    }

    #[test]
    fn config_conflicts_with_part() {
        let result = build_cli().try_get_matches_from(["pvreplace", "--config", "c.yaml", "--part", "all"]);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_do_not_conflict_with_config() {
        let matches = build_cli()
            .try_get_matches_from(["pvreplace", "--config", "c.yaml"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("config").unwrap(), "c.yaml");
    }

    #[test]
    fn ignore_lines_requires_raw() {
        let result = build_cli().try_get_matches_from(["pvreplace", "--ignore-lines", "Host"]);
        assert!(result.is_err());
    }

    #[test]
    fn fuzzing_aliases_accepted() {
        let matches = build_cli()
            .try_get_matches_from(["pvreplace", "--fuzzing-mode", "single", "--fuzzing-type", "postfix"])
            .unwrap();
        assert_eq!(arg_or(&matches, "mode", ""), "single");
        assert_eq!(arg_or(&matches, "type", ""), "postfix");
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let config: anyhow::Error = Error::InvalidPolicy { axis: "part", value: "x".into() }.into();
        let input: anyhow::Error = Error::Input(io::Error::new(io::ErrorKind::Other, "boom")).into();
        let wrapped = anyhow::Error::from(Error::ReadFile {
            path: PathBuf::from("p.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        })
        .context("loading payloads");
        assert_eq!(exit_code(&config), EXIT_CONFIG);
        assert_eq!(exit_code(&input), EXIT_INPUT);
        assert_eq!(exit_code(&wrapped), EXIT_INPUT);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), EXIT_FAILURE);
    }
}
