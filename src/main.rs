use anyhow::{bail, Context};
use clap::{Arg, Command};
use log::LevelFilter;
use phish_probe::engine::collect_findings;
use phish_probe::{DecodedFinding, EngineConfig, ScanEngine, Watchlist};
use std::path::Path;
use std::process;
use url::Url;

fn main() {
    let matches = Command::new("phish-probe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Offline phishing/scam indicator analysis for URLs and fetched pages")
        .arg(
            Arg::new("url")
                .value_name("URL")
                .help("URL whose components are fed through the decoding engine")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .value_name("FILE")
                .help("Analyze a saved HTML response body instead of a URL")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Engine configuration file (YAML)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("watchlist")
                .short('w')
                .long("watchlist")
                .value_name("FILE")
                .help("Additional brand/scam-term watchlist (YAML), merged over the builtin lists")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Emit the report as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => EngineConfig::load_from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", path, e))?,
        None => EngineConfig::default(),
    };

    let mut watchlist = Watchlist::builtin();
    if let Some(path) = matches.get_one::<String>("watchlist") {
        let user = Watchlist::load_from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("failed to load watchlist {}: {}", path, e))?;
        watchlist.merge(user);
    }

    let engine = ScanEngine::new(config, watchlist);
    let as_json = matches.get_flag("json");

    if let Some(path) = matches.get_one::<String>("html") {
        let body = std::fs::read(path).with_context(|| format!("failed to read {}", path))?;
        report_body(&engine, &body, as_json)?;
        return Ok(());
    }

    if let Some(raw) = matches.get_one::<String>("url") {
        let parsed = Url::parse(raw).with_context(|| format!("unparseable URL: {}", raw))?;
        report_url(&engine, &parsed, as_json)?;
        return Ok(());
    }

    bail!("nothing to analyze: pass a URL or --html FILE");
}

/// Candidate strings out of one URL: path segments, the raw query (the
/// engine's query-pair strategy takes it whole), and the fragment. The
/// domain itself goes through the external suffix-list splitter, not
/// through here.
fn url_candidates(parsed: &Url) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(segments) = parsed.path_segments() {
        for segment in segments {
            if !segment.is_empty() {
                candidates.push(segment.to_string());
            }
        }
    }
    if let Some(query) = parsed.query() {
        candidates.push(query.to_string());
    }
    if let Some(fragment) = parsed.fragment() {
        candidates.push(fragment.to_string());
    }
    candidates
}

fn report_url(engine: &ScanEngine, parsed: &Url, as_json: bool) -> anyhow::Result<()> {
    let mut findings: Vec<DecodedFinding> = Vec::new();
    for candidate in url_candidates(parsed) {
        if let Some(root) = engine.analyze_candidate(&candidate) {
            findings.extend(collect_findings(&root));
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
        return Ok(());
    }

    if findings.is_empty() {
        println!("no decode findings for {}", parsed);
        return Ok(());
    }
    println!("{} finding(s) for {}:", findings.len(), parsed);
    for finding in &findings {
        print_finding(finding);
    }
    Ok(())
}

fn report_body(engine: &ScanEngine, body: &[u8], as_json: bool) -> anyhow::Result<()> {
    let analysis = engine.analyze_body(body);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    if analysis.oversized {
        println!("body rejected by the size gate ({} bytes)", body.len());
        return Ok(());
    }
    match &analysis.html {
        Some(html) => println!(
            "html range {}..{} (closed: {})",
            html.range.start, html.range.end, html.closed
        ),
        None => println!("no <html> structure found"),
    }
    println!(
        "{} script(s), {} meta-refresh tag(s)",
        analysis.scripts.len(),
        analysis.meta_refresh.len()
    );
    for script in &analysis.scripts {
        println!(
            "  script at {}: {:?} / {:?}{}",
            script.start,
            script.origin,
            script.context,
            script
                .src
                .as_deref()
                .map(|s| format!(" src={}", s))
                .unwrap_or_default()
        );
    }
    for finding in &analysis.script_findings {
        print_finding(finding);
    }
    Ok(())
}

fn print_finding(finding: &DecodedFinding) {
    let mut what = Vec::new();
    if !finding.brands.is_empty() {
        what.push(format!("brands: {}", finding.brands.join(", ")));
    }
    if !finding.terms.is_empty() {
        what.push(format!("terms: {}", finding.terms.join(", ")));
    }
    if let Some(entropy) = finding.entropy {
        what.push(format!("entropy: {:.2}", entropy));
    }
    println!(
        "  [{}] {:?} -> {}",
        finding.method_chain.join(" > "),
        finding.value,
        what.join("; ")
    );
}
