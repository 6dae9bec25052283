//! risk-runner: headless profit-risk simulation for a short-term rental unit.
//!
//! Usage:
//!   risk-runner --listings data/listings/sample_listings.csv \
//!       --region Alvalade --typology T1 --price 85 --cost 30
//!   risk-runner --listings listings.csv --region Alvalade --typology T1 \
//!       --price 85 --cost 30 --price-delta 10 --occupancy-delta -20 --json
//!   risk-runner --listings listings.csv --ipc-mode

use anyhow::{anyhow, Context, Result};
use stayrisk_core::{
    Cohort, RiskOutcome, RiskSimulator, SegmentSelector, SimConfig, SimRng, SimulationParams,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Simulate(SimulateRequest),
    Quit,
}

#[derive(serde::Deserialize)]
struct SimulateRequest {
    region: String,
    typology: String,
    predicted_price: f64,
    cost_per_night: f64,
    #[serde(default)]
    price_delta_pct: f64,
    #[serde(default)]
    occupancy_delta_pct: f64,
    #[serde(default)]
    n_samples: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
}

/// One-shot simulation request taken from the command line.
#[derive(Debug, PartialEq)]
struct CliRequest {
    region: String,
    typology: String,
    price: f64,
    cost: f64,
    price_delta: f64,
    occupancy_delta: f64,
    samples: usize,
    seed: u64,
}

impl CliRequest {
    fn parse(args: &[String], config: &SimConfig) -> Result<Self> {
        Ok(Self {
            region: require_str(args, "--region")?.to_string(),
            typology: require_str(args, "--typology")?.to_string(),
            price: floor_price(require_arg(args, "--price")?),
            cost: require_arg(args, "--cost")?,
            price_delta: parse_arg(args, "--price-delta")?.unwrap_or(0.0),
            occupancy_delta: parse_arg(args, "--occupancy-delta")?.unwrap_or(0.0),
            samples: parse_arg(args, "--samples")?.unwrap_or(config.default_samples),
            seed: parse_arg(args, "--seed")?.unwrap_or(config.default_seed),
        })
    }

    fn params(&self) -> SimulationParams {
        SimulationParams::new(self.price, self.cost)
            .with_price_delta(self.price_delta)
            .with_occupancy_delta(self.occupancy_delta)
            .with_samples(self.samples)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let json = args.iter().any(|a| a == "--json");
    let data_dir = arg_str(&args, "--data-dir")?.unwrap_or("./data");

    let config = if std::path::Path::new(data_dir).join("risk").exists() {
        SimConfig::load(data_dir)?
    } else {
        log::warn!("no config under {data_dir}/risk, using built-in defaults");
        SimConfig::default_test()
    };
    let simulator = RiskSimulator::new(&config)?;

    let listings = require_str(&args, "--listings")?;
    let cohort = Cohort::from_csv_path(listings, &config)
        .with_context(|| format!("loading listings from {listings}"))?;

    if ipc_mode {
        return run_ipc_loop(&simulator, &cohort, &config);
    }

    let req = CliRequest::parse(&args, &config)?;
    let selector = SegmentSelector::new(req.region.as_str(), req.typology.as_str());

    if !json {
        println!("Short-term rental risk - risk-runner");
        println!("  listings:  {listings} ({} records)", cohort.len());
        println!("  segment:   {} / {}", req.region, req.typology);
        println!("  price:     {:.2}  cost: {:.2}", req.price, req.cost);
        println!("  samples:   {}", req.samples);
        println!("  seed:      {}", req.seed);
        println!();
    }

    let mut rng = SimRng::new(req.seed).with_name("cli");
    let outcome = simulator.simulate(&cohort, &selector, &req.params(), &mut rng)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, &cohort);
    }
    Ok(())
}

fn run_ipc_loop(simulator: &RiskSimulator, cohort: &Cohort, config: &SimConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        match handle_ipc_line(simulator, cohort, config, &buffer)? {
            Some(response) => writeln!(stdout, "{response}")?,
            None => break,
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Answer one request line. `None` means the client asked to quit.
/// Malformed requests and invalid parameters are answered with an
/// `{"error": ...}` line; the session stays open.
fn handle_ipc_line(
    simulator: &RiskSimulator,
    cohort: &Cohort,
    config: &SimConfig,
    line: &str,
) -> Result<Option<String>> {
    let cmd: IpcCommand = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(e) => return Ok(Some(serde_json::json!({ "error": e.to_string() }).to_string())),
    };

    let req = match cmd {
        IpcCommand::Quit => return Ok(None),
        IpcCommand::Simulate(req) => req,
    };

    let params = SimulationParams::new(floor_price(req.predicted_price), req.cost_per_night)
        .with_price_delta(req.price_delta_pct)
        .with_occupancy_delta(req.occupancy_delta_pct)
        .with_samples(req.n_samples.unwrap_or(config.default_samples));
    let selector = SegmentSelector::new(req.region, req.typology);
    let mut rng = SimRng::new(req.seed.unwrap_or(config.default_seed)).with_name("ipc");

    let response = match simulator.simulate(cohort, &selector, &params, &mut rng) {
        Ok(outcome) => serde_json::to_string(&outcome)?,
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    };
    Ok(Some(response))
}

fn print_outcome(outcome: &RiskOutcome, cohort: &Cohort) {
    match outcome {
        RiskOutcome::InsufficientData { matched, required } => {
            println!("=== INSUFFICIENT DATA ===");
            println!("  matched records: {matched} (need {required})");
            println!("  regions:    {}", cohort.regions().join(", "));
            println!("  typologies: {}", cohort.typologies().join(", "));
        }
        RiskOutcome::Summary(s) => {
            println!("=== RISK SUMMARY ===");
            println!("  comparable listings:   {}", s.cohort_size);
            println!("  adjusted price:        {:.2} / night", s.adjusted_price);
            println!(
                "  adjusted occupancy:    {:.1} nights/year (std {:.1})",
                s.adjusted_occupancy_mean, s.occupancy_std
            );
            println!("  mean annual profit:    {:.2}", s.mean_profit);
            println!("  profit std:            {:.2}", s.std_profit);
            println!("  probability of loss:   {:.1}%", s.prob_loss * 100.0);
            println!();
            println!("=== PROFIT PERCENTILES ===");
            let p = &s.percentiles;
            println!("  P5:  {:.2}", p.p5);
            println!("  P25: {:.2}", p.p25);
            println!("  P50: {:.2}", p.p50);
            println!("  P75: {:.2}", p.p75);
            println!("  P95: {:.2}", p.p95);
        }
    }
}

/// A regression model can predict a negative nightly price; treat it as free.
fn floor_price(price: f64) -> f64 {
    if price < 0.0 {
        log::warn!("predicted price {price:.2} is negative, using 0");
        return 0.0;
    }
    price
}

/// Value following `flag`, if the flag is present. A trailing flag with
/// no value is an error rather than "absent".
fn arg_str<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    if args.last().is_some_and(|a| a == flag) {
        return Err(anyhow!("{flag} expects a value"));
    }
    Ok(args
        .windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str()))
}

fn require_str<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    arg_str(args, flag)?.with_context(|| format!("{flag} is required"))
}

/// Parsed value of `flag`. Absent is `Ok(None)`; present but unparseable
/// is an error naming the flag, never a silent default.
fn parse_arg<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match arg_str(args, flag)? {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid value '{raw}' for {flag}: {e}")),
    }
}

fn require_arg<T>(args: &[String], flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_arg(args, flag)?.with_context(|| format!("{flag} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stayrisk_core::CohortRecord;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("risk-runner")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn base_args(extra: &[&str]) -> Vec<String> {
        let mut list = vec![
            "--region", "Alvalade", "--typology", "T1", "--price", "50", "--cost", "20",
        ];
        list.extend_from_slice(extra);
        args(&list)
    }

    fn cohort() -> Cohort {
        Cohort::new(
            (0..12)
                .map(|i| CohortRecord::new("Alvalade", "T1", 100.0 + i as f64 * 10.0))
                .collect(),
        )
    }

    #[test]
    fn negative_predicted_price_is_floored() {
        assert_eq!(floor_price(-12.5), 0.0);
        assert_eq!(floor_price(0.0), 0.0);
        assert_eq!(floor_price(73.0), 73.0);
    }

    #[test]
    fn full_request_parses() {
        let config = SimConfig::default_test();
        let req = CliRequest::parse(
            &base_args(&["--price-delta", "10", "--occupancy-delta", "-20", "--samples", "500"]),
            &config,
        )
        .unwrap();
        assert_eq!(req.region, "Alvalade");
        assert_eq!(req.price_delta, 10.0);
        assert_eq!(req.occupancy_delta, -20.0);
        assert_eq!(req.samples, 500);
        assert_eq!(req.seed, config.default_seed);
    }

    #[test]
    fn absent_optional_flags_use_config_defaults() {
        let config = SimConfig::default_test();
        let req = CliRequest::parse(&base_args(&[]), &config).unwrap();
        assert_eq!(req.price_delta, 0.0);
        assert_eq!(req.occupancy_delta, 0.0);
        assert_eq!(req.samples, config.default_samples);
    }

    #[test]
    fn negative_price_flag_is_floored() {
        let list = args(&["--region", "A", "--typology", "T1", "--price", "-3", "--cost", "1"]);
        let req = CliRequest::parse(&list, &SimConfig::default_test()).unwrap();
        assert_eq!(req.price, 0.0);
    }

    #[test]
    fn unparseable_values_are_errors_not_defaults() {
        let config = SimConfig::default_test();
        for (flag, value) in [("--samples", "-5"), ("--price-delta", "1O"), ("--seed", "x")] {
            let err = CliRequest::parse(&base_args(&[flag, value]), &config).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains(flag), "error for {flag} did not name it: {msg}");
        }
    }

    #[test]
    fn missing_price_or_cost_is_reported_as_missing() {
        let config = SimConfig::default_test();
        let no_price = args(&["--region", "A", "--typology", "T1", "--cost", "20"]);
        let err = CliRequest::parse(&no_price, &config).unwrap_err();
        assert_eq!(err.to_string(), "--price is required");

        let no_cost = args(&["--region", "A", "--typology", "T1", "--price", "50"]);
        let err = CliRequest::parse(&no_cost, &config).unwrap_err();
        assert_eq!(err.to_string(), "--cost is required");
    }

    #[test]
    fn trailing_flag_without_value_is_an_error() {
        let err = CliRequest::parse(&base_args(&["--samples"]), &SimConfig::default_test())
            .unwrap_err();
        assert!(err.to_string().contains("--samples"));
    }

    #[test]
    fn ipc_session_answers_errors_and_summaries() {
        let config = SimConfig::default_test();
        let simulator = RiskSimulator::new(&config).unwrap();
        let cohort = cohort();

        let garbled = handle_ipc_line(&simulator, &cohort, &config, "{not json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&garbled.unwrap()).unwrap();
        assert!(value["error"].is_string());

        let invalid = r#"{"type":"simulate","region":"Alvalade","typology":"T1",
            "predicted_price":50,"cost_per_night":20,"n_samples":0}"#;
        let reply = handle_ipc_line(&simulator, &cohort, &config, invalid).unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply.unwrap()).unwrap();
        assert!(value["error"].as_str().unwrap().contains("n_samples"));

        let ok = r#"{"type":"simulate","region":"Alvalade","typology":"T1",
            "predicted_price":50,"cost_per_night":20,"n_samples":200,"seed":3}"#;
        let reply = handle_ipc_line(&simulator, &cohort, &config, ok).unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply.unwrap()).unwrap();
        assert_eq!(value["outcome"], "summary");
        assert_eq!(value["n_samples"], 200);

        let quit = handle_ipc_line(&simulator, &cohort, &config, r#"{"type":"quit"}"#).unwrap();
        assert!(quit.is_none());
    }

    #[test]
    fn ipc_reports_insufficient_data_as_outcome() {
        let config = SimConfig::default_test();
        let simulator = RiskSimulator::new(&config).unwrap();
        let req = r#"{"type":"simulate","region":"Belem","typology":"T1",
            "predicted_price":50,"cost_per_night":20}"#;
        let reply = handle_ipc_line(&simulator, &cohort(), &config, req).unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply.unwrap()).unwrap();
        assert_eq!(value["outcome"], "insufficient_data");
        assert_eq!(value["matched"], 0);
    }
}
