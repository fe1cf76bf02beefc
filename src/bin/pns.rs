//! Command line front end for the synthesis engine.

use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use RustPNS::net::io;
use RustPNS::synth::{LogSink, PNProperties, Synthesis};
use RustPNS::ts::{limited_unfolding, parse_ts, render_ts, TransitionSystem};

fn make_command() -> Command {
    let properties_arg = Arg::new("properties")
        .short('p')
        .long("properties")
        .value_name("LIST")
        .help("Comma separated net properties: pure, plain, tnet, on, cf, safe, k-bounded")
        .default_value("none");

    Command::new("pns")
        .version("0.1.0")
        .about("Petri net synthesis from labeled transition systems")
        .subcommand_required(true)
        .subcommand(
            Command::new("synth")
                .about("Synthesize a Petri net from a .ts file")
                .arg(Arg::new("input").required(true).value_name("FILE"))
                .arg(properties_arg.clone())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write the net as JSON instead of printing the text form"),
                )
                .arg(
                    Arg::new("dot")
                        .long("dot")
                        .value_name("FILE")
                        .help("Also write the net in DOT format"),
                ),
        )
        .subcommand(
            Command::new("word")
                .about("Check whether a word is solvable by a net of the given class")
                .arg(Arg::new("word").required(true).value_name("WORD"))
                .arg(properties_arg.clone()),
        )
        .subcommand(
            Command::new("words")
                .about("Enumerate solvable or minimally unsolvable words over an alphabet")
                .arg(
                    Arg::new("alphabet")
                        .short('a')
                        .long("alphabet")
                        .required(true)
                        .value_name("LETTERS"),
                )
                .arg(properties_arg)
                .arg(
                    Arg::new("max-length")
                        .short('l')
                        .long("max-length")
                        .value_name("N")
                        .default_value("6"),
                )
                .arg(
                    Arg::new("unsolvable")
                        .long("unsolvable")
                        .action(ArgAction::SetTrue)
                        .help("Print minimally unsolvable words instead of solvable ones"),
                ),
        )
        .subcommand(
            Command::new("unfold")
                .about("Compute the limited unfolding of a .ts file")
                .arg(Arg::new("input").required(true).value_name("FILE"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write the unfolding as .ts text; default is stdout"),
                ),
        )
}

fn load_ts(path: &str) -> Result<TransitionSystem> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read '{}'", path))?;
    let ts = parse_ts(&content).with_context(|| format!("cannot parse '{}'", path))?;
    Ok(ts)
}

fn parse_properties(matches: &ArgMatches) -> Result<PNProperties> {
    let options = matches
        .get_one::<String>("properties")
        .expect("option has a default");
    Ok(PNProperties::parse(options)?)
}

fn run_synth(matches: &ArgMatches) -> Result<ExitCode> {
    let input = matches.get_one::<String>("input").expect("required");
    let properties = parse_properties(matches)?;
    let ts = load_ts(input)?;

    if ts.initial().is_none() {
        bail!("'{}' does not mark an initial state", input);
    }
    ts.check_deterministic()
        .context("synthesis needs a deterministic transition system")?;

    let synthesis = Synthesis::builder(&ts)
        .properties(properties)
        .event_sink(Box::new(LogSink))
        .build()?;

    let Some(result) = synthesis.synthesize_petri_net() else {
        eprintln!("The transition system cannot be synthesized.");
        for group in synthesis.failed_state_separation_groups() {
            let names: Vec<&str> = group.iter().map(|&s| ts.state_name(s)).collect();
            eprintln!("  inseparable states: {}", names.join(", "));
        }
        for (event, states) in synthesis.failed_event_state_separation() {
            let names: Vec<&str> = states.iter().map(|&s| ts.state_name(s)).collect();
            eprintln!(
                "  event '{}' cannot be disabled in: {}",
                ts.event_label(*event),
                names.join(", ")
            );
        }
        return Ok(ExitCode::FAILURE);
    };

    log::info!(
        "synthesized {} places and {} transitions from {} regions",
        result.net.places_len(),
        result.net.transitions_len(),
        synthesis.separating_regions().len()
    );

    match matches.get_one::<String>("output") {
        Some(path) => {
            io::write_json(path, &result.net)
                .with_context(|| format!("cannot write '{}'", path))?;
        }
        None => print!("{}", io::render_net(&result.net)),
    }
    if let Some(path) = matches.get_one::<String>("dot") {
        result
            .net
            .write_dot(path)
            .with_context(|| format!("cannot write '{}'", path))?;
    }
    Ok(ExitCode::SUCCESS)
}

fn run_word(matches: &ArgMatches) -> Result<ExitCode> {
    let word = matches.get_one::<String>("word").expect("required");
    let properties = parse_properties(matches)?;
    let letters: Vec<String> = word.chars().map(|c| c.to_string()).collect();
    if RustPNS::synth::word::is_solvable_word(&letters, &properties)? {
        println!("'{}' is solvable ({})", word, properties);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("'{}' is unsolvable ({})", word, properties);
        Ok(ExitCode::FAILURE)
    }
}

fn run_words(matches: &ArgMatches) -> Result<ExitCode> {
    let alphabet: Vec<String> = matches
        .get_one::<String>("alphabet")
        .expect("required")
        .chars()
        .map(|c| c.to_string())
        .collect();
    let max_length: usize = matches
        .get_one::<String>("max-length")
        .expect("option has a default")
        .parse()
        .context("--max-length must be a number")?;
    let properties = parse_properties(matches)?;

    let report = RustPNS::synth::word::enumerate_words(&properties, &alphabet, max_length)?;
    let words = if matches.get_flag("unsolvable") {
        &report.unsolvable
    } else {
        &report.solvable
    };
    for word in words {
        println!("{}", word.concat());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_unfold(matches: &ArgMatches) -> Result<ExitCode> {
    let input = matches.get_one::<String>("input").expect("required");
    let ts = load_ts(input)?;
    let unfolding = limited_unfolding(&ts)?;
    let rendered = render_ts(&unfolding.ts);
    match matches.get_one::<String>("output") {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("cannot write '{}'", path))?
        }
        None => print!("{}", rendered),
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let env = env_logger::Env::new()
        .filter("PNS_LOG")
        .write_style("PNS_LOG_STYLE");
    env_logger::init_from_env(env);

    let matches = make_command().get_matches();
    match matches.subcommand() {
        Some(("synth", sub)) => run_synth(sub),
        Some(("word", sub)) => run_word(sub),
        Some(("words", sub)) => run_words(sub),
        Some(("unfold", sub)) => run_unfold(sub),
        _ => unreachable!("subcommand is required"),
    }
}
