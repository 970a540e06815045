use crate::CLAP_STYLING;
use clap::{arg, command};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("peerscope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("peerscope")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug)")
                .required(false)
                .action(clap::ArgAction::Count),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a gossip network from one or more seed nodes and report its \
                topology metrics.",
                )
                .arg(
                    arg!(-s --"seed" <ADDRESS>)
                        .required(false)
                        .help("Seed node address (ip:port or [ipv6]:port); may be repeated")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(-S --"seeds-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed addresses")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-n --"max-nodes" <COUNT>)
                        .required(false)
                        .help("Maximum number of nodes to crawl")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1000"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers draining the crawl frontier.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"delay" <MILLIS>)
                        .required(false)
                        .help("Pause each worker takes between nodes, in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("100"),
                )
                .arg(
                    arg!(--"retries" <ATTEMPTS>)
                        .required(false)
                        .help("Fetch attempts per node before it is marked unresponsive")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("2"),
                )
                .arg(
                    arg!(--"port" <PORT>)
                        .required(false)
                        .help("Port assumed for peer addresses that omit one")
                        .value_parser(clap::value_parser!(u16).range(1..))
                        .default_value("1984"),
                )
                .arg(
                    arg!(--"top" <COUNT>)
                        .required(false)
                        .help("Number of nodes listed in each ranking of the report")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write the annotated graph as JSON to this file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format printed to stdout: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
