use colored::Colorize;
use peerscope::commands::command_argument_builder;
use peerscope::handlers::{handle_crawl, init_tracing};
use peerscope_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let json_output = chosen_command
        .subcommand_matches("crawl")
        .and_then(|m| m.get_one::<String>("format"))
        .is_some_and(|f| f == "json");
    let quiet = chosen_command.get_flag("quiet") || json_output;
    init_tracing(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set; JSON output stays clean
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        // No subcommand provided, just show the banner
        None => return,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
