use colored::Colorize;
use rollcall::commands::command_argument_builder;
use rollcall::handlers::{
    handle_expand, handle_resolve, handle_run, handle_sweep, load_config, print_banner,
};
use rollcall::logging::{init_logging, level_for};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let config = match load_config(&chosen_command) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.store.log_file, level_for(quiet, verbose)) {
        eprintln!("{} {:#}", "⚠".yellow().bold(), e);
    }

    let result = match chosen_command.subcommand() {
        Some(("run", primary_command)) => handle_run(primary_command, config).await,
        Some(("resolve", primary_command)) => handle_resolve(primary_command, &config),
        Some(("expand", primary_command)) => handle_expand(primary_command, config),
        Some(("sweep", primary_command)) => handle_sweep(primary_command, config),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
