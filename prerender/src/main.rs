use colored::Colorize;
use prerender::commands::command_argument_builder;
use prerender::handlers::{EXIT_ERROR, handle_mirror, log_level};

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();

    tracing_subscriber::fmt()
        .with_max_level(log_level(matches.get_count("verbose")))
        .with_writer(std::io::stderr)
        .init();

    let code = match handle_mirror(&matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            EXIT_ERROR
        }
    };

    std::process::exit(code);
}
