use clap::Parser;
use unireport::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.run() {
        std::process::exit(unireport::cli::report_failure(&err));
    }
}
