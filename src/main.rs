use apigen::cli::CommandLineInterface;
use colored::Colorize;

fn main() {
    let command_line_interface = CommandLineInterface::load();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(command_line_interface.log_level())
        .with_target(false)
        .init();

    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
