mod check;
mod cli;
mod config;
mod dmmf_gen;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help => {
            cli::print_help();
            Ok(())
        }
        cli::Command::Check(args) => check::run(args),
    }
}
