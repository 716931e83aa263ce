use ward_sim::config::{self, Command, FormatArg};
use ward_sim::engine;
use ward_sim::error::Result;
use ward_sim::output::{self, Formatter, HumanFormatter, JsonFormatter, SummaryFormatter};
use ward_sim::sweep;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = config::parse_args()?;

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(args.log_level))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Run(run_args) => {
            let (config, format) = config::build_config(&run_args)?;
            let result = engine::run_simulation(&config)?;
            print!("{}", formatter_for(format).write(&result)?);
        }
        Command::Sweep(sweep_args) => {
            let (config, plan, format) = config::build_sweep(&sweep_args)?;
            let summaries = sweep::run_sweep(&config, &plan)?;
            print!("{}", formatter_for(format).write_sweep(&summaries)?);
        }
        Command::ShowConfig(run_args) => {
            let (config, _) = config::build_config(&run_args)?;
            print!("{}", output::describe_config(&config));
        }
    }

    Ok(())
}

fn formatter_for(format: FormatArg) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}
