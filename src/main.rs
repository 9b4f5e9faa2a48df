mod demos;

use clap::Parser;
use log::info;
use smlcore::{declare, describe, initial_state, Error, Options};

#[derive(Parser)]
#[command(name = "smlcore")]
#[command(about = "Elaborate and evaluate Standard ML core declarations", long_about = None)]
struct Cli {
    /// List the bundled demo programs
    #[arg(long)]
    list: bool,

    /// Declare every declaration of a demo program in order
    #[arg(long, value_name = "NAME")]
    demo: Option<String>,

    /// Only elaborate, do not evaluate
    #[arg(long)]
    no_evaluation: bool,

    /// Only evaluate, do not elaborate
    #[arg(long)]
    no_elaboration: bool,

    /// Do not warn about nonexhaustive matches
    #[arg(long)]
    no_exhaustiveness_warnings: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        for demo in demos::DEMOS {
            println!("{:<12} {}", demo.name, demo.description);
        }
        return Ok(());
    }

    let Some(name) = cli.demo else {
        anyhow::bail!("nothing to do, pass --demo <NAME> or --list");
    };
    let Some(demo) = demos::find(&name) else {
        anyhow::bail!("unknown demo '{}', see --list", name);
    };
    let options = Options {
        disable_elaboration: cli.no_elaboration,
        disable_evaluation: cli.no_evaluation,
        warn_nonexhaustive: !cli.no_exhaustiveness_warnings,
    };
    run(demo, &options)
}

fn run(demo: &demos::Demo, options: &Options) -> anyhow::Result<()> {
    info!("running demo {}", demo.name);
    let mut state = initial_state();

    for declaration in (demo.program)() {
        let outcome = match declare(declaration, &state, options) {
            Ok(outcome) => outcome,
            Err(error @ Error::Elaboration(_)) => {
                eprintln!("{}", error);
                continue;
            }
            Err(error) => return Err(error.into()),
        };

        for warning in &outcome.warnings {
            eprintln!("{}", warning);
        }
        print!("{}", outcome.state.take_output());

        if let Some(exception) = &outcome.exception {
            println!("Uncaught SML exception: {}", exception.render(&outcome.state));
            continue;
        }

        let id = outcome.state.id();
        for name in outcome.state.declared_names(id) {
            if let Some(line) = describe(&name, &outcome.state) {
                println!("val {}", line);
            }
        }
        state = outcome.state;
    }

    Ok(())
}
