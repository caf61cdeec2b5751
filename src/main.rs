use argh::FromArgs;
use log::debug;
use std::num::NonZeroUsize;
use tinysh::config::{DEFAULT_DIR_CACHE_CAPACITY, DEFAULT_NAME_CACHE_CAPACITY};
use tinysh::{Environment, ExitCode, Interpreter, Outcome, ShellConfig};

#[derive(FromArgs)]
/// A tiny interactive shell.
struct Args {
    /// evaluate a single line and exit with its exit code
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// number of PATH directory listings to cache
    #[argh(option, default = "DEFAULT_DIR_CACHE_CAPACITY")]
    dir_cache: NonZeroUsize,

    /// number of resolved command names to cache
    #[argh(option, default = "DEFAULT_NAME_CACHE_CAPACITY")]
    name_cache: NonZeroUsize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();
    let config = ShellConfig {
        dir_cache_capacity: args.dir_cache,
        name_cache_capacity: args.name_cache,
    };
    debug!("starting with {:?}", config);

    let mut sh = Interpreter::with_environment(Environment::new(config));
    let code = match args.command {
        Some(line) => eval_once(&mut sh, &line),
        None => match sh.repl() {
            Ok(code) => code,
            Err(err) => {
                eprintln!("tinysh: {}", err);
                1
            }
        },
    };
    std::process::exit(code);
}

fn eval_once(sh: &mut Interpreter, line: &str) -> ExitCode {
    match sh.eval(line) {
        Ok(Outcome::Continue(result)) => result.exit_code,
        Ok(Outcome::Terminate(code)) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            1
        }
    }
}
