use std::{
    env,
    io,
    process,
};

use anyhow::Context;

use script_canvas::{
    HostConfig,
    config::{self, CliArgs, USAGE},
    constants::{EXIT_SUCCESS, EXIT_USAGE},
    interpreter,
    logging,
    render::{HeadlessPresenter, Presenter, WindowPresenter},
};

fn main() {
    logging::init_tracing();

    let args = match CliArgs::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            process::exit(EXIT_USAGE);
        }
    };

    if args.help {
        println!("{USAGE}");
        process::exit(EXIT_SUCCESS);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(EXIT_USAGE);
        }
    };

    if config.window.headless {
        process::exit(run(&config, Box::new(HeadlessPresenter::new())));
    }

    // show-image keeps the event loop on the main thread and runs us on a worker.
    // The explicit unit return keeps the closure from inferring `!`.
    show_image::run_context(move || -> () {
        let code = run(&config, Box::new(WindowPresenter::new()));
        process::exit(code);
    })
}

fn load_config(args: &CliArgs) -> anyhow::Result<HostConfig> {
    config::load(args).context("failed to load configuration")
}

fn run(config: &HostConfig, presenter: Box<dyn Presenter>) -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    interpreter::run_to_exit_code(config, presenter, &mut out)
}
