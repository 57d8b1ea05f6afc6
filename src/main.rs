mod config;
mod error;
mod helpers;
mod manager;
mod memory;
mod myprocess;
mod procfs;
mod ps;
mod report;
mod session;
mod source;
mod tracker;
mod tree;

use std::process::{ExitStatus, Stdio};

use gumdrop::{Options, ParsingStyle};

use crate::{
    config::{Backend, Config},
    error::Error,
    helpers::{nice_size, nice_size_exact},
    report::Report,
    session::SamplingSession,
};

const ABOUT: &str = "Monitor peak memory usage of a command, similar to 'time' but for memory.";

#[derive(Options)]
struct Args {
    #[options(help = "Print help message")]
    help: bool,

    #[options(help = "Sampling interval in milliseconds (default 100)", meta = "<MS>")]
    interval: Option<u64>,

    #[options(help = "Process source: auto, procfs, ps or sysinfo", meta = "<NAME>")]
    backend: Option<Backend>,

    #[options(help = "Also show exact byte counts")]
    exact: bool,

    #[options(count, help = "More logging, repeat for more")]
    verbose: u32,

    #[options(free, help = "Command to run, followed by its arguments")]
    command: Vec<String>,
}

impl Args {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(interval) = self.interval {
            config.interval_ms = interval;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        config.exact |= self.exact;
        config
    }
}

fn usage() -> String {
    format!(
        "Usage: mempeak [options] <command> [args...]\n{ABOUT}\n\n{}",
        Args::usage()
    )
}

fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    //options end at the command, so its own flags pass through
    let args = match Args::parse_args(raw.as_slice(), ParsingStyle::StopAtFirstFree) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("mempeak: {err}\n{}", usage());
            std::process::exit(1);
        }
    };
    if args.help {
        println!("{}", usage());
        return;
    }
    if args.command.is_empty() {
        eprintln!("{}", usage());
        std::process::exit(1);
    }

    init_logging(args.verbose);
    let config = args.apply(Config::load());
    log::debug!("config: {config:?}");

    let code = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(run(&args.command, &config)),
        Err(err) => {
            eprintln!("mempeak: {}", Error::Runtime(err));
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: u32) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

///runs the command under a sampling session, prints the report, returns the exit code to use
async fn run(command: &[String], config: &Config) -> i32 {
    let Some((program, program_args)) = command.split_first() else {
        return 1;
    };
    let mut child = match tokio::process::Command::new(program)
        .args(program_args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(child) => child,
        Err(source) => {
            let err = Error::Launch {
                command: program.clone(),
                source,
            };
            eprintln!("mempeak: {err}");
            return 1;
        }
    };
    let Some(root) = child.id() else {
        //already reaped, nothing left to sample
        return match child.wait().await {
            Ok(status) => exit_code(status),
            Err(_) => 1,
        };
    };
    log::info!("started {program} as {root}, backend {}", config.backend);

    //the terminal sends ctrl-c to the command too, outlive it so the report still prints
    tokio::spawn(async {
        while tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, waiting for the command to exit");
        }
    });

    let session = SamplingSession::start(
        root,
        source::for_backend(config.backend),
        config.interval(),
    );
    log::debug!("session started for {}", session.root());

    let code = match child.wait().await {
        Ok(status) => exit_code(status),
        Err(err) => {
            eprintln!("mempeak: command failed: {err}");
            1
        }
    };
    //no final sample: the root is reaped by now
    let report = Report::new(session.stop().await);

    let mut stderr = std::io::stderr().lock();
    let written = if config.exact {
        report.write_to(&mut stderr, nice_size_exact)
    } else {
        report.write_to(&mut stderr, nice_size)
    };
    if let Err(err) = written {
        log::error!("failed to write report: {err}");
    }
    code
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
