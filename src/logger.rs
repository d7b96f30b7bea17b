// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{
                roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
            },
            RollingFileAppender,
        },
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

use crate::cmd::GlobalOpts;
use crate::error::{Error, Result};

const LOG_TARGET: &str = "relayer";
const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:>5})} {m}{n}";
const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:>5} {t} {m}{n}";
const MIB: u64 = 1024 * 1024;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

macro_rules! trace {
    ($($arg:tt)+) => { log::trace!(target: "relayer", $($arg)+) };
}

macro_rules! debug {
    ($($arg:tt)+) => { log::debug!(target: "relayer", $($arg)+) };
}

macro_rules! info {
    ($($arg:tt)+) => { log::info!(target: "relayer", $($arg)+) };
}

macro_rules! warn {
    ($($arg:tt)+) => { log::warn!(target: "relayer", $($arg)+) };
}

macro_rules! error {
    ($($arg:tt)+) => { log::error!(target: "relayer", $($arg)+) };
}

/// Installs the process logger: stderr console, plus a rolling file when
/// `--log-path` is given.
pub fn init(opts: &GlobalOpts) -> Result<()> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let mut config =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(path) = &opts.log_path {
        let roll_pattern = format!("{}.{{}}", path.display());
        let roller = FixedWindowRoller::builder()
            .base(1)
            .build(&roll_pattern, opts.log_roll_count)
            .map_err(|err| Error::Logger(err.to_string()))?;
        let roll_size = opts
            .log_roll_size
            .checked_mul(MIB)
            .ok_or_else(|| Error::Logger("log roll size too large".to_string()))?;
        let trigger = SizeTrigger::new(roll_size);
        let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));
        let file = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
            .build(path, Box::new(policy))?;
        config = config.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    let config = config
        .build(root.build(opts.log_level))
        .map_err(|err| Error::Logger(err.to_string()))?;
    log4rs::init_config(config)?;
    INITIALIZED.store(true, Ordering::SeqCst);

    trace!("[Logger|init] level: {}, file: {:?}", opts.log_level, opts.log_path);
    Ok(())
}

fn init_fallback() -> Result<()> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(Root::builder().appender("console").build(LevelFilter::Info))
        .map_err(|err| Error::Logger(err.to_string()))?;
    log4rs::init_config(config)?;
    INITIALIZED.store(true, Ordering::SeqCst);
    Ok(())
}

/// Logs `err` and terminates the process with status 1.
pub fn fatal<E: fmt::Display>(err: E) -> ! {
    if !INITIALIZED.load(Ordering::SeqCst) {
        let _ = init_fallback();
    }
    if log::log_enabled!(target: LOG_TARGET, log::Level::Error) {
        error!("{}", err);
        log::logger().flush();
    } else {
        // --log-level off
        eprintln!("{}", err);
    }
    std::process::exit(1)
}
