// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

mod chains;
mod config;
mod paths;

use std::{
    collections::BTreeSet,
    env,
    ffi::OsString,
    io::{self, Write},
    path::PathBuf,
};

use log::LevelFilter;
use structopt::{
    clap::{App, ArgMatches, ErrorKind},
    StructOpt,
};

use crate::{
    config::Config,
    error::{Error, Result},
    logger,
    module::Module,
    registry::InterfaceRegistry,
};

pub const DEFAULT_HOME_DIR: &str = ".besu-ibc-relayer";

const BUILTIN_COMMANDS: &[&str] = &["config", "chains", "paths", "modules", "help"];

#[derive(Clone, Debug, StructOpt)]
pub struct GlobalOpts {
    /// Relayer home directory [default: $HOME/.besu-ibc-relayer]
    #[structopt(long, env = "RELAYER_HOME", parse(from_os_str))]
    pub home: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[structopt(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Also write the log to this file
    #[structopt(long, parse(from_os_str))]
    pub log_path: Option<PathBuf>,

    /// Size in MiB at which the log file is rolled
    #[structopt(long, default_value = "300")]
    pub log_roll_size: u64,

    /// Number of rolled log files to keep
    #[structopt(long, default_value = "10")]
    pub log_roll_count: u32,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "besu-ibc-relayer",
    about = "IBC relayer for Hyperledger Besu chains with LCP light client proofs"
)]
struct CmdConfig {
    #[structopt(flatten)]
    global: GlobalOpts,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Manage the configuration file
    Config(config::ConfigCmd),
    /// Manage chain and prover configurations
    Chains(chains::ChainsCmd),
    /// Manage relay paths between configured chains
    Paths(paths::PathsCmd),
    /// List the registered modules
    Modules,
}

/// What a command gets to work with.
#[derive(Debug)]
pub struct Context<'a> {
    pub home: PathBuf,
    pub registry: &'a InterfaceRegistry,
}

impl Context<'_> {
    pub fn load_config(&self) -> Result<Config> {
        Config::load(&self.home, self.registry)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        config.save(&self.home)
    }
}

#[derive(Debug)]
pub struct Invocation {
    pub global: GlobalOpts,
    target: Target,
}

#[derive(Debug)]
enum Target {
    Builtin(Command),
    Module {
        index: usize,
        matches: ArgMatches<'static>,
    },
}

/// The command line built from a fixed list of modules.
pub struct Executor {
    modules: Vec<Box<dyn Module>>,
    registry: InterfaceRegistry,
    // module command name -> index into `modules`
    commands: Vec<(String, usize)>,
}

impl Executor {
    pub fn new(modules: Vec<Box<dyn Module>>) -> Result<Self> {
        let mut registry = InterfaceRegistry::new();
        let mut names = BTreeSet::new();
        let mut commands: Vec<(String, usize)> = Vec::new();

        for (index, module) in modules.iter().enumerate() {
            if !names.insert(module.name()) {
                return Err(Error::DuplicateModule(module.name()));
            }
            module.register_interfaces(&mut registry)?;

            if let Some(app) = module.command() {
                let command = app.get_name().to_string();
                if BUILTIN_COMMANDS.contains(&command.as_str())
                    || commands.iter().any(|(name, _)| *name == command)
                {
                    return Err(Error::CommandConflict {
                        command,
                        module: module.name(),
                    });
                }
                commands.push((command, index));
            }
        }

        Ok(Self {
            modules,
            registry,
            commands,
        })
    }

    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|module| module.name()).collect()
    }

    fn app(&self) -> App<'static, 'static> {
        self.modules
            .iter()
            .filter_map(|module| module.command())
            .fold(CmdConfig::clap(), |app, command| app.subcommand(command))
    }

    /// Parses the command line. `None` means help or version output was
    /// requested, or no subcommand was given, and the output has been printed.
    pub fn parse<I, T>(&self, args: I) -> Result<Option<Invocation>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match self.app().get_matches_from_safe(args) {
            Ok(matches) => matches,
            Err(err)
                if err.kind == ErrorKind::HelpDisplayed
                    || err.kind == ErrorKind::VersionDisplayed
                    || err.kind == ErrorKind::MissingArgumentOrSubcommand =>
            {
                println!("{}", err.message);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let global = GlobalOpts::from_clap(&matches);
        let (name, sub_matches) = matches.subcommand();
        let target = match self.commands.iter().find(|(command, _)| command == name) {
            Some((_, index)) => Target::Module {
                index: *index,
                matches: sub_matches.cloned().unwrap_or_default(),
            },
            None => Target::Builtin(CmdConfig::from_clap(&matches).command),
        };
        Ok(Some(Invocation { global, target }))
    }

    pub async fn dispatch(
        &self,
        invocation: Invocation,
        out: &mut (dyn Write + Send),
    ) -> Result<()> {
        if let Target::Builtin(Command::Modules) = invocation.target {
            return self.list_modules(out);
        }

        let ctx = Context {
            home: resolve_home(invocation.global.home)?,
            registry: &self.registry,
        };
        debug!("[Executor|dispatch] Home: {}", ctx.home.display());

        match invocation.target {
            Target::Builtin(Command::Config(cmd)) => config::run(&ctx, cmd, out),
            Target::Builtin(Command::Chains(cmd)) => chains::run(&ctx, cmd, out),
            Target::Builtin(Command::Paths(cmd)) => paths::run(&ctx, cmd, out),
            Target::Builtin(Command::Modules) => self.list_modules(out),
            Target::Module { index, matches } => {
                let module = &self.modules[index];
                module
                    .run_command(&ctx, &matches, out)
                    .await
                    .map_err(|err| Error::Module {
                        module: module.name(),
                        reason: format!("{:#}", err),
                    })
            }
        }
    }

    fn list_modules(&self, out: &mut (dyn Write + Send)) -> Result<()> {
        for (index, module) in self.modules.iter().enumerate() {
            writeln!(out, "{}", module.name())?;
            for registration in self.registry.registrations(module.name()) {
                writeln!(
                    out,
                    "  {:<8}{}",
                    registration.interface, registration.type_url
                )?;
            }
            if let Some((command, _)) = self.commands.iter().find(|(_, i)| *i == index) {
                writeln!(out, "  {:<8}{}", "command", command)?;
            }
        }
        Ok(())
    }
}

fn resolve_home(home: Option<PathBuf>) -> Result<PathBuf> {
    home.or_else(|| env::var_os("HOME").map(|dir| PathBuf::from(dir).join(DEFAULT_HOME_DIR)))
        .ok_or(Error::HomeNotFound)
}

/// Runs the relayer command line with `modules` registered in the given order.
pub async fn execute(modules: Vec<Box<dyn Module>>) -> Result<()> {
    let executor = Executor::new(modules)?;
    let invocation = match executor.parse(env::args_os())? {
        Some(invocation) => invocation,
        None => return Ok(()),
    };
    logger::init(&invocation.global)?;
    debug!(
        "[Executor|execute] Modules: {:?}",
        executor.module_names()
    );

    let mut stdout = io::stdout();
    executor.dispatch(invocation, &mut stdout).await
}
