// FILE: src/cli/mod.rs

mod config;
mod handlers;

use crate::context::FrameSettings;
use crate::error::Result;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct KrylCli {
    config: config::ConfigFile,
    start_time: Instant,
}

impl KrylCli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = Self::build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        self.setup_logging(matches.get_count("verbose"));

        let result = match matches.subcommand() {
            Some(("layout", sub_matches)) => handlers::handle_layout_command(self, sub_matches),
            Some(("render", sub_matches)) => handlers::handle_render_command(self, sub_matches),
            Some(("dump", sub_matches)) => handlers::handle_dump_command(sub_matches),
            Some(("check", sub_matches)) => handlers::handle_check_command(sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };
        log::debug!("Finished in {:.2}ms", self.start_time.elapsed().as_secs_f64() * 1000.0);
        result
    }

    fn build_cli() -> Command {
        let view_arg = || Arg::new("view").help("View description (.toml or .json)").required(true).index(1);
        let format_arg = || {
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(clap::value_parser!(OutputFormat))
                .default_value("text")
                .help("Output format")
        };
        let size_args = || {
            [
                Arg::new("max-width")
                    .long("max-width")
                    .value_name("PX")
                    .value_parser(clap::value_parser!(f32))
                    .help("Maximum width of the root node"),
                Arg::new("max-height")
                    .long("max-height")
                    .value_name("PX")
                    .value_parser(clap::value_parser!(f32))
                    .help("Maximum height of the root node"),
                Arg::new("scale")
                    .short('s')
                    .long("scale")
                    .value_name("FACTOR")
                    .value_parser(clap::value_parser!(f32))
                    .help("Pixel scale applied to absolute lengths"),
            ]
        };

        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .author("Kryon Development Team")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("layout")
                    .about("Lay out a view and print every node's box")
                    .arg(view_arg())
                    .arg(format_arg())
                    .args(size_args()),
            )
            .subcommand(
                Command::new("render")
                    .about("Lay out and render a view, print mesh statistics")
                    .arg(view_arg())
                    .arg(format_arg())
                    .args(size_args())
                    .arg(Arg::new("full").long("full").help("Print the whole mesh (json format only)").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("dump")
                    .about("Print the config buffers of a view's nodes")
                    .arg(view_arg()),
            )
            .subcommand(
                Command::new("check")
                    .about("Build and validate a view's buffers")
                    .arg(view_arg()),
            )
    }

    fn setup_logging(&self, verbose_count: u8) {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
    }

    /// Defaults, then the config file, then command line flags.
    pub fn frame_settings(&self, matches: &clap::ArgMatches) -> FrameSettings {
        let mut settings = FrameSettings::default();
        self.config.apply(&mut settings);
        if let Some(width) = matches.get_one::<f32>("max-width") {
            settings.root_constraints.max_width = *width;
        }
        if let Some(height) = matches.get_one::<f32>("max-height") {
            settings.root_constraints.max_height = *height;
        }
        if let Some(scale) = matches.get_one::<f32>("scale") {
            settings.pixel_scale = *scale;
        }
        settings
    }
}

impl Default for KrylCli {
    fn default() -> Self {
        Self::new()
    }
}
