use std::time::Duration;

use clap::{Arg, ArgMatches, Command};

use crate::poller::PollConfig;

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}

fn build_command() -> Command {
    Command::new("parktrack")
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Serial port connected to the tracker device")
                .value_name("PORT")
                .default_value("COM9"),
        )
        .arg(
            Arg::new("baud-rate")
                .long("baud-rate")
                .help("Serial baud rate")
                .value_name("BAUD")
                .default_value("9600")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("read-timeout-ms")
                .long("read-timeout-ms")
                .help("Serial read timeout in milliseconds")
                .value_name("MS")
                .default_value("1000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .help("Read attempts before falling back to default coordinates")
                .value_name("N")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("retry-delay-ms")
                .long("retry-delay-ms")
                .help("Delay between read attempts in milliseconds")
                .value_name("MS")
                .default_value("1000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("listen")
                .long("listen")
                .help("Address for the page server")
                .value_name("ADDR")
                .default_value("127.0.0.1:8080"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .help("Initial IoT endpoint URL shown in the dispatch form")
                .value_name("URL")
                .default_value("https://example-iot-cloud.com/api/coordinates"),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .short('l')
                .help("List all available serial ports and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("Output one-shot results in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub poll: PollConfig,
    pub listen: String,
    pub endpoint: String,
}

impl AppConfig {
    /// All arguments carry defaults, so the lookups cannot fail.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            port: matches.get_one::<String>("port").unwrap().clone(),
            baud_rate: *matches.get_one::<u32>("baud-rate").unwrap(),
            read_timeout: Duration::from_millis(
                *matches.get_one::<u64>("read-timeout-ms").unwrap(),
            ),
            poll: PollConfig {
                max_attempts: *matches.get_one::<u32>("max-attempts").unwrap(),
                retry_delay: Duration::from_millis(
                    *matches.get_one::<u64>("retry-delay-ms").unwrap(),
                ),
            },
            listen: matches.get_one::<String>("listen").unwrap().clone(),
            endpoint: matches.get_one::<String>("endpoint").unwrap().clone(),
        }
    }
}
