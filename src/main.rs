use anyhow::{Context, Result};

use parktrack::{
    boot,
    cli::{self, AppConfig},
    core::logs::StatusLog,
    link::{self, SensorLink},
    poller, server, utils,
};

fn main() {
    boot::init_logging();
    let matches = cli::parse_args();

    if matches.get_flag("list-ports") {
        if let Err(err) = utils::ports::print_ports(matches.get_flag("json")) {
            log::error!("Failed to list ports: {err:#}");
            std::process::exit(1);
        }
        return;
    }

    let config = AppConfig::from_matches(&matches);
    if let Err(err) = run(&config) {
        log::error!("Fatal: {err:#}");
        std::process::exit(1);
    }
}

fn run(config: &AppConfig) -> Result<()> {
    let status = StatusLog::default();

    // Acquire once at startup. The port handle lives only inside this block
    // and is released on every exit path, including early failures.
    let outcome = {
        let mut port = match link::open_sensor_port(
            &config.port,
            config.baud_rate,
            config.read_timeout,
        ) {
            Ok(port) => {
                status.info(format!(
                    "Serial port {} connected successfully.",
                    config.port
                ));
                Some(port)
            }
            Err(err) => {
                status.error(format!(
                    "Could not open serial port {}: {err:#}. Please check the connection.",
                    config.port
                ));
                None
            }
        };

        poller::poll(
            port.as_mut().map(|p| p as &mut dyn SensorLink),
            &config.poll,
            &status,
        )
    };

    let resolved = server::resolve_outcome(outcome, &status);

    let (shutdown_tx, shutdown_rx) = flume::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    let state = server::AppState::new(resolved, status, config.endpoint.clone());
    server::serve(&config.listen, state, shutdown_rx)
}
