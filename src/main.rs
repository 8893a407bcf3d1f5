use clap::Parser;
use log::{error, info};
use pktwatch::capture::list_devices;
use pktwatch::configuration::config::{CliArgs, Config};
use pktwatch::controller::Controller;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
==============================================================================
                 pktwatch v{} - live packet capture and view
==============================================================================
",
        env!("CARGO_PKG_VERSION")
    );

    let args = CliArgs::parse();

    if args.list_devices {
        match list_devices() {
            Ok(devices) => {
                for device in devices {
                    let addrs: Vec<String> =
                        device.addresses.iter().map(|a| a.to_string()).collect();
                    println!(
                        "{:<16} {:<40} {}",
                        device.name,
                        device.description.unwrap_or_default(),
                        addrs.join(", ")
                    );
                }
                return;
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    info!("Importing configuration");

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration imported successfully");

    let controller = Controller::new(config);
    if let Err(e) = controller.run().await {
        error!("{}, exiting...", e);
        std::process::exit(1);
    }
}
