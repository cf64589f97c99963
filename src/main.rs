// Copyright (C) 2026 the midikey authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
mod cancel;
mod config;
mod engine;
mod keysim;
mod midi;
mod supervisor;
#[cfg(test)]
mod test;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tracing::{error, info};

use crate::cancel::CancelHandle;
use crate::config::Config;
use crate::engine::sync::Synchronizer;
use crate::engine::Engine;
use crate::supervisor::Supervisor;

const DEFAULT_CONFIG_PATH: &str = "midikey.yaml";

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "Translates MIDI keyboard input into synthetic keyboard key presses."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available MIDI input devices.
    Devices {},
    /// Writes the default configuration file if none exists and prints it.
    Config {
        /// The path to the configuration file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        path: String,
    },
    /// Start will connect to the MIDI device and run the bridge.
    Start {
        /// The MIDI input device name to connect to.
        device_name: String,
        /// The path to the configuration file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Config { path } => {
            let config = Config::load_or_create(&PathBuf::from(path))?;
            println!("{}", serde_yaml::to_string(&config)?);
        }
        Commands::Start {
            device_name,
            config,
        } => {
            let config = Config::load_or_create(&PathBuf::from(config))?;
            let layout = config.layout()?;
            let keys = config.keys()?;

            let engine = Arc::new(Engine::new(
                layout,
                config.keyboard_cut_point,
                config.pedal_controller_index,
                config.trigger_pedal_on_push,
                config.trigger_pedal_on_release,
            ));
            let device = midi::get_device(&device_name)?;
            let keyboard = keysim::get_keyboard();

            let cancel = CancelHandle::new();
            let synchronizer_handle =
                Synchronizer::new(engine.clone(), keyboard, keys).start(cancel.clone());
            let supervisor = Supervisor::new(device, engine);
            let supervisor_handle = {
                let cancel = cancel.clone();
                tokio::spawn(async move { supervisor.run(cancel).await })
            };

            tokio::signal::ctrl_c().await?;
            info!("Stopping MIDI input.");
            cancel.cancel();

            if let Err(e) = supervisor_handle.await? {
                error!(err = e.to_string(), "Supervisor exited with an error.");
            }
            if synchronizer_handle.join().is_err() {
                return Err("Error while joining the synchronizer thread!".into());
            }
        }
    }

    Ok(())
}
