/*
 *  main.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use env_logger::Env;
use log::{info, warn};
use tokio::signal::unix::{SignalKind, signal};

use pumphouse::config::{self, DriverKind};
use pumphouse::display::{ArrowMode, DisplayController, drivers};
use pumphouse::panel::{self, Panel};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP, logs which one arrived, returns.
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!(
        "{} v.{} built {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        BUILD_DATE
    );
    info!("pins buttons = {:?}", cfg.button_pins());
    info!("pins relays = {:?}", cfg.relay_pins());

    let (text_sink, backlight) = drivers::sinks_from_config(&cfg)?;
    let mut lcd = DisplayController::new(text_sink, backlight, cfg.refresh_period());

    if let Err(e) = lcd.set_color(0, 255, 0).await {
        warn!("backlight init failed: {e}");
    }
    lcd.set_text("Initialisation ended").await;

    match cfg.driver() {
        DriverKind::Grove => {
            let mut panel = Panel::new(&cfg.button_pins(), &cfg.relay_pins())
                .map_err(|e| anyhow::anyhow!("panel setup failed: {e}"))?;
            lcd.set_menu_text("Press button to test, OK ?", ArrowMode::Both)
                .await;
            tokio::select! {
                res = signal_handler() => {
                    if let Err(e) = res {
                        warn!("signal handler failed: {e}");
                    }
                }
                _ = panel::run_poll_loop(&mut panel, &lcd, cfg.poll_period()) => {}
            }
            panel.all_off();
        }
        DriverKind::Mock => {
            // No GPIO on a desk; just exercise the display until interrupted.
            info!("mock driver selected, running without panel hardware");
            lcd.set_menu_text("Press button to test, OK ?", ArrowMode::Both)
                .await;
            if let Err(e) = signal_handler().await {
                warn!("signal handler failed: {e}");
            }
        }
    }

    info!("Main application exiting. Parking relays and stopping the refresh task.");
    if let Err(e) = lcd.set_color(255, 0, 30).await {
        warn!("backlight farewell failed: {e}");
    }
    lcd.set_text("Bye bye ^^ !").await;
    // Give the refresh task a couple of ticks to paint the farewell.
    tokio::time::sleep(cfg.refresh_period() * 2).await;
    lcd.shutdown().await?;

    info!("exit");
    Ok(())
}
