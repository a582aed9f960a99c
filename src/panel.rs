/*
 *  panel.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Buttons, relays and the press-to-toggle poll loop
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

use std::fmt;
use std::time::Duration;

use log::{info, warn};
use rand::Rng;
use rppal::gpio::{Gpio, InputPin, OutputPin};
use thiserror::Error;
use tokio::time::sleep;

use crate::display::DisplayController;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),
    #[error("panel wiring error: {0}")]
    Wiring(String),
}

/// Output line capability for a relay, same shape as the display sink
/// traits: rppal drives the real pin, tests substitute a fake.
pub trait OutputLine: Send {
    fn set_high(&mut self);
    fn set_low(&mut self);
    fn is_set_high(&self) -> bool;
}

impl OutputLine for OutputPin {
    fn set_high(&mut self) {
        OutputPin::set_high(self);
    }

    fn set_low(&mut self) {
        OutputPin::set_low(self);
    }

    fn is_set_high(&self) -> bool {
        OutputPin::is_set_high(self)
    }
}

/// Push-button input, active high.
pub struct Button {
    pin: InputPin,
    bcm: u8,
}

impl Button {
    fn new(gpio: &Gpio, bcm: u8) -> Result<Self, PanelError> {
        Ok(Self { pin: gpio.get(bcm)?.into_input(), bcm })
    }

    pub fn is_pressed(&self) -> bool {
        self.pin.is_high()
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "button {}", self.bcm)
    }
}

/// Relay output driving one pump. Starts off (low).
pub struct Relay {
    pin: Box<dyn OutputLine>,
    bcm: u8,
}

impl Relay {
    fn new(gpio: &Gpio, bcm: u8) -> Result<Self, PanelError> {
        Ok(Self::from_line(Box::new(gpio.get(bcm)?.into_output_low()), bcm))
    }

    /// The line is expected to already be driven low.
    fn from_line(pin: Box<dyn OutputLine>, bcm: u8) -> Self {
        Self { pin, bcm }
    }

    pub fn on(&mut self) {
        self.pin.set_high();
    }

    pub fn off(&mut self) {
        self.pin.set_low();
    }

    pub fn toggle(&mut self) {
        if self.pin.is_set_high() {
            self.off();
        } else {
            self.on();
        }
    }

    pub fn is_on(&self) -> bool {
        self.pin.is_set_high()
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relay {}", self.bcm)
    }
}

/// The physical panel: index-paired buttons and relays.
pub struct Panel {
    buttons: Vec<Button>,
    relays: Vec<Relay>,
}

impl Panel {
    pub fn new(button_pins: &[u8], relay_pins: &[u8]) -> Result<Self, PanelError> {
        if button_pins.is_empty() || button_pins.len() != relay_pins.len() {
            return Err(PanelError::Wiring(
                "button and relay pin lists must be nonempty and index-paired".into(),
            ));
        }
        let gpio = Gpio::new()?;
        let mut buttons = Vec::with_capacity(button_pins.len());
        for &bcm in button_pins {
            let btn = Button::new(&gpio, bcm)?;
            info!("add {btn}");
            buttons.push(btn);
        }
        let mut relays = Vec::with_capacity(relay_pins.len());
        for &bcm in relay_pins {
            let relay = Relay::new(&gpio, bcm)?;
            info!("add {relay}");
            relays.push(relay);
        }
        Ok(Self { buttons, relays })
    }

    pub fn back_button(&self) -> &Button {
        &self.buttons[0]
    }

    pub fn cancel_button(&self) -> &Button {
        &self.buttons[1]
    }

    pub fn validate_button(&self) -> &Button {
        &self.buttons[2]
    }

    pub fn forward_button(&self) -> &Button {
        &self.buttons[3]
    }

    pub fn northern_pump(&mut self) -> &mut Relay {
        &mut self.relays[0]
    }

    pub fn eastern_pump(&mut self) -> &mut Relay {
        &mut self.relays[1]
    }

    pub fn southern_pump(&mut self) -> &mut Relay {
        &mut self.relays[2]
    }

    pub fn western_pump(&mut self) -> &mut Relay {
        &mut self.relays[3]
    }

    /// Drop every relay, used on the way out.
    pub fn all_off(&mut self) {
        for relay in &mut self.relays {
            relay.off();
        }
    }
}

/// Poll the buttons; a press toggles the paired relay, picks a fresh
/// backlight color and reports on the LCD. Runs until cancelled from the
/// outside (the caller selects against the shutdown signal).
pub async fn run_poll_loop(panel: &mut Panel, display: &DisplayController, period: Duration) {
    loop {
        for i in 0..panel.buttons.len() {
            if panel.buttons[i].is_pressed() {
                panel.relays[i].toggle();
                let (r, g, b) = {
                    let mut rng = rand::rng();
                    (rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>())
                };
                if let Err(e) = display.set_color(r, g, b).await {
                    warn!("backlight update failed: {e}");
                }
                display
                    .set_text(&format!("toggle {} by {}", panel.relays[i], panel.buttons[i]))
                    .await;
            }
        }
        sleep(period).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Fake output line recording every level written to it.
    #[derive(Clone, Default)]
    struct FakeLine {
        state: Arc<Mutex<FakeLineState>>,
    }

    #[derive(Default)]
    struct FakeLineState {
        level: bool,
        writes: Vec<bool>,
    }

    impl OutputLine for FakeLine {
        fn set_high(&mut self) {
            let mut s = self.state.lock().unwrap();
            s.level = true;
            s.writes.push(true);
        }

        fn set_low(&mut self) {
            let mut s = self.state.lock().unwrap();
            s.level = false;
            s.writes.push(false);
        }

        fn is_set_high(&self) -> bool {
            self.state.lock().unwrap().level
        }
    }

    impl FakeLine {
        fn writes(&self) -> Vec<bool> {
            self.state.lock().unwrap().writes.clone()
        }
    }

    #[test]
    fn relay_starts_low() {
        let line = FakeLine::default();
        let relay = Relay::from_line(Box::new(line.clone()), 16);
        assert!(!relay.is_on());
        assert!(line.writes().is_empty());
    }

    #[test]
    fn relay_toggle_sequencing() {
        let line = FakeLine::default();
        let mut relay = Relay::from_line(Box::new(line.clone()), 16);
        relay.toggle();
        assert!(relay.is_on());
        relay.toggle();
        assert!(!relay.is_on());
        relay.toggle();
        assert!(relay.is_on());
        assert_eq!(line.writes(), vec![true, false, true]);
    }

    #[test]
    fn relay_off_is_idempotent() {
        let line = FakeLine::default();
        let mut relay = Relay::from_line(Box::new(line.clone()), 13);
        relay.on();
        relay.off();
        relay.off();
        assert!(!relay.is_on());
        assert_eq!(line.writes(), vec![true, false, false]);
    }

    #[test]
    fn relay_reports_its_pin() {
        let relay = Relay::from_line(Box::new(FakeLine::default()), 26);
        assert_eq!(relay.to_string(), "relay 26");
    }
}
