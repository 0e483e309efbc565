//! Interactive lock screen
//!
//! Reads lines from stdin: digits are typed into the keypad, `d` deletes,
//! `b` starts a biometric unlock, `q` quits and an empty line is Enter.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{bail, Result};
use paytrack_core::{AppConfig, SettingsService, Stores};
use paytrack_gate::{
    GateConfig, GateDriver, GateHandle, GateOutcome, GateServices, Key, UnsupportedAuthenticator,
};

use crate::terminal::{TerminalFeedback, TerminalLocalizer, TerminalNavigator};

/// What one typed character means
fn map_char(c: char) -> Option<Input> {
    match c {
        '0'..='9' => Some(Input::Key(Key::Char(c))),
        'd' | 'D' | '-' => Some(Input::Key(Key::Backspace)),
        'b' | 'B' => Some(Input::Biometric),
        'q' | 'Q' => Some(Input::Quit),
        _ => None,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Key(Key),
    Biometric,
    Quit,
}

/// Forward one line of input; `false` once the user quit or the gate stopped
fn forward_line(line: &str, handle: &GateHandle) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return handle.key(Key::Enter);
    }
    for input in line.chars().filter_map(map_char) {
        let delivered = match input {
            Input::Key(key) => handle.key(key),
            Input::Biometric => handle.biometric(),
            Input::Quit => {
                handle.shutdown();
                return false;
            }
        };
        if !delivered {
            return false;
        }
    }
    true
}

pub async fn run(stores: Stores, config: &AppConfig) -> Result<()> {
    let language = SettingsService::new(
        stores.clone(),
        config.fallback_secret.clone(),
        Arc::new(TerminalLocalizer::new(None)),
    )
    .load()
    .ok()
    .and_then(|s| s.language);

    let services = GateServices {
        navigator: Arc::new(TerminalNavigator),
        feedback: Arc::new(TerminalFeedback),
        localizer: Arc::new(TerminalLocalizer::new(language.as_deref())),
    };
    let (driver, handle) = GateDriver::new(
        stores,
        GateConfig::from(config),
        services,
        Arc::new(UnsupportedAuthenticator),
    );

    println!("Type your PIN and press Enter. `d` deletes, `b` biometric, `q` quits.");

    // A plain thread: a blocked stdin read must not hold up runtime shutdown
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if forward_line(&line, &handle) => {}
                _ => break,
            }
        }
        handle.shutdown();
    });

    match driver.run().await {
        GateOutcome::Granted => Ok(()),
        GateOutcome::Closed => bail!("lock screen closed without unlocking"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_mapping() {
        assert_eq!(map_char('7'), Some(Input::Key(Key::Char('7'))));
        assert_eq!(map_char('d'), Some(Input::Key(Key::Backspace)));
        assert_eq!(map_char('b'), Some(Input::Biometric));
        assert_eq!(map_char('q'), Some(Input::Quit));
        assert_eq!(map_char(' '), None);
    }
}
