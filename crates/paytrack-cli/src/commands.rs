//! Handlers for the non-interactive commands

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use paytrack_core::{
    secret, settings, theme, AppConfig, Navigator, ProjectBook, ResolvedTheme, SessionError,
    SessionFlag, SettingsService, Stores, ThemeStyle, View,
};

use crate::terminal::{TerminalLocalizer, TerminalNavigator};
use crate::{ProjectCommands, SettingsCommands};

/// Stop with a hint unless the session is unlocked
fn require_session(stores: &Stores) -> Result<()> {
    match SessionFlag::new(stores.session.clone()).require() {
        Ok(()) => Ok(()),
        Err(SessionError::Locked) => {
            TerminalNavigator.replace_view(View::Lock);
            bail!("session is locked")
        }
        Err(e) => Err(e.into()),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

pub fn lock(stores: &Stores) -> Result<()> {
    SessionFlag::new(stores.session.clone()).revoke()?;
    TerminalNavigator.replace_view(View::Lock);
    Ok(())
}

pub fn status(stores: &Stores) -> Result<()> {
    let unlocked = SessionFlag::new(stores.session.clone()).is_active()?;
    let has_pin = secret::has_secret(stores.local.as_ref())?;
    let biometric = settings::biometric_enabled(stores.local.as_ref())?;

    println!("Session:   {}", if unlocked { "unlocked" } else { "locked" });
    println!("PIN:       {}", if has_pin { "set" } else { "not set (first run)" });
    println!("Biometric: {}", if biometric { "enabled" } else { "disabled" });
    Ok(())
}

pub fn handle_projects(cmd: ProjectCommands, stores: &Stores, config: &AppConfig) -> Result<()> {
    require_session(stores)?;
    let book = ProjectBook::new(stores.clone(), config.delete_fallback_secret.clone());

    match cmd {
        ProjectCommands::List { json } => {
            let projects = book.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No projects yet. Create one with `paytrack projects create <name>`.");
            } else {
                let current = book.current()?;
                println!("{:<16} {:<22} Name", "ID", "Type");
                for p in projects {
                    let marker = if current == Some(p.id) { "*" } else { "" };
                    println!("{:<16} {:<22} {}{}", p.id, p.kind.label(), p.name, marker);
                }
            }
        }

        ProjectCommands::Search { term } => {
            let hits = book.search(&term)?;
            if hits.is_empty() {
                println!("No projects match \"{}\"", term);
            }
            for p in hits {
                println!("{:<16} {}", p.id, p.name);
            }
        }

        ProjectCommands::Create { name, kind } => {
            let project = book.create(&name, kind)?;
            println!("Created {} \"{}\" ({})", kind.label(), project.name, project.id);
        }

        ProjectCommands::Rename { id, name } => {
            if book.rename(id, &name)? {
                println!("Renamed project {} to \"{}\"", id, name.trim());
            } else {
                println!("Nothing to change");
            }
        }

        ProjectCommands::Delete { id, pin } => {
            let pin = match pin {
                Some(pin) => pin,
                None => prompt("PIN")?,
            };
            let ticket = book.delete(id, &pin)?;
            println!("Deleted \"{}\"", ticket.project.name);
        }

        ProjectCommands::Open { id } => {
            let project = book.open(id)?;
            println!("Opened \"{}\" ({})", project.name, project.kind.label());
        }

        ProjectCommands::Reminder => {
            let settings = settings_service(stores, config).load()?;
            let today = Local::now().date_naive();
            if book.reminder_due(&settings, today)? {
                println!("Reminder: add this month's installments today.");
            } else {
                println!("No reminder due");
            }
        }

        ProjectCommands::DismissReminder => {
            book.dismiss_reminder(Local::now().date_naive())?;
            println!("Reminder dismissed for today");
        }
    }

    Ok(())
}

fn settings_service(stores: &Stores, config: &AppConfig) -> SettingsService {
    let localizer = Arc::new(TerminalLocalizer::new(None));
    SettingsService::new(stores.clone(), config.fallback_secret.clone(), localizer)
}

pub fn handle_settings(cmd: SettingsCommands, stores: &Stores, config: &AppConfig) -> Result<()> {
    require_session(stores)?;
    let service = settings_service(stores, config);

    match cmd {
        SettingsCommands::Show => {
            let s = service.load()?;
            let look = match theme::resolve(&s, s.theme_name()) {
                ResolvedTheme::Default => "stock".to_string(),
                ResolvedTheme::Preset(name) => format!("preset {}", name),
                ResolvedTheme::Custom(style) => style.background,
            };
            println!("Theme:     {} ({})", s.theme_name(), look);
            println!(
                "Currency:  {} ({})",
                s.currency_code(),
                s.currency_symbol
                    .as_deref()
                    .unwrap_or(settings::DEFAULT_CURRENCY_SYMBOL)
            );
            println!("Language:  {}", s.language.as_deref().unwrap_or("en"));
            match s.installment_reminder {
                Some(r) if r.enabled => println!("Reminder:  day {} of each month", r.day_of_month),
                _ => println!("Reminder:  off"),
            }
            println!(
                "Biometric: {}",
                if settings::biometric_enabled(stores.local.as_ref())? {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            for t in &s.saved_themes {
                println!(
                    "Saved theme {:<20} {:<16} {}",
                    t.id,
                    t.name,
                    ThemeStyle::swatch(&t.config)
                );
            }
        }

        SettingsCommands::Theme { name } => {
            service.select_theme(&name)?;
            println!("Theme updated!");
        }

        SettingsCommands::CustomTheme(args) => {
            let gradient = args
                .gradient
                .as_deref()
                .map(|color2| (color2, args.direction.as_str()));
            let custom = service.apply_custom_theme(&args.color1, gradient)?;
            let style = ThemeStyle::derive(&custom)?;
            println!("Custom theme applied: {}", style.background);
        }

        SettingsCommands::SaveTheme { name } => {
            let saved = service.save_custom_theme(&name)?;
            println!("Theme \"{}\" saved as {}", saved.name, saved.id);
        }

        SettingsCommands::DeleteTheme { id } => {
            let removed = service.delete_saved_theme(&id)?;
            println!("Theme \"{}\" deleted.", removed.name);
        }

        SettingsCommands::ChangePin => {
            let current = prompt("Current PIN")?;
            let new = prompt("New PIN")?;
            let confirm = prompt("Confirm new PIN")?;
            service.change_pin(&current, &new, &confirm)?;
            println!("PIN updated! You will be asked to log in again.");
        }

        SettingsCommands::Reminder { off, day } => {
            service.set_reminder(!off, day)?;
            if off {
                println!("Installment reminder off");
            } else {
                println!("Installment reminder set for day {}", day);
            }
        }

        SettingsCommands::Currency { code, symbol } => {
            let s = service.set_currency(&code, symbol.as_deref())?;
            println!(
                "Currency changed to {} ({})",
                s.currency_code(),
                s.currency_symbol.as_deref().unwrap_or_default()
            );
        }

        SettingsCommands::Language { code } => {
            service.set_language(&code)?;
            println!("Language updated successfully!");
        }

        SettingsCommands::Biometric { state } => {
            let enabled = state == "on";
            service.set_biometric_enabled(enabled)?;
            println!(
                "Biometric unlock {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}
