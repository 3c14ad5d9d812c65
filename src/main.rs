use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use weatherly_app::WeatherApp;
use weatherly_core::Config;
use weatherly_notify::{DeliveredNotification, LocalTimerBackend};
use weatherly_storage::{KeyValueStore, NotificationPreferences, StorageService, ViewMode};
use weatherly_weather::{City, CitySearchResult};

#[derive(FromArgs)]
/// Weatherly - multi-city weather, daily reminders and city search
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Weather(WeatherCmd),
    Cities(CitiesCmd),
    Search(SearchCmd),
    Add(AddCmd),
    Remove(RemoveCmd),
    Select(SelectCmd),
    ViewMode(ViewModeCmd),
    Theme(ThemeCmd),
    Notify(NotifyCmd),
    TestNotify(TestNotifyCmd),
    Watch(WatchCmd),
    Reset(ResetCmd),
}

#[derive(FromArgs)]
/// refresh every saved city and show current conditions
#[argh(subcommand, name = "weather")]
struct WeatherCmd {
    /// also show the hourly and daily forecast for the active city
    #[argh(switch, short = 'f')]
    forecast: bool,
}

#[derive(FromArgs)]
/// list saved cities without refreshing
#[argh(subcommand, name = "cities")]
struct CitiesCmd {}

#[derive(FromArgs)]
/// look up cities by name
#[argh(subcommand, name = "search")]
struct SearchCmd {
    /// city name
    #[argh(positional, greedy)]
    query: Vec<String>,
}

#[derive(FromArgs)]
/// search for a city and save it
#[argh(subcommand, name = "add")]
struct AddCmd {
    /// which search result to add, starting at 1
    #[argh(option, short = 'p', default = "1")]
    pick: usize,

    /// city name
    #[argh(positional, greedy)]
    query: Vec<String>,
}

#[derive(FromArgs)]
/// remove a saved city
#[argh(subcommand, name = "remove")]
struct RemoveCmd {
    /// position in the city list, starting at 1
    #[argh(positional)]
    index: usize,
}

#[derive(FromArgs)]
/// make a saved city the active one
#[argh(subcommand, name = "select")]
struct SelectCmd {
    /// position in the city list, starting at 1
    #[argh(positional)]
    index: usize,
}

#[derive(FromArgs)]
/// switch between full and minimal layouts
#[argh(subcommand, name = "view-mode")]
struct ViewModeCmd {
    /// full or minimal
    #[argh(positional)]
    mode: ViewMode,
}

#[derive(FromArgs)]
/// show the theme, local time and background for the active city
#[argh(subcommand, name = "theme")]
struct ThemeCmd {}

#[derive(FromArgs)]
/// configure the daily weather reminder
#[argh(subcommand, name = "notify")]
struct NotifyCmd {
    /// hour of day, 0-23 (defaults to the configured hour)
    #[argh(option)]
    hour: Option<u32>,

    /// minute, 0-59 (defaults to the configured minute)
    #[argh(option)]
    minute: Option<u32>,

    /// turn the reminder off
    #[argh(switch)]
    off: bool,

    /// city the reminder describes, position starting at 1
    #[argh(option)]
    city: Option<usize>,
}

#[derive(FromArgs)]
/// send a sample notification for the notification city
#[argh(subcommand, name = "test-notify")]
struct TestNotifyCmd {}

#[derive(FromArgs)]
/// stay running and deliver the daily reminder
#[argh(subcommand, name = "watch")]
struct WatchCmd {}

#[derive(FromArgs)]
/// forget all saved cities, preferences and cached weather
#[argh(subcommand, name = "reset")]
struct ResetCmd {}

#[tokio::main]
async fn main() -> Result<()> {
    weatherly_core::init()?;
    let args: Args = argh::from_env();

    let (config, _warnings) = Config::load_validated()?;

    let store = KeyValueStore::new(config.database_path())
        .with_context(|| format!("Failed to open {}", config.database_path().display()))?;
    let storage = Arc::new(StorageService::new(store));
    let (backend, mut delivered) = LocalTimerBackend::new();
    let app = WeatherApp::new(config.clone(), storage, Arc::new(backend))?;

    match args.command {
        Command::Weather(cmd) => {
            let report = app.start().await;
            if report.refreshed < report.cities {
                println!(
                    "Refreshed {} of {} cities, showing last known values for the rest",
                    report.refreshed, report.cities
                );
            }
            print_cities(&app);
            if cmd.forecast {
                if let Some(city) = app.active_city() {
                    print_forecast(&city);
                }
            }
        }
        Command::Cities(_) => {
            app.load();
            print_cities(&app);
        }
        Command::Search(cmd) => {
            let results = app.search_now(&cmd.query.join(" ")).await?;
            print_results(&results);
        }
        Command::Add(cmd) => {
            app.load();
            let query = cmd.query.join(" ");
            let results = app.search_now(&query).await?;
            let result = cmd
                .pick
                .checked_sub(1)
                .and_then(|i| results.get(i))
                .with_context(|| format!("No result #{} for '{}'", cmd.pick, query))?;
            app.add_city(result).await?;
            print_cities(&app);
        }
        Command::Remove(cmd) => {
            app.load();
            let removed = app.remove_city(position(cmd.index)?)?;
            println!("Removed {}", removed.name);
            print_cities(&app);
        }
        Command::Select(cmd) => {
            app.load();
            let city = app.select_city(position(cmd.index)?)?;
            println!("Now showing {}", city.name);
        }
        Command::ViewMode(cmd) => {
            app.load();
            app.set_view_mode(cmd.mode)?;
            println!("View mode: {}", cmd.mode);
        }
        Command::Theme(_) => {
            app.load();
            let view = app.presentation().context("No active city")?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Notify(cmd) => {
            app.load();
            if let Some(index) = cmd.city {
                let city = app.set_notification_city(position(index)?).await?;
                println!("Reminders will describe {}", city.name);
            }
            let prefs = NotificationPreferences {
                enabled: !cmd.off,
                hour: cmd.hour.unwrap_or(config.notifications.default_hour),
                minute: cmd.minute.unwrap_or(config.notifications.default_minute),
            };
            let scheduled = app.update_notifications(prefs).await?;
            println!("{}", reminder_status(&prefs, scheduled));
        }
        Command::TestNotify(_) => {
            app.load();
            if app.send_test_notification().await? {
                while let Ok(notification) = delivered.try_recv() {
                    print_notification(&notification);
                }
            }
        }
        Command::Watch(_) => {
            let report = app.start().await;
            if !report.notifications_enabled {
                println!("Daily reminder is off, nothing to deliver");
                return Ok(());
            }
            println!("Waiting for the daily reminder, Ctrl+C to stop");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received Ctrl+C, shutting down");
                        break;
                    }
                    notification = delivered.recv() => {
                        let Some(notification) = notification else { break };
                        print_notification(&notification);
                    }
                }
            }
            app.scheduler().cancel().await?;
        }
        Command::Reset(_) => {
            app.reset()?;
            println!("All saved data cleared");
        }
    }

    Ok(())
}

/// One-based CLI position to a list index.
fn position(index: usize) -> Result<usize> {
    index
        .checked_sub(1)
        .context("Positions start at 1")
}

fn reminder_status(prefs: &NotificationPreferences, scheduled: bool) -> String {
    if !prefs.enabled {
        "Daily reminder turned off".to_string()
    } else if scheduled {
        format!("Daily reminder set for {:02}:{:02}", prefs.hour, prefs.minute)
    } else {
        "Notifications are not permitted, reminder not scheduled".to_string()
    }
}

fn print_cities(app: &WeatherApp) {
    let snapshot = app.snapshot();
    for (i, city) in snapshot.cities.iter().enumerate() {
        let marker = if i == snapshot.active_index { '*' } else { ' ' };
        let bell = if i == snapshot.notification_index { " (reminder)" } else { "" };
        println!(
            "{} {}. {}, {}  {}°  {}{}",
            marker,
            i + 1,
            city.name,
            city.country,
            city.temp,
            city.condition,
            bell
        );
    }
}

fn print_forecast(city: &City) {
    if let Some(current) = &city.current {
        println!(
            "\n{}: feels like {}°, wind {} km/h, humidity {}%",
            current.description, current.feels_like, current.wind, current.humidity
        );
    }
    if let Some(hourly) = &city.hourly {
        println!();
        for entry in hourly.iter().take(12) {
            let label = if entry.is_current { "Now" } else { entry.time.as_str() };
            println!("  {:>5}  {:>3}°  {}", label, entry.temp, entry.condition);
        }
    }
    if let Some(daily) = &city.daily {
        println!();
        for day in daily {
            println!(
                "  {:<9} {:>3}° / {:>3}°  {:>3}%  {}",
                day.day, day.high, day.low, day.precipitation, day.condition
            );
        }
    }
}

fn print_results(results: &[CitySearchResult]) {
    if results.is_empty() {
        println!("No cities found");
        return;
    }
    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.display_name);
    }
}

fn print_notification(notification: &DeliveredNotification) {
    println!(
        "[{}] {}\n    {}",
        notification.delivered_at.format("%H:%M"),
        notification.content.title,
        notification.content.body
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(enabled: bool) -> NotificationPreferences {
        NotificationPreferences {
            enabled,
            hour: 8,
            minute: 5,
        }
    }

    #[test]
    fn test_reminder_status_when_turned_off() {
        assert_eq!(reminder_status(&prefs(false), false), "Daily reminder turned off");
    }

    #[test]
    fn test_reminder_status_when_scheduled() {
        assert_eq!(reminder_status(&prefs(true), true), "Daily reminder set for 08:05");
    }

    #[test]
    fn test_reminder_status_when_not_permitted() {
        assert!(reminder_status(&prefs(true), false).contains("not permitted"));
    }

    #[test]
    fn test_positions_start_at_one() {
        assert_eq!(position(1).ok(), Some(0));
        assert!(position(0).is_err());
    }
}
