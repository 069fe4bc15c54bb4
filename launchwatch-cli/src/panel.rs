//! Plain-text launch panels and acronym listings.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use launchwatch_core::{LaunchRecord, countdown};

pub const ALERT_MESSAGE: &str = "There's a launch coming up!";

/// Countdowns are shown within this distance of launch, either side.
const COUNTDOWN_WINDOW_HOURS: i64 = 24;

pub fn render_panel(launch: &LaunchRecord, tz: Tz, now: DateTime<Utc>, message: Option<&str>) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(message) = message {
        lines.push(message.to_string());
    }

    lines.push(launch.name.clone());
    if let Some(description) = &launch.mission_description {
        lines.push(description.clone());
    }
    lines.push(launch.url());
    lines.push(String::new());

    match launch.scheduled_time() {
        Some(t) => {
            let local = t.with_timezone(&tz);
            let launched = t < now;
            let date = if launched {
                local.format("%b %d, %Y")
            } else {
                local.format("%b %d")
            };
            lines.push(date.to_string().to_uppercase());

            let time = local.format("%I:%M %p %Z").to_string();
            lines.push(time.trim_start_matches('0').to_string());

            let window = Duration::hours(COUNTDOWN_WINDOW_HOURS);
            if launch.is_launching_soon(now, window) || launch.has_launched_recently(now, window) {
                if let Some(seconds) = launch.seconds_to_launch(now) {
                    lines.push(countdown(seconds));
                }
            }
        }
        None => {
            lines.push(launch.date_str.to_uppercase());
            lines.push("Estimated".to_string());
        }
    }
    lines.push(String::new());

    if !launch.vehicle.is_empty() {
        lines.push(launch.vehicle.clone());
    }
    if !launch.provider.is_empty() {
        lines.push(launch.provider.clone());
    }
    if let Some(pad) = &launch.pad {
        lines.push(pad.clone());
    }
    if let Some(location) = &launch.location {
        lines.push(location.clone());
    }
    for media in &launch.media {
        lines.push(media.clone());
    }

    lines.push(format!("Data by rocketlaunch.live | {}", launch.slug));
    lines.join("\n")
}

/// One definition prints bare; several are numbered.
pub fn render_acronym(acronym: &str, definitions: &[String]) -> String {
    let title = acronym.trim().to_uppercase();
    let body = match definitions {
        [] => "No definitions found".to_string(),
        [only] => only.clone(),
        many => many
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {d}", i + 1))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    format!("{title}\n{body}\nData from decronym.xyz")
}
