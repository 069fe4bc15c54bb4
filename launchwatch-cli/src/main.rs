use anyhow::{Context, Result, bail};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use launchwatch_core::options::{ConfigStore, SubscriberConfig};
use launchwatch_core::{
    AlertScheduler, ConfigResolver, EventSource, KeyValueStore, KvMonitorStore, MonitorStore,
    Notifier, SubscriberKey, describe,
};
use launchwatch_source::{AcronymClient, RocketLaunchClient};
use std::sync::Arc;
use tracing::info;

mod config;
mod notifier;
mod panel;
mod state;
mod store;

use crate::config::Config;
use crate::notifier::{StdoutNotifier, WebhookNotifier};
use crate::store::FileStore;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("LAUNCHWATCH_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "launchwatch", version = VERSION, about = "Rocket launch alerts for channels and users")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the alert loop until Ctrl-C
    Run,

    /// Run a single alert pass now and print what it did
    Tick,

    /// Show the next launches
    Next {
        #[arg(default_value_t = 5)]
        count: usize,

        /// Only launches matching this rocket, provider or pad name
        filter: Option<String>,

        /// Display timezone (IANA name)
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Show launches scheduled for today
    Today {
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Show one launch by its rocketlaunch.live slug
    Slug {
        slug: String,

        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Look up a space acronym
    Acronym { term: String },

    /// Per-channel or per-user alert options
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List stored monitors and when each will next alert
    Monitors,

    /// Write a default config.toml
    InitConfig,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// List every option with its current value
    List {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print one option
    Get {
        #[command(flatten)]
        target: TargetArgs,
        option: String,
    },

    /// Change one option
    Set {
        #[command(flatten)]
        target: TargetArgs,
        option: String,
        value: String,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Server channel as SERVER/CHANNEL
    #[arg(long, conflicts_with = "user")]
    channel: Option<String>,

    /// Direct-message user id
    #[arg(long)]
    user: Option<String>,
}

impl TargetArgs {
    fn subscriber(&self) -> Result<SubscriberKey> {
        match (&self.channel, &self.user) {
            (Some(channel), None) => channel
                .parse::<SubscriberKey>()
                .map_err(anyhow::Error::msg)
                .context("parse --channel"),
            (None, Some(user)) => SubscriberKey::try_user(user)
                .map_err(anyhow::Error::msg)
                .context("parse --user"),
            _ => bail!("pass --channel SERVER/CHANNEL or --user ID"),
        }
    }
}

/// Shared handles built once from config.toml.
struct App {
    config: Config,
    source: Arc<RocketLaunchClient>,
    configs: Arc<ConfigStore>,
    monitors: Arc<KvMonitorStore>,
}

impl App {
    fn load() -> Result<Self> {
        let config = config::load_config()?;
        let store_path = config.store_path()?;
        let kv: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open(&store_path).with_context(|| format!("open {}", store_path.display()))?,
        );
        let source = RocketLaunchClient::new(config.source.base_url.clone())
            .with_retry_policy(config.retry_policy());
        Ok(Self {
            source: Arc::new(source),
            configs: Arc::new(ConfigStore::new(kv.clone())),
            monitors: Arc::new(KvMonitorStore::new(kv)),
            config,
        })
    }

    fn notifier(&self) -> Arc<dyn Notifier> {
        let resolver: Arc<dyn ConfigResolver> = self.configs.clone();
        match &self.config.notify.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone(), resolver)),
            None => Arc::new(StdoutNotifier::new(resolver)),
        }
    }

    fn scheduler(&self) -> AlertScheduler {
        AlertScheduler::new(
            self.source.clone(),
            self.notifier(),
            self.configs.clone(),
            self.monitors.clone(),
        )
        .with_settings(self.config.scheduler_settings())
    }
}

fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| anyhow::anyhow!("unknown timezone '{name}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::InitConfig => config::init_config()?,

        Command::Run => {
            let app = App::load()?;
            let mut scheduler = app.scheduler();
            tokio::select! {
                _ = scheduler.run() => {}
                signal = tokio::signal::ctrl_c() => {
                    signal.context("listen for Ctrl-C")?;
                    info!("shutting down; waiting for pending alerts");
                }
            }
            scheduler.flush().await;
        }

        Command::Tick => {
            let app = App::load()?;
            let mut scheduler = app.scheduler();
            let report = scheduler.tick(Utc::now()).await.context("alert pass")?;
            scheduler.flush().await;
            match report.reconciled {
                Some(n) => println!("Dispatched {} alert(s); tracking {n} monitor(s)", report.dispatched),
                None => println!(
                    "Dispatched {} alert(s); monitors unchanged (no upcoming launches fetched)",
                    report.dispatched
                ),
            }
        }

        Command::Next { count, filter, tz } => {
            let tz = parse_tz(&tz)?;
            let app = App::load()?;
            let launches = app
                .source
                .fetch_matching(count, filter.as_deref())
                .await
                .context("fetch upcoming launches")?;
            if launches.is_empty() {
                match filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
                    Some(filter) => println!("No launches found with filter `{filter}`."),
                    None => println!("No upcoming launches."),
                }
            }
            let now = Utc::now();
            for launch in &launches {
                println!("{}\n", panel::render_panel(launch, tz, now, None));
            }
        }

        Command::Today { tz } => {
            let tz = parse_tz(&tz)?;
            let app = App::load()?;
            let launches = app
                .source
                .fetch_upcoming(app.config.source.upcoming_count)
                .await
                .context("fetch upcoming launches")?;
            let now = Utc::now();
            let today: Vec<_> = launches.iter().filter(|l| l.is_on_day_of(now, tz)).collect();
            if today.is_empty() {
                println!("No launches today");
            }
            for launch in today {
                println!("{}\n", panel::render_panel(launch, tz, now, None));
            }
        }

        Command::Slug { slug, tz } => {
            let tz = parse_tz(&tz)?;
            let app = App::load()?;
            match app.source.fetch_by_slug(&slug).await.context("fetch launch")? {
                Some(launch) => println!("{}", panel::render_panel(&launch, tz, Utc::now(), None)),
                None => bail!("no launch found for slug '{slug}'"),
            }
        }

        Command::Acronym { term } => {
            let definitions = AcronymClient::default()
                .lookup(&term)
                .await
                .context("look up acronym")?;
            println!("{}", panel::render_acronym(&term, &definitions));
        }

        Command::Config { command } => {
            let app = App::load()?;
            run_config_command(&app.configs, command)?;
        }

        Command::Monitors => {
            let app = App::load()?;
            let persisted = app.monitors.load_all().context("load monitors")?;
            let now = Utc::now();
            let described = describe(&persisted, app.configs.as_ref(), now);
            if described.is_empty() {
                println!("No monitors");
            }
            for (monitor, next) in described {
                let next = next
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "none".to_string());
                let last = monitor
                    .last_alert
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{} | {} | launch {} | last alert {last} | next alert {next}",
                    monitor.subscriber,
                    monitor.launch_slug,
                    monitor.launch_time.format("%Y-%m-%d %H:%M:%S UTC"),
                );
            }
        }
    }

    Ok(())
}

fn run_config_command(configs: &ConfigStore, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List { target } => {
            let subscriber = target.subscriber()?;
            let config = configs.load(&subscriber)?;
            println!("Options for {subscriber}:");
            for (spec, value) in config.options() {
                println!("  {} = {value}\n      {} (default: {})", spec.name, spec.help, spec.default);
            }
        }
        ConfigCommand::Get { target, option } => {
            let config = configs.load(&target.subscriber()?)?;
            println!("{}", config.get(&option)?);
        }
        ConfigCommand::Set { target, option, value } => {
            let subscriber = target.subscriber()?;
            let mut config: SubscriberConfig = configs.load(&subscriber)?;
            config.set(&option, &value)?;
            configs.save(&config)?;
            println!("{subscriber}: {} = {}", option.trim().to_lowercase(), config.get(&option)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(channel: Option<&str>, user: Option<&str>) -> TargetArgs {
        TargetArgs {
            channel: channel.map(str::to_string),
            user: user.map(str::to_string),
        }
    }

    #[test]
    fn target_ids_with_dashes_are_refused() {
        assert!(target(None, Some("alice-b")).subscriber().is_err());
        assert!(target(Some("s1/c-1"), None).subscriber().is_err());
        assert!(target(None, Some("  ")).subscriber().is_err());
        assert_eq!(target(None, Some(" 42 ")).subscriber().unwrap(), SubscriberKey::user("42"));
        assert_eq!(
            target(Some("s1/c1"), None).subscriber().unwrap(),
            SubscriberKey::channel("s1", "c1")
        );
    }

    #[test]
    fn next_takes_an_optional_filter() {
        let cli = Cli::try_parse_from(["launchwatch", "next", "3", "falcon"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Next { count: 3, filter: Some(ref f), .. } if f == "falcon"
        ));
        let cli = Cli::try_parse_from(["launchwatch", "next"]).unwrap();
        assert!(matches!(cli.command, Command::Next { count: 5, filter: None, .. }));
    }
}
