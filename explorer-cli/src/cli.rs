use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use explorer_core::{
    Config, Dashboard, DashboardOptions, DirectoryProbe, FilePreferenceStore, HttpProbe,
    ImageProbe, ImageSource, PreferenceStore, Preferences, SearchOutcome, UnitPreference,
    WeatherRecord, classify::classify, prefs, provider::provider_from_config,
};
use inquire::{Password, PasswordDisplayMode};
use tracing::debug;

use crate::view::TerminalView;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-explorer", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather and forecast for a city.
    Show {
        /// City name; defaults to the last city searched.
        #[arg(conflicts_with = "favorite")]
        city: Option<String>,

        /// Use the favorite at this 1-based position instead of a city name.
        #[arg(long, short = 'f')]
        favorite: Option<usize>,

        /// Display unit for this and later runs (C or F).
        #[arg(long)]
        unit: Option<UnitPreference>,

        /// API key, overriding the configured one.
        #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Image directory or http(s) base URL for backgrounds.
        #[arg(long)]
        images: Option<String>,

        /// Number of forecast days to display.
        #[arg(long)]
        slots: Option<usize>,
    },

    /// List favorite cities, or add and remove them.
    Favorites {
        #[arg(long, value_name = "CITY")]
        add: Option<String>,

        #[arg(long, value_name = "CITY", conflicts_with = "add")]
        remove: Option<String>,
    },

    /// Show or change the persisted display unit.
    Unit {
        /// C or F; prints the current unit when absent.
        unit: Option<UnitPreference>,
    },

    /// Print the condition bucket and background candidates for a description.
    Classify {
        #[arg(long, default_value = "")]
        description: String,

        /// Provider's short category label, e.g. "Rain".
        #[arg(long = "main", default_value = "")]
        condition_main: String,

        /// Temperature in Celsius.
        #[arg(long, allow_hyphen_values = true)]
        temp: Option<f64>,

        /// How many candidate filenames to print.
        #[arg(long, default_value_t = 12)]
        limit: usize,
    },
}

/// Parse `--images`: anything with an http(s) scheme is a remote host.
fn image_source(arg: &str) -> ImageSource {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        ImageSource::Http(arg.to_string())
    } else {
        ImageSource::Directory(arg.into())
    }
}

fn preference_store() -> anyhow::Result<FilePreferenceStore> {
    Ok(FilePreferenceStore::new(Config::preferences_file_path()?))
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                city,
                favorite,
                unit,
                api_key,
                images,
                slots,
            } => {
                let mut config = Config::load()?;
                if let Some(key) = api_key {
                    config.set_api_key(key);
                }
                if let Some(images) = images {
                    config.image_source = image_source(&images);
                }
                if let Some(slots) = slots {
                    config.forecast_slots = slots;
                }

                let city = match favorite {
                    Some(position) => Some(
                        config
                            .favorite(position)
                            .with_context(|| format!("No favorite at position {position}"))?
                            .to_string(),
                    ),
                    None => city,
                };

                show(&config, city.as_deref(), unit).await
            }
            Command::Favorites { add, remove } => favorites(add, remove),
            Command::Unit { unit } => {
                let store = preference_store()?;
                match unit {
                    Some(unit) => {
                        store.set(prefs::UNIT_KEY, unit.as_str())?;
                        println!("Display unit set to °{unit}");
                    }
                    None => println!("°{}", Preferences::load(&store).unit),
                }
                Ok(())
            }
            Command::Classify {
                description,
                condition_main,
                temp,
                limit,
            } => {
                let record = WeatherRecord {
                    temperature: temp,
                    description,
                    condition_main,
                    ..WeatherRecord::default()
                };
                let classification = classify(&record);

                println!("Condition: {}", classification.bucket);
                println!("Gradient:  {}", classification.gradient().to_css());
                println!("Candidates:");
                for file in classification.candidates.iter().take(limit) {
                    println!("  images/{file}");
                }
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn favorites(add: Option<String>, remove: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if let Some(city) = add {
        if !config.add_favorite(&city) {
            bail!("'{}' is empty or already a favorite", city.trim());
        }
        config.save()?;
    } else if let Some(city) = remove {
        if !config.remove_favorite(&city) {
            bail!("'{}' is not a favorite", city.trim());
        }
        config.save()?;
    }

    if config.favorites.is_empty() {
        println!("No favorites yet. Add one with `weather-explorer favorites --add <CITY>`.");
    }
    for (i, city) in config.favorites.iter().enumerate() {
        println!("{:>2}. {city}", i + 1);
    }
    Ok(())
}

async fn show(config: &Config, city: Option<&str>, unit: Option<UnitPreference>) -> anyhow::Result<()> {
    let provider = provider_from_config(config)?;

    let probe: Box<dyn ImageProbe> = match &config.image_source {
        ImageSource::Directory(dir) => Box::new(DirectoryProbe::new(dir)),
        ImageSource::Http(base) => Box::new(HttpProbe::new(base.as_str(), provider.http().clone())),
    };

    debug!(image_source = ?config.image_source, slots = config.forecast_slots, "starting dashboard");

    let dashboard = Dashboard::new(
        Box::new(provider),
        probe,
        Box::new(TerminalView),
        Box::new(preference_store()?),
        DashboardOptions::from(config),
    );

    if let Some(unit) = unit {
        dashboard.set_unit(unit);
    }

    match dashboard.search(city, "").await {
        SearchOutcome::Failed { city, .. } => bail!("could not load weather for {city}"),
        _ => Ok(()),
    }
}
