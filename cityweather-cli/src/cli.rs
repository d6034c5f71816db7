use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use cityweather_core::{
    Config, Coordinates, FilePreferenceStore, StaticLocationProvider, WeatherController,
    WeatherRepository, service_from_config,
};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "City weather lookup")]
pub struct Cli {
    /// Log debug output from the app to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeather API key and an optional home location.
    Configure,

    /// List cities matching a name.
    Search {
        /// City name to look up.
        query: String,
    },

    /// Show current weather for a city; defaults to the last one viewed.
    Show {
        /// City name. Omit to reuse the last city.
        city: Option<String>,

        /// Which search match to use, counting from 1.
        #[arg(long, default_value_t = 1)]
        pick: usize,
    },

    /// Print the last city whose weather was shown.
    Last,

    /// Show the configured home location and its place name.
    Here,
}

impl Cli {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(config),
            Command::Search { query } => {
                let controller = build_controller(&config)?;
                controller
                    .on_search_query_changed(query)
                    .await
                    .context("Search task failed")?;
                println!("{}", render::city_list(&controller.state().city_search));
                Ok(())
            }
            Command::Show { city, pick } => show(&config, city, pick).await,
            Command::Last => {
                let controller = build_controller(&config)?;
                match controller.restore_last_city_name() {
                    Some(name) => println!("{name}"),
                    None => println!("No city viewed yet."),
                }
                Ok(())
            }
            Command::Here => {
                let controller = build_controller(&config)?;
                let mut notices = controller.notices();
                controller.check_and_request_device_permission().await;
                while let Ok(notice) = notices.try_recv() {
                    eprintln!("{notice}");
                }
                println!("{}", render::location(&controller.state().location));
                Ok(())
            }
        }
    }
}

fn build_controller(config: &Config) -> anyhow::Result<WeatherController> {
    let repository = WeatherRepository::new(service_from_config(config)?);
    let prefs = FilePreferenceStore::open_default().context("Failed to open preference store")?;
    let location = StaticLocationProvider::new(config.home, repository.clone());

    Ok(WeatherController::new(repository, Arc::new(prefs), Arc::new(location)))
}

async fn show(config: &Config, city: Option<String>, pick: usize) -> anyhow::Result<()> {
    if pick == 0 {
        return Err(anyhow!("--pick counts from 1"));
    }

    let controller = build_controller(config)?;
    let last = controller.restore_last_city_name();
    let query = city.or(last).ok_or_else(|| {
        anyhow!(
            "No city given and none viewed before.\n\
             Hint: run `cityweather show <city>`."
        )
    })?;

    controller
        .on_search_query_changed(query.clone())
        .await
        .context("Search task failed")?;

    let state = controller.state();
    let Some(cities) = state.city_search.success() else {
        println!("{}", render::city_list(&state.city_search));
        return Ok(());
    };
    let Some(selected) = cities.get(pick - 1).cloned() else {
        println!("No match #{pick} for '{query}' ({} found).", cities.len());
        return Ok(());
    };

    let name = selected.display_name();
    controller.on_city_selected(selected).await.context("Weather task failed")?;
    println!("{}", render::weather(&name, &controller.state().weather));
    Ok(())
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);
    config.require_api_key()?;

    let set_home = Confirm::new("Set a home location for `cityweather here`?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?;

    config.home = if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;
        Some(Coordinates { latitude, longitude })
    } else {
        None
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
