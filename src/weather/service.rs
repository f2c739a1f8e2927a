//! Weather service
//!
//! Serves forecasts for a city. Recorded observations take precedence over
//! the derived baseline.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;

use crate::models::WeatherForecast;

const SUMMARIES: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

/// Forecast source shared by every request.
#[derive(Debug, Clone, Default)]
pub struct WeatherService {
    /// Latest observed temperature per normalized city name
    observations: Arc<RwLock<HashMap<String, i32>>>,
}

impl WeatherService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tomorrow's forecast for `city`.
    pub async fn forecast(&self, city: &str) -> WeatherForecast {
        let city = normalize_city(city);
        let observed = self.observations.read().await.get(&city).copied();
        let temperature_c = observed.unwrap_or_else(|| baseline_temperature(&city));

        WeatherForecast {
            date: (Utc::now() + ChronoDuration::days(1))
                .format("%Y-%m-%d")
                .to_string(),
            temperature_c,
            temperature_f: to_fahrenheit(temperature_c),
            summary: summarize(temperature_c).to_string(),
            city,
        }
    }

    /// Stores an observation, replacing any earlier one for the city.
    pub async fn record(&self, city: &str, temperature_c: i32) {
        self.observations
            .write()
            .await
            .insert(normalize_city(city), temperature_c);
    }
}

fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

/// Stable per-city temperature between -10 and 34 °C.
fn baseline_temperature(city: &str) -> i32 {
    let sum: u32 = city.bytes().map(u32::from).sum();
    (sum % 45) as i32 - 10
}

fn to_fahrenheit(celsius: i32) -> i32 {
    32 + (celsius as f64 * 9.0 / 5.0).round() as i32
}

fn summarize(celsius: i32) -> &'static str {
    let band = ((celsius + 10) / 5).clamp(0, SUMMARIES.len() as i32 - 1);
    SUMMARIES[band as usize]
}
