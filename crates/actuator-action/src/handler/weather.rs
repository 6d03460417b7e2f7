//! Weather forecast handler (weather.gov gridpoint forecasts).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use actuator_core::types::ActionType;
use actuator_http::{HttpClient, RequestConfig};

use crate::auth::Authenticator;
use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::ActionPayload;

pub const DEFAULT_FORECAST_DAYS: u32 = 2;

#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    properties: ForecastProperties,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastPeriod {
    pub name: String,
    pub is_daytime: bool,
    pub temperature: i64,
    pub temperature_unit: String,
    pub temperature_trend: Option<String>,
    pub wind_speed: String,
    pub wind_direction: String,
    pub detailed_forecast: String,
}

pub struct WeatherHandler {
    http: Arc<HttpClient>,
    auth: Option<Arc<Authenticator>>,
}

impl WeatherHandler {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http, auth: None }
    }

    pub fn with_authenticator(mut self, auth: Arc<Authenticator>) -> Self {
        self.auth = Some(auth);
        self
    }
}

#[async_trait]
impl ActionHandler for WeatherHandler {
    fn action_type(&self) -> ActionType {
        ActionType::GetWeather
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _arguments: &Map<String, Value>,
        payload: &ActionPayload,
    ) -> Result<Vec<String>, ActionError> {
        let days = if payload.days > 0 {
            payload.days
        } else {
            DEFAULT_FORECAST_DAYS
        };

        let mut request = RequestConfig::get(&payload.url).header("Accept", "application/json");
        if payload.auth_config.is_some() {
            let auth = self.auth.as_ref().ok_or_else(|| {
                ActionError::Config("weather handler has no authenticator".into())
            })?;
            request = request.headers(auth.headers(cancel, payload.auth_config.as_ref()).await?);
        }

        let response = self.http.execute(cancel, request).await?;
        let forecast: ForecastResponse = response.json().map_err(|e| {
            ActionError::Execution(format!("failed to parse weather response: {}", e))
        })?;

        let outcomes = format_forecast(&forecast.properties.periods, days);
        debug!(
            days,
            periods_found = forecast.properties.periods.len(),
            outcomes = outcomes.len(),
            "Weather action completed"
        );
        Ok(outcomes)
    }
}

/// One outcome per day/night pair over the first `days * 2` periods. Each
/// night period closes a block; a trailing day-only block is kept too.
pub fn format_forecast(periods: &[ForecastPeriod], days: u32) -> Vec<String> {
    let take = (days as usize).saturating_mul(2).min(periods.len());
    let mut outcomes = Vec::new();
    let mut block = String::new();

    for period in &periods[..take] {
        if block.is_empty() {
            block.push_str("🌤️ Weather Forecast\n");
        }
        block.push_str(&format!("📅 {}\n", period.name));

        let temp_emoji = if period.temperature < 32 {
            "❄️"
        } else if period.temperature > 80 {
            "🔥"
        } else {
            "🌡️"
        };
        block.push_str(&format!(
            "{} {}°{}",
            temp_emoji, period.temperature, period.temperature_unit
        ));
        if let Some(trend) = period.temperature_trend.as_deref().filter(|t| !t.is_empty()) {
            let arrow = if trend == "falling" { "↘️" } else { "↗️" };
            block.push_str(&format!(" {} {}", arrow, trend));
        }
        block.push('\n');
        block.push_str(&format!(
            "💨 Wind: {} {}\n",
            period.wind_speed, period.wind_direction
        ));
        block.push_str(&format!("☁️ {}\n", period.detailed_forecast));

        if period.is_daytime {
            block.push_str("\n\n");
        } else {
            outcomes.push(std::mem::take(&mut block));
        }
    }

    if !block.is_empty() {
        outcomes.push(block.trim_end().to_string() + "\n");
    }
    outcomes
}
