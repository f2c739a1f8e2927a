//! Weather request validation
//!
//! Handlers receive a fresh validator for every request through the
//! [`ScopedValidator`] extractor. The factory that builds it is shared
//! application state.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

/// Longest accepted city name, in characters
pub const MAX_CITY_LENGTH: usize = 64;

// == Validator Trait ==
/// Checks weather requests before they reach the weather service.
pub trait WeatherValidator: Send + Sync {
    /// Returns an explanation when `city` is not acceptable.
    fn validate_city(&self, city: &str) -> Result<(), String>;

    /// Returns an explanation when an observed temperature is implausible.
    fn validate_temperature(&self, temperature_c: i32) -> Result<(), String>;
}

// == City Validator ==
/// Default validator: letters, spaces, hyphens and apostrophes, with
/// temperatures between the recorded extremes on Earth.
#[derive(Debug, Default)]
pub struct CityValidator;

impl CityValidator {
    pub fn new() -> Self {
        Self
    }
}

impl WeatherValidator for CityValidator {
    fn validate_city(&self, city: &str) -> Result<(), String> {
        let city = city.trim();
        if city.is_empty() {
            return Err("city cannot be empty".to_string());
        }
        if city.chars().count() > MAX_CITY_LENGTH {
            return Err(format!(
                "city exceeds maximum length of {} characters",
                MAX_CITY_LENGTH
            ));
        }
        if !city
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'')
        {
            return Err(format!("city '{}' contains invalid characters", city));
        }
        Ok(())
    }

    fn validate_temperature(&self, temperature_c: i32) -> Result<(), String> {
        if (-90..=60).contains(&temperature_c) {
            Ok(())
        } else {
            Err(format!("temperature {}°C is out of range", temperature_c))
        }
    }
}

// == Validator Factory ==
/// Builds one validator per request.
#[derive(Clone)]
pub struct ValidatorFactory(Arc<dyn Fn() -> Box<dyn WeatherValidator> + Send + Sync>);

impl ValidatorFactory {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn() -> Box<dyn WeatherValidator> + Send + Sync + 'static,
    {
        Self(Arc::new(build))
    }

    pub fn build(&self) -> Box<dyn WeatherValidator> {
        (self.0)()
    }
}

impl Default for ValidatorFactory {
    fn default() -> Self {
        Self::new(|| Box::new(CityValidator::new()))
    }
}

impl fmt::Debug for ValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidatorFactory")
    }
}

// == Scoped Validator Extractor ==
/// A validator owned by the current request.
pub struct ScopedValidator(pub Box<dyn WeatherValidator>);

#[async_trait]
impl<S> FromRequestParts<S> for ScopedValidator
where
    S: Send + Sync,
    ValidatorFactory: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(ValidatorFactory::from_ref(state).build()))
    }
}
