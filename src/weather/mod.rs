//! Weather Module
//!
//! The application behind the cache: a forecast service and the
//! request-scoped validator its handlers depend on.

mod service;
mod validator;

pub use service::WeatherService;
pub use validator::{
    CityValidator, ScopedValidator, ValidatorFactory, WeatherValidator, MAX_CITY_LENGTH,
};
