use serde::Serialize;

/// One observation from a provider. Never mutated once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherDetails {
    wind_speed: f64,
    temperature_degrees: f64,
}

impl WeatherDetails {
    pub fn new(wind_speed: f64, temperature_degrees: f64) -> Self {
        Self {
            wind_speed,
            temperature_degrees,
        }
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }

    pub fn temperature_degrees(&self) -> f64 {
        self.temperature_degrees
    }
}

/// The logical request handed to every provider; each one reads only the fields it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub location: String,
    pub lon: f64,
    pub lat: f64,
}

impl WeatherQuery {
    pub fn new(location: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            location: location.into(),
            lon,
            lat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_details_json_shape() {
        let details = WeatherDetails::new(12.0, 34.5);
        let json = serde_json::to_value(details).unwrap();

        assert_eq!(json["wind_speed"], 12.0);
        assert_eq!(json["temperature_degrees"], 34.5);
    }

    #[test]
    fn test_weather_details_equality_is_structural() {
        assert_eq!(WeatherDetails::new(15.0, 20.0), WeatherDetails::new(15.0, 20.0));
        assert_ne!(WeatherDetails::new(15.0, 20.0), WeatherDetails::new(15.0, 21.0));
    }
}
