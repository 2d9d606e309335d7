//! Extraction of a weather snapshot from the server's HTTP response.
//!
//! The server answers `/WeatherStation/latest/` with a flat JSON object.
//! Only the seven numeric fields are needed, so values are located by key
//! instead of parsing the whole document.

use crate::error::Error;
use crate::weather::WeatherStationData;

/// Body of an HTTP/1.x response with status 200.
pub fn http_body(response: &[u8]) -> Result<&str, Error> {
    let text = core::str::from_utf8(response).map_err(|_| Error::InvalidPayload)?;

    let status = text
        .split("\r\n")
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .ok_or(Error::InvalidPayload)?;
    if status != "200" {
        warn!("Server answered status {}", status);
        return Err(Error::RequestFailed);
    }

    text.split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .ok_or(Error::InvalidPayload)
}

/// Pull every field of a snapshot out of `body`. Any missing or
/// non-numeric field rejects the whole snapshot.
pub fn parse_weather(body: &str) -> Result<WeatherStationData, Error> {
    Ok(WeatherStationData {
        temperature: field(body, "temp")?,
        humidity: field(body, "humidity")?,
        wind_speed: field(body, "wind_speed")?,
        wind_direction: field(body, "wind_dir")?,
        pressure: field(body, "pressure")?,
        smoke: field(body, "smoke")?,
        ambient_light: field(body, "ambient")?,
    })
}

/// Numeric value following `"key":`. Quoted numbers are accepted.
fn field(body: &str, key: &str) -> Result<f32, Error> {
    let mut rest = body;
    loop {
        let start = rest.find(key).ok_or(Error::InvalidPayload)?;
        let before = &rest[..start];
        let after = &rest[start + key.len()..];
        rest = after;

        // Whole quoted key only: "temp" must not match "temperature".
        if !before.ends_with('"') || !after.starts_with('"') {
            continue;
        }
        let Some(value) = after[1..].trim_start().strip_prefix(':') else {
            continue;
        };

        let value = value.trim_start();
        let value = value.strip_prefix('"').unwrap_or(value);
        let end = value
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(value.len());

        return value[..end].parse::<f32>().map_err(|_| {
            warn!("Field {} is not a number", key);
            Error::InvalidPayload
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"id": 812, "temp": 21.5, "humidity": 48, "wind_speed": 3.2,
        "wind_dir": 270, "pressure": 1013.25, "smoke": "12", "ambient": 880.5,
        "timestamp": "2024-05-01T12:00:00"}"#;

    #[test]
    fn all_fields_are_extracted() {
        let data = parse_weather(BODY).unwrap();
        assert_eq!(data.temperature, 21.5);
        assert_eq!(data.humidity, 48.0);
        assert_eq!(data.wind_speed, 3.2);
        assert_eq!(data.wind_direction, 270.0);
        assert_eq!(data.pressure, 1013.25);
        assert_eq!(data.smoke, 12.0);
        assert_eq!(data.ambient_light, 880.5);
    }

    #[test]
    fn key_must_match_whole_name() {
        let body = r#"{"temperature": 99, "temp": -4.5}"#;
        assert_eq!(field(body, "temp"), Ok(-4.5));
    }

    #[test]
    fn missing_field_rejects_snapshot() {
        let body = r#"{"temp": 21.5, "humidity": 48}"#;
        assert_eq!(parse_weather(body), Err(Error::InvalidPayload));
    }

    #[test]
    fn non_numeric_value_rejects_snapshot() {
        assert_eq!(field(r#"{"smoke": null}"#, "smoke"), Err(Error::InvalidPayload));
    }

    #[test]
    fn body_follows_headers() {
        let response = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"temp\": 1}";
        assert_eq!(http_body(response), Ok("{\"temp\": 1}"));
    }

    #[test]
    fn error_status_is_a_failed_request() {
        let response = b"HTTP/1.1 404 Not Found\r\n\r\n";
        assert_eq!(http_body(response), Err(Error::RequestFailed));
    }

    #[test]
    fn garbage_is_an_invalid_payload() {
        assert_eq!(http_body(b"\xFF\xFE"), Err(Error::InvalidPayload));
        assert_eq!(http_body(b"HTTP/1.1 200 OK\r\n"), Err(Error::InvalidPayload));
    }
}
