//! Parsing of the command-line values that are more than plain strings.
use hostmetrics::Measurement;

/// Parses a measurement of the form `Name:Unit:Value`, e.g. `DiskFree:Percent:87.5`.
///
/// The name may contain colons, the unit and the value may not.
pub fn parse_measurement(s: &str) -> Result<Measurement, String> {
    let mut parts = s.rsplitn(3, ':');
    let (Some(value), Some(unit), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected Name:Unit:Value, got '{s}'"));
    };
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value '{value}' for metric '{name}': {e}"))?;
    Measurement::new(name.trim(), unit.trim(), value).map_err(|e| e.to_string())
}

/// Parses a host attribute of the form `key=value`, e.g. `fileSystem=/dev/xvda1`.
pub fn parse_attribute(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_owned(), v.trim().to_owned())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}
