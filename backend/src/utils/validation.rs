use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;
use regex::Regex;
use validator::ValidationError;

/// Validates a `HH:MM` 24-hour time-of-day string (time rule boundaries).
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    let re = Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap();
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_time_of_day"))
    }
}

/// Parses a single IP address or CIDR block from an allow-list entry.
pub fn parse_ip_or_cidr(value: &str) -> Result<IpNetwork, ValidationError> {
    if let Ok(network) = IpNetwork::from_str(value) {
        return Ok(network);
    }
    if let Ok(addr) = IpAddr::from_str(value) {
        return Ok(IpNetwork::from(addr));
    }
    Err(ValidationError::new("invalid_ip_or_cidr"))
}

/// Validates every entry of an IP allow-list is a parseable address or CIDR.
pub fn validate_ip_allow_list(values: &[String]) -> Result<(), ValidationError> {
    for value in values {
        parse_ip_or_cidr(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_times() {
        assert!(validate_time_of_day("00:00").is_ok());
        assert!(validate_time_of_day("23:59").is_ok());
        assert!(validate_time_of_day("09:05").is_ok());
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(validate_time_of_day("24:00").is_err());
        assert!(validate_time_of_day("9:5").is_err());
        assert!(validate_time_of_day("not-a-time").is_err());
    }

    #[test]
    fn parses_addresses_and_cidrs() {
        assert!(parse_ip_or_cidr("192.168.1.10").is_ok());
        assert!(parse_ip_or_cidr("10.0.0.0/8").is_ok());
        assert!(parse_ip_or_cidr("::1").is_ok());
        assert!(parse_ip_or_cidr("not-an-ip").is_err());
    }

    #[test]
    fn validates_allow_list_entries() {
        let good = vec!["10.0.0.0/24".to_string(), "203.0.113.5".to_string()];
        assert!(validate_ip_allow_list(&good).is_ok());

        let bad = vec!["10.0.0.0/24".to_string(), "nope".to_string()];
        assert!(validate_ip_allow_list(&bad).is_err());
    }
}
