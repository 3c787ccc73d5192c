use serde::{Deserialize, Serialize};
use std::fmt;

/// Sales region derived from a storefront country code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "NA")]
    NorthAmerica,
    #[serde(rename = "EU")]
    Europe,
    #[serde(rename = "APAC")]
    AsiaPacific,
    #[serde(rename = "LATAM")]
    LatinAmerica,
    #[serde(rename = "MEA")]
    MiddleEastAfrica,
    #[serde(rename = "OTHER")]
    Other,
}

impl Region {
    pub fn from_country_code(code: &str) -> Region {
        match code.trim().to_uppercase().as_str() {
            "US" | "CA" => Region::NorthAmerica,
            "GB" | "DE" | "FR" | "IT" | "ES" | "NL" | "BE" | "AT" | "CH" | "SE" | "NO" | "DK"
            | "FI" | "IE" | "PT" | "PL" | "CZ" | "HU" | "RO" | "GR" | "RU" | "UA" | "TR" => {
                Region::Europe
            }
            "JP" | "CN" | "KR" | "TW" | "HK" | "SG" | "AU" | "NZ" | "IN" | "ID" | "TH" | "MY"
            | "PH" | "VN" | "PK" => Region::AsiaPacific,
            "BR" | "MX" | "AR" | "CL" | "CO" | "PE" => Region::LatinAmerica,
            "AE" | "SA" | "IL" | "QA" | "EG" | "ZA" | "NG" | "KE" => Region::MiddleEastAfrica,
            _ => Region::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "NA",
            Region::Europe => "EU",
            Region::AsiaPacific => "APAC",
            Region::LatinAmerica => "LATAM",
            Region::MiddleEastAfrica => "MEA",
            Region::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Region> {
        match value {
            "NA" => Some(Region::NorthAmerica),
            "EU" => Some(Region::Europe),
            "APAC" => Some(Region::AsiaPacific),
            "LATAM" => Some(Region::LatinAmerica),
            "MEA" => Some(Region::MiddleEastAfrica),
            "OTHER" => Some(Region::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
