//! Static currency conversion to USD.
//!
//! Rates are fixed approximations and drift from market rates over time. They
//! are kept stable so that totals stay comparable between runs.

pub const BASE_CURRENCY: &str = "USD";

const USD_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 1.10),
    ("GBP", 1.27),
    ("JPY", 0.0067),
    ("CNY", 0.14),
    ("CAD", 0.74),
    ("AUD", 0.66),
    ("NZD", 0.61),
    ("CHF", 1.13),
    ("HKD", 0.128),
    ("SGD", 0.74),
    ("TWD", 0.031),
    ("KRW", 0.00075),
    ("INR", 0.012),
    ("IDR", 0.000064),
    ("THB", 0.028),
    ("MYR", 0.21),
    ("PHP", 0.018),
    ("VND", 0.000041),
    ("PKR", 0.0036),
    ("SEK", 0.095),
    ("NOK", 0.094),
    ("DKK", 0.147),
    ("PLN", 0.25),
    ("CZK", 0.044),
    ("HUF", 0.0028),
    ("RON", 0.22),
    ("BGN", 0.56),
    ("RUB", 0.011),
    ("TRY", 0.031),
    ("ILS", 0.27),
    ("AED", 0.27),
    ("SAR", 0.27),
    ("QAR", 0.27),
    ("EGP", 0.032),
    ("ZAR", 0.054),
    ("NGN", 0.00065),
    ("KZT", 0.0021),
    ("TZS", 0.0004),
    ("BRL", 0.20),
    ("MXN", 0.058),
    ("CLP", 0.0011),
    ("COP", 0.00025),
    ("PEN", 0.27),
];

/// USD value of one unit of `currency`. Unknown currencies convert at 1.0.
pub fn usd_rate(currency: &str) -> f64 {
    let code = currency.trim().to_uppercase();
    USD_RATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, rate)| *rate)
        .unwrap_or(1.0)
}

pub fn is_known_currency(currency: &str) -> bool {
    let code = currency.trim().to_uppercase();
    USD_RATES.iter().any(|(c, _)| *c == code)
}

/// Converts `amount` in `currency` to USD, returning `(converted, rate)`.
pub fn to_usd(amount: f64, currency: &str) -> (f64, f64) {
    let rate = usd_rate(currency);
    (amount * rate, rate)
}
