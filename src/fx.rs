use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const BUILTIN_RATES: &[(&str, f64)] = &[
    ("PLN", 0.22),
    ("SEK", 0.10),
    ("CAD", 0.75),
    ("RUB", 0.013),
    ("MXN", 0.057),
    ("AUD", 0.66),
    ("JPY", 0.0069),
    ("CNY", 0.14),
    ("ZAR", 0.052),
    ("BTC", 30000.0),
    ("COP", 0.00026),
    ("ARS", 0.0053),
    ("TRY", 0.033),
    ("IRR", 0.000024),
    ("IDR", 0.000064),
    ("UAH", 0.027),
    ("HRK", 0.14),
    ("ILS", 0.27),
    ("BDT", 0.0094),
    ("PKR", 0.0057),
    ("CHF", 1.09),
    ("RON", 0.23),
    ("LKR", 0.0028),
    ("CZK", 0.043),
    ("HUF", 0.0026),
    ("BGN", 0.56),
    ("MYR", 0.22),
    ("BAM", 0.56),
    ("PHP", 0.018),
    ("BYN", 0.41),
    ("GHS", 0.085),
    ("DZD", 0.0072),
    ("GEL", 0.35),
    ("KES", 0.0072),
    ("CLP", 0.0012),
    ("VND", 0.000042),
    ("THB", 0.028),
    ("NZD", 0.60),
    ("RSD", 0.0090),
    ("KRW", 0.00076),
    ("TND", 0.32),
    ("HKD", 0.13),
    ("TWD", 0.032),
    ("MAD", 0.10),
    ("AED", 0.27),
    ("EGP", 0.032),
    ("NGN", 0.0024),
    ("UGX", 0.000027),
    ("MMK", 0.00040),
    ("TZS", 0.00043),
    ("CUC", 1.00),
    ("ISK", 0.0076),
    ("OMR", 2.60),
    ("AMD", 0.0026),
    ("PEN", 0.26),
    ("NPR", 0.0077),
    ("DOP", 0.017),
    ("SYP", 0.00040),
    ("NIO", 0.027),
    ("KZT", 0.0023),
    ("PYG", 0.00014),
    ("MKD", 0.017),
    ("SAR", 0.27),
    ("JOD", 1.41),
    ("AZN", 0.59),
    ("CUP", 1.00),
    ("MDL", 0.053),
    ("VEF", 0.000001),
    ("XAF", 0.0017),
    ("MUR", 0.022),
    ("ETB", 0.019),
    ("DKK", 0.16),
    ("KWD", 3.27),
    ("GTQ", 0.13),
    ("BHD", 2.65),
    ("MVR", 0.065),
    ("MNT", 0.00031),
    ("KGS", 0.012),
    ("UYU", 0.025),
    ("ALL", 0.010),
    ("FJD", 0.47),
    ("MZN", 0.015),
    ("SDG", 0.0023),
    ("CRC", 0.0017),
    ("NOK", 0.10),
    ("LYD", 0.21),
    ("BOB", 0.14),
    ("MGA", 0.00023),
    ("NAD", 0.052),
    ("TTD", 0.15),
    ("HNL", 0.041),
    ("BTN", 0.012),
    ("IQD", 0.00069),
    ("RWF", 0.00083),
    ("AFN", 0.011),
    ("YER", 0.0040),
    ("GMD", 0.018),
    ("UZS", 0.000090),
    ("ZMW", 0.055),
    ("XOF", 0.0017),
    ("QAR", 0.27),
    ("MOP", 0.12),
    ("XPF", 0.0090),
    ("XCD", 0.37),
    ("JMD", 0.0061),
    ("LBP", 0.000066),
    ("CVE", 0.01),
    ("BND", 0.74),
    ("TMT", 0.29),
    ("ANG", 0.56),
    ("SOS", 0.0018),
    ("GNF", 0.00010),
    ("AOA", 0.0016),
    ("BZD", 0.50),
    ("DJF", 0.0056),
    ("WST", 0.37),
    ("BBD", 0.50),
    ("LSL", 0.054),
    ("SZL", 0.054),
    ("TJS", 0.091),
    ("VES", 0.000025),
    ("BMD", 1.00),
    ("GGP", 1.31),
    ("BIF", 0.00050),
    ("IMP", 1.31),
    ("BWP", 0.082),
    ("HTG", 0.0090),
    ("LAK", 0.000055),
    ("SCR", 0.074),
    ("MWK", 0.0012),
    ("SRD", 0.012),
    ("KYD", 1.20),
    ("BSD", 1.00),
    ("CDF", 0.00050),
    ("GIP", 1.31),
    ("KHR", 0.00025),
    ("FKP", 1.31),
    ("GYD", 0.0048),
    ("MRU", 0.028),
    ("TOP", 0.42),
    ("LRD", 0.0053),
    ("AWG", 0.56),
    ("KPW", 0.0010),
    ("SBD", 0.12),
    ("SLL", 0.000055),
    ("JEP", 1.31),
    ("SSP", 0.0055),
    ("XDR", 1.36),
    ("USD", 1.00),
    ("EUR", 1.13),
    ("GBP", 1.29),
    ("INR", 0.015),
];

/// Outcome of looking a currency code up in the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    Known(f64),
    /// The code is not in the table; the value is the fallback multiplier.
    Defaulted(f64),
}

impl Rate {
    pub fn multiplier(self) -> f64 {
        match self {
            Rate::Known(rate) | Rate::Defaulted(rate) => rate,
        }
    }

    pub fn is_default(self) -> bool {
        matches!(self, Rate::Defaulted(_))
    }
}

/// Static currency code to USD multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxTable {
    pub rates: BTreeMap<String, f64>,
    #[serde(default = "default_fallback")]
    pub fallback: f64,
}

fn default_fallback() -> f64 {
    1.0
}

impl Default for FxTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FxTable {
    pub fn builtin() -> Self {
        Self {
            rates: BUILTIN_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
            fallback: default_fallback(),
        }
    }

    pub fn lookup(&self, code: &str) -> Rate {
        match self.rates.get(code.trim()) {
            Some(rate) => Rate::Known(*rate),
            None => Rate::Defaulted(self.fallback),
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reports_defaulted_codes() {
        let table = FxTable::builtin();
        assert_eq!(table.lookup("EUR"), Rate::Known(1.13));
        assert_eq!(table.lookup("XYZ"), Rate::Defaulted(1.0));
        assert!(table.lookup("XYZ").is_default());
        assert_eq!(table.lookup("XYZ").multiplier(), 1.0);
    }
}
