//! ISO 3166-1 alpha-2 country code -> ISO 4217 currency code.

/// Currency of `country` (case-insensitive), if known
pub fn currency_for_country(country: &str) -> Option<&'static str> {
    let code = country.trim().to_ascii_uppercase();
    let currency = match code.as_str() {
        // Euro area
        "AD" | "AT" | "BE" | "CY" | "DE" | "EE" | "ES" | "FI" | "FR" | "GR" | "HR" | "IE"
        | "IT" | "LT" | "LU" | "LV" | "MC" | "ME" | "MT" | "NL" | "PT" | "SI" | "SK" | "SM"
        | "VA" | "XK" | "GF" | "GP" | "MQ" | "RE" | "YT" | "PM" | "BL" | "MF" | "AX" => "EUR",
        // US dollar
        "US" | "EC" | "SV" | "PA" | "PR" | "GU" | "AS" | "VI" | "MP" | "TL" | "FM" | "MH"
        | "PW" | "TC" | "VG" | "BQ" | "UM" | "IO" => "USD",
        // Other dollars / pegs
        "CA" => "CAD",
        "AU" | "CX" | "CC" | "NF" | "KI" | "NR" | "TV" | "HM" => "AUD",
        "NZ" | "CK" | "NU" | "PN" | "TK" => "NZD",
        "SG" => "SGD",
        "HK" => "HKD",
        "TW" => "TWD",
        "JM" => "JMD",
        "TT" => "TTD",
        "BS" => "BSD",
        "BB" => "BBD",
        "BZ" => "BZD",
        "BM" => "BMD",
        "KY" => "KYD",
        "GY" => "GYD",
        "SR" => "SRD",
        "LR" => "LRD",
        "NA" => "NAD",
        "FJ" => "FJD",
        "SB" => "SBD",
        "BN" => "BND",
        "AG" | "DM" | "GD" | "KN" | "LC" | "VC" | "AI" | "MS" => "XCD",
        // Europe (non-euro)
        "GB" | "IM" | "JE" | "GG" => "GBP",
        "CH" | "LI" => "CHF",
        "NO" | "SJ" | "BV" => "NOK",
        "SE" => "SEK",
        "DK" | "FO" | "GL" => "DKK",
        "IS" => "ISK",
        "PL" => "PLN",
        "CZ" => "CZK",
        "HU" => "HUF",
        "RO" => "RON",
        "BG" => "BGN",
        "RS" => "RSD",
        "BA" => "BAM",
        "MK" => "MKD",
        "AL" => "ALL",
        "MD" => "MDL",
        "UA" => "UAH",
        "BY" => "BYN",
        "RU" => "RUB",
        "TR" => "TRY",
        "GE" => "GEL",
        "AM" => "AMD",
        "AZ" => "AZN",
        "GI" => "GIP",
        // Asia
        "IN" | "BT" => "INR",
        "CN" => "CNY",
        "JP" => "JPY",
        "KR" => "KRW",
        "KP" => "KPW",
        "ID" => "IDR",
        "MY" => "MYR",
        "TH" => "THB",
        "VN" => "VND",
        "PH" => "PHP",
        "PK" => "PKR",
        "BD" => "BDT",
        "LK" => "LKR",
        "NP" => "NPR",
        "MV" => "MVR",
        "MM" => "MMK",
        "KH" => "KHR",
        "LA" => "LAK",
        "MN" => "MNT",
        "KZ" => "KZT",
        "UZ" => "UZS",
        "KG" => "KGS",
        "TJ" => "TJS",
        "TM" => "TMT",
        "AF" => "AFN",
        "MO" => "MOP",
        // Middle East
        "AE" => "AED",
        "SA" => "SAR",
        "QA" => "QAR",
        "KW" => "KWD",
        "BH" => "BHD",
        "OM" => "OMR",
        "JO" => "JOD",
        "IL" | "PS" => "ILS",
        "LB" => "LBP",
        "SY" => "SYP",
        "IQ" => "IQD",
        "IR" => "IRR",
        "YE" => "YER",
        // Americas
        "MX" => "MXN",
        "BR" => "BRL",
        "AR" => "ARS",
        "CL" => "CLP",
        "CO" => "COP",
        "PE" => "PEN",
        "UY" => "UYU",
        "PY" => "PYG",
        "BO" => "BOB",
        "VE" => "VES",
        "CR" => "CRC",
        "GT" => "GTQ",
        "HN" => "HNL",
        "NI" => "NIO",
        "DO" => "DOP",
        "HT" => "HTG",
        "CU" => "CUP",
        "AW" => "AWG",
        "CW" | "SX" => "ANG",
        // Africa
        "ZA" | "LS" => "ZAR",
        "NG" => "NGN",
        "EG" => "EGP",
        "KE" => "KES",
        "TZ" => "TZS",
        "UG" => "UGX",
        "RW" => "RWF",
        "BI" => "BIF",
        "ET" => "ETB",
        "GH" => "GHS",
        "MA" | "EH" => "MAD",
        "DZ" => "DZD",
        "TN" => "TND",
        "LY" => "LYD",
        "SD" => "SDG",
        "SS" => "SSP",
        "SO" => "SOS",
        "DJ" => "DJF",
        "ER" => "ERN",
        "AO" => "AOA",
        "ZM" => "ZMW",
        "ZW" => "ZWL",
        "MW" => "MWK",
        "MZ" => "MZN",
        "BW" => "BWP",
        "SZ" => "SZL",
        "MG" => "MGA",
        "MU" => "MUR",
        "SC" => "SCR",
        "KM" => "KMF",
        "CD" => "CDF",
        "GM" => "GMD",
        "GN" => "GNF",
        "SL" => "SLE",
        "CV" => "CVE",
        "ST" => "STN",
        "MR" => "MRU",
        "BJ" | "BF" | "CI" | "GW" | "ML" | "NE" | "SN" | "TG" => "XOF",
        "CM" | "CF" | "TD" | "CG" | "GQ" | "GA" => "XAF",
        // Oceania
        "PG" => "PGK",
        "WS" => "WST",
        "TO" => "TOP",
        "VU" => "VUV",
        "NC" | "PF" | "WF" => "XPF",
        _ => return None,
    };
    Some(currency)
}
