use zkyc_core::ProtocolError;

/// Census state codes used inside state commitments.
const STATES: &[(&str, u32)] = &[
    ("Jammu and Kashmir", 1),
    ("Himachal Pradesh", 2),
    ("Punjab", 3),
    ("Chandigarh", 4),
    ("Uttarakhand", 5),
    ("Haryana", 6),
    ("Delhi", 7),
    ("Rajasthan", 8),
    ("Uttar Pradesh", 9),
    ("Bihar", 10),
    ("Sikkim", 11),
    ("Arunachal Pradesh", 12),
    ("Nagaland", 13),
    ("Manipur", 14),
    ("Mizoram", 15),
    ("Tripura", 16),
    ("Meghalaya", 17),
    ("Assam", 18),
    ("West Bengal", 19),
    ("Jharkhand", 20),
    ("Odisha", 21),
    ("Chhattisgarh", 22),
    ("Madhya Pradesh", 23),
    ("Gujarat", 24),
    ("Daman and Diu", 25),
    ("Dadra and Nagar Haveli", 26),
    ("Maharashtra", 27),
    ("Andhra Pradesh", 28),
    ("Karnataka", 29),
    ("Goa", 30),
    ("Lakshadweep", 31),
    ("Kerala", 32),
    ("Tamil Nadu", 33),
    ("Puducherry", 34),
    ("Andaman and Nicobar Islands", 35),
];

/// Look up a state code by name (case-insensitive) or accept a bare code.
pub fn state_code(name_or_code: &str) -> Result<u32, ProtocolError> {
    let needle = name_or_code.trim();
    if let Ok(code) = needle.parse::<u32>() {
        return state_name(code).map(|_| code).ok_or_else(|| unknown(needle));
    }
    STATES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(needle))
        .map(|(_, code)| *code)
        .ok_or_else(|| unknown(needle))
}

/// Every known state code, ascending.
pub fn state_codes() -> Vec<u32> {
    STATES.iter().map(|(_, code)| *code).collect()
}

pub fn state_name(code: u32) -> Option<&'static str> {
    STATES.iter().find(|(_, c)| *c == code).map(|(name, _)| *name)
}

fn unknown(s: &str) -> ProtocolError {
    ProtocolError::InvalidInput(format!("unknown state: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(state_codes().len(), 35);
        assert!(state_codes().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(state_code("Maharashtra").unwrap(), 27);
        assert_eq!(state_code("karnataka").unwrap(), 29);
        assert_eq!(state_code("Delhi").unwrap(), 7);
        assert_eq!(state_code("Tamil Nadu").unwrap(), 33);
        assert_eq!(state_code("Gujarat").unwrap(), 24);
    }

    #[test]
    fn test_numeric_code() {
        assert_eq!(state_code("27").unwrap(), 27);
        assert!(state_code("99").is_err());
    }

    #[test]
    fn test_unknown_name() {
        assert!(state_code("Atlantis").is_err());
        assert_eq!(state_name(29), Some("Karnataka"));
    }
}
