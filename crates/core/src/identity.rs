//! Identity disclosure helpers.

/// Mask a national identifier for display and disclosure: keep the first
/// and last two characters, replace the middle with asterisks.
///
/// Short identifiers (four characters or fewer) are fully masked.
pub fn mask_national_id(national_id: &str) -> String {
    let len = national_id.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let head: String = national_id.chars().take(2).collect();
    let tail: String = national_id.chars().skip(len - 2).collect();
    format!("{head}{}{tail}", "*".repeat(len - 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_middle_digits() {
        assert_eq!(mask_national_id("1098765432"), "10******32");
    }

    #[test]
    fn short_ids_fully_masked() {
        assert_eq!(mask_national_id("1234"), "****");
        assert_eq!(mask_national_id(""), "");
    }
}
