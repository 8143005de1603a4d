use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RegistryError, Result};

/// Characters that cannot appear in a file name on any of the platforms we write to.
static INVALID_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("file name character class should be valid")
});

/// Replace every character that is not allowed in a file name with `_`.
pub fn safe_filename(raw: &str) -> String {
    INVALID_FILENAME_CHARS.replace_all(raw, "_").into_owned()
}

/// Participant identifier usable as a key and as a file name component.
/// Fails when nothing but spaces is left.
pub fn participant_id(raw: &str) -> Result<String> {
    let id = safe_filename(raw);
    if id.chars().all(|c| c == ' ') {
        return Err(RegistryError::InvalidIdentifier {
            raw: raw.to_string(),
        });
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_characters_are_replaced() {
        assert_eq!(safe_filename("p1/../x"), "p1_.._x");
        assert_eq!(safe_filename(r#"a:b*c?"d""#), "a_b_c__d_");
        assert_eq!(safe_filename("tab\there"), "tab_here");
        assert_eq!(safe_filename("p 01"), "p 01");
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(matches!(
            participant_id(""),
            Err(RegistryError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            participant_id("   "),
            Err(RegistryError::InvalidIdentifier { .. })
        ));
        assert_eq!(participant_id(" p1 ").unwrap(), " p1 ");
        assert_eq!(participant_id("/").unwrap(), "_");
    }
}
