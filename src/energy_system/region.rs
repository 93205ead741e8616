use serde::{Deserialize, Serialize};

/// Handle of a region inside its energy system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub(crate) usize);

/// Optional geographic grouping of entities.
///
/// Geometry is carried as an opaque WKT string; nothing in the crate
/// interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    name: String,
    code: String,
    geom: Option<String>,
    #[serde(default)]
    entities: Vec<String>,
}

impl Region {
    /// Creates a region; `code` is derived from `name` when absent.
    pub fn new(name: impl Into<String>, code: Option<String>, geom: Option<String>) -> Self {
        let name = name.into();
        let code = code.unwrap_or_else(|| region_code(&name));
        Self {
            name,
            code,
            geom,
            entities: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn geom(&self) -> Option<&str> {
        self.geom.as_deref()
    }

    /// Uids of the member entities, in insertion order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Returns false when the entity already belongs to this region.
    pub(crate) fn push_entity(&mut self, uid: &str) -> bool {
        if self.entities.iter().any(|e| e == uid) {
            return false;
        }
        self.entities.push(uid.to_string());
        true
    }
}

/// Short code from the first two tokens of a region name.
///
/// Underscores count as spaces. Each token contributes its capitalised first
/// character followed by the next two characters in lower case, so
/// `"north_germany"` becomes `"NorGer"`.
pub fn region_code(name: &str) -> String {
    let normalized = name.replace('_', " ");
    normalized
        .splitn(2, ' ')
        .map(|part| {
            let mut chars = part.chars();
            let mut token: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
            token.extend(chars.take(2).flat_map(char::to_lowercase));
            token
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("north_germany", "NorGer")]
    #[case("berlin", "Ber")]
    #[case("Brandenburg an der Havel", "BraAn ")]
    #[case("x", "X")]
    #[case("", "")]
    fn test_region_code(#[case] name: &str, #[case] code: &str) {
        assert_eq!(region_code(name), code);
    }

    #[test]
    fn test_explicit_code_wins() {
        let region = Region::new("north_germany", Some("NG".into()), None);
        assert_eq!(region.code(), "NG");
        assert_eq!(Region::new("north_germany", None, None).code(), "NorGer");
    }

    #[test]
    fn test_entities_are_not_duplicated() {
        let mut region = Region::new("berlin", None, None);
        assert!(region.push_entity("pp"));
        assert!(!region.push_entity("pp"));
        assert_eq!(region.entities(), ["pp"]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn code_has_at_most_six_chars(name in "[a-z]{1,12}(_[a-z]{1,12}){0,3}") {
                let code = region_code(&name);
                prop_assert!(code.chars().count() <= 6);
                prop_assert!(code.chars().next().is_some_and(|c| c.is_uppercase()));
            }
        }
    }
}
