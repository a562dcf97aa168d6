//! Text-backed enums.
//!
//! Statuses and payload enums are stored as TEXT columns and JSON strings.
//! `string_enum!` generates `as_str`, `Display`, a lenient `FromStr`
//! (case, spaces and hyphens ignored, optional aliases) and string serde impls.
//! Unknown values are rejected rather than mapped to a default.

/// Normalize free text into the snake_case form enum variants are matched against.
pub fn enum_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $text:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> anyhow::Result<Self> {
                let token = $crate::common::string_enum::enum_token(s);
                match token.as_str() {
                    $( $text $(| $alias)* => Ok($name::$variant), )+
                    _ => Err(anyhow::anyhow!(
                        "Invalid {}: '{}'",
                        stringify!($name),
                        s
                    )),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use string_enum;

#[cfg(test)]
mod tests {
    use super::*;

    string_enum! {
        pub enum Flavor {
            Sweet => "sweet",
            SourCherry => "sour_cherry" | "cherry",
        }
    }

    #[test]
    fn parses_loose_spellings() {
        assert_eq!("Sour Cherry".parse::<Flavor>().unwrap(), Flavor::SourCherry);
        assert_eq!("sour-cherry".parse::<Flavor>().unwrap(), Flavor::SourCherry);
        assert_eq!(" CHERRY ".parse::<Flavor>().unwrap(), Flavor::SourCherry);
        assert!("salty".parse::<Flavor>().is_err());
    }

    #[test]
    fn serde_uses_canonical_text() {
        assert_eq!(serde_json::to_string(&Flavor::SourCherry).unwrap(), "\"sour_cherry\"");
        let parsed: Flavor = serde_json::from_str("\"Sweet\"").unwrap();
        assert_eq!(parsed, Flavor::Sweet);
        assert!(serde_json::from_str::<Flavor>("\"umami\"").is_err());
    }

    #[test]
    fn token_normalization() {
        assert_eq!(enum_token(" Dry Fly "), "dry_fly");
        assert_eq!(enum_token("wet-fly"), "wet_fly");
    }
}
