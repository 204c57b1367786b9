use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::DigestError;

/// Cinemas the digest knows how to read. The set is closed: every venue has
/// exactly one adapter and one display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Venue {
    Agrafka,
    CinemaCityBonarka,
    CinemaCityKazimierz,
    CinemaCityZakopianka,
    Kijow,
    Kika,
    Mikro,
    PodBaranami,
    Multikino,
    Paradox,
    Sfinks,
}

impl Venue {
    pub const COUNT: usize = 11;

    pub const ALL: [Venue; Venue::COUNT] = [
        Venue::Agrafka,
        Venue::CinemaCityBonarka,
        Venue::CinemaCityKazimierz,
        Venue::CinemaCityZakopianka,
        Venue::Kijow,
        Venue::Kika,
        Venue::Mikro,
        Venue::PodBaranami,
        Venue::Multikino,
        Venue::Paradox,
        Venue::Sfinks,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Venue::Agrafka => "Agrafka",
            Venue::CinemaCityBonarka => "Cinema City Bonarka",
            Venue::CinemaCityKazimierz => "Cinema City Kazimierz",
            Venue::CinemaCityZakopianka => "Cinema City Zakopianka",
            Venue::Kijow => "Kijów",
            Venue::Kika => "Kika",
            Venue::Mikro => "Mikro",
            Venue::PodBaranami => "Pod Baranami",
            Venue::Multikino => "Multikino",
            Venue::Paradox => "Paradox",
            Venue::Sfinks => "Sfinks",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Venue {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Venue::ALL
            .into_iter()
            .find(|v| format!("{:?}", v).eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DigestError::InvalidConfigValueError {
                field: "venue".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Unknown venue. Known venues: {}",
                    Venue::ALL
                        .iter()
                        .map(|v| format!("{:?}", v))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}
