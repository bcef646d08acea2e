use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    pub flag_url: &'static str,
}

/// Countries a card nationality may reference.
pub const COUNTRIES: &[Country] = &[
    Country { code: "fr", name: "France", flag_url: "https://flagcdn.com/fr.svg" },
    Country { code: "jp", name: "Japon", flag_url: "https://flagcdn.com/jp.svg" },
    Country { code: "us", name: "États-Unis", flag_url: "https://flagcdn.com/us.svg" },
    Country { code: "kr", name: "Corée du Sud", flag_url: "https://flagcdn.com/kr.svg" },
    Country { code: "cn", name: "Chine", flag_url: "https://flagcdn.com/cn.svg" },
    Country { code: "ca", name: "Canada", flag_url: "https://flagcdn.com/ca.svg" },
    Country { code: "be", name: "Belgique", flag_url: "https://flagcdn.com/be.svg" },
    Country { code: "ch", name: "Suisse", flag_url: "https://flagcdn.com/ch.svg" },
    Country { code: "tg", name: "Togo", flag_url: "https://flagcdn.com/tg.svg" },
    Country { code: "sn", name: "Sénégal", flag_url: "https://flagcdn.com/sn.svg" },
    Country { code: "ci", name: "Côte d'Ivoire", flag_url: "https://flagcdn.com/ci.svg" },
];

pub const GENRES: &[&str] = &[
    "Shonen",
    "Shojo",
    "Seinen",
    "Josei",
    "Isekai",
    "Mecha",
    "Slice of Life",
    "Romance",
    "Horror",
    "Fantasy",
    "Sci-Fi",
    "Sports",
    "Comedy",
    "Mystery",
    "Supernatural",
];

pub const STATUSES: &[&str] = &[
    "Otaku",
    "Cosplayer",
    "Mangaka",
    "Collectionneur",
    "Animateur",
    "Gamer",
    "Reviewer",
    "Traducteur",
    "Influenceur",
    "Streameur",
];

pub fn country(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code == code)
}

/// Payload of `GET /api/reference`.
#[derive(Debug, Serialize)]
pub struct ReferenceData {
    pub countries: &'static [Country],
    pub genres: &'static [&'static str],
    pub statuses: &'static [&'static str],
}

impl ReferenceData {
    pub fn get() -> Self {
        Self {
            countries: COUNTRIES,
            genres: GENRES,
            statuses: STATUSES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_lookup() {
        assert_eq!(country("jp").map(|c| c.name), Some("Japon"));
        assert!(country("xx").is_none());
        assert!(country("FR").is_none());
    }
}
