use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Category tag of a post, drawn from a fixed list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Category {
    Personal,
    Professional,
    Tutorial,
    Review,
    News,
    Listicle,
    Interview,
    CaseStudy,
    Travel,
    Food,
    Fitness,
    Tech,
    Lifestyle,
    Education,
    Poetry,
    Business,
    Photo,
    Spiritual,
    Guest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 19] = [
        Category::Personal,
        Category::Professional,
        Category::Tutorial,
        Category::Review,
        Category::News,
        Category::Listicle,
        Category::Interview,
        Category::CaseStudy,
        Category::Travel,
        Category::Food,
        Category::Fitness,
        Category::Tech,
        Category::Lifestyle,
        Category::Education,
        Category::Poetry,
        Category::Business,
        Category::Photo,
        Category::Spiritual,
        Category::Guest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Professional => "professional",
            Category::Tutorial => "tutorial",
            Category::Review => "review",
            Category::News => "news",
            Category::Listicle => "listicle",
            Category::Interview => "interview",
            Category::CaseStudy => "case-study",
            Category::Travel => "travel",
            Category::Food => "food",
            Category::Fitness => "fitness",
            Category::Tech => "tech",
            Category::Lifestyle => "lifestyle",
            Category::Education => "education",
            Category::Poetry => "poetry",
            Category::Business => "business",
            Category::Photo => "photo",
            Category::Spiritual => "spiritual",
            Category::Guest => "guest",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive, so "Tech" and "tech" name the same category
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Tech".parse::<Category>().unwrap(), Category::Tech);
        assert_eq!("CASE-STUDY".parse::<Category>().unwrap(), Category::CaseStudy);
        assert!("gossip".parse::<Category>().is_err());
    }

    #[test]
    fn test_every_category_round_trips_through_its_slug() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }
}
