use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fallback swatch for categories without a configured color.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";

pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Food & Dining", "#EF4444"),
    ("Transportation", "#3B82F6"),
    ("Shopping", "#8B5CF6"),
    ("Entertainment", "#EC4899"),
    ("Bills & Utilities", "#F59E0B"),
    ("Healthcare", "#10B981"),
    ("Education", "#6366F1"),
    ("Travel", "#F97316"),
    ("Other", DEFAULT_CATEGORY_COLOR),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

impl Category {
    pub fn new(name: &str, color: &str) -> Self {
        Category {
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Error)]
pub enum CategoryConfigError {
    #[error("Failed to parse category config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Duplicate category: '{0}'")]
    Duplicate(String),
    #[error("Category name must not be empty")]
    EmptyName,
}

/// The ordered list of categories an expense may be filed under.
///
/// Passed explicitly to whatever needs it (validation, storage seeding,
/// rendering colors) instead of being re-fetched by each consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    categories: Vec<Category>,
}

#[derive(Deserialize)]
struct CategoryFile {
    #[serde(default)]
    categories: Vec<Category>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        CategoryConfig {
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|(name, color)| Category::new(name, color))
                .collect(),
        }
    }
}

impl CategoryConfig {
    pub fn new(categories: Vec<Category>) -> Result<Self, CategoryConfigError> {
        let mut seen: Vec<&str> = Vec::with_capacity(categories.len());
        for c in &categories {
            let name = c.name.trim();
            if name.is_empty() {
                return Err(CategoryConfigError::EmptyName);
            }
            if seen.contains(&name) {
                return Err(CategoryConfigError::Duplicate(name.to_string()));
            }
            seen.push(name);
        }
        Ok(CategoryConfig { categories })
    }

    /// Parse a `[[categories]]` table array. An empty file yields the defaults.
    pub fn from_toml(toml_content: &str) -> Result<Self, CategoryConfigError> {
        let file: CategoryFile = toml::from_str(toml_content)?;
        if file.categories.is_empty() {
            return Ok(Self::default());
        }
        Self::new(file.categories)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    pub fn color_for(&self, name: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.color.as_str())
            .unwrap_or(DEFAULT_CATEGORY_COLOR)
    }
}
