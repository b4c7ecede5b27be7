//! The category registry.
//!
//! Words are partitioned in two ways: a closed set of test-prep categories stored as boolean
//! columns on the word itself, and an open set of named categories linked through the
//! `word_categories` table. The registry maps every category key the application knows about to
//! the way its membership is stored, so the loading code only ever asks the registry.

use std::collections::BTreeMap;
use voca_core::category_key;

/// How membership in a category is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySpec {
    /// Membership is a boolean column on the `words` table.
    Flag { column: String, tag: String },
    /// Membership is a row in `word_categories` pointing at the category called `name`.
    Joined { name: String },
    /// The category exists in the navigation but its data is not loaded yet.
    Pending { grade: String },
}

impl CategorySpec {
    fn flag(column: &str, tag: &str) -> Self {
        Self::Flag {
            column: column.to_string(),
            tag: tag.to_string(),
        }
    }

    fn joined(name: &str) -> Self {
        Self::Joined {
            name: name.to_string(),
        }
    }

    fn pending(grade: &str) -> Self {
        Self::Pending {
            grade: grade.to_string(),
        }
    }

    /// The tag words loaded through this category carry.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Flag { tag, .. } => Some(tag),
            Self::Joined { name } => Some(name),
            Self::Pending { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    entries: BTreeMap<String, CategorySpec>,
}

impl CategoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The categories MagicVoca ships with.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("toeic", CategorySpec::flag("is_toeic", "TOEIC"));
        registry.register("toefl", CategorySpec::flag("is_toefl", "TOEFL"));
        registry.register("gtelp", CategorySpec::flag("is_gtelp", "GTELP"));
        registry.register("suneung", CategorySpec::flag("is_suneung", "수능"));
        registry.register("gongmuwon", CategorySpec::flag("is_gongmuwon", "공무원"));

        registry.register("thai", CategorySpec::joined("THAI"));
        registry.register("korean", CategorySpec::joined("KOREAN"));
        registry.register("kr-en-basic", CategorySpec::joined("KOREAN"));
        registry.register(
            "thai-conversation",
            CategorySpec::joined("THAI-CONVERSATION"),
        );

        for (grade, label) in [
            ("8", "8급"),
            ("7", "7급"),
            ("6", "6급"),
            ("5", "5급"),
            ("4", "4급"),
            ("3", "3급"),
            ("2", "2급"),
            ("1", "1급"),
            ("special", "특급"),
        ] {
            registry.register(&format!("hanja-{grade}"), CategorySpec::pending(label));
        }
        registry
    }

    /// Registers `spec` under `key`, replacing any earlier entry.
    pub fn register(&mut self, key: &str, spec: CategorySpec) {
        self.entries.insert(category_key(key), spec);
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, key: &str) -> Option<&CategorySpec> {
        self.entries.get(&category_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
