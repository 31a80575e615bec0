//! The fixed list of expense categories.
//!
//! Categories are a closed set with stable integer IDs rather than free
//! text, so the store can reference them by ID and listings can group by
//! them without normalising labels.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{DatabaseID, Error};

/// A category for expenses, e.g. 'Comida' or 'Transporte'.
///
/// The set is fixed; each variant has a stable ID used as the foreign
/// reference in the expense table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Food and groceries.
    Comida,
    /// Public transport, fuel and travel.
    Transporte,
    /// Rent, utilities and household expenses.
    Hogar,
    /// Leisure and entertainment.
    Ocio,
    /// Health and medical expenses.
    Salud,
    /// Anything that does not fit the other categories.
    Otros,
}

impl Category {
    /// Every category, in ID order.
    pub const ALL: [Category; 6] = [
        Category::Comida,
        Category::Transporte,
        Category::Hogar,
        Category::Ocio,
        Category::Salud,
        Category::Otros,
    ];

    /// The stable ID of the category in the database.
    pub fn id(self) -> DatabaseID {
        match self {
            Category::Comida => 1,
            Category::Transporte => 2,
            Category::Hogar => 3,
            Category::Ocio => 4,
            Category::Salud => 5,
            Category::Otros => 6,
        }
    }

    /// Look up a category by its stable ID, or `None` if the ID is not in
    /// the fixed list.
    pub fn from_id(id: DatabaseID) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|category| category.id() == id)
    }

    /// The display label of the category.
    pub fn name(self) -> &'static str {
        match self {
            Category::Comida => "Comida",
            Category::Transporte => "Transporte",
            Category::Hogar => "Hogar",
            Category::Ocio => "Ocio",
            Category::Salud => "Salud",
            Category::Otros => "Otros",
        }
    }

    /// Look up a category by its label, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_name(s).ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}
