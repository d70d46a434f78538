//! Types derived from an outline.

use crate::ClothingCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A page marker line found in the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    /// Page number stated by the header
    pub page_number: u32,
    /// Zero-based line index in the outline
    pub line_index: usize,
    /// The header line as written
    pub raw_line: String,
}

/// Resolved clothing for every page of a story.
///
/// # Examples
///
/// ```
/// use picturebook_core::{ClothingCategory, ClothingPlan};
///
/// let plan = ClothingPlan::uniform(ClothingCategory::Summer, 3);
/// assert_eq!(plan.per_page.len(), 3);
/// assert_eq!(plan.for_page(2), ClothingCategory::Summer);
/// assert_eq!(plan.for_page(99), ClothingCategory::Summer);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClothingPlan {
    /// Story-wide default clothing
    pub primary: ClothingCategory,
    /// Clothing for pages 1..=total
    pub per_page: BTreeMap<u32, ClothingCategory>,
}

impl ClothingPlan {
    /// Every page set to `primary`.
    pub fn uniform(primary: ClothingCategory, total_pages: u32) -> Self {
        Self {
            primary,
            per_page: (1..=total_pages).map(|page| (page, primary)).collect(),
        }
    }

    /// Clothing for a page, defaulting to the primary category.
    pub fn for_page(&self, page: u32) -> ClothingCategory {
        self.per_page.get(&page).copied().unwrap_or(self.primary)
    }
}
