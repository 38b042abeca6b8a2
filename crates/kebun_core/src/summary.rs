use serde::Serialize;

use crate::model::Garden;

/// Headline totals for the dashboard cards.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GardenSummary {
    pub total_gardens: usize,
    pub total_luas: f64,
    pub total_pohon: u64,
}

impl GardenSummary {
    pub fn from_gardens(gardens: &[Garden]) -> Self {
        Self {
            total_gardens: gardens.len(),
            total_luas: gardens.iter().map(|g| g.luas).sum(),
            total_pohon: gardens.iter().map(|g| u64::from(g.jumlah_pohon)).sum(),
        }
    }
}

/// Finds a garden by id, falling back to its slug.
pub fn find_garden<'a>(gardens: &'a [Garden], id_or_slug: &str) -> Option<&'a Garden> {
    gardens
        .iter()
        .find(|g| g.id == id_or_slug)
        .or_else(|| {
            gardens
                .iter()
                .find(|g| !g.slug.is_empty() && g.slug == id_or_slug)
        })
}
