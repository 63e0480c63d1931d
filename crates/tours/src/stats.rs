//! Aggregations over tours: per-difficulty statistics and the monthly plan.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::tour::Tour;

/// Tours rated below this are left out of the statistics.
const STATS_MIN_RATING: f64 = 4.5;
const MONTHLY_PLAN_LIMIT: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    /// Upper-cased difficulty, e.g. `EASY`.
    pub difficulty: String,
    pub num_tours: usize,
    pub num_ratings: u64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPlan {
    /// 1-based month.
    pub month: u32,
    pub num_tour_starts: usize,
    pub tours: Vec<String>,
}

/// Group well-rated tours by difficulty, cheapest average first.
pub fn tour_stats<'a>(tours: impl IntoIterator<Item = &'a Tour>) -> Vec<DifficultyStats> {
    let mut groups: BTreeMap<&'static str, Vec<&Tour>> = BTreeMap::new();
    for tour in tours {
        if tour.ratings_average >= STATS_MIN_RATING {
            groups.entry(tour.difficulty.as_str()).or_default().push(tour);
        }
    }

    let mut stats: Vec<DifficultyStats> = groups
        .into_iter()
        .map(|(difficulty, group)| {
            let n = group.len() as f64;
            let prices = group.iter().map(|t| t.price);
            DifficultyStats {
                difficulty: difficulty.to_uppercase(),
                num_tours: group.len(),
                num_ratings: group.iter().map(|t| u64::from(t.ratings_quantity)).sum(),
                avg_rating: group.iter().map(|t| t.ratings_average).sum::<f64>() / n,
                avg_price: prices.clone().sum::<f64>() / n,
                min_price: prices.clone().fold(f64::INFINITY, f64::min),
                max_price: prices.fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect();

    stats.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));
    stats
}

/// Tour starts per month of `year`, busiest month first (at most twelve rows).
pub fn monthly_plan<'a>(tours: impl IntoIterator<Item = &'a Tour>, year: i32) -> Vec<MonthPlan> {
    let mut months: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for tour in tours {
        for start in tour.start_dates.iter().filter(|d| d.year() == year) {
            months.entry(start.month()).or_default().push(tour.name.clone());
        }
    }

    let mut plan: Vec<MonthPlan> = months
        .into_iter()
        .map(|(month, tours)| MonthPlan {
            month,
            num_tour_starts: tours.len(),
            tours,
        })
        .collect();

    // Stable sort keeps months ascending among equal counts.
    plan.sort_by(|a, b| b.num_tour_starts.cmp(&a.num_tour_starts));
    plan.truncate(MONTHLY_PLAN_LIMIT);
    plan
}
