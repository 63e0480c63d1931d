use serde::Serialize;

/// Rating reported for a tour nobody has reviewed yet.
pub const NO_REVIEWS_AVERAGE: f64 = 4.5;

/// Aggregate of a tour's review ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingsSummary {
    pub quantity: u32,
    pub average: f64,
}

impl RatingsSummary {
    /// Count and mean of `ratings`; no ratings gives `0` and `4.5`.
    pub fn from_ratings(ratings: impl IntoIterator<Item = f64>) -> Self {
        let (count, sum) = ratings
            .into_iter()
            .fold((0u32, 0.0f64), |(count, sum), r| (count + 1, sum + r));
        if count == 0 {
            return Self {
                quantity: 0,
                average: NO_REVIEWS_AVERAGE,
            };
        }
        Self {
            quantity: count,
            average: sum / f64::from(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_falls_back_to_default() {
        assert_eq!(
            RatingsSummary::from_ratings([]),
            RatingsSummary {
                quantity: 0,
                average: 4.5
            }
        );
    }

    #[test]
    fn averages_ratings() {
        let s = RatingsSummary::from_ratings([5.0, 4.0, 5.0]);
        assert_eq!(s.quantity, 3);
        assert!((s.average - 4.666_666).abs() < 1e-5);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn average_stays_within_rating_bounds(ratings in proptest::collection::vec(1.0f64..=5.0, 1..50)) {
            let s = RatingsSummary::from_ratings(ratings.iter().copied());
            prop_assert_eq!(s.quantity as usize, ratings.len());
            prop_assert!(s.average >= 1.0 - 1e-9 && s.average <= 5.0 + 1e-9);
        }
    }
}
