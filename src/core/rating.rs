use crate::models::{Booking, RatingSummary, Review};

/// Mean review rating over a caretaker's bookings
///
/// Bookings of other caretakers are skipped, as are bookings without a
/// review. Returns `None` when no rating sample exists.
pub fn average_rating<'r, F>(
    caretaker_id: &str,
    bookings: &[Booking],
    review_lookup: F,
) -> Option<f64>
where
    F: FnMut(&str) -> Option<&'r Review>,
{
    summarize_ratings(caretaker_id, bookings, review_lookup).average_rating
}

/// Like [`average_rating`], also reporting how many reviews were counted
pub fn summarize_ratings<'r, F>(
    caretaker_id: &str,
    bookings: &[Booking],
    mut review_lookup: F,
) -> RatingSummary
where
    F: FnMut(&str) -> Option<&'r Review>,
{
    let (sum, count) = bookings
        .iter()
        .filter(|booking| booking.caretaker_id == caretaker_id)
        .filter_map(|booking| review_lookup(&booking.id))
        .fold((0i64, 0usize), |(sum, count), review| {
            (sum + i64::from(review.rating), count + 1)
        });

    let average_rating = if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    };

    RatingSummary {
        caretaker_id: caretaker_id.to_string(),
        average_rating,
        review_count: count,
    }
}
