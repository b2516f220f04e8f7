//! Text rendering of a record's visit history.

use std::cmp::Ordering;

use crate::models::{PatientRecord, Visit};

/// Render visits most recent first, one block per visit:
///
/// ```text
/// 2024-03-15:
/// Control de presión
///
/// 2024-01-01:
/// Chequeo anual
/// ```
///
/// Empty when there is no record or it has no visits. Stored order is not
/// touched. Visits with equal timestamps keep their recorded order; visits
/// whose timestamp does not parse go last.
pub fn render_history(record: Option<&PatientRecord>) -> String {
    let Some(record) = record else {
        return String::new();
    };

    let mut visits: Vec<&Visit> = record.visits.iter().collect();
    visits.sort_by(|a, b| newest_first(a, b));

    let mut text = String::new();
    for visit in visits {
        text.push_str(visit.date());
        text.push_str(":\n");
        text.push_str(visit.notes());
        text.push_str("\n\n");
    }

    text.truncate(text.trim_end().len());
    text
}

fn newest_first(a: &Visit, b: &Visit) -> Ordering {
    match (a.instant(), b.instant()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
