use chrono::NaiveDate;
use std::collections::BTreeMap;

/// `{"yyyy-mm-dd": {"category": sum}}`
pub type DatewiseCategorySums = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    All,
    Category(String),
}

impl CategorySelection {
    /// `ALL` sums every category; anything else names one.
    pub fn from_name(name: &str) -> Self {
        if name == "ALL" {
            CategorySelection::All
        } else {
            CategorySelection::Category(name.to_string())
        }
    }
}

/// Values for a line chart, one per label.
pub fn category_values(
    sums: &DatewiseCategorySums,
    selection: Option<&CategorySelection>,
    labels: &[String],
) -> Vec<f64> {
    let Some(selection) = selection else {
        return Vec::new();
    };

    labels
        .iter()
        .map(|label| {
            let Some(categories) = sums.get(label) else {
                return 0.0;
            };
            match selection {
                CategorySelection::All => categories.values().sum(),
                CategorySelection::Category(name) => categories.get(name).copied().unwrap_or(0.0),
            }
        })
        .collect()
}

pub fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// One label per day, both ends included. Empty when `to` is before `from`.
pub fn date_labels(from: NaiveDate, to: NaiveDate) -> Vec<String> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .map(date_label)
        .collect()
}

/// The requested day range, or every date present in `sums` when either end
/// is open.
pub fn labels_for(
    sums: &DatewiseCategorySums,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<String> {
    match (from, to) {
        (Some(from), Some(to)) => date_labels(from, to),
        _ => sums.keys().cloned().collect(),
    }
}

/// `name[]=a&name[]=b`, the array form the metrics APIs accept.
pub fn fetch_array(name: &str, values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("{name}[]={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
