//! Status counts for the dashboard charts. Rendering happens elsewhere.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use checklist_model::{Record, Status, DATE_FORMAT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub alert: usize,
    pub fail: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: Status) {
        match status {
            Status::Ok => self.ok += 1,
            Status::Alert => self.alert += 1,
            Status::Fail => self.fail += 1,
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Ok => self.ok,
            Status::Alert => self.alert,
            Status::Fail => self.fail,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.alert + self.fail
    }
}

/// Counts for one chart category (a checklist item or a date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub label: String,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Categorical,
    Temporal,
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Categorical { series: Vec<Breakdown> },
    Temporal { series: Vec<Breakdown> },
    Aggregate { counts: StatusCounts },
}

/// One entry per checklist item, in checklist order. Records whose item is not
/// in `items` are not counted.
pub fn categorical<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    items: &[String],
) -> Vec<Breakdown> {
    let mut series: Vec<Breakdown> = items
        .iter()
        .map(|item| Breakdown {
            label: item.clone(),
            counts: StatusCounts::default(),
        })
        .collect();
    for record in records {
        if let Some(entry) = series.iter_mut().find(|b| b.label == record.item) {
            entry.counts.add(record.status);
        }
    }
    series
}

/// One entry per date, oldest first. Dates that do not parse as `dd/mm/yyyy`
/// follow in lexical order.
pub fn temporal<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<Breakdown> {
    let mut dated: BTreeMap<NaiveDate, StatusCounts> = BTreeMap::new();
    let mut undated: BTreeMap<String, StatusCounts> = BTreeMap::new();
    for record in records {
        let counts = match NaiveDate::parse_from_str(record.date.trim(), DATE_FORMAT) {
            Ok(date) => dated.entry(date).or_default(),
            Err(_) => undated.entry(record.date.clone()).or_default(),
        };
        counts.add(record.status);
    }

    dated
        .into_iter()
        .map(|(date, counts)| Breakdown {
            label: date.format(DATE_FORMAT).to_string(),
            counts,
        })
        .chain(undated.into_iter().map(|(label, counts)| Breakdown { label, counts }))
        .collect()
}

pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a Record>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for record in records {
        counts.add(record.status);
    }
    counts
}

pub fn chart_data<'a>(
    kind: ChartKind,
    records: impl IntoIterator<Item = &'a Record>,
    items: &[String],
) -> ChartData {
    match kind {
        ChartKind::Categorical => ChartData::Categorical {
            series: categorical(records, items),
        },
        ChartKind::Temporal => ChartData::Temporal {
            series: temporal(records),
        },
        ChartKind::Aggregate => ChartData::Aggregate {
            counts: aggregate(records),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(date: &str, item: &str, status: Status) -> Record {
        Record {
            date: date.to_string(),
            time: "10:00:00".to_string(),
            name: "Ana".to_string(),
            item: item.to_string(),
            status,
            notes: None,
        }
    }

    fn counts(ok: usize, alert: usize, fail: usize) -> StatusCounts {
        StatusCounts { ok, alert, fail }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("02/03/2024", "UPS", Status::Ok),
            record("01/03/2024", "UPS", Status::Fail),
            record("01/03/2024", "Fans", Status::Alert),
            record("someday", "Fans", Status::Ok),
            record("10/02/2024", "Retired item", Status::Fail),
            record("", "UPS", Status::Ok),
        ]
    }

    #[test]
    fn categorical_follows_checklist_order() {
        let items = vec!["Fans".to_string(), "UPS".to_string(), "Doors".to_string()];
        assert_eq!(
            categorical(&sample(), &items),
            vec![
                Breakdown { label: "Fans".to_string(), counts: counts(1, 1, 0) },
                Breakdown { label: "UPS".to_string(), counts: counts(2, 0, 1) },
                Breakdown { label: "Doors".to_string(), counts: counts(0, 0, 0) },
            ]
        );
    }

    #[test]
    fn temporal_sorts_dates_chronologically_then_unparsed() {
        let labels: Vec<String> = temporal(&sample()).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["10/02/2024", "01/03/2024", "02/03/2024", "", "someday"]);
        assert_eq!(temporal(&sample())[1].counts, counts(0, 1, 1));
    }

    #[test]
    fn aggregate_counts_every_record() {
        let totals = aggregate(&sample());
        assert_eq!(totals, counts(3, 1, 2));
        assert_eq!(totals.total(), 6);
        assert_eq!(totals.get(Status::Fail), 2);
    }

    #[test]
    fn chart_data_serializes_with_a_kind_tag() {
        let data = chart_data(ChartKind::Aggregate, &sample(), &[]);
        assert_eq!(
            serde_json::to_value(&data).expect("json"),
            serde_json::json!({"kind": "aggregate", "counts": {"ok": 3, "alert": 1, "fail": 2}})
        );
        assert!(
            chart_data(ChartKind::Temporal, &Vec::<Record>::new(), &[])
                == ChartData::Temporal { series: vec![] }
        );
    }
}
