//! Per-kilometre split statistics.

use serde::Serialize;

use crate::metrics::coefficient_of_variation;

#[derive(Debug, Clone, Default)]
struct Accumulator {
    paces: Vec<f64>,
    heart_rates: Vec<u16>,
}

impl Accumulator {
    fn add(&mut self, pace: f64, heart_rate: Option<u16>) {
        self.paces.push(pace);
        if let Some(hr) = heart_rate {
            self.heart_rates.push(hr);
        }
    }

    fn avg_pace(&self) -> Option<f64> {
        mean(self.paces.iter().copied())
    }

    fn avg_hr(&self) -> Option<f64> {
        mean(self.heart_rates.iter().map(|&hr| f64::from(hr)))
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

#[derive(Debug, Clone)]
struct KmSplit {
    km: u32,
    all: Accumulator,
    sections: Vec<Accumulator>,
}

impl KmSplit {
    fn new(km: u32, section_m: u32) -> Self {
        let count = 1000_u32.div_ceil(section_m) as usize;
        Self {
            km,
            all: Accumulator::default(),
            sections: vec![Accumulator::default(); count],
        }
    }

    fn summary(&self, section_m: u32) -> Option<KmSplitSummary> {
        let avg_pace = self.all.avg_pace()?;
        let sections = self
            .sections
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let start_m = i as u32 * section_m;
                Some(SectionSummary {
                    start_m,
                    end_m: (start_m + section_m).min(1000),
                    avg_pace: s.avg_pace()?,
                    avg_hr: s.avg_hr(),
                })
            })
            .collect();

        Some(KmSplitSummary {
            km: self.km,
            avg_pace,
            cv_pace: split_cv(&self.all.paces),
            avg_hr: self.all.avg_hr(),
            sections,
        })
    }
}

/// CV of split paces; 0 below two samples or for a zero mean.
fn split_cv(paces: &[f64]) -> f64 {
    if paces.len() < 2 {
        return 0.0;
    }
    coefficient_of_variation(paces)
}

/// Aggregates of one sub-kilometre section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    pub start_m: u32,
    pub end_m: u32,
    pub avg_pace: f64,
    pub avg_hr: Option<f64>,
}

/// Aggregates of one kilometre (1-based).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KmSplitSummary {
    pub km: u32,
    pub avg_pace: f64,
    pub cv_pace: f64,
    pub avg_hr: Option<f64>,
    pub sections: Vec<SectionSummary>,
}

/// Collects samples into kilometre splits by distance done.
#[derive(Debug, Clone)]
pub struct KmSplits {
    section_m: u32,
    kms: Vec<KmSplit>,
}

impl KmSplits {
    pub fn new(section_m: u32) -> Self {
        Self {
            section_m: section_m.clamp(1, 1000),
            kms: Vec::new(),
        }
    }

    pub fn add_sample(&mut self, distance_m: f64, pace: f64, heart_rate: Option<u16>) {
        let distance_m = distance_m.max(0.0);
        let km = (distance_m / 1000.0).floor() as u32 + 1;

        let next = self.kms.last().map_or(1, |last| last.km + 1);
        for k in next..=km {
            self.kms.push(KmSplit::new(k, self.section_m));
        }

        let Some(split) = self.kms.iter_mut().rev().find(|s| s.km == km) else {
            return;
        };
        let within = distance_m - f64::from(km - 1) * 1000.0;
        let section =
            ((within / f64::from(self.section_m)) as usize).min(split.sections.len() - 1);

        split.all.add(pace, heart_rate);
        split.sections[section].add(pace, heart_rate);
    }

    pub fn summaries(&self) -> Vec<KmSplitSummary> {
        self.kms
            .iter()
            .filter_map(|km| km.summary(self.section_m))
            .collect()
    }
}
