//! Seeded synthetic survey extract.
//!
//! Produces a household file and an individual file with the same column
//! codes, value ranges and missing-data patterns as the real extract, so the
//! whole pipeline can run (and be tested) without the licensed survey data.
//! Output is a pure function of `(households, seed)`.

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::LogNormal;
use tracing::info;

use crate::config::{HH_FILENAME, IND_FILENAME};
use crate::domain::Table;
use crate::error::{ConfigurationError, ExportError};
use crate::io::export::write_table_csv;

const FIRST_HHID: f64 = 100_001.0;
const SURVEY_YEAR: i32 = 2017;

/// Share of amounts reported only as an interval code.
const INTERVAL_SHARE: f64 = 0.25;
/// Share of households reporting no assets at all.
const ZERO_ASSET_SHARE: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct SyntheticExtract {
    pub households: Table,
    pub individuals: Table,
}

impl SyntheticExtract {
    /// Write both files under `dir` using the file names the pipeline expects.
    pub fn write_to(&self, dir: &Path) -> Result<(), ExportError> {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        write_table_csv(&dir.join(HH_FILENAME), &self.households)?;
        write_table_csv(&dir.join(IND_FILENAME), &self.individuals)?;
        info!(
            dir = %dir.display(),
            households = self.households.n_rows(),
            individuals = self.individuals.n_rows(),
            "wrote synthetic extract"
        );
        Ok(())
    }
}

/// Column buffers for one file, filled row by row.
struct Columns {
    names: Vec<&'static str>,
    values: Vec<Vec<Option<f64>>>,
}

impl Columns {
    fn new(names: &[&'static str]) -> Self {
        Self {
            names: names.to_vec(),
            values: vec![Vec::new(); names.len()],
        }
    }

    fn push_row(&mut self, row: &[(&'static str, Option<f64>)]) {
        for (name, col) in self.names.iter().zip(self.values.iter_mut()) {
            let cell = row.iter().find(|(n, _)| n == name).and_then(|(_, v)| *v);
            col.push(cell);
        }
    }

    fn into_table(self) -> Table {
        Table::from_columns(self.names.into_iter().zip(self.values).collect())
    }
}

const HH_COLUMNS: &[&str] = &[
    "hhid", "b2000b", "c2002", "c2016_1", "c2016it_1", "c2016_2", "c2016it_2", "d1105", "d1105it",
    "d3109", "d3109it", "c7052b", "c7052bit", "c7062", "c7062it", "b2003d",
    "c3002a_1", "c3002ait_1", "c7060", "c7060it", "e1006", "e1006it", "e3003c", "e3003cit",
];

const IND_COLUMNS: &[&str] = &[
    "hhid", "pline", "a2001", "a2003", "a2005", "a2012", "a2024", "a2025b", "a2028", "a2029",
];

/// Generate a synthetic extract with `households` households.
pub fn generate(households: usize, seed: u64) -> Result<SyntheticExtract, ConfigurationError> {
    if households == 0 {
        return Err(ConfigurationError::InvalidSetting {
            name: "households",
            reason: "must be > 0".to_string(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let house = lognormal(13.0, 0.8)?;
    let liquid = lognormal(10.0, 1.2)?;
    let durable = lognormal(11.0, 0.7)?;
    let loan = lognormal(11.5, 1.0)?;

    let mut hh = Columns::new(HH_COLUMNS);
    let mut ind = Columns::new(IND_COLUMNS);

    for i in 0..households {
        let hhid = Some(FIRST_HHID + i as f64);

        // Head and household members.
        let head_age: i32 = rng.gen_range(20..=80);
        let siblings_older: u32 = rng.gen_range(0..=3);
        let siblings_younger: u32 = rng.gen_range(0..=3);
        let siblings = f64::from(siblings_older + siblings_younger);
        let members: u32 = rng.gen_range(1..=4);
        for m in 0..members {
            let is_head = m == 0;
            let age = if is_head { head_age } else { rng.gen_range(1..=head_age) };
            let sex: u32 = rng.gen_range(1..=2);
            let educ: u32 = rng.gen_range(1..=9);
            let marital: u32 = rng.gen_range(1..=7);
            let health: u32 = rng.gen_range(1..=5);
            ind.push_row(&[
                ("hhid", hhid),
                ("pline", Some(f64::from(m + 1))),
                ("a2001", Some(if is_head { 1.0 } else { 2.0 })),
                ("a2003", Some(f64::from(sex))),
                ("a2005", Some(f64::from(SURVEY_YEAR - age))),
                ("a2012", maybe(&mut rng, 0.02, f64::from(educ))),
                ("a2024", Some(f64::from(marital))),
                ("a2025b", maybe(&mut rng, 0.02, f64::from(health))),
                ("a2028", maybe(&mut rng, 0.05, f64::from(siblings_older))),
                ("a2029", maybe(&mut rng, 0.05, f64::from(siblings_younger))),
            ]);
        }

        let has_business = rng.gen_bool(0.15);
        let num_houses: u32 = if rng.gen_bool(0.9) { rng.gen_range(0..=3) } else { 0 };
        let no_assets = rng.gen_bool(ZERO_ASSET_SHARE);

        let mut row: Vec<(&'static str, Option<f64>)> = vec![
            ("hhid", hhid),
            ("b2000b", Some(if has_business { 1.0 } else { 2.0 })),
            ("c2002", maybe(&mut rng, 0.03, f64::from(num_houses))),
        ];

        if !no_assets {
            if num_houses >= 1 {
                let v = house.sample(&mut rng);
                amount(&mut rng, &mut row, ("c2016_1", "c2016it_1"), v, 13);
            }
            if num_houses >= 2 {
                let v = house.sample(&mut rng);
                amount(&mut rng, &mut row, ("c2016_2", "c2016it_2"), v, 13);
            }
            let v = liquid.sample(&mut rng);
            amount(&mut rng, &mut row, ("d1105", "d1105it"), v, 11);
            if rng.gen_bool(0.6) {
                let v = liquid.sample(&mut rng);
                amount(&mut rng, &mut row, ("d3109", "d3109it"), v, 11);
            }
            if rng.gen_bool(0.3) {
                let v = durable.sample(&mut rng);
                amount(&mut rng, &mut row, ("c7052b", "c7052bit"), v, 11);
                if has_business && rng.gen_bool(0.3) {
                    let v = durable.sample(&mut rng) * 0.5;
                    amount(&mut rng, &mut row, ("c7062", "c7062it"), v, 11);
                }
            }
            if has_business {
                // The codebook documents no bins for this question; exact only.
                let v = house.sample(&mut rng) * 0.5;
                row.push(("b2003d", Some(v.round())));
            }
        }

        // Larger sibling networks borrow somewhat more often.
        let borrow_p = (0.15 + 0.03 * siblings).min(0.6);
        if num_houses >= 1 && rng.gen_bool(borrow_p) {
            let v = house.sample(&mut rng) * 0.4;
            amount(&mut rng, &mut row, ("c3002a_1", "c3002ait_1"), v, 11);
        }
        if rng.gen_bool(0.1) {
            let v = loan.sample(&mut rng) * 0.5;
            amount(&mut rng, &mut row, ("c7060", "c7060it"), v, 11);
        }
        if rng.gen_bool(borrow_p / 2.0) {
            let v = loan.sample(&mut rng);
            amount(&mut rng, &mut row, ("e1006", "e1006it"), v, 11);
        }
        if has_business && rng.gen_bool(0.2) {
            let v = loan.sample(&mut rng);
            amount(&mut rng, &mut row, ("e3003c", "e3003cit"), v, 11);
        }

        hh.push_row(&row);
    }

    Ok(SyntheticExtract {
        households: hh.into_table(),
        individuals: ind.into_table(),
    })
}

fn lognormal(mu: f64, sigma: f64) -> Result<LogNormal<f64>, ConfigurationError> {
    LogNormal::new(mu, sigma).map_err(|e| ConfigurationError::InvalidSetting {
        name: "synthetic distribution",
        reason: e.to_string(),
    })
}

/// `Some(value)`, or missing with probability `p_missing`.
fn maybe(rng: &mut StdRng, p_missing: f64, value: f64) -> Option<f64> {
    if rng.gen_bool(p_missing) { None } else { Some(value) }
}

/// Report an amount either exactly (rounded to whole yuan) or as an interval
/// code, the way respondents who decline an exact figure do.
fn amount(
    rng: &mut StdRng,
    row: &mut Vec<(&'static str, Option<f64>)>,
    (exact, interval): (&'static str, &'static str),
    value: f64,
    max_code: u32,
) {
    if rng.gen_bool(INTERVAL_SHARE) {
        // Codes grow roughly with the log of the amount.
        let code = ((value.max(1.0).log10() - 3.0) * 2.5).round().clamp(1.0, f64::from(max_code));
        row.push((interval, Some(code)));
    } else {
        row.push((exact, Some(value.round())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_extract() {
        let a = generate(50, 7).unwrap();
        let b = generate(50, 7).unwrap();
        assert_eq!(a.households, b.households);
        assert_eq!(a.individuals, b.individuals);

        let c = generate(50, 8).unwrap();
        assert_ne!(a.households, c.households);
    }

    #[test]
    fn every_household_has_exactly_one_head() {
        let extract = generate(40, 1).unwrap();
        assert_eq!(extract.households.n_rows(), 40);
        let ids = extract.individuals.column("hhid").unwrap();
        let flags = extract.individuals.column("a2001").unwrap();
        let heads = ids
            .iter()
            .zip(flags)
            .filter(|(_, f)| **f == Some(1.0))
            .count();
        assert_eq!(heads, 40);
    }

    #[test]
    fn interval_codes_stay_within_documented_bins() {
        let extract = generate(200, 3).unwrap();
        for code in extract.households.column("d1105it").unwrap().iter().flatten() {
            assert!((1.0..=11.0).contains(code));
        }
    }

    #[test]
    fn zero_households_is_rejected() {
        assert!(generate(0, 1).is_err());
    }

    #[test]
    fn write_to_uses_pipeline_file_names() {
        let dir = tempfile::tempdir().unwrap();
        generate(5, 1).unwrap().write_to(dir.path()).unwrap();
        assert!(dir.path().join(HH_FILENAME).exists());
        assert!(dir.path().join(IND_FILENAME).exists());
    }
}
