//! Generate a small synthetic dataset (train.csv + store.csv) so the
//! dashboard core can be exercised without the real data drop.
//!
//! Deterministic: the same seed always produces the same files. A few
//! stores deliberately skip Promo2 (empty `Promo2Since*` cells) and one
//! has no competition data, so the fill and drop policies are visible on
//! the generated output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};

const N_STORES: u32 = 12;
const N_DAYS: i64 = 60;
const SEED: u64 = 20150101;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller gaussian.
    fn gauss(&mut self, mu: f64, sigma: f64) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mu + sigma * z
    }

    fn pick<'a>(&mut self, options: &'a [&'a str]) -> &'a str {
        options[(self.next_u64() % options.len() as u64) as usize]
    }
}

struct StoreSpec {
    id: u32,
    store_type: String,
    assortment: String,
    competition_distance: Option<f64>,
    competition_open_since: (u32, i32),
    promo2: bool,
    base_sales: f64,
}

fn generate_stores(rng: &mut SimpleRng) -> Vec<StoreSpec> {
    (1..=N_STORES)
        .map(|id| StoreSpec {
            id,
            store_type: rng.pick(&["a", "b", "c", "d"]).to_string(),
            assortment: rng.pick(&["a", "b", "c"]).to_string(),
            // one store without competition data
            competition_distance: if id == 5 {
                None
            } else {
                Some((rng.next_f64() * 8000.0 + 200.0).round())
            },
            competition_open_since: (1 + (rng.next_u64() % 12) as u32, 2006 + (rng.next_u64() % 9) as i32),
            promo2: rng.next_f64() < 0.5,
            base_sales: 4000.0 + rng.next_f64() * 5000.0,
        })
        .collect()
}

fn write_store_csv(path: &Path, stores: &[StoreSpec]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "Store",
        "StoreType",
        "Assortment",
        "CompetitionDistance",
        "CompetitionOpenSinceMonth",
        "CompetitionOpenSinceYear",
        "Promo2",
        "Promo2SinceWeek",
        "Promo2SinceYear",
        "PromoInterval",
    ])?;

    for s in stores {
        let distance = s
            .competition_distance
            .map(|d| format!("{d}"))
            .unwrap_or_default();
        let (month, year) = s.competition_open_since;
        // Promo2 non-participants leave the Since/Interval cells empty,
        // exactly like the real file
        let (week, since_year, interval) = if s.promo2 {
            ("13".to_string(), "2013".to_string(), "Jan,Apr,Jul,Oct".to_string())
        } else {
            (String::new(), String::new(), String::new())
        };
        w.write_record([
            s.id.to_string(),
            s.store_type.clone(),
            s.assortment.clone(),
            distance,
            month.to_string(),
            year.to_string(),
            u8::from(s.promo2).to_string(),
            week,
            since_year,
            interval,
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_train_csv(path: &Path, stores: &[StoreSpec], rng: &mut SimpleRng) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "Store",
        "DayOfWeek",
        "Date",
        "Sales",
        "Customers",
        "Open",
        "Promo",
        "StateHoliday",
        "SchoolHoliday",
    ])?;

    let start = NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid start date");
    for s in stores {
        for offset in 0..N_DAYS {
            let date = start + Duration::days(offset);
            let weekday = date.weekday().number_from_monday(); // 1..=7

            let promo = rng.next_f64() < 0.4;
            let state_holiday = if rng.next_f64() < 0.03 {
                rng.pick(&["a", "b", "c"])
            } else {
                "0"
            };
            let school_holiday = rng.next_f64() < 0.15;

            // weekend dip, promo lift, holiday dip
            let mut level = s.base_sales;
            if weekday >= 6 {
                level *= 0.7;
            }
            if promo {
                level *= 1.25;
            }
            if state_holiday != "0" {
                level *= 0.4;
            }
            let sales = rng.gauss(level, level * 0.08).max(0.0).round();
            let customers = (sales / 9.0).round() as u32;

            w.write_record([
                s.id.to_string(),
                weekday.to_string(),
                date.format("%Y-%m-%d").to_string(),
                sales.to_string(),
                customers.to_string(),
                "1".to_string(),
                u8::from(promo).to_string(),
                state_holiday.to_string(),
                u8::from(school_holiday).to_string(),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data".to_string());
    let out_dir = Path::new(&out_dir);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(SEED);
    let stores = generate_stores(&mut rng);

    let store_path = out_dir.join("store.csv");
    let train_path = out_dir.join("train.csv");
    write_store_csv(&store_path, &stores)?;
    write_train_csv(&train_path, &stores, &mut rng)?;

    println!(
        "wrote {} stores x {} days to {} and {}",
        N_STORES,
        N_DAYS,
        train_path.display(),
        store_path.display()
    );
    Ok(())
}
