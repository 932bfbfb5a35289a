use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Nominal shade of a dye lot and the spread of its rolls.
struct Lot {
    l: f64,
    a: f64,
    b: f64,
    spread: f64,
}

const LOTS: [Lot; 4] = [
    Lot {
        l: 52.40,
        a: 1.20,
        b: 3.10,
        spread: 0.05,
    },
    Lot {
        l: 52.55,
        a: 1.25,
        b: 3.05,
        spread: 0.04,
    },
    Lot {
        l: 38.10,
        a: 14.80,
        b: -6.20,
        spread: 0.06,
    },
    Lot {
        l: 71.90,
        a: -2.30,
        b: 18.40,
        spread: 0.08,
    },
];

const ROLLS: usize = 1200;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut labels = Vec::with_capacity(ROLLS);
    let mut ls = Vec::with_capacity(ROLLS);
    let mut as_ = Vec::with_capacity(ROLLS);
    let mut bs = Vec::with_capacity(ROLLS);

    // Rolls arrive interleaved across lots, like a mixed delivery.
    for i in 0..ROLLS {
        let lot = &LOTS[rng.below(LOTS.len())];
        labels.push(format!("FR-{:05}", i + 1));
        ls.push(round2(rng.gauss(lot.l, lot.spread)));
        as_.push(round2(rng.gauss(lot.a, lot.spread)));
        bs.push(round2(rng.gauss(lot.b, lot.spread)));
    }

    // CSV
    let csv_path = "sample_data.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV")?;
    writer.write_record(["Fabric Roll Number", "L*", "a*", "b*"])?;
    for i in 0..ROLLS {
        writer.write_record([
            labels[i].clone(),
            format!("{:.2}", ls[i]),
            format!("{:.2}", as_[i]),
            format!("{:.2}", bs[i]),
        ])?;
    }
    writer.flush()?;

    // Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("Fabric Roll Number", DataType::Utf8, false),
        Field::new("L*", DataType::Float64, false),
        Field::new("a*", DataType::Float64, false),
        Field::new("b*", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(labels)),
            Arc::new(Float64Array::from(ls)),
            Arc::new(Float64Array::from(as_)),
            Arc::new(Float64Array::from(bs)),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "sample_data.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!(
        "Wrote {ROLLS} rolls from {} lots to {csv_path} and {parquet_path}",
        LOTS.len()
    );
    Ok(())
}
