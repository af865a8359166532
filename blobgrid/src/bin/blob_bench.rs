#[cfg(feature = "bench_blob")]
use blobgrid::{BlobConfig, BlobEngine, GridPoint, Layer};
#[cfg(feature = "bench_blob")]
use std::time::Instant;

#[cfg(not(feature = "bench_blob"))]
fn main() {
    panic!("blob_bench requires --features bench_blob");
}

// Deterministic pseudo-random fill so runs are comparable.
#[cfg(feature = "bench_blob")]
fn build_layer(w: i32, h: i32, density: u32) -> Layer {
    let mut state = 0x2545_f491u32;
    let mut pts = Vec::new();
    for y in 0..h {
        for x in 0..w {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state % 100 < density {
                pts.push(GridPoint::new(x, y));
            }
        }
    }
    Layer::with_points("bench", pts)
}

#[cfg(feature = "bench_blob")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut w = 200i32;
    let mut h = 200i32;
    let mut density = 45u32;
    let mut repeats = 10usize;
    for a in &args[1..] {
        if let Some(val) = a.strip_prefix("--w=") {
            if let Ok(v) = val.parse() {
                w = v;
            }
        } else if let Some(val) = a.strip_prefix("--h=") {
            if let Ok(v) = val.parse() {
                h = v;
            }
        } else if let Some(val) = a.strip_prefix("--density=") {
            if let Ok(v) = val.parse() {
                density = v;
            }
        } else if let Some(val) = a.strip_prefix("--repeats=") {
            if let Ok(v) = val.parse() {
                repeats = v;
            }
        }
    }

    let layer = build_layer(w, h, density);
    let mut engine = match BlobEngine::new(BlobConfig::new(50.0, 2.0)) {
        Ok(e) => e,
        Err(e) => panic!("bad config: {}", e),
    };

    let t0 = Instant::now();
    let cold = match engine.geometry(&layer) {
        Ok(g) => g,
        Err(e) => panic!("geometry failed: {}", e),
    };
    let cold_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let mut cached_ms = Vec::with_capacity(repeats);
    for _ in 0..repeats {
        let t = Instant::now();
        let _ = engine.geometry(&layer);
        cached_ms.push(t.elapsed().as_secs_f64() * 1000.0);
    }
    let avg_cached = if cached_ms.is_empty() {
        0.0
    } else {
        cached_ms.iter().sum::<f64>() / (cached_ms.len() as f64)
    };

    println!(
        "grid={}x{} points={} paths={} edges={} cold_ms={:.3} avg_cached_ms={:.4} {:?}",
        w,
        h,
        layer.points().len(),
        cold.paths.len(),
        cold.primitives.len(),
        cold_ms,
        avg_cached,
        engine.cache().stats()
    );
}
