use super::{normalize_percentage, raw::RawRrdPoint};
use crate::core::domain::{model::history::HistoryPoint, value_object::Timeframe};
use std::collections::BTreeMap;

/// A complete sample, in the units of the output.
struct Sample {
    cpu: f64,
    memory_used: f64,
    memory_total: f64,
    disk_used: f64,
    disk_total: f64,
    net_in: Option<f64>,
    net_out: Option<f64>,
}

impl Sample {
    /// Node series are `memused/memtotal/rootused/roottotal`, guest series
    /// `mem/maxmem/disk/maxdisk`.
    fn read(raw: &RawRrdPoint) -> Option<Self> {
        Some(Sample {
            cpu: raw.cpu?,
            memory_used: raw.memused.or(raw.mem)?,
            memory_total: raw.memtotal.or(raw.maxmem)?,
            disk_used: raw.rootused.or(raw.disk)?,
            disk_total: raw.roottotal.or(raw.maxdisk)?,
            net_in: raw.netin,
            net_out: raw.netout,
        })
    }
}

#[derive(Default)]
struct Bucket {
    count: f64,
    cpu: f64,
    memory_used: f64,
    memory_total: f64,
    disk_used: f64,
    disk_total: f64,
    net_in: Average,
    net_out: Average,
}

#[derive(Default)]
struct Average {
    sum: f64,
    count: f64,
}

impl Average {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1.0;
        }
    }

    fn get(&self) -> Option<f64> {
        (self.count > 0.0).then(|| self.sum / self.count)
    }
}

/// Buckets raw RRD samples to the timeframe resolution and averages them.
///
/// Samples missing a timestamp, cpu, memory or disk are skipped; the second
/// value is how many. Buckets come out ascending by time.
pub(crate) fn bucket_points(raw: Vec<RawRrdPoint>, timeframe: Timeframe) -> (Vec<HistoryPoint>, usize) {
    let resolution = timeframe.resolution_secs();
    let mut buckets: BTreeMap<u64, Bucket> = BTreeMap::new();
    let mut skipped = 0;

    for point in &raw {
        let (Some(time), Some(sample)) = (point.time, Sample::read(point)) else {
            skipped += 1;
            continue;
        };
        let bucket = buckets.entry(time - time % resolution).or_default();
        bucket.count += 1.0;
        bucket.cpu += sample.cpu;
        bucket.memory_used += sample.memory_used;
        bucket.memory_total += sample.memory_total;
        bucket.disk_used += sample.disk_used;
        bucket.disk_total += sample.disk_total;
        bucket.net_in.add(sample.net_in);
        bucket.net_out.add(sample.net_out);
    }

    let points = buckets
        .into_iter()
        .map(|(timestamp, b)| HistoryPoint {
            timestamp,
            cpu: normalize_percentage(b.cpu / b.count, 1.0),
            memory_used: bytes(b.memory_used / b.count),
            memory_total: bytes(b.memory_total / b.count),
            disk_used: bytes(b.disk_used / b.count),
            disk_total: bytes(b.disk_total / b.count),
            net_in: b.net_in.get(),
            net_out: b.net_out.get(),
        })
        .collect();
    (points, skipped)
}

fn bytes(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
