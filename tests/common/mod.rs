//! Input patterns shared by the integration tests.
//!
//! All generators are seeded, a failing pattern reproduces on every run.

#![allow(dead_code)]

use rand::prelude::*;
use zipf::ZipfDistribution;

const SEED: u64 = 0x5eed_1157;

fn rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

pub fn random(len: usize) -> Vec<i32> {
    let mut rng = rng();
    (0..len).map(|_| rng.gen()).collect()
}

pub fn random_u64(len: usize) -> Vec<u64> {
    let mut rng = rng();
    (0..len).map(|_| rng.gen()).collect()
}

/// Random values in `0..range`.
pub fn random_uniform(len: usize, range: i32) -> Vec<i32> {
    let mut rng = rng();
    (0..len).map(|_| rng.gen_range(0..range)).collect()
}

pub fn random_binary(len: usize) -> Vec<i32> {
    random_uniform(len, 2)
}

pub fn few_distinct(len: usize) -> Vec<i32> {
    random_uniform(len, 8)
}

pub fn all_equal(len: usize) -> Vec<i32> {
    vec![66; len]
}

pub fn ascending(len: usize) -> Vec<i32> {
    (0..len as i32).collect()
}

pub fn descending(len: usize) -> Vec<i32> {
    (0..len as i32).rev().collect()
}

/// Ascending with 10% of the elements replaced by random values.
pub fn ascending_noisy(len: usize) -> Vec<i32> {
    let mut rng = rng();
    let mut v = ascending(len);
    for _ in 0..len / 10 {
        let idx = rng.gen_range(0..len);
        v[idx] = rng.gen();
    }
    v
}

/// Ascending then descending, e.g. `[0, 1, 2, 3, 2, 1, 0]`.
pub fn pipe_organ(len: usize) -> Vec<i32> {
    let half = len / 2;
    (0..half as i32).chain((0..(len - half) as i32).rev()).collect()
}

/// Repeated ascending runs of random length.
pub fn saw_ascending(len: usize) -> Vec<i32> {
    let mut rng = rng();
    let mut v = Vec::with_capacity(len);
    while v.len() < len {
        let run = rng.gen_range(1..=len.max(16) / 8 + 1);
        v.extend((0..run as i32).take(len - v.len()));
    }
    v
}

/// Repeated descending runs of random length.
pub fn saw_descending(len: usize) -> Vec<i32> {
    let mut v = saw_ascending(len);
    v.iter_mut().for_each(|x| *x = -*x);
    v
}

/// Zipfian distribution, a few values make up most of the input.
pub fn random_zipf(len: usize) -> Vec<i32> {
    let mut rng = rng();
    let dist = ZipfDistribution::new(len.max(1), 1.0).unwrap();
    (0..len).map(|_| dist.sample(&mut rng) as i32).collect()
}
