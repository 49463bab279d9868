//! ADU (Adaptive Distributing Units) quantization: a competitive
//! learning loop where each unit moves toward nearby colors with an
//! adaptive learning rate, terminating after a fixed iteration count or on
//! convergence.

use super::support::weighted_colors;
use super::ReduceColors;
use crate::color::Color;
use crate::histogram::Histogram;

pub struct Adu;

impl ReduceColors for Adu {
    fn reduce_raw(&self, histogram: &Histogram, n: usize) -> Vec<Color> {
        reduce(histogram, n)
    }
}

const MAX_ITERATIONS: usize = 64;
const CONVERGENCE_EPSILON: f64 = 0.05;
const INITIAL_LEARNING_RATE: f64 = 0.3;

pub fn reduce(histogram: &Histogram, n: usize) -> Vec<Color> {
    let samples = weighted_colors(histogram);
    if samples.is_empty() || n == 0 {
        return Vec::new();
    }

    // Seed one unit per requested color, evenly spread across the most
    // frequent distinct samples so units start near real mass.
    let mut sorted = samples.clone();
    sorted.sort_by(|a, b| b.weight.cmp(&a.weight));
    let mut units: Vec<[f64; 3]> = (0..n)
        .map(|i| {
            let s = &sorted[i % sorted.len()];
            [s.color.r as f64, s.color.g as f64, s.color.b as f64]
        })
        .collect();

    for iteration in 0..MAX_ITERATIONS {
        let learning_rate = INITIAL_LEARNING_RATE * (1.0 - iteration as f64 / MAX_ITERATIONS as f64);
        let mut max_move = 0f64;

        for s in &samples {
            let p = [s.color.r as f64, s.color.g as f64, s.color.b as f64];
            let (winner, _) = units
                .iter()
                .enumerate()
                .map(|(i, u)| {
                    let d = (u[0] - p[0]).powi(2) + (u[1] - p[1]).powi(2) + (u[2] - p[2]).powi(2);
                    (i, d)
                })
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .unwrap();

            let weight_factor = (s.weight as f64).sqrt();
            let step = learning_rate * weight_factor.min(8.0) / 8.0;
            for c in 0..3 {
                let delta = (p[c] - units[winner][c]) * step;
                units[winner][c] += delta;
                max_move = max_move.max(delta.abs());
            }
        }

        if max_move < CONVERGENCE_EPSILON {
            break;
        }
    }

    units
        .into_iter()
        .map(|u| {
            Color::new(
                u[0].round().clamp(0.0, 255.0) as u8,
                u[1].round().clamp(0.0, 255.0) as u8,
                u[2].round().clamp(0.0, 255.0) as u8,
            )
        })
        .collect()
}
