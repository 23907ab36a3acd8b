//! CTC prefix search example.
//!
//! Drives a `BeamTree` with a toy prefix beam search over random frames.
//! The scoring here is deliberately simple (no blank/non-blank split, no
//! language model); it only shows how a decoder extends, merges and prunes
//! beams against the tree.
//!
//! Run with `RUST_LOG=beamtree=trace` to watch slots being reclaimed.

use anyhow::Result;
use beamtree::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Toy vocabulary; index 0 is the CTC blank.
const VOCAB: &[&str] = &["_", "c", "a", "t", "s", " "];

/// Transcript the mock acoustic model leans toward.
const SCRIPT: &[usize] = &[1, 2, 3, 5, 1, 2, 3, 4];

const BLANK: usize = 0;
const BEAM_WIDTH: usize = 4;
const FRAMES_PER_SYMBOL: usize = 3;

/// Per-prefix decoder state stored in the tree.
#[derive(Debug, Default, Clone, Copy)]
struct PrefixScore {
    log_prob: f32,
}

/// Simulates per-frame log probabilities from an acoustic model.
fn mock_frames(rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut frames = Vec::new();

    for &symbol in SCRIPT {
        for offset in 0..FRAMES_PER_SYMBOL {
            let mut logits: Vec<f32> = (0..VOCAB.len()).map(|_| rng.gen_range(-1.0..1.0)).collect();
            // Symbol on the first frame, blanks after it.
            let target = if offset == 0 { symbol } else { BLANK };
            logits[target] += 3.0;
            frames.push(log_softmax(&logits));
        }
    }

    frames
}

fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f32 = logits.iter().map(|&x| (x - max).exp()).sum();
    let log_z = max + sum.ln();
    logits.iter().map(|&x| x - log_z).collect()
}

/// log(exp(a) + exp(b)) without overflow.
fn log_add(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY {
        return b;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

/// Add a candidate score, merging with an existing candidate for the same node.
fn push_or_merge(candidates: &mut Vec<(NodeIndex, f32)>, index: NodeIndex, log_prob: f32) {
    match candidates.iter_mut().find(|(i, _)| *i == index) {
        Some((_, existing)) => *existing = log_add(*existing, log_prob),
        None => candidates.push((index, log_prob)),
    }
}

fn decode(labels: &[Label]) -> String {
    labels
        .iter()
        .filter_map(|&l| VOCAB.get(l as usize).copied())
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = StdRng::seed_from_u64(7);
    let frames = mock_frames(&mut rng);

    let config = TreeConfig {
        capacity: 512,
        detached_reserve: frames.len(),
    };
    let mut tree: BeamTree<PrefixScore> = BeamTree::with_config(config)?;
    let root = tree.reset(PrefixScore { log_prob: 0.0 });

    println!("=== CTC Prefix Search Demo ===\n");
    println!("Frames: {}", frames.len());
    println!("Beam width: {}", BEAM_WIDTH);
    println!("Ring capacity: {}\n", tree.capacity());

    let mut beams = vec![root];
    let mut candidates: Vec<(NodeIndex, f32)> = Vec::new();
    let mut labels = Vec::new();

    for (t, frame) in frames.iter().enumerate() {
        candidates.clear();

        for &beam in &beams {
            let base = tree.entry(beam).map_or(f32::NEG_INFINITY, |e| e.log_prob);

            // Blank keeps the prefix unchanged.
            push_or_merge(&mut candidates, beam, base + frame[BLANK]);

            for label in 1..VOCAB.len() {
                match tree.get_child(beam, label as Label) {
                    Ok(child) => push_or_merge(&mut candidates, child.index, base + frame[label]),
                    Err(err) if err.is_recoverable() => {
                        warn!(frame = t, %beam, "no room to extend beam: {err}");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        let keep = candidates.len().min(BEAM_WIDTH);

        beams.clear();
        for &(index, log_prob) in &candidates[..keep] {
            if let Some(entry) = tree.entry_mut(index) {
                entry.log_prob = log_prob;
            }
            beams.push(index);
        }
        for &(index, _) in &candidates[keep..] {
            tree.delete_entry(index)?;
        }

        info!(
            frame = t,
            size = tree.size(),
            detached = tree.detached_len(),
            beams = beams.len(),
            "pruned to beam width"
        );
    }

    println!("=== Final Beams ===\n");
    for (rank, &beam) in beams.iter().enumerate() {
        tree.backtrace_labels_into(beam, &mut labels)?;
        let score = tree.entry(beam).map_or(f32::NEG_INFINITY, |e| e.log_prob);
        println!("  {}: \"{}\" (log prob: {:.3})", rank + 1, decode(&labels), score);
    }

    let stats = tree.stats();
    println!("\nResident nodes: {} / {}", stats.size, stats.capacity);
    println!("Detached prefix length: {}", stats.detached);

    Ok(())
}
