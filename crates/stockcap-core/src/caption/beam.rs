//! Beam search over an autoregressive decoder.
//!
//! The search is independent of ONNX: callers supply a step function that
//! maps the current batch of token sequences to next-token logits, so the
//! ranking logic can be exercised without a model.

use crate::error::PipelineResult;

/// Beam search parameters.
#[derive(Debug, Clone)]
pub struct BeamSearch {
    pub num_beams: usize,
    pub max_length: usize,
    pub length_penalty: f32,
    pub bos_token_id: i64,
    pub eos_token_id: i64,
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<i64>,
    log_prob: f32,
}

#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<i64>,
    score: f32,
}

impl BeamSearch {
    /// Length-penalized score. `generated` counts decoded tokens only:
    /// neither the BOS prompt nor a closing EOS.
    fn normalized(&self, log_prob: f32, generated: usize) -> f32 {
        log_prob / (generated.max(1) as f32).powf(self.length_penalty)
    }

    /// Run the search and return the best token sequence (BOS included,
    /// EOS included when the hypothesis terminated).
    ///
    /// `step` receives every running sequence (all the same length) and must
    /// return one logits row per sequence for the next position.
    pub fn run<F>(&self, mut step: F) -> PipelineResult<Vec<i64>>
    where
        F: FnMut(&[Vec<i64>]) -> PipelineResult<Vec<Vec<f32>>>,
    {
        let num_beams = self.num_beams.max(1);
        let candidates_per_step = 2 * num_beams;

        let mut beams = vec![Beam {
            tokens: vec![self.bos_token_id],
            log_prob: 0.0,
        }];
        let mut finished: Vec<Hypothesis> = Vec::new();

        while !beams.is_empty() && beams[0].tokens.len() < self.max_length {
            let sequences: Vec<Vec<i64>> = beams.iter().map(|b| b.tokens.clone()).collect();
            let logits = step(&sequences)?;

            let mut candidates: Vec<(usize, i64, f32)> = Vec::new();
            for (beam_idx, (beam, row)) in beams.iter().zip(logits.iter()).enumerate() {
                let log_probs = log_softmax(row);
                for token in top_k(&log_probs, candidates_per_step) {
                    candidates.push((beam_idx, token as i64, beam.log_prob + log_probs[token]));
                }
            }
            candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
            candidates.truncate(candidates_per_step);

            let mut next_beams = Vec::with_capacity(num_beams);
            for (rank, (beam_idx, token, log_prob)) in candidates.into_iter().enumerate() {
                let mut tokens = beams[beam_idx].tokens.clone();
                tokens.push(token);

                if token == self.eos_token_id {
                    // EOS only counts when it ranks among the top beams.
                    if rank < num_beams {
                        let score = self.normalized(log_prob, tokens.len().saturating_sub(2));
                        finished.push(Hypothesis { tokens, score });
                    }
                } else {
                    next_beams.push(Beam { tokens, log_prob });
                }

                if next_beams.len() == num_beams {
                    break;
                }
            }

            finished.sort_by(|a, b| b.score.total_cmp(&a.score));
            finished.truncate(num_beams);
            beams = next_beams;

            if finished.len() == num_beams {
                if let (Some(worst), Some(best_running)) = (finished.last(), beams.first()) {
                    let best_possible =
                        self.normalized(best_running.log_prob, best_running.tokens.len() - 1);
                    if worst.score >= best_possible {
                        break;
                    }
                } else {
                    break;
                }
            }
        }

        // Sequences cut off by max_length compete with the finished ones.
        for beam in beams {
            let score = self.normalized(beam.log_prob, beam.tokens.len().saturating_sub(1));
            finished.push(Hypothesis {
                tokens: beam.tokens,
                score,
            });
        }

        Ok(finished
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|h| h.tokens)
            .unwrap_or_else(|| vec![self.bos_token_id]))
    }
}

/// Numerically stable log-softmax.
pub(crate) fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f32 = logits.iter().map(|&x| (x - max).exp()).sum();
    let log_sum = sum.ln() + max;
    logits.iter().map(|&x| x - log_sum).collect()
}

/// Indices of the `k` largest values, best first.
fn top_k(values: &[f32], k: usize) -> Vec<usize> {
    let k = k.min(values.len());
    if k == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.select_nth_unstable_by(k - 1, |&a, &b| values[b].total_cmp(&values[a]));
    indices.truncate(k);
    indices.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOS: i64 = 0;
    const EOS: i64 = 1;

    fn search(num_beams: usize, max_length: usize) -> BeamSearch {
        BeamSearch {
            num_beams,
            max_length,
            length_penalty: 1.0,
            bos_token_id: BOS,
            eos_token_id: EOS,
        }
    }

    fn row(probs: &[f32]) -> Vec<f32> {
        probs.iter().map(|p| p.ln()).collect()
    }

    #[test]
    fn test_log_softmax_sums_to_one() {
        let lp = log_softmax(&[1.0, 2.0, 3.0, 1000.0]);
        let total: f32 = lp.iter().map(|x| x.exp()).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(lp.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_top_k_orders_best_first() {
        assert_eq!(top_k(&[0.1, 0.9, 0.5, 0.7], 3), vec![1, 3, 2]);
        assert_eq!(top_k(&[0.1, 0.2], 5), vec![1, 0]);
        assert!(top_k(&[], 3).is_empty());
    }

    #[test]
    fn test_greedy_follows_argmax_until_eos() {
        // vocab: 0=bos 1=eos 2="a" 3="dog"
        let result = search(1, 10)
            .run(|seqs| {
                Ok(seqs
                    .iter()
                    .map(|s| match s.len() {
                        1 => row(&[0.01, 0.01, 0.9, 0.08]),
                        2 => row(&[0.01, 0.01, 0.08, 0.9]),
                        _ => row(&[0.01, 0.9, 0.05, 0.04]),
                    })
                    .collect())
            })
            .unwrap();
        assert_eq!(result, vec![BOS, 2, 3, EOS]);
    }

    #[test]
    fn test_beam_recovers_sequence_greedy_misses() {
        // Greedy picks token 2 first (0.5) but every continuation is weak;
        // token 3 (0.4) leads to a near-certain EOS.
        let step = |seqs: &[Vec<i64>]| -> PipelineResult<Vec<Vec<f32>>> {
            Ok(seqs
                .iter()
                .map(|s| match s.as_slice() {
                    [_] => row(&[0.05, 0.05, 0.5, 0.4]),
                    [_, 2] => row(&[0.25, 0.25, 0.25, 0.25]),
                    [_, 3] => row(&[0.01, 0.97, 0.01, 0.01]),
                    _ => row(&[0.01, 0.97, 0.01, 0.01]),
                })
                .collect())
        };

        let greedy = search(1, 3).run(step).unwrap();
        assert_eq!(greedy[1], 2);

        let beam = search(3, 3).run(step).unwrap();
        assert_eq!(beam, vec![BOS, 3, EOS]);
    }

    #[test]
    fn test_length_normalization_ignores_bos_and_eos() {
        // vocab: 0=bos 1=eos 2 3 4 5
        // [2, EOS] has log-prob -1.00 over one generated token;
        // [3, 4, EOS] has log-prob -1.48 over two. Counting BOS and EOS
        // as well would rank the short caption first.
        let step = |seqs: &[Vec<i64>]| -> PipelineResult<Vec<Vec<f32>>> {
            Ok(seqs
                .iter()
                .map(|s| match s.as_slice() {
                    [_] => row(&[0.1, 0.02, 0.37, 0.23, 0.14, 0.14]),
                    [_, 2] | [_, 3, 4] => row(&[0.001, 0.995, 0.001, 0.001, 0.001, 0.001]),
                    [_, 3] => row(&[0.001, 0.001, 0.001, 0.001, 0.995, 0.001]),
                    _ => row(&[1.0 / 6.0; 6]),
                })
                .collect())
        };

        let best = search(2, 6).run(step).unwrap();
        assert_eq!(best, vec![BOS, 3, 4, EOS]);
    }

    #[test]
    fn test_max_length_cuts_generation() {
        let result = search(2, 4)
            .run(|seqs| Ok(seqs.iter().map(|_| row(&[0.01, 0.01, 0.97, 0.01])).collect()))
            .unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result[0], BOS);
        assert!(!result.contains(&EOS));
    }

    #[test]
    fn test_step_error_propagates() {
        let result = search(2, 5).run(|_| {
            Err(crate::error::PipelineError::Model {
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_step_batch_matches_running_beams() {
        let mut seen = Vec::new();
        search(3, 3)
            .run(|seqs| {
                seen.push(seqs.len());
                Ok(seqs.iter().map(|_| row(&[0.1, 0.1, 0.4, 0.4])).collect())
            })
            .unwrap();
        assert_eq!(seen[0], 1);
        assert!(seen[1..].iter().all(|&n| n <= 3));
    }
}
