//! Ranking of defined identifiers across a project.
//!
//! Every identifier defined in a file gets a base score that shrinks with
//! directory depth and with how crowded the file is. Identifiers are then
//! boosted logarithmically by their external call count: calls made from
//! files that do not score the callee themselves.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::extractor::FileScan;

/// Per-file token scores, ordered by path then token.
pub type TokenScores = BTreeMap<PathBuf, BTreeMap<String, f64>>;

/// Scoring parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreConfig {
    /// Multiplier applied once per directory level below the root.
    pub depth_decay: f64,
    /// Identifiers that never receive a score.
    pub ignore_tokens: Vec<String>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            depth_decay: 0.8,
            ignore_tokens: Vec::new(),
        }
    }
}

/// One scored identifier, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedToken {
    pub path: PathBuf,
    pub token: String,
    pub score: f64,
}

/// Computes [`TokenScores`] from scans.
#[derive(Debug, Clone, Default)]
pub struct TokenScorer {
    config: ScoreConfig,
}

impl TokenScorer {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    /// Score every known-language scan. Paths are reported relative to
    /// `root` when they lie under it.
    pub fn score<'a>(
        &self,
        root: &Path,
        scans: impl IntoIterator<Item = (&'a Path, &'a FileScan)>,
    ) -> TokenScores {
        let mut scores = TokenScores::new();
        let mut external_calls: HashMap<&str, usize> = HashMap::new();

        for (path, scan) in scans {
            if !scan.language.is_known() {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path);
            let base = self.base_score(relative, scan);

            let defined: HashSet<&str> = scan.symbols.iter().map(|s| s.name.as_str()).collect();
            let file_scores = scores.entry(relative.to_path_buf()).or_default();
            for name in &defined {
                if !self.is_ignored(name) {
                    file_scores.insert((*name).to_string(), base);
                }
            }

            // Calls to ignored local names still count as external
            for call in &scan.calls {
                if !file_scores.contains_key(call.callee.as_str()) {
                    *external_calls.entry(call.callee.as_str()).or_default() += 1;
                }
            }
        }

        for file_scores in scores.values_mut() {
            for (token, score) in file_scores.iter_mut() {
                let calls = external_calls.get(token.as_str()).copied().unwrap_or(0);
                *score *= 1.0 + (calls as f64).ln_1p();
            }
        }

        scores
    }

    fn base_score(&self, relative: &Path, scan: &FileScan) -> f64 {
        let depth = relative.parent().map_or(0, |dir| dir.components().count());
        let density = scan.line_count as f64 / (scan.symbols.len() + 1) as f64;
        self.config.depth_decay.powi(depth as i32) * density.sqrt()
    }

    fn is_ignored(&self, token: &str) -> bool {
        self.config.ignore_tokens.iter().any(|t| t == token)
    }
}

/// Flatten scores into a list ordered by descending score, then path and
/// token. At most `limit` entries are returned.
pub fn top_tokens(scores: &TokenScores, limit: usize) -> Vec<RankedToken> {
    let mut ranked: Vec<RankedToken> = scores
        .iter()
        .flat_map(|(path, tokens)| {
            tokens.iter().map(move |(token, score)| RankedToken {
                path: path.clone(),
                token: token.clone(),
                score: *score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.token.cmp(&b.token))
    });
    ranked.truncate(limit);
    ranked
}
