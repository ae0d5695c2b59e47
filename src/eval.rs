//! Offline evaluation: analogy accuracy and set-expansion mean average precision.
//!
//! Both harnesses only call the public query operations and aggregate what
//! comes back.

use crate::analogy::AnalogyEngine;
use crate::error::{CategoryError, Result};
use crate::expand::CategoryExpander;
use crate::store::RowStore;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;


/// Answers considered per analogy problem.
pub const ANALOGY_DEPTH: usize = 50;

/// Deepest position tracked by `AnalogyReport::correct_at_pos`.
pub const MAX_POSITION: usize = 25;

/// Seeds drawn per set-expansion trial.
pub const SEEDS_TO_USE: usize = 3;

/// Items of each expansion scored by default in a set-expansion trial.
pub const MAP_EXPANSION_SIZE: usize = 500;


pub fn clean_string(inp: &str) -> String {
    inp.to_lowercase().replace('_', " ")
}


/// A named group of four-part problems `A B C D`, read as A:B::C:D.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalogySet {
    pub name: String,
    pub problems: Vec<[String; 4]>,
}

impl AnalogySet {

    /// Syntactic groups are skipped, except for the nationality adjectives.
    pub fn is_skipped(&self) -> bool {
        self.name.starts_with("gram") && !self.name.starts_with("gram6")
    }
}

/// Reads problems grouped under `: name` header lines, in order of first appearance.
pub fn read_analogy_data(path: &Path) -> Result<Vec<AnalogySet>> {

    let f = File::open(path).map_err(|e| CategoryError::EvalData(format!("cannot open {}: {}", path.display(), e)))?;
    let mut sets: Vec<AnalogySet> = Vec::new();
    let mut set_index: HashMap<String, usize> = HashMap::new();
    let mut dataset_name = "NONE".to_string();

    for line in BufReader::new(f).lines() {
        let line = line?;
        if let Some(name) = line.strip_prefix(':') {
            dataset_name = name.trim().to_string();
            continue;
        }

        let parts: Vec<&str> = line.trim().split(' ').collect();
        if parts.len() != 4 {
            continue;
        }
        let problem = [clean_string(parts[0]), clean_string(parts[1]), clean_string(parts[2]), clean_string(parts[3])];

        let index = *set_index.entry(dataset_name.clone()).or_insert_with(|| {
            sets.push(AnalogySet { name: dataset_name.clone(), problems: Vec::new() });
            sets.len() - 1
        });
        sets[index].problems.push(problem);
    }

    Ok(sets)
}


#[derive(Clone, Debug, PartialEq)]
pub enum AnalogyOutcome {
    /// `position` counts the wrong answers ranked above the expected one.
    Solved { position: usize, intruders: Vec<String> },
    Failed,
}

/// A problem as posed, `lhs_1 : rhs_1 :: lhs_2 : rhs_2`, with its outcome.
#[derive(Clone, Debug)]
pub struct ProblemResult {
    pub lhs_1: String,
    pub rhs_1: String,
    pub lhs_2: String,
    pub rhs_2: String,
    pub outcome: AnalogyOutcome,
}

#[derive(Clone, Debug)]
pub struct AnalogyReport {
    pub name: String,
    pub results: Vec<ProblemResult>,
    /// `correct_at_pos[i]`: problems solved within the first `i` answers, `1..=MAX_POSITION`
    pub correct_at_pos: [usize; MAX_POSITION + 1],
}

impl AnalogyReport {

    pub fn accuracy(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.correct_at_pos[1] as f64 / self.results.len() as f64
    }
}

/// Solves `A:B::C:?` by asking for the B of C; `reverse` poses `B:A::D:?` instead.
pub fn solve_analogy<S: RowStore>(engine: &AnalogyEngine<S>,
    problem: &[String; 4],
    reverse: bool,
    squash: f64,
    semantic_n: usize) -> Result<ProblemResult> {

    let [a, b, c, d] = problem;
    let (lhs_1, rhs_1, lhs_2, rhs_2) = if reverse { (b, a, d, c) } else { (a, b, c, d) };

    let expansion = engine.analogy(rhs_1, lhs_2, squash, semantic_n)?;

    let mut outcome = AnalogyOutcome::Failed;
    let mut incorrect_seen: Vec<String> = Vec::new();
    for (item, _) in expansion.into_iter().take(ANALOGY_DEPTH) {
        if &item == rhs_2 {
            outcome = AnalogyOutcome::Solved { position: incorrect_seen.len(), intruders: incorrect_seen };
            break;
        }
        // the query terms themselves are not counted against the answer
        if &item != rhs_1 && &item != lhs_2 {
            incorrect_seen.push(item);
        }
    }

    Ok(ProblemResult {
        lhs_1: lhs_1.to_owned(),
        rhs_1: rhs_1.to_owned(),
        lhs_2: lhs_2.to_owned(),
        rhs_2: rhs_2.to_owned(),
        outcome,
    })
}

/// Evaluates a whole set; problems run in parallel, results keep the set's order.
pub fn evaluate_analogies<S: RowStore + Sync>(engine: &AnalogyEngine<S>,
    set: &AnalogySet,
    squash: f64,
    semantic_n: usize,
    reverse: bool) -> Result<AnalogyReport> {

    let results = set.problems
        .par_iter()
        .map(|problem| solve_analogy(engine, problem, reverse, squash, semantic_n))
        .collect::<Result<Vec<ProblemResult>>>()?;

    let mut correct_at_pos = [0usize; MAX_POSITION + 1];
    for result in &results {
        if let AnalogyOutcome::Solved { position, .. } = result.outcome {
            for count in correct_at_pos.iter_mut().skip(position + 1) {
                *count += 1;
            }
        }
    }

    let name = if reverse { format!("{} REVERSE", set.name) } else { set.name.clone() };
    Ok(AnalogyReport { name, results, correct_at_pos })
}


/// Synsets for set expansion, one comma separated synset per line.
#[derive(Clone, Debug)]
pub struct SynsetData {
    pub item_to_index: HashMap<String, usize>,
    /// the first member of every synset
    pub candidate_seeds: Vec<String>,
}

impl SynsetData {

    pub fn read(path: &Path) -> Result<SynsetData> {
        let f = File::open(path).map_err(|e| CategoryError::EvalData(format!("cannot open {}: {}", path.display(), e)))?;
        let lines = BufReader::new(f).lines().collect::<std::io::Result<Vec<String>>>()?;
        Ok(Self::from_lines(lines.iter().map(|line| line.as_str())))
    }

    pub fn from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> SynsetData {

        let mut item_to_index: HashMap<String, usize> = HashMap::new();
        let mut candidate_seeds: Vec<String> = Vec::new();

        let mut next_index = 1;
        for line in lines {
            let parts: Vec<&str> = line.split(',').map(|x| x.trim()).filter(|x| !x.is_empty()).collect();
            if parts.is_empty() {
                continue;
            }
            candidate_seeds.push(parts[0].to_string());
            for p in parts {
                item_to_index.insert(p.to_string(), next_index);
                item_to_index.insert(clean_string(p), next_index);
            }
            next_index += 1;
        }

        Self { item_to_index, candidate_seeds }
    }
}

/// An item outside every synset, ranked before all synsets were found.
#[derive(Clone, Debug, PartialEq)]
pub struct Intrusion {
    pub item: String,
    /// 1-based rank in the expansion
    pub position: usize,
    /// fraction of synsets still unseen when the intrusion was ranked
    pub badness: f64,
}

/// Mean precision of one expansion, taken at the first hit of each synset.
pub fn evaluate_one_list(item_to_index: &HashMap<String, usize>,
    expansion: &[String],
    synsets_to_seek: usize) -> Result<(f64, Vec<Intrusion>)> {

    if synsets_to_seek == 0 {
        return Err(CategoryError::EvalData("no synsets to seek".to_string()));
    }

    let mut seen_indices: HashSet<usize> = HashSet::new();
    let mut bad_entries_count = 0;
    let mut good_entries_count = 0;
    let mut score_sum = 0.0;
    let mut intrusions: Vec<Intrusion> = Vec::new();

    for (idx, item) in expansion.iter().enumerate() {
        match item_to_index.get(&clean_string(item)) {
            None => {
                bad_entries_count += 1;
                intrusions.push(Intrusion {
                    item: item.to_owned(),
                    position: idx + 1,
                    badness: (synsets_to_seek - seen_indices.len()) as f64 / synsets_to_seek as f64,
                });
            },
            Some(index) => {
                good_entries_count += 1;
                if seen_indices.insert(*index) {
                    score_sum += good_entries_count as f64 / (good_entries_count + bad_entries_count) as f64;
                    if seen_indices.len() == synsets_to_seek {
                        break;
                    }
                }
            }
        }
    }

    Ok((score_sum / synsets_to_seek as f64, intrusions))
}


#[derive(Clone, Debug)]
pub struct MapParams {
    pub iterations: usize,
    /// when positive, seeds are drawn from the first synsets only
    pub seeds_in_top_n: usize,
    /// when positive, stop each list after this many synsets
    pub map_n: usize,
    pub rho: f64,
    pub n: usize,
    pub expansion_size: usize,
}

#[derive(Clone, Debug)]
pub struct MapIteration {
    pub seeds: Vec<String>,
    pub score: f64,
    pub intrusions: Vec<Intrusion>,
}

#[derive(Clone, Debug)]
pub struct MapReport {
    pub iterations: Vec<MapIteration>,
    pub intrusions_by_badness: HashMap<String, f64>,
}

impl MapReport {

    pub fn map_score(&self) -> f64 {
        if self.iterations.is_empty() {
            return 0.0;
        }
        self.iterations.iter().map(|it| it.score).sum::<f64>() / self.iterations.len() as f64
    }

    /// Worst intruders first, badness averaged over iterations.
    pub fn top_intrusions(&self, k: usize) -> Vec<(String, f64)> {
        let runs = self.iterations.len().max(1) as f64;
        let mut ranked: Vec<(String, f64)> = self.intrusions_by_badness
            .iter()
            .map(|(item, badness)| (item.to_owned(), badness / runs))
            .collect();
        ranked.sort_by(|(key_a, a), (key_b, b)| b.total_cmp(a).then_with(|| key_a.cmp(key_b)));
        ranked.truncate(k);
        ranked
    }
}

pub fn evaluate_map<S: RowStore, R: Rng>(expander: &CategoryExpander<S>,
    data: &SynsetData,
    params: &MapParams,
    rng: &mut R) -> Result<MapReport> {

    let mut effective_seeds: &[String] = &data.candidate_seeds;
    if params.seeds_in_top_n > 0 {
        effective_seeds = &effective_seeds[..params.seeds_in_top_n.min(effective_seeds.len())];
    }
    if effective_seeds.len() < SEEDS_TO_USE {
        return Err(CategoryError::EvalData(format!(
            "need at least {} candidate seeds, found {}", SEEDS_TO_USE, effective_seeds.len())));
    }
    let synsets_to_seek = if params.map_n > 0 { params.map_n } else { effective_seeds.len() };

    let mut iterations: Vec<MapIteration> = Vec::with_capacity(params.iterations);
    let mut intrusions_by_badness: HashMap<String, f64> = HashMap::new();

    for _ in 0..params.iterations {

        let seeds: Vec<String> = effective_seeds.choose_multiple(rng, SEEDS_TO_USE).cloned().collect();
        let query: Vec<String> = seeds.iter().map(|s| clean_string(s)).collect();

        let expansion: Vec<String> = expander.expand(query.as_slice(), params.rho, params.n)?
            .into_iter()
            .take(params.expansion_size)
            .map(|(item, _)| item)
            .collect();

        let (score, intrusions) = evaluate_one_list(&data.item_to_index, &expansion, synsets_to_seek)?;
        for intrusion in &intrusions {
            *intrusions_by_badness.entry(intrusion.item.clone()).or_insert(0.0) += intrusion.badness;
        }
        iterations.push(MapIteration { seeds, score, intrusions });
    }

    Ok(MapReport { iterations, intrusions_by_badness })
}
