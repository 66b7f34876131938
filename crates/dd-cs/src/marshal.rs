use dd_core::ModelData;
use indexmap::IndexMap;

use crate::data::{TrialRecord, TrialTable};

/// Groups trials by subject and lays them out as padded `N x T` arrays.
///
/// Subject rows follow first-appearance order, matching
/// [`TrialTable::subjects`]; trial order within a subject follows the file.
pub fn build_model_data(table: &TrialTable) -> ModelData {
    let mut by_subject: IndexMap<&str, Vec<&TrialRecord>> = IndexMap::new();
    for record in &table.records {
        by_subject
            .entry(record.subject.as_str())
            .or_default()
            .push(record);
    }

    let n_subjects = by_subject.len();
    let trials_per_subject: Vec<usize> = by_subject.values().map(Vec::len).collect();
    let max_trials = trials_per_subject.iter().copied().max().unwrap_or(0);

    let mut data = ModelData {
        n_subjects,
        max_trials,
        trials_per_subject,
        delay_later: vec![vec![0.0; max_trials]; n_subjects],
        amount_later: vec![vec![0.0; max_trials]; n_subjects],
        delay_sooner: vec![vec![0.0; max_trials]; n_subjects],
        amount_sooner: vec![vec![0.0; max_trials]; n_subjects],
        choice: vec![vec![0; max_trials]; n_subjects],
    };

    for (row, trials) in by_subject.values().enumerate() {
        for (col, trial) in trials.iter().enumerate() {
            data.delay_later[row][col] = trial.delay_later;
            data.amount_later[row][col] = trial.amount_later;
            data.delay_sooner[row][col] = trial.delay_sooner;
            data.amount_sooner[row][col] = trial.amount_sooner;
            data.choice[row][col] = trial.choice;
        }
    }
    data
}
