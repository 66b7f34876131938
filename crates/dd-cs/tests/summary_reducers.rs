use dd_core::{DdError, ParameterDraws, PosteriorDraws};
use dd_cs::summary::{estimate_mode, mean, median, silverman_bandwidth, summarize, Reducer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn normal_draws(seed: u64, centre: f64, n: usize) -> Vec<f64> {
    let normal = Normal::new(centre, 0.2).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

#[test]
fn mean_and_median_on_small_sets() {
    assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
    assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
}

#[test]
fn mode_finds_peak_of_skewed_sample() {
    let mut values = vec![1.0; 50];
    values.extend([2.0, 3.0, 4.0, 8.0, 9.0]);
    let mode = estimate_mode(&values);
    assert!((mode - 1.0).abs() < 0.3, "mode {mode}");
    assert!(mean(&values) > mode);
}

#[test]
fn reducers_agree_on_symmetric_unimodal_draws() {
    let values = normal_draws(17, 0.4, 4000);
    let by_mean = Reducer::Mean.reduce(&values).unwrap();
    let by_median = Reducer::Median.reduce(&values).unwrap();
    let by_mode = Reducer::Mode.reduce(&values).unwrap();
    assert!((by_mean - 0.4).abs() < 0.02);
    assert!((by_mean - by_median).abs() < 0.03, "{by_mean} vs {by_median}");
    assert!((by_mean - by_mode).abs() < 0.1, "{by_mean} vs {by_mode}");
}

#[test]
fn reducers_are_deterministic() {
    let values = normal_draws(5, 1.0, 500);
    for reducer in [Reducer::Mean, Reducer::Median, Reducer::Mode] {
        let a = reducer.reduce(&values).unwrap();
        let b = reducer.reduce(&values).unwrap();
        assert_eq!(a.to_bits(), b.to_bits(), "{reducer}");
    }
}

#[test]
fn empty_draws_are_a_data_error() {
    let err = Reducer::Median.reduce(&[]).unwrap_err();
    assert!(matches!(err, DdError::Data(_)));
}

#[test]
fn bandwidth_falls_back_for_constant_samples() {
    let bw = silverman_bandwidth(&[2.0, 2.0, 2.0, 2.0]);
    assert!(bw > 0.0);
    assert!((estimate_mode(&[2.0, 2.0, 2.0]) - 2.0).abs() < 0.02);
}

fn posterior_for(subjects: usize) -> PosteriorDraws {
    let mut draws = PosteriorDraws::new();
    for (offset, name) in ["r", "s", "beta", "logR"].iter().enumerate() {
        let mut parameter = ParameterDraws::new(subjects);
        for draw in 0..20 {
            let row = (0..subjects)
                .map(|subject| (offset * 10 + subject) as f64 + draw as f64 * 0.01)
                .collect();
            parameter.push(draw % 2, row).unwrap();
        }
        draws.insert(*name, parameter);
    }
    draws
}

#[test]
fn summary_has_one_row_per_subject_in_order() {
    let subjects = vec!["s1".to_string(), "s2".to_string(), "s3".to_string()];
    let rows = summarize(&posterior_for(3), &subjects, Reducer::Median).unwrap();

    assert_eq!(rows.len(), 3);
    let ids: Vec<&str> = rows.iter().map(|row| row.subject.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);
    assert!((rows[1].r - 1.095).abs() < 1e-9);
    assert!((rows[2].s - 12.095).abs() < 1e-9);
    assert!((rows[0].beta - 20.095).abs() < 1e-9);
    assert!((rows[0].log_r - 30.095).abs() < 1e-9);
}

#[test]
fn width_mismatch_is_a_sampler_error() {
    let subjects = vec!["only".to_string()];
    let err = summarize(&posterior_for(2), &subjects, Reducer::Mean).unwrap_err();
    assert!(matches!(err, DdError::Sampler(_)));
    assert_eq!(err.info().code, "parameter-width");
}

#[test]
fn missing_or_empty_parameters_fail() {
    let mut draws = posterior_for(1);
    draws.insert("logR", ParameterDraws::new(1));
    let subjects = vec!["x".to_string()];
    let err = summarize(&draws, &subjects, Reducer::Mean).unwrap_err();
    assert!(matches!(err, DdError::Data(_)));

    let mut partial = PosteriorDraws::new();
    partial.insert("r", ParameterDraws::new(1));
    let err = summarize(&partial, &subjects, Reducer::Mean).unwrap_err();
    assert_eq!(err.info().code, "missing-parameter");
}

#[test]
fn reducer_parses_from_names() {
    assert_eq!("mode".parse::<Reducer>().unwrap(), Reducer::Mode);
    assert!("average".parse::<Reducer>().is_err());
    assert_eq!(Reducer::default(), Reducer::Mean);
}
