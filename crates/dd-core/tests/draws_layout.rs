use dd_core::{DdError, InitValue, InitValues, ParameterDraws, PosteriorDraws, SamplerSettings};

#[test]
fn element_pools_chains_in_order() {
    let mut draws = ParameterDraws::new(2);
    draws.push(0, vec![1.0, 10.0]).unwrap();
    draws.push(0, vec![2.0, 20.0]).unwrap();
    draws.push(1, vec![3.0, 30.0]).unwrap();

    assert_eq!(draws.draw_count(), 3);
    assert_eq!(draws.element(0), vec![1.0, 2.0, 3.0]);
    assert_eq!(draws.element(1), vec![10.0, 20.0, 30.0]);
    assert_eq!(draws.element_by_chain(1), vec![vec![10.0, 20.0], vec![30.0]]);
}

#[test]
fn push_rejects_wrong_width() {
    let mut draws = ParameterDraws::new(3);
    let err = draws.push(0, vec![1.0]).unwrap_err();
    assert!(matches!(err, DdError::Sampler(_)));
    assert_eq!(err.info().code, "draw-width");
}

#[test]
fn entry_creates_parameter_once() {
    let mut posterior = PosteriorDraws::new();
    posterior.entry("mu_r", 1).push(0, vec![0.3]).unwrap();
    posterior.entry("mu_r", 1).push(0, vec![0.4]).unwrap();
    assert_eq!(posterior.get("mu_r").unwrap().element(0), vec![0.3, 0.4]);
    assert_eq!(posterior.names().collect::<Vec<_>>(), vec!["mu_r"]);
}

#[test]
fn kept_draws_accounts_for_warmup_and_thinning() {
    let settings = SamplerSettings {
        iterations: 3000,
        warmup: 1000,
        chains: 2,
        thin: 3,
        cores: 1,
        adapt_delta: 0.95,
        stepsize: 1.0,
        max_treedepth: 10,
        seed: 1,
        parameters: vec!["r".into()],
        inits: None,
    };
    assert_eq!(settings.kept_draws_per_chain(), 667);
}

#[test]
fn init_values_serialize_as_flat_map() {
    let inits = InitValues::default()
        .with("mu_p", InitValue::Vector(vec![0.0, 0.5, 1.0]))
        .with("sigma", InitValue::Vector(vec![1.0, 1.0, 1.0]));
    let json = serde_json::to_value(&inits).unwrap();
    assert_eq!(json["mu_p"][1], 0.5);
    assert_eq!(json["sigma"].as_array().unwrap().len(), 3);
}
