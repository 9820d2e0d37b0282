//! Loader, stationarity, model search and forecast engine working together.

mod common;

use chrono::Duration;
use common::{trending_prices, write_csv};
use forecast_dialog::core::load_series;
use forecast_dialog::forecast::{historical_volatility, ForecastEngine, VOLATILITY_WINDOW};
use forecast_dialog::models::arima::{build_model, difference};
use forecast_dialog::models::Forecaster;
use forecast_dialog::validation::{adf_test, differencing_order, DEFAULT_SIGNIFICANCE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn random_walk_needs_differencing() {
    let values = trending_prices(400, 5);
    let d = differencing_order(&values).unwrap();
    assert!(d >= 1);

    let stationary = difference(&values, d);
    let adf = adf_test(&stationary, None).unwrap();
    assert!(adf.rejects_unit_root(DEFAULT_SIGNIFICANCE), "p = {}", adf.p_value);
}

#[test]
fn white_noise_is_stationary() {
    let mut rng = StdRng::seed_from_u64(8);
    let values: Vec<f64> = (0..300).map(|_| 10.0 + rng.gen_range(-1.0..1.0)).collect();
    assert_eq!(differencing_order(&values).unwrap(), 0);
}

#[test]
fn loaded_csv_forecasts_contiguous_days() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "prices.csv", "Price", &trending_prices(250, 2));
    let series = load_series(&path, "Price").unwrap();
    assert_eq!(series.len(), 250);

    let (model, d) = build_model(&series).unwrap();
    assert_eq!(model.differencing_order(), Some(d));

    let result = ForecastEngine::with_seed(4).forecast(&model, &series, 45).unwrap();
    let last = series.last_date().unwrap();
    assert_eq!(result.horizon(), 45);
    assert_eq!(result.points[0].date, last + Duration::days(1));
    assert!(result.dates().windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
    assert!(result.points.iter().all(|p| p.lower <= p.upper));

    assert_eq!(result.history.len(), series.len());
    assert_eq!(result.history.last().unwrap().date, last);
}

#[test]
fn model_selection_is_idempotent() {
    let values = trending_prices(300, 9);
    let start = common::start_date();
    let series = forecast_dialog::core::Series::daily("Price", start, values.clone()).unwrap();

    assert_eq!(differencing_order(&values).unwrap(), differencing_order(&values).unwrap());
    let (first, d1) = build_model(&series).unwrap();
    let (second, d2) = build_model(&series).unwrap();
    assert_eq!(d1, d2);
    assert_eq!(first.selected_order(), second.selected_order());
    assert_eq!(first.predict(5).unwrap().point, second.predict(5).unwrap().point);
}

#[test]
fn noise_is_centred_and_scaled_by_volatility() {
    let values = trending_prices(200, 13);
    let series =
        forecast_dialog::core::Series::daily("Price", common::start_date(), values.clone())
            .unwrap();
    let (model, _) = build_model(&series).unwrap();
    let volatility = historical_volatility(&values, VOLATILITY_WINDOW);
    assert!(volatility > 0.0);

    let mut shocks = Vec::new();
    for seed in 0..100 {
        let result = ForecastEngine::with_seed(seed).forecast(&model, &series, 20).unwrap();
        assert_eq!(result.volatility, volatility);
        shocks.extend(result.points.iter().map(|p| (p.value - p.point) / p.point));
    }

    let n = shocks.len() as f64;
    let mean = shocks.iter().sum::<f64>() / n;
    let sd = (shocks.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();

    assert!(mean.abs() < 4.0 * volatility / n.sqrt(), "mean shock {mean}");
    assert!((sd / volatility - 1.0).abs() < 0.15, "sd {sd} vs volatility {volatility}");
}
