// ==========================================
// ActivityApi / ParameterApi 集成测试
// ==========================================
// 测试目标: 从参数库到 API 响应的完整链路
// ==========================================

mod test_helpers;

use miedema_melts::api::{ActivityApi, ActivityRequest, ApiError, InteractionMatrixRequest, ParameterApi};
use miedema_melts::engine::{ClosureModel, ExtrapolationModel};
use miedema_melts::CalculationSettings;
use test_helpers::{assert_close, create_test_db};

const ALLOY: &str = "Fe0.70C0.03Si0.27";

#[test]
fn test_calculate_activity_with_defaults() {
    miedema_melts::logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = ActivityApi::open(&db_path).expect("Failed to open api");

    let response = api
        .calculate_activity(&ActivityRequest::new(ALLOY, "Fe", "C"))
        .expect("activity should be computed");

    assert_eq!(response.result.closure, ClosureModel::Wagner);
    assert_eq!(response.result.conditions.temperature, 1873.0);
    assert_eq!(response.result.conditions.model, ExtrapolationModel::Uem1);
    assert!(response.result.activity > 0.0 && response.result.activity < 1.0);
    assert_close(response.result.mole_fraction, 0.03, 1e-12);
    assert_close(response.result.activity, 0.332, 3e-3);
    assert!(response.warnings.is_empty());

    assert_eq!(response.contributions.len(), 1);
    assert_eq!(response.contributions[0].system, "Fe-C-Si");
}

#[test]
fn test_calculate_all_closures() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = ActivityApi::open(&db_path).unwrap();

    let responses = api
        .calculate_all_closures(&ActivityRequest::new(ALLOY, "Fe", "Si"))
        .unwrap();
    let closures: Vec<ClosureModel> = responses.iter().map(|r| r.result.closure).collect();
    assert_eq!(closures, ClosureModel::ALL.to_vec());
    assert!(responses.iter().all(|r| r.result.ln_gamma.is_finite()));
}

#[test]
fn test_invalid_requests() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = ActivityApi::open(&db_path).unwrap();

    let empty_solvent = ActivityRequest::new(ALLOY, " ", "C");
    assert!(matches!(
        api.calculate_activity(&empty_solvent),
        Err(ApiError::InvalidInput(_))
    ));

    let same = ActivityRequest::new(ALLOY, "Fe", "Fe");
    assert!(matches!(api.calculate_activity(&same), Err(ApiError::InvalidInput(_))));

    let mut cold = ActivityRequest::new(ALLOY, "Fe", "C");
    cold.temperature = Some(-10.0);
    assert!(matches!(api.calculate_activity(&cold), Err(ApiError::InvalidInput(_))));

    let bad_alloy = ActivityRequest::new("fe0.5", "Fe", "C");
    assert!(matches!(api.calculate_activity(&bad_alloy), Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_entropy_warning_for_nitrogen_alloy() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let params = ParameterApi::open(&db_path).unwrap();
    params
        .update_settings(&CalculationSettings {
            entropy_enabled: true,
            ..CalculationSettings::default()
        })
        .unwrap();

    let api = ActivityApi::open(&db_path).unwrap();
    let with_n = api
        .calculate_activity(&ActivityRequest::new("Fe0.98C0.01N0.01", "Fe", "C"))
        .unwrap();
    assert_eq!(with_n.warnings.len(), 1);
    assert!(with_n.warnings[0].contains("不适用过剩熵修正"));

    let without_n = api.calculate_activity(&ActivityRequest::new(ALLOY, "Fe", "C")).unwrap();
    assert!(without_n.warnings.is_empty());
}

#[test]
fn test_interaction_matrix() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = ActivityApi::open(&db_path).unwrap();

    let response = api
        .interaction_matrix(&InteractionMatrixRequest {
            composition: ALLOY.to_string(),
            solvent: "Fe".to_string(),
            temperature: None,
            state: None,
            model: Some(ExtrapolationModel::Gsm),
        })
        .unwrap();

    assert_eq!(response.conditions.model, ExtrapolationModel::Gsm);
    let keys: Vec<&str> = response.matrix.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["C", "Si"]);
    assert!(response.matrix["C"]["Si"].is_finite());
}

#[test]
fn test_compare_first_order_with_experiment() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = ActivityApi::open(&db_path).unwrap();

    let row = api.compare_first_order("Fe", "C", "Si", None, None).unwrap();
    assert_eq!(row.temperature, 1873.0);
    assert_eq!(row.experimental, 9.75);
    assert_eq!(row.computed.len(), ExtrapolationModel::ALL.len());
    assert!(row.computed.iter().all(|(_, value)| value.is_finite()));

    assert!(matches!(
        api.compare_first_order("Fe", "Fe", "Si", None, None),
        Err(ApiError::InvalidInput(_))
    ));

    let rows = api.compare_with_experiment("Fe", None).unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r.solvent == "Fe"));
    assert!(rows.iter().any(|r| r.solute_i == "C" && r.solute_j == "Si"));
}

#[test]
fn test_parameter_api_settings_validation_and_snapshot() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = ParameterApi::open(&db_path).unwrap();

    let bad = CalculationSettings {
        default_temperature: 0.0,
        ..CalculationSettings::default()
    };
    assert!(matches!(api.update_settings(&bad), Err(ApiError::ValidationError(_))));

    let negative_lambda = CalculationSettings {
        asymmetry_lambda: -1.0,
        ..CalculationSettings::default()
    };
    assert!(matches!(
        api.update_settings(&negative_lambda),
        Err(ApiError::ValidationError(_))
    ));

    let custom = CalculationSettings {
        asymmetry_lambda: 5.0,
        default_temperature: 1823.0,
        ..CalculationSettings::default()
    };
    api.update_settings(&custom).unwrap();
    assert_eq!(api.get_settings().unwrap(), custom);

    let snapshot = api.get_config_snapshot().unwrap();
    api.update_settings(&CalculationSettings::default()).unwrap();
    api.restore_config_snapshot(&snapshot).unwrap();
    assert_eq!(api.get_settings().unwrap(), custom);
}
