// ==========================================
// TernaryMelts + ActivityCoefficientEngine 集成测试
// ==========================================
// 测试目标: 经参数库读取元素参数时的相互作用系数与活度
// 场景: Fe0.70C0.03Si0.27 @ 1873 K, 液态
// ==========================================

mod test_helpers;

use miedema_melts::engine::{
    ActivityCoefficientEngine, ActivityConditions, BinaryModel, CalcError, ClosureModel,
    CollectingReporter, ExtrapolationModel, MeltConditions, ModelSettings,
};
use miedema_melts::repository::ElementRepository;
use miedema_melts::PhaseState;
use std::sync::Arc;
use test_helpers::{assert_close, create_test_db};

const T: f64 = 1873.0;
const ALLOY: &str = "Fe0.70C0.03Si0.27";

fn engine(db_path: &str) -> ActivityCoefficientEngine {
    let binary = BinaryModel::new(Arc::new(ElementRepository::new(db_path)), ModelSettings::default());
    ActivityCoefficientEngine::new(Arc::new(binary))
}

fn cond(model: ExtrapolationModel) -> ActivityConditions {
    ActivityConditions::new(T, PhaseState::Liquid, model)
}

#[test]
fn test_fe_c_si_first_order_coefficients() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let melt = MeltConditions::new(T, PhaseState::Liquid, ExtrapolationModel::Uem1);

    let ln_y0_c = e.melts().ln_y0("Fe", "C", &melt);
    let eps_cc = e.melts().activity_interact_coefficient_1st("Fe", "C", "C", &melt);
    let eps_csi = e.melts().activity_interact_coefficient_1st("Fe", "C", "Si", &melt);
    let eps_sic = e.melts().activity_interact_coefficient_1st("Fe", "Si", "C", &melt);

    assert_close(ln_y0_c, -2.327, 1e-2);
    assert_close(eps_cc, 25.41, 1e-2);
    assert_close(eps_csi, 14.70, 1e-2);
    // ε_i^j = ε_j^i
    assert!((eps_csi - eps_sic).abs() < 1e-9);
}

#[test]
fn test_fe_c_si_wagner_activity_in_unit_interval() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let alloy = e.parse_composition(ALLOY).expect("Failed to parse composition");

    let expected = [
        (ExtrapolationModel::Uem1, 0.332),
        (ExtrapolationModel::Uem2, 0.329),
        (ExtrapolationModel::Gsm, 0.282),
        (ExtrapolationModel::Muggianu, 0.477),
        (ExtrapolationModel::ToopMuggianu, 0.536),
        (ExtrapolationModel::ToopKohler, 0.425),
    ];
    for (model, activity) in expected {
        let result = e
            .activity(ClosureModel::Wagner, &alloy, "Fe", "C", &cond(model))
            .expect("Wagner should succeed");

        assert!(result.ln_gamma.is_finite(), "{}", model);
        assert_close(result.mole_fraction, 0.03, 1e-12);
        assert!(result.activity > 0.0 && result.activity < 1.0, "{}: a_C = {}", model, result.activity);
        assert_close(result.activity, activity, 3e-3);
    }
}

#[test]
fn test_toop_kohler_differs_from_muggianu() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let alloy = e.parse_composition(ALLOY).expect("Failed to parse composition");

    let kohler = e.wagner(&alloy, "Fe", "C", &cond(ExtrapolationModel::ToopKohler)).unwrap();
    let muggianu = e.wagner(&alloy, "Fe", "C", &cond(ExtrapolationModel::Muggianu)).unwrap();
    assert!((kohler - muggianu).abs() > 0.05, "kohler={} muggianu={}", kohler, muggianu);
}

#[test]
fn test_every_model_and_closure_is_finite() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let alloy = e.parse_composition(ALLOY).expect("Failed to parse composition");

    for model in ExtrapolationModel::ALL {
        for closure in ClosureModel::ALL {
            let ln_gamma = e
                .ln_gamma(closure, &alloy, "Fe", "Si", &cond(model))
                .expect("calculation should succeed");
            assert!(ln_gamma.is_finite(), "{} / {} 结果非有限值", model, closure);
        }
    }
}

#[test]
fn test_closures_agree_at_infinite_dilution() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let alloy = e
        .parse_composition("Fe0.999998C0.000001Si0.000001")
        .expect("Failed to parse composition");
    let c = cond(ExtrapolationModel::Gsm);

    let w = e.wagner(&alloy, "Fe", "Si", &c).unwrap();
    let d = e.darken(&alloy, "Fe", "Si", &c).unwrap();
    let el = e.elliott(&alloy, "Fe", "Si", &c).unwrap();
    assert!((w - d).abs() < 1e-6);
    assert!((w - el).abs() < 1e-6);
}

#[test]
fn test_closures_identical_for_single_solute() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let alloy = e.parse_composition("Fe0.97C0.03").expect("Failed to parse composition");

    for model in ExtrapolationModel::ALL {
        let c = cond(model);
        let w = e.wagner(&alloy, "Fe", "C", &c).unwrap();
        let d = e.darken(&alloy, "Fe", "C", &c).unwrap();
        let el = e.elliott(&alloy, "Fe", "C", &c).unwrap();
        assert!(w.is_finite());
        assert_eq!(w, d, "{}", model);
        assert_eq!(w, el, "{}", model);
    }
}

#[test]
fn test_reporter_receives_ternary_contributions() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let reporter = CollectingReporter::new();
    let binary = BinaryModel::new(Arc::new(ElementRepository::new(&db_path)), ModelSettings::default());
    let e = ActivityCoefficientEngine::with_reporter(Arc::new(binary), reporter.clone());
    let alloy = e.parse_composition(ALLOY).unwrap();

    e.wagner(&alloy, "Fe", "C", &cond(ExtrapolationModel::Uem1)).unwrap();

    let reports = reporter.take();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].system, "Fe-C-Si");
    assert_eq!(reports[0].model, ExtrapolationModel::Uem1);
    let subsystems: Vec<&str> = reports[0].contributions.keys().map(String::as_str).collect();
    assert_eq!(subsystems, vec!["C-Fe", "C-Si", "Si-Fe"]);
    for values in reports[0].contributions.values() {
        assert!(values.values().all(|r| r.is_finite()));
    }
}

#[test]
fn test_binary_alloy_does_not_report() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let reporter = CollectingReporter::new();
    let binary = BinaryModel::new(Arc::new(ElementRepository::new(&db_path)), ModelSettings::default());
    let e = ActivityCoefficientEngine::with_reporter(Arc::new(binary), reporter.clone());
    let alloy = e.parse_composition("Fe0.99C0.01").unwrap();

    e.wagner(&alloy, "Fe", "C", &cond(ExtrapolationModel::Uem1)).unwrap();
    assert!(reporter.take().is_empty());
}

#[test]
fn test_validation_errors() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let alloy = e.parse_composition(ALLOY).unwrap();
    let c = cond(ExtrapolationModel::Uem1);

    assert!(matches!(e.wagner(&alloy, "Fe", "Fe", &c), Err(CalcError::SoluteIsSolvent(_))));
    assert!(matches!(e.wagner(&alloy, "Fe", "Mn", &c), Err(CalcError::MissingComponent { .. })));
    assert!(matches!(
        e.wagner(&alloy, "Fe", "C", &ActivityConditions::new(-1.0, PhaseState::Liquid, ExtrapolationModel::Uem1)),
        Err(CalcError::InvalidTemperature(_))
    ));
    assert!(matches!(e.parse_composition("Fe0.9C"), Ok(_)));
    assert!(matches!(e.parse_composition(""), Err(CalcError::Composition(_))));
}

#[test]
fn test_interaction_matrix_is_symmetric() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let e = engine(&db_path);
    let alloy = e.parse_composition("Fe0.95C0.02Si0.02Mn0.01").unwrap();

    let matrix = e
        .interaction_matrix(&alloy, "Fe", &cond(ExtrapolationModel::Uem1))
        .unwrap();
    assert_eq!(matrix.len(), 3);
    for (i, row) in &matrix {
        for (j, eps) in row {
            assert!(eps.is_finite());
            assert!((eps - matrix[j][i]).abs() < 1e-9, "ε_{}^{} 与 ε_{}^{} 不对称", i, j, j, i);
        }
    }
}
