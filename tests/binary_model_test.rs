// ==========================================
// BinaryModel + 外推模型集成测试
// ==========================================
// 测试目标: 经参数库读取元素参数后的二元生成焓与外推系数
// ==========================================

mod test_helpers;

use miedema_melts::engine::{BinaryModel, ExtrapolationModel, ModelSettings};
use miedema_melts::repository::{ElementRepository, ElementSource};
use miedema_melts::PhaseState;
use std::sync::Arc;
use test_helpers::create_test_db;

const T: f64 = 1873.0;

fn model(db_path: &str, settings: ModelSettings) -> BinaryModel {
    BinaryModel::new(Arc::new(ElementRepository::new(db_path)), settings)
}

#[test]
fn test_binary_model_is_finite_and_deterministic() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let m = model(&db_path, ModelSettings::default());
    let fe = m.element("Fe");
    let si = m.element("Si");
    assert!(fe.exists && si.exists);

    for x in [0.1, 0.25, 0.5, 0.75, 0.9] {
        let h1 = m.binary_model(&fe, &si, x, 1.0 - x, T, PhaseState::Liquid);
        let h2 = m.binary_model(&fe, &si, x, 1.0 - x, T, PhaseState::Liquid);
        assert!(h1.is_finite(), "ΔH(Fe-Si, x={}) 应为有限值", x);
        assert_eq!(h1.to_bits(), h2.to_bits());
        assert!(h1 < 0.0, "Fe-Si 为放热体系");
    }
}

#[test]
fn test_binary_model_self_pair_is_zero() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let m = model(&db_path, ModelSettings::default());
    let fe = m.element("Fe");
    assert_eq!(m.binary_model(&fe, &fe, 0.5, 0.5, T, PhaseState::Liquid), 0.0);
}

#[test]
fn test_missing_element_propagates_nan() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let m = model(&db_path, ModelSettings::default());
    let fe = m.element("Fe");
    let unknown = m.element("Xx");
    assert!(!unknown.exists);
    assert!(m.binary_model(&fe, &unknown, 0.5, 0.5, T, PhaseState::Liquid).is_nan());
    assert!(m
        .contribution(ExtrapolationModel::Uem1, "Xx", "Fe", "C", T, PhaseState::Liquid)
        .is_nan());
}

#[test]
fn test_unreachable_database_degrades_to_missing() {
    let repo = ElementRepository::new("/nonexistent/dir/params.db");
    let fe = repo.element("Fe");
    assert!(!fe.exists);
    assert!(fe.molar_volume().is_nan());
}

#[test]
fn test_asymmetry_lambda_changes_enthalpy() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let solid_solution = model(&db_path, ModelSettings::default());
    let amorphous = model(
        &db_path,
        ModelSettings {
            lambda: 5.0,
            ..ModelSettings::default()
        },
    );
    let fe = solid_solution.element("Fe");
    let si = solid_solution.element("Si");

    let h0 = solid_solution.binary_model(&fe, &si, 0.5, 0.5, T, PhaseState::Solid);
    let h5 = amorphous.binary_model(&fe, &si, 0.5, 0.5, T, PhaseState::Solid);
    // 同号放大
    assert!(h5.abs() > h0.abs());
    assert_eq!(h5.signum(), h0.signum());
}

#[test]
fn test_all_models_give_bounded_contributions() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let m = model(&db_path, ModelSettings::default());

    for model in ExtrapolationModel::ALL {
        for (k, i, j) in [("Fe", "C", "Si"), ("Si", "C", "Fe"), ("C", "Fe", "Mn")] {
            let r = m.contribution(model, k, i, j, T, PhaseState::Liquid);
            assert!(r.is_finite(), "{} r({},{},{}) 应为有限值", model, k, i, j);
            assert!((0.0..=1.0).contains(&r), "{} r({},{},{}) = {}", model, k, i, j, r);
        }
    }
}

#[test]
fn test_symmetric_and_toop_values() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let m = model(&db_path, ModelSettings::default());

    assert_eq!(
        m.contribution(ExtrapolationModel::Muggianu, "Fe", "C", "Si", T, PhaseState::Liquid),
        0.5
    );
    for model in [ExtrapolationModel::ToopMuggianu, ExtrapolationModel::ToopKohler] {
        let r = m.contribution(model, "Fe", "C", "Si", T, PhaseState::Liquid);
        assert!(r == 0.0 || r == 0.5 || r == 1.0, "{} = {}", model, r);
    }

    // Fe-Cr、Fe-Ni、Cr-Ni 同为负生成焓：Toop-Kohler 中 k 不参与
    assert_eq!(
        m.contribution(ExtrapolationModel::ToopKohler, "Cr", "Fe", "Ni", T, PhaseState::Liquid),
        0.0
    );

    // Fe-Al 为正、C-Fe/C-Al 为负：k = C 为非对称组元，两种 Toop 变体分开
    for (i, j) in [("Fe", "Al"), ("Al", "Fe")] {
        assert_eq!(m.contribution(ExtrapolationModel::ToopKohler, "C", i, j, T, PhaseState::Liquid), 0.0);
        assert_eq!(m.contribution(ExtrapolationModel::ToopMuggianu, "C", i, j, T, PhaseState::Liquid), 0.5);
    }
}

#[test]
fn test_uem2_converges_with_panel_doubling() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let coarse = model(&db_path, ModelSettings::default());
    let mut fine_settings = ModelSettings::default();
    fine_settings.quadrature.panels *= 2;
    let fine = model(&db_path, fine_settings);

    let a = coarse.contribution(ExtrapolationModel::Uem2, "Fe", "C", "Si", T, PhaseState::Liquid);
    let b = fine.contribution(ExtrapolationModel::Uem2, "Fe", "C", "Si", T, PhaseState::Liquid);
    assert!(a.is_finite() && b.is_finite());
    assert!((a - b).abs() < 1e-9, "coarse={} fine={}", a, b);
}
