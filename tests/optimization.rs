//! End-to-end runs: construct an energy system, optimize it with the bundled
//! backends and check the values written back onto the entities.

use chrono::{TimeZone, Utc};
use open_energy_modeller::prelude::*;
use open_energy_modeller::scenario::Scenario;
use std::io::Write;

const TOL: f64 = 1e-4;

fn hourly(periods: usize) -> Simulation {
    Simulation::hourly(Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap(), periods).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < TOL, "expected {expected}, got {actual}");
}

fn single_bus(simulation: Simulation, demand: Vec<f64>) -> EnergySystem {
    let mut es = EnergySystem::new(simulation, Some(2012));
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    es.add_component(
        Component::source("pp_coal", vec![], vec!["b_el".into()], SourceParams::dispatchable(50.0, 20.0)).unwrap(),
    )
    .unwrap();
    es.add_component(Component::sink("demand", vec!["b_el".into()], vec![], SinkParams::demand(demand)).unwrap())
        .unwrap();
    es
}

#[test]
fn test_balance_only_dispatch_meets_demand() {
    let sim = hourly(3).with_objective_options(ObjectiveOptions::balance_only());
    let mut es = single_bus(sim, vec![10.0, 20.0, 30.0]);
    let summary = es.optimize().unwrap();
    assert_eq!(summary.timesteps, 3);
    assert_close(summary.objective, 0.0);

    let supply = &es.component("pp_coal").unwrap().results().outputs["b_el"];
    let demand = &es.component("demand").unwrap().results().inputs["b_el"];
    assert_eq!(supply.len(), 3);
    for (t, expected) in [10.0, 20.0, 30.0].into_iter().enumerate() {
        assert!(supply[t] <= 50.0 + TOL);
        assert_close(supply[t], demand[t]);
        assert_close(demand[t], expected);
    }
}

#[test]
fn test_simple_transformer_conversion() {
    let mut es = EnergySystem::new(hourly(2), None);
    es.add_bus(
        Bus::new(
            "b_gas",
            BusParams {
                commodity: "gas".into(),
                balanced: false,
                price: 10.0,
                ..Default::default()
            },
        )
        .unwrap(),
    )
    .unwrap();
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    es.add_component(
        Component::transformer(
            "pp_gas",
            vec!["b_gas".into()],
            vec!["b_el".into()],
            TransformerParams {
                out_max: vec![100.0],
                ..Default::default()
            },
            TechnologyParams::Simple(SimpleParams { eta: Some(0.9) }),
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(
        Component::sink("demand", vec!["b_el".into()], vec![], SinkParams::demand(vec![45.0, 90.0])).unwrap(),
    )
    .unwrap();

    let objective = es.optimize().unwrap().objective;
    let results = es.component("pp_gas").unwrap().results();
    for t in 0..2 {
        assert_close(results.outputs["b_el"][t], 0.9 * results.inputs["b_gas"][t]);
    }
    assert_close(results.inputs["b_gas"][0], 50.0);
    assert_close(objective, 10.0 * (50.0 + 100.0));
}

#[test]
fn test_repeated_builds_are_identical() {
    let mut first = single_bus(hourly(3), vec![10.0, 20.0, 30.0]);
    let mut second = single_bus(hourly(3), vec![10.0, 20.0, 30.0]);
    let lp_first = first.build_model().unwrap().model.to_lp_string();
    let lp_second = second.build_model().unwrap().model.to_lp_string();
    assert_eq!(lp_first, lp_second);

    let a = first.optimize().unwrap().objective;
    let b = second.optimize().unwrap().objective;
    assert_close(a, b);
    assert_close(a, 20.0 * 60.0);
}

#[test]
fn test_demand_above_capacity_is_infeasible() {
    let mut es = single_bus(hourly(2).with_solver("microlp"), vec![10.0, 60.0]);
    let err = es.optimize().unwrap_err();
    assert!(err.is_infeasible());
    assert!(err.is_retryable());
    assert_eq!(err.class(), ErrorClass::Infeasible);
    assert!(es.summary().is_none());
}

#[test]
fn test_shortage_makes_infeasible_demand_solvable() {
    let mut es = EnergySystem::new(hourly(1), None);
    es.add_bus(
        Bus::new(
            "b_el",
            BusParams {
                commodity: "electricity".into(),
                shortage: Some(1000.0),
                ..Default::default()
            },
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(
        Component::source("pp", vec![], vec!["b_el".into()], SourceParams::dispatchable(50.0, 20.0)).unwrap(),
    )
    .unwrap();
    es.add_component(Component::sink("demand", vec!["b_el".into()], vec![], SinkParams::demand(vec![60.0])).unwrap())
        .unwrap();

    let objective = es.optimize().unwrap().objective;
    assert_close(es.bus("b_el").unwrap().results().shortage.as_ref().unwrap()[0], 10.0);
    assert_close(objective, 50.0 * 20.0 + 10.0 * 1000.0);
}

#[test]
fn test_connected_buses_exchange_with_losses() {
    let mut es = EnergySystem::new(hourly(1), None);
    es.add_bus(Bus::commodity("b_north", "electricity").unwrap()).unwrap();
    es.add_bus(Bus::commodity("b_south", "electricity").unwrap()).unwrap();
    es.add_component(
        Component::source("wind", vec![], vec!["b_north".into()], SourceParams::dispatchable(100.0, 1.0)).unwrap(),
    )
    .unwrap();
    es.add_component(
        Component::sink("demand", vec!["b_south".into()], vec![], SinkParams::demand(vec![45.0])).unwrap(),
    )
    .unwrap();
    let uids = es.connect("b_north", "b_south", 100.0, 100.0, 0.9, TransportKind::Simple).unwrap();
    assert_eq!(uids, ["b_northb_south".to_string(), "b_southb_north".to_string()]);

    es.optimize().unwrap();
    // "b_southb_north" feeds b_south from b_north
    let southward = es.component("b_southb_north").unwrap().results();
    assert_close(southward.inputs["b_north"][0], 50.0);
    assert_close(southward.outputs["b_south"][0], 45.0);
    let northward = es.component("b_northb_south").unwrap();
    assert_eq!(northward.inputs(), ["b_south"]);
    assert_close(northward.results().outputs["b_north"][0], 0.0);
    assert_close(es.component("wind").unwrap().results().outputs["b_north"][0], 50.0);
}

#[test]
fn test_missing_sigma_names_the_attribute() {
    let err = Component::transformer(
        "chp",
        vec!["b_gas".into()],
        vec!["b_el".into(), "b_th".into()],
        TransformerParams {
            in_max: vec![100.0],
            ..Default::default()
        },
        TechnologyParams::SimpleExtractionChp(ExtractionChpParams {
            eta_el_cond: Some(0.45),
            beta: Some(0.15),
            sigma: None,
        }),
    )
    .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Structural);
    assert!(err.to_string().contains("\"sigma\""));
    assert!(err.to_string().contains("'chp'"));
}

#[test]
fn test_storage_defaults_and_cycle() {
    let mut es = EnergySystem::new(hourly(3), None);
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    let storage = Component::transformer(
        "battery",
        vec!["b_el".into()],
        vec!["b_el".into()],
        TransformerParams::default(),
        TechnologyParams::Storage(StorageParams {
            cap_max: Some(100.0),
            c_rate_in: Some(0.5),
            c_rate_out: Some(0.5),
            ..Default::default()
        }),
    )
    .unwrap();
    let resolved = storage.as_transformer().unwrap();
    assert_eq!(resolved.out_max(), [50.0]);
    assert_eq!(resolved.in_max(), [50.0]);
    assert_eq!(resolved.storage().unwrap().cap_initial, 50.0);
    es.add_component(storage).unwrap();
    es.add_component(
        Component::source("pp", vec![], vec!["b_el".into()], SourceParams::dispatchable(10.0, 5.0)).unwrap(),
    )
    .unwrap();
    es.add_component(
        Component::sink("demand", vec!["b_el".into()], vec![], SinkParams::demand(vec![60.0, 0.0, 0.0])).unwrap(),
    )
    .unwrap();

    es.optimize().unwrap();
    let soc = es.component("battery").unwrap().results().soc.clone().unwrap();
    assert_eq!(soc.len(), 3);
    assert!(soc.iter().all(|level| level.abs() < TOL));
    assert_close(es.component("battery").unwrap().results().outputs["b_el"][0], 50.0);
    assert_close(es.component("pp").unwrap().results().outputs["b_el"][0], 10.0);
}

#[cfg(feature = "clarabel")]
#[test]
fn test_balance_duals_reflect_marginal_cost() {
    let mut es = single_bus(hourly(2).with_duals(true), vec![10.0, 20.0]);
    es.optimize().unwrap();
    let duals = es.bus("b_el").unwrap().results().duals.clone().unwrap();
    assert_eq!(duals.len(), 2);
    for dual in duals {
        assert!((dual.abs() - 20.0).abs() < 1e-3, "dual {dual}");
    }
}

#[cfg(feature = "microlp")]
#[test]
fn test_milp_unit_commitment_switches_off_below_minimum() {
    let mut es = EnergySystem::new(hourly(2).with_solver("microlp"), None);
    es.add_bus(
        Bus::new(
            "b_gas",
            BusParams {
                commodity: "gas".into(),
                balanced: false,
                price: 10.0,
                ..Default::default()
            },
        )
        .unwrap(),
    )
    .unwrap();
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    es.add_component(
        Component::transformer(
            "pp_gas",
            vec!["b_gas".into()],
            vec!["b_el".into()],
            TransformerParams {
                out_max: vec![100.0],
                out_min: vec![40.0],
                ..Default::default()
            },
            TechnologyParams::Simple(SimpleParams { eta: Some(1.0) }),
        )
        .unwrap()
        .with_options(OptimizationOptions {
            milp: true,
            ..Default::default()
        }),
    )
    .unwrap();
    es.add_component(
        Component::source("backup", vec![], vec!["b_el".into()], SourceParams::dispatchable(100.0, 100.0)).unwrap(),
    )
    .unwrap();
    es.add_component(
        Component::sink("demand", vec!["b_el".into()], vec![], SinkParams::demand(vec![30.0, 60.0])).unwrap(),
    )
    .unwrap();

    let summary = es.optimize().unwrap();
    assert!(summary.milp);
    assert_close(summary.objective, 30.0 * 100.0 + 60.0 * 10.0);
    let results = es.component("pp_gas").unwrap().results();
    let status = results.status.as_ref().unwrap();
    assert_close(status[0], 0.0);
    assert_close(status[1], 1.0);
    assert_close(results.outputs["b_el"][1], 60.0);
}

#[test]
fn test_lp_backend_rejects_integer_model() {
    let mut es = EnergySystem::new(hourly(1).with_solver("clarabel"), None);
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    es.add_component(
        Component::transformer(
            "pp",
            vec!["b_el".into()],
            vec!["b_el".into()],
            TransformerParams {
                out_max: vec![10.0],
                ..Default::default()
            },
            TechnologyParams::Simple(SimpleParams { eta: Some(0.5) }),
        )
        .unwrap()
        .with_options(OptimizationOptions {
            milp: true,
            ..Default::default()
        }),
    )
    .unwrap();
    let err = es.optimize().unwrap_err();
    assert_eq!(err.class(), ErrorClass::Solver);
}

#[test]
fn test_scenario_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [simulation]
        start = "2012-01-01T00:00:00Z"
        periods = 2

        [[buses]]
        uid = "b_el"
        commodity = "electricity"

        [[components]]
        type = "source"
        uid = "pp"
        outputs = ["b_el"]
        params = {{ out_max = 50.0, costs = {{ opex_var = 3.0 }} }}

        [[components]]
        type = "sink"
        uid = "demand"
        inputs = ["b_el"]
        params = {{ val = [5.0, 15.0] }}
        "#
    )
    .unwrap();

    let mut es = Scenario::from_file(file.path()).unwrap().into_energy_system().unwrap();
    let objective = es.optimize().unwrap().objective;
    assert_close(objective, 3.0 * 20.0);
    assert_close(es.component("pp").unwrap().results().outputs["b_el"][1], 15.0);
}

fn gas_bus(price: f64) -> Bus {
    Bus::new(
        "b_gas",
        BusParams {
            commodity: "gas".into(),
            balanced: false,
            price,
            ..Default::default()
        },
    )
    .unwrap()
}

fn demand(uid: &str, bus: &str, val: Vec<f64>) -> Component {
    Component::sink(uid, vec![bus.into()], vec![], SinkParams::demand(val)).unwrap()
}

#[test]
fn test_demand_above_capacity_is_infeasible_on_default_solver() {
    let mut es = single_bus(hourly(2), vec![10.0, 60.0]);
    assert_eq!(es.simulation().solver(), "clarabel");
    let err = es.optimize().unwrap_err();
    assert!(err.is_infeasible());
    assert!(es.component("pp_coal").unwrap().results().outputs.is_empty());
}

#[test]
fn test_unbounded_revenue_is_a_solver_error() {
    let mut es = EnergySystem::new(hourly(1), None);
    es.add_bus(gas_bus(0.0)).unwrap();
    es.add_bus(
        Bus::new(
            "b_el",
            BusParams {
                commodity: "electricity".into(),
                excess: Some(0.0),
                ..Default::default()
            },
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(
        Component::transformer(
            "pp_gas",
            vec!["b_gas".into()],
            vec!["b_el".into()],
            TransformerParams {
                output_price: 10.0,
                ..Default::default()
            },
            TechnologyParams::Simple(SimpleParams { eta: Some(0.5) }),
        )
        .unwrap(),
    )
    .unwrap();

    let err = es.optimize().unwrap_err();
    assert_eq!(err.class(), ErrorClass::Solver);
    assert!(err.to_string().contains("unbounded"));
    assert!(es.summary().is_none());
    assert!(es.component("pp_gas").unwrap().results().outputs.is_empty());
}

#[test]
fn test_chp_splits_fuel_by_efficiency() {
    let mut es = EnergySystem::new(hourly(1), None);
    es.add_bus(gas_bus(1.0)).unwrap();
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    es.add_bus(
        Bus::new(
            "b_th",
            BusParams {
                commodity: "heat".into(),
                excess: Some(0.0),
                ..Default::default()
            },
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(
        Component::transformer(
            "chp",
            vec!["b_gas".into()],
            vec!["b_el".into(), "b_th".into()],
            TransformerParams::default(),
            TechnologyParams::Chp(ChpParams { eta: Some([0.3, 0.5]) }),
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(demand("demand_el", "b_el", vec![30.0])).unwrap();
    es.add_component(demand("demand_th", "b_th", vec![40.0])).unwrap();

    let objective = es.optimize().unwrap().objective;
    let results = es.component("chp").unwrap().results();
    assert_close(results.inputs["b_gas"][0], 100.0);
    assert_close(results.outputs["b_el"][0], 30.0);
    assert_close(results.outputs["b_th"][0], 50.0);
    assert_close(es.bus("b_th").unwrap().results().excess.as_ref().unwrap()[0], 10.0);
    assert_close(objective, 100.0);
}

#[test]
fn test_extraction_chp_fuel_follows_power_and_heat() {
    let mut es = EnergySystem::new(hourly(1), None);
    es.add_bus(gas_bus(1.0)).unwrap();
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    es.add_bus(Bus::commodity("b_th", "heat").unwrap()).unwrap();
    es.add_component(
        Component::transformer(
            "sechp",
            vec!["b_gas".into()],
            vec!["b_el".into(), "b_th".into()],
            TransformerParams {
                in_max: vec![100.0],
                ..Default::default()
            },
            TechnologyParams::SimpleExtractionChp(ExtractionChpParams {
                eta_el_cond: Some(0.5),
                beta: Some(0.2),
                sigma: Some(1.0),
            }),
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(demand("demand_el", "b_el", vec![20.0])).unwrap();
    es.add_component(demand("demand_th", "b_th", vec![10.0])).unwrap();

    let objective = es.optimize().unwrap().objective;
    // 0.5 * fuel == 20 + 0.2 * 10
    assert_close(es.component("sechp").unwrap().results().inputs["b_gas"][0], 44.0);
    assert_close(objective, 44.0);
}

#[test]
fn test_delayed_transport_arrives_later() {
    let mut es = EnergySystem::new(hourly(3), None);
    es.add_bus(Bus::commodity("a", "electricity").unwrap()).unwrap();
    es.add_bus(Bus::commodity("b", "electricity").unwrap()).unwrap();
    es.add_component(Component::source("pp", vec![], vec!["a".into()], SourceParams::dispatchable(100.0, 1.0)).unwrap())
        .unwrap();
    es.add_component(
        Component::transport(
            "line",
            vec!["a".into()],
            vec!["b".into()],
            TransportParams {
                in_max: Some(100.0),
                out_max: Some(100.0),
                eta: 0.9,
                kind: TransportKind::Delayed { steps: 1 },
                opex_var: 0.0,
            },
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(demand("demand", "b", vec![0.0, 9.0, 0.0])).unwrap();

    es.optimize().unwrap();
    let line = es.component("line").unwrap().results();
    for (t, (sent, received)) in [(10.0, 0.0), (0.0, 9.0), (0.0, 0.0)].into_iter().enumerate() {
        assert_close(line.inputs["a"][t], sent);
        assert_close(line.outputs["b"][t], received);
    }
    assert_close(es.component("pp").unwrap().results().outputs["a"][0], 10.0);
}

#[test]
fn test_storage_recursion_with_losses() {
    let mut es = EnergySystem::new(hourly(2), None);
    es.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
    es.add_component(
        Component::transformer(
            "battery",
            vec!["b_el".into()],
            vec!["b_el".into()],
            TransformerParams {
                in_max: vec![0.0],
                out_max: vec![50.0],
                ..Default::default()
            },
            TechnologyParams::Storage(StorageParams {
                cap_max: Some(100.0),
                cap_initial: Some(50.0),
                cap_loss: Some(0.1),
                eta_out: Some(0.5),
                ..Default::default()
            }),
        )
        .unwrap(),
    )
    .unwrap();
    es.add_component(demand("demand", "b_el", vec![10.0, 5.0])).unwrap();

    es.optimize().unwrap();
    let results = es.component("battery").unwrap().results();
    let soc = results.soc.as_ref().unwrap();
    // 50 * 0.9 - 10 / 0.5, then 25 * 0.9 - 5 / 0.5
    assert_close(soc[0], 25.0);
    assert_close(soc[1], 12.5);
    assert_close(results.outputs["b_el"][1], 5.0);
}
