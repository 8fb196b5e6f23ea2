//! # Control Tick Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arm_lib::{
    arm_ctrl::{
        dynamics::DynamicsParams, kinematics::ArmGeometry, ArmCtrl, ArmMode, CartesianPoint,
        InputData, JointAngles, Params,
    },
    sim::{SimActuator, SimArm, SimParams, SimSensor},
};
use comms_if::tc::arm_ctrl::ArmCmd;
use util::module::State;

fn control_tick_benchmark(c: &mut Criterion) {
    // ---- Build the arm and simulation ----

    let dynamics = DynamicsParams {
        proximal_mass_kg: 2.0,
        proximal_com_m: 0.25,
        proximal_inertia_kgm2: 0.04,
        forearm_mass_kg: 1.0,
        forearm_com_m: 0.2,
        forearm_inertia_kgm2: 0.0133,
        gravity_ms2: 9.81,
        proximal_volts_per_nm: 0.5,
        forearm_volts_per_nm: 0.8,
        proximal_volts_per_rads: 0.2,
        forearm_volts_per_rads: 0.3,
    };

    let params = Params {
        proximal_length_m: 0.5,
        forearm_length_m: 0.4,
        proximal_max_rate_rads: 2.0,
        proximal_max_accel_rads2: 4.0,
        forearm_max_rate_rads: 2.0,
        forearm_max_accel_rads2: 4.0,
        proximal_k_p: 12.0,
        proximal_k_d: 1.5,
        forearm_k_p: 12.0,
        forearm_k_d: 1.5,
        dynamics,
        control_period_s: 0.02,
    };

    let geometry = ArmGeometry::new(params.proximal_length_m, params.forearm_length_m).unwrap();
    let sim_arm = SimArm::new(
        &geometry,
        SimParams {
            dynamics,
            proximal_damping_nms: 0.05,
            forearm_damping_nms: 0.05,
            supply_voltage_v: 24.0,
            brake_on_zero: true,
            initial_angles: JointAngles::new(0.0, 0.0),
        },
    )
    .unwrap()
    .into_shared();

    let mut arm_ctrl = ArmCtrl::new(
        params,
        SimSensor::new(sim_arm.clone()),
        SimActuator::new(sim_arm.clone()),
    )
    .unwrap();

    let goal = CartesianPoint::new(0.6, 0.3);
    let goal_input = InputData {
        cmd: Some(ArmCmd::Goal {
            x_m: goal.x_m,
            y_m: goal.y_m,
        }),
    };
    let no_input = InputData::default();

    // ---- Benchmarks ----

    // A goal tick includes inverse kinematics and building both profiles
    c.bench_function("goal tick", |b| {
        b.iter(|| arm_ctrl.proc(black_box(&goal_input)).unwrap())
    });

    // Tracking ticks only query the profiles and run the controller. Goals
    // alternate between two points so that the arm never settles into idle.
    let other_input = InputData {
        cmd: Some(ArmCmd::Goal { x_m: 0.3, y_m: -0.6 }),
    };
    let mut toggle = false;
    c.bench_function("tracking tick", |b| {
        b.iter(|| {
            if arm_ctrl.mode() == ArmMode::Idle {
                toggle = !toggle;
                let input = if toggle { &other_input } else { &goal_input };
                arm_ctrl.proc(black_box(input)).unwrap()
            } else {
                arm_ctrl.proc(black_box(&no_input)).unwrap()
            }
        })
    });
}

criterion_group!(benches, control_tick_benchmark);
criterion_main!(benches);
