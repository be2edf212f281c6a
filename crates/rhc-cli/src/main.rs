use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use rhc_controller::MpcController;
use rhc_core::{Constraint, MpcProblem, ProcessModel, SetpointObjective, VarMap, WorldState};

mod thermal;

use thermal::FirstOrderLag;

/// Drives a simulated first-order thermal plant with the
/// receding-horizon controller. Time is simulated; no real-time
/// scheduling happens here.
#[derive(Debug, Parser)]
#[command(name = "rhc-cli")]
struct Args {
    /// Number of control cycles to simulate
    #[clap(long, default_value = "20")]
    cycles: u32,

    /// Simulated seconds between control cycles
    #[clap(long, default_value = "1.0")]
    time_step: f64,

    /// Temperature setpoint
    #[clap(long, default_value = "100.0")]
    target: f64,

    /// Initial plant temperature
    #[clap(long, default_value = "80.0")]
    initial: f64,

    /// Plant time constant in seconds
    #[clap(long, default_value = "5.0")]
    tau: f64,

    /// Optimization horizon in seconds
    #[clap(long, default_value = "2.0")]
    horizon: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let target = decimal(args.target).context("target temperature")?;
    let initial = decimal(args.initial).context("initial temperature")?;

    let problem = MpcProblem::builder()
        .cv(
            "temperature",
            true,
            1.0,
            SetpointObjective::new("temperature", target),
        )
        .optimisation_horizon(args.horizon)
        // Declared for future constrained backends; not enforced by the
        // unconstrained optimizer.
        .constraint(Constraint {
            variable: "heater".to_string(),
            min: Some(Decimal::ZERO),
            max: decimal(2.0 * args.target).ok(),
        })
        .build()?;
    let controller = MpcController::new(problem, FirstOrderLag::new(args.tau));
    let plant = FirstOrderLag::new(args.tau);

    let values: VarMap<String, Decimal> = vec![
        ("heater".to_string(), initial),
        ("temperature".to_string(), initial),
    ]
    .into_iter()
    .collect();
    let mut world = WorldState::new(
        values,
        vec!["heater".to_string()],
        vec!["temperature".to_string()],
    )?;

    for cycle in 0..args.cycles {
        let actions = controller.calculate_control_actions(args.time_step, &world)?;
        world = world.apply_assignment(
            actions
                .iter()
                .map(|action| (action.variable.clone(), action.value)),
        )?;
        world = plant.progress(args.time_step, &world)?;
        info!(
            "cycle {cycle}: temperature = {}, actions = {actions:?}",
            world.value("temperature")?
        );
    }

    println!(
        "final temperature after {} cycles: {}",
        args.cycles,
        world.value("temperature")?
    );
    Ok(())
}

fn decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).with_context(|| format!("non-finite value {value}"))
}
