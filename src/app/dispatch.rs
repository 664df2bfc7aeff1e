use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use armflow::Config;
use armflow::core::model::{CollisionMode, ManipulationGroup};
use armflow::execution::{OperatorChannel, persist};
use armflow::runtime::observability::create_observer;
use armflow::sim::{BoxObstacle, Simulation};
use chrono::Local;
use nalgebra::{DVector, Point3, Vector3};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::app::status::render_status;

const JOG_STEPS: u32 = 10;

pub fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Status => {
            println!("{}", render_status(&config));
            Ok(())
        }
        Commands::CheckConfig { json } => check_config(&config, json),
        Commands::Inspect { path, group } => inspect(&path, &group),
        Commands::Demo {
            arm,
            object,
            distance,
        } => run_demo(&config, arm, &object, distance),
        Commands::Replay {
            path,
            duration_ms,
            interactive,
        } => {
            let path = path.unwrap_or_else(|| default_recording_path(&config));
            run_replay(&config, &path, Duration::from_millis(duration_ms), interactive)
        }
    }
}

fn check_config(config: &Config, json: bool) -> Result<()> {
    config.validate()?;
    let rendered = if json {
        serde_json::to_string_pretty(config).context("Failed to serialize config")?
    } else {
        toml::to_string_pretty(config).context("Failed to serialize config")?
    };
    println!("{rendered}");
    eprintln!("config OK: {}", config.config_path.display());
    Ok(())
}

fn inspect(path: &Path, group: &str) -> Result<()> {
    let trajectory = persist::read(path, group)?;
    println!("{}", path.display());
    println!("  joints    {}", trajectory.joint_names().join(", "));
    println!("  points    {}", trajectory.len());
    println!("  duration  {:.3}s", trajectory.duration().as_secs_f64());
    if let Some(index) = trajectory.first_time_regression() {
        println!("  warning   time goes backwards at point {index}");
    }
    Ok(())
}

/// Tip position of a gantry arm at one of its named poses.
fn tip_at_pose(group: &ManipulationGroup, pose: &str) -> Result<Point3<f64>> {
    let values = group.named_pose(pose)?;
    let base = group
        .base_joints
        .as_ref()
        .with_context(|| format!("group {} declares no base_joints", group.name))?;
    let coordinate = |joint: &String| {
        group
            .joints
            .iter()
            .position(|spec| &spec.name == joint)
            .map(|index| values[index])
            .with_context(|| format!("base joint {joint} is not part of group {}", group.name))
    };
    Ok(Point3::new(
        coordinate(&base[0])?,
        coordinate(&base[1])?,
        coordinate(&base[2])?,
    ))
}

/// Ready, open, advance, grasp, lift, retreat, home.
fn run_demo(config: &Config, arm: Option<String>, object: &str, distance: f64) -> Result<()> {
    let model = config.robot.to_model();
    let arm = match arm {
        Some(name) => model.group(&name)?.clone(),
        None => model.right_arm()?.clone(),
    };
    let ready = tip_at_pose(&arm, "ready")?;
    let obstacle = BoxObstacle::new(
        object,
        ready + Vector3::new(distance + 0.02, 0.0, 0.0),
        Vector3::new(0.03, 0.03, 0.03),
    );

    let observer = create_observer(&config.observability);
    let sim = Simulation::new(config, vec![obstacle])?.unattended(config.execution.autonomous);
    let mut manipulation = sim.manipulation(config, observer);

    manipulation.ensure_controllers_healthy()?;
    if !manipulation.fix_current_collision_and_bounds(&arm.name)? {
        info!("start configuration needed correction");
    }
    manipulation.move_to_named_pose(&arm.name, "ready", true)?;
    manipulation.set_end_effector(&arm.name, true)?;
    manipulation.allow_finger_touch(object, &arm.name)?;

    let advance = manipulation.execute_retreat_path(&arm.name, distance, false, CollisionMode::Full)?;
    info!(achieved = advance.achieved, desired = advance.desired, "approached object");
    manipulation.set_end_effector(&arm.name, false)?;

    let lift = manipulation.execute_vertical_path(&arm.name, 0.05, true, CollisionMode::Full)?;
    info!(achieved = lift.achieved, desired = lift.desired, "lifted object");
    manipulation.execute_retreat_path(&arm.name, distance, true, CollisionMode::Full)?;
    let home = model.home_pose().to_string();
    manipulation.move_to_named_pose(&arm.name, &home, true)?;

    println!(
        "demo finished: {} trajectories dispatched",
        sim.runtime.dispatch_count()
    );
    if config.execution.persist_trajectories {
        println!(
            "last trajectory: {}",
            persist::trajectory_file(&config.trajectory_dir()).display()
        );
    }
    Ok(())
}

fn default_recording_path(config: &Config) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    config
        .package_root_path()
        .join("recordings")
        .join(format!("recording_{stamp}.csv"))
}

/// Jogs the simulated arm from home to ready while recording, then plays
/// the recording back through the orchestrator.
fn run_replay(config: &Config, path: &Path, duration: Duration, interactive: bool) -> Result<()> {
    let observer = create_observer(&config.observability);
    let sim = Simulation::new(config, Vec::new())?.unattended(true);
    let mut manipulation = sim.manipulation(config, observer);
    let arm = manipulation.model().right_arm()?.clone();

    let start = sim.robot.configuration();
    let ready = DVector::from_column_slice(arm.named_pose("ready")?);
    let goal = start.with_group_positions(&arm, &ready)?;

    let robot = sim.robot.clone();
    let operator = Arc::clone(&sim.operator);
    let jog = std::thread::spawn(move || {
        for step in 1..=JOG_STEPS {
            std::thread::sleep(duration / JOG_STEPS);
            let t = f64::from(step) / f64::from(JOG_STEPS);
            if let Ok(configuration) = start.interpolate(&goal, t) {
                robot.set_configuration(configuration);
            }
        }
        operator.set_stop(true);
    });

    let samples = manipulation.record_trajectory_to_file(path)?;
    jog.join()
        .map_err(|_| anyhow::anyhow!("jog thread panicked"))?;
    println!("recorded {samples} samples to {}", path.display());

    if interactive {
        let reached = manipulation.playback_trajectory_interactive(
            path,
            &arm.name,
            config.motion.main_velocity_scaling_factor,
        )?;
        println!("played back {reached} configurations one by one");
    } else {
        let outcome = manipulation.playback_trajectory_from_file(
            path,
            &arm.name,
            config.motion.main_velocity_scaling_factor,
        )?;
        println!("played back recording: {outcome:?}");
    }
    info!(
        joints = manipulation.current_configuration().len(),
        "replay finished"
    );
    Ok(())
}
