use armflow::Config;

pub fn render_status(config: &Config) -> String {
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    let mut lines = vec![
        "◆ armflow status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!("Package     {}", config.package_root_path().display()),
        String::new(),
        format!("  Right arm      {}", config.robot.right_arm),
        format!("  Dual arm       {}", on_off(config.robot.dual_arm)),
        format!("  Groups         {}", config.robot.groups.len()),
        format!("  Autonomous     {}", on_off(config.execution.autonomous)),
        format!(
            "  Persist paths  {}",
            if config.execution.persist_trajectories {
                config.trajectory_dir().display().to_string()
            } else {
                "off".to_string()
            }
        ),
        format!("  Experience     {}", on_off(config.planning.use_experience)),
        format!("  Observability  {}", config.observability.backend),
        String::new(),
        "Hardware units:".to_string(),
    ];
    for unit in &config.execution.hardware_units {
        let hand = if unit.has_end_effector { " (+ end effector)" } else { "" };
        lines.push(format!("  {}{hand}", unit.name));
    }
    lines.join("\n")
}
