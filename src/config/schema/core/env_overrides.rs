use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("ARMFLOW_PACKAGE_ROOT")
            && !root.is_empty()
        {
            self.package_root = root;
        }

        if let Ok(flag) = std::env::var("ARMFLOW_USE_EXPERIENCE") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.planning.use_experience = true,
                "0" | "false" | "no" | "off" => self.planning.use_experience = false,
                _ => tracing::warn!(value = %flag, "ignoring invalid ARMFLOW_USE_EXPERIENCE"),
            }
        }

        if let Ok(scale_str) = std::env::var("ARMFLOW_VELOCITY_SCALE")
            && let Ok(scale) = scale_str.parse::<f64>()
            && scale > 0.0
            && scale <= 1.0
        {
            self.motion.main_velocity_scaling_factor = scale;
        }

        if let Ok(level) = std::env::var("ARMFLOW_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }
    }
}
