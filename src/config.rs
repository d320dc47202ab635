// Static endpoint and worker-command configuration for the sidecar host.

pub const DEFAULT_API_HOST: &str = "localhost";
pub const DEFAULT_API_PORT: u16 = 8008;
pub const DEFAULT_WORKER_CMD: &str = "bin/api/main";

/// Configuration for the sidecar host
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Host the worker's HTTP API listens on
    pub api_host: String,
    /// Port the worker's HTTP API listens on
    pub api_port: u16,
    /// Program spawned as the worker process
    pub worker_program: String,
    /// Arguments passed to the worker process
    pub worker_args: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT,
            worker_program: DEFAULT_WORKER_CMD.to_string(),
            worker_args: Vec::new(),
        }
    }
}

impl HostConfig {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("SIDECAR_API_HOST") {
            let host = host.trim();
            if !host.is_empty() {
                config.api_host = host.to_string();
            }
        }
        if let Some(port) = std::env::var("SIDECAR_API_PORT")
            .ok()
            .and_then(|raw| raw.trim().parse::<u16>().ok())
        {
            config.api_port = port;
        }
        if let Ok(cmd) = std::env::var("SIDECAR_WORKER_CMD") {
            config.set_worker_command(&cmd);
        }

        config
    }

    /// Base URL of the worker's HTTP API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.api_host, self.api_port)
    }

    /// Split a whitespace-separated command line into program and arguments.
    /// Empty input leaves the current worker command untouched.
    pub fn set_worker_command(&mut self, command: &str) {
        let mut parts = command.split_whitespace().map(str::to_string);
        if let Some(program) = parts.next() {
            self.worker_program = program;
            self.worker_args = parts.collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_api() {
        let config = HostConfig::default();
        assert_eq!(config.api_port, 8008);
        assert_eq!(config.base_url(), "http://localhost:8008");
    }

    #[test]
    fn worker_command_splits_into_program_and_args() {
        let mut config = HostConfig::default();
        config.set_worker_command("python3 -u main.py");
        assert_eq!(config.worker_program, "python3");
        assert_eq!(config.worker_args, vec!["-u", "main.py"]);
    }

    #[test]
    fn empty_worker_command_is_ignored() {
        let mut config = HostConfig::default();
        config.set_worker_command("   ");
        assert_eq!(config.worker_program, DEFAULT_WORKER_CMD);
    }
}
