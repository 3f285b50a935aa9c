use medtrack_config::Config;

/// Strategy for initializing the configuration.
///
/// Creates the default configuration file at `~/medtrack/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        Config::create_config()
    }
}
