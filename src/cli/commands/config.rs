//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::AwsmapResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> AwsmapResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => println!("{}", toml::to_string_pretty(config)?),
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => {
            init_config(&UiContext::detect(), manager, force).await?;
        }
    }

    Ok(())
}

async fn init_config(ctx: &UiContext, manager: &ConfigManager, force: bool) -> AwsmapResult<bool> {
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(false);
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(ctx, "Configuration initialized", &path.display().to_string());
    Ok(true)
}
