//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{OffgridError, OffgridResult};
use crate::ui::{self, UiContext};

const VALID_KEYS: [&str; 13] = [
    "general.log_format",
    "general.journal",
    "agent.origin",
    "agent.cache_prefix",
    "agent.version",
    "agent.precache",
    "agent.skip_waiting_on_install",
    "routes.api_segment",
    "routes.post_segment",
    "routes.static_segment",
    "network.timeout_secs",
    "offline.fallback_page",
    "offline.notice",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> OffgridResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> OffgridResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> OffgridResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> OffgridResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    apply_setting(&mut config, key, value)?;

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Write one dot-separated key into `config`
fn apply_setting(config: &mut Config, key: &str, value: &str) -> OffgridResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = parse_log_format(value)?,
        ["general", "journal"] => config.general.journal = parse_bool(value)?,

        ["agent", "origin"] => {
            url::Url::parse(value).map_err(|e| OffgridError::InvalidUrl {
                url: value.to_string(),
                reason: e.to_string(),
            })?;
            config.agent.origin = value.to_string();
        }
        ["agent", "cache_prefix"] => config.agent.cache_prefix = value.to_string(),
        ["agent", "version"] => config.agent.version = value.to_string(),
        ["agent", "precache"] => {
            config.agent.precache = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        ["agent", "skip_waiting_on_install"] => {
            config.agent.skip_waiting_on_install = parse_bool(value)?
        }

        ["routes", "api_segment"] => config.routes.api_segment = value.to_string(),
        ["routes", "post_segment"] => config.routes.post_segment = value.to_string(),
        ["routes", "static_segment"] => config.routes.static_segment = value.to_string(),

        ["network", "timeout_secs"] => config.network.timeout_secs = parse_u64(value)?,

        ["offline", "fallback_page"] => config.offline.fallback_page = value.to_string(),
        ["offline", "notice"] => config.offline.notice = value.to_string(),

        _ => {
            return Err(OffgridError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_log_format(value: &str) -> OffgridResult<String> {
    match value {
        "text" | "json" => Ok(value.to_string()),
        _ => Err(OffgridError::User(format!(
            "Invalid log format: {}. Use text/json",
            value
        ))),
    }
}

fn parse_bool(value: &str) -> OffgridResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(OffgridError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> OffgridResult<u64> {
    value
        .parse()
        .map_err(|_| OffgridError::User(format!("Invalid number: {}", value)))
}
