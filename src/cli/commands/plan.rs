//! Plan command - show what the agent would do with the current config

use crate::agent::AgentSettings;
use crate::cli::args::{OutputFormat, PlanArgs};
use crate::config::Config;
use crate::error::OffgridResult;
use crate::http::RequestInfo;
use crate::ui::{self, UiContext};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Plan {
    origin: String,
    static_bucket: String,
    runtime_bucket: String,
    precache: Vec<String>,
    api_segment: String,
    post_segment: String,
    static_segment: String,
    fallback: String,
}

impl Plan {
    fn from_settings(settings: &AgentSettings) -> Self {
        Self {
            origin: settings.origin.to_string(),
            static_bucket: settings.buckets.static_bucket.clone(),
            runtime_bucket: settings.buckets.runtime_bucket.clone(),
            precache: settings
                .precache
                .iter()
                .map(|raw| RequestInfo::build(&settings.origin, raw).cache_key().to_string())
                .collect(),
            api_segment: settings.routes.api_segment.clone(),
            post_segment: settings.routes.post_segment.clone(),
            static_segment: settings.routes.static_segment.clone(),
            fallback: settings.fallback_key.to_string(),
        }
    }
}

/// Execute the plan command
pub async fn execute(args: PlanArgs, config: &Config) -> OffgridResult<()> {
    let settings = AgentSettings::from_config(config)?;
    let plan = Plan::from_settings(&settings);

    match args.format {
        OutputFormat::Table => print_table(&plan),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Plain => {
            println!("{}", plan.static_bucket);
            println!("{}", plan.runtime_bucket);
            for key in &plan.precache {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

fn print_table(plan: &Plan) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Cache plan");

    ui::key_value(&ctx, "origin", &plan.origin);
    ui::key_value(&ctx, "static bucket", &plan.static_bucket);
    ui::key_value(&ctx, "runtime bucket", &plan.runtime_bucket);
    ui::key_value(&ctx, "offline fallback", &plan.fallback);

    ui::section(&ctx, "Precache");
    for key in &plan.precache {
        println!("  {}", key);
    }

    ui::section(&ctx, "Network only");
    ui::key_value(&ctx, "api", &format!("*{}*", plan.api_segment));
    ui::key_value(
        &ctx,
        "post",
        &format!("*{}* unless *{}*", plan.post_segment, plan.static_segment),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_from_default_config() {
        let settings = AgentSettings::from_config(&Config::default()).unwrap();
        let plan = Plan::from_settings(&settings);

        assert_eq!(plan.static_bucket, "red-social-v1");
        assert_eq!(plan.runtime_bucket, "red-social-runtime-v1");
        assert_eq!(plan.precache.len(), 6);
        assert_eq!(plan.precache[0], "GET http://localhost:5000/");
        assert_eq!(plan.fallback, "GET http://localhost:5000/");
    }
}
