use crate::config::{Environment, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives per environment. Request spans from `tower_http` are
/// only interesting while developing.
fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "profile_atlas=debug,tower_http=debug,info",
        Environment::Staging => "profile_atlas=debug,tower_http=info,info",
        Environment::Prod => "profile_atlas=info,tower_http=warn,warn",
    }
}

pub fn init_logging(settings: &Settings) {
    let env = &settings.env;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    let json = settings.log_json.unwrap_or(matches!(env, Environment::Prod));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.pretty())
            .init();
    }

    tracing::info!(
        env = ?env,
        json,
        version = env!("CARGO_PKG_VERSION"),
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            let directives = default_directives(&env);
            assert!(directives.starts_with("profile_atlas="));
            assert!(EnvFilter::try_new(directives).is_ok());
        }
    }
}
