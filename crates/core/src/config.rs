use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::catalog::PackTable;
use crate::cpq::pricing::PricingConfig;
use crate::domain::product::Pack;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub pricing: PricingConfig,
    pub catalog: CatalogConfig,
    pub assistant: AssistantConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    /// Reply returned verbatim by the `static` provider.
    pub static_reply: String,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    pub packs: PackTable,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub contact_phone: String,
    pub max_message_chars: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Ollama,
    #[serde(alias = "openai")]
    OpenAi,
    Static,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                static_reply: "Merci pour ces précisions, je prépare votre proposition.".to_string(),
            },
            pricing: PricingConfig::default(),
            catalog: CatalogConfig::default(),
            assistant: AssistantConfig {
                contact_phone: "01 23 45 67 89".to_string(),
                max_message_chars: 2_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "static" => Ok(Self::Static),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected ollama|openai|static)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("soundrent.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(api_key.into());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(static_reply) = llm.static_reply {
                self.llm.static_reply = static_reply;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(multiplier) = pricing.urgency_multiplier {
                self.pricing.urgency_multiplier = multiplier;
            }
            if let Some(near) = pricing.delivery_near {
                self.pricing.delivery.near = near;
            }
            if let Some(mid) = pricing.delivery_mid {
                self.pricing.delivery.mid = mid;
            }
            if let Some(far) = pricing.delivery_far {
                self.pricing.delivery.far = far;
            }
            if let Some(credit) = pricing.lighting_credit {
                self.pricing.lighting_credit = credit;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(packs) = catalog.packs {
                self.catalog.packs = PackTable::new(packs);
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(contact_phone) = assistant.contact_phone {
                self.assistant.contact_phone = contact_phone;
            }
            if let Some(max_message_chars) = assistant.max_message_chars {
                self.assistant.max_message_chars = max_message_chars;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SOUNDRENT_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("SOUNDRENT_LLM_API_KEY") {
            self.llm.api_key = Some(value.into());
        }
        if let Some(value) = read_env("SOUNDRENT_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("SOUNDRENT_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("SOUNDRENT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SOUNDRENT_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SOUNDRENT_PRICING_URGENCY_MULTIPLIER") {
            self.pricing.urgency_multiplier =
                parse_decimal("SOUNDRENT_PRICING_URGENCY_MULTIPLIER", &value)?;
        }
        if let Some(value) = read_env("SOUNDRENT_PRICING_LIGHTING_CREDIT") {
            self.pricing.lighting_credit =
                parse_decimal("SOUNDRENT_PRICING_LIGHTING_CREDIT", &value)?;
        }
        if let Some(value) = read_env("SOUNDRENT_PRICING_DELIVERY_NEAR") {
            self.pricing.delivery.near = parse_decimal("SOUNDRENT_PRICING_DELIVERY_NEAR", &value)?;
        }
        if let Some(value) = read_env("SOUNDRENT_PRICING_DELIVERY_MID") {
            self.pricing.delivery.mid = parse_decimal("SOUNDRENT_PRICING_DELIVERY_MID", &value)?;
        }
        if let Some(value) = read_env("SOUNDRENT_PRICING_DELIVERY_FAR") {
            self.pricing.delivery.far = parse_decimal("SOUNDRENT_PRICING_DELIVERY_FAR", &value)?;
        }

        if let Some(value) = read_env("SOUNDRENT_ASSISTANT_CONTACT_PHONE") {
            self.assistant.contact_phone = value;
        }
        if let Some(value) = read_env("SOUNDRENT_ASSISTANT_MAX_MESSAGE_CHARS") {
            self.assistant.max_message_chars =
                parse_usize("SOUNDRENT_ASSISTANT_MAX_MESSAGE_CHARS", &value)?;
        }

        let log_level =
            read_env("SOUNDRENT_LOGGING_LEVEL").or_else(|| read_env("SOUNDRENT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SOUNDRENT_LOGGING_FORMAT").or_else(|| read_env("SOUNDRENT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(contact_phone) = overrides.contact_phone {
            self.assistant.contact_phone = contact_phone;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_pricing(&self.pricing)?;
        validate_catalog(&self.catalog)?;
        validate_assistant(&self.assistant)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("soundrent.toml"), PathBuf::from("config/soundrent.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let key = &after[..end];
        let value = env::var(key)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::OpenAi => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the openai provider".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for the ollama provider".to_string(),
                ));
            }
        }
        LlmProvider::Static => {
            if llm.static_reply.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "llm.static_reply must not be empty for the static provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.urgency_multiplier < Decimal::ONE {
        return Err(ConfigError::Validation(
            "pricing.urgency_multiplier must be at least 1".to_string(),
        ));
    }

    let delivery = [pricing.delivery.near, pricing.delivery.mid, pricing.delivery.far];
    if delivery.iter().any(|price| price.is_sign_negative()) {
        return Err(ConfigError::Validation(
            "pricing.delivery_* prices must not be negative".to_string(),
        ));
    }

    if pricing.lighting_credit.is_sign_negative() {
        return Err(ConfigError::Validation(
            "pricing.lighting_credit must not be negative".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(pack) = catalog.packs.packs().iter().find(|pack| {
        pack.capacity_range.min > pack.capacity_range.max
    }) {
        return Err(ConfigError::Validation(format!(
            "catalog pack `{}` has an empty capacity range",
            pack.id.as_str()
        )));
    }

    let gaps = catalog.packs.coverage_gaps();
    if let Some(first) = gaps.first() {
        return Err(ConfigError::Validation(format!(
            "catalog.packs leave guest counts {}..={} uncovered",
            first.min, first.max
        )));
    }

    Ok(())
}

fn validate_assistant(assistant: &AssistantConfig) -> Result<(), ConfigError> {
    if assistant.contact_phone.trim().is_empty() {
        return Err(ConfigError::Validation("assistant.contact_phone is required".to_string()));
    }

    if assistant.max_message_chars == 0 {
        return Err(ConfigError::Validation(
            "assistant.max_message_chars must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    pricing: Option<PricingPatch>,
    catalog: Option<CatalogPatch>,
    assistant: Option<AssistantPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    static_reply: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    urgency_multiplier: Option<Decimal>,
    delivery_near: Option<Decimal>,
    delivery_mid: Option<Decimal>,
    delivery_far: Option<Decimal>,
    lighting_credit: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    packs: Option<Vec<Pack>>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    contact_phone: Option<String>,
    max_message_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| err.to_string())?;
        ensure(config.pricing.urgency_multiplier == Decimal::new(125, 2), "default multiplier")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "default log format")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SOUNDRENT_API_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("soundrent.toml");
            fs::write(
                &path,
                r#"
[llm]
provider = "openai"
api_key = "${TEST_SOUNDRENT_API_KEY}"
base_url = "https://api.openai.com"
model = "gpt-4o-mini"

[pricing]
urgency_multiplier = "1.5"
delivery_near = 70
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.provider == LlmProvider::OpenAi, "provider should come from file")?;
            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret() == "sk-from-env")
                    == Some(true),
                "api key should be interpolated from environment",
            )?;
            ensure(
                config.pricing.urgency_multiplier == Decimal::new(15, 1),
                "multiplier should come from file",
            )?;
            ensure(config.pricing.delivery.near == Decimal::from(70), "near delivery from file")?;
            ensure(config.pricing.delivery.mid == Decimal::from(120), "mid delivery untouched")?;
            Ok(())
        })();

        clear_vars(&["TEST_SOUNDRENT_API_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_SOUNDRENT_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("soundrent.toml");
        fs::write(&path, "[assistant]\ncontact_phone = \"${TEST_SOUNDRENT_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error = AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            .err()
            .ok_or_else(|| "expected interpolation failure".to_string())?;
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_SOUNDRENT_UNSET"),
            "missing variable should be named",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SOUNDRENT_LOG_LEVEL", "warn");
        env::set_var("SOUNDRENT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SOUNDRENT_LOG_LEVEL", "SOUNDRENT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SOUNDRENT_ASSISTANT_CONTACT_PHONE", "06 00 00 00 01");
        env::set_var("SOUNDRENT_LLM_MODEL", "mistral");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("soundrent.toml");
            fs::write(
                &path,
                r#"
[llm]
model = "llama3.2"

[assistant]
contact_phone = "01 00 00 00 00"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    llm_model: Some("qwen2.5".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "qwen2.5", "override model should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.assistant.contact_phone == "06 00 00 00 01",
                "env contact phone should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["SOUNDRENT_ASSISTANT_CONTACT_PHONE", "SOUNDRENT_LLM_MODEL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SOUNDRENT_LLM_PROVIDER", "openai");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.api_key")
            );
            ensure(has_message, "validation failure should mention llm.api_key")
        })();

        clear_vars(&["SOUNDRENT_LLM_PROVIDER"]);
        result
    }

    #[test]
    fn delivery_prices_follow_env_over_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SOUNDRENT_PRICING_DELIVERY_NEAR", "55");
        env::set_var("SOUNDRENT_PRICING_DELIVERY_FAR", "249.90");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("soundrent.toml");
            fs::write(&path, "[pricing]\ndelivery_near = 70\ndelivery_mid = 130\n")
                .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.pricing.delivery.near == Decimal::from(55), "env near delivery wins")?;
            ensure(config.pricing.delivery.mid == Decimal::from(130), "mid delivery from file")?;
            ensure(config.pricing.delivery.far == Decimal::new(24990, 2), "env far delivery wins")
        })();

        clear_vars(&["SOUNDRENT_PRICING_DELIVERY_NEAR", "SOUNDRENT_PRICING_DELIVERY_FAR"]);
        result
    }

    #[test]
    fn invalid_numeric_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SOUNDRENT_PRICING_URGENCY_MULTIPLIER", "beaucoup");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "SOUNDRENT_PRICING_URGENCY_MULTIPLIER",
                "error should name the offending variable",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected invalid override".to_string()),
        };

        clear_vars(&["SOUNDRENT_PRICING_URGENCY_MULTIPLIER"]);
        result
    }

    #[test]
    fn pack_table_with_gap_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("soundrent.toml");
        fs::write(
            &path,
            r#"
[[catalog.packs]]
id = "petit"
name = "Petit"
kind = "sound"
base_price = "99"
composition = ["2 enceintes"]
capacity_range = { min = 0, max = 100 }

[[catalog.packs]]
id = "grand"
name = "Grand"
kind = "sound"
composition = ["line array"]
capacity_range = { min = 201, max = 5000 }
"#,
        )
        .map_err(|err| err.to_string())?;

        let error = AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            .err()
            .ok_or_else(|| "expected coverage validation failure".to_string())?;
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("101..=200")),
            "validation should name the uncovered range",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SOUNDRENT_LLM_PROVIDER", "openai");
        env::set_var("SOUNDRENT_LLM_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(&["SOUNDRENT_LLM_PROVIDER", "SOUNDRENT_LLM_API_KEY"]);
        result
    }
}
