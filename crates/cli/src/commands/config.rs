use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use soundrent_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let options = LoadOptions { config_path: config_path.map(Path::to_path_buf), ..LoadOptions::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), EXIT_CONFIG);
        }
    };

    let file_path = detect_config_path(config_path);
    let file_doc = load_config_file_doc(file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(&field, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }
    CommandResult::success("config", lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let pack_ids = config
        .catalog
        .packs
        .packs()
        .iter()
        .map(|pack| pack.id.as_str())
        .collect::<Vec<_>>()
        .join(",");

    vec![
        Field {
            key: "llm.provider",
            value: format!("{:?}", config.llm.provider),
            env_keys: &["SOUNDRENT_LLM_PROVIDER"],
        },
        Field { key: "llm.model", value: config.llm.model.clone(), env_keys: &["SOUNDRENT_LLM_MODEL"] },
        Field {
            key: "llm.base_url",
            value: config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["SOUNDRENT_LLM_BASE_URL"],
        },
        Field {
            key: "llm.api_key",
            value: if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" }.to_string(),
            env_keys: &["SOUNDRENT_LLM_API_KEY"],
        },
        Field {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["SOUNDRENT_LLM_TIMEOUT_SECS"],
        },
        Field {
            key: "pricing.urgency_multiplier",
            value: config.pricing.urgency_multiplier.to_string(),
            env_keys: &["SOUNDRENT_PRICING_URGENCY_MULTIPLIER"],
        },
        Field {
            key: "pricing.lighting_credit",
            value: config.pricing.lighting_credit.to_string(),
            env_keys: &["SOUNDRENT_PRICING_LIGHTING_CREDIT"],
        },
        Field {
            key: "pricing.delivery_near",
            value: config.pricing.delivery.near.to_string(),
            env_keys: &["SOUNDRENT_PRICING_DELIVERY_NEAR"],
        },
        Field {
            key: "pricing.delivery_mid",
            value: config.pricing.delivery.mid.to_string(),
            env_keys: &["SOUNDRENT_PRICING_DELIVERY_MID"],
        },
        Field {
            key: "pricing.delivery_far",
            value: config.pricing.delivery.far.to_string(),
            env_keys: &["SOUNDRENT_PRICING_DELIVERY_FAR"],
        },
        Field { key: "catalog.packs", value: pack_ids, env_keys: &[] },
        Field {
            key: "assistant.contact_phone",
            value: config.assistant.contact_phone.clone(),
            env_keys: &["SOUNDRENT_ASSISTANT_CONTACT_PHONE"],
        },
        Field {
            key: "assistant.max_message_chars",
            value: config.assistant.max_message_chars.to_string(),
            env_keys: &["SOUNDRENT_ASSISTANT_MAX_MESSAGE_CHARS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["SOUNDRENT_LOGGING_LEVEL", "SOUNDRENT_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["SOUNDRENT_LOGGING_FORMAT", "SOUNDRENT_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    [PathBuf::from("soundrent.toml"), PathBuf::from("config/soundrent.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(field: &Field, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if file_doc.is_some_and(|doc| contains_path(doc, field.key)) {
        let file_path = file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
