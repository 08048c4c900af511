use super::Context;
use crate::config::UploadStyle;
use anyhow::{bail, Result};
use clap::Subcommand;
use std::collections::BTreeMap;

pub const SETTING_KEYS: &[&str] = &["api_base_url", "upload_style", "request_timeout_secs"];

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show stored settings and the (masked) access token
    Show,
    /// Store a setting
    Set { key: String, value: String },
    /// Remove a setting, falling back to the default
    Delete { key: String },
}

/// Keep the ends of a secret visible so it can be recognised.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}

fn validate(key: &str, value: &str) -> Result<()> {
    if !SETTING_KEYS.contains(&key) {
        bail!("Unknown setting key: {}", key);
    }
    match key {
        "upload_style" => {
            value.parse::<UploadStyle>().map_err(anyhow::Error::msg)?;
        }
        "request_timeout_secs" => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => {}
            _ => bail!("request_timeout_secs must be a positive integer"),
        },
        "api_base_url" => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                bail!("api_base_url must start with http:// or https://");
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn run(ctx: &Context, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            let mut map = BTreeMap::new();
            for key in SETTING_KEYS {
                if let Some(value) = ctx.db.get_setting(key)? {
                    map.insert(key.to_string(), value);
                }
            }
            if let Some(creds) = ctx.db.load_credentials()? {
                map.insert("access_token".into(), mask_secret(&creds.access_token));
                if let Some(user) = creds.user {
                    map.insert("user".into(), user.username);
                }
            }
            ctx.emit(&map, |map| {
                for (k, v) in map {
                    println!("{} = {}", k, v);
                }
            })
        }
        SettingsCommand::Set { key, value } => {
            validate(&key, &value)?;
            ctx.db.set_setting(&key, &value)?;
            println!("{} = {}", key, value);
            Ok(())
        }
        SettingsCommand::Delete { key } => {
            if !SETTING_KEYS.contains(&key.as_str()) {
                bail!("Unknown setting key: {}", key);
            }
            ctx.db.delete_setting(&key)?;
            println!("{} reset to default", key);
            Ok(())
        }
    }
}
